//! Recording fakes for the three leaf-client traits
//!
//! Every fake appends `"<store>.<operation>"` to a [`CallLog`] before doing anything
//! else, so tests can assert on the exact cross-store call order. Fakes built through
//! [`MockStores`] share a single log.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use taskboard_domain::{
    BlobStore, NotificationQueue, OrchestratorSettings, QueuedMessage, RecordStore, TaskEntity,
    TaskOrchestrator, validate_file_name,
};
use taskboard_errors::{Backend, StorageError, StorageResult};

/// Shared, ordered log of leaf-client calls
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls whose name starts with `prefix` (e.g. `"blob."`)
    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

/// Set of operation names that should fail
#[derive(Debug, Clone, Default)]
struct FailureSet {
    operations: Arc<Mutex<HashSet<String>>>,
}

impl FailureSet {
    fn insert(&self, operation: &str) {
        self.operations.lock().unwrap().insert(operation.to_string());
    }

    fn remove(&self, operation: &str) {
        self.operations.lock().unwrap().remove(operation);
    }

    fn check(&self, backend: Backend, operation: &'static str) -> StorageResult<()> {
        if self.operations.lock().unwrap().contains(operation) {
            return Err(StorageError::backend(backend, operation, "injected failure"));
        }
        Ok(())
    }
}

/// Mock implementation of RecordStore for testing
#[derive(Debug, Clone)]
pub struct MockRecordStore {
    records: Arc<Mutex<BTreeMap<(String, String), TaskEntity>>>,
    version: Arc<AtomicU64>,
    log: CallLog,
    failures: FailureSet,
}

impl MockRecordStore {
    pub fn new() -> Self {
        Self::with_log(CallLog::new())
    }

    pub fn with_log(log: CallLog) -> Self {
        Self {
            records: Arc::new(Mutex::new(BTreeMap::new())),
            version: Arc::new(AtomicU64::new(0)),
            log,
            failures: FailureSet::default(),
        }
    }

    pub fn with_records(records: Vec<TaskEntity>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    /// Insert directly, bypassing the call log
    pub fn insert(&self, record: TaskEntity) {
        let key = (record.partition_key.clone(), record.row_key.clone());
        self.records.lock().unwrap().insert(key, record);
    }

    pub fn fail_on(&self, operation: &str) {
        self.failures.insert(operation);
    }

    pub fn recover(&self, operation: &str) {
        self.failures.remove(operation);
    }

    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn get_all_records(&self) -> Vec<TaskEntity> {
        self.records.lock().unwrap().values().cloned().collect()
    }
}

impl Default for MockRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn ensure_table_exists(&self) -> StorageResult<()> {
        self.log.record("record.ensure_table_exists");
        self.failures.check(Backend::RecordStore, "ensure_table_exists")
    }

    async fn upsert_replace(&self, entity: &TaskEntity) -> StorageResult<TaskEntity> {
        self.log.record("record.upsert_replace");
        self.failures.check(Backend::RecordStore, "upsert_replace")?;

        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        let mut stored = entity.clone();
        stored.etag = Some(format!("W/\"{version}\""));
        stored.timestamp = Some(chrono::Utc::now());
        self.insert(stored.clone());
        Ok(stored)
    }

    async fn get(&self, partition_key: &str, row_key: &str) -> StorageResult<Option<TaskEntity>> {
        self.log.record("record.get");
        self.failures.check(Backend::RecordStore, "get")?;
        let key = (partition_key.to_string(), row_key.to_string());
        Ok(self.records.lock().unwrap().get(&key).cloned())
    }

    async fn scan_all(&self) -> StorageResult<Vec<TaskEntity>> {
        self.log.record("record.scan_all");
        self.failures.check(Backend::RecordStore, "scan_all")?;
        Ok(self.get_all_records())
    }

    async fn delete(&self, partition_key: &str, row_key: &str) -> StorageResult<bool> {
        self.log.record("record.delete");
        self.failures.check(Backend::RecordStore, "delete")?;
        let key = (partition_key.to_string(), row_key.to_string());
        Ok(self.records.lock().unwrap().remove(&key).is_some())
    }
}

/// Stored blob with its content type
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBlob {
    pub content: Bytes,
    pub content_type: String,
}

/// Mock implementation of BlobStore for testing
///
/// Signed URLs look like `https://blobs.test/tasks/<name>?se=<expiry>&sp=r&sig=<n>`,
/// where `n` increases with every issued URL.
#[derive(Debug, Clone)]
pub struct MockBlobStore {
    blobs: Arc<Mutex<HashMap<String, StoredBlob>>>,
    signatures: Arc<AtomicU64>,
    log: CallLog,
    failures: FailureSet,
}

impl MockBlobStore {
    pub const BASE_URL: &'static str = "https://blobs.test/tasks";

    pub fn new() -> Self {
        Self::with_log(CallLog::new())
    }

    pub fn with_log(log: CallLog) -> Self {
        Self {
            blobs: Arc::new(Mutex::new(HashMap::new())),
            signatures: Arc::new(AtomicU64::new(0)),
            log,
            failures: FailureSet::default(),
        }
    }

    pub fn insert(&self, name: &str, content: impl Into<Bytes>) {
        self.blobs.lock().unwrap().insert(
            name.to_string(),
            StoredBlob {
                content: content.into(),
                content_type: "application/octet-stream".to_string(),
            },
        );
    }

    pub fn fail_on(&self, operation: &str) {
        self.failures.insert(operation);
    }

    pub fn recover(&self, operation: &str) {
        self.failures.remove(operation);
    }

    pub fn get_blob(&self, name: &str) -> Option<StoredBlob> {
        self.blobs.lock().unwrap().get(name).cloned()
    }

    pub fn count(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }
}

impl Default for MockBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    async fn ensure_container_exists(&self) -> StorageResult<()> {
        self.log.record("blob.ensure_container_exists");
        self.failures.check(Backend::BlobStore, "ensure_container_exists")
    }

    async fn upload(&self, name: &str, content: Bytes, content_type: &str) -> StorageResult<()> {
        self.log.record("blob.upload");
        self.failures.check(Backend::BlobStore, "upload")?;
        self.blobs.lock().unwrap().insert(
            name.to_string(),
            StoredBlob {
                content,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn signed_read_url(&self, name: &str, ttl: Duration) -> StorageResult<String> {
        self.log.record("blob.signed_read_url");
        self.failures.check(Backend::BlobStore, "signed_read_url")?;
        validate_file_name(name).map_err(|_| StorageError::InvalidName(name.to_string()))?;
        let expiry = chrono::Utc::now().timestamp() + ttl.as_secs() as i64;
        let signature = self.signatures.fetch_add(1, Ordering::SeqCst);
        Ok(format!(
            "{}/{}?se={}&sp=r&sig={}",
            Self::BASE_URL,
            name,
            expiry,
            signature
        ))
    }

    async fn delete(&self, name: &str, _include_all_versions: bool) -> StorageResult<bool> {
        self.log.record("blob.delete");
        self.failures.check(Backend::BlobStore, "delete")?;
        Ok(self.blobs.lock().unwrap().remove(name).is_some())
    }

    async fn list_names(&self) -> StorageResult<Vec<String>> {
        self.log.record("blob.list_names");
        self.failures.check(Backend::BlobStore, "list_names")?;
        let mut names: Vec<String> = self.blobs.lock().unwrap().keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

/// Mock implementation of NotificationQueue for testing
#[derive(Debug, Clone)]
pub struct MockNotificationQueue {
    pending: Arc<Mutex<VecDeque<String>>>,
    sent: Arc<Mutex<Vec<String>>>,
    acked_messages: Arc<Mutex<Vec<String>>>,
    exists: Arc<Mutex<bool>>,
    next_id: Arc<AtomicU64>,
    log: CallLog,
    failures: FailureSet,
}

impl MockNotificationQueue {
    pub fn new() -> Self {
        Self::with_log(CallLog::new())
    }

    pub fn with_log(log: CallLog) -> Self {
        Self {
            pending: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            acked_messages: Arc::new(Mutex::new(Vec::new())),
            exists: Arc::new(Mutex::new(true)),
            next_id: Arc::new(AtomicU64::new(1)),
            log,
            failures: FailureSet::default(),
        }
    }

    /// Simulate a queue that was never created; sends are skipped
    pub fn set_exists(&self, exists: bool) {
        *self.exists.lock().unwrap() = exists;
    }

    pub fn push_raw(&self, body: &str) {
        self.pending.lock().unwrap().push_back(body.to_string());
    }

    pub fn fail_on(&self, operation: &str) {
        self.failures.insert(operation);
    }

    pub fn recover(&self, operation: &str) {
        self.failures.remove(operation);
    }

    pub fn get_sent_messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn get_acked_messages(&self) -> Vec<String> {
        self.acked_messages.lock().unwrap().clone()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }
}

impl Default for MockNotificationQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationQueue for MockNotificationQueue {
    async fn ensure_queue_exists(&self) -> StorageResult<()> {
        self.log.record("queue.ensure_queue_exists");
        self.failures.check(Backend::Queue, "ensure_queue_exists")?;
        self.set_exists(true);
        Ok(())
    }

    async fn send(&self, payload: &str) -> StorageResult<bool> {
        self.log.record("queue.send");
        self.failures.check(Backend::Queue, "send")?;
        if !*self.exists.lock().unwrap() {
            return Ok(false);
        }
        self.sent.lock().unwrap().push(payload.to_string());
        self.pending.lock().unwrap().push_back(payload.to_string());
        Ok(true)
    }

    async fn receive_one(&self) -> StorageResult<Option<QueuedMessage>> {
        self.log.record("queue.receive_one");
        self.failures.check(Backend::Queue, "receive_one")?;
        let body = match self.pending.lock().unwrap().pop_front() {
            Some(body) => body,
            None => return Ok(None),
        };
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(Some(QueuedMessage {
            message_id: format!("msg-{id}"),
            pop_receipt: format!("receipt-{id}"),
            body,
            dequeue_count: 1,
        }))
    }

    async fn acknowledge(&self, message: &QueuedMessage) -> StorageResult<()> {
        self.log.record("queue.acknowledge");
        self.failures.check(Backend::Queue, "acknowledge")?;
        self.acked_messages
            .lock()
            .unwrap()
            .push(message.message_id.clone());
        Ok(())
    }
}

/// The three fakes wired to one shared call log
#[derive(Debug, Clone)]
pub struct MockStores {
    pub log: CallLog,
    pub records: MockRecordStore,
    pub blobs: MockBlobStore,
    pub queue: MockNotificationQueue,
}

impl MockStores {
    pub fn new() -> Self {
        let log = CallLog::new();
        Self {
            records: MockRecordStore::with_log(log.clone()),
            blobs: MockBlobStore::with_log(log.clone()),
            queue: MockNotificationQueue::with_log(log.clone()),
            log,
        }
    }

    pub fn orchestrator(&self) -> TaskOrchestrator {
        self.orchestrator_with(OrchestratorSettings::default())
    }

    pub fn orchestrator_with(&self, settings: OrchestratorSettings) -> TaskOrchestrator {
        TaskOrchestrator::with_settings(
            Arc::new(self.records.clone()),
            Arc::new(self.blobs.clone()),
            Arc::new(self.queue.clone()),
            settings,
        )
    }
}

impl Default for MockStores {
    fn default() -> Self {
        Self::new()
    }
}
