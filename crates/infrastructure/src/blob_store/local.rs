use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use taskboard_domain::BlobStore;
use taskboard_errors::{StorageError, StorageResult};

use super::{snapshots_present, validate_blob_name, UrlSigner};

/// 对象元数据，与内容分开存放
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlobMetadata {
    name: String,
    content_type: String,
    size: u64,
    uploaded_at: DateTime<Utc>,
}

/// 本地文件系统 Blob 存储实现
///
/// 目录结构（`key` 为对象名的 SHA-256 十六进制摘要）：
///
/// ```text
/// {root}/{container}/objects/{key}
/// {root}/{container}/meta/{key}.json
/// {root}/{container}/snapshots/{key}/{timestamp}-{uuid}
/// ```
#[derive(Debug, Clone)]
pub struct LocalFsBlobStore {
    container_dir: PathBuf,
    signer: UrlSigner,
}

impl LocalFsBlobStore {
    pub fn new(root_dir: impl AsRef<Path>, signer: UrlSigner) -> Self {
        Self {
            container_dir: root_dir.as_ref().join(signer.container()),
            signer,
        }
    }

    fn key(name: &str) -> String {
        let digest = Sha256::digest(name.as_bytes());
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }

    fn objects_dir(&self) -> PathBuf {
        self.container_dir.join("objects")
    }

    fn meta_dir(&self) -> PathBuf {
        self.container_dir.join("meta")
    }

    fn snapshots_dir(&self, key: &str) -> PathBuf {
        self.container_dir.join("snapshots").join(key)
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.objects_dir().join(key)
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.meta_dir().join(format!("{key}.json"))
    }

    /// 读取当前版本的内容与类型
    pub async fn download(&self, name: &str) -> StorageResult<Option<(Bytes, String)>> {
        validate_blob_name(name)?;
        let key = Self::key(name);
        let content = match fs::read(self.object_path(&key)).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::blob_store("download", e)),
        };
        let metadata = self.read_metadata(&key, "download").await?;
        Ok(Some((Bytes::from(content), metadata.content_type)))
    }

    pub async fn snapshot_count(&self, name: &str) -> StorageResult<usize> {
        count_entries(&self.snapshots_dir(&Self::key(name)), "snapshot_count").await
    }

    async fn read_metadata(&self, key: &str, operation: &'static str) -> StorageResult<BlobMetadata> {
        let raw = fs::read(self.meta_path(key))
            .await
            .map_err(|e| StorageError::blob_store(operation, e))?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// 先写入临时文件并把当前版本复制为快照，再依次替换元数据和内容
    ///
    /// 替换之前的任何失败都不影响当前版本。
    async fn commit_upload(
        &self,
        key: &str,
        staged_content: &Path,
        content: &[u8],
        staged_meta: &Path,
        metadata: &[u8],
    ) -> std::io::Result<()> {
        fs::write(staged_content, content).await?;
        fs::write(staged_meta, metadata).await?;

        let object_path = self.object_path(key);
        let snapshot = if fs::try_exists(&object_path).await? {
            let snapshots_dir = self.snapshots_dir(key);
            fs::create_dir_all(&snapshots_dir).await?;
            let snapshot_path = snapshots_dir.join(format!(
                "{}-{}",
                Utc::now().timestamp_nanos_opt().unwrap_or_default(),
                Uuid::new_v4()
            ));
            if let Err(e) = fs::copy(&object_path, &snapshot_path).await {
                let _ = remove_if_exists(&snapshot_path, false).await;
                return Err(e);
            }
            Some(snapshot_path)
        } else {
            None
        };

        let replaced = match fs::rename(staged_meta, self.meta_path(key)).await {
            Ok(()) => fs::rename(staged_content, &object_path).await,
            Err(e) => Err(e),
        };
        match (replaced, snapshot) {
            (Err(e), Some(snapshot_path)) => {
                let _ = remove_if_exists(&snapshot_path, false).await;
                Err(e)
            }
            (Err(e), None) => Err(e),
            (Ok(()), Some(_)) => {
                debug!(key, "覆盖对象，旧版本保留为快照");
                Ok(())
            }
            (Ok(()), None) => Ok(()),
        }
    }
}

async fn count_entries(dir: &Path, operation: &'static str) -> StorageResult<usize> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(StorageError::blob_store(operation, e)),
    };
    let mut count = 0;
    while entries
        .next_entry()
        .await
        .map_err(|e| StorageError::blob_store(operation, e))?
        .is_some()
    {
        count += 1;
    }
    Ok(count)
}

async fn remove_if_exists(path: &Path, is_dir: bool) -> std::io::Result<()> {
    let result = if is_dir {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    };
    match result {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[async_trait]
impl BlobStore for LocalFsBlobStore {
    async fn ensure_container_exists(&self) -> StorageResult<()> {
        for dir in [
            self.objects_dir(),
            self.meta_dir(),
            self.container_dir.join("snapshots"),
        ] {
            fs::create_dir_all(&dir)
                .await
                .map_err(|e| StorageError::blob_store("ensure_container_exists", e))?;
        }
        info!("Blob container ready at {}", self.container_dir.display());
        Ok(())
    }

    #[instrument(skip(self, content), fields(size = content.len()))]
    async fn upload(&self, name: &str, content: Bytes, content_type: &str) -> StorageResult<()> {
        validate_blob_name(name)?;
        let key = Self::key(name);
        let io_err = |e: std::io::Error| StorageError::blob_store("upload", e);

        fs::create_dir_all(self.objects_dir()).await.map_err(io_err)?;
        fs::create_dir_all(self.meta_dir()).await.map_err(io_err)?;

        let metadata = serde_json::to_vec(&BlobMetadata {
            name: name.to_string(),
            content_type: content_type.to_string(),
            size: content.len() as u64,
            uploaded_at: Utc::now(),
        })?;

        let staged_content = self.objects_dir().join(format!("{key}.tmp-{}", Uuid::new_v4()));
        let staged_meta = self.meta_dir().join(format!("{key}.tmp-{}", Uuid::new_v4()));
        let result = self
            .commit_upload(&key, &staged_content, &content, &staged_meta, &metadata)
            .await;
        if result.is_err() {
            let _ = remove_if_exists(&staged_content, false).await;
            let _ = remove_if_exists(&staged_meta, false).await;
        }
        result.map_err(io_err)
    }

    fn signed_read_url(&self, name: &str, ttl: Duration) -> StorageResult<String> {
        self.signer.signed_read_url(name, ttl)
    }

    #[instrument(skip(self))]
    async fn delete(&self, name: &str, include_all_versions: bool) -> StorageResult<bool> {
        validate_blob_name(name)?;
        let key = Self::key(name);
        let object_path = self.object_path(&key);
        let io_err = |e: std::io::Error| StorageError::blob_store("delete", e);

        if !fs::try_exists(&object_path).await.map_err(io_err)? {
            return Ok(false);
        }

        let snapshots_dir = self.snapshots_dir(&key);
        let snapshots = count_entries(&snapshots_dir, "delete").await?;
        if snapshots > 0 && !include_all_versions {
            return Err(snapshots_present(name, snapshots));
        }

        remove_if_exists(&object_path, false).await.map_err(io_err)?;
        remove_if_exists(&self.meta_path(&key), false)
            .await
            .map_err(io_err)?;
        remove_if_exists(&snapshots_dir, true).await.map_err(io_err)?;
        Ok(true)
    }

    async fn list_names(&self) -> StorageResult<Vec<String>> {
        let io_err = |e: std::io::Error| StorageError::blob_store("list_names", e);
        let mut entries = match fs::read_dir(self.meta_dir()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let raw = fs::read(&path).await.map_err(io_err)?;
            let metadata: BlobMetadata = serde_json::from_slice(&raw)?;
            names.push(metadata.name);
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> LocalFsBlobStore {
        let signer =
            UrlSigner::new("http://localhost:8080/blobs", "task-files", b"0123456789abcdef")
                .unwrap();
        LocalFsBlobStore::new(dir.path(), signer)
    }

    #[tokio::test]
    async fn test_upload_download_and_list() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.ensure_container_exists().await.unwrap();

        store
            .upload("docs/plan v1.pdf", Bytes::from_static(b"%PDF"), "application/pdf")
            .await
            .unwrap();
        store
            .upload("a.txt", Bytes::from_static(b"hello"), "text/plain")
            .await
            .unwrap();

        let (content, content_type) = store.download("docs/plan v1.pdf").await.unwrap().unwrap();
        assert_eq!(&content[..], b"%PDF");
        assert_eq!(content_type, "application/pdf");
        assert_eq!(
            store.list_names().await.unwrap(),
            vec!["a.txt".to_string(), "docs/plan v1.pdf".to_string()]
        );
    }

    #[tokio::test]
    async fn test_overwrite_creates_snapshot_and_delete_requires_all_versions() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        store.upload("a.txt", Bytes::from_static(b"v1"), "text/plain").await.unwrap();
        store.upload("a.txt", Bytes::from_static(b"v2"), "text/plain").await.unwrap();
        assert_eq!(store.snapshot_count("a.txt").await.unwrap(), 1);
        assert_eq!(&store.download("a.txt").await.unwrap().unwrap().0[..], b"v2");

        assert!(store.delete("a.txt", false).await.is_err());
        assert!(store.delete("a.txt", true).await.unwrap());
        assert!(store.download("a.txt").await.unwrap().is_none());
        assert_eq!(store.snapshot_count("a.txt").await.unwrap(), 0);
        assert!(store.list_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_overwrite_keeps_current_version() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let key = LocalFsBlobStore::key("a.txt");

        store.upload("a.txt", Bytes::from_static(b"v1"), "text/plain").await.unwrap();

        // 元数据路径被目录占用，替换阶段失败
        fs::remove_file(store.meta_path(&key)).await.unwrap();
        fs::create_dir(store.meta_path(&key)).await.unwrap();

        let result = store.upload("a.txt", Bytes::from_static(b"v2"), "text/plain").await;
        assert!(result.is_err());
        assert_eq!(fs::read(store.object_path(&key)).await.unwrap(), b"v1");
        assert_eq!(store.snapshot_count("a.txt").await.unwrap(), 0);
        assert_eq!(count_entries(&store.objects_dir(), "test").await.unwrap(), 1);
        assert_eq!(count_entries(&store.meta_dir(), "test").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_first_upload_leaves_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.ensure_container_exists().await.unwrap();
        let key = LocalFsBlobStore::key("b.txt");
        fs::create_dir(store.meta_path(&key)).await.unwrap();

        let result = store.upload("b.txt", Bytes::from_static(b"v1"), "text/plain").await;
        assert!(result.is_err());
        assert!(!fs::try_exists(store.object_path(&key)).await.unwrap());
        assert_eq!(count_entries(&store.objects_dir(), "test").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_missing_returns_false() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert!(!store.delete("ghost.txt", true).await.unwrap());
        assert!(store.list_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let result = store
            .upload("../outside.txt", Bytes::from_static(b"x"), "text/plain")
            .await;
        assert!(matches!(result, Err(StorageError::InvalidName(_))));
    }
}
