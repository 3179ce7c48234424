use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;
use url::Url;

use taskboard_errors::{StorageError, StorageResult};

use super::validate_blob_name;

type HmacSha256 = Hmac<Sha256>;

/// 只读权限标记
const READ_PERMISSION: &str = "r";

/// 限时只读 URL 签发器
///
/// URL 形如 `{base}/{container}/{name}?se={expiry}&sp=r&sig={signature}`，
/// 签名为 HMAC-SHA256(`{container}/{name}\n{expiry}\n{permission}`)，URL-safe base64 编码。
#[derive(Clone)]
pub struct UrlSigner {
    base_url: Url,
    container: String,
    key: Vec<u8>,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner")
            .field("base_url", &self.base_url.as_str())
            .field("container", &self.container)
            .finish_non_exhaustive()
    }
}

impl UrlSigner {
    pub fn new(base_url: &str, container: &str, key: &[u8]) -> StorageResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StorageError::config_error(format!("无效的 public_base_url: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(StorageError::config_error(format!(
                "public_base_url 不能作为基础地址: {base_url}"
            )));
        }
        if key.is_empty() {
            return Err(StorageError::config_error("signing_key 不能为空"));
        }
        Ok(Self {
            base_url,
            container: container.to_string(),
            key: key.to_vec(),
        })
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    fn mac(&self, name: &str, expiry: i64) -> StorageResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|_| StorageError::config_error("failed to initialize hmac"))?;
        mac.update(self.container.as_bytes());
        mac.update(b"/");
        mac.update(name.as_bytes());
        mac.update(b"\n");
        mac.update(expiry.to_string().as_bytes());
        mac.update(b"\n");
        mac.update(READ_PERMISSION.as_bytes());
        Ok(mac)
    }

    /// 签发在 `ttl` 之后过期的只读 URL，不检查对象是否存在
    pub fn signed_read_url(&self, name: &str, ttl: Duration) -> StorageResult<String> {
        validate_blob_name(name)?;
        let expiry = Utc::now().timestamp().saturating_add(ttl.as_secs() as i64);
        let signature = URL_SAFE_NO_PAD.encode(self.mac(name, expiry)?.finalize().into_bytes());

        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StorageError::InvalidName(name.to_string()))?;
            segments.pop_if_empty().push(&self.container);
            for segment in name.split('/') {
                segments.push(segment);
            }
        }
        url.query_pairs_mut()
            .append_pair("se", &expiry.to_string())
            .append_pair("sp", READ_PERMISSION)
            .append_pair("sig", &signature);

        Ok(url.into())
    }

    /// 校验签名与有效期，`now` 为 Unix 秒
    pub fn verify(&self, name: &str, expiry: i64, signature: &str, now: i64) -> bool {
        if now > expiry {
            return false;
        }
        let Ok(provided) = URL_SAFE_NO_PAD.decode(signature) else {
            return false;
        };
        let Ok(mac) = self.mac(name, expiry) else {
            return false;
        };
        mac.verify_slice(&provided).is_ok()
    }
}
