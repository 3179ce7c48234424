//! 值对象
//!
//! 截止时间统一以 UTC 表示。调用方既可以提交带时区偏移的 RFC 3339 时间，
//! 也可以提交不带偏移的本地格式，后者按 UTC 解释。
//!
//! 附件名称同时是 Blob 存储中的对象名，写入任何存储之前就要校验。

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

const MAX_FILE_NAME_LEN: usize = 1024;

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// 解析截止时间并归一化为 UTC
pub fn parse_deadline(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("无法解析截止时间: {raw}"))
}

/// serde 反序列化辅助函数，配合 `#[serde(deserialize_with = "...")]` 使用
pub fn deserialize_deadline<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_deadline(&raw).map_err(serde::de::Error::custom)
}

/// 校验附件名称：非空、不超过 1024 字节、不含控制字符与反斜杠，
/// 不以 `/` 开头，且不含 `.` 或 `..` 路径段
pub fn validate_file_name(name: &str) -> Result<(), String> {
    let valid = !name.is_empty()
        && name.len() <= MAX_FILE_NAME_LEN
        && !name.starts_with('/')
        && !name.chars().any(|c| c.is_control() || c == '\\')
        && name.split('/').all(|segment| segment != "." && segment != "..");
    if valid {
        Ok(())
    } else {
        Err(format!("无效的附件名称: {name}"))
    }
}
