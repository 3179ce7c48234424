//! 请求体中 `base64File` 字段的解码
//!
//! 支持纯 base64 文本，也支持带 data URL 前缀的形式
//! （`data:image/png;base64,iVBOR...`），前缀中的媒体类型作为附件的内容类型。

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use taskboard_domain::Attachment;

#[derive(Debug, thiserror::Error)]
pub enum FileDecodeError {
    #[error("data URL 格式无效: {0}")]
    MalformedDataUrl(String),
    #[error("base64 内容无法解码: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// 把 base64 文本解码为附件
pub fn decode_attachment(raw: &str) -> Result<Attachment, FileDecodeError> {
    let (content_type, payload) = split_data_url(raw.trim())?;

    // 客户端可能按行折断 base64 文本
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let content = STANDARD.decode(compact.as_bytes())?;

    let attachment = Attachment::new(content);
    Ok(match content_type {
        Some(content_type) => attachment.with_content_type(content_type),
        None => attachment,
    })
}

fn split_data_url(raw: &str) -> Result<(Option<&str>, &str), FileDecodeError> {
    let Some(rest) = raw.strip_prefix("data:") else {
        return Ok((None, raw));
    };

    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| FileDecodeError::MalformedDataUrl("缺少逗号分隔符".to_string()))?;
    let media_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| FileDecodeError::MalformedDataUrl(format!("不是 base64 编码: {header}")))?;

    // 只保留媒体类型本身，丢弃 charset 等参数
    let media_type = media_type.split(';').next().unwrap_or_default().trim();
    let content_type = (!media_type.is_empty()).then_some(media_type);
    Ok((content_type, payload))
}
