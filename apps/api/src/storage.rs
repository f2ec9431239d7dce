use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

pub const ALLOWED_RESUME_EXTENSIONS: &[&str] = &["pdf", "docx", "png", "jpg", "jpeg"];

/// Stores an uploaded resume under `resumes/{uuid}_{filename}` and returns the key.
pub async fn store_resume(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    filename: &str,
    bytes: Bytes,
) -> Result<String, AppError> {
    let key = format!("resumes/{}_{}", Uuid::new_v4(), filename);

    s3.put_object()
        .bucket(bucket)
        .key(&key)
        .body(ByteStream::from(bytes))
        .content_type(content_type_for(filename))
        .send()
        .await
        .map_err(|e| AppError::Storage(format!("S3 upload failed: {e}")))?;

    info!("Stored resume at s3://{bucket}/{key}");
    Ok(key)
}

pub fn extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

pub fn is_allowed_resume(filename: &str) -> bool {
    extension(filename)
        .map(|ext| ALLOWED_RESUME_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Keeps ASCII letters, digits, `.`, `-` and `_`; whitespace becomes `_`.
/// Path components and leading dots are dropped.
pub fn sanitize_filename(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();

    cleaned.trim_start_matches(['.', '_']).to_string()
}

fn content_type_for(filename: &str) -> &'static str {
    match extension(filename).as_deref() {
        Some("pdf") => "application/pdf",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}
