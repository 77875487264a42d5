use async_trait::async_trait;
use blake3::Hasher;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::services::FileStore;
use crate::session::Session;

/// Attachment uploads into the backend's object bucket.
pub struct ObjectBucket {
    http: Client,
    base_url: Option<String>,
    anon_key: Option<String>,
    bucket: String,
}

impl ObjectBucket {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.backend_url.clone(),
            anon_key: config.anon_key.clone(),
            bucket: config.attachments_bucket.clone(),
        }
    }

    fn api_details(&self) -> AppResult<(&str, &str)> {
        let base_url = self.base_url.as_deref().ok_or_else(|| {
            AppError::Configuration("backend URL not configured".to_string())
        })?;
        let anon_key = self.anon_key.as_deref().ok_or_else(|| {
            AppError::Configuration("backend anon key not configured".to_string())
        })?;
        Ok((base_url, anon_key))
    }

    fn upload_endpoint(base_url: &str, bucket: &str, key: &str) -> String {
        format!(
            "{}/storage/v1/object/{bucket}/{key}",
            base_url.trim_end_matches('/')
        )
    }

    fn public_url(base_url: &str, bucket: &str, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{bucket}/{key}",
            base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl FileStore for ObjectBucket {
    async fn upload(
        &self,
        session: &Session,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> AppResult<String> {
        let (base_url, anon_key) = self.api_details()?;
        let response = self
            .http
            .post(Self::upload_endpoint(base_url, &self.bucket, key))
            .header("apikey", anon_key)
            .header(AUTHORIZATION, format!("Bearer {}", session.access_token))
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|err| AppError::Storage(format!("failed to reach object storage: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(AppError::Storage(format!(
                "object storage responded with {status}: {body}"
            )));
        }
        Ok(Self::public_url(base_url, &self.bucket, key))
    }
}

/// Content-addressed object key: ticket scope, content hash prefix, then the
/// sanitized original name so downloads keep a recognizable filename.
pub fn object_key(ticket_id: i64, file_name: &str, bytes: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    let digest = hasher.finalize().to_hex();
    format!("{ticket_id}/{}-{}", &digest.as_str()[..16], sanitize(file_name))
}

fn sanitize(name: &str) -> String {
    let clean: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let trimmed = clean.trim_matches('-');
    if trimmed.is_empty() {
        "arquivo".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_keys_are_stable_for_same_content() {
        let a = object_key(7, "banner.png", b"bytes");
        let b = object_key(7, "banner.png", b"bytes");
        assert_eq!(a, b);
        assert!(a.starts_with("7/"));
        assert!(a.ends_with("-banner.png"));
    }

    #[test]
    fn object_keys_differ_by_content() {
        assert_ne!(
            object_key(7, "banner.png", b"one"),
            object_key(7, "banner.png", b"two")
        );
    }

    #[test]
    fn sanitizes_awkward_file_names() {
        let key = object_key(7, "relatório final (v2).pdf", b"x");
        assert!(!key.contains(' '));
        assert!(!key.contains('('));
        assert!(key.ends_with(".pdf"));
    }

    #[test]
    fn empty_name_gets_a_placeholder() {
        let key = object_key(7, "???", b"x");
        assert!(key.ends_with("-arquivo"));
    }

    #[test]
    fn builds_storage_urls() {
        assert_eq!(
            ObjectBucket::public_url("https://backend.example.com/", "anexos", "7/abc-banner.png"),
            "https://backend.example.com/storage/v1/object/public/anexos/7/abc-banner.png"
        );
        assert_eq!(
            ObjectBucket::upload_endpoint("https://backend.example.com", "anexos", "k"),
            "https://backend.example.com/storage/v1/object/anexos/k"
        );
    }
}
