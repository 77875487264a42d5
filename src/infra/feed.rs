use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::warn;

use crate::config::AppConfig;
use crate::domain::comment::CommentChange;
use crate::error::{AppError, AppResult};
use crate::infra::comments::CommentRow;
use crate::services::ChangeFeed;
use crate::session::Session;

const CHANNEL_CAPACITY: usize = 64;

/// Persistent change subscription on the comment table. The backend streams
/// one JSON event per line; the connection stays open until either side
/// drops it.
pub struct CommentFeedClient {
    http: Client,
    base_url: Option<String>,
    anon_key: Option<String>,
}

impl CommentFeedClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.backend_url.clone(),
            anon_key: config.anon_key.clone(),
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

    fn changes_endpoint(base_url: &str) -> String {
        format!("{}/realtime/v1/changes", base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChangeFeed for CommentFeedClient {
    async fn subscribe_comments(
        &self,
        session: &Session,
        ticket_id: i64,
    ) -> AppResult<mpsc::Receiver<CommentChange>> {
        let (base_url, anon_key) = self.api_details()?;
        let response = self
            .http
            .get(Self::changes_endpoint(base_url))
            .query(&[
                ("table", "comentarios".to_string()),
                ("demanda_id", format!("eq.{ticket_id}")),
            ])
            .header("apikey", anon_key)
            .header(AUTHORIZATION, format!("Bearer {}", session.access_token))
            .header(ACCEPT, "application/x-ndjson")
            .send()
            .await
            .map_err(|err| AppError::Backend(format!("failed to open change feed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(AppError::Backend(format!(
                "change feed responded with {status}: {body}"
            )));
        }

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(pump_events(response.bytes_stream(), tx));
        Ok(rx)
    }
}

async fn pump_events<S, B>(stream: S, tx: mpsc::Sender<CommentChange>)
where
    S: Stream<Item = Result<B, reqwest::Error>>,
    B: AsRef<[u8]>,
{
    let mut stream = std::pin::pin!(stream);
    let mut buffer = String::new();
    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(err) => {
                warn!("change feed interrupted: {err}");
                return;
            }
        };
        buffer.push_str(&String::from_utf8_lossy(chunk.as_ref()));
        while let Some(newline) = buffer.find('\n') {
            let line = buffer[..newline].trim().to_string();
            buffer.drain(..=newline);
            if let Some(change) = parse_change_line(&line) {
                if tx.send(change).await.is_err() {
                    return;
                }
            }
        }
    }
}

fn parse_change_line(line: &str) -> Option<CommentChange> {
    // Blank lines and ":" comments are keepalives.
    if line.is_empty() || line.starts_with(':') {
        return None;
    }
    let event: ChangeEventRow = match serde_json::from_str(line) {
        Ok(event) => event,
        Err(err) => {
            warn!("discarding unparseable change event: {err}");
            return None;
        }
    };
    match event.kind.as_str() {
        "INSERT" => Some(CommentChange::Inserted(event.record?.into_domain())),
        "UPDATE" => Some(CommentChange::Updated(event.record?.into_domain())),
        "DELETE" => Some(CommentChange::Deleted {
            id: event.old_record?.id,
        }),
        other => {
            warn!("ignoring change event of unknown type {other}");
            None
        }
    }
}

#[derive(Deserialize)]
struct ChangeEventRow {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    record: Option<CommentRow>,
    #[serde(default)]
    old_record: Option<DeletedRow>,
}

#[derive(Deserialize)]
struct DeletedRow {
    id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_insert_events() {
        let line = r#"{"type":"INSERT","record":{"id":11,"demanda_id":7,"user_id":"u-2","texto":"oi","created_at":"2024-03-02T09:30:00Z"}}"#;
        match parse_change_line(line) {
            Some(CommentChange::Inserted(comment)) => {
                assert_eq!(comment.id, 11);
                assert_eq!(comment.ticket_id, 7);
            }
            other => panic!("expected insert, got {other:?}"),
        }
    }

    #[test]
    fn parses_delete_events() {
        let line = r#"{"type":"DELETE","old_record":{"id":11}}"#;
        match parse_change_line(line) {
            Some(CommentChange::Deleted { id }) => assert_eq!(id, 11),
            other => panic!("expected delete, got {other:?}"),
        }
    }

    #[test]
    fn keepalives_and_garbage_are_dropped() {
        assert!(parse_change_line("").is_none());
        assert!(parse_change_line(": ping").is_none());
        assert!(parse_change_line("not json").is_none());
        assert!(parse_change_line(r#"{"type":"TRUNCATE"}"#).is_none());
    }
}
