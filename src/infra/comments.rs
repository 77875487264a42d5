use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::comment::{Attachment, Comment, CommentDraft};
use crate::error::{AppError, AppResult};
use crate::infra::rest::RestClient;
use crate::infra::tickets::ProfileRow;
use crate::services::CommentStore;
use crate::session::Session;

const TABLE: &str = "comentarios";
const LIST_SELECT: &str = "*,profile:profiles(id,email,full_name)";

pub struct CommentTable {
    rest: Arc<RestClient>,
}

impl CommentTable {
    pub fn new(rest: Arc<RestClient>) -> Self {
        Self { rest }
    }
}

#[async_trait]
impl CommentStore for CommentTable {
    async fn list_for_ticket(&self, session: &Session, ticket_id: i64) -> AppResult<Vec<Comment>> {
        let rows: Vec<CommentRow> = self
            .rest
            .select(
                session,
                TABLE,
                &[
                    ("select", LIST_SELECT.to_string()),
                    ("demanda_id", format!("eq.{ticket_id}")),
                    ("order", "created_at.asc".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(CommentRow::into_domain).collect())
    }

    async fn get(&self, session: &Session, id: i64) -> AppResult<Comment> {
        let row: CommentRow = self
            .rest
            .select_one(
                session,
                TABLE,
                &[
                    ("select", LIST_SELECT.to_string()),
                    ("id", format!("eq.{id}")),
                ],
                "comment",
            )
            .await?;
        Ok(row.into_domain())
    }

    async fn create(&self, session: &Session, draft: CommentDraft) -> AppResult<Comment> {
        let row = NewCommentRow {
            demanda_id: draft.ticket_id,
            user_id: session.user_id(),
            texto: &draft.text,
            anexos: &draft.attachments,
        };
        let mut created: Vec<CommentRow> = self
            .rest
            .insert_returning(session, TABLE, &[row], LIST_SELECT)
            .await?;
        if created.is_empty() {
            return Err(AppError::Backend(
                "insert returned no comment row".to_string(),
            ));
        }
        Ok(created.swap_remove(0).into_domain())
    }

    async fn update(&self, session: &Session, id: i64, text: &str) -> AppResult<Comment> {
        let mut updated: Vec<CommentRow> = self
            .rest
            .update_returning(
                session,
                TABLE,
                &[("id", format!("eq.{id}"))],
                &CommentPatchRow { texto: text },
                LIST_SELECT,
            )
            .await?;
        if updated.is_empty() {
            return Err(AppError::NotFound("comment".to_string()));
        }
        Ok(updated.swap_remove(0).into_domain())
    }

    async fn delete(&self, session: &Session, id: i64) -> AppResult<()> {
        self.rest
            .delete(session, TABLE, &[("id", format!("eq.{id}"))])
            .await
    }
}

#[derive(Deserialize)]
pub(crate) struct CommentRow {
    id: i64,
    demanda_id: i64,
    user_id: String,
    #[serde(default)]
    texto: Option<String>,
    #[serde(default)]
    anexos: Vec<Attachment>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    profile: Option<ProfileRow>,
}

impl CommentRow {
    pub(crate) fn into_domain(self) -> Comment {
        Comment {
            id: self.id,
            ticket_id: self.demanda_id,
            author_id: self.user_id,
            text: self.texto.unwrap_or_default(),
            attachments: self.anexos,
            created_at: self.created_at,
            author: self.profile.map(ProfileRow::into_domain),
        }
    }
}

#[derive(Serialize)]
struct NewCommentRow<'a> {
    demanda_id: i64,
    user_id: &'a str,
    texto: &'a str,
    anexos: &'a [Attachment],
}

#[derive(Serialize)]
struct CommentPatchRow<'a> {
    texto: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_maps_attachments_and_author() {
        let json = r#"{
            "id": 11,
            "demanda_id": 7,
            "user_id": "u-2",
            "texto": "Segue o material @ana",
            "anexos": [
                {"name": "banner.png", "url": "https://cdn/banner.png", "size": 2048, "type": "image/png"}
            ],
            "created_at": "2024-03-02T09:30:00Z",
            "profile": {"id": "u-2", "email": "bruno@example.com", "full_name": null}
        }"#;
        let comment: Comment = serde_json::from_str::<CommentRow>(json)
            .unwrap()
            .into_domain();
        assert_eq!(comment.ticket_id, 7);
        assert_eq!(comment.attachments.len(), 1);
        assert_eq!(comment.attachments[0].content_type, "image/png");
        assert_eq!(comment.author.unwrap().display_name(), "bruno@example.com");
    }

    #[test]
    fn missing_attachment_list_reads_as_empty() {
        let json = r#"{
            "id": 12,
            "demanda_id": 7,
            "user_id": "u-2",
            "texto": null,
            "created_at": "2024-03-02T09:30:00Z"
        }"#;
        let comment: Comment = serde_json::from_str::<CommentRow>(json)
            .unwrap()
            .into_domain();
        assert!(comment.attachments.is_empty());
        assert_eq!(comment.text, "");
    }
}
