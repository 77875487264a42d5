use async_trait::async_trait;

use crate::domain::comment::{Comment, CommentDraft};
use crate::error::AppResult;
use crate::session::Session;

#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Comments for one ticket, oldest-first, joined with author profiles.
    async fn list_for_ticket(&self, session: &Session, ticket_id: i64) -> AppResult<Vec<Comment>>;
    async fn get(&self, session: &Session, id: i64) -> AppResult<Comment>;
    /// Inserts a comment authored by the session user.
    async fn create(&self, session: &Session, draft: CommentDraft) -> AppResult<Comment>;
    async fn update(&self, session: &Session, id: i64, text: &str) -> AppResult<Comment>;
    async fn delete(&self, session: &Session, id: i64) -> AppResult<()>;
}
