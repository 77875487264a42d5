use async_trait::async_trait;

use crate::domain::notification::{Notification, NotificationDraft};
use crate::error::AppResult;
use crate::session::Session;

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// One user's notifications, newest-first.
    async fn list(&self, session: &Session, user_id: &str) -> AppResult<Vec<Notification>>;
    /// Exact unread count computed server-side; no rows are transferred.
    async fn count_unread(&self, session: &Session, user_id: &str) -> AppResult<u64>;
    async fn mark_as_read(&self, session: &Session, id: i64) -> AppResult<()>;
    /// Flips every unread row belonging to `user_id`; other users' rows are
    /// untouched.
    async fn mark_all_as_read(&self, session: &Session, user_id: &str) -> AppResult<()>;
    async fn delete(&self, session: &Session, id: i64) -> AppResult<()>;
    /// Bulk insert: all rows for one triggering event in a single request.
    async fn create_many(
        &self,
        session: &Session,
        drafts: Vec<NotificationDraft>,
    ) -> AppResult<()>;
}
