use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::comment::CommentChange;
use crate::error::AppResult;
use crate::session::Session;

#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Persistent subscription to insert/update/delete events on the comment
    /// table, filtered to one ticket. The channel closes when the backend
    /// drops the connection; there is no reconnect.
    async fn subscribe_comments(
        &self,
        session: &Session,
        ticket_id: i64,
    ) -> AppResult<mpsc::Receiver<CommentChange>>;
}
