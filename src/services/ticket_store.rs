use async_trait::async_trait;

use crate::domain::ticket::{Ticket, TicketDraft, TicketPatch};
use crate::error::AppResult;
use crate::session::Session;

#[async_trait]
pub trait TicketStore: Send + Sync {
    /// All tickets newest-first, with comment counts and creator profiles.
    async fn list(&self, session: &Session) -> AppResult<Vec<Ticket>>;
    async fn get(&self, session: &Session, id: i64) -> AppResult<Ticket>;
    /// Inserts one row stamped with the session user as creator.
    async fn create(&self, session: &Session, draft: TicketDraft) -> AppResult<Ticket>;
    /// Patches the given fields, stamping the session user as last editor.
    async fn update(&self, session: &Session, id: i64, patch: TicketPatch) -> AppResult<()>;
    async fn delete(&self, session: &Session, id: i64) -> AppResult<()>;
}
