use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{
    ChangeFeed, CommentStore, Directory, FileStore, NotificationStore, TicketStore,
};
use crate::session::Session;

/// Everything a command needs: resolved config, the authenticated session,
/// and the backend services behind their seams.
#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub session: Session,
    pub tickets: Arc<dyn TicketStore>,
    pub comments: Arc<dyn CommentStore>,
    pub notifications: Arc<dyn NotificationStore>,
    pub directory: Arc<dyn Directory>,
    pub files: Arc<dyn FileStore>,
    pub feed: Arc<dyn ChangeFeed>,
}

impl AppContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: AppConfig,
        session: Session,
        tickets: Arc<dyn TicketStore>,
        comments: Arc<dyn CommentStore>,
        notifications: Arc<dyn NotificationStore>,
        directory: Arc<dyn Directory>,
        files: Arc<dyn FileStore>,
        feed: Arc<dyn ChangeFeed>,
    ) -> Self {
        Self {
            config,
            session,
            tickets,
            comments,
            notifications,
            directory,
            files,
            feed,
        }
    }
}
