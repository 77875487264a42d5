pub mod change_feed;
pub mod comment_store;
pub mod file_store;
pub mod identity;
pub mod notification_store;
pub mod ticket_store;

pub use change_feed::ChangeFeed;
pub use comment_store::CommentStore;
pub use file_store::FileStore;
pub use identity::{AuthService, Directory, SignUpOutcome};
pub use notification_store::NotificationStore;
pub use ticket_store::TicketStore;
