//! In-memory service fakes backing the workflow tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::context::AppContext;
use crate::domain::comment::{Comment, CommentChange, CommentDraft};
use crate::domain::notification::{Notification, NotificationDraft};
use crate::domain::ticket::{Ticket, TicketDraft, TicketPatch};
use crate::domain::user::UserProfile;
use crate::error::{AppError, AppResult};
use crate::services::{
    ChangeFeed, CommentStore, Directory, FileStore, NotificationStore, TicketStore,
};
use crate::session::Session;

pub fn session(id: &str, email: &str, full_name: Option<&str>) -> Session {
    Session {
        access_token: "test-token".to_string(),
        user: UserProfile {
            id: id.to_string(),
            email: email.to_string(),
            full_name: full_name.map(str::to_string),
        },
    }
}

pub fn profile(id: &str, email: &str, full_name: Option<&str>) -> UserProfile {
    UserProfile {
        id: id.to_string(),
        email: email.to_string(),
        full_name: full_name.map(str::to_string),
    }
}

#[derive(Default)]
pub struct FakeTickets {
    pub rows: Mutex<Vec<Ticket>>,
    next_id: AtomicI64,
}

impl FakeTickets {
    pub fn with(rows: Vec<Ticket>) -> Arc<Self> {
        let next = rows.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        Arc::new(Self {
            rows: Mutex::new(rows),
            next_id: AtomicI64::new(next),
        })
    }
}

#[async_trait]
impl TicketStore for FakeTickets {
    async fn list(&self, _session: &Session) -> AppResult<Vec<Ticket>> {
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn get(&self, _session: &Session, id: i64) -> AppResult<Ticket> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("ticket".to_string()))
    }

    async fn create(&self, session: &Session, draft: TicketDraft) -> AppResult<Ticket> {
        let ticket = Ticket {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            title: draft.title,
            description: draft.description,
            status: draft.status,
            priority: draft.priority,
            requesting_area: draft.requesting_area,
            responsible_area: draft.responsible_area,
            ad_server: draft.ad_server,
            agency: draft.agency,
            final_client: draft.final_client,
            deadline: Some(draft.deadline),
            notes: draft.notes,
            responsible: draft.responsible,
            created_by: Some(session.user_id().to_string()),
            last_edited_by: None,
            created_at: Utc::now(),
            updated_at: None,
            comment_count: 0,
            creator: Some(session.user.clone()),
        };
        self.rows.lock().unwrap().push(ticket.clone());
        Ok(ticket)
    }

    async fn update(&self, session: &Session, id: i64, patch: TicketPatch) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let ticket = rows
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| AppError::NotFound("ticket".to_string()))?;
        if let Some(title) = patch.title {
            ticket.title = title;
        }
        if let Some(description) = patch.description {
            ticket.description = description;
        }
        if let Some(status) = patch.status {
            ticket.status = status;
        }
        if let Some(priority) = patch.priority {
            ticket.priority = priority;
        }
        if let Some(area) = patch.requesting_area {
            ticket.requesting_area = area;
        }
        if let Some(area) = patch.responsible_area {
            ticket.responsible_area = area;
        }
        if let Some(ad_server) = patch.ad_server {
            ticket.ad_server = ad_server;
        }
        if let Some(agency) = patch.agency {
            ticket.agency = agency;
        }
        if let Some(client) = patch.final_client {
            ticket.final_client = client;
        }
        if let Some(deadline) = patch.deadline {
            ticket.deadline = Some(deadline);
        }
        if let Some(notes) = patch.notes {
            ticket.notes = notes;
        }
        if let Some(responsible) = patch.responsible {
            ticket.responsible = Some(responsible);
        }
        ticket.last_edited_by = Some(session.user_id().to_string());
        ticket.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn delete(&self, _session: &Session, id: i64) -> AppResult<()> {
        self.rows.lock().unwrap().retain(|t| t.id != id);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeComments {
    pub rows: Mutex<Vec<Comment>>,
    next_id: AtomicI64,
}

impl FakeComments {
    pub fn with(rows: Vec<Comment>) -> Arc<Self> {
        let next = rows.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        Arc::new(Self {
            rows: Mutex::new(rows),
            next_id: AtomicI64::new(next),
        })
    }
}

#[async_trait]
impl CommentStore for FakeComments {
    async fn list_for_ticket(&self, _session: &Session, ticket_id: i64) -> AppResult<Vec<Comment>> {
        let mut rows: Vec<Comment> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.ticket_id == ticket_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows)
    }

    async fn get(&self, _session: &Session, id: i64) -> AppResult<Comment> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("comment".to_string()))
    }

    async fn create(&self, session: &Session, draft: CommentDraft) -> AppResult<Comment> {
        let comment = Comment {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            ticket_id: draft.ticket_id,
            author_id: session.user_id().to_string(),
            text: draft.text,
            attachments: draft.attachments,
            created_at: Utc::now(),
            author: Some(session.user.clone()),
        };
        self.rows.lock().unwrap().push(comment.clone());
        Ok(comment)
    }

    async fn update(&self, _session: &Session, id: i64, text: &str) -> AppResult<Comment> {
        let mut rows = self.rows.lock().unwrap();
        let comment = rows
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::NotFound("comment".to_string()))?;
        comment.text = text.to_string();
        Ok(comment.clone())
    }

    async fn delete(&self, _session: &Session, id: i64) -> AppResult<()> {
        self.rows.lock().unwrap().retain(|c| c.id != id);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeNotifications {
    pub rows: Mutex<Vec<Notification>>,
    next_id: AtomicI64,
}

impl FakeNotifications {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        })
    }
}

#[async_trait]
impl NotificationStore for FakeNotifications {
    async fn list(&self, _session: &Session, user_id: &str) -> AppResult<Vec<Notification>> {
        let mut rows: Vec<Notification> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn count_unread(&self, _session: &Session, user_id: &str) -> AppResult<u64> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_id == user_id && !n.read)
            .count() as u64)
    }

    async fn mark_as_read(&self, _session: &Session, id: i64) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|n| n.id == id) {
            row.read = true;
        }
        Ok(())
    }

    async fn mark_all_as_read(&self, _session: &Session, user_id: &str) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        for row in rows.iter_mut().filter(|n| n.user_id == user_id && !n.read) {
            row.read = true;
        }
        Ok(())
    }

    async fn delete(&self, _session: &Session, id: i64) -> AppResult<()> {
        self.rows.lock().unwrap().retain(|n| n.id != id);
        Ok(())
    }

    async fn create_many(
        &self,
        _session: &Session,
        drafts: Vec<NotificationDraft>,
    ) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        for draft in drafts {
            rows.push(Notification {
                id: self.next_id.fetch_add(1, Ordering::SeqCst),
                user_id: draft.user_id,
                kind: draft.kind,
                title: draft.title,
                message: draft.message,
                extras: draft.extras,
                read: false,
                created_at: Utc::now(),
            });
        }
        Ok(())
    }
}

pub struct FakeDirectory {
    pub profiles: Vec<UserProfile>,
}

impl FakeDirectory {
    pub fn with(profiles: Vec<UserProfile>) -> Arc<Self> {
        Arc::new(Self { profiles })
    }
}

#[async_trait]
impl Directory for FakeDirectory {
    async fn list_profiles(&self, _session: &Session) -> AppResult<Vec<UserProfile>> {
        Ok(self.profiles.clone())
    }

    async fn get_profile(&self, _session: &Session, user_id: &str) -> AppResult<UserProfile> {
        self.profiles
            .iter()
            .find(|p| p.id == user_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("profile".to_string()))
    }
}

#[derive(Default)]
pub struct FakeFiles {
    pub uploads: Mutex<Vec<String>>,
}

#[async_trait]
impl FileStore for FakeFiles {
    async fn upload(
        &self,
        _session: &Session,
        key: &str,
        _bytes: Vec<u8>,
        _content_type: &str,
    ) -> AppResult<String> {
        self.uploads.lock().unwrap().push(key.to_string());
        Ok(format!("https://files.test/{key}"))
    }
}

/// Hands out one pre-built receiver; tests hold the sender side.
#[derive(Default)]
pub struct FakeFeed {
    receiver: Mutex<Option<mpsc::Receiver<CommentChange>>>,
}

impl FakeFeed {
    pub fn with_channel() -> (Arc<Self>, mpsc::Sender<CommentChange>) {
        let (tx, rx) = mpsc::channel(16);
        let feed = Arc::new(Self {
            receiver: Mutex::new(Some(rx)),
        });
        (feed, tx)
    }
}

#[async_trait]
impl ChangeFeed for FakeFeed {
    async fn subscribe_comments(
        &self,
        _session: &Session,
        _ticket_id: i64,
    ) -> AppResult<mpsc::Receiver<CommentChange>> {
        self.receiver
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| AppError::Backend("feed already subscribed".to_string()))
    }
}

pub struct ContextBuilder {
    pub session: Session,
    pub tickets: Arc<FakeTickets>,
    pub comments: Arc<FakeComments>,
    pub notifications: Arc<FakeNotifications>,
    pub directory: Arc<FakeDirectory>,
    pub files: Arc<FakeFiles>,
    pub feed: Arc<FakeFeed>,
}

impl ContextBuilder {
    pub fn new(session: Session, profiles: Vec<UserProfile>) -> Self {
        Self {
            session,
            tickets: FakeTickets::with(Vec::new()),
            comments: FakeComments::with(Vec::new()),
            notifications: FakeNotifications::new(),
            directory: FakeDirectory::with(profiles),
            files: Arc::new(FakeFiles::default()),
            feed: Arc::new(FakeFeed::default()),
        }
    }

    pub fn build(&self) -> AppContext {
        AppContext::new(
            AppConfig {
                backend_url: Some("https://backend.test".to_string()),
                anon_key: Some("anon".to_string()),
                attachments_bucket: "anexos".to_string(),
            },
            self.session.clone(),
            self.tickets.clone(),
            self.comments.clone(),
            self.notifications.clone(),
            self.directory.clone(),
            self.files.clone(),
            self.feed.clone(),
        )
    }
}
