use async_trait::async_trait;

use crate::domain::user::UserProfile;
use crate::error::AppResult;
use crate::session::Session;

/// Result of a sign-up attempt. Backends that require email confirmation
/// return no session.
#[derive(Debug, Clone)]
pub enum SignUpOutcome {
    SignedIn(Session),
    ConfirmationRequired { email: String },
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session>;
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<SignUpOutcome>;
    /// Provider authorize URL for the OAuth flow; the browser round trip is
    /// the caller's business.
    fn authorize_url(&self, provider: &str) -> AppResult<String>;
}

/// Read-only view of the backend's user directory.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn list_profiles(&self, session: &Session) -> AppResult<Vec<UserProfile>>;
    async fn get_profile(&self, session: &Session, user_id: &str) -> AppResult<UserProfile>;
}
