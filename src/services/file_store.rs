use async_trait::async_trait;

use crate::error::AppResult;
use crate::session::Session;

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Uploads under the given object key and returns the public URL.
    async fn upload(
        &self,
        session: &Session,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> AppResult<String>;
}
