use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::user::UserProfile;
use crate::error::AppResult;
use crate::infra::rest::RestClient;
use crate::infra::tickets::ProfileRow;
use crate::services::Directory;
use crate::session::Session;

const TABLE: &str = "profiles";
const SELECT: &str = "id,email,full_name";

pub struct ProfileDirectory {
    rest: Arc<RestClient>,
}

impl ProfileDirectory {
    pub fn new(rest: Arc<RestClient>) -> Self {
        Self { rest }
    }
}

#[async_trait]
impl Directory for ProfileDirectory {
    async fn list_profiles(&self, session: &Session) -> AppResult<Vec<UserProfile>> {
        let rows: Vec<ProfileRow> = self
            .rest
            .select(
                session,
                TABLE,
                &[
                    ("select", SELECT.to_string()),
                    ("order", "email.asc".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(ProfileRow::into_domain).collect())
    }

    async fn get_profile(&self, session: &Session, user_id: &str) -> AppResult<UserProfile> {
        let row: ProfileRow = self
            .rest
            .select_one(
                session,
                TABLE,
                &[
                    ("select", SELECT.to_string()),
                    ("id", format!("eq.{user_id}")),
                ],
                "profile",
            )
            .await?;
        Ok(row.into_domain())
    }
}
