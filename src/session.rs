use std::fs;
use std::path::{Path, PathBuf};

use base64::prelude::{BASE64_URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::config::config_directory;
use crate::domain::user::UserProfile;
use crate::error::{AppError, AppResult};

const SESSION_FILE_NAME: &str = "session.json";

/// Authenticated session handed to every store call. Persisted between
/// invocations so the user signs in once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user: UserProfile,
}

impl Session {
    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    /// Expiry read from the token's claims segment. `None` when the token is
    /// opaque or the claims carry no `exp`.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        token_expiry(&self.access_token)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at() {
            Some(expiry) => expiry <= now,
            None => false,
        }
    }

    pub fn load() -> AppResult<Option<Self>> {
        Self::load_from(&session_file_path()?)
    }

    pub fn save(&self) -> AppResult<()> {
        self.save_to(&session_file_path()?)
    }

    pub fn clear() -> AppResult<()> {
        let path = session_file_path()?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    fn load_from(path: &Path) -> AppResult<Option<Self>> {
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).map(Some).map_err(|err| {
                AppError::Auth(format!("invalid session file {}: {err}", path.display()))
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)
            .map_err(|err| AppError::Auth(format!("failed to encode session: {err}")))?;
        fs::write(path, data)?;
        Ok(())
    }
}

pub fn session_file_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(SESSION_FILE_NAME))
}

#[derive(Deserialize)]
struct TokenClaims {
    exp: Option<i64>,
}

fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let claims_segment = token.split('.').nth(1)?;
    let decoded = BASE64_URL_SAFE_NO_PAD.decode(claims_segment).ok()?;
    let claims: TokenClaims = serde_json::from_slice(&decoded).ok()?;
    Utc.timestamp_opt(claims.exp?, 0).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with_exp(exp: i64) -> String {
        let claims = BASE64_URL_SAFE_NO_PAD.encode(format!("{{\"exp\":{exp}}}"));
        format!("header.{claims}.signature")
    }

    fn sample_session() -> Session {
        Session {
            access_token: token_with_exp(4_102_444_800),
            user: UserProfile {
                id: "u-1".to_string(),
                email: "ana@example.com".to_string(),
                full_name: Some("Ana Lima".to_string()),
            },
        }
    }

    #[test]
    fn session_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SESSION_FILE_NAME);

        sample_session().save_to(&path).unwrap();
        let loaded = Session::load_from(&path).unwrap().unwrap();
        assert_eq!(loaded.user_id(), "u-1");
        assert_eq!(loaded.user.email, "ana@example.com");
    }

    #[test]
    fn missing_session_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Session::load_from(&dir.path().join("absent.json"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn reads_expiry_from_token_claims() {
        let session = Session {
            access_token: token_with_exp(1_700_000_000),
            ..sample_session()
        };
        let expiry = session.expires_at().unwrap();
        assert_eq!(expiry.timestamp(), 1_700_000_000);
        assert!(session.is_expired(Utc.timestamp_opt(1_700_000_001, 0).unwrap()));
        assert!(!session.is_expired(Utc.timestamp_opt(1_600_000_000, 0).unwrap()));
    }

    #[test]
    fn opaque_token_has_no_expiry() {
        let session = Session {
            access_token: "not-a-jwt".to_string(),
            ..sample_session()
        };
        assert!(session.expires_at().is_none());
        assert!(!session.is_expired(Utc::now()));
    }
}
