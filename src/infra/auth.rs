use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::domain::user::UserProfile;
use crate::error::{AppError, AppResult};
use crate::services::{AuthService, SignUpOutcome};
use crate::session::Session;

/// Email/password and OAuth flows against the backend's identity endpoint.
pub struct AuthClient {
    http: Client,
    base_url: Option<String>,
    anon_key: Option<String>,
}

impl AuthClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.backend_url.clone(),
            anon_key: config.anon_key.clone(),
        }
    }

    fn api_details(&self) -> AppResult<(&str, &str)> {
        let base_url = self.base_url.as_deref().ok_or_else(|| {
            AppError::Configuration("backend URL not configured".to_string())
        })?;
        let anon_key = self.anon_key.as_deref().ok_or_else(|| {
            AppError::Configuration("backend anon key not configured".to_string())
        })?;
        Ok((base_url, anon_key))
    }

    fn auth_endpoint(base_url: &str, path: &str) -> String {
        format!("{}/auth/v1/{path}", base_url.trim_end_matches('/'))
    }

    async fn post_credentials(
        &self,
        path: &str,
        query: &[(&str, &str)],
        email: &str,
        password: &str,
    ) -> AppResult<reqwest::Response> {
        let (base_url, anon_key) = self.api_details()?;
        let response = self
            .http
            .post(Self::auth_endpoint(base_url, path))
            .query(query)
            .header("apikey", anon_key)
            .header(CONTENT_TYPE, "application/json")
            .json(&CredentialsBody { email, password })
            .send()
            .await
            .map_err(|err| AppError::Auth(format!("failed to reach auth endpoint: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(AppError::Auth(format!(
                "auth endpoint responded with {status}: {body}"
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl AuthService for AuthClient {
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session> {
        let response = self
            .post_credentials("token", &[("grant_type", "password")], email, password)
            .await?;
        let payload: TokenResponse = response
            .json()
            .await
            .map_err(|err| AppError::Auth(format!("failed to parse auth response: {err}")))?;
        Ok(Session {
            access_token: payload.access_token,
            user: payload.user.into_domain(),
        })
    }

    async fn sign_up(&self, email: &str, password: &str) -> AppResult<SignUpOutcome> {
        let response = self.post_credentials("signup", &[], email, password).await?;
        let payload: SignUpResponse = response
            .json()
            .await
            .map_err(|err| AppError::Auth(format!("failed to parse signup response: {err}")))?;
        match (payload.access_token, payload.user) {
            (Some(access_token), Some(user)) => Ok(SignUpOutcome::SignedIn(Session {
                access_token,
                user: user.into_domain(),
            })),
            _ => Ok(SignUpOutcome::ConfirmationRequired {
                email: email.to_string(),
            }),
        }
    }

    fn authorize_url(&self, provider: &str) -> AppResult<String> {
        let (base_url, _) = self.api_details()?;
        Ok(format!(
            "{}?provider={provider}",
            Self::auth_endpoint(base_url, "authorize")
        ))
    }
}

#[derive(Serialize)]
struct CredentialsBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: AuthUserRow,
}

#[derive(Deserialize)]
struct SignUpResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<AuthUserRow>,
}

#[derive(Deserialize)]
struct AuthUserRow {
    id: String,
    email: String,
    #[serde(default)]
    user_metadata: Option<UserMetadataRow>,
}

#[derive(Deserialize)]
struct UserMetadataRow {
    #[serde(default)]
    full_name: Option<String>,
}

impl AuthUserRow {
    fn into_domain(self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email,
            full_name: self.user_metadata.and_then(|meta| meta.full_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_response_maps_user_metadata() {
        let json = r#"{
            "access_token": "jwt",
            "user": {
                "id": "u-1",
                "email": "ana@example.com",
                "user_metadata": {"full_name": "Ana Lima"}
            }
        }"#;
        let payload: TokenResponse = serde_json::from_str(json).unwrap();
        let user = payload.user.into_domain();
        assert_eq!(user.display_name(), "Ana Lima");
    }

    #[test]
    fn signup_without_token_requires_confirmation() {
        let json = r#"{"user": null}"#;
        let payload: SignUpResponse = serde_json::from_str(json).unwrap();
        assert!(payload.access_token.is_none());
    }

    #[test]
    fn builds_authorize_url() {
        let client = AuthClient {
            http: Client::new(),
            base_url: Some("https://backend.example.com/".to_string()),
            anon_key: Some("anon".to_string()),
        };
        assert_eq!(
            client.authorize_url("google").unwrap(),
            "https://backend.example.com/auth/v1/authorize?provider=google"
        );
    }
}
