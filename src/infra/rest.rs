use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::session::Session;

/// Table-oriented client for the backend's query interface. One instance is
/// shared by every table store.
pub struct RestClient {
    http: Client,
    base_url: Option<String>,
    anon_key: Option<String>,
}

impl RestClient {
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

    fn table_endpoint(base_url: &str, table: &str) -> String {
        format!("{}/rest/v1/{table}", base_url.trim_end_matches('/'))
    }

    fn request(
        &self,
        method: Method,
        table: &str,
        session: &Session,
    ) -> AppResult<RequestBuilder> {
        let (base_url, anon_key) = self.api_details()?;
        Ok(self
            .http
            .request(method, Self::table_endpoint(base_url, table))
            .header("apikey", anon_key)
            .header(
                AUTHORIZATION,
                format!("Bearer {}", session.access_token),
            )
            .header(ACCEPT, "application/json"))
    }

    pub async fn select<T: DeserializeOwned>(
        &self,
        session: &Session,
        table: &str,
        query: &[(&str, String)],
    ) -> AppResult<Vec<T>> {
        let response = self
            .request(Method::GET, table, session)?
            .query(query)
            .send()
            .await
            .map_err(request_error)?;
        Self::parse_rows(response).await
    }

    /// Like `select`, but expects exactly one row; `what` names the missing
    /// entity in the error.
    pub async fn select_one<T: DeserializeOwned>(
        &self,
        session: &Session,
        table: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> AppResult<T> {
        let mut rows = self.select(session, table, query).await?;
        if rows.is_empty() {
            return Err(AppError::NotFound(what.to_string()));
        }
        Ok(rows.swap_remove(0))
    }

    /// Inserts and returns the representation selected by `select`.
    pub async fn insert_returning<B: Serialize, T: DeserializeOwned>(
        &self,
        session: &Session,
        table: &str,
        body: &B,
        select: &str,
    ) -> AppResult<Vec<T>> {
        let response = self
            .request(Method::POST, table, session)?
            .query(&[("select", select)])
            .header("Prefer", "return=representation")
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await
            .map_err(request_error)?;
        Self::parse_rows(response).await
    }

    pub async fn insert<B: Serialize>(
        &self,
        session: &Session,
        table: &str,
        body: &B,
    ) -> AppResult<()> {
        let response = self
            .request(Method::POST, table, session)?
            .header("Prefer", "return=minimal")
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await
            .map_err(request_error)?;
        check(response).await.map(|_| ())
    }

    pub async fn update<B: Serialize>(
        &self,
        session: &Session,
        table: &str,
        filters: &[(&str, String)],
        body: &B,
    ) -> AppResult<()> {
        let response = self
            .request(Method::PATCH, table, session)?
            .query(filters)
            .header("Prefer", "return=minimal")
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await
            .map_err(request_error)?;
        check(response).await.map(|_| ())
    }

    pub async fn update_returning<B: Serialize, T: DeserializeOwned>(
        &self,
        session: &Session,
        table: &str,
        filters: &[(&str, String)],
        body: &B,
        select: &str,
    ) -> AppResult<Vec<T>> {
        let mut query: Vec<(&str, String)> = vec![("select", select.to_string())];
        query.extend(filters.iter().map(|(k, v)| (*k, v.clone())));
        let response = self
            .request(Method::PATCH, table, session)?
            .query(&query)
            .header("Prefer", "return=representation")
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await
            .map_err(request_error)?;
        Self::parse_rows(response).await
    }

    pub async fn delete(
        &self,
        session: &Session,
        table: &str,
        filters: &[(&str, String)],
    ) -> AppResult<()> {
        let response = self
            .request(Method::DELETE, table, session)?
            .query(filters)
            .send()
            .await
            .map_err(request_error)?;
        check(response).await.map(|_| ())
    }

    /// Exact row count via a HEAD request; the total comes back in the
    /// Content-Range header, no rows are transferred.
    pub async fn count_exact(
        &self,
        session: &Session,
        table: &str,
        filters: &[(&str, String)],
    ) -> AppResult<u64> {
        let mut query: Vec<(&str, String)> = vec![("select", "id".to_string())];
        query.extend(filters.iter().map(|(k, v)| (*k, v.clone())));
        let response = self
            .request(Method::HEAD, table, session)?
            .query(&query)
            .header("Prefer", "count=exact")
            .send()
            .await
            .map_err(request_error)?;
        let response = check(response).await?;
        let range = response
            .headers()
            .get("content-range")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Backend("count response missing Content-Range".to_string()))?;
        content_range_total(range).ok_or_else(|| {
            AppError::Backend(format!("unparseable Content-Range header: {range}"))
        })
    }

    async fn parse_rows<T: DeserializeOwned>(response: Response) -> AppResult<Vec<T>> {
        let response = check(response).await?;
        response
            .json()
            .await
            .map_err(|err| AppError::Backend(format!("failed to parse backend response: {err}")))
    }
}

fn request_error(err: reqwest::Error) -> AppError {
    AppError::Backend(format!("failed to reach backend: {err}"))
}

async fn check(response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unable to read response>".to_string());
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(AppError::Auth(format!(
            "backend rejected the session token: {body}"
        )));
    }
    Err(AppError::Backend(format!(
        "backend responded with {status}: {body}"
    )))
}

/// Parses "0-24/42" or "*/42" into the total after the slash.
fn content_range_total(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_table_endpoints_without_double_slashes() {
        assert_eq!(
            RestClient::table_endpoint("https://backend.example.com/", "demandas"),
            "https://backend.example.com/rest/v1/demandas"
        );
        assert_eq!(
            RestClient::table_endpoint("https://backend.example.com", "notificacoes"),
            "https://backend.example.com/rest/v1/notificacoes"
        );
    }

    #[test]
    fn parses_content_range_totals() {
        assert_eq!(content_range_total("0-24/42"), Some(42));
        assert_eq!(content_range_total("*/0"), Some(0));
        assert_eq!(content_range_total("0-0/1"), Some(1));
        assert_eq!(content_range_total("garbage"), None);
    }
}
