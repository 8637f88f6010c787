//! Typed client for a hosted table/auth REST API
//!
//! Each operation is one request. There are no retries.

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RemoteConfig;

use super::filter::{self, Filter};

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Remote backend not configured (set MACROTRACK_REMOTE_URL and MACROTRACK_REMOTE_KEY)")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote returned {code}: {body}")]
    Status { code: u16, body: String },
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Signed-in user session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub expires_in: Option<i64>,
    pub refresh_token: Option<String>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

pub struct RemoteClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    session: Option<Session>,
}

impl RemoteClient {
    pub fn new(config: &RemoteConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            session: None,
        }
    }

    /// Client for the configured backend, if there is one
    pub fn from_config(config: Option<&RemoteConfig>) -> RemoteResult<Self> {
        config.map(Self::new).ok_or(RemoteError::NotConfigured)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn auth_url(&self) -> String {
        format!("{}/auth/v1/token", self.base_url)
    }

    /// `apikey` plus a bearer token: the session's once signed in, the api
    /// key before that
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self
            .session
            .as_ref()
            .map(|s| s.access_token.as_str())
            .unwrap_or(self.api_key.as_str());
        request
            .header("apikey", &self.api_key)
            .header("authorization", format!("Bearer {}", token))
    }

    async fn check(response: Response) -> RemoteResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(code = status.as_u16(), "Remote request failed: {}", body);
        Err(RemoteError::Status {
            code: status.as_u16(),
            body,
        })
    }

    /// Password sign-in; later requests carry the session token
    pub async fn sign_in(&mut self, email: &str, password: &str) -> RemoteResult<Session> {
        let response = self
            .http
            .post(self.auth_url())
            .query(&[("grant_type", "password")])
            .header("apikey", &self.api_key)
            .json(&PasswordGrant { email, password })
            .send()
            .await?;

        let session: Session = Self::check(response).await?.json().await?;
        tracing::info!(email, "Signed in to remote backend");
        self.session = Some(session.clone());
        Ok(session)
    }

    /// Rows of `table` matching every filter
    pub async fn select<T: DeserializeOwned>(&self, table: &str, filters: &[Filter]) -> RemoteResult<Vec<T>> {
        let mut query = vec![("select".to_string(), "*".to_string())];
        query.extend(filter::to_query(filters));

        let request = self.http.get(self.table_url(table)).query(&query);
        let response = self.authorize(request).send().await?;
        let rows: Vec<T> = Self::check(response).await?.json().await?;

        tracing::debug!(table, rows = rows.len(), "Selected remote rows");
        Ok(rows)
    }

    /// Insert rows, merging on `on_conflict` columns when given
    pub async fn upsert<T: Serialize>(
        &self,
        table: &str,
        rows: &[T],
        on_conflict: Option<&str>,
    ) -> RemoteResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut request = self
            .http
            .post(self.table_url(table))
            .header("prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows);
        if let Some(columns) = on_conflict {
            request = request.query(&[("on_conflict", columns)]);
        }

        let response = self.authorize(request).send().await?;
        Self::check(response).await?;

        tracing::info!(table, rows = rows.len(), "Upserted remote rows");
        Ok(rows.len())
    }

    /// Delete rows of `table` matching every filter
    pub async fn delete(&self, table: &str, filters: &[Filter]) -> RemoteResult<()> {
        let request = self
            .http
            .delete(self.table_url(table))
            .query(&filter::to_query(filters));
        let response = self.authorize(request).send().await?;
        Self::check(response).await?;

        tracing::info!(table, filters = filters.len(), "Deleted remote rows");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RemoteConfig {
        RemoteConfig {
            base_url: "https://example.test/".to_string(),
            api_key: "anon-key".to_string(),
            credentials: None,
        }
    }

    #[test]
    fn test_not_configured() {
        assert!(matches!(RemoteClient::from_config(None), Err(RemoteError::NotConfigured)));
    }

    #[test]
    fn test_urls() {
        let client = RemoteClient::new(&config());
        assert_eq!(client.table_url("entries"), "https://example.test/rest/v1/entries");
        assert_eq!(client.auth_url(), "https://example.test/auth/v1/token");
        assert!(client.session().is_none());
    }

    #[test]
    fn test_authorize_headers() {
        let mut client = RemoteClient::new(&config());
        let request = client
            .authorize(client.http.get(client.table_url("foods")))
            .build()
            .unwrap();
        assert_eq!(request.headers()["apikey"], "anon-key");
        assert_eq!(request.headers()["authorization"], "Bearer anon-key");

        client.session = Some(Session {
            access_token: "user-token".to_string(),
            token_type: default_token_type(),
            expires_in: Some(3600),
            refresh_token: None,
        });
        let request = client
            .authorize(client.http.get(client.table_url("foods")))
            .build()
            .unwrap();
        assert_eq!(request.headers()["authorization"], "Bearer user-token");
    }

    #[test]
    fn test_session_defaults_token_type() {
        let session: Session = serde_json::from_str(r#"{"access_token": "abc"}"#).unwrap();
        assert_eq!(session.token_type, "bearer");
        assert!(session.refresh_token.is_none());
    }
}
