//! HTTP client for the OrgKeep API.
//!
//! Holds a caller's id and api secret, obtains a bearer token on first use
//! and refreshes it shortly before it expires.

use chrono::Utc;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::auth::token::{to_header_value, token_request_digest};
use crate::auth::Token;
use crate::database::{Org, Status, UserView};
use crate::middleware::{ID_HEADER, TOKEN_REQUEST_HEADER};
use crate::routes::API_PREFIX;

/// Refresh when a token has less than this many seconds left
pub const DEFAULT_REFRESH_THRESHOLD_SECS: i64 = 30;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("{status} {code}: {message}")]
    Api {
        status: StatusCode,
        code: String,
        message: String,
    },

    #[error("Unexpected response: {0}")]
    Unexpected(String),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status(),
            ClientError::Unexpected(_) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    code: String,
}

#[derive(Debug, Deserialize)]
struct CreatedBody {
    id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Whoami {
    pub user: String,
    pub org: String,
    pub privilege: String,
    pub expires: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerStatus {
    pub started: chrono::DateTime<Utc>,
    pub uptime_secs: i64,
}

/// True if `token` is missing or within `threshold_secs` of expiring
pub fn needs_refresh(token: Option<&Token>, now: i64, threshold_secs: i64) -> bool {
    match token {
        Some(token) => token.expires - now <= threshold_secs,
        None => true,
    }
}

pub struct Client {
    http: reqwest::Client,
    host: String,
    id: String,
    api_secret: String,
    refresh_threshold_secs: i64,
    token: Mutex<Option<Token>>,
}

impl Client {
    /// `host` is the server base URL, e.g. `http://127.0.0.1:3000`
    pub fn new(host: impl Into<String>, id: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            host: host.into().trim_end_matches('/').to_string(),
            id: id.into(),
            api_secret: api_secret.into(),
            refresh_threshold_secs: DEFAULT_REFRESH_THRESHOLD_SECS,
            token: Mutex::new(None),
        }
    }

    pub fn with_refresh_threshold(mut self, secs: i64) -> Self {
        self.refresh_threshold_secs = secs;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.host, API_PREFIX, path)
    }

    /// GET /ok
    pub async fn ok(&self) -> Result<(), ClientError> {
        let resp = self.http.get(self.url("/ok")).send().await?;
        if resp.status() != StatusCode::OK {
            return Err(ClientError::Unexpected(format!("ok returned {}", resp.status())));
        }
        Ok(())
    }

    /// Request a fresh token, bypassing the cache
    pub async fn request_token(&self) -> Result<Token, ClientError> {
        let req = self
            .http
            .put(self.url("/token"))
            .header(ID_HEADER, &self.id)
            .header(TOKEN_REQUEST_HEADER, token_request_digest(&self.id, &self.api_secret));
        parse(req.send().await?).await
    }

    /// Cached token, refreshed when missing or close to expiry
    pub async fn token(&self) -> Result<Token, ClientError> {
        let mut cached = self.token.lock().await;
        if !needs_refresh(cached.as_ref(), Utc::now().timestamp(), self.refresh_threshold_secs) {
            if let Some(token) = cached.as_ref() {
                return Ok(token.clone());
            }
        }
        let fresh = self.request_token().await?;
        *cached = Some(fresh.clone());
        Ok(fresh)
    }

    async fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let token = self.token().await?;
        Ok(self
            .http
            .request(method, self.url(path))
            .header(ID_HEADER, &self.id)
            .header(reqwest::header::AUTHORIZATION, to_header_value(&token.bearer)))
    }

    pub async fn status(&self) -> Result<ServerStatus, ClientError> {
        let req = self.authed(Method::GET, "/status").await?;
        parse(req.send().await?).await
    }

    pub async fn whoami(&self) -> Result<Whoami, ClientError> {
        let req = self.authed(Method::GET, "/whoami").await?;
        parse(req.send().await?).await
    }

    /// Returns the new org id
    pub async fn org_create(&self, name: &str) -> Result<String, ClientError> {
        let req = self.authed(Method::POST, "/org").await?.json(&json!({ "name": name }));
        let created: CreatedBody = parse(req.send().await?).await?;
        Ok(created.id)
    }

    pub async fn org_read(&self, id: &str) -> Result<Org, ClientError> {
        let req = self.authed(Method::GET, &format!("/org/{id}")).await?;
        parse(req.send().await?).await
    }

    pub async fn org_update_owner(&self, id: &str, owner: &str) -> Result<(), ClientError> {
        self.put_empty(&format!("/org/{id}"), json!({ "op": "owner", "owner": owner }))
            .await
    }

    pub async fn org_update_status(&self, id: &str, status: Status) -> Result<(), ClientError> {
        self.put_empty(&format!("/org/{id}"), json!({ "op": "status", "status": status }))
            .await
    }

    /// Returns the new user id. `password` is plaintext; the server derives it.
    pub async fn user_create(
        &self,
        display_name: &str,
        email: &str,
        org: &str,
        password: &str,
    ) -> Result<String, ClientError> {
        let body = json!({
            "display_name": display_name,
            "email": email,
            "org": org,
            "password": password,
        });
        let req = self.authed(Method::POST, "/user").await?.json(&body);
        let created: CreatedBody = parse(req.send().await?).await?;
        Ok(created.id)
    }

    pub async fn user_read(&self, id: &str) -> Result<UserView, ClientError> {
        let req = self.authed(Method::GET, &format!("/user/{id}")).await?;
        parse(req.send().await?).await
    }

    pub async fn user_update_display_name(&self, id: &str, display_name: &str) -> Result<(), ClientError> {
        self.put_empty(
            &format!("/user/{id}"),
            json!({ "op": "display_name", "display_name": display_name }),
        )
        .await
    }

    pub async fn user_update_password(&self, id: &str, password: &str) -> Result<(), ClientError> {
        self.put_empty(&format!("/user/{id}"), json!({ "op": "password", "password": password }))
            .await
    }

    pub async fn user_update_status(&self, id: &str, status: Status) -> Result<(), ClientError> {
        self.put_empty(&format!("/user/{id}"), json!({ "op": "status", "status": status }))
            .await
    }

    pub async fn self_update_display_name(&self, display_name: &str) -> Result<(), ClientError> {
        self.put_empty("/self", json!({ "op": "display_name", "display_name": display_name }))
            .await
    }

    pub async fn self_update_password(&self, password: &str) -> Result<(), ClientError> {
        self.put_empty("/self", json!({ "op": "password", "password": password }))
            .await
    }

    async fn put_empty(&self, path: &str, body: Value) -> Result<(), ClientError> {
        let resp = self.authed(Method::PUT, path).await?.json(&body).send().await?;
        if resp.status() == StatusCode::NO_CONTENT {
            return Ok(());
        }
        Err(api_error(resp).await)
    }
}

/// Unwrap a `{"success": true, "data": ..}` envelope
async fn parse<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    if !resp.status().is_success() {
        return Err(api_error(resp).await);
    }
    let envelope: Envelope<T> = resp.json().await?;
    Ok(envelope.data)
}

async fn api_error(resp: reqwest::Response) -> ClientError {
    let status = resp.status();
    match resp.json::<ErrorBody>().await {
        Ok(body) => ClientError::Api {
            status,
            code: body.code,
            message: body.error,
        },
        Err(_) => ClientError::Api {
            status,
            code: String::new(),
            message: status.canonical_reason().unwrap_or("unknown").to_string(),
        },
    }
}
