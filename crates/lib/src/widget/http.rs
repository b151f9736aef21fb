//! [`ChatBackend`] over HTTP, for talking to a running server.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Response, StatusCode, redirect};
use serde::de::DeserializeOwned;
use url::Url;

use super::errors::ClientError;
use super::host::ChatBackend;
use crate::Result;
use crate::chat::{ClearResponse, ErrorBody, HistoryResponse, SendRequest, SendResponse};
use crate::store::Intention;

/// Name of the anti-forgery cookie.
pub const CSRF_COOKIE: &str = "csrftoken";
/// Header that must echo the anti-forgery cookie on POST requests.
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Cookie-authenticated client for the chat endpoints.
#[derive(Debug, Clone)]
pub struct HttpChatBackend {
    client: Client,
    jar: Arc<Jar>,
    base_url: Url,
}

impl HttpChatBackend {
    /// Create a client for the server at `base_url`, e.g. `http://127.0.0.1:3000`.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        let jar = Arc::new(Jar::default());
        // Redirects are inspected, not followed: a 303 from /login means success.
        let client = Client::builder()
            .cookie_provider(jar.clone())
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|source| ClientError::Network { source })?;

        Ok(Self {
            client,
            jar,
            base_url,
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(|e| {
            ClientError::InvalidUrl {
                url: format!("{}{path}", self.base_url),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Current value of the anti-forgery cookie.
    pub fn csrf_token(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base_url)?;
        let cookies = header.to_str().ok()?;
        cookies.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == CSRF_COOKIE).then(|| value.to_string())
        })
    }

    /// Log in with the server's form login.
    pub async fn login(&self, username: &str, password: Option<&str>) -> Result<()> {
        // Fetch the form first so the server issues the anti-forgery cookie.
        self.client
            .get(self.url("/login")?)
            .send()
            .await
            .map_err(|source| ClientError::Network { source })?;

        let token = self.csrf_token().unwrap_or_default();
        let form = [
            ("username", username),
            ("password", password.unwrap_or_default()),
            ("csrf_token", token.as_str()),
        ];
        let response = self
            .client
            .post(self.url("/login")?)
            .form(&form)
            .send()
            .await
            .map_err(|source| ClientError::Network { source })?;

        if response.status() == StatusCode::SEE_OTHER {
            tracing::debug!(username, "Logged in");
            Ok(())
        } else {
            Err(ClientError::LoginFailed {
                username: username.to_string(),
            }
            .into())
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(self.url(path)?)
            .send()
            .await
            .map_err(|source| ClientError::Network { source })?;
        decode(response).await
    }

    async fn post<B: serde::Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let mut request = self.client.post(self.url(path)?).json(body);
        if let Some(token) = self.csrf_token() {
            request = request.header(CSRF_HEADER, token);
        }
        let response = request
            .send()
            .await
            .map_err(|source| ClientError::Network { source })?;
        decode(response).await
    }

    /// Intentions for the current working day.
    pub async fn intentions_today(&self) -> Result<Vec<Intention>> {
        self.get("/intentions/today").await
    }

    /// Change whether tool badges are shown.
    pub async fn set_tool_confirmations(&self, show: bool) -> Result<()> {
        let _: serde_json::Value = self
            .post(
                "/settings/tool-confirmations",
                &serde_json::json!({ "show_tool_confirmations": show }),
            )
            .await?;
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let message = response.json::<ErrorBody>().await.ok().map(|b| b.error);
        return Err(ClientError::Status {
            status: status.as_u16(),
            message,
        }
        .into());
    }
    response.json::<T>().await.map_err(|e| {
        ClientError::InvalidResponse {
            reason: e.to_string(),
        }
        .into()
    })
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn history(&self) -> Result<HistoryResponse> {
        self.get("/chat/history").await
    }

    async fn send(&self, request: &SendRequest) -> Result<SendResponse> {
        self.post("/chat/send", request).await
    }

    async fn clear(&self) -> Result<ClearResponse> {
        self.post("/chat/clear", &serde_json::json!({})).await
    }
}
