use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tui::state::conversation::{Message, PendingFile};

pub const CHAT_PATH: &str = "/chat";
pub const UPLOAD_PATH: &str = "/chat/upload";
/// Sent as `user_id` with every JSON chat request.
pub const CLIENT_ID: &str = "mia-chat";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("POST {path} failed: {source}")]
    Network {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("POST {path} -> {status} {body}")]
    Http { path: String, status: u16, body: String },
    #[error("POST {path}: invalid response body: {source}")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request interrupted: {0}")]
    Interrupted(String),
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub user_id: &'static str,
    pub model: String,
    pub messages: Vec<Message>,
    pub stream: bool,
}

impl ChatRequest {
    pub fn new(model: String, messages: Vec<Message>) -> Self {
        Self { user_id: CLIENT_ID, model, messages, stream: false }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ChatResponse {
    pub content: Option<String>,
    pub usage: Option<Usage>,
    pub cost_eur: Option<f64>,
    pub est_co2e_g: Option<f64>,
}

// ── HTTP client ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct ApiClient {
    base: String,
    http: Client,
}

impl ApiClient {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// POSTs `payload` as JSON and decodes the JSON reply.
    pub async fn post_json<B, T>(&self, path: &str, payload: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self
            .http
            .post(self.url(path))
            .json(payload)
            .send()
            .await
            .map_err(|source| ApiError::Network { path: path.to_string(), source })?;
        decode(path, resp).await
    }

    /// POSTs text `fields` plus one file part as `multipart/form-data`.
    pub async fn post_multipart<T>(
        &self,
        path: &str,
        fields: &[(&str, String)],
        file_field: &str,
        file: &PendingFile,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let mut form = Form::new();
        for (name, value) in fields {
            form = form.text(name.to_string(), value.clone());
        }
        let part = Part::bytes(file.bytes.clone()).file_name(file.name.clone());
        form = form.part(file_field.to_string(), part);

        let resp = self
            .http
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .map_err(|source| ApiError::Network { path: path.to_string(), source })?;
        decode(path, resp).await
    }
}

async fn decode<T: DeserializeOwned>(path: &str, resp: Response) -> Result<T, ApiError> {
    let status = resp.status();
    if !status.is_success() {
        let body = match resp.text().await {
            Ok(body) => body,
            Err(source) => {
                tracing::warn!(path, status = status.as_u16(), error = %source, "error body unreadable");
                return Err(ApiError::Network { path: path.to_string(), source });
            }
        };
        tracing::warn!(path, status = status.as_u16(), "chat backend returned an error");
        return Err(ApiError::Http { path: path.to_string(), status: status.as_u16(), body });
    }
    resp.json::<T>()
        .await
        .map_err(|source| ApiError::Decode { path: path.to_string(), source })
}
