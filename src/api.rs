//! Board API client.
//!
//! DESIGN
//! ======
//! [`BoardApi`] is the seam between the session and the network: the session
//! only ever talks to the trait, so tests swap in an in-memory mock.
//! [`HttpBoardApi`] is the reqwest implementation. Response parsing lives in
//! [`parse_body`] so it can be tested without a server.
//!
//! Endpoints (relative to the configured base URL):
//! - `GET  /board/{id}`      -> `{board_id, data}` (`create` seeds a new board)
//! - `POST /save/{id}`       -> `{success}`
//! - `POST /backup/export`   -> `[{board_id, title, data}]`
//! - `GET  /metadata?url=`   -> `{source, data}`
//! - `POST /bookmark/{id}`   -> server-side link insertion

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use async_trait::async_trait;
use canvas::doc::Board;
use canvas::store::LinkMetadata;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ErrorCode;

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),

    /// The request never produced a response.
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with a non-success status.
    #[error("server returned status {status}")]
    Status { status: u16, body: String },

    /// The response body did not match the expected shape.
    #[error("response parse failed: {0}")]
    Parse(String),
}

impl ErrorCode for ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::Request(_) => "E_API_REQUEST",
            Self::Status { .. } => "E_API_STATUS",
            Self::Parse(_) => "E_API_PARSE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Status { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

/// A board as the API returns it. `data` is either plaintext board data or an
/// encrypted envelope, so it stays untyped until the session looks at it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBoard {
    pub board_id: String,
    pub data: Value,
}

impl RawBoard {
    /// Interpret `data` as plaintext board data.
    ///
    /// # Errors
    ///
    /// Fails when `data` does not have the board shape.
    pub fn into_board(self) -> Result<Board, serde_json::Error> {
        Ok(Board { board_id: self.board_id, data: serde_json::from_value(self.data)? })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    #[serde(default)]
    pub success: bool,
}

/// One board requested for export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEntry {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Serialize)]
struct ExportRequest<'a> {
    #[serde(rename = "boardsToExport")]
    boards_to_export: &'a [ExportEntry],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedBoard {
    pub board_id: String,
    #[serde(default)]
    pub title: String,
    pub data: Value,
}

/// Link metadata lookup result: `source` is `oembed`, `html`, `fallback` or
/// `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataResponse {
    pub source: String,
    #[serde(default)]
    pub data: Value,
}

impl MetadataResponse {
    #[must_use]
    pub fn into_metadata(self) -> LinkMetadata {
        LinkMetadata::from_wire(&self.source, &self.data)
    }
}

#[derive(Debug, Serialize)]
struct BookmarkRequest<'a> {
    link: &'a str,
}

// =============================================================================
// TRAIT
// =============================================================================

#[async_trait]
pub trait BoardApi: Send + Sync {
    /// Fetch a board. `create` (or an unknown id) makes the server seed one.
    async fn get_board(&self, id: &str) -> Result<RawBoard, ApiError>;

    async fn save_board(&self, board: &RawBoard) -> Result<SaveResponse, ApiError>;

    async fn export_boards(&self, boards: &[ExportEntry]) -> Result<Vec<ExportedBoard>, ApiError>;

    async fn fetch_metadata(&self, url: &str) -> Result<MetadataResponse, ApiError>;

    /// Server-side link insertion. Returns whatever the server replies.
    async fn add_bookmark(&self, board_id: &str, link: &str) -> Result<Value, ApiError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

pub struct HttpBoardApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBoardApi {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.clone() })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await.map_err(|e| ApiError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| ApiError::Request(e.to_string()))?;
        parse_body(status, &text)
    }
}

#[async_trait]
impl BoardApi for HttpBoardApi {
    async fn get_board(&self, id: &str) -> Result<RawBoard, ApiError> {
        self.send(self.http.get(self.url(&format!("board/{id}")))).await
    }

    async fn save_board(&self, board: &RawBoard) -> Result<SaveResponse, ApiError> {
        self.send(self.http.post(self.url(&format!("save/{}", board.board_id))).json(board)).await
    }

    async fn export_boards(&self, boards: &[ExportEntry]) -> Result<Vec<ExportedBoard>, ApiError> {
        let body = ExportRequest { boards_to_export: boards };
        self.send(self.http.post(self.url("backup/export")).json(&body)).await
    }

    async fn fetch_metadata(&self, url: &str) -> Result<MetadataResponse, ApiError> {
        self.send(self.http.get(self.url("metadata")).query(&[("url", url)])).await
    }

    async fn add_bookmark(&self, board_id: &str, link: &str) -> Result<Value, ApiError> {
        let body = BookmarkRequest { link };
        self.send(self.http.post(self.url(&format!("bookmark/{board_id}"))).json(&body)).await
    }
}

/// Turn a status and body into a typed response or an [`ApiError`].
///
/// # Errors
///
/// [`ApiError::Status`] for non-2xx statuses, [`ApiError::Parse`] when the
/// body does not deserialize.
pub fn parse_body<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ApiError> {
    if !(200..300).contains(&status) {
        return Err(ApiError::Status { status, body: body.to_owned() });
    }
    serde_json::from_str(body).map_err(|e| ApiError::Parse(e.to_string()))
}
