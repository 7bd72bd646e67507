//! Persistence bridge: debounced saves, client-side encryption, board loads.
//!
//! DESIGN
//! ======
//! [`Debouncer`] is a trailing-edge timer: every [`Debouncer::schedule`]
//! pushes the deadline out by the full quiet period, and the owner fires once
//! the deadline passes with no further calls. It holds no task of its own;
//! the session loop sleeps until [`Debouncer::deadline`] and then calls
//! [`Debouncer::fire_if_due`]. The save that fires reads the store at that
//! moment, so it always carries the newest state.
//!
//! [`PersistenceBridge`] owns the board password. With a password set, saves
//! send an [`EncryptedEnvelope`] in place of plaintext; loads that find the
//! envelope marker ask the host for a password through [`PasswordPrompt`].
//! Key derivation is CPU-bound, so both directions run on the blocking pool.

#[cfg(test)]
#[path = "persistence_test.rs"]
mod persistence_test;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use canvas::doc::{Board, BoardData};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::api::{ApiError, BoardApi, RawBoard};
use crate::crypto::{self, CryptoError, EncryptedEnvelope};
use crate::error::ErrorCode;

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("board data has an unexpected shape: {0}")]
    Data(#[from] serde_json::Error),

    /// The board is encrypted and no password was supplied.
    #[error("board is encrypted and no password was given")]
    PasswordRequired,

    /// The server answered the save with `success: false`.
    #[error("server rejected the save")]
    SaveRejected,

    #[error("no board is loaded")]
    NotLoaded,

    #[error("background task failed: {0}")]
    Task(String),
}

impl ErrorCode for PersistError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Api(e) => e.error_code(),
            Self::Crypto(e) => e.error_code(),
            Self::Data(_) => "E_BOARD_DATA",
            Self::PasswordRequired => "E_PASSWORD_REQUIRED",
            Self::SaveRejected => "E_SAVE_REJECTED",
            Self::NotLoaded => "E_NOT_LOADED",
            Self::Task(_) => "E_TASK",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Api(e) => e.retryable(),
            Self::SaveRejected => true,
            _ => false,
        }
    }
}

impl PersistError {
    /// Decryption failed on load. The session must drop everything it holds.
    #[must_use]
    pub fn is_decrypt_failure(&self) -> bool {
        matches!(
            self,
            Self::Crypto(CryptoError::Authentication | CryptoError::Decode { .. } | CryptoError::MalformedEnvelope(_))
        )
    }
}

// =============================================================================
// DEBOUNCER
// =============================================================================

/// Trailing-edge debounce timer on tokio's clock.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay, deadline: None }
    }

    /// (Re)start the quiet period from now.
    pub fn schedule(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consume the pending deadline if it has passed. Returns whether the
    /// owner should act now.
    pub fn fire_if_due(&mut self) -> bool {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Sleep until `deadline`, or forever when there is none.
pub async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Decrypt a raw board payload off the runtime threads. Plain payloads come
/// back unchanged.
///
/// # Errors
///
/// Crypto failures, or [`PersistError::Task`] if the blocking task dies.
pub async fn decrypt_payload(data: serde_json::Value, password: &str) -> Result<serde_json::Value, PersistError> {
    if !crypto::is_encrypted(&data) {
        return Ok(data);
    }
    let envelope = EncryptedEnvelope::from_value(&data)?;
    let password = password.to_owned();
    let data = tokio::task::spawn_blocking(move || crypto::decrypt(&envelope, &password))
        .await
        .map_err(|e| PersistError::Task(e.to_string()))??;
    Ok(data)
}

// =============================================================================
// PASSWORD PROMPT
// =============================================================================

/// Host-supplied password dialog.
#[async_trait]
pub trait PasswordPrompt: Send + Sync {
    /// Ask for the password of `board_id`. `None` means the user gave up.
    async fn request_password(&self, board_id: &str) -> Option<String>;
}

/// Prompt that answers with a fixed password, or declines when it has none.
#[derive(Debug, Clone, Default)]
pub struct StaticPassword(pub Option<String>);

#[async_trait]
impl PasswordPrompt for StaticPassword {
    async fn request_password(&self, _board_id: &str) -> Option<String> {
        self.0.clone()
    }
}

// =============================================================================
// BRIDGE
// =============================================================================

pub struct PersistenceBridge<A: ?Sized> {
    api: Arc<A>,
    password: Option<String>,
}

impl<A: BoardApi + ?Sized + 'static> PersistenceBridge<A> {
    #[must_use]
    pub fn new(api: Arc<A>) -> Self {
        Self { api, password: None }
    }

    #[must_use]
    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    #[must_use]
    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    /// Set or clear the password used for the next saves.
    pub fn set_password(&mut self, password: Option<String>) {
        self.password = password.filter(|p| !p.is_empty());
    }

    /// Fetch a board, decrypting it when the server holds an envelope.
    ///
    /// # Errors
    ///
    /// API failures, [`PersistError::PasswordRequired`] when the prompt
    /// declines, and crypto errors for a wrong password. A failed decrypt
    /// clears the stored password.
    pub async fn load(&mut self, id: &str, prompt: &dyn PasswordPrompt) -> Result<Board, PersistError> {
        let raw = self.api.get_board(id).await?;
        if !crypto::is_encrypted(&raw.data) {
            return Ok(raw.into_board()?);
        }

        let password = match self.password.clone() {
            Some(password) => password,
            None => prompt.request_password(&raw.board_id).await.ok_or(PersistError::PasswordRequired)?,
        };
        let envelope = EncryptedEnvelope::from_value(&raw.data)?;
        let attempt = password.clone();
        let decrypted =
            tokio::task::spawn_blocking(move || crypto::decrypt::<BoardData>(&envelope, &attempt)).await;

        match decrypted {
            Ok(Ok(data)) => {
                info!(board_id = %raw.board_id, "decrypted board");
                self.password = Some(password);
                Ok(Board { board_id: raw.board_id, data })
            }
            Ok(Err(e)) => {
                warn!(board_id = %raw.board_id, error = %e, error_code = e.error_code(), "board decrypt failed");
                self.password = None;
                Err(e.into())
            }
            Err(e) => Err(PersistError::Task(e.to_string())),
        }
    }

    /// Send `board` to the API, encrypted when a password is set.
    ///
    /// # Errors
    ///
    /// API and crypto failures, or [`PersistError::SaveRejected`] when the
    /// server reports `success: false`.
    pub async fn save(&self, board: &Board) -> Result<(), PersistError> {
        let data = match &self.password {
            Some(password) => {
                let (data, password) = (board.data.clone(), password.clone());
                let envelope = tokio::task::spawn_blocking(move || crypto::encrypt(&data, &password))
                    .await
                    .map_err(|e| PersistError::Task(e.to_string()))??;
                serde_json::to_value(envelope)?
            }
            None => serde_json::to_value(&board.data)?,
        };

        let raw = RawBoard { board_id: board.board_id.clone(), data };
        let response = self.api.save_board(&raw).await?;
        if !response.success {
            return Err(PersistError::SaveRejected);
        }
        debug!(board_id = %board.board_id, encrypted = self.password.is_some(), "board saved");
        Ok(())
    }
}
