//! Async side of the TackPad board client.
//!
//! The [`canvas`] crate owns everything synchronous (view transform,
//! gestures, item interaction, the board store). This package connects it to
//! the Board API: debounced saves, optional client-side encryption, link
//! metadata enrichment and the local registry of visited boards.
//!
//! | Module | Role |
//! |--------|------|
//! | [`session`] | [`session::BoardSession`]: one open board and its event loop |
//! | [`persistence`] | Debounce timer, password prompt, load/save bridge |
//! | [`api`] | [`api::BoardApi`] trait, reqwest client and wire types |
//! | [`crypto`] | PBKDF2 + AES-256-GCM board envelopes |
//! | [`bookmarks`] | Visited-board registry (`load` / `create` resolution) |
//! | [`config`] | `TACKPAD_*` environment configuration |
//! | [`error`] | [`error::ErrorCode`] contract for error enums |

pub mod api;
pub mod bookmarks;
pub mod config;
pub mod crypto;
pub mod error;
pub mod persistence;
pub mod session;

#[cfg(test)]
mod mock_api;
