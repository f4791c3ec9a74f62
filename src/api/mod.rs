//! # API Module
//!
//! HTTP endpoints of the release radar service, built on
//! [Axum](https://docs.rs/axum).
//!
//! ## Endpoints
//!
//! - [`health`] - `GET /health`, service version and crawler state
//! - [`callback`] - `GET /callback`, completes the OAuth 2.0 PKCE flow by
//!   exchanging the authorization code for a token
//! - [`crawl`] - `POST /crawl`, triggers a crawl. Answers `200` with
//!   `{"status": "ok", "summary": ...}`, `409` with `{"status": "rejected"}`
//!   while another crawl runs, or `502` with `{"status": "error"}`
//! - [`clear_notifiers`] - `POST /notifiers/clear`, turns every "new content"
//!   marker off
//!
//! The crawler and the configuration are shared with the handlers through
//! [`axum::Extension`] layers set up in [`crate::server`].

mod callback;
mod crawl;
mod health;

pub use callback::callback;
pub use crawl::{clear_notifiers, crawl};
pub use health::health;
