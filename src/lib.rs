//! # Realty Desk
//!
//! Back-office and media service for a real-estate advisory website. The
//! marketing pages read listings, portfolio, blog and homepage content from
//! this service and post leads and chat messages to it; staff manage that
//! content through the admin API.
//!
//! # Architecture
//!
//! ```text
//!  HTTP ──▶ api ──▶ records ──▶ store (one JSON file per collection)
//!            │                    ▲
//!            │                    │ RankWriter
//!            ├──▶ gallery ────────┘
//!            │
//!            └──▶ imaging ──▶ media (content-addressed files on disk)
//! ```
//!
//! Handlers validate input once, at the boundary, into typed records; every
//! other layer works with those types and never patches up missing fields.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`api`] | axum router, handlers, admin-token guard, error-to-status mapping |
//! | [`records`] | Property, portfolio, blog, homepage, lead and chat records plus input validation |
//! | [`store`] | File-backed document store; the production [`gallery::RankWriter`] |
//! | [`gallery`] | Drag-and-drop reorder, rank computation, idempotent reorder commands |
//! | [`imaging`] | Upload compression: bounded resize and JPEG/PNG re-encode |
//! | [`media`] | Content-addressed storage and listing of compressed uploads |
//! | [`config`] | `config.toml` loading layered over stock defaults, validation |
//! | [`types`] | Shared value types (`UploadFile`, `DocId`) |
//! | [`output`] | CLI output formatting for `compress` and `check` |
//!
//! # Design Decisions
//!
//! ## Optimistic Reordering
//!
//! A drag-and-drop move is computed in memory and returned to the caller
//! whether or not it could be saved. Saving is a batch of rank writes keyed
//! by an idempotency key, so a client that retries a move after a timeout
//! does not apply it twice. A failed save surfaces as a warning in the
//! response instead of an error status.
//!
//! ## Compress Before Storing
//!
//! Uploads above 500 KiB are resized to at most 1920 px wide and re-encoded
//! (JPEG at quality 85, or PNG for modest PNGs) before anything touches the
//! disk. Compression is a pure function of the bytes and the config, with
//! the encoder behind the [`imaging::ImageBackend`] trait, so the decision
//! logic is tested against a recording mock.
//!
//! ## Files, Not a Database
//!
//! Content volume for a single brokerage is small: hundreds of listings,
//! not millions. Each collection is one pretty-printed JSON file that can be
//! inspected, backed up and diffed with ordinary tools.

pub mod api;
pub mod config;
pub mod gallery;
pub mod imaging;
pub mod media;
pub mod output;
pub mod records;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
