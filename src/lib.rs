//! # Gatehouse
//!
//! A small session-cookie authentication service. Visitors register with an
//! email and password, log in to receive a `session` cookie, and only then
//! reach the protected `/index.html` page.
//!
//! ## Layout
//!
//! - [`store`]: the credential store (`users` table, Argon2 hashing).
//! - [`web`]: the axum router, session gate and page rendering.
//! - [`cli`]: argument parsing, telemetry and the server action.
//!
//! There is no server-side session table. The cookie value `authenticated`
//! is the whole session state, which is why logout only has to clear it.

pub mod cli;
pub mod store;
pub mod web;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
