//! Request and response types for dimsync-daemon's HTTP endpoints.
//!
//! These are `Serialize`/`Deserialize` so Axum can encode/decode them
//! directly; no business logic lives here.

use serde::{Deserialize, Serialize};

/// Query parameters accepted by `GET /sync`.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncParams {
    pub table: Option<String>,
    pub op: Option<String>,
    pub id: Option<i64>,
    pub token: Option<String>,
}

/// Mirrors the shape of a completed subprocess invocation: a return code plus
/// the tail of its output streams. There is no real subprocess in this
/// in-process design, so `stdout`/`stderr` carry a short human-readable
/// summary of what the call did instead of captured process output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerResponse {
    pub returncode: i32,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
