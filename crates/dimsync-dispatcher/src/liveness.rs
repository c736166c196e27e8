use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

const STALE_AFTER_SECS: i64 = 120;

#[derive(Debug, Serialize, Deserialize)]
struct LivenessDoc {
    last_heartbeat: i64,
}

/// Overwritten by the dispatcher on every heartbeat tick.
pub fn write(path: &str) -> Result<()> {
    let now = unix_now()?;
    let json = serde_json::to_string(&LivenessDoc { last_heartbeat: now })?;
    std::fs::write(path, json).with_context(|| format!("writing liveness file {path}"))
}

fn unix_now() -> Result<i64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock before unix epoch")?
        .as_secs() as i64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]

#[serde(tag = "worker", rename_all = "snake_case")]
pub enum Liveness {
    Up { last_heartbeat: i64, age_seconds: i64 },
    Stale { last_heartbeat: i64, age_seconds: i64 },
    NotStarted,
    Error,
}

/// Classifies the worker's liveness by reading the artifact `write` produces.
/// Never panics or errors: an unreadable or malformed file is simply `Error`.
pub fn read(path: &str) -> Liveness {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Liveness::NotStarted,
        Err(_) => return Liveness::Error,
    };
    let doc: LivenessDoc = match serde_json::from_str(&contents) {
        Ok(d) => d,
        Err(_) => return Liveness::Error,
    };
    let now = unix_now().unwrap_or(0);
    let age = now - doc.last_heartbeat;
    if age < STALE_AFTER_SECS {
        Liveness::Up { last_heartbeat: doc.last_heartbeat, age_seconds: age }
    } else {
        Liveness::Stale { last_heartbeat: doc.last_heartbeat, age_seconds: age }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_not_started() {
        let path = "/tmp/dimsync-liveness-missing-does-not-exist.json";
        let _ = std::fs::remove_file(path);
        assert_eq!(read(path), Liveness::NotStarted);
    }

    #[test]
    fn malformed_file_is_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "not json").unwrap();
        assert_eq!(read(file.path().to_str().unwrap()), Liveness::Error);
    }

    #[test]
    fn fresh_write_reads_back_up() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();
        write(path).unwrap();
        match read(path) {
            Liveness::Up { age_seconds, .. } => assert!(age_seconds < 5),
            other => panic!("expected Up, got {other:?}"),
        }
    }

    #[test]
    fn old_timestamp_reads_back_stale() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();
        let old = unix_now().unwrap() - 3600;
        std::fs::write(path, serde_json::to_string(&LivenessDoc { last_heartbeat: old }).unwrap()).unwrap();
        match read(path) {
            Liveness::Stale { .. } => {}
            other => panic!("expected Stale, got {other:?}"),
        }
    }
}
