// src/core/rdb.rs

//! Loading of the fixed "empty RDB" snapshot payload sent to every replica
//! during PSYNC. This server does not implement on-disk persistence beyond
//! this single, fixed-at-startup read.

use crate::core::KvNodeError;
use bytes::Bytes;
use std::path::Path;

/// Reads the RDB snapshot from `path` once at startup. A missing file is a
/// startup error rather than a per-PSYNC failure, so the process fails fast
/// instead of accepting connections it cannot fully serve.
pub fn load(path: &Path) -> Result<Bytes, KvNodeError> {
    let bytes = std::fs::read(path)
        .map_err(|e| KvNodeError::Startup(format!("failed to read RDB file {path:?}: {e}")))?;
    Ok(Bytes::from(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_a_startup_error() {
        let err = load(Path::new("/nonexistent/path/to/rdb")).unwrap_err();
        assert!(matches!(err, KvNodeError::Startup(_)));
    }
}
