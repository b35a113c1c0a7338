//! Atomic write primitives
//!
//! Uses temp→rename so a reader never sees a partially written graph

use crate::errors::{io_error, Result};
use std::fs;
use std::path::Path;

/// Atomically write bytes to a file
pub fn atomic_write(target_path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error("create_graph_dir", parent, e))?;
    }

    // Same directory as the target so the rename never crosses filesystems.
    let temp_path = target_path.with_extension("json.tmp");

    if let Err(e) = fs::write(&temp_path, content) {
        let _ = fs::remove_file(&temp_path);
        return Err(io_error("write_graph_temp", &temp_path, e));
    }

    fs::rename(&temp_path, target_path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        io_error("rename_graph_temp", target_path, e)
    })?;

    Ok(())
}
