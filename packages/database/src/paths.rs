#![allow(clippy::module_name_repetitions)]
//! Filesystem helpers for the store.

use std::path::Path;

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.as_os_str().is_empty() && !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Renders a path as a single-quoted SQL string literal.
///
/// `read_csv` only accepts literal paths, so they are spliced into the
/// statement text rather than bound.
#[must_use]
pub fn sql_path_literal(path: &Path) -> String {
    format!("'{}'", path.display().to_string().replace('\'', "''"))
}
