//! Catalog writer
//!
//! Output is pretty-printed JSON with keys sorted at every level, so two runs
//! against unchanged documentation produce identical bytes.

use crate::catalog::Catalog;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Directory (relative to the working directory) the catalog is written to
pub const OUTPUT_DIR: &str = "snippets";

pub const DEFAULT_OUTPUT_FILE: &str = "iam-actions.json";

/// Mode of the written catalog; temp files start out owner-only
#[cfg(unix)]
const OUTPUT_MODE: u32 = 0o644;

/// Target path for `file_name` inside `dir`. Only the final component of
/// `file_name` is used.
pub fn output_path(dir: &Path, file_name: &Path) -> PathBuf {
    let base = file_name
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE));
    dir.join(base)
}

/// Serialize the catalog as key-sorted, two-space indented JSON
pub fn render_catalog(catalog: &Catalog) -> Result<String> {
    // serde_json's Value map is ordered, which sorts struct fields too
    let value = serde_json::to_value(catalog).context("Failed to serialize catalog")?;
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Write the catalog to `path`, creating the parent directory if needed.
///
/// The data goes to a temporary file in the same directory which then
/// replaces `path`, so a failed write leaves any previous file intact.
pub fn write_catalog(catalog: &Catalog, path: &Path) -> Result<()> {
    let rendered = render_catalog(catalog)?;

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(rendered.as_bytes())
        .and_then(|_| tmp.flush())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = tmp.as_file().metadata()?.permissions();
        perms.set_mode(OUTPUT_MODE);
        tmp.as_file()
            .set_permissions(perms)
            .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
    }

    tmp.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

/// Read a catalog previously written by [`write_catalog`]
pub fn read_catalog(path: &Path) -> Result<Catalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}
