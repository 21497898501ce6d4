//! Script discovery

use std::path::Path;

use sqlrun_core::{Result, ScriptSource, SqlRunError};

/// List the `.sql` files directly inside `folder`, sorted by file name.
///
/// Non-recursive; the extension match is case-insensitive. The display
/// name of each source is its file name.
pub async fn discover_scripts(folder: &Path) -> Result<Vec<ScriptSource>> {
    if !folder.is_dir() {
        return Err(SqlRunError::Config(format!(
            "not a folder: {}",
            folder.display()
        )));
    }

    let mut sources = Vec::new();
    let mut entries = tokio::fs::read_dir(folder).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let path = entry.path();
        let is_sql = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("sql"));
        if is_sql {
            sources.push(ScriptSource::from_path(path));
        }
    }

    sources.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    tracing::debug!(folder = %folder.display(), count = sources.len(), "scripts discovered");
    Ok(sources)
}
