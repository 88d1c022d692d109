//! View/update operations for `config-edit`.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::core::document::ValueChange;
use crate::core::table::{render, table_rows};
use crate::io::document_store::{load_document, save_document};

/// Parsed positional arguments of `config-edit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditRequest {
    View,
    Update { key: String, value: String },
    Usage,
}

impl EditRequest {
    /// `view` (extra arguments ignored) or `<KEY> <VALUE>`; every other
    /// shape asks for usage.
    pub fn from_args(args: &[String]) -> Self {
        match args {
            [command, ..] if command == "view" => Self::View,
            [key, value] => Self::Update {
                key: key.clone(),
                value: value.clone(),
            },
            _ => Self::Usage,
        }
    }
}

/// Load the document and render its table (or JSON rows).
pub fn view_document(path: &Path, json: bool) -> Result<String> {
    let document = load_document(path)?;
    if json {
        let mut out = serde_json::to_string_pretty(&table_rows(document.entries()))
            .context("serialize config entries")?;
        out.push('\n');
        return Ok(out);
    }
    Ok(render(document.entries()))
}

/// Update `key` and persist the document.
///
/// Returns `None` without writing anything when the key is unknown, so the
/// file on disk stays byte-identical and no restart is offered.
pub fn update_document(path: &Path, key: &str, value: &str) -> Result<Option<ValueChange>> {
    let mut document = load_document(path)?;
    let Some(change) = document.update(key, value) else {
        return Ok(None);
    };
    save_document(&document, path)?;
    info!(key, path = %path.display(), "config value updated");
    Ok(Some(change))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::document_store::DocumentError;
    use crate::test_support::{SAMPLE_DOCUMENT, write_document};
    use std::fs;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn request_shapes() {
        assert_eq!(EditRequest::from_args(&args(&["view"])), EditRequest::View);
        assert_eq!(
            EditRequest::from_args(&args(&["poll_interval", "60"])),
            EditRequest::Update {
                key: "poll_interval".to_string(),
                value: "60".to_string(),
            }
        );
        assert_eq!(
            EditRequest::from_args(&args(&["view", "extra"])),
            EditRequest::View
        );
        assert_eq!(EditRequest::from_args(&args(&[])), EditRequest::Usage);
        assert_eq!(EditRequest::from_args(&args(&["symbol"])), EditRequest::Usage);
        assert_eq!(
            EditRequest::from_args(&args(&["a", "b", "c"])),
            EditRequest::Usage
        );
    }

    #[test]
    fn view_skips_partial_entries() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = write_document(temp.path(), SAMPLE_DOCUMENT);

        let table = view_document(&path, false).expect("view");
        assert!(table.contains("poll_interval  30"));
        assert!(table.contains("Polling interval in seconds"));
        assert!(table.contains("max_lot"));
        assert!(!table.contains("lot_step"));
        assert!(!table.contains("orphan"));
        assert!(table.contains("a < b & \"c\""));
    }

    #[test]
    fn view_json_lists_rows() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = write_document(temp.path(), SAMPLE_DOCUMENT);

        let json = view_document(&path, true).expect("view");
        let rows: serde_json::Value = serde_json::from_str(&json).expect("json");
        let rows = rows.as_array().expect("array");
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0]["key"], "poll_interval");
        assert_eq!(rows[1]["description"], "");
    }

    #[test]
    fn update_persists_new_value() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = write_document(temp.path(), SAMPLE_DOCUMENT);

        let change = update_document(&path, "poll_interval", "60")
            .expect("update")
            .expect("key exists");
        assert_eq!(change.to_string(), "poll_interval: 30 -> 60");

        let reloaded = load_document(&path).expect("reload");
        assert_eq!(
            reloaded.get("poll_interval").expect("key").value.as_deref(),
            Some("60")
        );
    }

    #[test]
    fn unknown_key_leaves_file_byte_identical() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = write_document(temp.path(), SAMPLE_DOCUMENT);
        let before = fs::read(&path).expect("read");

        let change = update_document(&path, "nonexistent_key", "x").expect("update");
        assert!(change.is_none());
        assert_eq!(fs::read(&path).expect("read"), before);
    }

    #[test]
    fn missing_document_surfaces_not_found() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = view_document(&temp.path().join("bot_config.xml"), false)
            .expect_err("missing document");
        assert!(matches!(
            err.downcast_ref::<DocumentError>(),
            Some(DocumentError::NotFound { .. })
        ));
    }
}
