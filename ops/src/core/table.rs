//! Aligned text table for `config-edit view`.

use serde::Serialize;

use crate::core::document::ConfigEntry;

/// One displayable row: entries missing a key or a value are not rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow<'a> {
    pub key: &'a str,
    pub value: &'a str,
    pub description: &'a str,
}

/// Collect rows in document order, skipping partially specified entries.
pub fn table_rows(entries: &[ConfigEntry]) -> Vec<TableRow<'_>> {
    entries
        .iter()
        .filter_map(|entry| {
            Some(TableRow {
                key: entry.key.as_deref()?,
                value: entry.value.as_deref()?,
                description: entry.description.as_deref().unwrap_or(""),
            })
        })
        .collect()
}

/// Render entries as a key/value/description table.
///
/// Column widths are the longest included key and value (in characters).
/// The output starts with a separator line and ends with a newline.
pub fn render(entries: &[ConfigEntry]) -> String {
    let rows = table_rows(entries);
    let key_width = rows
        .iter()
        .map(|row| row.key.chars().count())
        .max()
        .unwrap_or(0);
    let value_width = rows
        .iter()
        .map(|row| row.value.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::from(" \n");
    out.push_str(&format_row("KEY", "VALUE", "DESCRIPTION", key_width, value_width));
    out.push_str(&"-".repeat(key_width + value_width + 15));
    out.push('\n');
    for row in &rows {
        out.push_str(&format_row(
            row.key,
            row.value,
            row.description,
            key_width,
            value_width,
        ));
    }
    out
}

fn format_row(key: &str, value: &str, description: &str, kw: usize, vw: usize) -> String {
    format!("{key:<kw$}  {value:<vw$}  {description}\n")
}
