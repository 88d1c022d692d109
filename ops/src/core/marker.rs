//! Active-directory selection over marker log contents.

/// Return the most recent marker line naming a managed directory.
///
/// Blank and whitespace-only lines are ignored and every line is trimmed.
/// Lines are scanned from the end so that newer entries win over stale
/// history; the first trimmed line starting with `prefix` is returned.
pub fn latest_active_line<'a>(contents: &'a str, prefix: &str) -> Option<&'a str> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .rev()
        .find(|line| line.starts_with(prefix))
}
