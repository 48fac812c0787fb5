//! File tools: directory listing, reading and writing.
//!
//! Every function resolves its path through [`WorkingRoot::resolve`] first
//! and returns a [`ToolError`] instead of propagating anything.

use tokio::fs;
use tracing::debug;

use super::security::WorkingRoot;
use crate::error::{ToolError, ToolOutcome};

/// Lists the direct children of `directory`.
///
/// One line per entry, in the order the OS enumerates them:
///
/// ```text
/// - main.py: file_size=576 bytes, is_dir=false
/// - pkg: file_size=4096 bytes, is_dir=true
/// ```
///
/// # Errors
///
/// `PathViolation` if the directory is outside the root, `NotFound` if it is
/// not an existing directory, `Io` if enumeration fails.
pub async fn list_directory(root: &WorkingRoot, directory: &str) -> ToolOutcome<String> {
    let path = root.resolve(directory, "list")?;

    if !fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
        return Err(ToolError::not_found(format!(
            "\"{directory}\" is not a valid directory"
        )));
    }

    let mut dir = fs::read_dir(&path).await.map_err(|e| ToolError::io(&e))?;
    let mut lines = Vec::new();

    while let Some(entry) = dir.next_entry().await.map_err(|e| ToolError::io(&e))? {
        let name = entry.file_name().to_string_lossy().into_owned();
        // Follow symlinks for size; fall back to the link itself when dangling.
        let metadata = match fs::metadata(entry.path()).await {
            Ok(m) => m,
            Err(_) => entry.metadata().await.map_err(|e| ToolError::io(&e))?,
        };
        lines.push(format!(
            "- {name}: file_size={} bytes, is_dir={}",
            metadata.len(),
            metadata.is_dir()
        ));
    }

    debug!(directory = %directory, entries = lines.len(), "Listed directory");
    Ok(lines.join("\n"))
}

/// Reads a text file, truncating after `max_chars` characters.
///
/// # Errors
///
/// `PathViolation` if the file is outside the root, `NotFound` if it is not
/// a regular file, `Io` if it cannot be read as UTF-8 text.
pub async fn read_file(
    root: &WorkingRoot,
    file_path: &str,
    max_chars: usize,
) -> ToolOutcome<String> {
    let path = root.resolve(file_path, "read")?;

    if !fs::metadata(&path).await.is_ok_and(|m| m.is_file()) {
        return Err(ToolError::not_found(format!(
            "File not found or is not a regular file: \"{file_path}\""
        )));
    }

    let content = fs::read_to_string(&path).await.map_err(|e| {
        debug!(path = %file_path, error = %e, "File read failed");
        ToolError::io(&e)
    })?;

    Ok(truncate_chars(content, file_path, max_chars))
}

/// Writes `content` to `file_path`, creating or truncating the file.
///
/// Parent directories are not created.
///
/// # Errors
///
/// `PathViolation` if the path is outside the root, `NotFound` if it names an
/// existing directory, `Io` if the write fails (including a missing parent).
pub async fn write_file(
    root: &WorkingRoot,
    file_path: &str,
    content: &str,
) -> ToolOutcome<String> {
    let path = root.resolve(file_path, "write to")?;

    if fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
        return Err(ToolError::not_found(format!(
            "Cannot write to \"{file_path}\" as it is a directory"
        )));
    }

    fs::write(&path, content).await.map_err(|e| {
        debug!(path = %file_path, error = %e, "File write failed");
        ToolError::io(&e)
    })?;

    Ok(format!(
        "Successfully wrote to \"{file_path}\" ({} characters written)",
        content.chars().count()
    ))
}

/// Keeps the first `max_chars` characters and appends a marker naming the
/// file and the limit. Content at or under the limit is returned unchanged.
fn truncate_chars(mut content: String, file_path: &str, max_chars: usize) -> String {
    if let Some((cut, _)) = content.char_indices().nth(max_chars) {
        content.truncate(cut);
        content.push_str(&format!(
            " [...File \"{file_path}\" truncated at {max_chars} characters]"
        ));
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolErrorKind;
    use tempfile::TempDir;

    fn setup() -> (TempDir, WorkingRoot) {
        let temp_dir = TempDir::new().unwrap();
        let root = WorkingRoot::new(temp_dir.path()).unwrap();
        (temp_dir, root)
    }

    #[test]
    fn test_truncate_chars_under_limit() {
        assert_eq!(truncate_chars("abc".to_string(), "f", 3), "abc");
    }

    #[test]
    fn test_truncate_chars_over_limit() {
        let out = truncate_chars("abcdef".to_string(), "f.txt", 4);
        assert_eq!(out, "abcd [...File \"f.txt\" truncated at 4 characters]");
    }

    #[test]
    fn test_truncate_chars_counts_characters_not_bytes() {
        let out = truncate_chars("ééééé".to_string(), "f", 2);
        assert!(out.starts_with("éé ["));
    }

    #[tokio::test]
    async fn test_list_directory_tags_entries() {
        let (tmp, root) = setup();
        std::fs::write(tmp.path().join("a"), "hello").unwrap();
        std::fs::create_dir(tmp.path().join("b")).unwrap();

        let listing = list_directory(&root, ".").await.unwrap();
        let mut lines: Vec<_> = listing.lines().collect();
        lines.sort_unstable();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "- a: file_size=5 bytes, is_dir=false");
        assert!(lines[1].starts_with("- b: file_size="));
        assert!(lines[1].ends_with("is_dir=true"));
    }

    #[tokio::test]
    async fn test_list_directory_empty() {
        let (_tmp, root) = setup();
        assert_eq!(list_directory(&root, ".").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_list_directory_missing() {
        let (_tmp, root) = setup();
        let err = list_directory(&root, "nope").await.unwrap_err();
        assert_eq!(err.kind(), ToolErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_list_directory_on_file() {
        let (tmp, root) = setup();
        std::fs::write(tmp.path().join("file.txt"), "x").unwrap();
        let err = list_directory(&root, "file.txt").await.unwrap_err();
        assert_eq!(err.kind(), ToolErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_read_file_missing() {
        let (_tmp, root) = setup();
        let err = read_file(&root, "missing.txt", 100).await.unwrap_err();
        assert_eq!(err.kind(), ToolErrorKind::NotFound);
        assert!(err.message().contains("missing.txt"));
    }

    #[tokio::test]
    async fn test_read_file_rejects_directory() {
        let (tmp, root) = setup();
        std::fs::create_dir(tmp.path().join("pkg")).unwrap();
        let err = read_file(&root, "pkg", 100).await.unwrap_err();
        assert_eq!(err.kind(), ToolErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_read_file_non_utf8_is_io_error() {
        let (tmp, root) = setup();
        std::fs::write(tmp.path().join("blob.bin"), [0xff, 0xfe, 0x00]).unwrap();
        let err = read_file(&root, "blob.bin", 100).await.unwrap_err();
        assert_eq!(err.kind(), ToolErrorKind::Io);
    }

    #[tokio::test]
    async fn test_write_file_overwrites() {
        let (tmp, root) = setup();
        std::fs::write(tmp.path().join("temp.txt"), "Hello, World").unwrap();

        let msg = write_file(&root, "temp.txt", "Hello").await.unwrap();
        assert!(msg.contains("Successfully wrote"));
        assert!(msg.contains("5 characters written"));
        assert_eq!(std::fs::read_to_string(tmp.path().join("temp.txt")).unwrap(), "Hello");
    }

    #[tokio::test]
    async fn test_write_file_missing_parent_fails() {
        let (tmp, root) = setup();
        let err = write_file(&root, "no/such/dir/file.txt", "x").await.unwrap_err();
        assert_eq!(err.kind(), ToolErrorKind::Io);
        assert!(!tmp.path().join("no").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_write_file_through_dangling_link_out_of_root() {
        let outer = TempDir::new().unwrap();
        let work = outer.path().join("work");
        std::fs::create_dir(&work).unwrap();
        std::os::unix::fs::symlink("../escaped.txt", work.join("link.txt")).unwrap();
        let root = WorkingRoot::new(&work).unwrap();

        let err = write_file(&root, "link.txt", "pwned").await.unwrap_err();
        assert_eq!(err.kind(), ToolErrorKind::PathViolation);
        assert!(!outer.path().join("escaped.txt").exists());
    }

    #[tokio::test]
    async fn test_write_file_rejects_directory() {
        let (tmp, root) = setup();
        std::fs::create_dir(tmp.path().join("temp_folder")).unwrap();
        let err = write_file(&root, "temp_folder", "").await.unwrap_err();
        assert_eq!(err.kind(), ToolErrorKind::NotFound);
        assert!(err.message().contains("is a directory"));
    }
}
