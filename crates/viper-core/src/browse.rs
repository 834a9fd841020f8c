//! Directory listings for the file browser.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use viper_lang::FileKind;

use crate::error::FileError;

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// File name.
    pub name: String,
    /// Full path.
    pub path: PathBuf,
    /// Entry is a directory.
    pub is_dir: bool,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Classification by extension.
    pub kind: FileKind,
}

/// List `dir`: directories first, then files, each group in natural order.
///
/// Entries whose metadata cannot be read are skipped. Names starting with `.` are hidden unless
/// `show_hidden` is set.
pub fn list_directory(dir: impl AsRef<Path>, show_hidden: bool) -> Result<Vec<FileEntry>, FileError> {
    let dir = dir.as_ref();
    let read_dir = fs::read_dir(dir).map_err(|err| FileError::io(dir, err))?;

    let mut entries: Vec<FileEntry> = read_dir
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !show_hidden && name.starts_with('.') {
                return None;
            }
            let metadata = entry.metadata().ok()?;
            let is_dir = metadata.is_dir();
            let kind = if is_dir {
                FileKind::Directory
            } else {
                FileKind::from_extension(&viper_lang::extension_of(&name))
            };
            Some(FileEntry {
                path: entry.path(),
                size: if is_dir { 0 } else { metadata.len() },
                name,
                is_dir,
                kind,
            })
        })
        .collect();

    entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| alphanum_cmp(&a.name, &b.name)));
    debug!(dir = %dir.display(), entries = entries.len(), "directory listed");
    Ok(entries)
}

/// Natural ordering: digit runs compare by numeric value, other text case-insensitively.
///
/// `"file2" < "file10"`. Ties fall back to a plain byte comparison so the order is total.
pub fn alphanum_cmp(a: &str, b: &str) -> Ordering {
    let mut left = Chunks::new(a);
    let mut right = Chunks::new(b);
    loop {
        let ordering = match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => compare_chunks(x, y),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
}

fn compare_chunks(x: &str, y: &str) -> Ordering {
    let x_digits = x.starts_with(|c: char| c.is_ascii_digit());
    let y_digits = y.starts_with(|c: char| c.is_ascii_digit());
    if x_digits && y_digits {
        let xs = x.trim_start_matches('0');
        let ys = y.trim_start_matches('0');
        // Equal-length digit strings compare lexicographically as numbers.
        xs.len().cmp(&ys.len()).then_with(|| xs.cmp(ys))
    } else {
        x.chars()
            .flat_map(char::to_lowercase)
            .cmp(y.chars().flat_map(char::to_lowercase))
    }
}

// Alternating runs of digits and non-digits.
struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Chunks<'a> {
    fn new(text: &'a str) -> Self {
        Self { rest: text }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .find(|c: char| c.is_ascii_digit() != digits)
            .unwrap_or(self.rest.len());
        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_alphanum_numbers_compare_numerically() {
        let mut names = vec!["file10.txt", "file2.txt", "File1.txt", "file02b", "a"];
        names.sort_by(|a, b| alphanum_cmp(a, b));
        assert_eq!(names, vec!["a", "File1.txt", "file2.txt", "file02b", "file10.txt"]);
    }

    #[test]
    fn test_alphanum_is_total() {
        assert_eq!(alphanum_cmp("abc", "ABC"), "abc".cmp("ABC"));
        assert_eq!(alphanum_cmp("x1", "x01"), "x1".cmp("x01"));
        assert_eq!(alphanum_cmp("", "a"), Ordering::Less);
    }

    #[test]
    fn test_list_directory_order_and_hidden() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b10.rs", "b9.rs", ".hidden", "notes.md"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        fs::create_dir(dir.path().join("src")).unwrap();

        let entries = list_directory(dir.path(), false).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["src", "b9.rs", "b10.rs", "notes.md"]);
        assert_eq!(entries[0].kind, FileKind::Directory);
        assert_eq!(entries[1].kind, FileKind::Code);
        assert_eq!(entries[3].kind, FileKind::Markdown);
        assert_eq!(entries[1].size, 1);

        let all = list_directory(dir.path(), true).unwrap();
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn test_list_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            list_directory(dir.path().join("nope"), false),
            Err(FileError::Io { .. })
        ));
    }
}
