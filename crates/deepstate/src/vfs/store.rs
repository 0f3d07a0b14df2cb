//! In-memory text file store.

use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Default number of lines returned by [`FileStore::read`].
pub const DEFAULT_READ_LIMIT: usize = 2000;

/// Lines longer than this many characters are truncated when rendered.
pub const MAX_LINE_CHARS: usize = 2000;

/// Returned by [`FileStore::read`] in place of content when a file exists but
/// holds nothing but whitespace.
pub const EMPTY_FILE_NOTICE: &str = "System reminder: File exists but has empty contents";

/// Errors that can occur during file store operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsError {
    /// No file is stored under the path
    #[error("file '{0}' not found")]
    NotFound(String),
    /// Read offset is past the last line
    #[error("line offset {offset} exceeds file length ({total_lines} lines)")]
    OffsetOutOfRange {
        /// Requested 0-based line offset
        offset: usize,
        /// Number of lines in the file
        total_lines: usize,
    },
    /// The string to replace does not occur in the file
    #[error("string not found in file '{path}': '{needle}'")]
    StringNotFound {
        /// File that was searched
        path: String,
        /// The string that was not found
        needle: String,
    },
    /// The string to replace occurs more than once and `replace_all` was not set
    #[error(
        "string '{needle}' appears {occurrences} times in file '{path}'. Use replace_all=true \
         to replace every instance, or provide a more specific string with surrounding context"
    )]
    AmbiguousMatch {
        /// File that was searched
        path: String,
        /// The ambiguous string
        needle: String,
        /// Number of occurrences found
        occurrences: usize,
    },
}

/// Ordered map of path to text content.
///
/// Paths are opaque keys: `/` is an ordinary character and there are no
/// directories. Iteration and [`list`](FileStore::list) follow first-insertion
/// order; overwriting a path keeps its original position.
#[derive(Clone, Default)]
pub struct FileStore {
    order: Vec<String>,
    contents: HashMap<String, String>,
}

impl fmt::Debug for FileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl PartialEq for FileStore {
    fn eq(&self, other: &Self) -> bool {
        self.contents == other.contents
    }
}

impl Eq for FileStore {}

impl FileStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// All known paths in insertion order.
    pub fn list(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the store holds no files.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether a file exists at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.contents.contains_key(path)
    }

    /// Raw content of a file, without line numbering.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.contents.get(path).map(String::as_str)
    }

    /// Iterate `(path, content)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.order.iter().filter_map(|path| {
            self.contents
                .get(path)
                .map(|content| (path.as_str(), content.as_str()))
        })
    }

    /// Read a window of lines rendered in `cat -n` style.
    ///
    /// Each line is rendered as its 1-based number right-aligned to width 6,
    /// a tab, then the line truncated to [`MAX_LINE_CHARS`] characters.
    pub fn read(&self, path: &str, offset: usize, limit: usize) -> Result<String, FsError> {
        let content = self
            .contents
            .get(path)
            .ok_or_else(|| FsError::NotFound(path.to_string()))?;

        if content.trim().is_empty() {
            return Ok(EMPTY_FILE_NOTICE.to_string());
        }

        let lines: Vec<&str> = content.lines().collect();
        if offset >= lines.len() {
            return Err(FsError::OffsetOutOfRange {
                offset,
                total_lines: lines.len(),
            });
        }

        let rendered: Vec<String> = lines
            .iter()
            .enumerate()
            .skip(offset)
            .take(limit)
            .map(|(idx, line)| format!("{:>6}\t{}", idx + 1, truncate_chars(line, MAX_LINE_CHARS)))
            .collect();
        Ok(rendered.join("\n"))
    }

    /// Create or overwrite a file.
    pub fn write(&mut self, path: impl Into<String>, content: impl Into<String>) {
        let path = path.into();
        if !self.contents.contains_key(&path) {
            self.order.push(path.clone());
        }
        self.contents.insert(path, content.into());
    }

    /// Replace `old` with `new` inside a file.
    ///
    /// Without `replace_all`, `old` must occur exactly once. Returns the number
    /// of replacements made. On error the file is left unchanged.
    pub fn edit(
        &mut self,
        path: &str,
        old: &str,
        new: &str,
        replace_all: bool,
    ) -> Result<usize, FsError> {
        let content = self
            .contents
            .get_mut(path)
            .ok_or_else(|| FsError::NotFound(path.to_string()))?;

        let occurrences = if old.is_empty() {
            0
        } else {
            content.matches(old).count()
        };
        if occurrences == 0 {
            return Err(FsError::StringNotFound {
                path: path.to_string(),
                needle: old.to_string(),
            });
        }
        if occurrences > 1 && !replace_all {
            return Err(FsError::AmbiguousMatch {
                path: path.to_string(),
                needle: old.to_string(),
                occurrences,
            });
        }

        *content = if replace_all {
            content.replace(old, new)
        } else {
            content.replacen(old, new, 1)
        };
        tracing::debug!(path = %path, replaced = occurrences, "edited file");
        Ok(occurrences)
    }

    /// Insert every entry of `other`, letting `other` win on shared paths.
    pub(crate) fn extend_from(&mut self, other: FileStore) {
        let FileStore {
            order,
            mut contents,
        } = other;
        for path in order {
            if let Some(content) = contents.remove(&path) {
                self.write(path, content);
            }
        }
    }
}

fn truncate_chars(line: &str, max: usize) -> &str {
    match line.char_indices().nth(max) {
        Some((byte_idx, _)) => &line[..byte_idx],
        None => line,
    }
}

impl<K, V> FromIterator<(K, V)> for FileStore
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut store = FileStore::new();
        for (path, content) in iter {
            store.write(path, content);
        }
        store
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for FileStore
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl IntoIterator for FileStore {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        let FileStore {
            order,
            mut contents,
        } = self;
        order
            .into_iter()
            .filter_map(|path| contents.remove(&path).map(|content| (path, content)))
            .collect::<Vec<_>>()
            .into_iter()
    }
}

impl Serialize for FileStore {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (path, content) in self.iter() {
            map.serialize_entry(path, content)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FileStore {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct StoreVisitor;

        impl<'de> Visitor<'de> for StoreVisitor {
            type Value = FileStore;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of file path to text content")
            }

            fn visit_map<A>(self, mut access: A) -> Result<FileStore, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut store = FileStore::new();
                while let Some((path, content)) = access.next_entry::<String, String>()? {
                    store.write(path, content);
                }
                Ok(store)
            }
        }

        deserializer.deserialize_map(StoreVisitor)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn plan() -> FileStore {
        FileStore::from([("plan.md", "Line1\nLine2\nLine3")])
    }

    // ==================== Read Tests ====================

    #[test]
    fn test_read_missing_path() {
        let store = FileStore::new();
        let err = store.read("nope.txt", 0, DEFAULT_READ_LIMIT).unwrap_err();
        assert_eq!(err, FsError::NotFound("nope.txt".to_string()));
    }

    #[test]
    fn test_read_whole_file_numbering() {
        let store = plan();
        let out = store.read("plan.md", 0, 3).unwrap();
        assert_eq!(out, "     1\tLine1\n     2\tLine2\n     3\tLine3");
    }

    #[test]
    fn test_read_window() {
        let store = plan();
        let out = store.read("plan.md", 1, 1).unwrap();
        assert_eq!(out, "     2\tLine2");
    }

    #[test]
    fn test_read_limit_past_end_is_clamped() {
        let store = plan();
        let out = store.read("plan.md", 2, 50).unwrap();
        assert_eq!(out, "     3\tLine3");
    }

    #[test]
    fn test_read_offset_out_of_range() {
        let store = plan();
        let err = store.read("plan.md", 3, 10).unwrap_err();
        assert_eq!(
            err,
            FsError::OffsetOutOfRange {
                offset: 3,
                total_lines: 3
            }
        );
        assert!(err.to_string().contains("3 lines"));
    }

    #[test]
    fn test_read_empty_file_sentinel() {
        let mut store = FileStore::new();
        store.write("empty.txt", "");
        store.write("blank.txt", "  \n\t");
        assert_eq!(store.read("empty.txt", 0, 10).unwrap(), EMPTY_FILE_NOTICE);
        assert_eq!(store.read("blank.txt", 5, 10).unwrap(), EMPTY_FILE_NOTICE);
        assert!(store.contains("empty.txt"));
    }

    #[test]
    fn test_read_truncates_long_lines() {
        let mut store = FileStore::new();
        let long = "é".repeat(MAX_LINE_CHARS + 10);
        store.write("long.txt", long);
        let out = store.read("long.txt", 0, 1).unwrap();
        let (_, line) = out.split_once('\t').unwrap();
        assert_eq!(line.chars().count(), MAX_LINE_CHARS);
    }

    #[test]
    fn test_read_wide_line_numbers_stay_aligned() {
        let mut store = FileStore::new();
        let content: Vec<String> = (0..1_000_001).map(|i| format!("l{i}")).collect();
        store.write("big.txt", content.join("\n"));
        let out = store.read("big.txt", 999_999, 2).unwrap();
        assert_eq!(out, "1000000\tl999999\n1000001\tl1000000");
    }

    // ==================== Write / List Tests ====================

    #[test]
    fn test_write_then_list_in_insertion_order() {
        let mut store = FileStore::new();
        store.write("b.txt", "b");
        store.write("a/notes.md", "a");
        store.write("b.txt", "bb");
        assert_eq!(store.list(), vec!["b.txt", "a/notes.md"]);
        assert_eq!(store.get("b.txt"), Some("bb"));
    }

    // ==================== Edit Tests ====================

    #[test]
    fn test_edit_single_occurrence() {
        let mut store = plan();
        let replaced = store.edit("plan.md", "Line2", "LineTwo", false).unwrap();
        assert_eq!(replaced, 1);
        let out = store.read("plan.md", 0, DEFAULT_READ_LIMIT).unwrap();
        assert_eq!(out, "     1\tLine1\n     2\tLineTwo\n     3\tLine3");
    }

    #[test]
    fn test_edit_ambiguous_leaves_content() {
        let mut store = FileStore::from([("f.txt", "foo bar foo")]);
        let err = store.edit("f.txt", "foo", "baz", false).unwrap_err();
        assert!(matches!(err, FsError::AmbiguousMatch { occurrences: 2, .. }));
        assert!(err.to_string().contains("2 times"));
        assert_eq!(store.get("f.txt"), Some("foo bar foo"));
    }

    #[test]
    fn test_edit_replace_all() {
        let mut store = FileStore::from([("f.txt", "foo bar foo")]);
        let replaced = store.edit("f.txt", "foo", "baz", true).unwrap();
        assert_eq!(replaced, 2);
        assert_eq!(store.get("f.txt"), Some("baz bar baz"));
    }

    #[test]
    fn test_edit_missing_path() {
        let mut store = FileStore::new();
        let err = store.edit("nope", "a", "b", false).unwrap_err();
        assert_eq!(err, FsError::NotFound("nope".to_string()));
        assert!(store.is_empty());
    }

    #[test]
    fn test_edit_string_not_found() {
        let mut store = plan();
        let err = store.edit("plan.md", "Line9", "x", true).unwrap_err();
        assert!(matches!(err, FsError::StringNotFound { .. }));
        assert_eq!(store.get("plan.md"), Some("Line1\nLine2\nLine3"));
    }

    #[test]
    fn test_edit_empty_needle_is_not_found() {
        let mut store = plan();
        let err = store.edit("plan.md", "", "x", false).unwrap_err();
        assert!(matches!(err, FsError::StringNotFound { .. }));
    }

    // ==================== Serde Tests ====================

    #[test]
    fn test_serde_preserves_order() {
        let json = r#"{"z.md":"1","a.md":"2"}"#;
        let store: FileStore = serde_json::from_str(json).unwrap();
        assert_eq!(store.list(), vec!["z.md", "a.md"]);
        assert_eq!(serde_json::to_string(&store).unwrap(), json);
    }

    #[test]
    fn test_into_iter_keeps_insertion_order() {
        let mut store = FileStore::from([("b", "1"), ("a", "2")]);
        store.write("b", "3");
        let pairs: Vec<(String, String)> = store.into_iter().collect();
        assert_eq!(
            pairs,
            vec![("b".to_string(), "3".to_string()), ("a".to_string(), "2".to_string())]
        );
    }
}
