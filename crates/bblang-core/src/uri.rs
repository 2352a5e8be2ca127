//! Document identifiers.
//!
//! A [`FileUri`] is the URI string the editor hands us, kept verbatim so that
//! lookups match exactly what the client sent. Only `file:` URIs map onto the
//! filesystem; notebook cells and untitled buffers use other schemes and are
//! only ever resolved in memory.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

/// A document URI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileUri(String);

impl FileUri {
    /// Wrap a URI string without validating it.
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// The URI as it was received.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The URI scheme, if the string has one.
    pub fn scheme(&self) -> Option<&str> {
        let (scheme, _) = self.0.split_once(':')?;
        let mut chars = scheme.chars();
        let valid = scheme.len() > 1
            && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        valid.then_some(scheme)
    }

    /// Whether this URI points at the local filesystem.
    pub fn is_file(&self) -> bool {
        self.scheme() == Some("file")
    }

    /// Length of the `scheme://authority` prefix.
    fn prefix_len(&self) -> usize {
        let Some(scheme) = self.scheme() else {
            return 0;
        };
        let after_scheme = scheme.len() + 1;
        let rest = &self.0[after_scheme..];
        match rest.strip_prefix("//") {
            Some(authority) => {
                after_scheme
                    + 2
                    + authority
                        .find(|c| matches!(c, '/' | '?' | '#'))
                        .unwrap_or(authority.len())
            }
            None => after_scheme,
        }
    }

    /// The still-encoded path, without query or fragment.
    fn raw_path(&self) -> &str {
        let rest = &self.0[self.prefix_len()..];
        let end = rest.find(|c| matches!(c, '?' | '#')).unwrap_or(rest.len());
        &rest[..end]
    }

    /// The percent-decoded path component.
    pub fn path(&self) -> String {
        let raw = self.raw_path();
        urlencoding::decode(raw).map_or_else(|_| raw.to_string(), Cow::into_owned)
    }

    /// Convert a `file:` URI to a filesystem path.
    #[cfg(not(windows))]
    pub fn to_file_path(&self) -> Option<PathBuf> {
        self.is_file().then(|| PathBuf::from(self.path()))
    }

    /// Convert a `file:` URI to a filesystem path (Windows version).
    #[cfg(windows)]
    pub fn to_file_path(&self) -> Option<PathBuf> {
        if !self.is_file() {
            return None;
        }
        let path = self.path();
        // file:///C:/... carries a leading slash before the drive letter
        let path = path.strip_prefix('/').unwrap_or(&path);
        Some(PathBuf::from(path))
    }

    /// Build a `file:` URI from a filesystem path.
    pub fn from_file_path(path: &Path) -> Self {
        let path = path.to_string_lossy().replace('\\', "/");
        let encoded = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        if encoded.starts_with('/') {
            Self(format!("file://{encoded}"))
        } else {
            Self(format!("file:///{encoded}"))
        }
    }

    /// The lowercased extension of the last path segment, without the dot.
    pub fn extension(&self) -> Option<String> {
        let name = self.raw_path().rsplit('/').next()?;
        let (stem, extension) = name.rsplit_once('.')?;
        if stem.is_empty() || extension.is_empty() {
            return None;
        }
        Some(extension.to_ascii_lowercase())
    }

    /// The decoded last path segment.
    pub fn file_name(&self) -> Option<String> {
        let name = self.raw_path().rsplit('/').next()?;
        if name.is_empty() {
            return None;
        }
        Some(urlencoding::decode(name).map_or_else(|_| name.to_string(), Cow::into_owned))
    }

    /// Resolve `reference` against this URI the way a relative link is
    /// resolved against the page it appears on.
    ///
    /// Absolute URIs are returned as they are. Relative references replace
    /// the last segment of this URI's path, and `.`/`..` segments are folded.
    pub fn join(&self, reference: &str) -> Option<Self> {
        let candidate = Self::new(reference);
        if candidate.scheme().is_some() {
            return Some(candidate);
        }
        self.scheme()?;

        let prefix = &self.0[..self.prefix_len()];
        let encoded_reference = reference
            .replace('\\', "/")
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        let merged = if encoded_reference.starts_with('/') {
            encoded_reference
        } else {
            let base = self.raw_path();
            let directory = base.rfind('/').map_or("/", |i| &base[..=i]);
            format!("{directory}{encoded_reference}")
        };

        Some(Self(format!("{prefix}{}", remove_dot_segments(&merged))))
    }
}

/// Fold `.` and `..` segments out of an absolute path.
fn remove_dot_segments(path: &str) -> String {
    let mut output: Vec<&str> = Vec::new();
    let segments: Vec<&str> = path.split('/').collect();
    let last = segments.len().saturating_sub(1);
    let mut trailing_slash = false;

    for (i, segment) in segments.iter().enumerate() {
        match *segment {
            "." => trailing_slash = i == last,
            ".." => {
                if output.len() > 1 {
                    output.pop();
                }
                trailing_slash = i == last;
            }
            _ => {
                output.push(segment);
                trailing_slash = false;
            }
        }
    }

    let mut result = output.join("/");
    if !result.starts_with('/') {
        result.insert(0, '/');
    }
    if trailing_slash && !result.ends_with('/') {
        result.push('/');
    }
    result
}

impl fmt::Display for FileUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileUri {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FileUri {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for FileUri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_and_extension() {
        let uri = FileUri::new("file:///home/user/Main.BBC");
        assert_eq!(uri.scheme(), Some("file"));
        assert!(uri.is_file());
        assert_eq!(uri.extension().as_deref(), Some("bbc"));

        let cell = FileUri::new("vscode-notebook-cell:/home/user/book.ipynb#W0sZmlsZQ%3D%3D");
        assert!(!cell.is_file());
        assert_eq!(cell.extension().as_deref(), Some("ipynb"));
    }

    #[test]
    fn test_no_extension() {
        assert_eq!(FileUri::new("file:///home/user/Makefile").extension(), None);
        assert_eq!(FileUri::new("file:///home/user/.hidden").extension(), None);
    }

    #[test]
    fn test_decoded_path() {
        let uri = FileUri::new("file:///home/user/my%20project/a.bbc");
        assert_eq!(uri.path(), "/home/user/my project/a.bbc");
        assert_eq!(uri.file_name().as_deref(), Some("a.bbc"));
    }

    #[test]
    fn test_join_sibling() {
        let base = FileUri::new("file:///project/src/main.bbc");
        assert_eq!(
            base.join("utils.bbc").map(|u| u.to_string()).as_deref(),
            Some("file:///project/src/utils.bbc")
        );
    }

    #[test]
    fn test_join_parent_segments() {
        let base = FileUri::new("file:///project/src/main.bbc");
        let joined = base.join("../lib/./math.bbc").map(|u| u.to_string());
        assert_eq!(joined.as_deref(), Some("file:///project/lib/math.bbc"));

        let above_root = base.join("../../../x.bbc").map(|u| u.to_string());
        assert_eq!(above_root.as_deref(), Some("file:///x.bbc"));
    }

    #[test]
    fn test_join_absolute() {
        let base = FileUri::new("file:///project/src/main.bbc");
        let joined = base.join("/other/a.bbc").map(|u| u.to_string());
        assert_eq!(joined.as_deref(), Some("file:///other/a.bbc"));

        let uri = base.join("untitled:Untitled-1").map(|u| u.to_string());
        assert_eq!(uri.as_deref(), Some("untitled:Untitled-1"));
    }

    #[test]
    fn test_join_encodes_spaces() {
        let base = FileUri::new("file:///project/main.bbc");
        let joined = base.join("my lib.bbc").map(|u| u.to_string());
        assert_eq!(joined.as_deref(), Some("file:///project/my%20lib.bbc"));
    }

    #[test]
    fn test_join_without_scheme() {
        assert!(FileUri::new("main.bbc").join("other.bbc").is_none());
    }

    #[cfg(not(windows))]
    #[test]
    fn test_file_path_round_trip() {
        let path = Path::new("/tmp/some dir/file.bbc");
        let uri = FileUri::from_file_path(path);
        assert_eq!(uri.as_str(), "file:///tmp/some%20dir/file.bbc");
        assert_eq!(uri.to_file_path().as_deref(), Some(path));
    }
}
