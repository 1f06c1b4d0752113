//! Relative paths between generated output files
//!
//! Generated sources refer to each other through `#[path = "..."]` attributes,
//! which rustc resolves relative to the directory of the referring file. The
//! computation here is purely lexical and never looks at the filesystem or the
//! current working directory.

use std::fmt;

use crate::error::{GenerateError, Result};

/// A validated, `/`-separated path relative to the output root
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelativePath {
    segments: Vec<String>,
}

impl RelativePath {
    /// Validate `path` and split it into segments.
    ///
    /// The path must be non-empty and relative, must not end with `/`, and
    /// must not contain empty, `.` or `..` segments.
    pub fn new(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(GenerateError::precondition("output path must not be empty"));
        }
        if path.starts_with('/') {
            return Err(GenerateError::precondition(format!(
                "output path '{path}' must be relative"
            )));
        }
        if path.ends_with('/') {
            return Err(GenerateError::precondition(format!(
                "output path '{path}' must name a file, not a directory"
            )));
        }

        let segments = path
            .split('/')
            .map(|segment| match segment {
                "" | "." | ".." => Err(GenerateError::precondition(format!(
                    "output path '{path}' contains an invalid segment '{segment}'"
                ))),
                _ => Ok(segment.to_owned()),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { segments })
    }

    /// Segments of the directory containing this file
    fn directory(&self) -> &[String] {
        &self.segments[..self.segments.len() - 1]
    }

    /// Shortest path that reaches `dest` from the directory holding `self`.
    pub fn relative(&self, dest: &Self) -> String {
        let source_dir = self.directory();
        let dest_dir = dest.directory();

        let common = source_dir
            .iter()
            .zip(dest_dir)
            .take_while(|(a, b)| a == b)
            .count();

        let ups = source_dir.len() - common;
        let mut parts: Vec<&str> = Vec::with_capacity(ups + dest.segments.len() - common);
        parts.extend(std::iter::repeat_n("..", ups));
        parts.extend(dest.segments[common..].iter().map(String::as_str));
        parts.join("/")
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    fn relative(from: &str, to: &str) -> String {
        RelativePath::new(from)
            .unwrap()
            .relative(&RelativePath::new(to).unwrap())
    }

    /// Lexically resolve `rel` against the directory of `from`
    fn resolve(from: &str, rel: &str) -> String {
        let mut parts: Vec<&str> = from.split('/').collect();
        parts.pop();
        for segment in rel.split('/') {
            if segment == ".." {
                parts.pop();
            } else {
                parts.push(segment);
            }
        }
        parts.join("/")
    }

    #[test]
    fn test_sibling_files() {
        assert_snapshot!(relative("a/b.rs", "a/c.rs"), @"c.rs");
        assert_snapshot!(relative("b.rs", "c.rs"), @"c.rs");
    }

    #[test]
    fn test_descend_and_ascend() {
        assert_snapshot!(relative("x.rs", "y/z.rs"), @"y/z.rs");
        assert_snapshot!(relative("a/b/c.rs", "a/d/e.rs"), @"../d/e.rs");
        assert_snapshot!(relative("a/b/c.rs", "x.rs"), @"../../x.rs");
        assert_snapshot!(relative("a/b.rs", "a/b/c.rs"), @"b/c.rs");
    }

    #[test]
    fn test_file_named_like_directory() {
        // `a` is a file here, not the directory of the source
        assert_eq!(relative("a/b.rs", "a"), "../a");
    }

    #[test]
    fn test_round_trip_reconstructs_destination() {
        let pairs = [
            ("a/b.rs", "a/c.rs"),
            ("x.rs", "y/z.rs"),
            ("a/b/c.rs", "a/d/e.rs"),
            ("a/b/c.rs", "x.rs"),
            ("foo/bar/baz.u.pb.rs", "foo/qux/deep/file.u.pb.rs"),
        ];
        for (from, to) in pairs {
            let rel = relative(from, to);
            assert_eq!(resolve(from, &rel), to, "{from} -> {to} via {rel}");
            // And back again towards the original location
            let back = relative(to, from);
            assert_eq!(resolve(to, &back), from, "{to} -> {from} via {back}");
        }
    }

    #[test]
    fn test_rejects_malformed_paths() {
        for bad in ["", "/abs/file.rs", "dir/", "a//b.rs", "./a.rs", "a/../b.rs"] {
            let err = RelativePath::new(bad).unwrap_err();
            assert!(
                matches!(err, GenerateError::Precondition(_)),
                "expected precondition violation for {bad:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(RelativePath::new("a/b/c.rs").unwrap().to_string(), "a/b/c.rs");
    }
}
