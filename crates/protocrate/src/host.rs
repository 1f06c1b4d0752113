//! The toolchain side of generation
//!
//! A host knows which files are compiled together and where outputs go. The
//! orchestrator never touches the filesystem itself.

use std::{
    cell::RefCell,
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
    rc::Rc,
};

use log::trace;

use crate::{
    descriptor::FileId,
    types::{FxIndexMap, FxIndexSet},
};

/// What the orchestrator needs from the driving toolchain
pub trait GeneratorHost {
    /// Files compiled together into the current crate. The first one is the
    /// primary file.
    fn parsed_files(&self) -> &[FileId];

    /// Open a fresh output stream at `path`, relative to the output root
    fn open(&mut self, path: &str) -> io::Result<Box<dyn Write>>;
}

/// Writes outputs below a root directory
#[derive(Debug)]
pub struct DirectoryHost {
    root: PathBuf,
    files: Vec<FileId>,
    opened: Vec<PathBuf>,
}

impl DirectoryHost {
    pub fn new(root: impl Into<PathBuf>, files: Vec<FileId>) -> Self {
        Self {
            root: root.into(),
            files,
            opened: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every output opened so far, in order
    pub fn opened(&self) -> &[PathBuf] {
        &self.opened
    }
}

impl GeneratorHost for DirectoryHost {
    fn parsed_files(&self) -> &[FileId] {
        &self.files
    }

    fn open(&mut self, path: &str) -> io::Result<Box<dyn Write>> {
        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }
        trace!("Opening {}", full_path.display());
        let file = File::create(&full_path)?;
        self.opened.push(full_path);
        Ok(Box::new(file))
    }
}

type SharedOutputs = Rc<RefCell<FxIndexMap<String, Vec<u8>>>>;

/// Keeps outputs in memory; used by tests and embedders
#[derive(Debug, Default)]
pub struct MemoryHost {
    files: Vec<FileId>,
    outputs: SharedOutputs,
    denied: FxIndexSet<String>,
}

impl MemoryHost {
    pub fn new(files: Vec<FileId>) -> Self {
        Self {
            files,
            ..Self::default()
        }
    }

    /// Make opening `path` fail with `PermissionDenied`
    pub fn deny(&mut self, path: impl Into<String>) {
        self.denied.insert(path.into());
    }

    /// Content written to `path`, if it was opened
    pub fn output(&self, path: &str) -> Option<String> {
        self.outputs
            .borrow()
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Paths of all opened outputs, in opening order
    pub fn paths(&self) -> Vec<String> {
        self.outputs.borrow().keys().cloned().collect()
    }
}

impl GeneratorHost for MemoryHost {
    fn parsed_files(&self) -> &[FileId] {
        &self.files
    }

    fn open(&mut self, path: &str) -> io::Result<Box<dyn Write>> {
        if self.denied.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("output '{path}' is not writable"),
            ));
        }
        self.outputs.borrow_mut().insert(path.to_owned(), Vec::new());
        Ok(Box::new(MemoryOutput {
            path: path.to_owned(),
            outputs: Rc::clone(&self.outputs),
        }))
    }
}

struct MemoryOutput {
    path: String,
    outputs: SharedOutputs,
}

impl Write for MemoryOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.outputs
            .borrow_mut()
            .entry(self.path.clone())
            .or_default()
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_host_collects_output() {
        let mut host = MemoryHost::new(vec![FileId::new(0)]);
        let mut out = host.open("a/b.rs").unwrap();
        out.write_all(b"hello").unwrap();
        drop(out);

        assert_eq!(host.parsed_files(), &[FileId::new(0)]);
        assert_eq!(host.output("a/b.rs").as_deref(), Some("hello"));
        assert_eq!(host.paths(), vec!["a/b.rs".to_owned()]);
        assert_eq!(host.output("missing.rs"), None);
    }

    #[test]
    fn test_memory_host_denied_path() {
        let mut host = MemoryHost::new(Vec::new());
        host.deny("nope.rs");
        let err = host.open("nope.rs").err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_directory_host_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = DirectoryHost::new(dir.path(), Vec::new());
        {
            let mut out = host.open("nested/dir/file.rs").unwrap();
            out.write_all(b"content").unwrap();
        }
        let written = fs::read_to_string(dir.path().join("nested/dir/file.rs")).unwrap();
        assert_eq!(written, "content");
        assert_eq!(host.opened().len(), 1);
    }
}
