//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with mock implementations.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Replace file content atomically (temp file in the same directory + rename).
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Create directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// Whole-document key-value store holding one tree per transaction key.
///
/// Writes replace the document; concurrent writers are not serialized, the
/// last completed write wins.
pub trait DocumentStore: Send + Sync {
    /// Document content for `key`, None if absent.
    fn get(&self, key: &str) -> io::Result<Option<String>>;

    /// Replace the document for `key`.
    fn put(&self, key: &str, content: &str) -> io::Result<()>;

    /// All keys currently stored.
    fn keys(&self) -> io::Result<Vec<String>>;
}

/// Item for FZF-style selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionItem {
    /// Display text shown in selector
    pub display: String,
    /// Actual value (e.g., node id)
    pub value: String,
}

/// Interactive FZF-style selector abstraction.
pub trait Selector: Send + Sync {
    /// Present items to user and return selected one.
    /// Returns None if user cancels (Esc/Ctrl-C).
    ///
    /// Callers keep `display` unique within one call; the chosen row is
    /// resolved through its display text.
    fn select_one(
        &self,
        items: &[SelectionItem],
        prompt: &str,
    ) -> Result<Option<SelectionItem>, String>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        use std::io::Write;

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }
}

/// Document store keeping `<dir>/<key>.json` files.
pub struct FileDocumentStore {
    fs: Arc<dyn FileSystem>,
    dir: PathBuf,
}

impl FileDocumentStore {
    pub const EXTENSION: &'static str = "json";

    pub fn new(fs: Arc<dyn FileSystem>, dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            dir: dir.into(),
        }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", key, Self::EXTENSION))
    }
}

impl DocumentStore for FileDocumentStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        let path = self.path_for(key);
        if !self.fs.exists(&path) {
            return Ok(None);
        }
        self.fs.read_to_string(&path).map(Some)
    }

    fn put(&self, key: &str, content: &str) -> io::Result<()> {
        self.fs.create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        debug!("put: {}", path.display());
        self.fs.write(&path, content)
    }

    fn keys(&self) -> io::Result<Vec<String>> {
        if !self.fs.is_dir(&self.dir) {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        for entry in walkdir::WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().map(|ext| ext == Self::EXTENSION) != Some(true) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        Ok(keys)
    }
}

/// In-process document store.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<BTreeMap<String, String>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.documents
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "document store lock poisoned"))
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn put(&self, key: &str, content: &str) -> io::Result<()> {
        self.lock()?.insert(key.to_string(), content.to_string());
        Ok(())
    }

    fn keys(&self) -> io::Result<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}

/// Real selector implementation using skim (FZF-like).
#[derive(Debug, Default)]
pub struct SkimSelector {
    /// Height of the selection window, e.g. "50%"
    pub height: String,
}

impl SkimSelector {
    pub fn new(height: impl Into<String>) -> Self {
        Self {
            height: height.into(),
        }
    }
}

impl Selector for SkimSelector {
    fn select_one(
        &self,
        items: &[SelectionItem],
        prompt: &str,
    ) -> Result<Option<SelectionItem>, String> {
        use skim::prelude::*;
        use std::io::Cursor;

        if items.is_empty() {
            return Ok(None);
        }

        // Build input as newline-separated display strings
        let input = items
            .iter()
            .map(|i| i.display.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let height = if self.height.is_empty() {
            "50%"
        } else {
            self.height.as_str()
        };
        let options = SkimOptionsBuilder::default()
            .prompt(Some(prompt))
            .height(Some(height))
            .multi(false)
            .build()
            .map_err(|e| format!("failed to build skim options: {e}"))?;

        let item_reader = SkimItemReader::default();
        let items_arc = item_reader.of_bufread(Cursor::new(input));

        let output = Skim::run_with(&options, Some(items_arc));

        match output {
            Some(out) if out.is_abort => Ok(None),
            Some(out) => {
                if let Some(selected) = out.selected_items.first() {
                    let display = selected.output().to_string();
                    // displays are unique per call
                    let item = items.iter().find(|i| i.display == display).cloned();
                    Ok(item)
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }
}
