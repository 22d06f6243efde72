use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

/// Unique identifier for a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(u32);

impl SourceId {
    /// Id for text that was never registered with a [`SourceMap`]
    /// (inline snippets, tests).
    pub const DETACHED: SourceId = SourceId(u32::MAX);

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// Whether `path` has an extension we treat as C++ (sources and headers).
pub fn is_cpp_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("cpp" | "cc" | "cxx" | "c++" | "hpp" | "hh" | "hxx" | "h")
    )
}

/// A source file with its contents.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub id: SourceId,
    pub path: PathBuf,
    pub content: String,
    line_starts: Vec<u32>,
}

impl SourceFile {
    pub fn new(id: SourceId, path: PathBuf, content: String) -> Self {
        let line_starts = std::iter::once(0)
            .chain(content.match_indices('\n').map(|(i, _)| i as u32 + 1))
            .collect();

        Self {
            id,
            path,
            content,
            line_starts,
        }
    }

    /// A file that is not part of any source map.
    pub fn detached(name: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self::new(SourceId::DETACHED, name.into(), content.into())
    }

    /// Get line and column (0-indexed) from byte offset.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let col = offset - self.line_starts[line];
        (line as u32, col)
    }

    pub fn len(&self) -> u32 {
        self.content.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Registry of the files a host session has loaded.
#[derive(Debug, Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
    path_to_id: FxHashMap<PathBuf, SourceId>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a C++ file. Re-adding a known path replaces its contents and
    /// keeps the id.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: String) -> miette::Result<SourceId> {
        let path = path.as_ref().to_path_buf();

        if !is_cpp_path(&path) {
            return Err(miette::miette!("Not a C++ source file: {}", path.display()));
        }

        if let Some(&id) = self.path_to_id.get(&path) {
            self.files[id.0 as usize] = SourceFile::new(id, path, content);
            return Ok(id);
        }

        let id = SourceId(self.files.len() as u32);
        self.files.push(SourceFile::new(id, path.clone(), content));
        self.path_to_id.insert(path, id);

        Ok(id)
    }

    pub fn get(&self, id: SourceId) -> Option<&SourceFile> {
        self.files.get(id.0 as usize)
    }
}
