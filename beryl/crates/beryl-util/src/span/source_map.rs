//! Source map - file registry with line tables.
//!
//! The source map owns every file handed to the front end and can answer
//! "what does line N of file F look like", which is how syntax errors get
//! their one-line excerpt.

use crate::error::{SourceMapError, SourceMapResult};
use crate::span::{FileId, Span};

/// A single registered source file
#[derive(Clone, Debug)]
pub struct SourceFile {
    /// Display name (usually the path it was read from)
    pub name: String,
    /// Full file contents
    pub source: String,
    /// Byte offset of the start of each line
    line_starts: Vec<usize>,
}

impl SourceFile {
    fn new(name: String, source: String) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            name,
            source,
            line_starts,
        }
    }

    /// Number of lines in the file (a trailing newline does not count as an
    /// extra line)
    pub fn line_count(&self) -> usize {
        if self.source.ends_with('\n') {
            self.line_starts.len() - 1
        } else {
            self.line_starts.len()
        }
    }

    /// The content of the given 0-based line, without its newline
    pub fn line(&self, line: usize) -> SourceMapResult<&str> {
        if line >= self.line_starts.len() {
            return Err(SourceMapError::InvalidLineNumber {
                line,
                max_lines: self.line_count(),
            });
        }
        let start = self.line_starts[line];
        let end = self
            .line_starts
            .get(line + 1)
            .map(|e| e - 1)
            .unwrap_or(self.source.len());
        Ok(&self.source[start..end])
    }

    /// 0-based line number containing the given byte offset
    pub fn line_of_offset(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line - 1,
        }
    }
}

/// Registry of all source files seen by a front-end session
///
/// # Examples
///
/// ```
/// use beryl_util::span::SourceMap;
///
/// let mut map = SourceMap::new();
/// let id = map.add_file("test.rbl", "a = 1\nb = 2\n");
/// assert_eq!(map.get(id).unwrap().line(1).unwrap(), "b = 2");
/// ```
#[derive(Debug, Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    /// Create an empty source map
    pub fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Register a file, returning its id
    pub fn add_file(&mut self, name: impl Into<String>, source: impl Into<String>) -> FileId {
        let id = FileId(self.files.len());
        self.files.push(SourceFile::new(name.into(), source.into()));
        id
    }

    /// Look up a file by id
    pub fn get(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.index())
    }

    /// Render a one-line excerpt for the given span, suitable for embedding
    /// in an error message
    pub fn excerpt(&self, span: Span) -> SourceMapResult<String> {
        let file = self
            .get(span.file_id)
            .ok_or_else(|| SourceMapError::FileNotFound(format!("{:?}", span.file_id)))?;
        let line = file.line(span.line)?;
        Ok(line.trim_end().to_string())
    }

    /// Iterate over all registered files
    pub fn iter(&self) -> impl Iterator<Item = (FileId, &SourceFile)> {
        self.files.iter().enumerate().map(|(i, f)| (FileId(i), f))
    }
}
