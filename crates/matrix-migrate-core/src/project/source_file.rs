use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::syntax::{Dialect, SyntaxNode, ToSource, TypeScriptParser, MAX_NESTING};
use crate::{MigrateError, Result};

/// One source file: its current text and the tree parsed from that text
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: PathBuf,
    dialect: Dialect,
    text: String,
    tree: SyntaxNode,
    /// Nested too deeply to convert; the tree is the bare text
    too_deep: bool,
    dirty: bool,
}

impl SourceFile {
    /// Parse `text` as the contents of `path`
    pub fn parse(path: impl Into<PathBuf>, text: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let text = text.into();
        let dialect = Dialect::from_path(&path).unwrap_or(Dialect::TypeScript);
        let (tree, too_deep) = parse_tree(&path, dialect, &text)?;

        Ok(Self {
            path,
            dialect,
            text,
            tree,
            too_deep,
            dirty: false,
        })
    }

    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let text = fs::read_to_string(&path).map_err(|e| MigrateError::Load {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Self::parse(path, text)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn base_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tree(&self) -> &SyntaxNode {
        &self.tree
    }

    /// Whether the source nests too deeply to be rewritten
    pub fn is_too_deep(&self) -> bool {
        self.too_deep
    }

    /// Whether the text differs from what is on disk
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Adopt a rewritten tree.
    ///
    /// The tree is rendered and the result reparsed, so spans always refer
    /// to the current text. Returns whether the text changed.
    pub fn replace_tree(&mut self, tree: SyntaxNode) -> Result<bool> {
        let text = tree.to_source();
        if text == self.text {
            return Ok(false);
        }
        (self.tree, self.too_deep) = parse_tree(&self.path, self.dialect, &text)?;
        self.text = text;
        self.dirty = true;
        Ok(true)
    }

    /// Zero-based line containing byte `offset`
    pub fn line_of(&self, offset: usize) -> usize {
        let end = offset.min(self.text.len());
        self.text.as_bytes()[..end]
            .iter()
            .filter(|&&byte| byte == b'\n')
            .count()
    }

    /// Byte offset of a one-based `line` and `column`, where the column
    /// counts characters
    pub fn offset_of(&self, line: usize, column: usize) -> Option<usize> {
        let line_start = if line <= 1 {
            0
        } else {
            self.text
                .match_indices('\n')
                .nth(line - 2)
                .map(|(index, _)| index + 1)?
        };
        let rest = &self.text[line_start..];
        let line_text = rest.split('\n').next().unwrap_or_default();
        let column_offset = line_text
            .char_indices()
            .nth(column.saturating_sub(1))
            .map(|(index, _)| index)
            .unwrap_or(line_text.len());
        Some(line_start + column_offset)
    }

    /// Write the current text to disk if it changed
    pub fn persist(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        fs::write(&self.path, &self.text).map_err(|source| MigrateError::Persist {
            path: self.path.clone(),
            source,
        })?;
        self.dirty = false;
        Ok(())
    }
}

fn parse_tree(path: &Path, dialect: Dialect, text: &str) -> Result<(SyntaxNode, bool)> {
    let to_error = |message: String| MigrateError::Parse {
        path: path.to_path_buf(),
        message,
    };
    let mut parser = TypeScriptParser::new(dialect).map_err(to_error)?;
    let tree = parser.parse(text).map_err(to_error)?;
    if parser.last_had_errors() {
        warn!("{} has syntax errors; rewriting it anyway", path.display());
    }
    if parser.last_too_deep() {
        warn!(
            "{} nests deeper than {MAX_NESTING} levels; it will be left unchanged",
            path.display()
        );
    }
    Ok((tree, parser.last_too_deep()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::build;

    #[test]
    fn test_line_and_offset_lookup() {
        let file = SourceFile::parse("a.ts", "let a = 1;\nlet b = [1, 2];\nf();\n").unwrap();
        assert_eq!(file.line_of(0), 0);
        assert_eq!(file.line_of(11), 1);
        assert_eq!(file.line_of(1000), 3);

        assert_eq!(file.offset_of(1, 1), Some(0));
        assert_eq!(file.offset_of(2, 9), Some(19));
        assert_eq!(&file.text()[19..20], "[");
        assert_eq!(file.offset_of(3, 1), Some(27));
        assert_eq!(file.offset_of(9, 1), None);
    }

    #[test]
    fn test_offset_counts_characters() {
        let file = SourceFile::parse("a.ts", "const é = [1, 2];\n").unwrap();
        let offset = file.offset_of(1, 11).unwrap();
        assert_eq!(&file.text()[offset..offset + 1], "[");
    }

    #[test]
    fn test_replace_tree_reparses() {
        let mut file = SourceFile::parse("a.ts", "f(x);\n").unwrap();
        assert!(!file.replace_tree(file.tree().clone()).unwrap());
        assert!(!file.is_dirty());

        let call = build::call(build::identifier("g"), vec![build::identifier("y")]);
        let program = SyntaxNode::new(
            "program",
            vec![
                crate::syntax::Piece::Node { field: None, node: call },
                crate::syntax::Piece::Text(";\n".to_string()),
            ],
        );
        assert!(file.replace_tree(program).unwrap());
        assert!(file.is_dirty());
        assert_eq!(file.text(), "g(y);\n");
        assert!(file.tree().span().is_some());
    }

    #[test]
    fn test_persist_writes_only_dirty_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.ts");
        fs::write(&path, "vec3.len(v);\n").unwrap();

        let mut file = SourceFile::load(&path).unwrap();
        assert_eq!(file.base_name(), "a.ts");
        file.persist().unwrap();

        let program = SyntaxNode::new(
            "program",
            vec![crate::syntax::Piece::Text("vec3.length(v);\n".to_string())],
        );
        file.replace_tree(program).unwrap();
        file.persist().unwrap();
        assert!(!file.is_dirty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "vec3.length(v);\n");
    }

    #[test]
    fn test_load_missing_file() {
        let err = SourceFile::load("/nonexistent/nowhere.ts").unwrap_err();
        assert!(matches!(err, MigrateError::Load { .. }));
    }
}
