use std::path::Path;

use super::{kinds, Piece, Span, SyntaxNode};

/// Which tree-sitter grammar a file is parsed with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    TypeScript,
    Tsx,
}

impl Dialect {
    /// Grammar for a path, or `None` when the extension is not TypeScript
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_string_lossy().to_lowercase();
        match extension.as_str() {
            "ts" | "mts" | "cts" => Some(Dialect::TypeScript),
            "tsx" => Some(Dialect::Tsx),
            _ => None,
        }
    }

    fn language(self) -> tree_sitter::Language {
        match self {
            Dialect::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Dialect::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// Deepest node nesting converted into a [`SyntaxNode`] tree.
///
/// Sources nested deeper than this are kept as a single text piece so that
/// no later walk over the tree can exhaust the stack.
pub const MAX_NESTING: usize = 2048;

/// TypeScript parser using tree-sitter-typescript
pub struct TypeScriptParser {
    parser: tree_sitter::Parser,
    max_nesting: usize,
    last_had_errors: bool,
    last_too_deep: bool,
}

impl TypeScriptParser {
    pub fn new(dialect: Dialect) -> Result<Self, String> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&dialect.language())
            .map_err(|e| format!("Failed to set TypeScript language: {e}"))?;

        Ok(Self {
            parser,
            max_nesting: MAX_NESTING,
            last_had_errors: false,
            last_too_deep: false,
        })
    }

    pub fn with_max_nesting(mut self, max_nesting: usize) -> Self {
        self.max_nesting = max_nesting;
        self
    }

    /// Parse `source` into a lossless [`SyntaxNode`] tree rooted at a
    /// `program` node spanning the whole text.
    pub fn parse(&mut self, source: &str) -> Result<SyntaxNode, String> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| "parser produced no tree".to_string())?;
        let root = tree.root_node();
        self.last_had_errors = root.has_error();

        let span = Span {
            start: 0,
            end: source.len(),
            line: 0,
        };
        let Some(converted) = convert_tree(root, source, self.max_nesting) else {
            self.last_too_deep = true;
            return Ok(SyntaxNode::parsed(
                kinds::PROGRAM,
                span,
                vec![Piece::Text(source.to_string())],
            ));
        };
        self.last_too_deep = false;

        // The root node excludes leading and trailing trivia; keep it.
        let mut pieces = Vec::new();
        push_text(&mut pieces, source, 0, root.start_byte());
        for piece in converted.into_pieces() {
            match piece {
                Piece::Text(text) => push_text(&mut pieces, &text, 0, text.len()),
                node => pieces.push(node),
            }
        }
        push_text(&mut pieces, source, root.end_byte(), source.len());

        Ok(SyntaxNode::parsed(kinds::PROGRAM, span, pieces))
    }

    /// Whether the most recent parse needed error recovery
    pub fn last_had_errors(&self) -> bool {
        self.last_had_errors
    }

    /// Whether the most recent source nested too deeply to convert; its tree
    /// is then one opaque text piece
    pub fn last_too_deep(&self) -> bool {
        self.last_too_deep
    }
}

fn push_text(pieces: &mut Vec<Piece>, source: &str, start: usize, end: usize) {
    if start >= end {
        return;
    }
    if let Some(text) = source.get(start..end) {
        match pieces.last_mut() {
            Some(Piece::Text(previous)) => previous.push_str(text),
            _ => pieces.push(Piece::Text(text.to_string())),
        }
    }
}

/// A named node whose children are still being converted
struct Frame<'t> {
    node: tree_sitter::Node<'t>,
    field: Option<&'static str>,
    pieces: Vec<Piece>,
    position: usize,
    children: std::vec::IntoIter<(tree_sitter::Node<'t>, Option<&'static str>)>,
}

impl<'t> Frame<'t> {
    fn open(node: tree_sitter::Node<'t>, field: Option<&'static str>) -> Self {
        let mut named = Vec::new();
        let mut cursor = node.walk();
        if cursor.goto_first_child() {
            loop {
                let child = cursor.node();
                if child.is_named() {
                    named.push((child, cursor.field_name()));
                }
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
        }

        Self {
            node,
            field,
            pieces: Vec::new(),
            position: node.start_byte(),
            children: named.into_iter(),
        }
    }

    fn close(mut self, source: &str) -> (Option<&'static str>, SyntaxNode) {
        push_text(&mut self.pieces, source, self.position, self.node.end_byte());
        let node = SyntaxNode::parsed(
            self.node.kind(),
            Span {
                start: self.node.start_byte(),
                end: self.node.end_byte(),
                line: self.node.start_position().row,
            },
            self.pieces,
        );
        (self.field, node)
    }
}

/// Convert a tree-sitter tree without recursion; `None` when it nests
/// deeper than `max_nesting`
fn convert_tree(root: tree_sitter::Node, source: &str, max_nesting: usize) -> Option<SyntaxNode> {
    let mut stack = vec![Frame::open(root, None)];
    let mut converted = None;

    while let Some(frame) = stack.last_mut() {
        if let Some((child, field)) = frame.children.next() {
            push_text(&mut frame.pieces, source, frame.position, child.start_byte());
            if stack.len() >= max_nesting {
                return None;
            }
            stack.push(Frame::open(child, field));
            continue;
        }

        let Some(done) = stack.pop() else {
            break;
        };
        let end = done.node.end_byte();
        let (field, node) = done.close(source);
        match stack.last_mut() {
            Some(parent) => {
                parent.pieces.push(Piece::Node { field, node });
                parent.position = parent.position.max(end);
            }
            None => converted = Some(node),
        }
    }

    converted
}
