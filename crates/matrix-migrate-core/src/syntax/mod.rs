//! Lossless TypeScript syntax tree.
//!
//! A [`SyntaxNode`] owns its children and keeps every byte of source text
//! that is not a named child (anonymous tokens, whitespace) as a text piece,
//! so rendering an untouched tree reproduces the file exactly. Rewrites build
//! new nodes instead of mutating the parsed ones.

pub mod parser;
pub mod source_gen;

pub use parser::{Dialect, TypeScriptParser, MAX_NESTING};
pub use source_gen::ToSource;

/// Node kinds from the tree-sitter TypeScript grammar that the rewrite rules
/// care about.
pub mod kinds {
    pub const PROGRAM: &str = "program";
    pub const CALL_EXPRESSION: &str = "call_expression";
    pub const MEMBER_EXPRESSION: &str = "member_expression";
    pub const ARGUMENTS: &str = "arguments";
    pub const ARRAY: &str = "array";
    pub const IDENTIFIER: &str = "identifier";
    pub const TYPE_IDENTIFIER: &str = "type_identifier";
    pub const PROPERTY_IDENTIFIER: &str = "property_identifier";
    pub const IMPORT_STATEMENT: &str = "import_statement";
    pub const IMPORT_CLAUSE: &str = "import_clause";
    pub const NAMED_IMPORTS: &str = "named_imports";
    pub const IMPORT_SPECIFIER: &str = "import_specifier";
    pub const STRING: &str = "string";
    pub const COMMENT: &str = "comment";
}

/// Location of a parsed node in the text it was parsed from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    /// Zero-based line of `start`
    pub line: usize,
}

/// One element of a node's content, in source order
#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    /// Verbatim text: anonymous tokens, whitespace, punctuation
    Text(String),
    /// A named child, tagged with the grammar field it occupies
    Node {
        field: Option<&'static str>,
        node: SyntaxNode,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxNode {
    kind: &'static str,
    span: Option<Span>,
    pieces: Vec<Piece>,
}

impl SyntaxNode {
    /// Create a synthesized node with no source span
    pub fn new(kind: &'static str, pieces: Vec<Piece>) -> Self {
        Self {
            kind,
            span: None,
            pieces,
        }
    }

    pub(crate) fn parsed(kind: &'static str, span: Span, pieces: Vec<Piece>) -> Self {
        Self {
            kind,
            span: Some(span),
            pieces,
        }
    }

    /// Create a synthesized leaf holding `text`
    pub fn leaf(kind: &'static str, text: impl Into<String>) -> Self {
        Self::new(kind, vec![Piece::Text(text.into())])
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn span(&self) -> Option<Span> {
        self.span
    }

    /// Zero-based start line, if the node came from the parser
    pub fn line(&self) -> Option<usize> {
        self.span.map(|span| span.line)
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn into_pieces(self) -> Vec<Piece> {
        self.pieces
    }

    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }

    /// Rendered source text of this node
    pub fn text(&self) -> String {
        self.to_source()
    }

    /// Named children in source order, comments included
    pub fn children(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.pieces.iter().filter_map(|piece| match piece {
            Piece::Node { node, .. } => Some(node),
            Piece::Text(_) => None,
        })
    }

    /// Named children in source order, comments excluded
    pub fn named_children(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.children().filter(|child| !child.is(kinds::COMMENT))
    }

    pub fn named_child_count(&self) -> usize {
        self.named_children().count()
    }

    pub fn child_by_field(&self, name: &str) -> Option<&SyntaxNode> {
        self.pieces.iter().find_map(|piece| match piece {
            Piece::Node {
                field: Some(field),
                node,
            } if *field == name => Some(node),
            _ => None,
        })
    }

    /// Replace the child occupying `field`; the node is returned unchanged
    /// when no child has that field
    pub fn replace_field(mut self, name: &str, replacement: SyntaxNode) -> Self {
        for piece in &mut self.pieces {
            if let Piece::Node {
                field: Some(field),
                node,
            } = piece
            {
                if *field == name {
                    *node = replacement;
                    return self;
                }
            }
        }
        self
    }

    /// Rebuild this node with every named child passed through `f`.
    ///
    /// Text pieces, field tags and the span are preserved.
    pub fn try_map_children<E, F>(self, mut f: F) -> Result<Self, E>
    where
        F: FnMut(SyntaxNode) -> Result<SyntaxNode, E>,
    {
        let mut pieces = Vec::with_capacity(self.pieces.len());
        for piece in self.pieces {
            pieces.push(match piece {
                Piece::Node { field, node } => Piece::Node {
                    field,
                    node: f(node)?,
                },
                text => text,
            });
        }
        Ok(Self {
            kind: self.kind,
            span: self.span,
            pieces,
        })
    }

    /// Find every node, in pre-order, for which `predicate` holds
    pub fn find_all<'a, P>(&'a self, predicate: &P) -> Vec<&'a SyntaxNode>
    where
        P: Fn(&SyntaxNode) -> bool,
    {
        let mut found = Vec::new();
        self.find_all_recursive(predicate, &mut found);
        found
    }

    fn find_all_recursive<'a, P>(&'a self, predicate: &P, found: &mut Vec<&'a SyntaxNode>)
    where
        P: Fn(&SyntaxNode) -> bool,
    {
        if predicate(self) {
            found.push(self);
        }
        for child in self.children() {
            child.find_all_recursive(predicate, found);
        }
    }
}

/// Builders for the synthesized nodes the rewrite rules emit
pub mod build {
    use super::{kinds, Piece, SyntaxNode};

    fn child(field: Option<&'static str>, node: SyntaxNode) -> Piece {
        Piece::Node { field, node }
    }

    pub fn identifier(name: &str) -> SyntaxNode {
        SyntaxNode::leaf(kinds::IDENTIFIER, name)
    }

    pub fn property_identifier(name: &str) -> SyntaxNode {
        SyntaxNode::leaf(kinds::PROPERTY_IDENTIFIER, name)
    }

    /// `object.property`
    pub fn member(object: SyntaxNode, property: &str) -> SyntaxNode {
        SyntaxNode::new(
            kinds::MEMBER_EXPRESSION,
            vec![
                child(Some("object"), object),
                Piece::Text(".".to_string()),
                child(Some("property"), property_identifier(property)),
            ],
        )
    }

    /// Argument list with explicit delimiters.
    ///
    /// `separators` must hold one entry fewer than `args`; missing entries
    /// fall back to `", "`.
    pub fn arguments(
        open: &str,
        args: Vec<SyntaxNode>,
        separators: Vec<String>,
        close: &str,
    ) -> SyntaxNode {
        let mut pieces = vec![Piece::Text(open.to_string())];
        let mut separators = separators.into_iter();
        for (index, arg) in args.into_iter().enumerate() {
            if index > 0 {
                let separator = separators.next().unwrap_or_else(|| ", ".to_string());
                pieces.push(Piece::Text(separator));
            }
            pieces.push(child(None, arg));
        }
        pieces.push(Piece::Text(close.to_string()));
        SyntaxNode::new(kinds::ARGUMENTS, pieces)
    }

    /// `callee(arg, ...)`
    pub fn call(callee: SyntaxNode, args: Vec<SyntaxNode>) -> SyntaxNode {
        SyntaxNode::new(
            kinds::CALL_EXPRESSION,
            vec![
                child(Some("function"), callee),
                child(Some("arguments"), arguments("(", args, Vec::new(), ")")),
            ],
        )
    }

    /// A string literal using `quote` as its delimiter
    pub fn string(quote: char, value: &str) -> SyntaxNode {
        SyntaxNode::leaf(kinds::STRING, format!("{quote}{value}{quote}"))
    }

    /// `import { a, b } from "<module>"`
    pub fn named_import(symbols: &[String], source: SyntaxNode, semicolon: bool) -> SyntaxNode {
        let mut specifiers = vec![Piece::Text("{ ".to_string())];
        for (index, symbol) in symbols.iter().enumerate() {
            if index > 0 {
                specifiers.push(Piece::Text(", ".to_string()));
            }
            let specifier = SyntaxNode::new(
                kinds::IMPORT_SPECIFIER,
                vec![child(Some("name"), identifier(symbol))],
            );
            specifiers.push(child(None, specifier));
        }
        specifiers.push(Piece::Text(" }".to_string()));

        let clause = SyntaxNode::new(
            kinds::IMPORT_CLAUSE,
            vec![child(None, SyntaxNode::new(kinds::NAMED_IMPORTS, specifiers))],
        );

        let mut pieces = vec![
            Piece::Text("import ".to_string()),
            child(None, clause),
            Piece::Text(" from ".to_string()),
            child(Some("source"), source),
        ];
        if semicolon {
            pieces.push(Piece::Text(";".to_string()));
        }
        SyntaxNode::new(kinds::IMPORT_STATEMENT, pieces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_call_renders() {
        let call = build::call(
            build::member(build::identifier("vec3"), "clone"),
            vec![SyntaxNode::leaf(kinds::ARRAY, "[1, 2, 3]")],
        );
        assert_eq!(call.to_source(), "vec3.clone([1, 2, 3])");
        assert_eq!(
            call.child_by_field("function").map(|f| f.text()),
            Some("vec3.clone".to_string())
        );
    }

    #[test]
    fn test_arguments_fall_back_to_comma_separator() {
        let args = build::arguments(
            "(",
            vec![build::identifier("a"), build::identifier("b"), build::identifier("c")],
            vec![",\n  ".to_string()],
            ")",
        );
        assert_eq!(args.to_source(), "(a,\n  b, c)");
        assert_eq!(args.named_child_count(), 3);
    }

    #[test]
    fn test_replace_field_missing_is_noop() {
        let node = build::member(build::identifier("mat4"), "mul");
        let same = node.clone().replace_field("arguments", build::identifier("x"));
        assert_eq!(node, same);
    }

    #[test]
    fn test_named_import_renders() {
        let symbols = vec!["vec2".to_string(), "vec3".to_string()];
        let import = build::named_import(&symbols, build::string('\'', "./m.js"), true);
        assert_eq!(import.to_source(), "import { vec2, vec3 } from './m.js';");
    }
}
