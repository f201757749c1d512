// Source code generation from the syntax tree.
// Parsed nodes carry their original text, so rendering is a concatenation
// of pieces; synthesized nodes render from the text their builders chose.

use super::{Piece, SyntaxNode};

/// Trait for types that can generate their source code representation
pub trait ToSource {
    fn to_source(&self) -> String;

    /// Append the source representation to `out`
    fn write_source(&self, out: &mut String) {
        out.push_str(&self.to_source());
    }
}

impl ToSource for SyntaxNode {
    fn to_source(&self) -> String {
        let mut out = String::new();
        self.write_source(&mut out);
        out
    }

    fn write_source(&self, out: &mut String) {
        for piece in self.pieces() {
            piece.write_source(out);
        }
    }
}

impl ToSource for Piece {
    fn to_source(&self) -> String {
        let mut out = String::new();
        self.write_source(&mut out);
        out
    }

    fn write_source(&self, out: &mut String) {
        match self {
            Piece::Text(text) => out.push_str(text),
            Piece::Node { node, .. } => node.write_source(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::build;

    #[test]
    fn test_piece_to_source() {
        let piece = Piece::Node {
            field: None,
            node: build::member(build::identifier("quat"), "mul"),
        };
        assert_eq!(piece.to_source(), "quat.mul");
        assert_eq!(Piece::Text(", ".to_string()).to_source(), ", ");
    }
}
