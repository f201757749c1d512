/*!
# Matrix Migration Rules

Transformation rules for moving call sites from gl-matrix to sprig-matrix.
*/

pub mod array_clone;
pub mod call_rewrite;
pub mod identifier_rename;
pub mod import_rewrite;

// Re-export commonly used rules
pub use array_clone::ArrayCloneWrapper;
pub use call_rewrite::MatrixCallRewriter;
pub use identifier_rename::AliasTypeRenamer;
pub use import_rewrite::ImportRewriter;
