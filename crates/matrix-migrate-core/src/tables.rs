/*!
# Rule Tables

Declarative data driving the rewrite: per-namespace function renames and
output-argument reorder sets, deprecated alias types, the import rewrite, the
scratch allocators, and the repair pass's diagnostic filter.
*/

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;

/// The fixed set of math-type namespaces used as call-site prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Vec2,
    Vec3,
    Vec4,
    Quat,
    Mat4,
}

impl Namespace {
    pub const ALL: [Namespace; 5] = [
        Namespace::Vec2,
        Namespace::Vec3,
        Namespace::Vec4,
        Namespace::Quat,
        Namespace::Mat4,
    ];

    pub fn from_ident(ident: &str) -> Option<Self> {
        match ident {
            "vec2" => Some(Namespace::Vec2),
            "vec3" => Some(Namespace::Vec3),
            "vec4" => Some(Namespace::Vec4),
            "quat" => Some(Namespace::Quat),
            "mat4" => Some(Namespace::Mat4),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Vec2 => "vec2",
            Namespace::Vec3 => "vec3",
            Namespace::Vec4 => "vec4",
            Namespace::Quat => "quat",
            Namespace::Mat4 => "mat4",
        }
    }

    /// Vector namespace whose values have `arity` elements
    pub fn vector_of_arity(arity: usize) -> Option<Self> {
        match arity {
            2 => Some(Namespace::Vec2),
            3 => Some(Namespace::Vec3),
            4 => Some(Namespace::Vec4),
            _ => None,
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rename map and reorder set for one namespace
#[derive(Debug, Clone, Default)]
pub struct NamespaceRules {
    renames: HashMap<String, String>,
    reorder: HashSet<String>,
}

impl NamespaceRules {
    pub fn new<'a>(
        renames: impl IntoIterator<Item = (&'a str, &'a str)>,
        reorder: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            renames: renames
                .into_iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            reorder: reorder.into_iter().map(str::to_string).collect(),
        }
    }

    /// New name for `function`, if it was renamed
    pub fn rename(&self, function: &str) -> Option<&str> {
        self.renames.get(function).map(String::as_str)
    }

    /// Whether `function` (the name as written before renaming) moves its
    /// output argument from first to last
    pub fn reorders(&self, function: &str) -> bool {
        self.reorder.contains(function)
    }
}

/// Per-namespace call rewrite rules
#[derive(Debug, Clone, Default)]
pub struct RewriteRuleSet {
    namespaces: HashMap<Namespace, NamespaceRules>,
}

impl RewriteRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, namespace: Namespace, rules: NamespaceRules) -> Self {
        self.namespaces.insert(namespace, rules);
        self
    }

    pub fn get(&self, namespace: Namespace) -> Option<&NamespaceRules> {
        self.namespaces.get(&namespace)
    }

    /// The gl-matrix to sprig-matrix rules
    pub fn sprig() -> Self {
        // Reorder sets list names as written at old call sites, so the
        // pre-rename spellings of renamed functions appear next to their
        // new names.
        const VEC_RENAMES: [(&str, &str); 3] =
            [("subtract", "sub"), ("multiply", "mul"), ("len", "length")];
        const VEC2_REORDER: &[&str] = &[
            "set", "add", "sub", "subtract", "scale", "cross", "negate", "mul", "multiply", "div",
            "rotate", "normalize",
        ];
        const VEC34_REORDER: &[&str] = &[
            "set",
            "add",
            "sub",
            "subtract",
            "scale",
            "cross",
            "transformMat4",
            "transformQuat",
            "negate",
            "lerp",
            "mul",
            "multiply",
            "div",
            "normalize",
        ];
        const QUAT_REORDER: &[&str] = &[
            "add",
            "mul",
            "multiply",
            "rotateX",
            "rotateY",
            "rotateZ",
            "slerp",
            "conjugate",
            "normalize",
            "invert",
            "setAxisAngle",
            "getAxisAngle",
            "fromEuler",
        ];
        const MAT4_REORDER: &[&str] = &[
            "set",
            "add",
            "mul",
            "multiply",
            "ortho",
            "perspective",
            "lookAt",
            "rotateX",
            "rotateY",
            "rotateZ",
            "translate",
            "getScaling",
            "getRotation",
            "getTranslation",
            "fromRotationTranslation",
            "fromRotationTranslationScale",
            "fromRotationTranslationScaleOrigin",
            "fromQuat",
            "fromXRotation",
            "fromYRotation",
            "fromZRotation",
            "fromScaling",
            "invert",
        ];

        Self::new()
            .with_namespace(
                Namespace::Vec2,
                NamespaceRules::new(VEC_RENAMES, VEC2_REORDER.iter().copied()),
            )
            .with_namespace(
                Namespace::Vec3,
                NamespaceRules::new(VEC_RENAMES, VEC34_REORDER.iter().copied()),
            )
            .with_namespace(
                Namespace::Vec4,
                NamespaceRules::new(VEC_RENAMES, VEC34_REORDER.iter().copied()),
            )
            .with_namespace(
                Namespace::Quat,
                NamespaceRules::new([("multiply", "mul")], QUAT_REORDER.iter().copied()),
            )
            .with_namespace(
                Namespace::Mat4,
                NamespaceRules::new([("multiply", "mul")], MAT4_REORDER.iter().copied()),
            )
    }
}

/// Deprecated alias type names and the namespace type replacing each
#[derive(Debug, Clone, Default)]
pub struct IdentifierRenameMap {
    aliases: HashMap<String, Namespace>,
}

impl IdentifierRenameMap {
    pub fn new<'a>(aliases: impl IntoIterator<Item = (&'a str, Namespace)>) -> Self {
        Self {
            aliases: aliases
                .into_iter()
                .map(|(alias, namespace)| (alias.to_string(), namespace))
                .collect(),
        }
    }

    /// Readonly gl-matrix aliases and the sprig type of the same arity.
    ///
    /// `ReadonlyVec4` maps to `vec4`. Earlier hand-written migrations sent it
    /// to `vec3`, which drops a component.
    pub fn sprig() -> Self {
        Self::new([
            ("ReadonlyVec2", Namespace::Vec2),
            ("ReadonlyVec3", Namespace::Vec3),
            ("ReadonlyVec4", Namespace::Vec4),
            ("ReadonlyQuat", Namespace::Quat),
            ("ReadonlyMat4", Namespace::Mat4),
        ])
    }

    pub fn get(&self, ident: &str) -> Option<Namespace> {
        self.aliases.get(ident).copied()
    }
}

/// Module path rewrite plus the symbols imported explicitly in its place
#[derive(Debug, Clone)]
pub struct ImportRewriteSpec {
    pub old_module: String,
    pub new_module: String,
    pub symbols: Vec<String>,
}

impl ImportRewriteSpec {
    /// Rewritten module path when `path` names the old module
    pub fn rewrite_path(&self, path: &str) -> Option<String> {
        path.strip_suffix(self.old_module.as_str())
            .map(|prefix| format!("{prefix}{}", self.new_module))
    }
}

impl Default for ImportRewriteSpec {
    fn default() -> Self {
        Self {
            old_module: "gl-matrix.js".to_string(),
            new_module: "sprig-matrix.js".to_string(),
            symbols: Namespace::ALL.iter().map(|ns| ns.as_str().to_string()).collect(),
        }
    }
}

/// Diagnostic codes the repair pass reacts to: not assignable, argument not
/// assignable, missing properties, and conversion may be a mistake.
pub const REPAIR_CODES: [u32; 4] = [2322, 2345, 2740, 2352];

/// Message fragments that mark a diagnostic as a literal-vector mismatch
pub const REPAIR_MESSAGE_MARKERS: [&str; 3] = ["number", "Float32ArrayOfLength", "vec"];

/// Constructor the repair pass wraps array literals in
pub const CLONE_FUNCTION: &str = "clone";

/// All tables consulted by the rewrite and repair passes
#[derive(Debug, Clone)]
pub struct RuleTables {
    pub calls: RewriteRuleSet,
    pub identifiers: IdentifierRenameMap,
    pub import: ImportRewriteSpec,
    /// Zero-argument calls that only allocate an output buffer
    pub scratch_allocators: Vec<String>,
}

impl RuleTables {
    pub fn is_scratch_allocator(&self, name: &str) -> bool {
        self.scratch_allocators.iter().any(|alloc| alloc == name)
    }
}

impl Default for RuleTables {
    fn default() -> Self {
        Self {
            calls: RewriteRuleSet::sprig(),
            identifiers: IdentifierRenameMap::sprig(),
            import: ImportRewriteSpec::default(),
            scratch_allocators: ["tempVec2", "tempVec3", "tempMat4", "tempQuat"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_round_trip() {
        for ns in Namespace::ALL {
            assert_eq!(Namespace::from_ident(ns.as_str()), Some(ns));
        }
        assert_eq!(Namespace::from_ident("mat3"), None);
        assert_eq!(Namespace::from_ident("Vec3"), None);
    }

    #[test]
    fn test_vector_of_arity() {
        assert_eq!(Namespace::vector_of_arity(2), Some(Namespace::Vec2));
        assert_eq!(Namespace::vector_of_arity(4), Some(Namespace::Vec4));
        assert_eq!(Namespace::vector_of_arity(1), None);
        assert_eq!(Namespace::vector_of_arity(16), None);
    }

    #[test]
    fn test_sprig_rules() {
        let rules = RewriteRuleSet::sprig();
        let mat4 = rules.get(Namespace::Mat4).unwrap();
        assert_eq!(mat4.rename("multiply"), Some("mul"));
        assert_eq!(mat4.rename("mul"), None);
        assert!(mat4.reorders("multiply"));
        assert!(mat4.reorders("lookAt"));
        assert!(!mat4.reorders("clone"));

        let vec3 = rules.get(Namespace::Vec3).unwrap();
        assert_eq!(vec3.rename("len"), Some("length"));
        assert!(!vec3.reorders("len"));
        assert!(vec3.reorders("transformQuat"));

        let vec2 = rules.get(Namespace::Vec2).unwrap();
        assert!(!vec2.reorders("transformMat4"));
    }

    #[test]
    fn test_empty_rule_set_has_no_namespaces() {
        assert!(RewriteRuleSet::new().get(Namespace::Quat).is_none());
    }

    #[test]
    fn test_identifier_aliases() {
        let aliases = IdentifierRenameMap::sprig();
        assert_eq!(aliases.get("ReadonlyVec3"), Some(Namespace::Vec3));
        assert_eq!(aliases.get("ReadonlyVec4"), Some(Namespace::Vec4));
        assert_eq!(aliases.get("vec3"), None);
    }

    #[test]
    fn test_import_rewrite_path() {
        let import = ImportRewriteSpec::default();
        assert_eq!(
            import.rewrite_path("../utils/gl-matrix.js"),
            Some("../utils/sprig-matrix.js".to_string())
        );
        assert_eq!(import.rewrite_path("gl-matrix"), None);
        assert_eq!(import.symbols, vec!["vec2", "vec3", "vec4", "quat", "mat4"]);
    }

    #[test]
    fn test_scratch_allocators() {
        let tables = RuleTables::default();
        assert!(tables.is_scratch_allocator("tempMat4"));
        assert!(!tables.is_scratch_allocator("tempVec4"));
    }
}
