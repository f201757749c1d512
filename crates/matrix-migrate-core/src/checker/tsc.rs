/*!
# TypeScript compiler checker

Runs `tsc --noEmit` over the project and parses its plain (`--pretty false`)
output into diagnostics:

```text
src/scene.ts(12,17): error TS2322: Type 'number[]' is not assignable to type 'vec3'.
error TS5083: Cannot read file '/project/tsconfig.json'.
```

Continuation lines of a multi-line message are indented and get appended
to the diagnostic they follow.
*/

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info, warn};

use super::{Diagnostic, TypeChecker};
use crate::project::Project;
use crate::{MigrateConfig, MigrateError, Result};

fn located_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(.+?)\((\d+),(\d+)\): (?:error|warning|message) TS(\d+): (.*)$")
            .expect("valid diagnostic pattern")
    })
}

fn global_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:error|warning|message) TS(\d+): (.*)$").expect("valid diagnostic pattern")
    })
}

/// One parsed line of compiler output, before offsets are resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDiagnostic {
    pub code: u32,
    pub message: String,
    /// File plus one-based line and column
    pub location: Option<(PathBuf, usize, usize)>,
}

/// Parse `tsc --pretty false` output
pub fn parse_output(output: &str) -> Vec<RawDiagnostic> {
    let mut diagnostics: Vec<RawDiagnostic> = Vec::new();

    for line in output.lines() {
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(captures) = located_pattern().captures(trimmed) {
            let (Ok(line), Ok(column), Ok(code)) = (
                captures[2].parse::<usize>(),
                captures[3].parse::<usize>(),
                captures[4].parse::<u32>(),
            ) else {
                continue;
            };
            diagnostics.push(RawDiagnostic {
                code,
                message: captures[5].to_string(),
                location: Some((PathBuf::from(&captures[1]), line, column)),
            });
        } else if let Some(captures) = global_pattern().captures(trimmed) {
            let Ok(code) = captures[1].parse::<u32>() else {
                continue;
            };
            diagnostics.push(RawDiagnostic {
                code,
                message: captures[2].to_string(),
                location: None,
            });
        } else if line.starts_with(char::is_whitespace) {
            if let Some(last) = diagnostics.last_mut() {
                last.message.push('\n');
                last.message.push_str(trimmed.trim_start());
            }
        } else {
            debug!("Ignoring checker output: {trimmed}");
        }
    }

    diagnostics
}

/// Type-checker backed by the TypeScript compiler
pub struct TscChecker {
    command: Vec<String>,
    tsconfig: Option<PathBuf>,
}

impl TscChecker {
    pub fn new(command: Vec<String>, tsconfig: Option<PathBuf>) -> Self {
        Self { command, tsconfig }
    }

    pub fn from_config(config: &MigrateConfig) -> Self {
        Self::new(config.checker_command.clone(), config.tsconfig.clone())
    }

    fn command(&self, root: &Path) -> Result<Command> {
        let Some((program, leading)) = self.command.split_first() else {
            return Err(MigrateError::CheckerUnavailable(
                "no checker command configured".to_string(),
            ));
        };
        let mut command = Command::new(program);
        command.args(leading).current_dir(root);
        Ok(command)
    }

    fn run(&self, mut command: Command) -> Result<Output> {
        command.output().map_err(|e| {
            let command = self.command.join(" ");
            MigrateError::CheckerUnavailable(format!("failed to run {command}: {e}"))
        })
    }

    fn resolve(project: &Project, raw: RawDiagnostic) -> Diagnostic {
        let mut diagnostic = Diagnostic::new(raw.code, raw.message);
        if let Some((path, line, column)) = raw.location {
            diagnostic.start = project
                .file(&path)
                .and_then(|file| file.offset_of(line, column));
            diagnostic.file = Some(path);
        }
        diagnostic
    }
}

impl TypeChecker for TscChecker {
    fn ensure_available(&mut self, project: &Project) -> Result<()> {
        let mut command = self.command(project.root())?;
        command.arg("--version");
        let output = self.run(command)?;
        if !output.status.success() {
            return Err(MigrateError::CheckerUnavailable(format!(
                "{} --version exited with {}",
                self.command.join(" "),
                output.status
            )));
        }
        info!(
            "Using type-checker {}",
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(())
    }

    fn check(&mut self, project: &Project) -> Result<Vec<Diagnostic>> {
        let mut command = self.command(project.root())?;
        command.args(["--noEmit", "--pretty", "false"]);
        if let Some(tsconfig) = &self.tsconfig {
            command.arg("-p").arg(tsconfig);
        }

        let output = self.run(command)?;
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        let raw = parse_output(&text);

        // tsc exits 1 or 2 when it reports errors
        let status = output.status.code();
        if raw.is_empty() && !matches!(status, Some(0..=2)) {
            return Err(MigrateError::CheckerUnavailable(format!(
                "type-checker exited with {} and reported nothing",
                output.status
            )));
        }

        let diagnostics: Vec<Diagnostic> = raw
            .into_iter()
            .map(|raw| Self::resolve(project, raw))
            .collect();
        for diagnostic in &diagnostics {
            if diagnostic.file.is_some() && diagnostic.start.is_none() {
                warn!("Could not locate diagnostic {diagnostic}");
            }
        }
        debug!("Type-checker reported {} diagnostics", diagnostics.len());
        Ok(diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::SourceFile;
    use pretty_assertions::assert_eq;

    const OUTPUT: &str = "\
src/scene.ts(2,11): error TS2322: Type 'number[]' is not assignable to type 'vec3'.
  Type 'number[]' is missing the following properties from type \
'Float32ArrayOfLength<3>': BYTES_PER_ELEMENT, buffer
error TS5083: Cannot read file 'tsconfig.base.json'.
Found 2 errors in the same file, starting at: src/scene.ts:2
";

    #[test]
    fn test_parse_output() {
        let raw = parse_output(OUTPUT);
        assert_eq!(raw.len(), 2);

        assert_eq!(raw[0].code, 2322);
        assert_eq!(raw[0].location, Some((PathBuf::from("src/scene.ts"), 2, 11)));
        assert_eq!(
            raw[0].message,
            "Type 'number[]' is not assignable to type 'vec3'.\n\
             Type 'number[]' is missing the following properties from type \
             'Float32ArrayOfLength<3>': BYTES_PER_ELEMENT, buffer"
        );

        assert_eq!(raw[1].code, 5083);
        assert_eq!(raw[1].location, None);
    }

    #[test]
    fn test_parse_paths_with_parentheses() {
        let raw = parse_output("src/a (copy).ts(1,1): error TS2345: Argument.\n");
        assert_eq!(raw[0].location, Some((PathBuf::from("src/a (copy).ts"), 1, 1)));
    }

    #[test]
    fn test_resolve_offsets() {
        let source = "let a = 1;\nlet b: vec3 = [1, 2, 3];\n";
        let file = SourceFile::parse("/p/src/scene.ts", source).unwrap();
        let project = Project::from_files("/p", vec![file]);

        let raw = parse_output(
            "src/scene.ts(2,15): error TS2322: Type 'number[]' is not assignable to type 'vec3'.",
        );
        let diagnostic = TscChecker::resolve(&project, raw[0].clone());
        assert_eq!(diagnostic.start, Some(25));
        assert_eq!(&project.files()[0].text()[25..26], "[");

        let raw = parse_output("src/other.ts(1,1): error TS2322: Type.");
        let diagnostic = TscChecker::resolve(&project, raw[0].clone());
        assert_eq!(diagnostic.file, Some(PathBuf::from("src/other.ts")));
        assert_eq!(diagnostic.start, None);
    }

    #[test]
    fn test_missing_program_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::from_files(dir.path(), Vec::new());
        let mut checker = TscChecker::new(vec!["matrix-migrate-no-such-tsc".to_string()], None);
        assert!(matches!(
            checker.ensure_available(&project),
            Err(MigrateError::CheckerUnavailable(_))
        ));

        let mut checker = TscChecker::new(Vec::new(), None);
        assert!(matches!(
            checker.check(&project),
            Err(MigrateError::CheckerUnavailable(_))
        ));
    }
}
