use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, Command};
use matrix_migrate_core::{init_tracing, MigrateConfig, Migration, MigrationReport, TscChecker};
use tracing::info;

fn main() -> Result<()> {
    let matches = Command::new("matrix-migrate")
        .version(matrix_migrate_core::VERSION)
        .about("Migrate gl-matrix call sites to the sprig-matrix API")
        .arg(
            Arg::new("root")
                .value_name("ROOT")
                .help("Project root containing the TypeScript sources")
                .default_value(".")
                .index(1),
        )
        .arg(
            Arg::new("tsconfig")
                .long("tsconfig")
                .value_name("PATH")
                .help("tsconfig passed to the type-checker, relative to ROOT")
                .default_value("tsconfig.json"),
        )
        .arg(
            Arg::new("skip")
                .long("skip")
                .value_name("NAME")
                .help("Additional file name to leave untouched (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("checker")
                .long("checker")
                .value_name("CMD")
                .help("Command used to run the TypeScript compiler")
                .default_value("npx tsc"),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Rewrite in memory and report, without writing files or type-checking")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("report")
                .long("report")
                .value_name("PATH")
                .help("Write a JSON report of the run"),
        )
        .arg(
            Arg::new("fail-on-residual")
                .long("fail-on-residual")
                .help("Exit with an error if diagnostics remain after repair")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    init_tracing(matches.get_flag("debug"));

    let mut config = MigrateConfig::new(
        matches
            .get_one::<String>("root")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    );
    config.tsconfig = matches.get_one::<String>("tsconfig").map(PathBuf::from);
    if let Some(skip) = matches.get_many::<String>("skip") {
        config.skip_files.extend(skip.cloned());
    }
    if let Some(checker) = matches.get_one::<String>("checker") {
        config.checker_command = checker.split_whitespace().map(str::to_string).collect();
    }

    let root = config.root.display().to_string();
    let checker = TscChecker::from_config(&config);
    let report = if matches.get_flag("dry-run") {
        // A dry run never type-checks, so the checker need not be installed
        Migration::load_unverified(config, checker)
            .with_context(|| format!("Failed to load {root}"))?
            .dry_run()
            .context("Dry run failed")?
    } else {
        Migration::load(config, checker)
            .with_context(|| format!("Failed to start migration of {root}"))?
            .run()
            .context("Migration failed")?
    };
    print_summary(&report);

    if let Some(path) = matches.get_one::<String>("report") {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(path, json).with_context(|| format!("Failed to write report to {path}"))?;
        info!("Wrote report to {path}");
    }

    if matches.get_flag("fail-on-residual") && report.residual() > 0 {
        bail!("{} diagnostics remain after repair", report.residual());
    }
    Ok(())
}

fn print_summary(report: &MigrationReport) {
    println!(
        "{} files loaded, {} rewritten, {} skipped, {} transforms",
        report.files_loaded,
        report.files_rewritten,
        report.files_skipped,
        report.events.len()
    );
    if report.dry_run {
        println!("Dry run: no files written");
        return;
    }
    if let Some(count) = report.diagnostics_after_rewrite {
        println!("{count} errors after refactor");
    }
    if let Some(repair) = &report.repair {
        println!(
            "{} literals wrapped in {} files ({} candidates)",
            repair.wrapped, repair.files_touched, repair.candidates
        );
    }
    if let Some(count) = report.diagnostics_after_repair {
        println!("{count} errors after autofix");
    }
}
