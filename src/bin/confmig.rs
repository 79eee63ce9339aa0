use anyhow::{Context as AnyhowContext, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use confmig::loader::{
    collect_config_files, load_document_bytes, load_settings_from_yaml, write_document,
};
use confmig::plugins::PluginRegistry;
use confmig::rules::SchemaVersion;
use confmig::settings::Settings;
use confmig::verify::Verifier;
use confmig::{MigrationResult, Migrator};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Rewrites outdated agent configuration files", long_about = None)]
struct Cli {
    /// Settings file (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Schema version to migrate towards, e.g. 1.20
    #[arg(long, global = true)]
    target_version: Option<String>,

    /// More log output, repeat for trace
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate a single configuration file
    Migrate {
        file: PathBuf,

        /// Write the result here instead of stdout
        #[arg(long, short, conflicts_with = "in_place")]
        output: Option<PathBuf>,

        /// Rewrite the input file
        #[arg(long)]
        in_place: bool,

        /// Only report what would change
        #[arg(long)]
        dry_run: bool,

        /// Print the migration report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Migrate every configuration file below a directory
    Batch {
        dir: PathBuf,

        /// Rewrite migrated files; without it nothing is written
        #[arg(long)]
        in_place: bool,

        /// Files migrated concurrently
        #[arg(long)]
        jobs: Option<usize>,
    },

    /// List the registered migrations
    Rules,

    /// Check that migrating a document loads into the expected plugins
    Verify {
        #[arg(required_unless_present = "cases")]
        input: Option<PathBuf>,

        #[arg(required_unless_present = "cases")]
        expected: Option<PathBuf>,

        /// Directory of `<case>/telegraf.conf` + `<case>/expected.conf`
        #[arg(long, conflicts_with_all = ["input", "expected"])]
        cases: Option<PathBuf>,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_migrator(settings: &Settings, target_override: Option<&str>) -> Result<Migrator> {
    let target = match target_override {
        Some(v) => v.parse::<SchemaVersion>().map_err(|e| anyhow!(e))?,
        None => settings.target_version().map_err(|e| anyhow!(e))?,
    };

    let registry = Arc::new(settings.build_registry());
    info!(rules = registry.len(), version = %target, "migrator ready");
    Ok(Migrator::new(registry).with_target_version(target))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = match &cli.config {
        Some(path) => load_settings_from_yaml(path)?,
        None => Settings::default(),
    };
    let migrator = build_migrator(&settings, cli.target_version.as_deref())?;

    match cli.command {
        Commands::Migrate {
            file,
            output,
            in_place,
            dry_run,
            json,
        } => {
            let input = load_document_bytes(&file)?;
            let result = migrator
                .migrate(&input)
                .with_context(|| format!("Failed to migrate {}", file.display()))?;
            info!(file = %file.display(), applied = result.applied, "migrated");

            if json {
                println!("{}", serde_json::to_string_pretty(&result.report)?);
            }
            if dry_run {
                return Ok(());
            }

            let backup = settings.backup_suffix.as_deref();
            match (output, in_place) {
                (_, true) if result.applied > 0 => write_document(&file, &result.output, backup)?,
                (_, true) => {}
                (Some(out), false) => write_document(&out, &result.output, None)?,
                (None, false) if !json => std::io::stdout().write_all(&result.output)?,
                (None, false) => {}
            }
        }

        Commands::Batch { dir, in_place, jobs } => {
            let files = collect_config_files(&dir, &settings.extensions)?;
            let jobs = jobs.unwrap_or(settings.jobs).max(1);
            info!(files = files.len(), jobs, "batch started");

            let failed = run_batch(
                migrator,
                files,
                jobs,
                in_place.then(|| settings.backup_suffix.clone()),
            )
            .await?;
            if failed > 0 {
                bail!("{} file(s) could not be migrated", failed);
            }
        }

        Commands::Rules => {
            for (key, rule) in migrator.registry().iter() {
                let since = rule
                    .since_version()
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "-".to_string());
                let active = rule.applies_to(migrator.target_version());
                println!(
                    "{:<32} {:<24} since {:<8}{}",
                    key.to_string(),
                    rule.name(),
                    since,
                    if active { "" } else { " (skipped for target)" }
                );
            }
        }

        Commands::Verify {
            input,
            expected,
            cases,
        } => {
            let plugins = PluginRegistry::with_builtin();
            let verifier = Verifier::new(&migrator, &plugins);

            if let Some(root) = cases {
                verify_cases(&verifier, &root)?;
            } else if let (Some(input), Some(expected)) = (input, expected) {
                let report = verifier.verify_case(
                    &load_document_bytes(&input)?,
                    &load_document_bytes(&expected)?,
                )?;
                println!(
                    "ok: {} migration(s) applied, {} plugin(s) match",
                    report.applied, report.plugins
                );
            }
        }
    }

    Ok(())
}

/// `backup`: `None` leaves files untouched, `Some(suffix)` rewrites them.
async fn run_batch(
    migrator: Migrator,
    files: Vec<PathBuf>,
    jobs: usize,
    backup: Option<Option<String>>,
) -> Result<usize> {
    let semaphore = Arc::new(Semaphore::new(jobs));
    let mut set = JoinSet::new();

    for path in files {
        let permit = semaphore.clone().acquire_owned().await?;
        let migrator = migrator.clone();
        let backup = backup.clone();
        set.spawn_blocking(move || {
            let _permit = permit;
            let outcome = migrate_file(&migrator, &path, backup);
            (path, outcome)
        });
    }

    let mut failed = 0;
    while let Some(joined) = set.join_next().await {
        let (path, outcome) = joined?;
        match outcome {
            Ok(result) if result.applied > 0 => {
                info!(file = %path.display(), applied = result.applied, "migrated")
            }
            Ok(_) => info!(file = %path.display(), "up to date"),
            Err(e) => {
                error!(file = %path.display(), "{:#}", e);
                failed += 1;
            }
        }
    }
    Ok(failed)
}

fn migrate_file(
    migrator: &Migrator,
    path: &Path,
    backup: Option<Option<String>>,
) -> Result<MigrationResult> {
    let input = load_document_bytes(path)?;
    let result = migrator
        .migrate(&input)
        .with_context(|| format!("Failed to migrate {}", path.display()))?;

    if let Some(suffix) = backup {
        if result.applied > 0 {
            write_document(path, &result.output, suffix.as_deref())?;
        }
    }
    Ok(result)
}

fn verify_cases(verifier: &Verifier<'_>, root: &Path) -> Result<()> {
    let results = verifier
        .verify_dir(root)
        .with_context(|| format!("Failed to read test cases from {}", root.display()))?;
    if results.is_empty() {
        warn!(dir = %root.display(), "no test cases found");
    }

    let mut failed = 0;
    for case in &results {
        match &case.outcome {
            Ok(report) => println!("ok    {} ({} applied)", case.name, report.applied),
            Err(e) => {
                println!("FAIL  {}: {}", case.name, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} test case(s) failed", failed, results.len());
    }
    Ok(())
}
