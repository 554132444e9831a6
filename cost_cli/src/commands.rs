//! Subcommand handlers.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use cost_core::file_io::{self, FileLock};
use cost_core::{allocation, samples, validation};
use cost_core::{AllocationResult, AllocationSettings, CalcError, CalcResult, Project};

use crate::cli::{Cli, Commands, OutputFormat, Scenario};
use crate::config::AppConfig;
use crate::render;

/// Options shared by every subcommand once flags and config are merged.
pub struct RunContext {
    pub format: OutputFormat,
    pub config: AppConfig,
    pub tolerance: Option<f64>,
    pub strict: bool,
}

impl RunContext {
    pub fn new(cli: &Cli, config: AppConfig) -> Self {
        RunContext {
            format: cli.format.unwrap_or(config.output),
            config,
            tolerance: cli.tolerance,
            strict: cli.strict,
        }
    }

    /// `base` with the command-line overrides applied.
    pub fn settings(&self, base: &AllocationSettings) -> AllocationSettings {
        let mut settings = base.clone();
        if let Some(tolerance) = self.tolerance {
            settings.tolerance_pct = tolerance;
        }
        if self.strict {
            settings.require_complete_keys = true;
        }
        settings
    }
}

pub fn run(cli: Cli, config: AppConfig) -> Result<ExitCode> {
    let ctx = RunContext::new(&cli, config);
    match cli.command {
        Commands::Calc { file } => calc(&ctx, &file),
        Commands::Validate { file } => check(&ctx, &file),
        Commands::Demo { scenario } => demo(&ctx, scenario),
        Commands::Init { file, name, force } => init(&ctx, &file, name, force),
    }
}

fn load(path: &Path) -> Result<Project> {
    let (project, lock) = file_io::load_project_with_lock_check(path)
        .with_context(|| format!("Failed to load project: {}", path.display()))?;
    if let Some(lock) = lock {
        tracing::warn!(
            "{} is being edited by {} since {}",
            path.display(),
            lock.holder(),
            lock.locked_at.to_rfc3339()
        );
    }
    Ok(project)
}

fn title_for(project: &Project, path: &Path) -> String {
    if project.meta.name.is_empty() {
        path.display().to_string()
    } else {
        project.meta.name.clone()
    }
}

fn calc(ctx: &RunContext, path: &Path) -> Result<ExitCode> {
    let project = load(path)?;
    let settings = ctx.settings(&project.settings);
    let outcome = allocation::calculate(&project.definition, &settings);
    emit(ctx, &title_for(&project, path).to_uppercase(), outcome, &settings)
}

fn check(ctx: &RunContext, path: &Path) -> Result<ExitCode> {
    let project = load(path)?;
    let settings = ctx.settings(&project.settings);
    let report = validation::validate(&project.definition, &settings);

    match ctx.format {
        OutputFormat::Table => print!("{}", render::render_report(&title_for(&project, path), &report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(if report.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn demo(ctx: &RunContext, scenario: Scenario) -> Result<ExitCode> {
    let (title, definition) = match scenario {
        Scenario::Tutorial => ("TUTORIAL: THREE SECTIONS", samples::tutorial()),
        Scenario::Workshop => ("WORKSHOP: FIXED AND VARIABLE CHARGES", samples::workshop()),
    };
    let settings = ctx.settings(&ctx.config.settings);
    emit(ctx, title, allocation::calculate(&definition, &settings), &settings)
}

fn init(ctx: &RunContext, path: &Path, name: Option<String>, force: bool) -> Result<ExitCode> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let name = name
        .or_else(|| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "Sectio".to_string());
    let project = Project::new(name, "Workshop example")
        .with_definition(samples::workshop())
        .with_settings(ctx.settings(&ctx.config.settings));

    let lock = FileLock::acquire(path, ctx.config.user_id.as_str())
        .with_context(|| format!("Failed to lock {}", path.display()))?;
    file_io::save_project(&project, path).with_context(|| format!("Failed to write {}", path.display()))?;
    drop(lock);

    match ctx.format {
        OutputFormat::Table => println!("Project \"{}\" written to {}", project.meta.name, path.display()),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "fichier": path.display().to_string(),
                "projet": project.meta,
            }))?
        ),
    }
    Ok(ExitCode::SUCCESS)
}

/// Print a result, or the validation report that prevented it.
fn emit(
    ctx: &RunContext,
    title: &str,
    outcome: CalcResult<AllocationResult>,
    settings: &AllocationSettings,
) -> Result<ExitCode> {
    match outcome {
        Ok(result) => {
            match ctx.format {
                OutputFormat::Table => print!("{}", render::render_result(title, &result, settings)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(CalcError::ValidationFailed { report }) => {
            match ctx.format {
                OutputFormat::Table => eprint!("{}", render::render_report(title, &report)),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&CalcError::ValidationFailed { report })?
                ),
            }
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e).context("Allocation failed"),
    }
}
