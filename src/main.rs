//! flint - Source analysis and style linting for modern Fortran

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use flint::process::{analyze_file, find_unit_in, Analysis, Project};
use flint::report::WriterSink;
use flint::{parse_args, CliArgs, Config, Result, Unit, UnitKind};
use glob::Pattern;
use log::{debug, error, info, LevelFilter};
use rayon::prelude::*;

fn main() -> ExitCode {
    let args = parse_args();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using 'warn' instead.", args.log_level);
        LevelFilter::Warn
    });
    // Trace records are emitted at debug level
    let log_level = if args.trace {
        log_level.max(LevelFilter::Debug)
    } else {
        log_level
    };
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    match run(&args) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Analyze every input, returning the number of files that failed
fn run(args: &CliArgs) -> Result<usize> {
    let config = build_config(args)?;

    if let Some(jobs) = args.jobs {
        if jobs > 0 {
            if let Err(e) = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build_global()
            {
                log::warn!("failed to configure thread pool: {e}");
            }
        }
    }

    let excludes: Vec<Pattern> = args
        .exclude
        .iter()
        .filter_map(|p| match Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                log::warn!("ignoring exclude pattern {p}: {e}");
                None
            }
        })
        .collect();
    let mut extensions = config.extensions.clone();
    extensions.extend(args.extensions.iter().cloned());

    let project = Project::scan(&args.inputs, &extensions, &excludes);
    debug!(
        "project root {}: {} files, {} directories",
        project.root.display(),
        project.files.len(),
        project.directories.len()
    );
    if project.files.is_empty() {
        eprintln!("No source files found to analyze.");
        return Ok(0);
    }

    let error_count = AtomicUsize::new(0);
    let analyses: Vec<Option<Analysis>> = project
        .files
        .par_iter()
        .map(|path| match analyze_file(path, &config, Some(&project)) {
            Ok(analysis) => Some(analysis),
            Err(e) => {
                error_count.fetch_add(1, Ordering::Relaxed);
                error!("{e:#}");
                None
            }
        })
        .collect();

    let analyses: Vec<Analysis> = analyses.into_iter().flatten().collect();
    let mut sink = WriterSink::new(io::stdout().lock());
    let mut clean = 0;
    let mut style = 0;
    for analysis in &analyses {
        info!(
            "{}: {} units",
            analysis.relative_path.display(),
            analysis.units.len()
        );
        for unit in &analysis.units {
            log_foreign_uses(&analyses, analysis, unit);
        }
        if analysis.is_clean() {
            clean += 1;
        }
        style += analysis.style_count();
        if !args.quiet {
            analysis.emit(&mut sink)?;
        }
    }
    let diagnostics = sink.count();
    sink.into_inner().flush()?;

    let analyzed = analyses.len();
    let errors = error_count.load(Ordering::Relaxed);
    let skipped = project.skipped.len();
    let summary = format!(
        "Analyzed {analyzed} files ({skipped} skipped, {clean} clean), \
         {diagnostics} diagnostics ({style} style)"
    );
    if errors == 0 {
        eprintln!("{summary}.");
    } else {
        eprintln!("{summary}, {errors} errors.");
    }
    Ok(errors)
}

/// Log `use` statements naming modules that no analyzed file defines
fn log_foreign_uses(analyses: &[Analysis], analysis: &Analysis, unit: &Unit) {
    for module in &unit.uses {
        if find_unit_in(analyses, UnitKind::Module, module).is_none() {
            debug!(
                "{}:{}: module {module} is not defined in the project",
                analysis.relative_path.display(),
                unit.line
            );
        }
    }
    for child in unit.blocks.iter().chain(&unit.subprograms) {
        log_foreign_uses(analyses, analysis, child);
    }
}

/// Build configuration from CLI args and an explicit or discovered config file
fn build_config(args: &CliArgs) -> Result<Config> {
    let mut config = if let Some(config_path) = &args.config {
        debug!("using config file {}", config_path.display());
        Config::from_toml_file(config_path)?
    } else {
        let start = args
            .inputs
            .first()
            .cloned()
            .unwrap_or_else(|| PathBuf::from("."));
        for path in Config::discover_config_files(&start) {
            debug!("discovered config file {}", path.display());
        }
        Config::from_discovered_files(&start)
    };

    // Override with CLI arguments
    if let Some(line_length) = args.line_length {
        config.line_length = line_length;
    }
    if let Some(max_depth) = args.max_depth {
        config.max_depth = max_depth;
    }
    if args.strict {
        config.strict = true;
    }
    if args.no_preprocess {
        config.preprocess = false;
    }
    if args.no_spacing {
        config.check_spacing = false;
    }
    if args.trace {
        config.trace = true;
    }
    for dir in &args.include {
        if !config.include_dirs.contains(dir) {
            config.include_dirs.push(dir.clone());
        }
    }

    debug!("configuration: {config:?}");

    if let Some(error) = config.validate() {
        anyhow::bail!("Invalid configuration: {error}");
    }

    Ok(config)
}
