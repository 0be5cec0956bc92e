//! Command-line interface for flint.
//!
//! Defines CLI arguments using clap builder API

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};

/// CLI arguments parsed from command line
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Files or directories to analyze
    pub inputs: Vec<PathBuf>,

    /// Maximum line length
    pub line_length: Option<usize>,

    /// Maximum nesting depth of units and constructs
    pub max_depth: Option<usize>,

    /// Treat structural problems as errors
    pub strict: bool,

    /// Do not interpret preprocessor directives
    pub no_preprocess: bool,

    /// Do not check operator spacing
    pub no_spacing: bool,

    /// Log every classified statement
    pub trace: bool,

    /// Extra include search directories
    pub include: Vec<PathBuf>,

    /// Config file path
    pub config: Option<PathBuf>,

    /// Number of parallel jobs (0 = auto, 1 = sequential)
    pub jobs: Option<usize>,

    /// Exclude patterns for files/directories (glob patterns)
    pub exclude: Vec<String>,

    /// Additional source file extensions
    pub extensions: Vec<String>,

    /// Log level for diagnostics on stderr
    pub log_level: String,

    /// Print only the summary line
    pub quiet: bool,
}

/// Build the clap Command for parsing CLI arguments
#[must_use]
pub fn build_cli() -> Command {
    Command::new("flint")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Source analysis and style linting for modern Fortran")
        .arg(
            Arg::new("inputs")
                .help("Files or directories to analyze")
                .value_name("PATH")
                .num_args(1..)
                .required(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("line-length")
                .short('l')
                .long("line-length")
                .help("Maximum line length [default: 132]")
                .value_name("NUM")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("max-depth")
                .long("max-depth")
                .help("Maximum nesting depth of units and constructs [default: 256]")
                .value_name("NUM")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .help("Stop at the first structural or lexical error")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-preprocess")
                .long("no-preprocess")
                .help("Do not interpret #define, #undef and #include")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-spacing")
                .long("no-spacing")
                .help("Do not check spacing around operators")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("trace")
                .short('v')
                .long("trace")
                .help("Log every classified statement (implies --log-level debug)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("include")
                .short('I')
                .long("include")
                .help("Add an include search directory (repeatable)")
                .value_name("DIR")
                .action(ArgAction::Append)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Config file path (overrides auto-discovery)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .help("Number of parallel jobs (0 = auto, 1 = sequential)")
                .value_name("NUM")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("exclude")
                .short('e')
                .long("exclude")
                .help("Exclude files/dirs matching pattern (repeatable)")
                .value_name("PATTERN")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("extension")
                .short('x')
                .long("extension")
                .help("Additional source file extension (repeatable)")
                .value_name("EXT")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .help("Log level: off, error, warn, info, debug, trace")
                .value_name("LEVEL")
                .default_value("warn"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Print only the summary")
                .action(ArgAction::SetTrue),
        )
}

/// Parse CLI arguments
#[must_use]
pub fn parse_args() -> CliArgs {
    args_from_matches(&build_cli().get_matches())
}

/// Parse CLI arguments from an iterator (for testing)
#[must_use]
pub fn parse_args_from<I, T>(args: I) -> CliArgs
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    args_from_matches(&build_cli().get_matches_from(args))
}

/// Convert clap `ArgMatches` to `CliArgs`
fn args_from_matches(matches: &clap::ArgMatches) -> CliArgs {
    let strings = |id: &str| -> Vec<String> {
        matches
            .get_many::<String>(id)
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default()
    };

    CliArgs {
        inputs: matches
            .get_many::<PathBuf>("inputs")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default(),
        line_length: matches.get_one::<usize>("line-length").copied(),
        max_depth: matches.get_one::<usize>("max-depth").copied(),
        strict: matches.get_flag("strict"),
        no_preprocess: matches.get_flag("no-preprocess"),
        no_spacing: matches.get_flag("no-spacing"),
        trace: matches.get_flag("trace"),
        include: matches
            .get_many::<PathBuf>("include")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default(),
        config: matches.get_one::<PathBuf>("config").cloned(),
        jobs: matches.get_one::<usize>("jobs").copied(),
        exclude: strings("exclude"),
        extensions: strings("extension"),
        log_level: matches
            .get_one::<String>("log-level")
            .cloned()
            .unwrap_or_else(|| "warn".to_string()),
        quiet: matches.get_flag("quiet"),
    }
}
