//! repo-blame: attribute every line of a git working tree to its author
//!
//! Usage:
//!   repo-blame line_blame .                          # One row per line
//!   repo-blame contributions ~/src/app               # Share of lines per author
//!   repo-blame breakdown . --columns file_type,contributor
//!
//! Output formats:
//!   --output_type csv,excel   Files written (default: inferred, else csv)
//!   --json                    Machine-readable report on stdout
//!   --short                   Single-line summary

use clap::Parser;
use owo_colors::{OwoColorize, Style};
use repo_blame_core::{
    build_breakdown, render, AnalysisKind, AnalysisRequest, Attribute, BlameError, BlameResult,
    OutputRequest, OutputType, Report, WalkOptions, Warning,
};
use repo_blame_git::{run_analysis, GitCli};
use std::io::{self, Write};
use std::path::PathBuf;
use tabled::{
    settings::{object::Columns, style::Style as TableStyle, Alignment, Modify},
    Table, Tabled,
};
use tracing_subscriber::EnvFilter;

/// Groups shown in the summary table unless --verbose is given
const SUMMARY_ROWS: usize = 10;

/// Exit codes for scripting
mod exit_codes {
    use repo_blame_core::BlameError;

    pub const SUCCESS: i32 = 0;
    pub const ERROR_GENERAL: i32 = 1;
    pub const ERROR_INVALID_REPOSITORY: i32 = 3;
    pub const ERROR_CONFIGURATION: i32 = 4;
    pub const ERROR_WRITE: i32 = 5;

    pub fn for_error(error: &BlameError) -> i32 {
        match error {
            BlameError::InvalidRepository { .. } => ERROR_INVALID_REPOSITORY,
            BlameError::Configuration(_) => ERROR_CONFIGURATION,
            BlameError::Write { .. } => ERROR_WRITE,
        }
    }
}

/// Configuration file support
mod config {
    use serde::Deserialize;
    use std::fs;
    use std::path::{Path, PathBuf};

    /// User configuration from ~/.repo-blame/config.toml
    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    pub struct Config {
        /// Default output settings
        pub output: OutputConfig,
        /// Default discovery settings
        pub walk: WalkConfig,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    pub struct OutputConfig {
        /// Disable colored output by default
        pub no_color: bool,
        /// Output types used when none are given on the command line
        pub output_type: Vec<String>,
        /// Output directory used when none is given on the command line
        pub output_dir: Option<PathBuf>,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    pub struct WalkConfig {
        /// Directory names always skipped
        pub ignore_dirs: Vec<String>,
        /// File types always skipped
        pub ignore_file_types: Vec<String>,
        /// Stop after this many attributed files
        pub file_limit: Option<usize>,
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".repo-blame").join("config.toml"))
    }

    /// Parse configuration text
    pub fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration.
    ///
    /// An explicit path must exist and parse; the implicit home file falls
    /// back to defaults when it is missing or malformed.
    pub fn load_config(explicit: Option<&Path>) -> Result<Config, String> {
        if let Some(path) = explicit {
            let content = fs::read_to_string(path)
                .map_err(|e| format!("cannot read config file {}: {}", path.display(), e))?;
            return parse_config(&content)
                .map_err(|e| format!("malformed config file {}: {}", path.display(), e));
        }

        let Some(path) = config_path() else {
            return Ok(Config::default());
        };

        if !path.exists() {
            return Ok(Config::default());
        }

        match fs::read_to_string(&path) {
            Ok(content) => Ok(parse_config(&content).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config file");
                Config::default()
            })),
            Err(_) => Ok(Config::default()),
        }
    }

    /// Generate a sample config file content
    pub fn sample_config() -> &'static str {
        r#"# repo-blame configuration file
# Place this file at ~/.repo-blame/config.toml

[output]
# Disable colored output
no_color = false
# Output types used when neither --output_type nor the --output_file extension picks one ("csv", "excel")
output_type = ["csv"]
# Directory for output files when --output_dir is not given
# output_dir = "/tmp/blame-reports"

[walk]
# Directory names skipped in addition to .git
ignore_dirs = ["node_modules", "target"]
# File types skipped in addition to png, jpeg, jpg, gif and svg
ignore_file_types = ["lock"]
# Stop after this many attributed files
# file_limit = 500
"#
    }
}

#[derive(Parser)]
#[command(name = "repo-blame")]
#[command(version, about, long_about = None)]
#[command(after_help = "Analyses:
  line_blame      One row per line: file, commit, contributor, date, code
  contributions   Share of lines per contributor
  breakdown       Nested shares over --columns, in order

Examples:
  repo-blame line_blame .                                  Blame every line into <repo>-<branch>-line_blame.csv
  repo-blame contributions . --output_type csv,excel       Write both formats
  repo-blame breakdown . --columns file_type,contributor   Authors per file type
  repo-blame contributions . --output_file out/report.xlsx Choose the output file
  repo-blame breakdown . --dry_run --json                  Print the report, write nothing")]
struct Cli {
    /// Analysis to run: line_blame, contributions or breakdown
    #[arg(value_name = "ANALYSIS", required_unless_present = "init_config")]
    analysis: Option<String>,

    /// Root of the git working tree to analyse
    #[arg(value_name = "REPOSITORY", required_unless_present = "init_config")]
    repository: Option<PathBuf>,

    /// Columns (line_blame) or breakdown attributes, comma-separated and in order
    #[arg(long = "columns", visible_alias = "column", value_delimiter = ',', value_name = "LIST")]
    columns: Vec<String>,

    /// Output type(s): csv, excel
    #[arg(long = "output_type", visible_alias = "output-type", value_delimiter = ',', value_name = "TYPE")]
    output_type: Vec<String>,

    /// Output file: a bare name, a name with extension, or a path
    #[arg(long = "output_file", visible_alias = "output-file", value_name = "PATH")]
    output_file: Option<PathBuf>,

    /// Directory for output files
    #[arg(long = "output_dir", visible_alias = "output-dir", value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Extra directory names to skip
    #[arg(long = "ignore_dirs", visible_alias = "ignore-dirs", value_delimiter = ',', value_name = "LIST")]
    ignore_dirs: Vec<String>,

    /// Extra file types to skip
    #[arg(long = "ignore_file_types", visible_alias = "ignore-file-types", value_delimiter = ',', value_name = "LIST")]
    ignore_file_types: Vec<String>,

    /// Stop after this many attributed files
    #[arg(long = "file_limit", visible_alias = "file-limit", value_name = "N")]
    file_limit: Option<usize>,

    /// Resolve outputs and analyse, but write nothing
    #[arg(long = "dry_run", visible_alias = "dry-run")]
    dry_run: bool,

    /// Read configuration from this file instead of ~/.repo-blame/config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long, short = 'j', conflicts_with = "short")]
    json: bool,

    /// Print a single-line summary
    #[arg(long, short = 's', conflicts_with = "json")]
    short: bool,

    /// Disable colored output
    #[arg(long = "no_color", visible_alias = "no-color")]
    no_color: bool,

    /// Show every group and debug logging
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Generate a sample config file at ~/.repo-blame/config.toml
    #[arg(long = "init_config", visible_alias = "init-config")]
    init_config: bool,
}

/// Color configuration for output
struct Colors {
    header: Style,
    success: Style,
    warning: Style,
    error: Style,
    info: Style,
    dim: Style,
    highlight: Style,
}

impl Colors {
    fn new(enabled: bool) -> Self {
        if enabled {
            Self {
                header: Style::new().bold().cyan(),
                success: Style::new().green(),
                warning: Style::new().yellow(),
                error: Style::new().red().bold(),
                info: Style::new().cyan(),
                dim: Style::new().dimmed(),
                highlight: Style::new().bold().white(),
            }
        } else {
            Self {
                header: Style::new(),
                success: Style::new(),
                warning: Style::new(),
                error: Style::new(),
                info: Style::new(),
                dim: Style::new(),
                highlight: Style::new(),
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = match config::load_config(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            print_error(&Colors::new(supports_color()), &e);
            std::process::exit(exit_codes::ERROR_CONFIGURATION);
        }
    };

    let colors = Colors::new(!cli.no_color && !cfg.output.no_color && supports_color());

    if cli.init_config {
        handle_init_config(&colors);
        return;
    }

    let request = match build_request(&cli, &cfg) {
        Ok(request) => request,
        Err(e) => {
            print_error(&colors, &e.to_string());
            std::process::exit(exit_codes::for_error(&e));
        }
    };

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            print_error(&colors, &format!("Cannot determine current directory: {}", e));
            std::process::exit(exit_codes::ERROR_GENERAL);
        }
    };

    match run_analysis(&request, &GitCli::new(), &cwd) {
        Ok(report) => {
            render_report(&report, &cli, &colors);
            std::process::exit(exit_codes::SUCCESS);
        }
        Err(e) => {
            print_error(&colors, &e.to_string());
            std::process::exit(exit_codes::for_error(&e));
        }
    }
}

/// Install the stderr subscriber; RUST_LOG wins over --verbose
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "warn,repo_blame_core=debug,repo_blame_git=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Handle --init-config flag
fn handle_init_config(colors: &Colors) {
    use std::fs;

    let Some(config_path) = config::config_path() else {
        print_error(colors, "Could not determine home directory");
        std::process::exit(exit_codes::ERROR_GENERAL);
    };

    if let Some(parent) = config_path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            print_error(colors, &format!("Failed to create config directory: {}", e));
            std::process::exit(exit_codes::ERROR_GENERAL);
        }
    }

    if config_path.exists() {
        print_warning(
            colors,
            &format!("Config file already exists at: {}", config_path.display()),
        );
        eprintln!("Use a text editor to modify it, or delete it first to regenerate.");
        return;
    }

    match fs::write(&config_path, config::sample_config()) {
        Ok(()) => {
            eprintln!(
                "{} Created config file at: {}",
                "success:".style(colors.success),
                config_path.display()
            );
        }
        Err(e) => {
            print_error(colors, &format!("Failed to write config file: {}", e));
            std::process::exit(exit_codes::ERROR_GENERAL);
        }
    }
}

/// Parse a list of names, reporting the first unknown one
fn parse_list<T>(values: &[String]) -> BlameResult<Vec<T>>
where
    T: std::str::FromStr<Err = String>,
{
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.parse::<T>().map_err(BlameError::configuration))
        .collect()
}

/// Merge the command line over the config file into a request
fn build_request(cli: &Cli, cfg: &config::Config) -> BlameResult<AnalysisRequest> {
    let analysis = cli
        .analysis
        .as_deref()
        .ok_or_else(|| BlameError::configuration("no analysis given"))?;
    let kind: AnalysisKind = analysis.parse().map_err(BlameError::configuration)?;
    let repository = cli
        .repository
        .clone()
        .ok_or_else(|| BlameError::configuration("no repository given"))?;

    let columns: Vec<Attribute> = parse_list(&cli.columns)?;
    let types: Vec<OutputType> = parse_list(&cli.output_type)?;
    // config types never override an --output_file extension
    let fallback_types: Vec<OutputType> = parse_list(&cfg.output.output_type)?;

    let walk = WalkOptions {
        ignore_dirs: cfg
            .walk
            .ignore_dirs
            .iter()
            .chain(&cli.ignore_dirs)
            .cloned()
            .collect(),
        ignore_file_types: cfg
            .walk
            .ignore_file_types
            .iter()
            .chain(&cli.ignore_file_types)
            .cloned()
            .collect(),
        file_limit: cli.file_limit.or(cfg.walk.file_limit),
    };

    let mut request = AnalysisRequest::new(repository, kind)
        .with_columns(columns)
        .with_output(OutputRequest {
            types,
            fallback_types,
            file: cli.output_file.clone(),
            dir: cli.output_dir.clone().or_else(|| cfg.output.output_dir.clone()),
        });
    request.walk = walk;
    request.dry_run = cli.dry_run;

    request.validate()?;
    Ok(request)
}

fn render_report(report: &Report, cli: &Cli, colors: &Colors) {
    if cli.json {
        match render::render_json_string(report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                print_error(colors, &format!("Failed to render JSON: {}", e));
                std::process::exit(exit_codes::ERROR_GENERAL);
            }
        }
    } else if cli.short {
        println!("{}", render::render_short(report));
    } else {
        print_colored_report(report, cli, colors);
    }

    for warning in &report.warnings {
        if warning.is_informational() {
            if cli.verbose {
                print_info(colors, &warning.to_string());
            }
        } else {
            print_warning(colors, &format_warning(warning));
        }
    }

    let skipped = report.warnings.iter().filter(|w| w.is_informational()).count();
    if skipped > 0 && !cli.verbose {
        print_info(
            colors,
            &format!("{} empty or binary files skipped (use --verbose to list them)", skipped),
        );
    }

    for target in &report.outputs {
        if report.written {
            eprintln!(
                "{} Wrote {} ({})",
                "success:".style(colors.success),
                target.path.display(),
                target.output_type
            );
        } else {
            print_info(
                colors,
                &format!("Dry run: would write {} ({})", target.path.display(), target.output_type),
            );
        }
    }
}

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Lines")]
    lines: usize,
    #[tabled(rename = "Share")]
    share: String,
}

fn print_colored_report(report: &Report, cli: &Cli, colors: &Colors) {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(
        out,
        "{} {}",
        "Repository:".style(colors.header),
        report.repository.display().style(colors.highlight)
    )
    .ok();
    writeln!(
        out,
        "{} {} {}",
        "Analysis:".style(colors.header),
        report.kind,
        format!(
            "({} lines in {} files)",
            report.line_count, report.files_analyzed
        )
        .style(colors.dim)
    )
    .ok();

    // Line-level analyses still get a per-contributor overview
    let overview;
    let breakdown = match report.breakdown() {
        Some(breakdown) => breakdown,
        None => {
            let records = report.records().unwrap_or(&[]);
            overview = match build_breakdown(records, &[Attribute::Contributor]) {
                Ok(b) => b,
                Err(_) => return,
            };
            &overview
        }
    };

    if breakdown.is_empty() {
        writeln!(out, "\n{}", "No lines were attributed.".style(colors.warning)).ok();
        return;
    }

    if cli.verbose && breakdown.depth() > 1 {
        writeln!(out).ok();
        for line in render::render_tree(report).lines() {
            writeln!(out, "  {}", line).ok();
        }
        writeln!(out).ok();
        return;
    }

    let titles: Vec<&str> = breakdown.attributes.iter().map(|a| a.title()).collect();
    writeln!(
        out,
        "\n{} {}\n",
        "→".style(colors.info),
        format!("Top groups by {}", titles.join(" › ")).style(colors.header)
    )
    .ok();

    let limit = if cli.verbose { usize::MAX } else { SUMMARY_ROWS };
    let rows: Vec<GroupRow> = breakdown
        .nodes
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, node)| GroupRow {
            rank: i + 1,
            value: node.value.clone(),
            lines: node.count,
            share: format!("{:.2}%", node.percentage),
        })
        .collect();

    let table = Table::new(&rows)
        .with(TableStyle::rounded())
        .with(Modify::new(Columns::single(0)).with(Alignment::right()))
        .with(Modify::new(Columns::single(2)).with(Alignment::right()))
        .with(Modify::new(Columns::single(3)).with(Alignment::right()))
        .to_string();

    for line in table.lines() {
        writeln!(out, "  {}", line).ok();
    }

    if breakdown.nodes.len() > rows.len() {
        writeln!(
            out,
            "\n{} {} more groups; use {} to list all.",
            "tip:".style(colors.dim),
            breakdown.nodes.len() - rows.len(),
            "--verbose".style(colors.info)
        )
        .ok();
    }
    writeln!(out).ok();
}

/// Format a warning for display
fn format_warning(warning: &Warning) -> String {
    match warning {
        Warning::Untracked { path, .. } => {
            format!("{} is not committed; skipped", path.display())
        }
        other => other.to_string(),
    }
}

/// Print an error message
fn print_error(colors: &Colors, message: &str) {
    eprintln!("{} {}", "error:".style(colors.error), message);
}

/// Print a warning message
fn print_warning(colors: &Colors, message: &str) {
    eprintln!("{} {}", "warning:".style(colors.warning), message);
}

/// Print an info message
fn print_info(colors: &Colors, message: &str) {
    eprintln!("{} {}", "info:".style(colors.info), message);
}

/// Check if the terminal supports color
fn supports_color() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    atty::is(atty::Stream::Stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use repo_blame_core::{resolve_output, ResolveContext};

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("repo-blame").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_sample_config_parses() {
        let cfg = config::parse_config(config::sample_config()).unwrap();
        assert_eq!(cfg.output.output_type, vec!["csv"]);
        assert_eq!(cfg.walk.ignore_dirs, vec!["node_modules", "target"]);
        assert_eq!(cfg.walk.file_limit, None);
    }

    #[test]
    fn test_build_request_merges_config() {
        let cfg = config::parse_config(
            "[output]\noutput_type = [\"excel\"]\noutput_dir = \"/tmp/out\"\n[walk]\nignore_dirs = [\"vendor\"]\nfile_limit = 3\n",
        )
        .unwrap();
        let cli = cli(&[
            "breakdown",
            ".",
            "--columns",
            "file_type,contributor",
            "--ignore-dirs",
            "dist",
        ]);

        let request = build_request(&cli, &cfg).unwrap();
        assert_eq!(request.kind, AnalysisKind::Breakdown);
        assert_eq!(request.columns, vec![Attribute::FileType, Attribute::Contributor]);
        assert!(request.output.types.is_empty());
        assert_eq!(request.output.fallback_types, vec![OutputType::Excel]);
        assert_eq!(request.output.dir, Some(PathBuf::from("/tmp/out")));
        assert_eq!(request.walk.ignore_dirs, vec!["vendor", "dist"]);
        assert_eq!(request.walk.file_limit, Some(3));
    }

    #[test]
    fn test_cli_flags_override_config() {
        let cfg = config::parse_config("[output]\noutput_type = [\"excel\"]\n").unwrap();
        let cli = cli(&["contributions", ".", "--output_type", "csv,excel", "--file_limit", "7"]);
        let request = build_request(&cli, &cfg).unwrap();
        assert_eq!(request.output.types, vec![OutputType::Csv, OutputType::Excel]);
        assert_eq!(request.walk.file_limit, Some(7));
    }

    #[test]
    fn test_output_file_extension_beats_config_type() {
        let cfg = config::parse_config(config::sample_config()).unwrap();
        let cli = cli(&["contributions", ".", "--output_file", "report.xlsx"]);
        let request = build_request(&cli, &cfg).unwrap();
        assert!(request.output.types.is_empty());

        let cwd = std::env::temp_dir();
        let spec = resolve_output(
            &request.output,
            &ResolveContext {
                cwd: &cwd,
                default_stem: "repo-main-contributions",
            },
        )
        .unwrap();
        assert_eq!(spec.targets.len(), 1);
        assert_eq!(spec.targets[0].output_type, OutputType::Excel);
        assert_eq!(spec.targets[0].path, cwd.join("report.xlsx"));
        assert!(spec.warnings.is_empty());
    }

    #[test]
    fn test_unknown_column_is_configuration_error() {
        let cli = cli(&["line_blame", ".", "--columns", "author"]);
        let err = build_request(&cli, &config::Config::default()).unwrap_err();
        assert_eq!(exit_codes::for_error(&err), exit_codes::ERROR_CONFIGURATION);
    }

    #[test]
    fn test_unknown_analysis_is_configuration_error() {
        let cli = cli(&["history", "."]);
        let err = build_request(&cli, &config::Config::default()).unwrap_err();
        assert!(err.is_configuration());
    }
}
