//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use kbsite_core::pipeline::{self, BuildResult, ProgressReporter, SilentProgress};
use kbsite_shared::{AppConfig, BuildConfig, init_config, load_config};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// kbsite: build a knowledge-base site from markdown and YAML content.
#[derive(Parser)]
#[command(
    name = "kbsite",
    version,
    about = "Build the route and redirect tables of a static knowledge-base site.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Project root holding `kbsite.toml`.
    #[arg(long, default_value = ".", global = true, env = "KBSITE_ROOT")]
    pub root: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Build the site and write the output directory.
    Build {
        /// Content directory (overrides `paths.content_dir`).
        #[arg(long)]
        content: Option<PathBuf>,

        /// Output directory (overrides `paths.output_dir`).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Check that the content is present and parses.
    Check {
        /// Content directory (overrides `paths.content_dir`).
        #[arg(long)]
        content: Option<PathBuf>,
    },

    /// Print the route and redirect tables as JSON without writing output.
    Routes {
        /// Content directory (overrides `paths.content_dir`).
        #[arg(long)]
        content: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "kbsite_cli=info,kbsite_core=info,kbsite_shared=warn",
        1 => "kbsite_cli=debug,kbsite_core=debug,kbsite_markdown=debug,kbsite_shared=debug",
        _ => "kbsite_cli=trace,kbsite_core=trace,kbsite_markdown=trace,kbsite_storage=trace,kbsite_shared=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let root = cli.root;
    match cli.command {
        Command::Build { content, out } => cmd_build(&root, content, out).await,
        Command::Check { content } => cmd_check(&root, content).await,
        Command::Routes { content } => cmd_routes(&root, content).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(&root),
            ConfigAction::Show => cmd_config_show(&root),
        },
    }
}

/// Merge `kbsite.toml` (or defaults) with CLI overrides.
fn resolve_build_config(
    root: &Path,
    content: Option<PathBuf>,
    out: Option<PathBuf>,
) -> Result<BuildConfig> {
    let app = load_config(root)?;
    let mut config = BuildConfig::resolve(&app, root);
    if let Some(content) = content {
        config.content_dir = content;
    }
    if let Some(out) = out {
        config.output_dir = out;
    }
    if config.output_dir == config.content_dir {
        return Err(eyre!(
            "output directory '{}' must differ from the content directory",
            config.output_dir.display()
        ));
    }
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_build(root: &Path, content: Option<PathBuf>, out: Option<PathBuf>) -> Result<()> {
    let config = resolve_build_config(root, content, out)?;

    info!(
        content = %config.content_dir.display(),
        output = %config.output_dir.display(),
        "building site"
    );

    let reporter = CliProgress::new();
    let result = pipeline::build_site(&config, env!("CARGO_PKG_VERSION"), &reporter).await?;

    let counts = &result.counts;
    println!();
    println!("  Site built successfully!");
    println!("  Categories:    {}", counts.categories);
    println!(
        "  Pages:         {} (+{} linked)",
        counts.pages, counts.linked_pages
    );
    println!("  Troubleshooter: {}", counts.troubleshooter_nodes);
    println!("  Routes:        {}", counts.routes);
    println!("  Redirects:     {}", counts.redirects);
    println!(
        "  Changes:       {} added, {} changed, {} removed, {} unchanged",
        result.diff.added.len(),
        result.diff.changed.len(),
        result.diff.removed.len(),
        result.diff.unchanged.len()
    );
    println!("  Output:        {}", result.output_dir.display());
    println!("  Time:          {:.1}s", result.elapsed.as_secs_f64());
    for warning in &result.warnings {
        println!("  Warning:       {warning}");
    }
    println!();

    Ok(())
}

async fn cmd_check(root: &Path, content: Option<PathBuf>) -> Result<()> {
    let config = resolve_build_config(root, content, None)?;
    let report = pipeline::check_content(&config).await?;

    println!();
    println!("  Content OK: {}", config.content_dir.display());
    println!("  Files:      {}", report.files);
    println!("  Markdown:   {}", report.markdown);
    println!("  Categories: {}", report.category_files);
    println!("  Images:     {}", report.images);
    println!();

    Ok(())
}

async fn cmd_routes(root: &Path, content: Option<PathBuf>) -> Result<()> {
    let config = resolve_build_config(root, content, None)?;
    let plan = pipeline::plan_site(&config, &SilentProgress).await?;

    for warning in &plan.warnings {
        warn!("{warning}");
    }
    println!("{}", serde_json::to_string_pretty(&plan.site)?);
    Ok(())
}

fn cmd_config_init(root: &Path) -> Result<()> {
    let path = init_config(root)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(root: &Path) -> Result<()> {
    let config: AppConfig = load_config(root)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn warning(&self, message: &str) {
        self.spinner.suspend(|| warn!("{message}"));
    }

    fn done(&self, _result: &BuildResult) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_build_overrides() {
        let cli = Cli::try_parse_from([
            "kbsite", "--root", "site", "build", "--content", "kb", "--out", "dist",
        ])
        .unwrap();
        assert_eq!(cli.root, PathBuf::from("site"));
        match cli.command {
            Command::Build { content, out } => {
                assert_eq!(content, Some(PathBuf::from("kb")));
                assert_eq!(out, Some(PathBuf::from("dist")));
            }
            _ => panic!("expected build"),
        }
    }

    #[test]
    fn verbosity_counts() {
        let cli = Cli::try_parse_from(["kbsite", "-vv", "routes"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::Routes { content: None }));
    }

    #[test]
    fn cli_flags_override_config_file() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("kbsite.toml"),
            "[paths]\ncontent_dir = \"kb\"\noutput_dir = \"dist\"\n",
        )
        .unwrap();

        let from_file = resolve_build_config(tmp.path(), None, None).unwrap();
        assert_eq!(from_file.content_dir, tmp.path().join("kb"));
        assert_eq!(from_file.output_dir, tmp.path().join("dist"));

        let overridden =
            resolve_build_config(tmp.path(), Some(PathBuf::from("/elsewhere")), None).unwrap();
        assert_eq!(overridden.content_dir, PathBuf::from("/elsewhere"));
        assert_eq!(overridden.output_dir, tmp.path().join("dist"));

        let clash = resolve_build_config(
            tmp.path(),
            Some(tmp.path().join("dist")),
            Some(tmp.path().join("dist")),
        );
        assert!(clash.is_err());
    }
}
