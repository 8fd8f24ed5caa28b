use clap::{Parser, Subcommand};
use pagewrap::builder::Builder;
use pagewrap::config::{self, SiteConfig};
use pagewrap::output;
use pagewrap::types::BuildReport;
use std::path::PathBuf;
use tracing::error;

#[derive(Parser)]
#[command(name = "pagewrap")]
#[command(about = "Wrap HTML fragments in a page template")]
#[command(long_about = "\
Wrap HTML fragments in a page template

Every .html file under the content directory is a fragment. Each one is
copied to the output directory and wrapped in the template; other files are
copied unchanged.

Default template markers:
  <title>Page Title</title>    Page Title → file name, '_' → ' ', '.html' dropped
  <body>                       fragment inserted two lines below

Incremental builds compare file modification times with the snapshot left
by the previous run and only copy and re-render what changed.

Run 'pagewrap gen-config' to generate a documented pagewrap.toml.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    /// Content directory (overrides config)
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// Output directory (overrides config)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Template file (overrides config)
    #[arg(long, global = true)]
    template: Option<PathBuf>,

    /// Snapshot file (overrides config)
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the whole output directory from scratch
    Build,
    /// Copy and re-render only files changed since the last run
    Update,
    /// Poll for changes and update continuously
    Watch {
        /// Skip the full build before polling starts
        #[arg(long)]
        no_initial_build: bool,
    },
    /// Validate configuration and inputs without building
    Check,
    /// Print a stock pagewrap.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let site_config = resolve_config(&cli)?;
    let builder = Builder::from_config(&site_config)?;

    match cli.command {
        Command::Build => {
            let report = builder.full_build()?;
            output::print_report(&report);
            fail_on_errors(&report)?;
            println!("==> Build complete: {}", builder.output_dir().display());
        }
        Command::Update => {
            let report = builder.incremental_cycle()?;
            output::print_report(&report);
            fail_on_errors(&report)?;
        }
        Command::Watch { no_initial_build } => {
            if !no_initial_build {
                let report = builder.full_build()?;
                output::print_report(&report);
            }
            println!(
                "==> Watching {} (every {} ms)",
                site_config.content_dir.display(),
                site_config.watch.poll_interval_ms
            );
            builder.watch(site_config.watch.poll_interval(), |outcome| match outcome {
                Ok(report) if report.is_noop() => {}
                Ok(report) => output::print_report(&report),
                Err(e) => error!(error = %e, "update failed, retrying next poll"),
            });
        }
        Command::Check => {
            println!("==> Content: {}", site_config.content_dir.display());
            println!("==> Template: {}", site_config.template.display());
            builder.check()?;
            println!("==> Configuration is valid");
        }
        Command::GenConfig => unreachable!("handled above"),
    }

    Ok(())
}

fn fail_on_errors(report: &BuildReport) -> Result<(), Box<dyn std::error::Error>> {
    if report.has_failures() {
        return Err(format!("{} page(s) failed to render", report.failed.len()).into());
    }
    Ok(())
}

/// Load the config file and apply command-line overrides.
fn resolve_config(cli: &Cli) -> Result<SiteConfig, config::ConfigError> {
    let mut site_config = config::load_config(&cli.config)?;
    if let Some(source) = &cli.source {
        site_config.content_dir = source.clone();
    }
    if let Some(output) = &cli.output {
        site_config.output_dir = output.clone();
    }
    if let Some(template) = &cli.template {
        site_config.template = template.clone();
    }
    if let Some(snapshot) = &cli.snapshot {
        site_config.snapshot_file = snapshot.clone();
    }
    Ok(site_config)
}

/// Diagnostics go to stderr so reports on stdout stay clean.
fn init_tracing(verbose: u8) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match verbose {
        0 => "pagewrap=info",
        1 => "pagewrap=debug",
        _ => "pagewrap=trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
