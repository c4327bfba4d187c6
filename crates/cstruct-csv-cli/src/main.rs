use anyhow::Context;
use clap::Parser;
use cstruct_csv::{convert_all, load_conversion_paths};
use tracing::{error, info, warn};

mod cli;

fn main() {
    if let Err(error) = run() {
        eprintln!("cstruct-csv error: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let config = cli.conversion_config();
    let output_dir = cli.output_dir();
    if !output_dir.as_os_str().is_empty() && !output_dir.is_dir() {
        anyhow::bail!("output directory {} does not exist", output_dir.display());
    }

    let groups = match &cli.command {
        Some(cli::Commands::Convert(args)) => vec![args.group(&output_dir)],
        None => {
            if !cli.paths.exists() {
                warn!(path = %cli.paths.display(), "conversion paths file not found, nothing to convert");
                return Ok(());
            }
            load_conversion_paths(&cli.paths, &output_dir)
                .with_context(|| format!("failed to load {}", cli.paths.display()))?
        }
    };

    let results = convert_all(&groups, &config);
    let mut failed = 0;
    for (group, result) in groups.iter().zip(results) {
        match result {
            Ok(conversion) => info!(
                group = %group.name,
                output = %group.output.display(),
                warnings = conversion.warnings.len(),
                "wrote data tables"
            ),
            Err(err) => {
                error!(group = %group.name, "{err}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} conversion groups failed", groups.len());
    }
    Ok(())
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
