// src/main.rs
use clap::Parser;
use ct_viewer::cli::Cli;
use ct_viewer::config::Config;
use ct_viewer::output;
use ct_viewer::pipeline;
use ct_viewer::progress::ProgressIndicator;
use ct_viewer::source;
use futures_util::future::join_all;
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Validate arguments
    cli.validate()?;

    // Load config file, then apply CLI overrides
    let mut config = Config::load(cli.config.as_deref().map(Path::new))?;
    cli.apply_overrides(&mut config);

    // Initialize logging (stderr, so stdout stays clean for JSON/CSV)
    let log_level = cli.log_level().unwrap_or(config.logging.level.as_str());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let domains = cli.trimmed_domains();
    let filter = cli.date_filter()?;

    let source = source::from_config(&config)?;
    tracing::info!(
        "Looking up {} domain(s) via {}",
        domains.len(),
        source.name()
    );

    let handler = output::create_handler(
        cli.output_format(),
        cli.output.as_deref().map(Path::new),
    )?;
    if let Some(ref path) = cli.output {
        tracing::info!("Writing output to: {}", path);
    }

    let progress = ProgressIndicator::new(cli.should_show_progress(), domains.len());

    // Each domain is an independent pipeline; nothing is shared between them
    let lookups = domains.iter().map(|domain| {
        let source = source.as_ref();
        let filter = filter.as_ref();
        let progress = progress.clone();
        async move {
            let result = pipeline::lookup(source, domain, filter).await;
            progress.lookup_done(domain);
            (domain, result)
        }
    });
    let results = join_all(lookups).await;
    progress.finish();

    let mut failures = 0;
    for (domain, result) in results {
        match result {
            Ok(report) => handler.emit_report(&report).await?,
            Err(e) => {
                tracing::warn!("Lookup failed for {}: {}", domain, e);
                failures += 1;
                handler.emit_failure(domain, &e.to_string()).await?;
            }
        }
    }

    handler.flush().await?;

    if failures > 0 {
        anyhow::bail!("{} of {} lookups failed", failures, domains.len());
    }

    Ok(())
}
