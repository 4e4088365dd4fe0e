//! boothstat - Daily booth-entry performance reports from entry exports

use boothstat::{
    app::{entry_filter, render, write_output},
    cli::Cli,
    data_loader::DataLoader,
};
use boothstat_core::{CalendarOffset, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise --verbose raises the default from warn to info
    let default_filter = if cli.verbose { "boothstat=info" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    cli.validate()?;
    info!("Running {:?} for {} days", cli.command(), cli.window_days());

    let interactive = cli.out.is_none() && is_terminal::is_terminal(std::io::stdout());
    let show_progress = is_terminal::is_terminal(std::io::stderr());
    let colored_output = interactive && std::env::var("NO_COLOR").is_err();

    let loader = DataLoader::new(cli.data.clone())
        .await?
        .with_filter(entry_filter(&cli))
        .with_progress(show_progress);

    let generated_on = CalendarOffset::from_cli(cli.offset.as_deref())?.today();
    let rendered = render(&cli, &loader, Some(generated_on), colored_output).await?;

    if let Some(path) = write_output(&cli, &rendered).await? {
        eprintln!("Report written to {}", path.display());
    }

    Ok(())
}
