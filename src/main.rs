use clap::Parser;
use densample::cli::{run, Cli};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "densample=info".into()),
        )
        .init();

    let cli = Cli::parse();
    run(cli)?;
    Ok(())
}
