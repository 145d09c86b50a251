use clap::Parser;
use prop_lines::cli::{Cli, Commands};
use prop_lines::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        Config::default()
    });

    // Initialize telemetry
    prop_lines::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Detect(args) => {
            tracing::info!("Starting movement detection");
            args.execute(&config).await?;
        }
        Commands::Analyze(args) => {
            tracing::info!("Starting correlation analysis");
            args.execute(&config).await?;
        }
        Commands::Report(args) => args.execute(&config).await?,
        Commands::Dashboard(args) => args.execute(&config).await?,
        Commands::Movements(args) => args.execute(&config).await?,
        Commands::Config => {
            println!("# Current configuration");
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
