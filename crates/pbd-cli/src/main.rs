use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pbd")]
#[command(about = "Premarket Breakout Desk CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> overrides)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// List the strategies this build can run
    Strategies,

    /// Replay a bar CSV through the configured strategy and print its signals
    Replay {
        /// Layered config paths in merge order. None = all defaults.
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// Bar CSV: symbol,timestamp,open,high,low,close,volume
        #[arg(long)]
        bars: String,

        /// One JSON object per signal instead of key=value lines
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Treat unused config keys as an error instead of a warning
        #[arg(long, default_value_t = false)]
        strict_config: bool,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(String::as_str).collect();
            let loaded = pbd_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Strategies => commands::strategies::list()?,

        Commands::Replay {
            config_paths,
            bars,
            json,
            strict_config,
        } => commands::replay::run(&config_paths, &bars, json, strict_config)?,
    }

    Ok(())
}
