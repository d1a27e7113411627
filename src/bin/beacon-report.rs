use anyhow::{Context, Result};
use beacon::api::AppState;
use beacon::config::{Config, Variant};
use beacon::source::{self, ServiceAccountAuth};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "beacon-report")]
#[command(about = "Run GA4 dashboard reports from the command line", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one summary and print it as JSON
    Fetch {
        /// Which endpoint's output to reproduce (defaults to BEACON_VARIANT)
        #[arg(long, value_enum)]
        variant: Option<VariantArg>,
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Check that the configured credentials can obtain an access token
    Token,
}

#[derive(Clone, Copy, ValueEnum)]
enum VariantArg {
    Server,
    Function,
}

impl From<VariantArg> for Variant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Server => Variant::Server,
            VariantArg::Function => Variant::Function,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Fetch { variant, pretty } => {
            let variant = variant.map(Variant::from).unwrap_or(config.variant);
            let state =
                AppState::for_variant(&config, variant, source::from_config(&config.google)?);

            let summary = state.summarize().await;
            let rendered = if pretty {
                serde_json::to_string_pretty(&summary)?
            } else {
                serde_json::to_string(&summary)?
            };
            println!("{}", rendered);
        }
        Commands::Token => {
            let auth = ServiceAccountAuth::new(config.google.credential_source())?;
            let key = auth.key().await?;
            let token = auth
                .refresh()
                .await
                .context("failed to obtain access token")?;
            println!(
                "✓ Obtained access token for '{}' (expires in {}s)",
                key.client_email,
                token.expires_in.as_secs()
            );
        }
    }

    Ok(())
}
