use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use piscinas::{
    auth::bootstrap_admin,
    config::{Settings, storage_config},
    notifications::vapid::generate_vapid_key,
};

#[derive(Parser)]
#[command(name = "piscinas")]
#[command(about = "Pool maintenance business service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Generate a VAPID private key file and print its public key
    GenVapid {
        /// Where to write the PEM; must not exist yet
        path: String,
    },
    /// Create or reset the superuser from ADMIN_USER/ADMIN_PASSWORD/ADMIN_EMAIL
    BootstrapAdmin,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    piscinas::init_tracing();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let settings = Settings::from_env()?;
            piscinas::run(settings).await?;
        }
        Commands::GenVapid { path } => {
            let public_key = generate_vapid_key(&path).await?;
            println!("VAPID key written to {}", path);
            println!("Public key: {}", public_key);
        }
        Commands::BootstrapAdmin => {
            let settings = Settings::from_env()?;
            if settings.admin.is_none() {
                anyhow::bail!("ADMIN_USER and ADMIN_PASSWORD must be set");
            }
            let storage = storage_config(&settings).await?;
            bootstrap_admin(&storage, settings.admin.as_ref())
                .await
                .map_err(|e| anyhow::anyhow!("{:?}", e))
                .context("Failed to bootstrap admin")?;
        }
    }

    Ok(())
}
