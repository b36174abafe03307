//! Operator binary: prints, writes or applies the collection schema.

use std::path::PathBuf;

use pocketbase_auth_adapter::adapters::PocketBaseClient;
use pocketbase_auth_adapter::application::{apply_schema, render_schema, write_schema};
use pocketbase_auth_adapter::config::{AppConfig, ConfigError, LoggingConfig};
use pocketbase_auth_adapter::ports::RecordStore;
use secrecy::ExposeSecret;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const USAGE: &str = "usage: pocketbase-auth-adapter <print-schema | write-schema <path> | provision>";

enum Command {
    PrintSchema,
    WriteSchema(PathBuf),
    Provision,
}

impl Command {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, String> {
        let command = match args.next().as_deref() {
            Some("print-schema") => Command::PrintSchema,
            Some("write-schema") => match args.next() {
                Some(path) => Command::WriteSchema(PathBuf::from(path)),
                None => return Err(USAGE.to_string()),
            },
            Some("provision") => Command::Provision,
            _ => return Err(USAGE.to_string()),
        };
        if args.next().is_some() {
            return Err(USAGE.to_string());
        }
        Ok(command)
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let command = Command::parse(std::env::args().skip(1))?;

    // print-schema and write-schema work without a store URL
    let config = AppConfig::load();
    let logging = config
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    init_tracing(&logging)?;

    match command {
        Command::PrintSchema => println!("{}", render_schema()?),
        Command::WriteSchema(path) => write_schema(&path)?,
        Command::Provision => provision(config?).await?,
    }
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), BoxError> {
    let filter = logging.env_filter()?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    if logging.json {
        builder.json().try_init()?;
    } else {
        builder.try_init()?;
    }
    Ok(())
}

async fn provision(config: AppConfig) -> Result<(), BoxError> {
    config.validate().map_err(ConfigError::from)?;

    let client = PocketBaseClient::new(config.store.to_pocketbase_config()?);
    if config.store.has_admin_credentials() {
        client
            .authenticate(
                &config.store.admin_email,
                config.store.admin_password.expose_secret(),
            )
            .await?;
    } else {
        tracing::warn!("No admin credentials configured, importing unauthenticated");
    }

    apply_schema(&client).await?;
    Ok(())
}
