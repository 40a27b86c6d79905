//! Prediction server for a persisted survival model.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;
use titanic_serve::{DEFAULT_MAX_BODY_BYTES, DEFAULT_PORT, ServeConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "titanic-serve")]
#[command(about = "Serve survival predictions over HTTP")]
#[command(version)]
struct Args {
    /// Model artifact written by `titanic train`
    #[arg(short, long, env = "TITANIC_MODEL")]
    model: PathBuf,
    /// Address to bind
    #[arg(long, env = "TITANIC_HOST", default_value = "127.0.0.1")]
    host: IpAddr,
    /// Port to bind
    #[arg(short, long, env = "TITANIC_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Largest accepted prediction request body, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_BYTES)]
    max_body_bytes: u64,
}

impl From<Args> for ServeConfig {
    fn from(args: Args) -> Self {
        Self {
            model_path: args.model,
            host: args.host,
            port: args.port,
            max_body_bytes: args.max_body_bytes,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    titanic_serve::run(Args::parse().into()).await
}
