use clap::Parser;
use fxquote::client::{self, Args};
use std::{io, process::exit};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();

    if let Err(e) = client::run(&args, &mut io::stdout()).await {
        eprintln!("error {}", e);
        exit(e.exit_code());
    }
}
