use fxquote::{conf::Conf, db};
use std::{env, process::exit};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[rocket::main]
async fn main() -> Result<(), rocket::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();

    if args.get(1).map(String::as_str) == Some("db") {
        db::cli(&args[2..]);
        return Ok(());
    }

    let conf = Conf::new().unwrap_or_else(|e| {
        error!(%e, "Failed to load configuration");
        exit(1);
    });

    let rocket = fxquote::build(&conf).unwrap_or_else(|e| {
        error!(%e, "Failed to prepare server");
        exit(1);
    });

    let _rocket = rocket.launch().await?;
    Ok(())
}
