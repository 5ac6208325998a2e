//! One shot client for the `/quote` endpoint.
//!
//! Accepts either a flat `{"name": .., "bid": ..}` object or a map of such
//! objects keyed by pair symbol, prints it and, in text mode, records the
//! bid in a summary file.
use clap::Parser;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;
use tracing::debug;

pub const SUMMARY_FILE: &str = "quote.txt";

#[derive(Debug, Parser)]
#[command(name = "fxquote-client", about = "Prints the latest quote served by fxquote")]
pub struct Args {
    /// Quote endpoint
    #[arg(long, default_value = "http://localhost:8080/quote")]
    pub url: String,
    /// Overall request timeout, e.g. 3s or 500ms
    #[arg(long, default_value = "3s", value_parser = parse_duration)]
    pub timeout: Duration,
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
    #[arg(long, default_value = SUMMARY_FILE, hide = true)]
    pub summary: PathBuf,
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteView {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bid: String,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("creating request: {0}")]
    RequestBuild(#[source] reqwest::Error),
    #[error("calling endpoint: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("unexpected status: HTTP status {0}")]
    UnexpectedStatus(StatusCode),
    #[error("unrecognized JSON format: expected an object with name/bid fields or a map of quotes")]
    UnrecognizedFormat,
    #[error("writing {}: {source}", .path.display())]
    Summary { path: PathBuf, source: io::Error },
    #[error("writing output: {0}")]
    Output(#[source] io::Error),
}

impl ClientError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ClientError::RequestBuild(_) => 2,
            ClientError::Transport(_) => 3,
            ClientError::UnexpectedStatus(_) => 4,
            ClientError::UnrecognizedFormat => 5,
            ClientError::Summary { .. } => 6,
            ClientError::Output(_) => 1,
        }
    }
}

pub async fn run(args: &Args, out: &mut impl Write) -> Result<(), ClientError> {
    let client = Client::builder()
        .timeout(args.timeout)
        .build()
        .map_err(ClientError::RequestBuild)?;
    let req = client
        .get(&args.url)
        .build()
        .map_err(ClientError::RequestBuild)?;

    debug!(url = %args.url, timeout = ?args.timeout, "Requesting quote");
    let res = client.execute(req).await.map_err(ClientError::Transport)?;

    if res.status() != StatusCode::OK {
        return Err(ClientError::UnexpectedStatus(res.status()));
    }

    let body = res.bytes().await.map_err(ClientError::Transport)?;
    let view = decode(&body)?;
    render(&view, args, out)
}

pub fn decode(body: &[u8]) -> Result<QuoteView, ClientError> {
    if let Ok(view) = serde_json::from_slice::<QuoteView>(body) {
        if !view.name.is_empty() || !view.bid.is_empty() {
            return Ok(view);
        }
    }

    // Only one entry is expected, so which one comes first doesn't matter.
    if let Ok(views) = serde_json::from_slice::<BTreeMap<String, QuoteView>>(body) {
        if let Some((_, view)) = views.into_iter().next() {
            return Ok(view);
        }
    }

    Err(ClientError::UnrecognizedFormat)
}

fn render(view: &QuoteView, args: &Args, out: &mut impl Write) -> Result<(), ClientError> {
    if args.json {
        let line = serde_json::to_string(view).map_err(|e| ClientError::Output(e.into()))?;
        return writeln!(out, "{}", line).map_err(ClientError::Output);
    }

    writeln!(out, "name: {}\nbid: {}", view.name, view.bid).map_err(ClientError::Output)?;
    write_summary(&args.summary, view)?;
    writeln!(out, "Quote saved to {}", args.summary.display()).map_err(ClientError::Output)
}

fn write_summary(path: &Path, view: &QuoteView) -> Result<(), ClientError> {
    fs::write(path, format!("Dollar: {}\n", view.bid)).map_err(|source| ClientError::Summary {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let (value, unit) = match s.find(|c: char| c.is_ascii_alphabetic()) {
        Some(i) => s.split_at(i),
        None => (s, "s"),
    };
    let value: f64 = value
        .parse()
        .map_err(|_| format!("invalid duration {:?}", s))?;
    let secs = match unit {
        "ms" => value / 1000.0,
        "s" => value,
        "m" => value * 60.0,
        _ => return Err(format!("unknown duration unit {:?}, use ms, s or m", unit)),
    };
    Duration::try_from_secs_f64(secs).map_err(|e| e.to_string())
}
