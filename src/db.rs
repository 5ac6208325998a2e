use crate::{conf::Conf, model::StoredQuote, repository::QuoteRepository};
use anyhow::Result;
use std::{fs::remove_file, io::ErrorKind, process::exit};
use tracing::{error, info, warn};

const DEFAULT_LIST_LIMIT: u32 = 10;

/// Opens the store for the server. A broken store degrades the service to
/// serving quotes without persisting them.
pub fn open(db_url: &str) -> Option<QuoteRepository> {
    let repo = QuoteRepository::open(db_url).and_then(|repo| {
        repo.ensure_schema()?;
        Ok(repo)
    });

    match repo {
        Ok(repo) => {
            info!(%db_url, "Opened quote store");
            Some(repo)
        }
        Err(e) => {
            error!(%e, %db_url, "Quote store is unavailable, quotes won't be persisted");
            None
        }
    }
}

pub fn cli(args: &[String]) {
    let first_arg = args.first().unwrap_or_else(|| {
        error!("No args provided");
        exit(1);
    });

    match first_arg.as_str() {
        "init" => init().unwrap_or_else(|e| {
            error!(%e, "Unable to create schema");
            exit(1);
        }),
        "list" => {
            let limit = match args.get(1) {
                Some(limit) => limit.parse::<u32>().unwrap_or_else(|e| {
                    error!(%e, %limit, "Invalid limit");
                    exit(1);
                }),
                None => DEFAULT_LIST_LIMIT,
            };
            list(limit).unwrap_or_else(|e| {
                error!(%e, "Unable to list quotes");
                exit(1);
            });
        }
        "drop" => drop().unwrap_or_else(|e| {
            error!(%e, "Unable to drop database");
            exit(1);
        }),
        _ => {
            error!(?args, "Unknown argument");
            exit(1);
        }
    };
}

fn init() -> Result<()> {
    let db_url = Conf::new()?.db_url;
    QuoteRepository::open(&db_url)?.ensure_schema()?;
    info!(%db_url, "Schema is up to date");
    Ok(())
}

fn list(limit: u32) -> Result<()> {
    let db_url = Conf::new()?.db_url;
    let repo = QuoteRepository::open(&db_url)?;
    repo.ensure_schema()?;
    let rows = repo.list_recent(limit)?;
    info!(count = rows.len(), "Loaded quotes");

    println!("Latest quotes:");
    for row in rows {
        println!("{}", format_row(&row));
    }

    Ok(())
}

fn drop() -> Result<()> {
    warn!("Dropping database...");
    let db_url = Conf::new()?.db_url;
    info!(%db_url);
    remove_file(&db_url)?;

    for suffix in ["-wal", "-shm"] {
        match remove_file(format!("{}{}", db_url, suffix)) {
            Err(e) if e.kind() != ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }
    }

    warn!("Database has been dropped");
    Ok(())
}

fn format_row(row: &StoredQuote) -> String {
    let quote = &row.quote;
    format!(
        "- {}/{} | {} | High={:.4} Low={:.4}",
        quote.code, quote.codein, quote.name, quote.high, quote.low
    )
}

#[cfg(test)]
mod test {
    use super::{format_row, open};
    use crate::test::quote;
    use anyhow::Result;

    #[test]
    fn open_creates_schema() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("quotes.db");
        let repo = open(path.to_str().unwrap()).unwrap();
        let id = repo.insert(&quote())?;
        let rows = repo.list_recent(1)?;
        assert_eq!(rows[0].id, id);
        assert_eq!(
            format_row(&rows[0]),
            "- USD/BRL | Dólar/Real | High=5.2000 Low=5.0500"
        );
        Ok(())
    }

    #[test]
    fn open_unreachable() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("missing").join("quotes.db");
        assert!(open(path.to_str().unwrap()).is_none());
        Ok(())
    }
}
