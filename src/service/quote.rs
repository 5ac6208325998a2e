use crate::{
    conf::DeadlinesConf,
    model::{FetchError, Quote},
    provider::Provider,
    repository::QuoteRepository,
};
use std::future::Future;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Fetches a fresh quote per call and hands it to the store without waiting
/// for the outcome.
pub struct QuoteService {
    provider: Box<dyn Provider>,
    repo: Option<QuoteRepository>,
    deadlines: DeadlinesConf,
}

impl QuoteService {
    pub fn new(
        provider: Box<dyn Provider>,
        repo: Option<QuoteRepository>,
        deadlines: DeadlinesConf,
    ) -> QuoteService {
        QuoteService {
            provider,
            repo,
            deadlines,
        }
    }

    /// Resolves as soon as the provider answers, the fetch deadline elapses or
    /// `cancel` completes, whichever comes first. Losing the race drops the
    /// outbound request. Rocket keeps running a handler after its client
    /// disconnects, so a gone caller is only noticed through the deadline.
    pub async fn get<C>(&self, cancel: C) -> Result<Quote, FetchError>
    where
        C: Future<Output = ()>,
    {
        let deadline = self.deadlines.fetch();
        let fetch = timeout(deadline, self.provider.fetch(deadline));

        let quote = tokio::select! {
            res = fetch => match res {
                Ok(res) => res?,
                Err(_) => return Err(FetchError::DeadlineExceeded(deadline)),
            },
            _ = cancel => return Err(FetchError::Cancelled),
        };

        info!(provider = %self.provider.name(), bid = %quote.bid, "Fetched quote");
        self.persist(quote.clone());
        Ok(quote)
    }

    fn persist(&self, quote: Quote) {
        let repo = match &self.repo {
            Some(repo) => repo.clone(),
            None => {
                warn!("Quote store is unavailable, skipping persistence");
                return;
            }
        };
        let deadline = self.deadlines.persist();

        tokio::spawn(async move {
            match repo.insert_within(quote, deadline).await {
                Ok(id) => debug!(id, "Persisted quote"),
                Err(e) => warn!(%e, "Failed to persist quote"),
            }
        });
    }
}

#[cfg(test)]
mod test {
    use super::QuoteService;
    use crate::{
        model::{FetchError, Quote},
        provider::Provider,
        repository::QuoteRepository,
        test::{deadlines, quote, repo, wait_for_rows, FakeProvider},
    };
    use anyhow::Result;
    use std::{
        future::pending,
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
        time::{Duration, Instant},
    };
    use tokio::time::sleep;

    /// Hangs until dropped and records the drop.
    struct HangingProvider {
        dropped: Arc<AtomicBool>,
    }

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[rocket::async_trait]
    impl Provider for HangingProvider {
        fn name(&self) -> String {
            "hanging".into()
        }

        async fn fetch(&self, _deadline: Duration) -> Result<Quote, FetchError> {
            let _flag = DropFlag(self.dropped.clone());
            pending().await
        }
    }

    #[tokio::test]
    async fn get_persists() -> Result<()> {
        let (_dir, repo) = repo();
        let service = QuoteService::new(
            Box::new(FakeProvider::ok()),
            Some(repo.clone()),
            deadlines(200, 5000),
        );
        assert_eq!(service.get(pending()).await?, quote());
        let rows = wait_for_rows(&repo, 1).await;
        assert_eq!(rows[0].quote, quote());
        Ok(())
    }

    #[tokio::test]
    async fn get_deadline_exceeded_skips_persistence() -> Result<()> {
        let (_dir, repo) = repo();
        let service = QuoteService::new(
            Box::new(FakeProvider::slow(Duration::from_millis(500))),
            Some(repo.clone()),
            deadlines(50, 5000),
        );
        let res = service.get(pending()).await;
        assert!(matches!(res, Err(FetchError::DeadlineExceeded(_))));
        sleep(Duration::from_millis(600)).await;
        assert!(repo.list_recent(1)?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn get_abandoned_fetch_is_dropped_at_deadline() -> Result<()> {
        let (_dir, repo) = repo();
        let dropped = Arc::new(AtomicBool::new(false));
        let service = QuoteService::new(
            Box::new(HangingProvider {
                dropped: dropped.clone(),
            }),
            Some(repo.clone()),
            deadlines(100, 5000),
        );

        let started = Instant::now();
        let res = service.get(pending()).await;
        assert!(matches!(res, Err(FetchError::DeadlineExceeded(_))));
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(dropped.load(Ordering::SeqCst));
        assert!(repo.list_recent(1)?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn get_cancelled() {
        let service = QuoteService::new(
            Box::new(FakeProvider::slow(Duration::from_secs(5))),
            None,
            deadlines(10_000, 10),
        );
        let res = service.get(async {}).await;
        assert!(matches!(res, Err(FetchError::Cancelled)));
    }

    #[tokio::test]
    async fn get_provider_error() {
        let service = QuoteService::new(Box::new(FakeProvider::failing()), None, deadlines(200, 10));
        let res = service.get(pending()).await;
        assert!(matches!(res, Err(FetchError::MissingKey(_))));
    }

    #[tokio::test]
    async fn get_without_store() -> Result<()> {
        let service = QuoteService::new(Box::new(FakeProvider::ok()), None, deadlines(200, 10));
        assert_eq!(service.get(pending()).await?, quote());
        Ok(())
    }

    #[tokio::test]
    async fn get_with_broken_store() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let repo = QuoteRepository::open(dir.path().join("quotes.db"))?;
        let service = QuoteService::new(Box::new(FakeProvider::ok()), Some(repo), deadlines(200, 1000));
        assert_eq!(service.get(pending()).await?, quote());
        Ok(())
    }
}
