use crate::model::{FetchError, Quote};
use std::time::Duration;

/// Source of live quotes. One attempt per call, retries are up to the caller.
#[rocket::async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> String;

    async fn fetch(&self, deadline: Duration) -> Result<Quote, FetchError>;
}
