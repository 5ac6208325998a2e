use crate::{
    conf::ProviderConf,
    model::{FetchError, Quote},
    provider::Provider,
};
use reqwest::{Client, StatusCode};
use serde::de::Error as _;
use serde_json::{Map, Value};
use std::time::Duration;

pub struct AwesomeApi {
    conf: ProviderConf,
    client: Client,
}

impl AwesomeApi {
    pub fn new(conf: ProviderConf) -> Result<AwesomeApi, FetchError> {
        let client = Client::builder()
            .build()
            .map_err(FetchError::RequestBuild)?;
        Ok(AwesomeApi { conf, client })
    }
}

#[rocket::async_trait]
impl Provider for AwesomeApi {
    fn name(&self) -> String {
        "awesomeapi".into()
    }

    async fn fetch(&self, deadline: Duration) -> Result<Quote, FetchError> {
        let req = self
            .client
            .get(&self.conf.url)
            .timeout(deadline)
            .build()
            .map_err(FetchError::RequestBuild)?;
        let res = self
            .client
            .execute(req)
            .await
            .map_err(|e| transport(e, deadline))?;

        if res.status() != StatusCode::OK {
            return Err(FetchError::UnexpectedStatus(res.status()));
        }

        let body = res.bytes().await.map_err(|e| transport(e, deadline))?;
        decode(&body, &self.conf.symbol)
    }
}

fn transport(e: reqwest::Error, deadline: Duration) -> FetchError {
    if e.is_timeout() {
        FetchError::DeadlineExceeded(deadline)
    } else {
        FetchError::Transport(e)
    }
}

/// Picks `symbol` out of a `{"USDBRL": {...}}` style payload. Other entries
/// are ignored, even when they are not quotes.
pub fn decode(body: &[u8], symbol: &str) -> Result<Quote, FetchError> {
    let mut pairs: Map<String, Value> = serde_json::from_slice(body)?;
    let pair = pairs
        .remove(symbol)
        .ok_or_else(|| FetchError::MissingKey(symbol.to_string()))?;
    let quote: Quote = serde_json::from_value(pair)?;

    if !quote.is_displayable() {
        return Err(FetchError::Decode(serde_json::Error::custom(format!(
            "{} has an empty code, codein or bid",
            symbol
        ))));
    }

    Ok(quote)
}

#[cfg(test)]
mod test {
    use super::{decode, AwesomeApi};
    use crate::{
        conf::ProviderConf,
        model::FetchError,
        provider::Provider,
        test::{closed_port, quote, stub, USDBRL},
    };
    use anyhow::Result;
    use std::time::Duration;

    const DEADLINE: Duration = Duration::from_millis(200);

    fn provider(url: String) -> AwesomeApi {
        AwesomeApi::new(ProviderConf {
            url,
            symbol: "USDBRL".into(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn fetch() -> Result<()> {
        let url = stub(200, USDBRL, Duration::ZERO).await;
        let res = provider(url).fetch(DEADLINE).await?;
        assert_eq!(res, quote());
        Ok(())
    }

    #[tokio::test]
    async fn fetch_unexpected_status() {
        let url = stub(503, "maintenance", Duration::ZERO).await;
        let res = provider(url).fetch(DEADLINE).await;
        assert!(matches!(res, Err(FetchError::UnexpectedStatus(s)) if s.as_u16() == 503));
    }

    #[tokio::test]
    async fn fetch_deadline_exceeded() {
        let url = stub(200, USDBRL, Duration::from_millis(800)).await;
        let res = provider(url).fetch(Duration::from_millis(100)).await;
        assert!(matches!(res, Err(FetchError::DeadlineExceeded(_))));
    }

    #[tokio::test]
    async fn fetch_connection_refused() {
        let url = closed_port().await;
        let res = provider(url).fetch(DEADLINE).await;
        assert!(matches!(res, Err(FetchError::Transport(_))));
    }

    #[tokio::test]
    async fn fetch_malformed_url() {
        let res = provider("not a url".into()).fetch(DEADLINE).await;
        assert!(matches!(res, Err(FetchError::RequestBuild(_))));
    }

    #[test]
    fn decode_ignores_other_keys() -> Result<()> {
        let body = USDBRL.replacen('{', r#"{"EURBRL":"garbage","#, 1);
        assert_eq!(decode(body.as_bytes(), "USDBRL")?, quote());
        Ok(())
    }

    #[test]
    fn decode_missing_key() {
        let res = decode(USDBRL.as_bytes(), "EURBRL");
        assert!(matches!(res, Err(FetchError::MissingKey(key)) if key == "EURBRL"));
    }

    #[test]
    fn decode_malformed() {
        assert!(matches!(decode(b"[1, 2]", "USDBRL"), Err(FetchError::Decode(_))));
        assert!(matches!(decode(b"{", "USDBRL"), Err(FetchError::Decode(_))));
        let body = USDBRL.replace(r#""high":"5.20""#, r#""high":"n/a""#);
        assert!(matches!(decode(body.as_bytes(), "USDBRL"), Err(FetchError::Decode(_))));
    }

    #[test]
    fn decode_empty_bid() {
        let body = USDBRL.replace(r#""bid":"5.10""#, r#""bid":"""#);
        assert!(matches!(decode(body.as_bytes(), "USDBRL"), Err(FetchError::Decode(_))));
    }
}
