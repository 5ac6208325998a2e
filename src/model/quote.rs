use chrono::{DateTime, Utc};
use serde::{de, de::DeserializeOwned, Deserialize, Deserializer, Serialize};

/// Single currency pair snapshot as published by the exchange rate provider.
///
/// `bid`, `ask` and `var_bid` keep the provider's decimal text untouched,
/// `high`, `low`, `pct_change` and `timestamp` are parsed from their quoted
/// wire form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub code: String,
    pub codein: String,
    pub name: String,
    #[serde(deserialize_with = "number_or_text")]
    pub high: f64,
    #[serde(deserialize_with = "number_or_text")]
    pub low: f64,
    #[serde(rename = "varBid")]
    pub var_bid: String,
    #[serde(rename = "pctChange", deserialize_with = "number_or_text")]
    pub pct_change: f64,
    pub bid: String,
    pub ask: String,
    #[serde(deserialize_with = "number_or_text")]
    pub timestamp: i64,
    pub create_date: String,
}

impl Quote {
    pub fn is_displayable(&self) -> bool {
        !self.code.is_empty() && !self.codein.is_empty() && !self.bid.is_empty()
    }
}

/// Append-only row owned by the store.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredQuote {
    pub id: i64,
    pub inserted_at: DateTime<Utc>,
    pub quote: Quote,
}

fn number_or_text<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire<T> {
        Text(String),
        Number(T),
    }

    match Wire::<T>::deserialize(deserializer)? {
        // JSON number grammar only: no NaN, inf or padding.
        Wire::Text(text) if text.trim() != text => Err(de::Error::custom(format!(
            "invalid number {:?}: surrounding whitespace",
            text
        ))),
        Wire::Text(text) => serde_json::from_str::<T>(&text)
            .map_err(|e| de::Error::custom(format!("invalid number {:?}: {}", text, e))),
        Wire::Number(n) => Ok(n),
    }
}
