use anyhow::Result;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::{path::PathBuf, time::Duration};

#[derive(Clone, Debug, Deserialize)]
pub struct Conf {
    pub port: u16,
    pub db_url: String,
    pub provider: ProviderConf,
    pub deadlines: DeadlinesConf,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProviderConf {
    pub url: String,
    pub symbol: String,
}

/// Per request budgets. `persist_ms` is best effort and may always
/// elapse under lock contention.
#[derive(Clone, Debug, Deserialize)]
pub struct DeadlinesConf {
    pub fetch_ms: u64,
    pub persist_ms: u64,
}

impl DeadlinesConf {
    pub fn fetch(&self) -> Duration {
        Duration::from_millis(self.fetch_ms)
    }

    pub fn persist(&self) -> Duration {
        Duration::from_millis(self.persist_ms)
    }
}

impl Conf {
    pub fn new() -> Result<Conf> {
        Ok(Conf::figment().extract()?)
    }

    pub fn figment() -> Figment {
        let default_conf = include_str!("../fxquote.conf");
        let mut figment = Figment::new().merge(Toml::string(default_conf));

        if let Some(path) = custom_conf_path() {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed("FXQUOTE_").split("__"))
    }
}

fn custom_conf_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("fxquote").join("fxquote.conf"))
}
