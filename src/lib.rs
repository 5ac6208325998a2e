pub mod client;
pub mod conf;
pub mod controller;
pub mod db;
pub mod model;
pub mod provider;
pub mod repository;
pub mod service;

use crate::{conf::Conf, provider::AwesomeApi, service::QuoteService};
use anyhow::Result;
use rocket::{catchers, routes, Build, Rocket};

pub fn build(conf: &Conf) -> Result<Rocket<Build>> {
    let provider = AwesomeApi::new(conf.provider.clone())?;
    let repo = db::open(&conf.db_url);
    let service = QuoteService::new(Box::new(provider), repo, conf.deadlines.clone());
    let figment = rocket::Config::figment().merge(("port", conf.port));
    Ok(prepare(rocket::custom(figment), service))
}

pub fn prepare(rocket: Rocket<Build>, service: QuoteService) -> Rocket<Build> {
    rocket
        .mount("/", routes![controller::quote::get])
        .register("/", catchers![controller::default])
        .manage(service)
}
