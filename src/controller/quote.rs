use crate::{
    model::{ApiError, Quote},
    service::QuoteService,
};
use rocket::{get, serde::json::Json, Shutdown, State};

#[get("/quote")]
pub async fn get(service: &State<QuoteService>, shutdown: Shutdown) -> Result<Json<Quote>, ApiError> {
    service.get(shutdown).await.map(Json).map_err(ApiError::from)
}
