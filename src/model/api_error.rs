use crate::model::FetchError;
use rocket::{
    http::{ContentType, Status},
    request::Request,
    response::{self, Responder, Response},
};
use std::io::Cursor;
use tracing::error;

#[derive(Debug)]
pub struct ApiError {
    pub status: Status,
    pub error: Option<FetchError>,
}

impl ApiError {
    pub fn new(status: Status, error: FetchError) -> ApiError {
        ApiError {
            status,
            error: Some(error),
        }
    }

    pub fn body(&self) -> String {
        format!(
            "{} {}",
            self.status.code,
            self.status.reason().unwrap_or("Unknown")
        )
    }
}

impl From<FetchError> for ApiError {
    fn from(e: FetchError) -> Self {
        let status = match &e {
            FetchError::RequestBuild(_) => Status::InternalServerError,
            FetchError::DeadlineExceeded(_) => Status::GatewayTimeout,
            FetchError::Cancelled => Status::ServiceUnavailable,
            FetchError::Transport(_)
            | FetchError::UnexpectedStatus(_)
            | FetchError::Decode(_)
            | FetchError::MissingKey(_) => Status::BadGateway,
        };
        ApiError::new(status, e)
    }
}

impl From<Status> for ApiError {
    fn from(s: Status) -> Self {
        ApiError {
            status: s,
            error: None,
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        if let Some(error) = &self.error {
            error!(%error, status = self.status.code, "Failed to get quote");
        }

        let body = self.body();

        Response::build()
            .header(ContentType::Plain)
            .status(self.status)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}
