mod api_error;
pub use api_error::ApiError;
mod error;
pub use error::{FetchError, StoreError};
mod quote;
pub use quote::{Quote, StoredQuote};
