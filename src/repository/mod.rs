pub mod quote;
pub use quote::QuoteRepository;
