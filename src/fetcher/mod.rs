pub mod admission;
pub mod backoff;
pub mod client;
pub mod decode;
pub mod errors;
pub mod identity;
pub mod types;

pub use client::Fetcher;
pub use errors::FetchError;
pub use identity::{Identity, IdentityPool};
pub use types::{Charset, FetchResult};
