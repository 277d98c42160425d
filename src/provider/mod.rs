// Stream providers — pluggable third-party sources behind one trait.

pub mod error;
pub mod fmovies4u;
pub mod traits;
pub mod types;
pub mod vidlink;

pub use error::ProviderError;
pub use fmovies4u::Fmovies4uProvider;
pub use traits::{Provider, RetryPolicy};
pub use types::{MediaRequest, MediaType, ProviderOutput, StreamFile, StreamKind, Subtitle};
pub use vidlink::VidLinkProvider;
