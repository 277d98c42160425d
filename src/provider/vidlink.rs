// VidLink provider — the API expects an encrypted TMDB id and the scheme is unknown.

use async_trait::async_trait;
use tracing::warn;

use super::error::ProviderError;
use super::traits::Provider;
use super::types::{MediaRequest, ProviderOutput};

const PROVIDER: &str = "VidLink";

/// Always reports itself as broken without touching the network.
///
/// Requests against the API need the id encoding recovered first; sending the
/// raw id only earns rejections.
#[derive(Debug, Default)]
pub struct VidLinkProvider;

impl VidLinkProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Provider for VidLinkProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch(&self, media: &MediaRequest) -> Result<ProviderOutput, ProviderError> {
        warn!("[{}] id encoding missing, cannot fetch tmdb={}", PROVIDER, media.tmdb);
        Err(ProviderError::broken(
            PROVIDER,
            "VidLink error: identifier encoding is not implemented",
        ))
    }
}
