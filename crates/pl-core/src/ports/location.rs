use async_trait::async_trait;

use crate::ids::LocationId;
use crate::location::LocationFetchError;
use crate::site::MerchantSite;

/// Resolves the default location id a reader connection must be associated
/// with. A remote read; no side effects.
#[async_trait]
pub trait LocationProviderPort: Send + Sync {
    async fn default_location(
        &self,
        site: &MerchantSite,
    ) -> Result<LocationId, LocationFetchError>;
}
