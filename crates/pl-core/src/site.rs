use serde::{Deserialize, Serialize};

use crate::ids::SiteId;

/// How the merchant's store is hosted.
///
/// Determines which kind of web view can be opened for remediation links:
/// platform-hosted stores get an authenticated web view, self-hosted stores
/// only a plain one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiteHosting {
    Platform,
    SelfHosted,
}

/// The merchant site the connection flow operates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantSite {
    pub id: SiteId,
    pub hosting: SiteHosting,
}

impl MerchantSite {
    pub fn new(id: impl Into<SiteId>, hosting: SiteHosting) -> Self {
        Self {
            id: id.into(),
            hosting,
        }
    }
}
