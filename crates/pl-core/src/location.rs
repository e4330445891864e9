//! Merchant location resolution.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a default location id could not be resolved for a site.
///
/// `MissingAddress` and `InvalidPostalCode` are user-actionable and get their
/// own view states; anything else is surfaced as a generic connection
/// failure with the message passed through.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum LocationFetchError {
    #[error("merchant address is missing")]
    MissingAddress {
        /// Deep link to the store-address form, opened so the merchant can
        /// fill the address in.
        url: String,
    },

    #[error("merchant address has an invalid postal code")]
    InvalidPostalCode,

    #[error("fetching location failed: {0}")]
    Other(String),
}
