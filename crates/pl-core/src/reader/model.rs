use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::ids::{LocationId, ReaderId};

/// Card reader hardware model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReaderType {
    Chipper2X,
    StripeM2,
    WisePad3,
}

impl Display for ReaderType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReaderType::Chipper2X => "CHIPPER_2X",
            ReaderType::StripeM2 => "STRIPE_M2",
            ReaderType::WisePad3 => "WISEPAD_3",
        };
        write!(f, "{name}")
    }
}

/// A reader surfaced by an active discovery session.
///
/// Ephemeral: lives only for the duration of the session and is never
/// persisted. The serial id can be absent while the SDK is still resolving
/// the advertisement; such readers are not offered for selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredReader {
    pub id: Option<ReaderId>,
    pub reader_type: ReaderType,
    /// Location the reader itself remembers from a prior pairing. Takes
    /// precedence over the merchant's resolved default location.
    pub location_id: Option<LocationId>,
}

impl DiscoveredReader {
    pub fn new(id: impl Into<ReaderId>, reader_type: ReaderType) -> Self {
        Self {
            id: Some(id.into()),
            reader_type,
            location_id: None,
        }
    }

    pub fn with_location(mut self, location_id: impl Into<LocationId>) -> Self {
        self.location_id = Some(location_id.into());
        self
    }
}

/// A reader the SDK reports an established connection to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedReader {
    pub id: ReaderId,
    pub reader_type: ReaderType,
}
