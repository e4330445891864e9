//! Payments onboarding state.
//!
//! Whether the merchant's backend is ready to accept card payments. Produced
//! by the onboarding checker once at flow start; an incomplete state routes
//! the user to the onboarding screens instead of starting discovery.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnboardingState {
    /// Payments are fully set up. Carries the store's ISO country code,
    /// which selects the supported reader hardware.
    Completed { country_code: String },
    /// The merchant started but did not finish the payments setup.
    SetupNotCompleted,
    /// The checker could not determine the state.
    GenericError,
}

impl OnboardingState {
    pub fn is_completed(&self) -> bool {
        matches!(self, OnboardingState::Completed { .. })
    }
}
