use async_trait::async_trait;

use crate::onboarding::OnboardingState;
use crate::site::MerchantSite;

/// Payments onboarding checker.
///
/// Infallible by contract: implementations fold their own failures into
/// `OnboardingState::GenericError`.
#[async_trait]
pub trait OnboardingCheckerPort: Send + Sync {
    async fn onboarding_state(&self, site: &MerchantSite) -> OnboardingState;
}
