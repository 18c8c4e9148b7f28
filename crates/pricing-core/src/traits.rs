use crate::{Item, PricingError, Quote, Supplier, Week};
use async_trait::async_trait;

/// Read-only access to the negotiation portal's storage.
///
/// The analytics core never writes; implementations live with the
/// persistence layer and return denormalized quote records joined with
/// supplier identity where available.
#[async_trait]
pub trait PricingRepository: Send + Sync {
    async fn list_weeks(&self) -> Result<Vec<Week>, PricingError>;

    async fn list_items(&self) -> Result<Vec<Item>, PricingError>;

    async fn list_suppliers(&self) -> Result<Vec<Supplier>, PricingError>;

    async fn list_quotes_for_week(&self, week_id: &str) -> Result<Vec<Quote>, PricingError>;
}
