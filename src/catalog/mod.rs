//! Catalog — read-only reference data for platforms, services, and pricing.

pub mod memory;
pub mod model;

use async_trait::async_trait;

use crate::error::CatalogError;

pub use memory::MemoryCatalog;
pub use model::{Platform, PricingMode, PricingRule, Service, ServiceId, ServiceKind};

/// Backend-agnostic catalog lookup.
///
/// The catalog is shared read-only reference data. Implementations must be
/// safe to call concurrently from every session.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// All platforms with purchasable services.
    async fn list_platforms(&self) -> Result<Vec<Platform>, CatalogError>;

    /// Services available under a platform, ordered by display name.
    async fn list_services(&self, platform: &str) -> Result<Vec<Service>, CatalogError>;

    /// Look up a single service by id.
    async fn get_service(&self, id: ServiceId) -> Result<Option<Service>, CatalogError>;

    /// Pricing rules attached to a service.
    async fn pricing_rules(&self, service: ServiceId) -> Result<Vec<PricingRule>, CatalogError>;
}
