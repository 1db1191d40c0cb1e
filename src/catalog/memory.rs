//! In-memory catalog backend with the standard seed dataset.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use crate::error::CatalogError;

use super::model::{Platform, PricingMode, PricingRule, Service, ServiceId, ServiceKind};
use super::Catalog;

/// Catalog held entirely in memory. Read-only after construction, so lookups
/// need no locking.
pub struct MemoryCatalog {
    platforms: Vec<Platform>,
    services: Vec<Service>,
    rules: HashMap<ServiceId, Vec<PricingRule>>,
}

impl MemoryCatalog {
    pub fn new(
        platforms: Vec<Platform>,
        services: Vec<Service>,
        rules: HashMap<ServiceId, Vec<PricingRule>>,
    ) -> Self {
        Self {
            platforms,
            services,
            rules,
        }
    }

    /// An empty catalog, useful as a base for tests.
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), HashMap::new())
    }

    /// Add a service (and its platform, if new) with the given pricing rules.
    pub fn insert_service(&mut self, service: Service, rules: Vec<PricingRule>) {
        if !self.platforms.iter().any(|p| p.name == service.platform) {
            self.platforms.push(Platform::new(service.platform.clone()));
        }
        self.rules.insert(service.id, rules);
        self.services.push(service);
    }

    /// The standard storefront dataset: four platforms, each carrying
    /// followers, likes, comments, and views with flat pack pricing.
    pub fn seeded() -> Self {
        let mut catalog = Self::empty();

        let kinds = [
            (ServiceKind::Follower, "Followers", 10, 10_000, "High quality followers"),
            (ServiceKind::Like, "Likes", 10, 10_000, "Real likes"),
            (ServiceKind::Comment, "Comments", 1, 500, "Custom user comments"),
            (ServiceKind::View, "Views", 100, 100_000, "Real views"),
        ];

        for platform in ["instagram", "tiktok", "twitter", "youtube"] {
            for (kind, display_name, min_qty, max_qty, blurb) in kinds {
                let service = Service {
                    id: Uuid::new_v4(),
                    platform: platform.to_string(),
                    kind,
                    display_name: display_name.to_string(),
                    min_qty,
                    max_qty,
                    pricing_mode: PricingMode::Flat,
                    description: format!("{} {blurb}", Platform::new(platform).label()),
                };
                let rules = vec![PricingRule::Flat {
                    unit_size: 100,
                    price_usd: pack_price(kind),
                }];
                catalog.insert_service(service, rules);
            }
        }

        catalog
    }
}

/// Price per 100-pack for the seed dataset, in USD.
fn pack_price(kind: ServiceKind) -> Decimal {
    match kind {
        ServiceKind::Follower => dec!(3),
        ServiceKind::Like => dec!(2),
        ServiceKind::Comment => dec!(10),
        ServiceKind::View => dec!(1),
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn list_platforms(&self) -> Result<Vec<Platform>, CatalogError> {
        Ok(self.platforms.clone())
    }

    async fn list_services(&self, platform: &str) -> Result<Vec<Service>, CatalogError> {
        let mut services: Vec<Service> = self
            .services
            .iter()
            .filter(|s| s.platform == platform)
            .cloned()
            .collect();
        services.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(services)
    }

    async fn get_service(&self, id: ServiceId) -> Result<Option<Service>, CatalogError> {
        Ok(self.services.iter().find(|s| s.id == id).cloned())
    }

    async fn pricing_rules(&self, service: ServiceId) -> Result<Vec<PricingRule>, CatalogError> {
        Ok(self.rules.get(&service).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeded_catalog_has_four_platforms() {
        let catalog = MemoryCatalog::seeded();
        let platforms = catalog.list_platforms().await.unwrap();
        let names: Vec<&str> = platforms.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["instagram", "tiktok", "twitter", "youtube"]);
    }

    #[tokio::test]
    async fn seeded_services_sorted_by_display_name() {
        let catalog = MemoryCatalog::seeded();
        let services = catalog.list_services("instagram").await.unwrap();
        assert_eq!(services.len(), 4);
        let names: Vec<&str> = services.iter().map(|s| s.display_name.as_str()).collect();
        assert_eq!(names, vec!["Comments", "Followers", "Likes", "Views"]);
    }

    #[tokio::test]
    async fn seeded_comment_service_bounds() {
        let catalog = MemoryCatalog::seeded();
        let services = catalog.list_services("tiktok").await.unwrap();
        let comments = services
            .iter()
            .find(|s| s.kind == ServiceKind::Comment)
            .unwrap();
        assert_eq!(comments.min_qty, 1);
        assert_eq!(comments.max_qty, 500);
        assert!(comments.min_qty <= comments.max_qty);

        let rules = catalog.pricing_rules(comments.id).await.unwrap();
        assert_eq!(
            rules,
            vec![PricingRule::Flat {
                unit_size: 100,
                price_usd: dec!(10),
            }]
        );
    }

    #[tokio::test]
    async fn unknown_platform_has_no_services() {
        let catalog = MemoryCatalog::seeded();
        let services = catalog.list_services("myspace").await.unwrap();
        assert!(services.is_empty());
    }

    #[tokio::test]
    async fn get_service_by_id() {
        let catalog = MemoryCatalog::seeded();
        let services = catalog.list_services("youtube").await.unwrap();
        let found = catalog.get_service(services[0].id).await.unwrap();
        assert_eq!(found, Some(services[0].clone()));

        let missing = catalog.get_service(Uuid::new_v4()).await.unwrap();
        assert!(missing.is_none());
    }
}
