//! Catalog data model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for a service in the catalog.
pub type ServiceId = Uuid;

/// A top-level category of purchasable engagement (a social network).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub name: String,
}

impl Platform {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Display label: platform name with the first letter capitalized.
    pub fn label(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    }
}

/// What kind of engagement a service delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    Follower,
    Like,
    Comment,
    View,
}

impl ServiceKind {
    /// Comment services collect the comment texts themselves; every other
    /// kind collects a bare quantity.
    pub fn collects_comments(&self) -> bool {
        matches!(self, Self::Comment)
    }
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Follower => "follower",
            Self::Like => "like",
            Self::Comment => "comment",
            Self::View => "view",
        };
        write!(f, "{s}")
    }
}

/// How a service is priced.
///
/// `Unknown` covers mode values in backend data that this build does not
/// recognize; the pricing resolver rejects them explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PricingMode {
    /// Packs of a fixed size at a fixed price.
    Flat,
    /// Per-unit price depending on quantity range.
    Tiered,
    Unknown,
}

impl From<String> for PricingMode {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "flat" => Self::Flat,
            "tiered" => Self::Tiered,
            _ => Self::Unknown,
        }
    }
}

impl From<PricingMode> for String {
    fn from(mode: PricingMode) -> Self {
        mode.to_string()
    }
}

impl std::fmt::Display for PricingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Flat => "flat",
            Self::Tiered => "tiered",
            Self::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// A specific purchasable offering under a platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub platform: String,
    pub kind: ServiceKind,
    pub display_name: String,
    /// Inclusive quantity bounds; `min_qty <= max_qty` always holds.
    pub min_qty: u32,
    pub max_qty: u32,
    pub pricing_mode: PricingMode,
    pub description: String,
}

/// A pricing rule attached to exactly one service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum PricingRule {
    /// One pack size at a fixed pack price. A flat-priced service carries one
    /// or more of these, consulted in ascending `unit_size` order.
    Flat { unit_size: u32, price_usd: Decimal },
    /// A per-unit price over an inclusive quantity range. Ranges for one
    /// service are disjoint; the backend guarantees coverage.
    Tiered {
        qty_from: u32,
        qty_to: u32,
        price_per_unit: Decimal,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_label_capitalizes() {
        assert_eq!(Platform::new("instagram").label(), "Instagram");
        assert_eq!(Platform::new("tiktok").label(), "Tiktok");
        assert_eq!(Platform::new("").label(), "");
    }

    #[test]
    fn comment_kind_collects_comments() {
        assert!(ServiceKind::Comment.collects_comments());
        assert!(!ServiceKind::Follower.collects_comments());
        assert!(!ServiceKind::Like.collects_comments());
        assert!(!ServiceKind::View.collects_comments());
    }

    #[test]
    fn pricing_rule_serde_tags_mode() {
        let rule = PricingRule::Flat {
            unit_size: 100,
            price_usd: rust_decimal_macros::dec!(3),
        };
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["mode"], "flat");
        assert_eq!(json["unit_size"], 100);

        let tier = PricingRule::Tiered {
            qty_from: 1,
            qty_to: 99,
            price_per_unit: rust_decimal_macros::dec!(0.05),
        };
        let json = serde_json::to_value(&tier).unwrap();
        assert_eq!(json["mode"], "tiered");
    }

    #[test]
    fn unknown_pricing_mode_from_backend_data() {
        let mode: PricingMode = serde_json::from_str("\"volumetric\"").unwrap();
        assert_eq!(mode, PricingMode::Unknown);
    }
}
