//! Pricing resolution — pure price calculation from catalog rules.
//!
//! No I/O happens here. The conversation engine fetches rules from the
//! catalog and hands them in, so identical inputs always price identically
//! and a draft can be safely repriced on every edit.

use rust_decimal::Decimal;

use crate::catalog::{PricingMode, PricingRule, Service};
use crate::error::PricingError;

/// Compute the base price for `quantity` units of `service`.
///
/// Flat mode bills in whole packs: the applicable rule is the smallest
/// `unit_size` that covers the quantity, falling back to the largest rule
/// when the quantity exceeds every pack size, and the price is
/// `ceil(quantity / unit_size) * price_usd`.
///
/// Tiered mode bills per unit: the single rule whose inclusive
/// `[qty_from, qty_to]` range contains the quantity supplies
/// `price_per_unit`, and the price is `quantity * price_per_unit`.
pub fn resolve(
    service: &Service,
    rules: &[PricingRule],
    quantity: u32,
) -> Result<Decimal, PricingError> {
    match service.pricing_mode {
        PricingMode::Flat => resolve_flat(service, rules, quantity),
        PricingMode::Tiered => resolve_tiered(rules, quantity),
        PricingMode::Unknown => Err(PricingError::UnknownMode {
            service: service.id,
        }),
    }
}

fn resolve_flat(
    service: &Service,
    rules: &[PricingRule],
    quantity: u32,
) -> Result<Decimal, PricingError> {
    let mut packs: Vec<(u32, Decimal)> = rules
        .iter()
        .filter_map(|rule| match rule {
            PricingRule::Flat {
                unit_size,
                price_usd,
            } => Some((*unit_size, *price_usd)),
            PricingRule::Tiered { .. } => None,
        })
        .collect();

    if packs.is_empty() {
        return Err(PricingError::NoPricingConfigured {
            service: service.id,
        });
    }

    packs.sort_by_key(|(unit_size, _)| *unit_size);

    // Smallest pack that covers the quantity; oversized quantities fall back
    // to the largest pack and are billed in multiples of it.
    let chosen = packs
        .iter()
        .find(|(unit_size, _)| quantity <= *unit_size)
        .or_else(|| packs.last());
    let Some(&(unit_size, price_usd)) = chosen else {
        return Err(PricingError::NoPricingConfigured {
            service: service.id,
        });
    };

    let pack_count = (Decimal::from(quantity) / Decimal::from(unit_size)).ceil();
    Ok(pack_count * price_usd)
}

fn resolve_tiered(rules: &[PricingRule], quantity: u32) -> Result<Decimal, PricingError> {
    let per_unit = rules.iter().find_map(|rule| match rule {
        PricingRule::Tiered {
            qty_from,
            qty_to,
            price_per_unit,
        } if (*qty_from..=*qty_to).contains(&quantity) => Some(*price_per_unit),
        _ => None,
    });

    match per_unit {
        Some(price_per_unit) => Ok(Decimal::from(quantity) * price_per_unit),
        None => Err(PricingError::NoTierForQuantity { quantity }),
    }
}
