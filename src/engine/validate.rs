//! Free-text validation. Failures never change session state; the engine
//! renders them and re-issues the current prompt.

use crate::catalog::Service;
use crate::error::ValidationError;

/// A target handle: trimmed, one leading `@` stripped, non-empty.
pub fn parse_target(text: &str) -> Result<String, ValidationError> {
    let trimmed = text.trim();
    let handle = trimmed.strip_prefix('@').unwrap_or(trimmed);
    if handle.is_empty() {
        return Err(ValidationError::EmptyTarget);
    }
    Ok(handle.to_string())
}

/// A quantity: an integer within the service's inclusive bounds.
pub fn parse_quantity(text: &str, service: &Service) -> Result<u32, ValidationError> {
    let out_of_range = || ValidationError::InvalidQuantity {
        min: service.min_qty,
        max: service.max_qty,
    };
    let quantity: u32 = text.trim().parse().map_err(|_| out_of_range())?;
    if quantity < service.min_qty || quantity > service.max_qty {
        return Err(out_of_range());
    }
    Ok(quantity)
}

/// A comment list: comma-split, trimmed, empties dropped, count within the
/// service's inclusive bounds.
pub fn parse_comments(text: &str, service: &Service) -> Result<Vec<String>, ValidationError> {
    let comments: Vec<String> = text
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from)
        .collect();

    let count = comments.len() as u32;
    if comments.is_empty() || count < service.min_qty || count > service.max_qty {
        return Err(ValidationError::InvalidComments {
            min: service.min_qty,
            max: service.max_qty,
        });
    }
    Ok(comments)
}
