//! Order data model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::Service;

/// Identifier assigned by the fulfillment provider on submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the user is buying: a bare quantity, or the comment texts themselves
/// (whose count is the quantity).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Amount {
    Quantity(u32),
    Comments(Vec<String>),
}

impl Amount {
    pub fn quantity(&self) -> u32 {
        match self {
            Self::Quantity(n) => *n,
            Self::Comments(texts) => texts.len() as u32,
        }
    }
}

/// One in-progress order. Owned exclusively by a single conversation and
/// alive only between service selection and confirm/cancel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDraft {
    /// Correlation id carried through submission and logs.
    pub correlation_id: String,
    pub user_id: String,
    pub platform: String,
    /// Snapshot of the service at the time it was chosen.
    pub service: Service,
    /// Target account handle, stored without the leading `@`.
    pub target: String,
    pub amount: Amount,
    pub base_price: Decimal,
    pub fee: Decimal,
    pub total_price: Decimal,
}

impl OrderDraft {
    /// Build a draft with its price fields set from a resolved base price.
    pub fn new(
        user_id: impl Into<String>,
        service: Service,
        target: impl Into<String>,
        amount: Amount,
        base_price: Decimal,
        fee: Decimal,
    ) -> Self {
        let user_id = user_id.into();
        Self {
            correlation_id: format!("tg_{}_{}", user_id, Uuid::new_v4().simple()),
            user_id,
            platform: service.platform.clone(),
            service,
            target: target.into(),
            amount,
            base_price,
            fee,
            total_price: base_price + fee,
        }
    }

    /// Replace the target handle. Prices are independent of the target and
    /// stay untouched.
    pub fn set_target(&mut self, target: impl Into<String>) {
        self.target = target.into();
    }

    /// Replace the amount and base price together. Base and total are never
    /// updated independently.
    pub fn reprice(&mut self, amount: Amount, base_price: Decimal) {
        self.amount = amount;
        self.base_price = base_price;
        self.total_price = base_price + self.fee;
    }

    /// Deterministic order summary shown before confirmation.
    pub fn summary(&self) -> String {
        let count_line = match &self.amount {
            Amount::Quantity(n) => format!("Quantity: {n}"),
            Amount::Comments(texts) => format!("Comments: {}", texts.len()),
        };
        format!(
            "Order Summary:\n\
             Platform: {}\n\
             Service: {}\n\
             Username: @{}\n\
             {}\n\
             Base Price: ${:.2}\n\
             Fee: ${:.2}\n\
             Total: ${:.2}",
            self.platform,
            self.service.display_name,
            self.target,
            count_line,
            self.base_price.round_dp(2),
            self.fee.round_dp(2),
            self.total_price.round_dp(2),
        )
    }
}

/// Fulfillment status of a confirmed order. Updated by downstream
/// fulfillment, never by the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Submitted,
    Completed,
    Failed,
}

/// A confirmed order. Immutable once created, apart from fulfillment status
/// updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub provider_order_id: OrderId,
    pub draft: OrderDraft,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Record a confirmed draft under the provider's order id.
    pub fn confirmed(draft: OrderDraft, provider_order_id: OrderId) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider_order_id,
            draft,
            status: OrderStatus::Submitted,
            created_at: Utc::now(),
        }
    }
}
