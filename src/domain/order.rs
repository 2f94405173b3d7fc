use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;

/// Fulfillment workflow state.
///
/// `Shipped` and `Cancelled` are terminal; an order can only be cancelled
/// before it ships. Cancellation does not restock inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Approved,
    Shipped,
    Cancelled,
}

impl OrderStatus {
    pub fn can_transition_to(self, target: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, target),
            (Pending, Approved) | (Pending, Cancelled) | (Approved, Shipped) | (Approved, Cancelled)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Approved => "Approved",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(OrderStatus::Pending),
            "Approved" => Ok(OrderStatus::Approved),
            "Shipped" => Ok(OrderStatus::Shipped),
            "Cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::InvalidInput(format!(
                "Invalid status '{}'. Allowed values: Pending, Approved, Shipped, Cancelled",
                other
            ))),
        }
    }
}

// ── Placement input ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OrderLineRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// What a customer submits. Duplicate product ids across lines are kept as
/// independent lines; quantities are never merged.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub customer_name: String,
    pub lines: Vec<OrderLineRequest>,
}

impl OrderRequest {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.customer_name.trim().is_empty() {
            return Err(DomainError::InvalidInput(
                "Customer name must not be empty".to_string(),
            ));
        }
        if self.lines.is_empty() {
            return Err(DomainError::InvalidInput(
                "Order must contain at least one line".to_string(),
            ));
        }
        if let Some(line) = self.lines.iter().find(|l| l.quantity < 1) {
            return Err(DomainError::InvalidInput(format!(
                "Quantity for product {} must be at least 1",
                line.product_id
            )));
        }
        Ok(())
    }

    /// Distinct product ids, first-occurrence order preserved.
    pub fn distinct_product_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            if !ids.contains(&line.product_id) {
                ids.push(line.product_id);
            }
        }
        ids
    }
}

// ── Pricing output ───────────────────────────────────────────────────────────

/// One line with its unit price snapshotted from the catalog at pricing time.
#[derive(Debug, Clone)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct PricedOrder {
    pub total_amount: BigDecimal,
    pub lines: Vec<PricedLine>,
}

// ── Persisted views ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub position: i32,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: Uuid,
    pub customer_name: String,
    pub status: OrderStatus,
    pub total_amount: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLineView>,
}

/// Filters for the order list endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub date: Option<chrono::NaiveDate>,
}
