use thiserror::Error;
use uuid::Uuid;

use super::order::OrderStatus;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Unknown product: {0}")]
    UnknownProduct(Uuid),

    #[error("Insufficient stock for {name}. Available: {available}")]
    InsufficientStock {
        product_id: Uuid,
        name: String,
        available: i32,
    },

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order not found")]
    OrderNotFound,

    #[error("Product not found")]
    ProductNotFound,

    #[error("A product with SKU '{0}' already exists")]
    DuplicateSku(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Persistence failure: {0}")]
    Persistence(String),
}

impl DomainError {
    /// Stable, machine-checkable identifier surfaced to API clients so they
    /// can distinguish "fix your input" from "retry later" without parsing
    /// the human-readable message.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::UnknownProduct(_) => "UNKNOWN_PRODUCT",
            DomainError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            DomainError::InvalidTransition { .. } => "INVALID_TRANSITION",
            DomainError::OrderNotFound => "ORDER_NOT_FOUND",
            DomainError::ProductNotFound => "PRODUCT_NOT_FOUND",
            DomainError::DuplicateSku(_) => "DUPLICATE_SKU",
            DomainError::InvalidInput(_) => "INVALID_INPUT",
            DomainError::Persistence(_) => "PERSISTENCE_FAILURE",
        }
    }
}
