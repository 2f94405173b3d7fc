use std::collections::HashMap;

use uuid::Uuid;

use super::errors::DomainError;
use super::order::{OrderFilter, OrderStatus, OrderView, PricedOrder};
use super::product::{NewProduct, ProductView};

pub trait CatalogRepository: Send + Sync + 'static {
    fn create(&self, product: NewProduct) -> Result<ProductView, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<ProductView>, DomainError>;
    /// Batch fetch; ids with no matching product are simply absent from the
    /// result, not an error.
    fn fetch_by_ids(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, ProductView>, DomainError>;
    fn list_sorted_by_name(&self) -> Result<Vec<ProductView>, DomainError>;
    fn list_at_or_below(&self, threshold: i32) -> Result<Vec<ProductView>, DomainError>;
    fn set_stock(&self, id: Uuid, stock_quantity: i32) -> Result<(), DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// Atomically reserve stock for every line and persist the order with its
    /// lines. Each reservation is a conditional decrement evaluated against
    /// committed stock at decrement time; if any line cannot be reserved,
    /// nothing is created or decremented.
    fn place(&self, customer_name: &str, priced: PricedOrder) -> Result<OrderView, DomainError>;

    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError>;

    fn list(&self, filter: OrderFilter) -> Result<Vec<OrderView>, DomainError>;

    /// Update the status only if it still equals `expected`, so two
    /// concurrent transitions from the same origin cannot both win.
    fn update_status(
        &self,
        id: Uuid,
        target: OrderStatus,
        expected: OrderStatus,
    ) -> Result<(), DomainError>;
}
