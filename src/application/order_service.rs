use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{OrderFilter, OrderRequest, OrderStatus, OrderView};
use crate::domain::ports::{CatalogRepository, OrderRepository};
use crate::domain::pricing;

/// Order placement engine and status machine front.
///
/// Holds no mutable state of its own; everything mutable lives behind the
/// injected repositories.
pub struct OrderService<C, O> {
    catalog: C,
    orders: O,
}

impl<C: CatalogRepository, O: OrderRepository> OrderService<C, O> {
    pub fn new(catalog: C, orders: O) -> Self {
        Self { catalog, orders }
    }

    /// Turn an `OrderRequest` into a durable order while reserving stock.
    ///
    /// Validation runs against a batch read of the referenced products; the
    /// repository then re-checks stock with conditional decrements inside a
    /// single transaction, so a rejected request leaves no side effects even
    /// when stock was depleted concurrently between read and commit.
    pub fn place_order(&self, request: OrderRequest) -> Result<OrderView, DomainError> {
        request.validate()?;
        let products = self.catalog.fetch_by_ids(&request.distinct_product_ids())?;
        let priced = pricing::price_order(&request, &products)?;
        self.orders.place(&request.customer_name, priced)
    }

    pub fn get_order(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        self.orders.find_by_id(id)
    }

    pub fn list_orders(&self, filter: OrderFilter) -> Result<Vec<OrderView>, DomainError> {
        self.orders.list(filter)
    }

    /// Apply a workflow transition. The repository update is conditioned on
    /// the status loaded here, so a concurrent transition from the same
    /// origin state cannot be silently overwritten.
    pub fn update_status(&self, id: Uuid, target: OrderStatus) -> Result<(), DomainError> {
        let order = self
            .orders
            .find_by_id(id)?
            .ok_or(DomainError::OrderNotFound)?;

        if !order.status.can_transition_to(target) {
            return Err(DomainError::InvalidTransition {
                from: order.status,
                to: target,
            });
        }

        self.orders.update_status(id, target, order.status)
    }
}
