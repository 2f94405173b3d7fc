use bigdecimal::{BigDecimal, Zero};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::CatalogRepository;
use crate::domain::product::{NewProduct, ProductView};

pub struct CatalogService<C> {
    catalog: C,
}

impl<C: CatalogRepository> CatalogService<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    pub fn create_product(&self, product: NewProduct) -> Result<ProductView, DomainError> {
        if product.sku.trim().is_empty() {
            return Err(DomainError::InvalidInput(
                "SKU must not be empty".to_string(),
            ));
        }
        if product.name.trim().is_empty() {
            return Err(DomainError::InvalidInput(
                "Name must not be empty".to_string(),
            ));
        }
        if product.unit_price < BigDecimal::zero() {
            return Err(DomainError::InvalidInput(
                "Unit price must not be negative".to_string(),
            ));
        }
        if product.stock_quantity < 0 {
            return Err(DomainError::InvalidInput(
                "Stock quantity must not be negative".to_string(),
            ));
        }
        self.catalog.create(product)
    }

    pub fn get_product(&self, id: Uuid) -> Result<Option<ProductView>, DomainError> {
        self.catalog.find_by_id(id)
    }

    pub fn list_products(&self) -> Result<Vec<ProductView>, DomainError> {
        self.catalog.list_sorted_by_name()
    }

    pub fn low_stock_products(&self, threshold: i32) -> Result<Vec<ProductView>, DomainError> {
        self.catalog.list_at_or_below(threshold)
    }

    /// Manual restock: sets the absolute stock level.
    pub fn set_stock(&self, id: Uuid, stock_quantity: i32) -> Result<(), DomainError> {
        if stock_quantity < 0 {
            return Err(DomainError::InvalidInput(
                "Stock cannot be negative".to_string(),
            ));
        }
        self.catalog.set_stock(id, stock_quantity)
    }
}
