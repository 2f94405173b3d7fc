use std::collections::HashMap;

use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::CatalogRepository;
use crate::domain::product::{NewProduct, ProductView};
use crate::schema::products;

use super::models::{NewProductRow, ProductRow};

pub struct DieselCatalogRepository {
    pool: DbPool,
}

impl DieselCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn to_view(row: ProductRow) -> ProductView {
    ProductView {
        id: row.id,
        sku: row.sku,
        name: row.name,
        unit_price: row.unit_price,
        stock_quantity: row.stock_quantity,
    }
}

impl CatalogRepository for DieselCatalogRepository {
    fn create(&self, product: NewProduct) -> Result<ProductView, DomainError> {
        let mut conn = self.pool.get()?;

        let row = NewProductRow {
            id: Uuid::new_v4(),
            sku: product.sku.clone(),
            name: product.name,
            unit_price: product.unit_price,
            stock_quantity: product.stock_quantity,
        };

        let created = diesel::insert_into(products::table)
            .values(&row)
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .map_err(|e| match e {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    DomainError::DuplicateSku(product.sku)
                }
                other => other.into(),
            })?;

        Ok(to_view(created))
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<ProductView>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = products::table
            .filter(products::id.eq(id))
            .select(ProductRow::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(row.map(to_view))
    }

    fn fetch_by_ids(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, ProductView>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = products::table
            .filter(products::id.eq_any(ids))
            .select(ProductRow::as_select())
            .load(&mut conn)?;

        Ok(rows.into_iter().map(|r| (r.id, to_view(r))).collect())
    }

    fn list_sorted_by_name(&self) -> Result<Vec<ProductView>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = products::table
            .select(ProductRow::as_select())
            .order(products::name.asc())
            .load(&mut conn)?;

        Ok(rows.into_iter().map(to_view).collect())
    }

    fn list_at_or_below(&self, threshold: i32) -> Result<Vec<ProductView>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = products::table
            .filter(products::stock_quantity.le(threshold))
            .select(ProductRow::as_select())
            .order(products::name.asc())
            .load(&mut conn)?;

        Ok(rows.into_iter().map(to_view).collect())
    }

    fn set_stock(&self, id: Uuid, stock_quantity: i32) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        let updated = diesel::update(products::table.filter(products::id.eq(id)))
            .set(products::stock_quantity.eq(stock_quantity))
            .execute(&mut conn)?;

        if updated == 0 {
            return Err(DomainError::ProductNotFound);
        }
        Ok(())
    }
}
