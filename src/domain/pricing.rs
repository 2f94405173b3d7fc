use std::collections::HashMap;

use bigdecimal::{BigDecimal, Zero};
use uuid::Uuid;

use super::errors::DomainError;
use super::order::{OrderRequest, PricedLine, PricedOrder};
use super::product::ProductView;

/// Validate a request against the fetched catalog records and compute the
/// total from current unit prices. Pure; safe to call speculatively.
///
/// Each line is checked against the fetched stock snapshot independently, so
/// two lines for the same product are not cumulated here. A request that
/// jointly exceeds stock through duplicate lines passes validation and is
/// caught by the conditional decrement at commit time.
pub fn price_order(
    request: &OrderRequest,
    products: &HashMap<Uuid, ProductView>,
) -> Result<PricedOrder, DomainError> {
    let mut total_amount = BigDecimal::zero();
    let mut lines = Vec::with_capacity(request.lines.len());

    for line in &request.lines {
        let product = products
            .get(&line.product_id)
            .ok_or(DomainError::UnknownProduct(line.product_id))?;

        if product.stock_quantity < line.quantity {
            return Err(DomainError::InsufficientStock {
                product_id: product.id,
                name: product.name.clone(),
                available: product.stock_quantity,
            });
        }

        total_amount += &product.unit_price * BigDecimal::from(line.quantity);
        lines.push(PricedLine {
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price: product.unit_price.clone(),
        });
    }

    Ok(PricedOrder {
        total_amount,
        lines,
    })
}
