use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::product::{NewProduct, ProductView};
use crate::errors::AppError;
use crate::{AppCatalogService, Settings};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub sku: String,
    pub name: String,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub unit_price: String,
    pub stock_quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub unit_price: String,
    pub stock_quantity: i32,
    pub is_low_stock: bool,
}

impl ProductResponse {
    fn from_view(product: ProductView, threshold: i32) -> Self {
        Self {
            id: product.id,
            sku: product.sku,
            name: product.name,
            unit_price: product.unit_price.to_string(),
            stock_quantity: product.stock_quantity,
            is_low_stock: product.stock_quantity <= threshold,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStockRequest {
    pub stock_quantity: i32,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /products
#[utoipa::path(
    post,
    path = "/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid input or duplicate SKU"),
    ),
    tag = "products"
)]
pub async fn create_product(
    service: web::Data<AppCatalogService>,
    settings: web::Data<Settings>,
    body: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let unit_price = BigDecimal::from_str(&body.unit_price).map_err(|e| {
        DomainError::InvalidInput(format!("Invalid unit_price '{}': {}", body.unit_price, e))
    })?;

    let service = service.clone();
    let product = web::block(move || {
        service.create_product(NewProduct {
            sku: body.sku,
            name: body.name,
            unit_price,
            stock_quantity: body.stock_quantity,
        })
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created()
        .json(ProductResponse::from_view(product, settings.low_stock_threshold)))
}

/// GET /products
///
/// All products sorted by name, each flagged with `is_low_stock` against the
/// configured threshold.
#[utoipa::path(
    get,
    path = "/products",
    responses(
        (status = 200, description = "All products sorted by name", body = [ProductResponse]),
    ),
    tag = "products"
)]
pub async fn list_products(
    service: web::Data<AppCatalogService>,
    settings: web::Data<Settings>,
) -> Result<HttpResponse, AppError> {
    let service = service.clone();
    let products = web::block(move || service.list_products())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let threshold = settings.low_stock_threshold;
    let responses: Vec<ProductResponse> = products
        .into_iter()
        .map(|p| ProductResponse::from_view(p, threshold))
        .collect();
    Ok(HttpResponse::Ok().json(responses))
}

/// GET /products/low-stock
#[utoipa::path(
    get,
    path = "/products/low-stock",
    responses(
        (status = 200, description = "Products at or below the low-stock threshold", body = [ProductResponse]),
    ),
    tag = "products"
)]
pub async fn low_stock_products(
    service: web::Data<AppCatalogService>,
    settings: web::Data<Settings>,
) -> Result<HttpResponse, AppError> {
    let threshold = settings.low_stock_threshold;
    let service = service.clone();
    let products = web::block(move || service.low_stock_products(threshold))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let responses: Vec<ProductResponse> = products
        .into_iter()
        .map(|p| ProductResponse::from_view(p, threshold))
        .collect();
    Ok(HttpResponse::Ok().json(responses))
}

/// GET /products/{id}
#[utoipa::path(
    get,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn get_product(
    service: web::Data<AppCatalogService>,
    settings: web::Data<Settings>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let service = service.clone();
    let product = web::block(move || service.get_product(product_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    match product {
        Some(product) => Ok(HttpResponse::Ok()
            .json(ProductResponse::from_view(product, settings.low_stock_threshold))),
        None => Err(DomainError::ProductNotFound.into()),
    }
}

/// PUT /products/{id}/stock
///
/// Manual restock: sets the absolute stock level.
#[utoipa::path(
    put,
    path = "/products/{id}/stock",
    params(("id" = Uuid, Path, description = "Product UUID")),
    request_body = UpdateStockRequest,
    responses(
        (status = 204, description = "Stock updated"),
        (status = 400, description = "Negative stock"),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn update_stock(
    service: web::Data<AppCatalogService>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStockRequest>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let stock_quantity = body.into_inner().stock_quantity;

    let service = service.clone();
    web::block(move || service.set_stock(product_id, stock_quantity))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::NoContent().finish())
}
