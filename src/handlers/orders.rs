use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::order::{
    OrderFilter, OrderLineRequest, OrderRequest, OrderStatus, OrderView,
};
use crate::errors::AppError;
use crate::AppOrderService;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderLineRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    pub customer_name: String,
    pub items: Vec<PlaceOrderLineRequest>,
}

impl PlaceOrderRequest {
    fn into_domain(self) -> OrderRequest {
        OrderRequest {
            customer_name: self.customer_name,
            lines: self
                .items
                .into_iter()
                .map(|l| OrderLineRequest {
                    product_id: l.product_id,
                    quantity: l.quantity,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderLineResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub position: i32,
    pub quantity: i32,
    pub unit_price: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub customer_name: String,
    pub status: String,
    pub total_amount: String,
    pub created_at: String,
    pub lines: Vec<OrderLineResponse>,
}

impl OrderResponse {
    fn from_view(order: OrderView) -> Self {
        Self {
            id: order.id,
            customer_name: order.customer_name,
            status: order.status.to_string(),
            total_amount: order.total_amount.to_string(),
            created_at: order.created_at.to_rfc3339(),
            lines: order
                .lines
                .into_iter()
                .map(|l| OrderLineResponse {
                    id: l.id,
                    product_id: l.product_id,
                    position: l.position,
                    quantity: l.quantity,
                    unit_price: l.unit_price.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    /// One of: Pending, Approved, Shipped, Cancelled
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Filter by status label, e.g. `?status=Pending`
    pub status: Option<String>,
    /// Filter by UTC calendar day, e.g. `?date=2025-12-15`
    pub date: Option<NaiveDate>,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Places an order: validates stock against the catalog, snapshots unit
/// prices, decrements inventory, and persists the order — all-or-nothing. A
/// rejected request leaves no side effects.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = OrderResponse),
        (status = 400, description = "Unknown product, insufficient stock, or invalid input"),
    ),
    tag = "orders"
)]
pub async fn place_order(
    service: web::Data<AppOrderService>,
    body: web::Json<PlaceOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner().into_domain();

    let service = service.clone();
    let order = web::block(move || service.place_order(request))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(OrderResponse::from_view(order)))
}

/// GET /orders
///
/// Newest-first list of orders with their lines. Supports optional `status`
/// and `date` filters.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("status" = Option<String>, Query, description = "Status label filter"),
        ("date" = Option<NaiveDate>, Query, description = "UTC calendar day filter"),
    ),
    responses(
        (status = 200, description = "Orders", body = [OrderResponse]),
        (status = 400, description = "Unrecognized status label"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    service: web::Data<AppOrderService>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let status = params
        .status
        .as_deref()
        .map(str::parse::<OrderStatus>)
        .transpose()?;
    let filter = OrderFilter {
        status,
        date: params.date,
    };

    let service = service.clone();
    let orders = web::block(move || service.list_orders(filter))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let responses: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from_view).collect();
    Ok(HttpResponse::Ok().json(responses))
}

/// GET /orders/{id}
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    service: web::Data<AppOrderService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let service = service.clone();
    let order = web::block(move || service.get_order(order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    match order {
        Some(order) => Ok(HttpResponse::Ok().json(OrderResponse::from_view(order))),
        None => Err(crate::domain::errors::DomainError::OrderNotFound.into()),
    }
}

/// PUT /orders/{id}/status
///
/// Applies a fulfillment workflow transition. Unrecognized labels are
/// rejected here, before the state machine is consulted.
#[utoipa::path(
    put,
    path = "/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order UUID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 204, description = "Status updated"),
        (status = 400, description = "Unrecognized label or invalid transition"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    service: web::Data<AppOrderService>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateOrderStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let target: OrderStatus = body.into_inner().status.parse()?;

    let service = service.clone();
    web::block(move || service.update_status(order_id, target))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::NoContent().finish())
}
