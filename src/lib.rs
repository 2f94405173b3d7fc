pub mod application;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::catalog_service::CatalogService;
use application::order_service::OrderService;
use infrastructure::catalog_repo::DieselCatalogRepository;
use infrastructure::order_repo::DieselOrderRepository;

pub use db::{create_pool, DbPool};

pub type AppCatalogService = CatalogService<DieselCatalogRepository>;
pub type AppOrderService = OrderService<DieselCatalogRepository, DieselOrderRepository>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Service-level configuration read from the environment at startup.
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    /// Stock level at or below which a product counts as low-stock.
    pub low_stock_threshold: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            low_stock_threshold: 10,
        }
    }
}

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) {
    let mut conn = pool.get().expect("Failed to get DB connection for migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::products::create_product,
        handlers::products::list_products,
        handlers::products::low_stock_products,
        handlers::products::get_product,
        handlers::products::update_stock,
        handlers::orders::place_order,
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::update_order_status,
    ),
    components(schemas(
        handlers::products::CreateProductRequest,
        handlers::products::ProductResponse,
        handlers::products::UpdateStockRequest,
        handlers::orders::PlaceOrderRequest,
        handlers::orders::PlaceOrderLineRequest,
        handlers::orders::OrderResponse,
        handlers::orders::OrderLineResponse,
        handlers::orders::UpdateOrderStatusRequest,
    ))
)]
struct ApiDoc;

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    pool: DbPool,
    settings: Settings,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    Ok(HttpServer::new(move || {
        let catalog_service = web::Data::new(CatalogService::new(DieselCatalogRepository::new(
            pool.clone(),
        )));
        let order_service = web::Data::new(OrderService::new(
            DieselCatalogRepository::new(pool.clone()),
            DieselOrderRepository::new(pool.clone()),
        ));
        App::new()
            .app_data(catalog_service)
            .app_data(order_service)
            .app_data(web::Data::new(settings))
            .wrap(Logger::default())
            .service(
                web::scope("/products")
                    .route("", web::post().to(handlers::products::create_product))
                    .route("", web::get().to(handlers::products::list_products))
                    .route(
                        "/low-stock",
                        web::get().to(handlers::products::low_stock_products),
                    )
                    .route("/{id}", web::get().to(handlers::products::get_product))
                    .route("/{id}/stock", web::put().to(handlers::products::update_stock)),
            )
            .service(
                web::scope("/orders")
                    .route("", web::post().to(handlers::orders::place_order))
                    .route("", web::get().to(handlers::orders::list_orders))
                    .route("/{id}", web::get().to(handlers::orders::get_order))
                    .route(
                        "/{id}/status",
                        web::put().to(handlers::orders::update_order_status),
                    ),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
