use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Domain(e) => match e {
                DomainError::UnknownProduct(_)
                | DomainError::InsufficientStock { .. }
                | DomainError::InvalidTransition { .. }
                | DomainError::DuplicateSku(_)
                | DomainError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                DomainError::OrderNotFound | DomainError::ProductNotFound => StatusCode::NOT_FOUND,
                DomainError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (code, message) = match self {
            // Storage detail goes to the log, never to the client.
            AppError::Domain(DomainError::Persistence(detail)) => {
                log::error!("Persistence failure: {}", detail);
                ("PERSISTENCE_FAILURE", "Internal server error".to_string())
            }
            AppError::Domain(e) => (e.code(), e.to_string()),
            AppError::Internal(detail) => {
                log::error!("Internal error: {}", detail);
                ("INTERNAL_ERROR", "Internal server error".to_string())
            }
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "code": code,
            "message": message,
        }))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::ResponseError;
    use uuid::Uuid;

    use super::*;
    use crate::domain::order::OrderStatus;

    #[test]
    fn business_rejections_return_400() {
        let errors = [
            DomainError::UnknownProduct(Uuid::new_v4()),
            DomainError::InsufficientStock {
                product_id: Uuid::new_v4(),
                name: "Widget".to_string(),
                available: 2,
            },
            DomainError::InvalidTransition {
                from: OrderStatus::Shipped,
                to: OrderStatus::Pending,
            },
            DomainError::DuplicateSku("WID-1".to_string()),
            DomainError::InvalidInput("bad".to_string()),
        ];
        for e in errors {
            assert_eq!(
                AppError::from(e).error_response().status(),
                StatusCode::BAD_REQUEST
            );
        }
    }

    #[test]
    fn not_found_errors_return_404() {
        assert_eq!(
            AppError::from(DomainError::OrderNotFound)
                .error_response()
                .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(DomainError::ProductNotFound)
                .error_response()
                .status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn persistence_failure_returns_500() {
        let resp = AppError::from(DomainError::Persistence("connection lost".to_string()))
            .error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn insufficient_stock_message_names_product_and_availability() {
        let err = DomainError::InsufficientStock {
            product_id: Uuid::new_v4(),
            name: "Gadget".to_string(),
            available: 2,
        };
        assert_eq!(err.to_string(), "Insufficient stock for Gadget. Available: 2");
        assert_eq!(err.code(), "INSUFFICIENT_STOCK");
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(
            DomainError::UnknownProduct(Uuid::new_v4()).code(),
            "UNKNOWN_PRODUCT"
        );
        assert_eq!(DomainError::OrderNotFound.code(), "ORDER_NOT_FOUND");
        assert_eq!(
            DomainError::Persistence("x".to_string()).code(),
            "PERSISTENCE_FAILURE"
        );
    }
}
