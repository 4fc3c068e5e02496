use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use checkout_engine::CheckoutApiError;
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("{0}")]
    InvalidRequestBody(String),
    #[error("{0}")]
    NoRecordFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    PaymentNotConfirmed(String),
    #[error("{0}")]
    Forbidden(String),
    /// Invoice webhooks for invoices we never issued. Answered with an empty 405.
    #[error("No order is linked to invoice {0}")]
    UnknownInvoice(String),
    /// Any failure on the invoice creation route. The route reports every failure as a 500.
    #[error("{0}")]
    InvoiceCreationError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::PaymentNotConfirmed(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::UnknownInvoice(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InvoiceCreationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let Self::UnknownInvoice(_) = self {
            return HttpResponse::build(self.status_code()).finish();
        }
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "success": false, "message": self.to_string() }).to_string())
    }
}

impl From<CheckoutApiError> for ServerError {
    fn from(e: CheckoutApiError) -> Self {
        match e {
            CheckoutApiError::Validation(msg) => Self::InvalidRequestBody(msg),
            CheckoutApiError::PayerNotFound(_) |
            CheckoutApiError::AuctionNotFound(_) |
            CheckoutApiError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            CheckoutApiError::UnknownInvoice(id) => Self::UnknownInvoice(id),
            CheckoutApiError::AuctionAlreadyCompleted(_) | CheckoutApiError::AuctionNotPayable { .. } => {
                Self::Conflict(e.to_string())
            },
            CheckoutApiError::ChargeNotConfirmed(_) => Self::PaymentNotConfirmed(e.to_string()),
            CheckoutApiError::ChargeOwnershipMismatch(_) => Self::Forbidden(e.to_string()),
            CheckoutApiError::Processor(_) => Self::BackendError(e.to_string()),
            CheckoutApiError::Database(_) => Self::BackendError(e.to_string()),
            CheckoutApiError::PersistenceAfterCapture { .. } => {
                error!("💻️ {e}");
                Self::BackendError("Payment confirmation failed".to_string())
            },
        }
    }
}
