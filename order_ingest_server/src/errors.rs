use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use oig_common::EnvVarError;
use order_ingest_engine::OrderFlowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("The order consumer failed. {0}")]
    ConsumerError(String),
    #[error("Invalid request. {0}")]
    InvalidRequest(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InitializeError(_) |
            Self::ConfigurationError(_) |
            Self::BackendError(_) |
            Self::ConsumerError(_) |
            Self::IOError(_) |
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<EnvVarError> for ServerError {
    fn from(e: EnvVarError) -> Self {
        Self::ConfigurationError(e.to_string())
    }
}

impl<E: std::error::Error + 'static> From<OrderFlowError<E>> for ServerError {
    fn from(e: OrderFlowError<E>) -> Self {
        match e {
            OrderFlowError::OrderNotFound(uid) => Self::NoRecordFound(format!("Order {uid} does not exist")),
            OrderFlowError::InvalidOrder(e) => Self::InvalidRequest(e.to_string()),
            OrderFlowError::StoreError(e) => Self::BackendError(e.to_string()),
            OrderFlowError::CacheError(e) => Self::BackendError(e.to_string()),
        }
    }
}
