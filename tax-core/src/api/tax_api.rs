use async_trait::async_trait;
use thiserror::Error;

use crate::models::{FilingStatusOption, NewTaxReturn, StandardDeductionTable, TaxReturn};
use crate::session::{Credentials, Session};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Record not found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Session has been invalidated; log in again")]
    SessionInvalidated,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The service answered with a non-success status other than 401/404.
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Remote tax-filing service.
///
/// Every call except `login` takes the caller's [`Session`]; implementations
/// return [`ApiError::SessionInvalidated`] for a session that has ended and
/// [`ApiError::Unauthorized`] when the service rejects the token.
#[async_trait]
pub trait TaxApi: Send + Sync {
    // Session
    async fn login(&self, credentials: &Credentials) -> Result<Session, ApiError>;
    async fn logout(&self, session: &mut Session) -> Result<(), ApiError>;

    // Reference data
    async fn list_filing_status_options(
        &self,
        session: &Session,
    ) -> Result<Vec<FilingStatusOption>, ApiError>;

    async fn get_standard_deductions(
        &self,
        session: &Session,
        tax_year: i32,
    ) -> Result<StandardDeductionTable, ApiError>;

    // Tax returns
    async fn create_tax_return(
        &self,
        session: &Session,
        tax_return: NewTaxReturn,
    ) -> Result<TaxReturn, ApiError>;

    async fn get_tax_return(&self, session: &Session, id: i64) -> Result<TaxReturn, ApiError>;

    async fn update_tax_return(
        &self,
        session: &Session,
        tax_return: &TaxReturn,
    ) -> Result<TaxReturn, ApiError>;

    async fn list_tax_returns(
        &self,
        session: &Session,
        tax_year: Option<i32>,
    ) -> Result<Vec<TaxReturn>, ApiError>;
}
