pub mod api;
pub mod form;
pub mod models;
pub mod money;
pub mod session;
pub mod validation;

pub use api::{ApiConfig, ApiError, ApiFactory, ApiRegistry, TaxApi};
pub use form::{FilingStatusForm, FormError};
pub use models::*;
pub use session::{Credentials, Session};
