pub mod factory;
pub mod tax_api;

pub use factory::{ApiConfig, ApiFactory, ApiRegistry};
pub use tax_api::{ApiError, TaxApi};
