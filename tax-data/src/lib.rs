//! Reference data loading and the in-memory API backend.

mod loader;
mod memory;

pub use loader::{DeductionLoaderError, StandardDeductionLoader, StandardDeductionRecord};
pub use memory::{InMemoryTaxApi, MemoryApiFactory};

/// Standard deduction amounts bundled with the client (tax years 2022-2024).
pub const BUNDLED_STANDARD_DEDUCTIONS: &str = include_str!("../data/standard_deductions.csv");
