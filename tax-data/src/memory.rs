//! In-memory [`TaxApi`] backend.
//!
//! Serves the bundled (or a supplied) standard deduction CSV and the five
//! built-in filing status options, and keeps tax returns in process memory.
//! Used for offline runs and for tests that need a working API.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tax_core::validation;
use tax_core::{
    ApiConfig, ApiError, ApiFactory, Credentials, FilingStatusCode, FilingStatusOption,
    FilingStatusSelection, NewTaxReturn, ReturnStatus, Session, StandardDeductionTable, TaxApi,
    TaxReturn,
};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::BUNDLED_STANDARD_DEDUCTIONS;
use crate::loader::{DeductionLoaderError, StandardDeductionLoader};

pub struct InMemoryTaxApi {
    options: Vec<FilingStatusOption>,
    deductions: BTreeMap<i32, StandardDeductionTable>,
    tokens: RwLock<HashSet<String>>,
    returns: RwLock<BTreeMap<i64, TaxReturn>>,
    next_id: AtomicI64,
}

impl InMemoryTaxApi {
    pub fn new(deductions: BTreeMap<i32, StandardDeductionTable>) -> Self {
        Self {
            options: FilingStatusCode::ALL
                .into_iter()
                .map(FilingStatusOption::for_code)
                .collect(),
            deductions,
            tokens: RwLock::new(HashSet::new()),
            returns: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Backend seeded with the bundled 2022-2024 deduction tables.
    pub fn with_bundled_data() -> Result<Self, DeductionLoaderError> {
        let tables = StandardDeductionLoader::load(BUNDLED_STANDARD_DEDUCTIONS.as_bytes())?;
        Ok(Self::new(tables))
    }

    async fn authorize(
        &self,
        session: &Session,
    ) -> Result<(), ApiError> {
        let token = session.token()?;
        if self.tokens.read().await.contains(token) {
            Ok(())
        } else {
            Err(ApiError::Unauthorized)
        }
    }

    /// Rejects the record the way the remote service would: unknown status
    /// values and missing required fields answer 422.
    fn check_filing(
        &self,
        tax_return: &NewTaxReturn,
    ) -> Result<(), ApiError> {
        let selection = FilingStatusSelection::try_from(tax_return.filing.clone()).map_err(|e| {
            ApiError::Rejected {
                status: 422,
                message: e.to_string(),
            }
        })?;

        let errors = validation::validate(&selection);
        if errors.is_empty() {
            Ok(())
        } else {
            let message = errors
                .iter()
                .map(|(field, msg)| format!("{field}: {msg}"))
                .collect::<Vec<_>>()
                .join("; ");
            Err(ApiError::Rejected {
                status: 422,
                message,
            })
        }
    }
}

#[async_trait]
impl TaxApi for InMemoryTaxApi {
    async fn login(
        &self,
        credentials: &Credentials,
    ) -> Result<Session, ApiError> {
        if credentials.username.trim().is_empty() || credentials.password.is_empty() {
            return Err(ApiError::Unauthorized);
        }

        let token = format!(
            "memory-{}-{}",
            credentials.username,
            self.next_id.fetch_add(1, Ordering::SeqCst)
        );
        self.tokens.write().await.insert(token.clone());
        info!(username = %credentials.username, "memory backend login");
        Ok(Session::new(credentials.username.clone(), token))
    }

    async fn logout(
        &self,
        session: &mut Session,
    ) -> Result<(), ApiError> {
        if let Ok(token) = session.token() {
            self.tokens.write().await.remove(token);
        }
        session.invalidate();
        Ok(())
    }

    async fn list_filing_status_options(
        &self,
        session: &Session,
    ) -> Result<Vec<FilingStatusOption>, ApiError> {
        self.authorize(session).await?;
        Ok(self.options.clone())
    }

    async fn get_standard_deductions(
        &self,
        session: &Session,
        tax_year: i32,
    ) -> Result<StandardDeductionTable, ApiError> {
        self.authorize(session).await?;
        Ok(self.deductions.get(&tax_year).cloned().unwrap_or_else(|| {
            debug!(tax_year, "no standard deduction data for year");
            StandardDeductionTable::new(tax_year)
        }))
    }

    async fn create_tax_return(
        &self,
        session: &Session,
        tax_return: NewTaxReturn,
    ) -> Result<TaxReturn, ApiError> {
        self.authorize(session).await?;
        self.check_filing(&tax_return)?;

        let now = Utc::now();
        let created = TaxReturn {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            tax_year: tax_return.tax_year,
            filing: tax_return.filing,
            total_income: tax_return.total_income,
            federal_withholding: tax_return.federal_withholding,
            refund_amount: None,
            tax_owed: None,
            status: ReturnStatus::Draft,
            created_at: now,
            updated_at: now,
        };

        self.returns.write().await.insert(created.id, created.clone());
        debug!(id = created.id, tax_year = created.tax_year, "tax return created");
        Ok(created)
    }

    async fn get_tax_return(
        &self,
        session: &Session,
        id: i64,
    ) -> Result<TaxReturn, ApiError> {
        self.authorize(session).await?;
        self.returns
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(ApiError::NotFound)
    }

    async fn update_tax_return(
        &self,
        session: &Session,
        tax_return: &TaxReturn,
    ) -> Result<TaxReturn, ApiError> {
        self.authorize(session).await?;

        let update = NewTaxReturn {
            tax_year: tax_return.tax_year,
            filing: tax_return.filing.clone(),
            total_income: tax_return.total_income,
            federal_withholding: tax_return.federal_withholding,
        };
        self.check_filing(&update)?;

        let mut returns = self.returns.write().await;
        let stored = returns.get_mut(&tax_return.id).ok_or(ApiError::NotFound)?;
        stored.apply(update);
        stored.updated_at = Utc::now();
        debug!(id = stored.id, "tax return updated");
        Ok(stored.clone())
    }

    async fn list_tax_returns(
        &self,
        session: &Session,
        tax_year: Option<i32>,
    ) -> Result<Vec<TaxReturn>, ApiError> {
        self.authorize(session).await?;
        Ok(self
            .returns
            .read()
            .await
            .values()
            .filter(|r| tax_year.is_none_or(|year| r.tax_year == year))
            .cloned()
            .collect())
    }
}

/// Registers the `memory` backend. A non-empty `endpoint` is read as the
/// path of a standard deduction CSV; otherwise the bundled data is used.
pub struct MemoryApiFactory;

#[async_trait]
impl ApiFactory for MemoryApiFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(
        &self,
        config: &ApiConfig,
    ) -> Result<Box<dyn TaxApi>, ApiError> {
        let endpoint = config.endpoint.trim();
        let api = if endpoint.is_empty() {
            InMemoryTaxApi::with_bundled_data()
        } else {
            StandardDeductionLoader::load_file(Path::new(endpoint)).map(InMemoryTaxApi::new)
        }
        .map_err(|e| ApiError::Configuration(e.to_string()))?;

        Ok(Box::new(api))
    }
}
