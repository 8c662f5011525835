use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use rust_decimal::Decimal;
use serde::Deserialize;
use tax_api_http::HttpApiFactory;
use tax_core::money::{opt_currency_display, parse_decimal};
use tax_core::validation::{ValidationErrors, lookup_standard_deduction};
use tax_core::{
    ApiRegistry, Credentials, FilingStatusForm, FilingStatusRecord, NewTaxReturn, ReturnStatus,
    Session, TaxApi, TaxReturn,
};
use tax_data::MemoryApiFactory;
use tracing::{debug, info, warn};

/// Register every available API backend.
pub fn build_registry() -> ApiRegistry {
    let mut registry = ApiRegistry::new();
    registry.register(Box::new(HttpApiFactory));
    registry.register(Box::new(MemoryApiFactory));
    registry
}

/// A money amount from an input file: either typed the way a form field
/// holds it (`"$52,000"`, `"1200.50"`) or a bare JSON number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MoneyInput {
    Text(String),
    Amount(Decimal),
}

impl MoneyInput {
    /// `None` when the field was left blank.
    fn parse(
        &self,
        name: &str,
    ) -> Result<Option<Decimal>> {
        match self {
            MoneyInput::Amount(amount) => Ok(Some(*amount)),
            MoneyInput::Text(text) if text.trim().is_empty() => Ok(None),
            MoneyInput::Text(text) => parse_decimal(text)
                .map(Some)
                .with_context(|| format!("{name} is not a valid amount")),
        }
    }
}

fn money_field(
    name: &str,
    value: Option<&MoneyInput>,
) -> Result<Option<Decimal>> {
    value.map_or(Ok(None), |money| money.parse(name))
}

/// A return as written by hand in a JSON file: the flat filing status
/// fields plus optional money amounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReturnInput {
    #[serde(flatten)]
    pub filing: FilingStatusRecord,
    pub total_income: Option<MoneyInput>,
    pub federal_withholding: Option<MoneyInput>,
}

/// A validated input, ready to become a new return or to be merged into a
/// stored one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedReturn {
    pub filing: FilingStatusRecord,
    pub total_income: Option<Decimal>,
    pub federal_withholding: Option<Decimal>,
}

impl PreparedReturn {
    pub fn into_new(
        self,
        tax_year: i32,
    ) -> NewTaxReturn {
        NewTaxReturn {
            tax_year,
            filing: self.filing,
            total_income: self.total_income,
            federal_withholding: self.federal_withholding,
        }
    }

    /// Replaces the filing status on `existing`. The year and the money
    /// fields change only when given; blank amounts keep the stored values.
    pub fn merge_into(
        self,
        existing: &mut TaxReturn,
        tax_year: Option<i32>,
    ) {
        if let Some(year) = tax_year {
            existing.tax_year = year;
        }
        existing.filing = self.filing;
        if self.total_income.is_some() {
            existing.total_income = self.total_income;
        }
        if self.federal_withholding.is_some() {
            existing.federal_withholding = self.federal_withholding;
        }
    }
}

impl ReturnInput {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Validate and coerce, or return the per-field errors that block submission.
    pub fn prepare(&self) -> Result<Result<PreparedReturn, ValidationErrors>> {
        let mut form = FilingStatusForm::from_record(self.filing.clone())?;
        let filing = match form.submit() {
            Ok(record) => record,
            Err(errors) => return Ok(Err(errors)),
        };

        Ok(Ok(PreparedReturn {
            filing,
            total_income: money_field("total_income", self.total_income.as_ref())?,
            federal_withholding: money_field(
                "federal_withholding",
                self.federal_withholding.as_ref(),
            )?,
        }))
    }
}

/// Where a submission goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTarget {
    Create { tax_year: i32 },
    /// `tax_year: None` keeps the stored year.
    Update { id: i64, tax_year: Option<i32> },
}

/// Log in with `credentials`, failing early with a hint when they are incomplete.
pub async fn login(
    api: &dyn TaxApi,
    credentials: &Credentials,
) -> Result<Session> {
    if credentials.username.is_empty() {
        bail!("no username configured; pass --username or set [credentials] username");
    }
    if credentials.password.is_empty() {
        bail!("no password configured; set TAX_FILER_PASSWORD");
    }

    let session = api
        .login(credentials)
        .await
        .with_context(|| format!("login failed for '{}'", credentials.username))?;
    info!(username = %session.username(), "logged in");
    Ok(session)
}

/// Print each filing status option with its standard deduction for `tax_year`.
pub async fn print_statuses(
    api: &dyn TaxApi,
    session: &mut Session,
    tax_year: i32,
    out: &mut impl Write,
) -> Result<()> {
    let result = api.list_filing_status_options(session).await;
    let options = session.observe(result).context("Failed to load filing statuses")?;
    let result = api.get_standard_deductions(session, tax_year).await;
    let table = session
        .observe(result)
        .with_context(|| format!("Failed to load standard deductions for {tax_year}"))?;

    if table.is_empty() {
        warn!(tax_year, "no standard deduction data");
    }

    writeln!(out, "Filing statuses for tax year {tax_year}:")?;
    for option in &options {
        let amount = match option.code() {
            Ok(code) => lookup_standard_deduction(&table, code).to_string(),
            Err(e) => {
                warn!(value = %option.value, error = %e, "skipping deduction lookup");
                "not available".to_string()
            }
        };
        writeln!(out, "  {:<20} {:<28} {}", option.value, option.label, amount)?;
        if !option.description.is_empty() {
            writeln!(out, "  {:<20} {}", "", option.description)?;
        }
    }
    Ok(())
}

/// Print the inline errors for the record in `path`. Returns whether it is valid.
pub fn validate_file(
    path: &Path,
    out: &mut impl Write,
) -> Result<bool> {
    let input = ReturnInput::from_file(path)?;
    let mut form = FilingStatusForm::from_record(input.filing)?;
    let errors = form.validate();

    if errors.is_empty() {
        writeln!(out, "{}: valid ({})", path.display(), form.selection().code())?;
        return Ok(true);
    }

    writeln!(out, "{}: {} error(s)", path.display(), errors.len())?;
    write_errors(errors, out)?;
    Ok(false)
}

fn write_errors(
    errors: &ValidationErrors,
    out: &mut impl Write,
) -> Result<()> {
    for (field, message) in errors {
        writeln!(out, "  {field}: {message}")?;
    }
    Ok(())
}

/// Validate `input` and create a new return or update a stored one.
pub async fn submit_return(
    api: &dyn TaxApi,
    session: &mut Session,
    input: &ReturnInput,
    target: SubmitTarget,
    out: &mut impl Write,
) -> Result<TaxReturn> {
    let prepared = match input.prepare()? {
        Ok(prepared) => prepared,
        Err(errors) => {
            writeln!(out, "Submission blocked:")?;
            write_errors(&errors, out)?;
            bail!("filing status has {} error(s)", errors.len());
        }
    };

    let saved = match target {
        SubmitTarget::Create { tax_year } => {
            let result = api.create_tax_return(session, prepared.into_new(tax_year)).await;
            session.observe(result).context("Failed to create tax return")?
        }
        SubmitTarget::Update { id, tax_year } => {
            let result = api.get_tax_return(session, id).await;
            let mut existing = session
                .observe(result)
                .with_context(|| format!("Failed to load tax return {id}"))?;
            debug!(id, from = %existing.filing.filing_status, to = %prepared.filing.filing_status, "updating return");
            prepared.merge_into(&mut existing, tax_year);

            let result = api.update_tax_return(session, &existing).await;
            session
                .observe(result)
                .with_context(|| format!("Failed to update tax return {id}"))?
        }
    };

    info!(id = saved.id, tax_year = saved.tax_year, "return saved");
    writeln!(out, "Saved return #{}", saved.id)?;
    write_return(&saved, out)?;
    Ok(saved)
}

/// Print the caller's returns, optionally limited to one tax year.
pub async fn print_returns(
    api: &dyn TaxApi,
    session: &mut Session,
    tax_year: Option<i32>,
    out: &mut impl Write,
) -> Result<()> {
    let result = api.list_tax_returns(session, tax_year).await;
    let returns = session.observe(result).context("Failed to list tax returns")?;

    if returns.is_empty() {
        writeln!(out, "No tax returns found.")?;
        return Ok(());
    }
    for tax_return in &returns {
        write_return(tax_return, out)?;
    }
    Ok(())
}

fn write_return(
    tax_return: &TaxReturn,
    out: &mut impl Write,
) -> Result<()> {
    writeln!(
        out,
        "#{:<5} {} {:<10} {:<20} income {:<12} withheld {:<12} refund {:<12} owed {}",
        tax_return.id,
        tax_return.tax_year,
        status_label(tax_return.status),
        tax_return.filing.filing_status,
        opt_currency_display(tax_return.total_income),
        opt_currency_display(tax_return.federal_withholding),
        opt_currency_display(tax_return.refund_amount),
        opt_currency_display(tax_return.tax_owed),
    )?;
    Ok(())
}

fn status_label(status: ReturnStatus) -> &'static str {
    match status {
        ReturnStatus::Draft => "draft",
        ReturnStatus::Submitted => "submitted",
        ReturnStatus::Accepted => "accepted",
        ReturnStatus::Rejected => "rejected",
    }
}
