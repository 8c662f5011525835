//! Command flows driven through the library API with fixture files and the
//! in-memory backend.

use std::path::PathBuf;

use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use tax_cli::app::{self, ReturnInput, SubmitTarget};
use tax_cli::config::CliConfig;
use tax_core::{Credentials, Session, TaxApi};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

async fn connect(config: &CliConfig) -> (Box<dyn TaxApi>, Session) {
    let api = app::build_registry()
        .create(&config.api)
        .await
        .expect("backend should build");
    let credentials = Credentials {
        username: "pat".to_string(),
        password: "pw".to_string(),
    };
    let session = app::login(api.as_ref(), &credentials).await.unwrap();
    (api, session)
}

fn memory_config() -> CliConfig {
    CliConfig::from_toml_str(
        r#"
        tax_year = 2023

        [api]
        backend = "memory"
        endpoint = ""
        "#,
    )
    .unwrap()
}

#[test]
fn test_validate_accepts_complete_married_file() {
    let mut out = Vec::new();

    let valid = app::validate_file(&fixture("married_jointly.json"), &mut out).unwrap();

    assert!(valid);
    assert!(String::from_utf8(out).unwrap().contains("valid (married_jointly)"));
}

#[test]
fn test_validate_reports_blank_relationship() {
    let mut out = Vec::new();

    let valid =
        app::validate_file(&fixture("head_of_household_incomplete.json"), &mut out).unwrap();

    assert!(!valid);
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("1 error(s)"));
    assert!(text.contains("qualifying_person_relationship: Relationship to qualifying person is required"));
    assert!(!text.contains("qualifying_person_name:"));
}

#[test]
fn test_validate_fails_on_unknown_status() {
    let mut out = Vec::new();

    let err = app::validate_file(&fixture("unknown_status.json"), &mut out).unwrap_err();

    assert!(err.to_string().contains("MFJ"));
}

#[test]
fn test_validate_fails_on_missing_file() {
    let mut out = Vec::new();

    assert!(app::validate_file(&fixture("nope.json"), &mut out).is_err());
}

#[tokio::test]
async fn test_submit_married_fixture_uses_configured_year() {
    let config = memory_config();
    let (api, mut session) = connect(&config).await;
    let input = ReturnInput::from_file(&fixture("married_jointly.json")).unwrap();
    let mut out = Vec::new();

    let target = SubmitTarget::Create {
        tax_year: config.tax_year,
    };

    let saved = app::submit_return(api.as_ref(), &mut session, &input, target, &mut out)
        .await
        .unwrap();

    assert_eq!(saved.tax_year, 2023);
    assert_eq!(saved.filing.spouse_ssn, "123-45-6789");
    assert_eq!(saved.total_income, Some(dec!(118400.00)));
    assert_eq!(saved.federal_withholding, Some(dec!(14250)));
    assert_eq!(saved.refund_amount, None);
}

#[tokio::test]
async fn test_submit_drops_fields_that_do_not_apply() {
    let config = memory_config();
    let (api, mut session) = connect(&config).await;
    let input = ReturnInput::from_file(&fixture("single_with_stale_spouse.json")).unwrap();
    let mut out = Vec::new();

    let target = SubmitTarget::Create { tax_year: 2024 };

    let saved = app::submit_return(api.as_ref(), &mut session, &input, target, &mut out)
        .await
        .unwrap();

    assert_eq!(saved.filing.filing_status, "single");
    assert_eq!(saved.filing.spouse_name, "");
    assert_eq!(saved.filing.spouse_ssn, "");
}

#[tokio::test]
async fn test_update_from_file_with_numeric_amounts_keeps_year() {
    let config = memory_config();
    let (api, mut session) = connect(&config).await;
    let mut out = Vec::new();
    let married = ReturnInput::from_file(&fixture("married_jointly.json")).unwrap();
    let created = app::submit_return(
        api.as_ref(),
        &mut session,
        &married,
        SubmitTarget::Create { tax_year: 2022 },
        &mut out,
    )
    .await
    .unwrap();

    let edit = ReturnInput::from_file(&fixture("single_numeric_amounts.json")).unwrap();
    let target = SubmitTarget::Update {
        id: created.id,
        tax_year: None,
    };
    let updated = app::submit_return(api.as_ref(), &mut session, &edit, target, &mut out)
        .await
        .unwrap();

    assert_eq!(updated.tax_year, 2022);
    assert_eq!(updated.filing.filing_status, "single");
    assert_eq!(updated.total_income, Some(dec!(61250)));
    assert_eq!(updated.federal_withholding, Some(dec!(14250)));
}

#[tokio::test]
async fn test_statuses_then_returns_listing() {
    let config = memory_config();
    let (api, mut session) = connect(&config).await;
    let input = ReturnInput::from_file(&fixture("married_jointly.json")).unwrap();
    let mut sink = Vec::new();
    let target = SubmitTarget::Create { tax_year: 2024 };
    app::submit_return(api.as_ref(), &mut session, &input, target, &mut sink)
        .await
        .unwrap();

    let mut statuses = Vec::new();
    app::print_statuses(api.as_ref(), &mut session, 2024, &mut statuses)
        .await
        .unwrap();
    let mut returns = Vec::new();
    app::print_returns(api.as_ref(), &mut session, None, &mut returns)
        .await
        .unwrap();

    let statuses = String::from_utf8(statuses).unwrap();
    assert!(statuses.lines().any(|l| l.contains("married_jointly") && l.ends_with("$29,200")));
    let returns = String::from_utf8(returns).unwrap();
    assert!(returns.contains("married_jointly"));
    assert!(returns.contains("$118,400"));
    assert!(returns.contains("$14,250"));
}

#[tokio::test]
async fn test_memory_backend_reads_custom_deduction_csv() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("deductions.csv");
    std::fs::write(&csv, "tax_year,filing_status,amount\n2025,single,15000\n").unwrap();
    let mut config = memory_config();
    config.api.endpoint = csv.display().to_string();
    let (api, mut session) = connect(&config).await;
    let mut out = Vec::new();

    app::print_statuses(api.as_ref(), &mut session, 2025, &mut out)
        .await
        .unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.lines().any(|l| l.contains("single") && l.ends_with("$15,000")));
    assert!(text.lines().any(|l| l.contains("head_of_household") && l.ends_with("not available")));
}
