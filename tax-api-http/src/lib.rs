//! JSON-over-HTTP client for the tax-filing service.
//!
//! | call                          | request                            |
//! |-------------------------------|------------------------------------|
//! | `login`                       | `POST /auth/login`                 |
//! | `logout`                      | `POST /auth/logout`                |
//! | `list_filing_status_options`  | `GET /filing-statuses`             |
//! | `get_standard_deductions`     | `GET /standard-deductions/{year}`  |
//! | `create_tax_return`           | `POST /tax-returns`                |
//! | `get_tax_return`              | `GET /tax-returns/{id}`            |
//! | `update_tax_return`           | `PUT /tax-returns/{id}`            |
//! | `list_tax_returns`            | `GET /tax-returns[?tax_year=Y]`    |
//!
//! Authenticated calls send `Authorization: Bearer <token>`. A 401 maps to
//! [`ApiError::Unauthorized`], a 404 to [`ApiError::NotFound`], and any other
//! non-success status to [`ApiError::Rejected`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Method, RequestBuilder, Response};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tax_core::{
    ApiConfig, ApiError, ApiFactory, Credentials, FilingStatusOption, NewTaxReturn, Session,
    StandardDeductionTable, TaxApi, TaxReturn,
};
use tracing::{debug, warn};

const USER_AGENT_VALUE: &str = concat!("tax-filer/", env!("CARGO_PKG_VERSION"));

#[derive(serde::Deserialize)]
struct LoginResponse {
    token: String,
}

/// HTTP implementation of [`TaxApi`].
#[derive(Debug, Clone)]
pub struct HttpTaxApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTaxApi {
    pub fn new(
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        if base_url.trim().is_empty() {
            return Err(ApiError::Configuration("API endpoint is empty".to_string()));
        }

        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| ApiError::Configuration(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(
        &self,
        path: &str,
    ) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(
        &self,
        method: Method,
        path: &str,
        session: &Session,
    ) -> Result<RequestBuilder, ApiError> {
        let token = session.token()?;
        Ok(self
            .client
            .request(method, self.url(path))
            .header(AUTHORIZATION, format!("Bearer {token}")))
    }

    async fn send(
        &self,
        request: RequestBuilder,
    ) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "API response");

        match status.as_u16() {
            200..=299 => Ok(response),
            401 => Err(ApiError::Unauthorized),
            404 => Err(ApiError::NotFound),
            _ => {
                let message = response
                    .text()
                    .await
                    .ok()
                    .filter(|body| !body.trim().is_empty())
                    .unwrap_or_else(|| status.to_string());
                warn!(status = status.as_u16(), %message, "API request rejected");
                Err(ApiError::Rejected {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    async fn send_body<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(request.json(body)).await
    }
}

#[async_trait]
impl TaxApi for HttpTaxApi {
    async fn login(
        &self,
        credentials: &Credentials,
    ) -> Result<Session, ApiError> {
        let request = self.client.post(self.url("/auth/login"));
        let response: LoginResponse = self.send_body(request, credentials).await?;
        debug!(username = %credentials.username, "logged in");
        Ok(Session::new(credentials.username.clone(), response.token))
    }

    async fn logout(
        &self,
        session: &mut Session,
    ) -> Result<(), ApiError> {
        let result = match self.authed(Method::POST, "/auth/logout", session) {
            Ok(request) => self.send(request).await.map(|_| ()),
            Err(ApiError::SessionInvalidated) => Ok(()),
            Err(e) => Err(e),
        };
        // Ends locally even if the service could not be reached.
        session.invalidate();
        result
    }

    async fn list_filing_status_options(
        &self,
        session: &Session,
    ) -> Result<Vec<FilingStatusOption>, ApiError> {
        let request = self.authed(Method::GET, "/filing-statuses", session)?;
        self.send_json(request).await
    }

    async fn get_standard_deductions(
        &self,
        session: &Session,
        tax_year: i32,
    ) -> Result<StandardDeductionTable, ApiError> {
        let request =
            self.authed(Method::GET, &format!("/standard-deductions/{tax_year}"), session)?;
        let amounts: HashMap<String, Decimal> = self.send_json(request).await?;
        Ok(StandardDeductionTable::from_wire(tax_year, amounts))
    }

    async fn create_tax_return(
        &self,
        session: &Session,
        tax_return: NewTaxReturn,
    ) -> Result<TaxReturn, ApiError> {
        let request = self.authed(Method::POST, "/tax-returns", session)?;
        self.send_body(request, &tax_return).await
    }

    async fn get_tax_return(
        &self,
        session: &Session,
        id: i64,
    ) -> Result<TaxReturn, ApiError> {
        let request = self.authed(Method::GET, &format!("/tax-returns/{id}"), session)?;
        self.send_json(request).await
    }

    async fn update_tax_return(
        &self,
        session: &Session,
        tax_return: &TaxReturn,
    ) -> Result<TaxReturn, ApiError> {
        let request = self.authed(
            Method::PUT,
            &format!("/tax-returns/{}", tax_return.id),
            session,
        )?;
        self.send_body(request, tax_return).await
    }

    async fn list_tax_returns(
        &self,
        session: &Session,
        tax_year: Option<i32>,
    ) -> Result<Vec<TaxReturn>, ApiError> {
        let mut request = self.authed(Method::GET, "/tax-returns", session)?;
        if let Some(year) = tax_year {
            request = request.query(&[("tax_year", year)]);
        }
        self.send_json(request).await
    }
}

/// Registers the `http` backend with an [`ApiRegistry`](tax_core::ApiRegistry).
pub struct HttpApiFactory;

#[async_trait]
impl ApiFactory for HttpApiFactory {
    fn backend_name(&self) -> &'static str {
        "http"
    }

    async fn create(
        &self,
        config: &ApiConfig,
    ) -> Result<Box<dyn TaxApi>, ApiError> {
        let api = HttpTaxApi::new(&config.endpoint, Duration::from_secs(config.timeout_secs))?;
        Ok(Box::new(api))
    }
}
