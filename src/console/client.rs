use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::models::{LoanWithUsername, OrderWithUsername, Product, PublicUser, WeatherAlert};
use crate::models::{LoanStatus, LoginResponse, OrderStatus, Role, StatusUpdateRequest};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server answered {status}: {message}")]
    Status { status: StatusCode, message: String },
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    errors: Option<Vec<FieldMessage>>,
}

#[derive(Deserialize)]
struct FieldMessage {
    field: String,
    message: String,
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
    role: Role,
}

/// Talks to the AgroManage API, attaching the stored bearer token to each call.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        ApiClient {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Signs in and keeps the issued token for later calls.
    pub async fn login(
        &mut self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<PublicUser, ClientError> {
        let body = Credentials {
            username,
            password,
            role,
        };
        let response: LoginResponse = self
            .send(self.request(Method::POST, "/api/auth/login").json(&body))
            .await?;
        self.token = Some(response.token);
        Ok(response.user)
    }

    pub async fn admin_loans(&self) -> Result<Vec<LoanWithUsername>, ClientError> {
        self.send(self.request(Method::GET, "/api/loans/admin")).await
    }

    pub async fn update_loan_status(&self, id: i32, status: LoanStatus) -> Result<(), ClientError> {
        let body = StatusUpdateRequest {
            status: status.to_string(),
        };
        let path = format!("/api/loans/admin/{id}");
        self.send::<serde_json::Value>(self.request(Method::PUT, &path).json(&body))
            .await
            .map(|_| ())
    }

    pub async fn admin_orders(&self) -> Result<Vec<OrderWithUsername>, ClientError> {
        self.send(self.request(Method::GET, "/api/orders/admin")).await
    }

    pub async fn update_order_status(
        &self,
        id: i32,
        status: OrderStatus,
    ) -> Result<(), ClientError> {
        let body = StatusUpdateRequest {
            status: status.to_string(),
        };
        let path = format!("/api/orders/admin/{id}");
        self.send::<serde_json::Value>(self.request(Method::PUT, &path).json(&body))
            .await
            .map(|_| ())
    }

    pub async fn products(&self) -> Result<Vec<Product>, ClientError> {
        self.send(self.request(Method::GET, "/api/products")).await
    }

    pub async fn weather_alerts(&self) -> Result<Vec<WeatherAlert>, ClientError> {
        self.send(self.request(Method::GET, "/api/weather")).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(ErrorBody {
                error: Some(error), ..
            }) => error,
            Ok(ErrorBody {
                errors: Some(fields),
                ..
            }) => fields
                .iter()
                .map(|f| format!("{}: {}", f.field, f.message))
                .collect::<Vec<_>>()
                .join("; "),
            _ => text,
        };
        Err(ClientError::Status { status, message })
    }
}
