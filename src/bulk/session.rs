use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::error::BulkError;

/// Status, cursor header and body of one HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub locator: Option<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }
}

/// Authenticated HTTP calls against the org. Bodies are returned for any
/// status so callers decide how a failure is reported.
#[async_trait]
pub trait BulkSession: Send + Sync {
    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpResponse, BulkError>;

    async fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
        accept: &str,
    ) -> Result<HttpResponse, BulkError>;
}

/// `reqwest`-backed session carrying the bearer token.
pub struct HttpSession {
    client: reqwest::Client,
    access_token: String,
}

impl HttpSession {
    pub fn new(access_token: String) -> Result<Self, BulkError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(300))
            .build()?;
        Ok(Self {
            client,
            access_token,
        })
    }
}

async fn into_response(resp: reqwest::Response) -> Result<HttpResponse, BulkError> {
    let status = resp.status().as_u16();
    let locator = resp
        .headers()
        .get("Sforce-Locator")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = resp.text().await?;
    Ok(HttpResponse {
        status,
        locator,
        body,
    })
}

#[async_trait]
impl BulkSession for HttpSession {
    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpResponse, BulkError> {
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await?;
        into_response(resp).await
    }

    async fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
        accept: &str,
    ) -> Result<HttpResponse, BulkError> {
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .header(reqwest::header::ACCEPT, accept)
            .query(query)
            .send()
            .await?;
        into_response(resp).await
    }
}
