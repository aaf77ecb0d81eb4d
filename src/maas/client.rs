/// MAAS API client
use reqwest::{header, Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use super::auth::MaasOAuth;
use super::error::{MaasError, Result};
use crate::config::{ConfigLookup, ConnectionOptions, Credentials};

/// Authenticated MAAS session bound to one API base URL.
///
/// Built fresh for every operation; nothing is pooled across calls.
#[derive(Clone)]
pub struct MaasClient {
    client: Client,
    base_url: Url,
    auth: MaasOAuth,
}

impl MaasClient {
    /// Resolve credentials and build a signed client.
    ///
    /// Fails with [`MaasError::Configuration`] before any request when no usable token is found.
    pub fn connect(config: &dyn ConfigLookup, options: &ConnectionOptions) -> Result<Self> {
        let credentials = options.resolve(config)?;
        Self::new(credentials)
    }

    /// Create a new MAAS API client
    pub fn new(credentials: Credentials) -> Result<Self> {
        let auth = MaasOAuth::from_token(&credentials.token)?;
        let base_url = parse_base_url(&credentials.base_url)?;

        debug!("MAAS url: {}", base_url);
        debug!("MAAS consumer key: {}", auth.consumer_key());

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| MaasError::DependencyUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            auth,
        })
    }

    #[cfg(test)]
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| MaasError::Configuration(format!("Invalid API path {}: {}", path, e)))
    }

    /// Start a request carrying a freshly signed `Authorization` header
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.endpoint(path)?;
        debug!("{} {}", method, url);

        Ok(self
            .client
            .request(method, url)
            .header(header::AUTHORIZATION, self.auth.authorization()?))
    }

    /// Make a GET request, optionally with a MAAS `op` parameter
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str, op: Option<&str>) -> Result<T> {
        let mut request = self.request(Method::GET, path)?;
        if let Some(op) = op {
            request = request.query(&[("op", op)]);
        }

        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// Make a POST request with a form body. The response body is not inspected.
    pub(crate) async fn post_form(&self, path: &str, form: &[(String, String)]) -> Result<()> {
        let response = self.request(Method::POST, path)?.form(form).send().await?;
        self.check_status(response).await.map(|_| ())
    }

    /// Make a PUT request with a form body. The response body is not inspected.
    pub(crate) async fn put_form(&self, path: &str, form: &[(String, String)]) -> Result<()> {
        let response = self.request(Method::PUT, path)?.form(form).send().await?;
        self.check_status(response).await.map(|_| ())
    }

    /// Make a DELETE request
    pub(crate) async fn delete(&self, path: &str) -> Result<()> {
        let response = self.request(Method::DELETE, path)?.send().await?;
        self.check_status(response).await.map(|_| ())
    }

    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        warn!("MAAS API returned {}: {}", status, message);
        Err(MaasError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Check the status and decode a JSON body
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let response = self.check_status(response).await?;
        let body = response.text().await?;
        debug!("Response: {}", body);

        Ok(serde_json::from_str(&body)?)
    }
}

/// Parse the API base, making sure relative joins stay below it
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| MaasError::Configuration(format!("Invalid MAAS url {:?}: {}", raw, e)))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
