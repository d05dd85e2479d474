//! Typed request client for the RAG Studio backend.
//!
//! Every call goes through [`ApiClient::request`] (or one of its binary
//! variants), which attaches the stored credential, serializes the body and
//! folds failure responses into a single [`ApiError::Api`] kind.

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{multipart, Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::auth::{Credential, SharedCredentials};
use crate::config::ClientSettings;
use crate::models::TokenResponse;

use super::ApiError;

/// Login endpoint, relative to the API prefix
const LOGIN_PATH: &str = "auth/login";

/// Logout endpoint, relative to the API prefix
const LOGOUT_PATH: &str = "auth/logout";

/// Transport options for one request.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    /// Caller headers; these win over the client's defaults on conflict
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new(Method::GET)
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Add a query parameter only when a value is present
    #[must_use]
    pub fn query_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Serialize `body` as the JSON request body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to serialize body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }
}

/// Raw payload returned by export endpoints.
#[derive(Debug, Clone)]
pub struct Download {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    /// Parsed from `Content-Disposition` when the backend sends one
    pub filename: Option<String>,
}

/// File part of a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            mime: None,
        }
    }

    #[must_use]
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Read a file from disk, keeping only its file name
    pub async fn from_path(path: &std::path::Path) -> Result<Self, ApiError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ApiError::InvalidRequest(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        Ok(Self::new(file_name, bytes))
    }
}

/// API client for the RAG Studio backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    credentials: SharedCredentials,
    fallback_error_message: String,
}

impl ApiClient {
    pub fn new(settings: ClientSettings, credentials: SharedCredentials) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(ApiError::Transport)?;

        Ok(Self {
            client,
            base_url: settings.base_url,
            credentials,
            fallback_error_message: settings.fallback_error_message,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials(&self) -> &SharedCredentials {
        &self.credentials
    }

    /// Whether a credential is currently stored. Validity is the backend's call.
    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_present()
    }

    /// Resolve a relative endpoint path against the versioned base address
    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        let path = path.trim_start_matches('/');
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", path, e)))
    }

    fn auth_header(&self) -> Result<Option<HeaderValue>, ApiError> {
        match self.credentials.load()? {
            Some(credential) if !credential.is_blank() => Ok(Some(bearer_value(&credential)?)),
            _ => Ok(None),
        }
    }

    /// Default headers, then the credential, then caller headers on top.
    fn merged_headers(
        &self,
        caller: &HeaderMap,
        content_type: Option<&'static str>,
    ) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(content_type) = content_type {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        if let Some(auth) = self.auth_header()? {
            headers.insert(header::AUTHORIZATION, auth);
        }
        for name in caller.keys() {
            headers.remove(name);
        }
        for (name, value) in caller.iter() {
            headers.append(name.clone(), value.clone());
        }
        Ok(headers)
    }

    fn prepare(&self, path: &str, options: RequestOptions) -> Result<RequestBuilder, ApiError> {
        let url = self.url(path)?;
        let headers = self.merged_headers(&options.headers, Some("application/json"))?;
        debug!(method = %options.method, url = %url, "Sending request");

        let mut builder = self.client.request(options.method, url).headers(headers);
        if !options.query.is_empty() {
            builder = builder.query(&options.query);
        }
        if let Some(body) = options.body {
            builder = builder.body(body.to_string());
        }
        Ok(builder)
    }

    async fn send(builder: RequestBuilder) -> Result<Response, ApiError> {
        builder.send().await.map_err(ApiError::Transport)
    }

    /// Check if response is successful, returning the normalized error if not.
    async fn check_response(&self, response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = ApiError::from_response(status, &body, &self.fallback_error_message);
        warn!(status = %status, error = %err, "Request failed");
        Err(err)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let text = response.text().await.map_err(ApiError::Transport)?;
        // Bodiless successes decode as JSON null so `Option<T>` and `()` work
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(text).map_err(|e| {
            ApiError::Decode(format!("{} in body: {}", e, ApiError::truncate_body(text)))
        })
    }

    /// Perform one request and parse the success body as `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let response = Self::send(self.prepare(path, options)?).await?;
        let response = self.check_response(response).await?;
        Self::decode(response).await
    }

    /// Perform one request whose success body is ignored (e.g. 204 No Content).
    pub async fn request_empty(&self, path: &str, options: RequestOptions) -> Result<(), ApiError> {
        let response = Self::send(self.prepare(path, options)?).await?;
        let response = self.check_response(response).await?;
        if response.status() != StatusCode::NO_CONTENT {
            // Drain so the connection can be reused
            let _ = response.bytes().await;
        }
        Ok(())
    }

    /// Same contract as `request`, but returns the raw payload.
    pub async fn download(&self, path: &str, options: RequestOptions) -> Result<Download, ApiError> {
        let response = Self::send(self.prepare(path, options)?).await?;
        let response = self.check_response(response).await?;

        let content_type = header_string(response.headers(), header::CONTENT_TYPE);
        let filename = header_string(response.headers(), header::CONTENT_DISPOSITION)
            .and_then(|value| disposition_filename(&value));
        let bytes = response.bytes().await.map_err(ApiError::Transport)?.to_vec();

        debug!(bytes = bytes.len(), ?filename, "Download complete");
        Ok(Download {
            bytes,
            content_type,
            filename,
        })
    }

    /// Multipart upload: the file part first, then the string fields.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        file: UploadFile,
        fields: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = self.url(path)?;
        // reqwest writes the multipart content type with its boundary
        let headers = self.merged_headers(&HeaderMap::new(), None)?;

        let mut part = multipart::Part::bytes(file.bytes).file_name(file.file_name.clone());
        if let Some(ref mime) = file.mime {
            part = part
                .mime_str(mime)
                .map_err(|e| ApiError::InvalidRequest(format!("Invalid MIME type {}: {}", mime, e)))?;
        }
        let mut form = multipart::Form::new().part("file", part);
        for (key, value) in fields {
            form = form.text(key.to_string(), value.to_string());
        }

        debug!(url = %url, file = %file.file_name, "Uploading file");
        let builder = self.client.post(url).headers(headers).multipart(form);
        let response = Self::send(builder).await?;
        let response = self.check_response(response).await?;
        Self::decode(response).await
    }

    /// Authenticate with the backend and persist the returned token.
    ///
    /// The credentials are form-encoded, not JSON. The stored credential is
    /// only touched once the backend has accepted the login.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let url = self.url(LOGIN_PATH)?;
        let response = self
            .client
            .post(url)
            .header(header::ACCEPT, "application/json")
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(ApiError::Transport)?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            warn!(status = %status, username = username, "Login rejected");
            return Err(ApiError::Authentication);
        }
        let response = self.check_response(response).await?;
        let token: TokenResponse = Self::decode(response).await?;
        if token.access_token.trim().is_empty() {
            warn!(username = username, "Login response carried no token");
            return Err(ApiError::Decode("Login response has an empty access_token".into()));
        }

        self.credentials.store(&Credential::new(token.access_token.clone()))?;
        info!(username = username, "Login successful");
        Ok(token)
    }

    /// End the session: notify the backend if possible, then always clear
    /// the stored credential.
    ///
    /// Only a failure of the credential store itself is returned.
    pub async fn logout(&self) -> Result<(), ApiError> {
        if self.credentials.is_present() {
            if let Err(e) = self.request_empty(LOGOUT_PATH, RequestOptions::post()).await {
                warn!(error = %e, "Logout notification failed, clearing credential anyway");
            }
        }
        self.credentials.clear()?;
        info!("Logged out");
        Ok(())
    }
}

fn bearer_value(credential: &Credential) -> Result<HeaderValue, ApiError> {
    let mut value = HeaderValue::from_str(&credential.bearer())
        .map_err(|_| ApiError::InvalidRequest("Stored token is not a valid header value".into()))?;
    value.set_sensitive(true);
    Ok(value)
}

fn header_string(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Extract `filename` from a `Content-Disposition` value
fn disposition_filename(value: &str) -> Option<String> {
    value.split(';').map(str::trim).find_map(|param| {
        let (key, raw) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("filename") {
            return None;
        }
        let name = raw.trim().trim_matches('"');
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryCredentialStore;

    fn client_with(credentials: MemoryCredentialStore) -> ApiClient {
        let settings = ClientSettings::new("http://localhost:8000/api/v1").unwrap();
        ApiClient::new(settings, credentials.shared()).unwrap()
    }

    #[test]
    fn test_url_building() {
        let client = client_with(MemoryCredentialStore::new());
        assert_eq!(
            client.url("pipelines/").unwrap().as_str(),
            "http://localhost:8000/api/v1/pipelines/"
        );
        assert_eq!(
            client.url("/opensearch/health").unwrap().as_str(),
            "http://localhost:8000/api/v1/opensearch/health"
        );
    }

    #[test]
    fn test_headers_without_credential_omit_authorization() {
        let client = client_with(MemoryCredentialStore::new());
        let headers = client
            .merged_headers(&HeaderMap::new(), Some("application/json"))
            .unwrap();
        assert!(headers.get(header::AUTHORIZATION).is_none());
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_caller_headers_take_precedence() {
        let client = client_with(MemoryCredentialStore::with_credential(Credential::new("tok")));
        let mut caller = HeaderMap::new();
        caller.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        caller.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer override"));

        let headers = client.merged_headers(&caller, Some("application/json")).unwrap();
        assert_eq!(headers[header::CONTENT_TYPE], "text/plain");
        assert_eq!(headers[header::AUTHORIZATION], "Bearer override");
        assert_eq!(headers.get_all(header::AUTHORIZATION).iter().count(), 1);
    }

    #[test]
    fn test_stored_credential_becomes_bearer_header() {
        let client = client_with(MemoryCredentialStore::with_credential(Credential::new("tok")));
        let headers = client.merged_headers(&HeaderMap::new(), None).unwrap();
        assert_eq!(headers[header::AUTHORIZATION], "Bearer tok");
        assert!(headers.get(header::CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_request_options_builders() {
        let options = RequestOptions::get()
            .query("skip", 0)
            .query_opt("status", Some("active"))
            .query_opt("pipeline_type", None::<&str>);
        assert_eq!(
            options.query,
            vec![
                ("skip".to_string(), "0".to_string()),
                ("status".to_string(), "active".to_string())
            ]
        );
    }

    #[test]
    fn test_disposition_filename() {
        assert_eq!(
            disposition_filename("attachment; filename=benchmark_1.csv").as_deref(),
            Some("benchmark_1.csv")
        );
        assert_eq!(
            disposition_filename(r#"attachment; filename="report.html""#).as_deref(),
            Some("report.html")
        );
        assert_eq!(disposition_filename("inline"), None);
    }
}
