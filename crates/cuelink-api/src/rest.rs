// REST client for the device's `/api/` endpoints.
//
// Every store and command path is relative to one base URL
// (`http://{host}:{port}/api/` unless overridden). Bodies go out as JSON;
// responses come back as JSON or empty. Non-2xx answers become
// `Error::Http` with a short body preview.

use std::path::Path;

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::{ClientConfig, TransportConfig};

/// Characters of an error body kept in [`Error::Http`].
const BODY_PREVIEW: usize = 200;

/// Multipart part name the device expects for uploaded files.
const UPLOAD_PART: &str = "files";

/// One file in a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, keeping its base name.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_owned(), |n| n.to_string_lossy().into_owned());
        Ok(Self { file_name, bytes })
    }
}

/// Raw HTTP client for the device REST API.
///
/// Cheap to clone-by-rebuild; the channel swaps in a fresh one on every
/// `connect` so the base always matches the current address.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base: Url,
}

impl RestClient {
    /// Build a client for a device address.
    pub fn new(config: &ClientConfig, transport: &TransportConfig) -> Result<Self, Error> {
        let base = transport.api_base_for(config)?;
        Ok(Self::with_client(transport.build_client()?, base))
    }

    /// Wrap a pre-built `reqwest::Client` and an explicit API base.
    pub fn with_client(http: reqwest::Client, base: Url) -> Self {
        Self { http, base }
    }

    /// The base every path resolves against.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolve `path` against the API base. A leading `/` is ignored so
    /// callers can't escape the `/api/` prefix by accident.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a request with an optional JSON body and decode the response.
    ///
    /// An empty response body decodes as JSON `null`, so `T = Value` or
    /// `T = ()` work for endpoints that answer with nothing.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("{method} {url}");

        let mut builder = self.http.request(method, url);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let resp = builder.send().await?;
        parse_response(resp).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, Error> {
        self.request(Method::POST, path, body).await
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, Error> {
        self.request(Method::PUT, path, body).await
    }

    pub async fn patch<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, Error> {
        self.request(Method::PATCH, path, body).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.request(Method::DELETE, path, None).await
    }

    /// Multipart POST: one `files` part per file, then one text part per
    /// entry of `fields`. String values are sent verbatim; everything else
    /// is serialized as JSON text.
    pub async fn upload_files<T: DeserializeOwned>(
        &self,
        path: &str,
        files: Vec<UploadFile>,
        fields: Option<&Value>,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url} (multipart, {} file(s))", files.len());

        let mut form = Form::new();
        for file in files {
            trace!(file = %file.file_name, size = file.bytes.len(), "adding upload part");
            form = form.part(UPLOAD_PART, Part::bytes(file.bytes).file_name(file.file_name));
        }
        if let Some(Value::Object(fields)) = fields {
            for (key, value) in fields {
                form = form.text(key.clone(), field_text(value));
            }
        }

        let resp = self.http.post(url).multipart(form).send().await?;
        parse_response(resp).await
    }
}

fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW).collect()
}

async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Http {
            status: status.as_u16(),
            body: preview(&body),
        });
    }

    let body = resp.text().await?;
    if body.trim().is_empty() {
        return serde_json::from_value(Value::Null).map_err(|e| Error::Deserialization {
            message: format!("{e} (empty body)"),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(&body)),
        body,
    })
}
