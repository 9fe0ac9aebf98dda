use std::fmt;
use std::time::Duration;

use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, StatusCode};
use tokio::runtime::Runtime;

use crate::models::PhotoFile;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FormField {
    Text { name: String, value: String },
    File { name: String, file: PhotoFile },
}

/// An ordered multipart body, as the upload form would send it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UploadRequest {
    fields: Vec<FormField>,
}

impl UploadRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.fields.push(FormField::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn file(&mut self, name: impl Into<String>, file: &PhotoFile) -> &mut Self {
        self.fields.push(FormField::File {
            name: name.into(),
            file: file.clone(),
        });
        self
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn text_values(&self, field: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter_map(|entry| match entry {
                FormField::Text { name, value } if name == field => Some(value.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn files(&self, field: &str) -> Vec<&PhotoFile> {
        self.fields
            .iter()
            .filter_map(|entry| match entry {
                FormField::File { name, file } if name == field => Some(file),
                _ => None,
            })
            .collect()
    }

    pub fn total_file_bytes(&self) -> u64 {
        self.fields
            .iter()
            .map(|entry| match entry {
                FormField::File { file, .. } => file.size,
                FormField::Text { .. } => 0,
            })
            .sum()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ArchiveResponse {
    pub bytes: Vec<u8>,
    pub file_name: Option<String>,
}

#[derive(Debug)]
pub enum TransportError {
    Timeout,
    Status(u16),
    Network(String),
    Io(std::io::Error),
    Setup(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "Upload timeout"),
            Self::Status(code) => write!(f, "Server error: {code}"),
            Self::Network(message) => write!(f, "Network error: {message}"),
            Self::Io(err) => write!(f, "could not read photo: {err}"),
            Self::Setup(message) => write!(f, "http client setup failed: {message}"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<std::io::Error> for TransportError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            Self::Timeout
        } else if let Some(status) = value.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Network(value.to_string())
        }
    }
}

/// Posts a multipart request and hands back the archive the server answers with.
pub trait ArchiveTransport {
    fn post_archive(&self, request: &UploadRequest) -> Result<ArchiveResponse, TransportError>;
}

/// Blocking facade over reqwest. Owns a tokio runtime so callers can stay
/// synchronous and requests run one at a time.
pub struct ReqwestClient {
    client: reqwest::Client,
    runtime: Runtime,
    endpoint: String,
}

impl ReqwestClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent("PhotoRenamer/0.1")
            .timeout(timeout)
            .build()
            .map_err(|err| TransportError::Setup(err.to_string()))?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .worker_threads(1)
            .thread_name("photo-renamer-http")
            .build()
            .map_err(|err| TransportError::Setup(err.to_string()))?;

        Ok(Self {
            client,
            runtime,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Photo parts stream from disk; only the text fields are held in memory.
    async fn build_form(request: &UploadRequest) -> Result<Form, TransportError> {
        let mut form = Form::new();

        for field in request.fields() {
            form = match field {
                FormField::Text { name, value } => form.text(name.clone(), value.clone()),
                FormField::File { name, file } => {
                    let handle = tokio::fs::File::open(&file.path).await?;
                    let length = handle.metadata().await?.len();
                    let part = Part::stream_with_length(Body::from(handle), length)
                        .file_name(file.name.clone())
                        .mime_str(&file.mime)?;
                    form.part(name.clone(), part)
                }
            };
        }

        Ok(form)
    }
}

impl ArchiveTransport for ReqwestClient {
    fn post_archive(&self, request: &UploadRequest) -> Result<ArchiveResponse, TransportError> {
        log::debug!(
            "POST {} ({} field(s), {} bytes of photos)",
            self.endpoint,
            request.fields().len(),
            request.total_file_bytes()
        );

        self.runtime.block_on(async move {
            let form = Self::build_form(request).await?;
            let response = self
                .client
                .post(&self.endpoint)
                .multipart(form)
                .send()
                .await?;

            let status = response.status();
            if status != StatusCode::OK {
                return Err(TransportError::Status(status.as_u16()));
            }

            let file_name = response
                .headers()
                .get(CONTENT_DISPOSITION)
                .and_then(|value| value.to_str().ok())
                .and_then(filename_from_disposition);

            let bytes = response.bytes().await?;
            Ok::<_, TransportError>(ArchiveResponse {
                bytes: bytes.to_vec(),
                file_name,
            })
        })
    }
}

/// Pulls `filename=` out of a `Content-Disposition` header value.
pub fn filename_from_disposition(value: &str) -> Option<String> {
    value
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}
