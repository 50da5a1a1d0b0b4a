use std::path::Path;
use std::time::Duration;

use classify_logging::{classify_debug, classify_info};
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};

use crate::{
    ClassifyError, ClassifyOutput, CycleId, CycleProgress, EngineEvent, FailureKind,
    ResponseMetadata, Stage,
};

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/classify/";

#[derive(Debug, Clone)]
pub struct ClassifySettings {
    pub endpoint: String,
    /// Multipart field the file is attached under.
    pub form_field: String,
    pub connect_timeout: Duration,
    /// `None` waits for the service as long as it takes.
    pub request_timeout: Option<Duration>,
    pub max_bytes: u64,
}

impl Default for ClassifySettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            form_field: "file".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            max_bytes: 50 * 1024 * 1024,
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[async_trait::async_trait]
pub trait Classifier: Send + Sync {
    /// Upload the file at `path` and return the endpoint's raw answer.
    async fn classify(
        &self,
        cycle: CycleId,
        path: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<ClassifyOutput, ClassifyError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestClassifier {
    settings: ClassifySettings,
}

impl ReqwestClassifier {
    pub fn new(settings: ClassifySettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ClassifySettings {
        &self.settings
    }

    fn build_client(&self) -> Result<reqwest::Client, ClassifyError> {
        let mut builder = reqwest::Client::builder().connect_timeout(self.settings.connect_timeout);
        if let Some(timeout) = self.settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        builder
            .build()
            .map_err(|err| ClassifyError::new(FailureKind::Network, err.to_string()))
    }

    fn too_large(&self, actual: u64) -> ClassifyError {
        ClassifyError::new(
            FailureKind::TooLarge {
                max_bytes: self.settings.max_bytes,
                actual: Some(actual),
            },
            "response too large",
        )
    }
}

#[async_trait::async_trait]
impl Classifier for ReqwestClassifier {
    async fn classify(
        &self,
        cycle: CycleId,
        path: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<ClassifyOutput, ClassifyError> {
        let endpoint = reqwest::Url::parse(&self.settings.endpoint)
            .map_err(|err| ClassifyError::new(FailureKind::InvalidEndpoint, err.to_string()))?;

        sink.emit(progress(cycle, Stage::Reading, None));
        let content = tokio::fs::read(path).await.map_err(|err| {
            ClassifyError::new(
                FailureKind::FileUnreadable,
                format!("{}: {err}", path.display()),
            )
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.csv".to_string());
        let uploaded_bytes = content.len() as u64;

        let part = Part::bytes(content)
            .file_name(file_name.clone())
            .mime_str("text/csv")
            .map_err(map_reqwest_error)?;
        let form = Form::new().part(self.settings.form_field.clone(), part);
        let client = self.build_client()?;

        classify_info!(
            "Cycle {} uploading {} ({} bytes) to {}",
            cycle,
            file_name,
            uploaded_bytes,
            endpoint
        );
        sink.emit(progress(cycle, Stage::Uploading, Some(uploaded_bytes)));

        let response = client
            .post(endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                status.to_string()
            } else {
                body
            };
            return Err(ClassifyError::new(
                FailureKind::HttpStatus(status.as_u16()),
                message,
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(self.too_large(content_len));
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        sink.emit(progress(cycle, Stage::Receiving, Some(0)));

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(self.too_large(next_len));
            }
            bytes.extend_from_slice(&chunk);
            sink.emit(progress(cycle, Stage::Receiving, Some(bytes.len() as u64)));
        }
        classify_debug!("Cycle {} received {} bytes", cycle, bytes.len());

        let metadata = ResponseMetadata {
            endpoint: endpoint.to_string(),
            file_name,
            uploaded_bytes,
            status: status.as_u16(),
            content_type,
            byte_len: bytes.len() as u64,
        };

        Ok(ClassifyOutput { bytes, metadata })
    }
}

fn progress(cycle: CycleId, stage: Stage, bytes: Option<u64>) -> EngineEvent {
    EngineEvent::Progress(CycleProgress {
        cycle,
        stage,
        bytes,
    })
}

fn map_reqwest_error(err: reqwest::Error) -> ClassifyError {
    if err.is_timeout() {
        return ClassifyError::new(FailureKind::Timeout, err.to_string());
    }
    ClassifyError::new(FailureKind::Network, err.to_string())
}
