// src/ocr.rs

use crate::config::{OcrBackend, OcrSection};
use crate::error::{Error, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{info, warn};

/// Anything that can turn a screenshot image into raw text.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image: &[u8], language: &str) -> Result<String>;
}

/// Runs the `tesseract` binary, piping the image through stdin.
pub struct TesseractCli {
    binary: String,
}

impl TesseractCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractCli {
    async fn recognize(&self, image: &[u8], language: &str) -> Result<String> {
        info!(binary = %self.binary, bytes = image.len(), language, "Running tesseract");

        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "-l", language])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::ocr(format!("failed to start {}: {e}", self.binary)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::ocr("tesseract stdin unavailable"))?;
        stdin.write_all(image).await?;
        drop(stdin);

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        info!(chars = text.len(), "Tesseract finished");
        Ok(text)
    }
}

#[derive(Debug, Serialize)]
struct OcrRequest<'a> {
    image: String,
    language: &'a str,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    text: String,
}

/// Posts the image to an HTTP recognition service at `<base_url>/ocr`.
pub struct RemoteOcr {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl RemoteOcr {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/ocr", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl OcrEngine for RemoteOcr {
    async fn recognize(&self, image: &[u8], language: &str) -> Result<String> {
        let url = self.endpoint();
        info!(url = %url, bytes = image.len(), language, "Sending image to remote OCR");

        let request = OcrRequest {
            image: STANDARD.encode(image),
            language,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }
        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ocr(format!("OCR API error {status}: {body}")));
        }

        let parsed: OcrResponse = response.json().await?;
        Ok(parsed.text)
    }
}

/// Pick the OCR backend named in the config.
pub fn engine_from_config(cfg: &OcrSection) -> Box<dyn OcrEngine> {
    match cfg.backend {
        OcrBackend::Tesseract => {
            info!(binary = %cfg.tesseract.binary, "Using tesseract backend");
            Box::new(TesseractCli::new(cfg.tesseract.binary.clone()))
        }
        OcrBackend::Remote => {
            let api_key = std::env::var("OCR_API_KEY").ok();
            if api_key.is_none() {
                warn!("OCR_API_KEY not set, calling remote OCR without credentials");
            }
            info!(url = %cfg.remote.base_url, "Using remote OCR backend");
            Box::new(RemoteOcr::new(cfg.remote.base_url.clone(), api_key))
        }
    }
}
