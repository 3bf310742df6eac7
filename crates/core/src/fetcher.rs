use crate::error::IngestError;
use crate::extractor::{LopdfExtractor, PdfExtractor};
use crate::models::{DocumentFingerprint, FetchedDocument};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use url::Url;

#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, IngestError>;
}

/// Downloads a PDF over HTTP(S) and extracts its page text.
pub struct HttpPdfFetcher<X = LopdfExtractor> {
    client: Client,
    extractor: X,
}

impl HttpPdfFetcher {
    pub fn new(client: Client) -> Self {
        Self::with_extractor(client, LopdfExtractor)
    }
}

impl<X: PdfExtractor> HttpPdfFetcher<X> {
    pub fn with_extractor(client: Client, extractor: X) -> Self {
        Self { client, extractor }
    }
}

#[async_trait]
impl<X: PdfExtractor> DocumentFetcher for HttpPdfFetcher<X> {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, IngestError> {
        let parsed = parse_document_url(url)?;
        info!(url = %parsed, "downloading pdf");

        let response = self.client.get(parsed.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(url = %parsed, status = status.as_u16(), "document download failed");
            return Err(IngestError::FetchStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        let pages = self.extractor.extract_pages(&bytes)?;
        if pages.is_empty() {
            return Err(IngestError::NoReadableText(url.to_string()));
        }

        let fingerprint = DocumentFingerprint {
            source_url: url.to_string(),
            checksum: digest_bytes(&bytes),
            byte_len: bytes.len(),
            page_count: pages.len(),
            fetched_at: Utc::now(),
        };
        info!(
            url = %parsed,
            pages = pages.len(),
            checksum = %fingerprint.checksum,
            "pdf processed"
        );

        Ok(FetchedDocument { fingerprint, pages })
    }
}

pub fn parse_document_url(url: &str) -> Result<Url, IngestError> {
    let parsed = Url::parse(url.trim()).map_err(|error| IngestError::InvalidUrl {
        url: url.to_string(),
        reason: error.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(IngestError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme {scheme}"),
        }),
    }
}

pub fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
