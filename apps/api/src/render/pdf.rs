//! PDF conversion via an external headless-browser render service.
//!
//! One render call per request; the browser resource lives entirely inside
//! the service and nothing is pooled on this side.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::render::RenderError;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfOptions {
    pub format: String,
    pub print_background: bool,
    pub margin: PdfMargins,
}

#[derive(Debug, Clone, Serialize)]
pub struct PdfMargins {
    pub top: String,
    pub bottom: String,
    pub left: String,
    pub right: String,
}

impl Default for PdfOptions {
    /// A4, background graphics on, 15mm top/bottom and flush left/right.
    fn default() -> Self {
        Self {
            format: "A4".to_string(),
            print_background: true,
            margin: PdfMargins {
                top: "15mm".to_string(),
                bottom: "15mm".to_string(),
                left: "0mm".to_string(),
                right: "0mm".to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct RenderRequest<'a> {
    html: &'a str,
    options: &'a PdfOptions,
}

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    /// Converts markup to a complete, paginated PDF byte stream.
    async fn render(&self, html: &str) -> Result<Vec<u8>, RenderError>;
}

/// Renderer backed by a headless-Chrome print service (browserless-style
/// `/pdf` endpoint).
pub struct HttpPdfRenderer {
    client: Client,
    endpoint: String,
    options: PdfOptions,
}

impl HttpPdfRenderer {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            options: PdfOptions::default(),
        }
    }
}

#[async_trait]
impl PdfRenderer for HttpPdfRenderer {
    async fn render(&self, html: &str) -> Result<Vec<u8>, RenderError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&RenderRequest {
                html,
                options: &self.options,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RenderError::Renderer {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(RenderError::EmptyDocument);
        }

        debug!("rendered PDF ({} bytes)", bytes.len());
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_match_page_setup() {
        let options = PdfOptions::default();
        assert_eq!(options.format, "A4");
        assert!(options.print_background);
        assert_eq!(options.margin.top, "15mm");
        assert_eq!(options.margin.bottom, "15mm");
        assert_eq!(options.margin.left, "0mm");
        assert_eq!(options.margin.right, "0mm");
    }

    #[test]
    fn test_render_request_serializes_camel_case() {
        let options = PdfOptions::default();
        let request = RenderRequest {
            html: "<html></html>",
            options: &options,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["options"]["printBackground"], true);
        assert_eq!(json["options"]["margin"]["top"], "15mm");
        assert_eq!(json["html"], "<html></html>");
    }
}
