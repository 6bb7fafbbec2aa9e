//! Browser-based PDF rendering.
//!
//! Each call launches its own headless Chromium, renders the page to legal
//! size with 25 mm margins, and tears the browser down on every exit path.
//! There is no pooling: conversion is not on a latency-critical hot path, and
//! a fresh process per call keeps renders isolated.

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::error::{ConvertError, ConvertResult};
use anuvad_core::constants::{LEGAL_PAPER_HEIGHT_IN, LEGAL_PAPER_WIDTH_IN, PDF_MARGIN_MM};

const MM_PER_INCH: f64 = 25.4;

pub struct PdfRenderer {
    chromium_path: Option<String>,
}

impl PdfRenderer {
    pub fn new(chromium_path: Option<String>) -> Self {
        Self { chromium_path }
    }

    /// Render HTML to a PDF buffer. The browser session is acquired and
    /// released inside this call, including on failure.
    pub async fn render(&self, html: &str) -> ConvertResult<Vec<u8>> {
        let mut session = BrowserSession::launch(self.chromium_path.as_deref()).await?;
        let result = session.print_to_pdf(html).await;
        session.shutdown().await;
        result
    }
}

/// Scoped browser acquisition: `shutdown` closes the browser and reaps the
/// handler task; `Drop` is the fallback for cancelled futures (the browser's
/// own drop kills the child process when it was never closed cleanly).
struct BrowserSession {
    browser: Option<Browser>,
    handler_task: JoinHandle<()>,
}

impl BrowserSession {
    async fn launch(chromium_path: Option<&str>) -> ConvertResult<Self> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--hide-scrollbars")
            .arg("--mute-audio");
        if let Some(path) = chromium_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(|e| {
            ConvertError::ConversionFailed(format!("Failed to build browser config: {}", e))
        })?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            ConvertError::ConversionFailed(format!("Failed to launch browser: {}", e))
        })?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    // CDP event decode errors are not fatal to the render
                    tracing::trace!(error = %e, "browser handler event error");
                }
            }
        });

        Ok(Self {
            browser: Some(browser),
            handler_task,
        })
    }

    async fn print_to_pdf(&self, html: &str) -> ConvertResult<Vec<u8>> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| ConvertError::ConversionFailed("browser already closed".to_string()))?;

        let page = browser.new_page("about:blank").await.map_err(|e| {
            ConvertError::ConversionFailed(format!("Failed to open page: {}", e))
        })?;

        page.set_content(html).await.map_err(|e| {
            ConvertError::ConversionFailed(format!("Failed to set page content: {}", e))
        })?;

        // No partial renders: wait until the page reaches a loaded/idle state
        page.wait_for_navigation().await.map_err(|e| {
            ConvertError::ConversionFailed(format!("Page never reached idle state: {}", e))
        })?;

        let margin_in = PDF_MARGIN_MM / MM_PER_INCH;
        let params = PrintToPdfParams {
            paper_width: Some(LEGAL_PAPER_WIDTH_IN),
            paper_height: Some(LEGAL_PAPER_HEIGHT_IN),
            margin_top: Some(margin_in),
            margin_bottom: Some(margin_in),
            margin_left: Some(margin_in),
            margin_right: Some(margin_in),
            display_header_footer: Some(false),
            print_background: Some(true),
            ..Default::default()
        };

        let pdf = page
            .pdf(params)
            .await
            .map_err(|e| ConvertError::ConversionFailed(format!("PDF generation failed: {}", e)))?;

        tracing::debug!(size_bytes = pdf.len(), "PDF rendered");

        Ok(pdf)
    }

    async fn shutdown(&mut self) {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                tracing::debug!(error = %e, "browser close failed, process will be killed on drop");
            }
            let _ = browser.wait().await;
        }
        self.handler_task.abort();
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}
