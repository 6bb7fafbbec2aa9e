//! Shared pieces of the ZIP download responses.
//!
//! The response body is the receiving end of the archive writer's byte
//! channel; the producing task keeps appending entries after the headers have
//! been sent. Once body bytes flow, a later failure can only abort the
//! connection (the writer is dropped without a ZIP terminator), never turn
//! into a clean error response.

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use anuvad_core::constants::CONTENT_TYPE_ZIP;
use anuvad_core::AppError;
use anuvad_processing::{ConvertError, EntryCompression, ZipStreamWriter};

/// Build the streaming `application/zip` response around the receiver.
pub fn zip_response(
    archive_name: &str,
    rx: mpsc::UnboundedReceiver<Bytes>,
) -> Result<Response, AppError> {
    let stream = UnboundedReceiverStream::new(rx).map(Ok::<_, std::io::Error>);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, CONTENT_TYPE_ZIP)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", archive_name),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))
}

/// Fetch the original PDF through its signed URL and stream it into the
/// archive as a stored (uncompressed) entry. Any fetch or write failure
/// aborts the whole response; partial ZIPs are not allowed.
pub async fn append_original_pdf(
    writer: &mut ZipStreamWriter,
    http: &reqwest::Client,
    signed_url: &str,
    entry_name: &str,
) -> Result<(), ConvertError> {
    writer.start_entry(entry_name, EntryCompression::Binary)?;

    let response = http
        .get(signed_url)
        .send()
        .await
        .map_err(|e| ConvertError::UpstreamFetchFailed(format!("Could not fetch original PDF: {}", e)))?
        .error_for_status()
        .map_err(|e| ConvertError::UpstreamFetchFailed(format!("Could not fetch original PDF: {}", e)))?;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            ConvertError::UpstreamFetchFailed(format!("Original PDF stream failed: {}", e))
        })?;
        writer.write_chunk(&chunk)?;
    }

    Ok(())
}
