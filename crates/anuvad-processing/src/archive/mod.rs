//! Streaming ZIP assembly.
//!
//! Entries are written through a `zip::ZipWriter` whose backing buffer
//! releases finalized bytes into an mpsc channel as soon as they can no
//! longer change, so the response body streams while later entries are still
//! being produced and the final archive is never buffered whole.
//!
//! The ZIP format patches an entry's local header (CRC, sizes) when the next
//! entry starts, so the safe release point is the start of the following
//! entry's header: everything before it is final. Memory therefore holds at
//! most one entry at a time.
//!
//! Failure semantics: dropping the writer without `finish()` drops the
//! channel sender mid-archive. The receiver sees the stream end without a
//! central directory, the client connection aborts, and no partial-but-valid
//! ZIP is ever emitted.

use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tokio::sync::mpsc;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{ConvertError, ConvertResult};

/// Per-entry compression choice. Already-compressed binary content (PDFs)
/// is stored; text-like content (DOCX packages, HTML) is deflated at the
/// configured level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryCompression {
    Text(i32),
    Binary,
}

impl EntryCompression {
    fn file_options(self) -> FileOptions {
        let options = FileOptions::default().unix_permissions(0o644);
        match self {
            EntryCompression::Text(level) => options
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(level)),
            EntryCompression::Binary => options.compression_method(CompressionMethod::Stored),
        }
    }
}

/// Sanitize one path component for an archive entry (strips directories and
/// traversal sequences).
pub fn sanitize_entry_component(name: &str, fallback: &str) -> String {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .unwrap_or(fallback)
        .to_string()
}

#[derive(Default)]
struct BufferState {
    /// Bytes not yet released downstream.
    buf: Vec<u8>,
    /// Absolute stream offset of `buf[0]`.
    base: u64,
    /// Absolute write position.
    pos: u64,
}

/// Shared handle over the buffer so the assembler can trigger drains while
/// the `ZipWriter` owns the `Write + Seek` half.
#[derive(Clone)]
struct SharedBuffer {
    state: Arc<Mutex<BufferState>>,
    tx: mpsc::UnboundedSender<Bytes>,
}

impl SharedBuffer {
    fn new(tx: mpsc::UnboundedSender<Bytes>) -> Self {
        Self {
            state: Arc::new(Mutex::new(BufferState::default())),
            tx,
        }
    }

    /// Absolute end of the written stream (where the next byte lands).
    fn end_position(&self) -> u64 {
        let state = self.state.lock().expect("buffer lock");
        state.base + state.buf.len() as u64
    }

    /// Release bytes below `abs` into the channel. A gone receiver is not an
    /// error here; the write path keeps succeeding and the response simply
    /// has no reader anymore (client disconnect does not interrupt work).
    fn drain_to(&self, abs: u64) {
        let mut state = self.state.lock().expect("buffer lock");
        let n = (abs.saturating_sub(state.base)) as usize;
        if n == 0 {
            return;
        }
        let released: Vec<u8> = state.buf.drain(..n).collect();
        state.base = abs;
        let _ = self.tx.send(Bytes::from(released));
    }

    fn drain_all(&self) {
        self.drain_to(self.end_position());
    }
}

/// The `Write + Seek` half handed to `ZipWriter`. Seeks below the drained
/// region are impossible by construction (the zip writer only patches the
/// current entry's header, which is never released early).
struct DrainBuffer {
    shared: SharedBuffer,
}

impl Write for DrainBuffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut state = self.shared.state.lock().expect("buffer lock");
        let rel = (state.pos - state.base) as usize;
        let end = rel + data.len();
        if end > state.buf.len() {
            state.buf.resize(end, 0);
        }
        state.buf[rel..end].copy_from_slice(data);
        state.pos += data.len() as u64;
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for DrainBuffer {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let mut state = self.shared.state.lock().expect("buffer lock");
        let end = state.base + state.buf.len() as u64;
        let target = match pos {
            SeekFrom::Start(offset) => offset as i64,
            SeekFrom::Current(offset) => state.pos as i64 + offset,
            SeekFrom::End(offset) => end as i64 + offset,
        };
        if target < state.base as i64 {
            return Err(io::Error::other("seek below released archive region"));
        }
        state.pos = target as u64;
        Ok(state.pos)
    }
}

/// Ordered, append-only ZIP writer streaming into a byte channel.
pub struct ZipStreamWriter {
    zip: ZipWriter<DrainBuffer>,
    shared: SharedBuffer,
}

impl ZipStreamWriter {
    /// Create a writer and the receiving end of its byte stream.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Bytes>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = SharedBuffer::new(tx);
        let zip = ZipWriter::new(DrainBuffer {
            shared: shared.clone(),
        });
        (Self { zip, shared }, rx)
    }

    /// Start a new entry. Finalizes the previous entry and releases all bytes
    /// before this entry's local header.
    pub fn start_entry(&mut self, name: &str, compression: EntryCompression) -> ConvertResult<()> {
        let header_offset = self.shared.end_position();
        self.zip
            .start_file(name, compression.file_options())
            .map_err(|e| {
                ConvertError::PackagingFailed(format!("Failed to add ZIP entry {}: {}", name, e))
            })?;
        self.shared.drain_to(header_offset);
        Ok(())
    }

    /// Append data to the current entry. Callable repeatedly for chunked
    /// upstream bodies.
    pub fn write_chunk(&mut self, data: &[u8]) -> ConvertResult<()> {
        self.zip.write_all(data).map_err(|e| {
            ConvertError::PackagingFailed(format!("Failed to write ZIP entry data: {}", e))
        })?;
        Ok(())
    }

    /// Add a whole in-memory entry.
    pub fn add_entry(
        &mut self,
        name: &str,
        data: &[u8],
        compression: EntryCompression,
    ) -> ConvertResult<()> {
        self.start_entry(name, compression)?;
        self.write_chunk(data)
    }

    /// Write the central directory and release the remaining bytes. Dropping
    /// the writer without calling this aborts the stream instead.
    pub fn finish(mut self) -> ConvertResult<()> {
        self.zip.finish().map_err(|e| {
            ConvertError::PackagingFailed(format!("Failed to finalize ZIP archive: {}", e))
        })?;
        self.shared.drain_all();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn collect(rx: &mut mpsc::UnboundedReceiver<Bytes>) -> Vec<u8> {
        let mut out = Vec::new();
        while let Ok(chunk) = rx.try_recv() {
            out.extend_from_slice(&chunk);
        }
        out
    }

    #[test]
    fn test_two_entry_archive_roundtrip() {
        let (mut writer, mut rx) = ZipStreamWriter::new();
        writer
            .add_entry("docTranslation.docx", b"docx bytes", EntryCompression::Text(2))
            .unwrap();
        writer
            .add_entry("doc.pdf", b"pdf bytes", EntryCompression::Binary)
            .unwrap();
        writer.finish().unwrap();

        let bytes = collect(&mut rx);
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).expect("valid zip");
        assert_eq!(archive.len(), 2);

        assert_eq!(archive.by_index(0).unwrap().name(), "docTranslation.docx");
        assert_eq!(archive.by_index(1).unwrap().name(), "doc.pdf");

        let mut content = String::new();
        archive
            .by_name("doc.pdf")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "pdf bytes");
    }

    #[test]
    fn test_binary_entries_stored_uncompressed() {
        let (mut writer, mut rx) = ZipStreamWriter::new();
        writer
            .add_entry("original.pdf", b"pdf bytes", EntryCompression::Binary)
            .unwrap();
        writer.finish().unwrap();

        let bytes = collect(&mut rx);
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(
            archive.by_index(0).unwrap().compression(),
            CompressionMethod::Stored
        );
    }

    #[test]
    fn test_bytes_stream_before_finish() {
        let (mut writer, mut rx) = ZipStreamWriter::new();
        writer
            .add_entry("first.docx", &vec![0u8; 4096], EntryCompression::Text(2))
            .unwrap();
        // Starting the second entry finalizes the first and releases it
        writer
            .start_entry("second.pdf", EntryCompression::Binary)
            .unwrap();

        let streamed = collect(&mut rx);
        assert!(!streamed.is_empty());

        writer.write_chunk(b"pdf").unwrap();
        writer.finish().unwrap();
    }

    #[test]
    fn test_dropped_writer_leaves_no_valid_archive() {
        let (mut writer, mut rx) = ZipStreamWriter::new();
        writer
            .add_entry("first.docx", b"docx bytes", EntryCompression::Text(2))
            .unwrap();
        writer
            .start_entry("second.pdf", EntryCompression::Binary)
            .unwrap();
        drop(writer);

        let bytes = collect(&mut rx);
        // Whatever bytes escaped must not parse as a complete archive
        assert!(zip::ZipArchive::new(std::io::Cursor::new(bytes)).is_err());
    }

    #[test]
    fn test_entry_order_matches_append_order() {
        let (mut writer, mut rx) = ZipStreamWriter::new();
        for name in ["b/bTranslation.docx", "b/b.pdf", "a/aTranslation.docx", "a/a.pdf"] {
            writer
                .add_entry(name, b"x", EntryCompression::Text(2))
                .unwrap();
        }
        writer.finish().unwrap();

        let bytes = collect(&mut rx);
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["b/bTranslation.docx", "b/b.pdf", "a/aTranslation.docx", "a/a.pdf"]
        );
    }

    #[test]
    fn test_sanitize_entry_component() {
        assert_eq!(
            sanitize_entry_component("../../etc/passwd", "fallback"),
            "passwd"
        );
        assert_eq!(
            sanitize_entry_component("document.pdf", "fallback"),
            "document.pdf"
        );
        assert_eq!(sanitize_entry_component("", "fallback"), "fallback");
        assert_eq!(sanitize_entry_component("..", "fallback"), "fallback");
    }
}
