//! Framing of configuration documents arriving over a streaming connection.

use super::boundary::{BoundaryScanner, ScanState};
use crate::config::StreamConfig;
use crate::error::{Error, Result};
use bytes::{Buf, Bytes, BytesMut};
use std::collections::VecDeque;
use tracing::{trace, warn};

/// Splits a byte stream into complete JSON object documents.
///
/// Chunks are appended with [`push`](Self::push) as they are read from the
/// connection. Complete documents are framed as soon as their closing byte
/// arrives; the scan state of the in-flight document is kept between calls,
/// so a document spread over many reads is scanned exactly once.
#[derive(Debug)]
pub struct DocumentStream {
    scanner: BoundaryScanner,
    /// Unframed bytes. Starts at the opener of the in-flight document.
    buffer: BytesMut,
    state: ScanState,
    ready: VecDeque<Bytes>,
    max_document_size: usize,
}

impl DocumentStream {
    /// Create a stream for JSON object documents.
    pub fn new(config: &StreamConfig) -> Self {
        Self::with_scanner(BoundaryScanner::json_object(), config)
    }

    /// Create a stream framed by a custom scanner.
    pub fn with_scanner(scanner: BoundaryScanner, config: &StreamConfig) -> Self {
        Self {
            scanner,
            buffer: BytesMut::with_capacity(config.initial_capacity),
            state: ScanState::new(),
            ready: VecDeque::new(),
            max_document_size: config.max_document_size,
        }
    }

    /// Number of bytes buffered and not yet returned as a document.
    pub fn buffered(&self) -> usize {
        self.buffer.len() + self.ready.iter().map(Bytes::len).sum::<usize>()
    }

    /// Whether a document has been started but not finished.
    pub fn has_partial(&self) -> bool {
        !self.state.is_idle()
    }

    /// Append bytes read from the connection.
    ///
    /// Fails if a single document exceeds the configured limit, complete or
    /// not. Only that document is dropped; other documents framed from the
    /// same bytes stay available through [`next_document`](Self::next_document).
    pub fn push(&mut self, chunk: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(chunk);

        let mut oversized = None;
        while let Some(document) = self.frame() {
            if document.len() > self.max_document_size {
                oversized = Some(document.len());
                continue;
            }
            self.ready.push_back(document);
        }

        if self.buffer.len() > self.max_document_size {
            oversized = Some(self.buffer.len());
            self.buffer.clear();
            self.state.reset();
        }

        match oversized {
            Some(size) => {
                warn!(
                    size,
                    limit = self.max_document_size,
                    "Dropping oversized configuration document"
                );
                Err(Error::DocumentTooLarge {
                    size,
                    limit: self.max_document_size,
                })
            }
            None => Ok(()),
        }
    }

    /// Take the next complete document, if one has been framed.
    pub fn next_document(&mut self) -> Option<Bytes> {
        self.ready.pop_front()
    }

    /// Take every complete document currently framed.
    pub fn drain(&mut self) -> Vec<Bytes> {
        self.ready.drain(..).collect()
    }

    /// Drop buffered bytes, framed documents and any partial document.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.ready.clear();
        self.state.reset();
    }

    fn frame(&mut self) -> Option<Bytes> {
        if self.state.is_idle() {
            // Skip separators and noise up to the start of the next document.
            match self.buffer.iter().position(|&b| b == self.scanner.open()) {
                Some(0) => {}
                Some(start) => {
                    self.buffer.advance(start);
                    self.state.rebase(start);
                }
                None => {
                    self.buffer.clear();
                    return None;
                }
            }
        }

        let end = self.scanner.scan_resume(&self.buffer, &mut self.state)?;
        let document = self.buffer.split_to(end + 1).freeze();
        self.state.reset();

        trace!(len = document.len(), "Framed configuration document");
        Some(document)
    }
}

impl Default for DocumentStream {
    fn default() -> Self {
        Self::new(&StreamConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_document() {
        let mut stream = DocumentStream::default();
        stream.push(br#"{"rev":1}"#).unwrap();

        assert_eq!(stream.next_document().unwrap(), &br#"{"rev":1}"#[..]);
        assert!(stream.next_document().is_none());
        assert_eq!(stream.buffered(), 0);
    }

    #[test]
    fn test_back_to_back_documents_with_separators() {
        let mut stream = DocumentStream::default();
        stream.push(b"\n\n{\"rev\":1}\n\n\n\n{\"rev\":2}\n\n").unwrap();

        let docs = stream.drain();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0], &b"{\"rev\":1}"[..]);
        assert_eq!(docs[1], &b"{\"rev\":2}"[..]);
    }

    #[test]
    fn test_document_split_over_many_pushes() {
        let doc: &[u8] = br#"{"rev":3,"name":"b}{","nodes":[{"hostname":"10.0.0.1"}]}"#;
        let mut stream = DocumentStream::default();

        for (i, byte) in doc.iter().enumerate() {
            assert!(stream.next_document().is_none());
            stream.push(std::slice::from_ref(byte)).unwrap();
            if i + 1 < doc.len() {
                assert!(stream.next_document().is_none());
                assert!(stream.has_partial());
            }
        }

        assert_eq!(stream.next_document().unwrap(), doc);
        assert!(!stream.has_partial());
    }

    #[test]
    fn test_partial_tail_is_kept() {
        let mut stream = DocumentStream::default();
        stream.push(br#"{"rev":1}{"rev":"#).unwrap();

        assert_eq!(stream.next_document().unwrap(), &br#"{"rev":1}"#[..]);
        assert!(stream.next_document().is_none());
        assert!(stream.has_partial());

        stream.push(b"2}").unwrap();
        assert_eq!(stream.next_document().unwrap(), &br#"{"rev":2}"#[..]);
    }

    #[test]
    fn test_oversized_document_is_dropped() {
        let config = StreamConfig::default().with_max_document_size(8);
        let mut stream = DocumentStream::new(&config);

        stream.push(b"{\"a\":").unwrap();
        let err = stream.push(b"\"0123456789\"}").unwrap_err();
        assert!(matches!(err, Error::DocumentTooLarge { limit: 8, .. }));
        assert_eq!(stream.buffered(), 0);
        assert!(!stream.has_partial());

        stream.push(b"{}").unwrap();
        assert_eq!(stream.next_document().unwrap(), &b"{}"[..]);
    }

    #[test]
    fn test_limit_applies_per_document() {
        let config = StreamConfig::default().with_max_document_size(16);
        let mut stream = DocumentStream::new(&config);

        stream.push(br#"{"a":"12"}{"b":"34"}{"c":"56"}"#).unwrap();
        let docs = stream.drain();
        assert_eq!(docs.len(), 3);
        assert_eq!(docs[2], &br#"{"c":"56"}"#[..]);
    }

    #[test]
    fn test_oversized_document_spares_its_neighbours() {
        let config = StreamConfig::default().with_max_document_size(16);
        let mut stream = DocumentStream::new(&config);

        let err = stream
            .push(br#"{"a":"12"}{"big":"0123456789"}{"c":"56"}"#)
            .unwrap_err();
        assert!(matches!(err, Error::DocumentTooLarge { size: 20, limit: 16 }));
        assert_eq!(
            stream.drain(),
            vec![
                Bytes::from_static(br#"{"a":"12"}"#),
                Bytes::from_static(br#"{"c":"56"}"#),
            ]
        );
    }

    #[test]
    fn test_oversized_partial_keeps_framed_documents() {
        let config = StreamConfig::default().with_max_document_size(16);
        let mut stream = DocumentStream::new(&config);

        let err = stream.push(br#"{"a":"12"}{"bb":"0123456789"#).unwrap_err();
        assert!(matches!(err, Error::DocumentTooLarge { size: 17, limit: 16 }));
        assert!(!stream.has_partial());
        assert_eq!(stream.next_document().unwrap(), &br#"{"a":"12"}"#[..]);
        assert_eq!(stream.buffered(), 0);
    }

    #[test]
    fn test_noise_without_opener_is_discarded() {
        let mut stream = DocumentStream::default();
        stream.push(b"\r\n\r\n").unwrap();
        assert!(stream.next_document().is_none());
        assert_eq!(stream.buffered(), 0);
    }
}
