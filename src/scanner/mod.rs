//! Boundary scanning for configuration streams.
//!
//! The management connection delivers configuration documents back to back,
//! split across arbitrary network reads. [`BoundaryScanner`] finds where a
//! document ends; [`DocumentStream`] keeps the per-document scan state between
//! reads and hands out complete documents.
//!
//! # Example
//!
//! ```rust
//! use cluster_router::scanner::{BoundaryScanner, DocumentStream};
//!
//! let scanner = BoundaryScanner::new(b'{', b'}').unwrap();
//! assert_eq!(scanner.scan(b"{ this is { simple } }", 0), Some(21));
//!
//! let mut stream = DocumentStream::default();
//! stream.push(br#"{"rev":1,"nodes""#).unwrap();
//! assert!(stream.next_document().is_none());
//! stream.push(br#":[]}"#).unwrap();
//! assert!(stream.next_document().is_some());
//! ```

mod boundary;
mod stream;

pub use boundary::{BoundaryScanner, ScanState, ESCAPE, QUOTE};
pub use stream::DocumentStream;
