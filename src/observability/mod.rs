//! OpenTelemetry tracing with file-based span export.
//!
//! The coordinator emits `tracing` spans (one per cycle) and events (one per
//! stage). This module wires them to a local file in OTLP JSON format so that
//! cycles can be inspected offline without running a collector.
//!
//! # Architecture
//!
//! ```text
//! tracing → tracing-opentelemetry → OpenTelemetry SDK → FileSpanExporter → rotating JSON file
//! ```
//!
//! # Configuration
//!
//! - Filter: `RUST_LOG`, then [`Config::trace_level`](crate::Config::trace_level),
//!   then `info`
//! - File: [`Config::trace_file`](crate::Config::trace_file), then
//!   `typeahead-otlp.json` in the data directory
//! - Rotation: at 10 MB, keeping 3 backups
//!
//! # Modules
//!
//! - `init`: Subscriber setup
//! - `tracer`: Tracer provider with the file exporter
//! - `span_formatter`: OTLP JSON encoding
//! - `file_writer`: Size-rotated file appender

mod file_writer;
mod init;
mod span_formatter;
mod tracer;

pub use init::{init_tracing, trace_file_path, DEFAULT_TRACE_FILE};
