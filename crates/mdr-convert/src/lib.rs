//! Batch conversion of Mermaid diagrams in Markdown files.
//!
//! Ties the building blocks of `mdr-diagrams` into a run over many files:
//! - [`discover`] expands input paths into Markdown files, recording missing ones
//! - [`ImageLocation`] decides where images go and how documents link to them
//! - [`Converter`] renders, rewrites and writes each document
//! - [`RunSummary`] collects per-block and per-file outcomes for reporting

mod backup;
mod converter;
mod discover;
mod error;
mod location;
mod result;

pub use backup::{backup_path, create_backup};
pub use converter::{ConvertOptions, Converter};
pub use discover::{Discovery, discover};
pub use error::ConvertError;
pub use location::{DEFAULT_SHARED_DIR, ImageLocation, PER_DOCUMENT_KEYWORD, ResolvedLocation};
pub use result::{BlockReport, BlockStatus, FileFailure, FileReport, RunSummary};
