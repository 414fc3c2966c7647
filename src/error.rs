//! Error types for the PDF curator library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the PDF curator library
///
/// Only input problems surface here. Malformed annotations, unresolvable
/// destinations and ambiguous names never fail a merge; they drop the
/// affected link instead.
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Invalid glob pattern
    #[error("Invalid glob pattern: {0}")]
    InvalidGlob(String),

    /// No files matched pattern
    #[error("No PDF files found matching pattern: {0}")]
    NoFilesMatched(String),

    /// Invalid PDF (no pages)
    #[error("PDF has no pages: {}", .0.display())]
    EmptyPdf(PathBuf),

    /// The merge set is empty
    #[error("No input files provided")]
    NoInputFiles,

    /// A page number outside the document
    #[error("Page {page} is out of range for {} ({count} pages)", .path.display())]
    PageOutOfRange {
        path: PathBuf,
        page: u32,
        count: u32,
    },

    /// Unknown page box name
    #[error("Invalid page box: {0} (expected media, crop, bleed, trim or art)")]
    InvalidPageBox(String),

    /// General error
    #[error("{0}")]
    General(String),
}
