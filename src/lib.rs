//! PDF Curator Library
//!
//! Merges PDF files into one document without losing their hyperlinks.
//! This library provides functionality to:
//! - Merge multiple PDF files in a chosen order
//! - Keep external URI links, internal page links and named destinations
//! - Resolve cross-file links written as `.../curator#<name>` URIs
//! - Extract metadata and list the links a merge would see
//!
//! # Example
//!
//! ```no_run
//! use pdf_curator::pdf::{MergeOptions, merge_pdfs};
//! use pdf_curator::MergeConfig;
//! use std::path::PathBuf;
//!
//! let options = MergeOptions {
//!     input_paths: vec![
//!         PathBuf::from("1. intro.pdf"),
//!         PathBuf::from("2. advanced.pdf"),
//!     ],
//!     output_path: PathBuf::from("merged.pdf"),
//!     config: MergeConfig::default(),
//! };
//!
//! merge_pdfs(&options).expect("Failed to merge PDFs");
//! ```

pub mod config;
pub mod error;
pub mod input;
pub mod pdf;

// Re-export commonly used items
pub use config::{MergeConfig, PageBox};
pub use error::{Error, Result};
pub use pdf::{merge_documents, merge_pdfs, Curator, MergeOptions};
