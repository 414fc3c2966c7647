//! PDF manipulation module

pub mod resolve;
pub mod source;
pub mod destinations;
pub mod links;
pub mod template;
pub mod placement;
pub mod deferred;
pub mod output;
pub mod merge;
pub mod metadata;

#[cfg(test)]
mod testing;

// Re-export commonly used items
pub use merge::{merge_documents, merge_pdfs, Curator, MergeOptions};
pub use metadata::{count_pages, extract_metadata, list_links, PageLinks, PdfMetadata};
pub use links::{LinkCandidate, LinkRect, LinkTarget, PageRef};
pub use placement::{FinalLink, LinkDestination};
pub use source::{DocumentId, SourceDocument};
