//! PDF merging with hyperlink preservation
//!
//! A merge runs in three phases:
//!
//! 1. Import: every page of every document, in order, is turned into a
//!    [`PageTemplate`](super::template::PageTemplate) with its link candidates
//!    and placed on the next output page.
//! 2. Resolve: links to names no single document could answer during import
//!    are searched across all documents at once.
//! 3. Assemble: the source object graphs are concatenated and the finished
//!    links are written as fresh `/Link` annotations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::info;

use super::deferred::{resolve_deferred, AmbiguousNames, ResolutionReport};
use super::links::DeferredDestination;
use super::output::{assemble, serialize};
use super::placement::{PageOffsetTracker, PlacedPage, ResolvedLinkTable};
use super::source::{DocumentId, SourceDocument};
use super::template::import_page;
use crate::config::MergeConfig;
use crate::error::{Error, Result};

/// Options for merging PDFs
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Input PDF file paths in the order they should be merged
    pub input_paths: Vec<PathBuf>,
    /// Output PDF file path
    pub output_path: PathBuf,
    /// Merge settings
    pub config: MergeConfig,
}

/// Merge multiple PDF files into a single PDF file
///
/// # Example
///
/// ```no_run
/// use pdf_curator::pdf::{MergeOptions, merge_pdfs};
/// use pdf_curator::MergeConfig;
/// use std::path::PathBuf;
///
/// let options = MergeOptions {
///     input_paths: vec![
///         PathBuf::from("1. first.pdf"),
///         PathBuf::from("2. second.pdf"),
///     ],
///     output_path: PathBuf::from("merged.pdf"),
///     config: MergeConfig::default(),
/// };
///
/// merge_pdfs(&options).expect("Failed to merge");
/// ```
pub fn merge_pdfs(options: &MergeOptions) -> Result<()> {
    let bytes = merge_documents(&options.input_paths, &options.config)?;
    std::fs::write(&options.output_path, bytes)?;
    Ok(())
}

/// Merge the PDF files at `paths`, in order, into an in-memory PDF
pub fn merge_documents(paths: &[PathBuf], config: &MergeConfig) -> Result<Vec<u8>> {
    let mut curator = Curator::with_config(config.clone());
    for path in paths {
        curator.add_file(path)?;
    }
    curator.merge()
}

/// Ordered set of documents to merge
///
/// # Example
///
/// ```no_run
/// use pdf_curator::Curator;
///
/// let mut curator = Curator::new();
/// curator.add_file("chapter-2.pdf")?;
/// curator.prepend_file("chapter-1.pdf")?;
/// let pdf = curator.merge()?;
/// # Ok::<(), pdf_curator::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct Curator {
    config: MergeConfig,
    documents: Vec<SourceDocument>,
    page_counts: HashMap<PathBuf, u32>,
}

impl Curator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MergeConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Append a PDF file to the merge order
    pub fn add_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let source = SourceDocument::load(path.as_ref(), self.config.max_depth)?;
        self.insert(source, false);
        Ok(self)
    }

    /// Put a PDF file first in the merge order
    pub fn prepend_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let source = SourceDocument::load(path.as_ref(), self.config.max_depth)?;
        self.insert(source, true);
        Ok(self)
    }

    /// Append an already parsed document; `name` identifies it in messages
    pub fn add_document(&mut self, name: impl Into<PathBuf>, document: lopdf::Document) -> Result<&mut Self> {
        let source = SourceDocument::from_document(name, document, self.config.max_depth)?;
        self.insert(source, false);
        Ok(self)
    }

    /// Number of pages of `path`, adding the file to the merge if it is new
    pub fn page_count(&mut self, path: impl AsRef<Path>) -> Result<u32> {
        let path = path.as_ref();
        if let Some(&count) = self.page_counts.get(path) {
            return Ok(count);
        }

        self.add_file(path)?;
        self.page_counts
            .get(path)
            .copied()
            .ok_or_else(|| Error::FileNotFound(path.to_path_buf()))
    }

    /// Paths in merge order
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.documents.iter().map(SourceDocument::path)
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Merge every added document and clear the set
    ///
    /// On failure the set is left as it was.
    pub fn merge(&mut self) -> Result<Vec<u8>> {
        if self.documents.is_empty() {
            return Err(Error::NoInputFiles);
        }

        let bytes = MergeSession::new(&self.config).run(&mut self.documents)?;
        self.documents.clear();
        self.page_counts.clear();
        Ok(bytes)
    }

    fn insert(&mut self, source: SourceDocument, prepend: bool) {
        self.page_counts
            .insert(source.path().to_path_buf(), source.page_count());
        if prepend {
            self.documents.insert(0, source);
        } else {
            self.documents.push(source);
        }
    }
}

/// State of one merge; lives exactly as long as one [`Curator::merge`] call
struct MergeSession<'a> {
    config: &'a MergeConfig,
    tracker: PageOffsetTracker,
    links: ResolvedLinkTable,
    deferred: Vec<DeferredDestination>,
    ambiguous: AmbiguousNames,
    placed: Vec<PlacedPage>,
}

impl<'a> MergeSession<'a> {
    fn new(config: &'a MergeConfig) -> Self {
        Self {
            config,
            tracker: PageOffsetTracker::new(),
            links: ResolvedLinkTable::new(),
            deferred: Vec::new(),
            ambiguous: AmbiguousNames::new(),
            placed: Vec::new(),
        }
    }

    fn run(mut self, sources: &mut [SourceDocument]) -> Result<Vec<u8>> {
        // Offsets left by an earlier failed merge do not apply
        for source in sources.iter_mut() {
            source.clear_page_offset();
        }
        for (index, source) in sources.iter_mut().enumerate() {
            self.import_document(DocumentId(index), source)?;
        }

        let report = self.resolve(sources);
        info!(
            "merged {} documents into {} pages: {} links placed, {} deferred ({} resolved, {} unmatched, {} ambiguous)",
            sources.len(),
            self.tracker.pages_placed(),
            self.links.len(),
            self.deferred.len(),
            report.resolved,
            report.unmatched,
            report.ambiguous
        );

        let mut output = assemble(sources, &self.placed, &self.links, self.config)?;
        serialize(&mut output)
    }

    fn import_document(&mut self, document: DocumentId, source: &mut SourceDocument) -> Result<()> {
        source.set_page_offset(self.tracker.register(document));

        for page_number in 1..=source.page_count() {
            let output_page = self.tracker.next_output_page();
            let imported = import_page(source, document, page_number, output_page, self.config)?;

            self.deferred.extend(imported.deferred);
            let placed = self.tracker.place(imported.template, &mut self.links);
            self.placed.push(placed);
        }

        Ok(())
    }

    fn resolve(&mut self, sources: &[SourceDocument]) -> ResolutionReport {
        resolve_deferred(
            &self.deferred,
            sources,
            &mut self.ambiguous,
            &mut self.links,
        )
    }
}
