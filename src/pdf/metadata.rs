//! PDF metadata and link inspection

use std::path::Path;

use lopdf::{Document, Object};

use super::links::{extract_links, DeferredDestination, LinkCandidate};
use super::resolve::{direct, resolve, Node};
use super::source::{DocumentId, SourceDocument};
use crate::config::MergeConfig;
use crate::error::{Error, Result};

/// Count pages by reading the Count field from the Pages dictionary
/// This is more reliable than get_pages() which doesn't handle nested page trees
fn count_pages_from_catalog(doc: &Document) -> Result<usize> {
    let catalog = doc.catalog().map_err(|_| Error::General("No catalog".to_string()))?;

    let pages_id = catalog
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| Error::General("Pages is not a reference".to_string()))?;

    let pages = doc.get_dictionary(pages_id)?;
    match pages.get(b"Count") {
        Ok(Object::Integer(n)) if *n >= 0 => Ok(*n as usize),
        Ok(_) => Err(Error::General("Count is not a non-negative integer".to_string())),
        Err(_) => Err(Error::General("No Count in Pages".to_string())),
    }
}

/// PDF metadata
#[derive(Debug, Clone)]
pub struct PdfMetadata {
    /// Number of pages in the PDF
    pub page_count: usize,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document author (if present)
    pub author: Option<String>,
    /// `/Link` annotations across all pages
    pub link_count: usize,
    /// Entries of the `/Dests` dictionary and `/Names` destination tree
    pub named_destination_count: usize,
    /// Whether the document declares any destinations container
    pub has_destinations: bool,
}

/// Extract metadata from a PDF file
pub fn extract_metadata(path: &Path) -> Result<PdfMetadata> {
    let page_count = count_pages(path)?;
    let source = SourceDocument::load(path, MergeConfig::default().max_depth)?;

    let info = source
        .document()
        .trailer
        .get(b"Info")
        .ok()
        .map(|info| direct(&source, &Node::from(info), source.max_depth()));
    let info_text = |key: &str| {
        info.as_ref()
            .and_then(|info| info.get(key))
            .map(|value| resolve(&source, value, source.max_depth()))
            .and_then(|value| value.as_text())
    };

    let link_count = (1..=source.page_count())
        .map(|page| link_annotation_count(&source, page))
        .sum();

    Ok(PdfMetadata {
        page_count,
        title: info_text("Title"),
        author: info_text("Author"),
        link_count,
        named_destination_count: source.destinations().len(),
        has_destinations: source.has_destinations(),
    })
}

/// Count the number of pages in a PDF file
///
/// This is a quick operation that reads the Count field from the Pages dictionary.
pub fn count_pages(path: &Path) -> Result<usize> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;
    let page_count = count_pages_from_catalog(&doc)?;

    if page_count == 0 {
        return Err(Error::EmptyPdf(path.to_path_buf()));
    }

    Ok(page_count)
}

/// Links of one page as seen by a merge
#[derive(Debug, Clone, PartialEq)]
pub struct PageLinks {
    pub page_number: u32,
    pub links: Vec<LinkCandidate>,
    /// Names left for the cross-document pass
    pub deferred: Vec<DeferredDestination>,
}

/// Extract the links of every page, treating the file as the first document
/// of a merge. Pages without links are omitted.
pub fn list_links(path: &Path, config: &MergeConfig) -> Result<Vec<PageLinks>> {
    let mut source = SourceDocument::load(path, config.max_depth)?;
    source.set_page_offset(0);

    let pages = (1..=source.page_count())
        .filter_map(|page_number| {
            let extracted = extract_links(&source, DocumentId(0), page_number, page_number, config);
            (!extracted.is_empty()).then(|| PageLinks {
                page_number,
                links: extracted.links,
                deferred: extracted.deferred,
            })
        })
        .collect();

    Ok(pages)
}

fn link_annotation_count(source: &SourceDocument, page_number: u32) -> usize {
    let max_depth = source.max_depth();
    let Some(annots) = source.page_node(page_number).and_then(|page| page.get("Annots").cloned()) else {
        return 0;
    };

    direct(source, &annots, max_depth)
        .as_array()
        .unwrap_or_default()
        .iter()
        .map(|annotation| direct(source, annotation, max_depth))
        .filter(|annotation| {
            annotation
                .get("Subtype")
                .map_or(false, |subtype| resolve(source, subtype, max_depth).is_name("Link"))
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::{FixtureBuilder, LinkSpec};
    use tempfile::TempDir;

    fn save(doc: &mut Document, dir: &TempDir, name: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        doc.save(&path).unwrap();
        path
    }

    #[test]
    fn test_count_pages_nonexistent_file() {
        let result = count_pages(Path::new("nonexistent.pdf"));
        assert!(matches!(result.unwrap_err(), Error::FileNotFound(_)));
    }

    #[test]
    fn test_extract_metadata_nonexistent_file() {
        let result = extract_metadata(Path::new("nonexistent.pdf"));
        assert!(matches!(result.unwrap_err(), Error::FileNotFound(_)));
    }

    #[test]
    fn test_extract_metadata_counts_links_and_destinations() {
        let dir = TempDir::new().unwrap();
        let mut fixture = FixtureBuilder::new(3);
        fixture.add_link(1, [0.0, 0.0, 10.0, 10.0], LinkSpec::Uri("https://example.com"));
        fixture.add_link(3, [0.0, 0.0, 10.0, 10.0], LinkSpec::GoTo(1));
        fixture.add_named_destination("intro", 2);
        let path = save(&mut fixture.into_document(), &dir, "doc.pdf");

        let metadata = extract_metadata(&path).unwrap();
        assert_eq!(metadata.page_count, 3);
        assert_eq!(metadata.link_count, 2);
        assert_eq!(metadata.named_destination_count, 1);
        assert!(metadata.has_destinations);
        assert_eq!(metadata.title, None);
    }

    #[test]
    fn test_list_links_skips_pages_without_links() {
        let dir = TempDir::new().unwrap();
        let mut fixture = FixtureBuilder::new(3);
        fixture.add_link(2, [0.0, 0.0, 10.0, 10.0], LinkSpec::Uri("https://example.com"));
        fixture.add_link(2, [0.0, 20.0, 10.0, 30.0], LinkSpec::Named("elsewhere"));
        let path = save(&mut fixture.into_document(), &dir, "doc.pdf");

        let pages = list_links(&path, &MergeConfig::default()).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page_number, 2);
        assert_eq!(pages[0].links.len(), 1);
        assert_eq!(pages[0].deferred[0].name, "elsewhere");
    }
}
