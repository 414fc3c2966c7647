//! Source documents taking part in a merge

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use lopdf::{Document, Object, ObjectId};

use super::destinations::DestinationIndex;
use super::resolve::{Node, ObjectGraph};
use crate::error::{Error, Result};

/// Position of a source document in the merge order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(pub usize);

/// One input PDF with its pages and lazily built destination index
#[derive(Debug)]
pub struct SourceDocument {
    path: PathBuf,
    document: Document,
    pages: Vec<ObjectId>,
    page_offset: Option<u32>,
    max_depth: usize,
    destinations: OnceCell<DestinationIndex>,
}

impl SourceDocument {
    /// Load a source document from disk
    pub fn load(path: &Path, max_depth: usize) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let document = Document::load(path)?;
        Self::from_document(path, document, max_depth)
    }

    /// Wrap an already parsed document; `path` is used for identity and messages
    pub fn from_document(path: impl Into<PathBuf>, document: Document, max_depth: usize) -> Result<Self> {
        let path = path.into();
        let pages: Vec<ObjectId> = document.get_pages().into_values().collect();

        if pages.is_empty() {
            return Err(Error::EmptyPdf(path));
        }

        Ok(Self {
            path,
            document,
            pages,
            page_offset: None,
            max_depth,
            destinations: OnceCell::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    #[cfg(test)]
    pub(crate) fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Page object ids in page order
    pub fn pages(&self) -> &[ObjectId] {
        &self.pages
    }

    /// Object id of a 1-based page number
    pub fn page_id(&self, page_number: u32) -> Option<ObjectId> {
        let index = page_number.checked_sub(1)? as usize;
        self.pages.get(index).copied()
    }

    /// 1-based page number of a page object, matched on object and generation
    pub fn page_number_of(&self, id: ObjectId) -> Option<u32> {
        self.pages
            .iter()
            .position(|page| *page == id)
            .map(|index| index as u32 + 1)
    }

    /// Pages placed in the output before this document's first page
    pub fn page_offset(&self) -> Option<u32> {
        self.page_offset
    }

    /// Record the page offset; only the first call has an effect
    pub fn set_page_offset(&mut self, offset: u32) {
        if self.page_offset.is_none() {
            self.page_offset = Some(offset);
        }
    }

    /// Forget the offset so the document can be placed by another merge
    pub fn clear_page_offset(&mut self) {
        self.page_offset = None;
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Catalog node of the document, unresolved
    pub fn root(&self) -> Option<Node> {
        self.document.trailer.get(b"Root").ok().map(Node::from)
    }

    /// Page dictionary node, unresolved
    pub fn page_node(&self, page_number: u32) -> Option<Node> {
        let id = self.page_id(page_number)?;
        self.document.get_object(id).ok().map(Node::from)
    }

    pub fn destinations(&self) -> &DestinationIndex {
        self.destinations
            .get_or_init(|| DestinationIndex::build(self, self.max_depth))
    }

    pub fn has_destinations(&self) -> bool {
        self.destinations().has_destinations()
    }

    /// Global page number of a named destination defined in this document
    pub fn lookup_local(&self, name: &str) -> Option<u32> {
        let local = self.destinations().lookup_local(name)?;
        Some(local + self.page_offset?)
    }

    /// Global page number of a curated (`file:///...#name`) destination
    pub fn lookup_curated(&self, name: &str) -> Option<u32> {
        let local = self.destinations().lookup_curated(name)?;
        Some(local + self.page_offset?)
    }
}

impl ObjectGraph for SourceDocument {
    fn fetch(&self, id: ObjectId) -> Option<Node> {
        self.document.fetch(id)
    }
}

/// Find a page attribute, following the page tree's `Parent` chain
pub(crate) fn inherited_entry<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    // Page trees deeper than this are treated as malformed
    const MAX_TREE_DEPTH: usize = 32;

    let mut current = doc.get_object(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        let dict = current.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        let parent = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
        current = doc.get_object(parent).ok()?;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::resolve::direct;
    use crate::pdf::testing::FixtureBuilder;

    #[test]
    fn test_page_lookup() {
        let source = FixtureBuilder::new(3).into_source("a.pdf");

        assert_eq!(source.page_count(), 3);
        let second = source.page_id(2).unwrap();
        assert_eq!(source.page_number_of(second), Some(2));
        assert_eq!(source.page_id(0), None);
        assert_eq!(source.page_id(4), None);
        assert_eq!(source.page_number_of((9999, 0)), None);
    }

    #[test]
    fn test_page_offset_set_once() {
        let mut source = FixtureBuilder::new(1).into_source("a.pdf");
        assert_eq!(source.page_offset(), None);

        source.set_page_offset(4);
        source.set_page_offset(9);
        assert_eq!(source.page_offset(), Some(4));
    }

    #[test]
    fn test_object_graph_follows_references() {
        let source = FixtureBuilder::new(2).into_source("a.pdf");
        let page_id = source.page_id(2).unwrap();

        let page = direct(&source, &Node::Reference(page_id), source.max_depth());
        assert!(page.get("Type").map_or(false, |kind| kind.is_name("Page")));
        assert_eq!(source.fetch((9999, 0)), None);
    }

    #[test]
    fn test_clear_page_offset() {
        let mut source = FixtureBuilder::new(1).into_source("a.pdf");
        source.set_page_offset(4);
        source.clear_page_offset();
        source.set_page_offset(2);
        assert_eq!(source.page_offset(), Some(2));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = SourceDocument::load(Path::new("nonexistent.pdf"), 10);
        assert!(matches!(result.unwrap_err(), Error::FileNotFound(_)));
    }

    #[test]
    fn test_inherited_media_box() {
        let source = FixtureBuilder::new(1).into_source("a.pdf");
        let page_id = source.page_id(1).unwrap();

        let media_box = inherited_entry(source.document(), page_id, b"MediaBox");
        assert!(matches!(media_box, Some(Object::Array(items)) if items.len() == 4));
        assert!(inherited_entry(source.document(), page_id, b"ArtBox").is_none());
    }
}
