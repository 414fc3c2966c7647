//! Named destination lookup
//!
//! Destinations come from the catalog's `/Dests` dictionary (PDF 1.1) and the
//! `/Names /Dests` name tree (PDF 1.2+). Both are flattened into one ordered
//! list of `(name, local page)` the first time a document is queried.

use super::resolve::{direct, Node, Token};
use super::source::SourceDocument;

/// `file:///` as it appears in curated destination names, plain and `#`-escaped
const FILE_SCHEME: &str = "file:///";
const FILE_SCHEME_ESCAPED: &str = "file#3a#2f#2f#2f";

/// Named destinations of one document, mapped to 1-based local pages
#[derive(Debug, Default, Clone)]
pub struct DestinationIndex {
    present: bool,
    entries: Vec<(String, u32)>,
}

impl DestinationIndex {
    /// Read every named destination of `source`
    ///
    /// Entries whose target cannot be turned into a page of this document
    /// (missing page, remote target, depth exhausted) are left out.
    pub fn build(source: &SourceDocument, max_depth: usize) -> Self {
        let mut index = Self::default();

        let catalog = match source.root() {
            Some(root) => direct(source, &root, max_depth),
            None => return index,
        };

        if let Some(dests) = catalog.get("Dests") {
            index.present = true;
            if let Node::Dictionary(entries) = direct(source, dests, max_depth) {
                for (name, value) in &entries {
                    if let Some(page) = destination_page(source, value, max_depth) {
                        index.entries.push((name.clone(), page));
                    }
                }
            }
        }

        let tree = catalog
            .get("Names")
            .map(|names| direct(source, names, max_depth))
            .and_then(|names| names.get("Dests").cloned());
        if let Some(tree) = tree {
            index.present = true;
            collect_name_tree(source, &tree, max_depth, &mut index.entries);
        }

        log::debug!(
            "{}: {} named destinations",
            source.path().display(),
            index.entries.len()
        );

        index
    }

    /// Whether the catalog declares any destination table at all
    pub fn has_destinations(&self) -> bool {
        self.present
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Local page of the destination named exactly `name`
    pub fn lookup_local(&self, name: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, page)| *page)
    }

    /// Local page of the first destination named `file:///<path>#<name>`
    pub fn lookup_curated(&self, name: &str) -> Option<u32> {
        if name.is_empty() {
            return None;
        }

        self.entries
            .iter()
            .find(|(key, _)| is_curated_name(key, name))
            .map(|(_, page)| *page)
    }
}

fn is_curated_name(key: &str, name: &str) -> bool {
    let key = key.strip_prefix('/').unwrap_or(key);

    let plain = key
        .strip_prefix(FILE_SCHEME)
        .and_then(|rest| rest.strip_suffix(name))
        .and_then(|rest| rest.strip_suffix('#'));
    let escaped = key
        .strip_prefix(FILE_SCHEME_ESCAPED)
        .and_then(|rest| rest.strip_suffix(name))
        .and_then(|rest| rest.strip_suffix("#23"));

    matches!(plain.or(escaped), Some(path) if !path.is_empty())
}

/// Turn an explicit destination (array, or dictionary with `/D`) into a local page
pub(crate) fn destination_page(source: &SourceDocument, value: &Node, max_depth: usize) -> Option<u32> {
    let value = direct(source, value, max_depth);
    let array = match value.get("D") {
        Some(inner) => direct(source, inner, max_depth),
        None => value,
    };

    match array.as_array()?.first()? {
        Node::Reference(id) => source.page_number_of(*id),
        Node::Token(Token::Integer(index)) if *index >= 0 && (*index as u64) < u64::from(source.page_count()) => {
            Some(*index as u32 + 1)
        }
        _ => None,
    }
}

fn collect_name_tree(source: &SourceDocument, node: &Node, depth: usize, out: &mut Vec<(String, u32)>) {
    if depth == 0 {
        return;
    }

    let node = direct(source, node, depth);

    if let Some(names) = node.get("Names").map(|names| direct(source, names, depth)) {
        for pair in names.as_array().unwrap_or_default().chunks_exact(2) {
            let name = direct(source, &pair[0], depth).as_destination_name();
            let page = destination_page(source, &pair[1], depth);
            if let (Some(name), Some(page)) = (name, page) {
                out.push((name, page));
            }
        }
    }

    if let Some(kids) = node.get("Kids").map(|kids| direct(source, kids, depth)) {
        for kid in kids.as_array().unwrap_or_default() {
            collect_name_tree(source, kid, depth - 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::FixtureBuilder;

    #[test]
    fn test_no_destinations() {
        let source = FixtureBuilder::new(2).into_source("a.pdf");
        assert!(!source.has_destinations());
        assert_eq!(source.destinations().lookup_local("intro"), None);
        assert_eq!(source.destinations().lookup_curated("intro"), None);
    }

    #[test]
    fn test_catalog_dests_dictionary() {
        let mut fixture = FixtureBuilder::new(3);
        fixture.add_named_destination("intro", 1);
        fixture.add_named_destination("summary", 3);
        let source = fixture.into_source("a.pdf");

        assert!(source.has_destinations());
        assert_eq!(source.destinations().len(), 2);
        assert_eq!(source.destinations().lookup_local("intro"), Some(1));
        assert_eq!(source.destinations().lookup_local("summary"), Some(3));
        assert_eq!(source.destinations().lookup_local("missing"), None);
    }

    #[test]
    fn test_lookup_adds_page_offset() {
        let mut fixture = FixtureBuilder::new(3);
        fixture.add_named_destination("summary", 3);
        let mut source = fixture.into_source("a.pdf");

        // Unplaced documents have no global pages yet
        assert_eq!(source.lookup_local("summary"), None);

        source.set_page_offset(5);
        assert_eq!(source.lookup_local("summary"), Some(8));
    }

    #[test]
    fn test_name_tree_destinations() {
        let mut fixture = FixtureBuilder::new(4);
        fixture.add_name_tree_destinations(&[("chapter-1", 2), ("chapter-2", 4)]);
        let source = fixture.into_source("a.pdf");

        assert!(source.has_destinations());
        assert_eq!(source.destinations().lookup_local("chapter-1"), Some(2));
        assert_eq!(source.destinations().lookup_local("chapter-2"), Some(4));
    }

    #[test]
    fn test_curated_lookup() {
        let mut fixture = FixtureBuilder::new(3);
        fixture.add_named_destination("file:///home/docs/guide.pdf#setup", 2);
        fixture.add_named_destination("setup", 3);
        let mut source = fixture.into_source("a.pdf");
        source.set_page_offset(10);

        assert_eq!(source.lookup_curated("setup"), Some(12));
        assert_eq!(source.lookup_local("setup"), Some(13));
        assert_eq!(source.lookup_curated("set"), None);
        assert_eq!(source.lookup_curated(""), None);
    }

    #[test]
    fn test_destination_page_index_forms() {
        let source = FixtureBuilder::new(3).into_source("a.pdf");
        let by_index = |index| Node::Array(vec![Node::integer(index), Node::name("Fit")]);

        assert_eq!(destination_page(&source, &by_index(1), 10), Some(2));
        assert_eq!(destination_page(&source, &by_index(3), 10), None);
        assert_eq!(destination_page(&source, &by_index(-1), 10), None);

        let wrapped = Node::Dictionary(vec![("D".to_string(), by_index(0))]);
        assert_eq!(destination_page(&source, &wrapped, 10), Some(1));
    }

    #[test]
    fn test_curated_name_forms() {
        assert!(is_curated_name("file:///a/b.pdf#intro", "intro"));
        assert!(is_curated_name("/file#3a#2f#2f#2fa#2fb.pdf#23intro", "intro"));
        assert!(!is_curated_name("file:///#intro", "intro"));
        assert!(!is_curated_name("file:///a/b.pdf#intro2", "intro"));
        assert!(!is_curated_name("http://a/b.pdf#intro", "intro"));
    }
}
