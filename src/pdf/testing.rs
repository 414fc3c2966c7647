//! In-memory PDF fixtures for unit tests

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use super::resolve::DEFAULT_MAX_DEPTH;
use super::source::SourceDocument;

/// Target of a link annotation added by [`FixtureBuilder::add_link`]
pub enum LinkSpec<'a> {
    /// `/A << /S /URI /URI (...) >>`
    Uri(&'a str),
    /// `/A << /S /GoTo /D [page /Fit] >>`
    GoTo(usize),
    /// `/A << /S /GoTo /D (name) >>`
    GoToNamed(&'a str),
    /// `/Dest [page /Fit]`
    DestArray(usize),
    /// `/Dest [index /Fit]` with a 0-based page index
    DestIndex(i64),
    /// `/Dest /name`
    Named(&'a str),
    /// `/A << /S /Launch >>`
    Launch,
}

pub struct FixtureBuilder {
    doc: Document,
    catalog_id: ObjectId,
    page_ids: Vec<ObjectId>,
}

impl FixtureBuilder {
    /// Letter-sized pages, with the MediaBox inherited from the page tree
    pub fn new(page_count: usize) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut page_ids = Vec::new();
        for index in 0..page_count {
            let content = format!("BT /F1 12 Tf 50 700 Td (Page {}) Tj ET", index + 1);
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

            let mut page = Dictionary::new();
            page.set("Type", Object::Name(b"Page".to_vec()));
            page.set("Parent", Object::Reference(pages_id));
            page.set("Contents", Object::Reference(content_id));
            page_ids.push(doc.add_object(page));
        }

        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Count", Object::Integer(page_count as i64));
        pages.set("Kids", Object::Array(page_ids.iter().map(|&id| Object::Reference(id)).collect()));
        pages.set("MediaBox", rect_object([0.0, 0.0, 612.0, 792.0]));
        pages.set("Resources", Object::Dictionary(Dictionary::new()));
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));

        Self { doc, catalog_id, page_ids }
    }

    pub fn page_id(&self, page: usize) -> ObjectId {
        self.page_ids[page - 1]
    }

    pub fn set_page_entry(&mut self, page: usize, key: &str, value: Object) {
        let page_id = self.page_id(page);
        let dict = self
            .doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .expect("page dictionary");
        dict.set(key, value);
    }

    /// Add a raw annotation object to a page
    pub fn add_annotation(&mut self, page: usize, annotation: Object) -> ObjectId {
        let annotation_id = self.doc.add_object(annotation);
        let page_id = self.page_id(page);
        let dict = self
            .doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .expect("page dictionary");

        let mut annots = match dict.get(b"Annots") {
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        annots.push(Object::Reference(annotation_id));
        dict.set("Annots", Object::Array(annots));

        annotation_id
    }

    pub fn add_link(&mut self, page: usize, rect: [f32; 4], target: LinkSpec) -> ObjectId {
        let mut annotation = Dictionary::new();
        annotation.set("Type", Object::Name(b"Annot".to_vec()));
        annotation.set("Subtype", Object::Name(b"Link".to_vec()));
        annotation.set("Rect", rect_object(rect));

        match target {
            LinkSpec::Uri(uri) => {
                let mut action = Dictionary::new();
                action.set("S", Object::Name(b"URI".to_vec()));
                action.set("URI", Object::string_literal(uri));
                annotation.set("A", Object::Dictionary(action));
            }
            LinkSpec::GoTo(target_page) => {
                let mut action = Dictionary::new();
                action.set("S", Object::Name(b"GoTo".to_vec()));
                action.set("D", self.explicit_destination(target_page));
                annotation.set("A", Object::Dictionary(action));
            }
            LinkSpec::GoToNamed(name) => {
                let mut action = Dictionary::new();
                action.set("S", Object::Name(b"GoTo".to_vec()));
                action.set("D", Object::string_literal(name));
                annotation.set("A", Object::Dictionary(action));
            }
            LinkSpec::DestArray(target_page) => {
                annotation.set("Dest", self.explicit_destination(target_page));
            }
            LinkSpec::DestIndex(index) => {
                annotation.set(
                    "Dest",
                    Object::Array(vec![Object::Integer(index), Object::Name(b"Fit".to_vec())]),
                );
            }
            LinkSpec::Named(name) => {
                annotation.set("Dest", Object::Name(name.as_bytes().to_vec()));
            }
            LinkSpec::Launch => {
                let mut action = Dictionary::new();
                action.set("S", Object::Name(b"Launch".to_vec()));
                annotation.set("A", Object::Dictionary(action));
            }
        }

        self.add_annotation(page, Object::Dictionary(annotation))
    }

    /// Add an entry to the catalog's `/Dests` dictionary
    pub fn add_named_destination(&mut self, name: &str, page: usize) {
        let destination = self.explicit_destination(page);
        let catalog = self
            .doc
            .get_object_mut(self.catalog_id)
            .and_then(Object::as_dict_mut)
            .expect("catalog dictionary");

        let mut dests = match catalog.get(b"Dests") {
            Ok(Object::Dictionary(dict)) => dict.clone(),
            _ => Dictionary::new(),
        };
        dests.set(name, destination);
        catalog.set("Dests", Object::Dictionary(dests));
    }

    /// Add a `/Names /Dests` tree with one intermediate level of kids
    pub fn add_name_tree_destinations(&mut self, entries: &[(&str, usize)]) {
        let mut names = Vec::new();
        for (name, page) in entries {
            names.push(Object::string_literal(*name));
            let mut wrapper = Dictionary::new();
            wrapper.set("D", self.explicit_destination(*page));
            names.push(Object::Dictionary(wrapper));
        }

        let mut leaf = Dictionary::new();
        leaf.set("Names", Object::Array(names));
        let leaf_id = self.doc.add_object(leaf);

        let mut root = Dictionary::new();
        root.set("Kids", Object::Array(vec![Object::Reference(leaf_id)]));
        let root_id = self.doc.add_object(root);

        let mut name_dict = Dictionary::new();
        name_dict.set("Dests", Object::Reference(root_id));

        let catalog = self
            .doc
            .get_object_mut(self.catalog_id)
            .and_then(Object::as_dict_mut)
            .expect("catalog dictionary");
        catalog.set("Names", Object::Dictionary(name_dict));
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    pub fn into_source(self, name: &str) -> SourceDocument {
        SourceDocument::from_document(name, self.doc, DEFAULT_MAX_DEPTH).expect("fixture source")
    }

    fn explicit_destination(&self, page: usize) -> Object {
        Object::Array(vec![
            Object::Reference(self.page_id(page)),
            Object::Name(b"Fit".to_vec()),
        ])
    }
}

pub fn rect_object(rect: [f32; 4]) -> Object {
    Object::Array(rect.iter().map(|&value| Object::Real(value)).collect())
}
