//! Assembling the merged document
//!
//! Source object graphs are renumbered one after another and concatenated
//! under a fresh page tree. Source link annotations are replaced by the
//! entries of the [`ResolvedLinkTable`].

use std::collections::{BTreeMap, HashMap};

use lopdf::{Dictionary, Document, Object, ObjectId};
use log::{debug, warn};

use super::links::LinkRect;
use super::placement::{LinkDestination, PlacedPage, ResolvedLinkTable};
use super::source::{inherited_entry, DocumentId, SourceDocument};
use crate::config::MergeConfig;
use crate::error::{Error, Result};

/// Page attributes that may be inherited from the source page tree
const INHERITED_KEYS: [&[u8]; 3] = [b"Resources", b"CropBox", b"Rotate"];

/// Build the merged document from the placed pages and the finished links
pub fn assemble(
    sources: &[SourceDocument],
    placed: &[PlacedPage],
    links: &ResolvedLinkTable,
    config: &MergeConfig,
) -> Result<Document> {
    let by_source_page: HashMap<(DocumentId, u32), &PlacedPage> = placed
        .iter()
        .map(|page| ((page.document, page.page_number), page))
        .collect();

    // Define a starting max_id for merged document
    let mut max_id = 1;
    let mut page_slots: Vec<Option<ObjectId>> = vec![None; placed.len()];
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for (index, source) in sources.iter().enumerate() {
        let document = DocumentId(index);
        let mut doc = source.document().clone();

        // Renumber objects in this document to avoid conflicts
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        for (page_number, page_id) in doc.get_pages() {
            let Some(placed_page) = by_source_page.get(&(document, page_number)) else {
                continue;
            };
            prepare_page(&mut doc, page_id, placed_page.bbox)?;

            let slot = page_slots
                .get_mut(placed_page.output_page as usize - 1)
                .ok_or_else(|| Error::General(format!("output page {} out of range", placed_page.output_page)))?;
            *slot = Some(page_id);
        }

        objects.extend(doc.objects);
    }

    let page_ids: Vec<ObjectId> = page_slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| slot.ok_or_else(|| Error::General(format!("output page {} has no source page", index + 1))))
        .collect::<Result<_>>()?;

    let mut merged_doc = Document::with_version("1.5");
    merged_doc.objects.extend(objects);

    // New ids must come after every renumbered source object
    merged_doc.max_id = max_id - 1;

    let pages_id = merged_doc.new_object_id();

    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();
    let mut pages_object = Dictionary::new();
    pages_object.set("Type", Object::Name(b"Pages".to_vec()));
    pages_object.set("Count", Object::Integer(page_ids.len() as i64));
    pages_object.set("Kids", Object::Array(kids));

    let catalog_id = merged_doc.new_object_id();
    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));

    merged_doc.objects.insert(catalog_id, Object::Dictionary(catalog));
    merged_doc.objects.insert(pages_id, Object::Dictionary(pages_object));
    merged_doc.trailer.set("Root", Object::Reference(catalog_id));

    for &page_id in &page_ids {
        if let Ok(Object::Dictionary(dict)) = merged_doc.get_object_mut(page_id) {
            dict.set("Parent", Object::Reference(pages_id));
        }
    }

    let written = write_links(&mut merged_doc, &page_ids, links)?;
    debug!("wrote {} link annotations", written);

    let pruned = merged_doc.prune_objects();
    debug!("pruned {} unreachable objects", pruned.len());

    if config.compress {
        merged_doc.compress();
    }

    Ok(merged_doc)
}

/// Serialize a document to bytes
pub fn serialize(doc: &mut Document) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

/// Detach a page from its source tree: materialize inherited attributes,
/// size it to the template box and drop the source's link annotations.
fn prepare_page(doc: &mut Document, page_id: ObjectId, bbox: [f64; 4]) -> Result<()> {
    let inherited: Vec<(&[u8], Object)> = INHERITED_KEYS
        .iter()
        .filter_map(|key| inherited_entry(doc, page_id, key).map(|value| (*key, value.clone())))
        .collect();
    let kept_annotations = non_link_annotations(doc, page_id);

    let dict = doc.get_object_mut(page_id)?.as_dict_mut()?;
    for (key, value) in inherited {
        dict.set(key, value);
    }
    dict.set("MediaBox", number_array(&bbox));

    match kept_annotations {
        Some(annotations) if annotations.is_empty() => {
            dict.remove(b"Annots");
        }
        Some(annotations) => {
            dict.set("Annots", Object::Array(annotations));
        }
        None => {}
    }

    Ok(())
}

/// Annotations of a page that are not links, or `None` without `/Annots`
fn non_link_annotations(doc: &Document, page_id: ObjectId) -> Option<Vec<Object>> {
    let page = doc.get_object(page_id).ok()?.as_dict().ok()?;
    let annots = match page.get(b"Annots").ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };

    let items = annots.as_array().ok()?;
    Some(items.iter().filter(|item| !is_link_annotation(doc, item)).cloned().collect())
}

fn is_link_annotation(doc: &Document, item: &Object) -> bool {
    let annotation = match item {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    };

    let subtype = annotation
        .and_then(|annotation| annotation.as_dict().ok())
        .and_then(|dict| dict.get(b"Subtype").ok());

    matches!(subtype, Some(Object::Name(name)) if name.as_slice() == b"Link")
}

fn write_links(doc: &mut Document, page_ids: &[ObjectId], links: &ResolvedLinkTable) -> Result<usize> {
    let mut written = 0;

    for (output_page, page_links) in links.iter() {
        let Some(page_id) = page_at(page_ids, output_page) else {
            warn!("dropped {} links on missing output page {}", page_links.len(), output_page);
            continue;
        };

        let mut annotation_refs = Vec::new();
        for link in page_links {
            let annotation = match &link.destination {
                LinkDestination::Uri(uri) => uri_annotation(&link.rect, uri),
                LinkDestination::Page(target) => match page_at(page_ids, *target) {
                    Some(target_id) => page_annotation(&link.rect, target_id),
                    None => {
                        warn!(
                            "output page {}: dropped link to page {} (document has {} pages)",
                            output_page,
                            target,
                            page_ids.len()
                        );
                        continue;
                    }
                },
            };
            annotation_refs.push(Object::Reference(doc.add_object(annotation)));
        }

        if annotation_refs.is_empty() {
            continue;
        }
        written += annotation_refs.len();

        let dict = doc.get_object_mut(page_id)?.as_dict_mut()?;
        let mut annots = match dict.get(b"Annots") {
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        annots.extend(annotation_refs);
        dict.set("Annots", Object::Array(annots));
    }

    Ok(written)
}

fn page_at(page_ids: &[ObjectId], page: u32) -> Option<ObjectId> {
    let index = page.checked_sub(1)? as usize;
    page_ids.get(index).copied()
}

fn link_annotation(rect: &LinkRect) -> Dictionary {
    let mut annotation = Dictionary::new();
    annotation.set("Type", Object::Name(b"Annot".to_vec()));
    annotation.set("Subtype", Object::Name(b"Link".to_vec()));
    annotation.set("Rect", number_array(&rect.to_corners()));
    annotation.set(
        "Border",
        Object::Array(vec![Object::Integer(0), Object::Integer(0), Object::Integer(0)]),
    );
    annotation
}

fn uri_annotation(rect: &LinkRect, uri: &str) -> Dictionary {
    let mut action = Dictionary::new();
    action.set("S", Object::Name(b"URI".to_vec()));
    action.set("URI", Object::string_literal(uri));

    let mut annotation = link_annotation(rect);
    annotation.set("A", Object::Dictionary(action));
    annotation
}

fn page_annotation(rect: &LinkRect, target: ObjectId) -> Dictionary {
    let mut annotation = link_annotation(rect);
    annotation.set(
        "Dest",
        Object::Array(vec![Object::Reference(target), Object::Name(b"Fit".to_vec())]),
    );
    annotation
}

fn number_array(values: &[f64]) -> Object {
    Object::Array(values.iter().map(|&value| Object::Real(value as f32)).collect())
}
