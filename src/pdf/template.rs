//! Importing source pages as templates

use std::fmt;

use log::warn;

use super::links::{extract_links, DeferredDestination, LinkCandidate};
use super::resolve::{resolve, Node};
use super::source::{inherited_entry, DocumentId, SourceDocument};
use crate::config::{MergeConfig, PageBox};
use crate::error::{Error, Result};

/// US Letter, used when a page declares no usable box at all
const FALLBACK_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Portrait => f.write_str("portrait"),
            Orientation::Landscape => f.write_str("landscape"),
        }
    }
}

/// One source page ready to be placed in the output
#[derive(Debug, Clone, PartialEq)]
pub struct PageTemplate {
    pub document: DocumentId,
    /// 1-based page number in the source document
    pub page_number: u32,
    /// Page box `[llx lly urx ury]`, normalized
    pub bbox: [f64; 4],
    /// `/Rotate` in degrees
    pub rotation: i64,
    pub links: Vec<LinkCandidate>,
}

impl PageTemplate {
    /// Displayed width, accounting for quarter-turn rotation
    pub fn width(&self) -> f64 {
        if self.is_quarter_turn() {
            self.bbox[3] - self.bbox[1]
        } else {
            self.bbox[2] - self.bbox[0]
        }
    }

    pub fn height(&self) -> f64 {
        if self.is_quarter_turn() {
            self.bbox[2] - self.bbox[0]
        } else {
            self.bbox[3] - self.bbox[1]
        }
    }

    /// Landscape iff wider than tall
    pub fn orientation(&self) -> Orientation {
        if self.width() > self.height() {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }

    fn is_quarter_turn(&self) -> bool {
        matches!(self.rotation.rem_euclid(360), 90 | 270)
    }
}

/// Template plus the links that wait for the global resolution pass
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedPage {
    pub template: PageTemplate,
    pub deferred: Vec<DeferredDestination>,
}

/// Import one page of `source` that will become `output_page` of the merge
pub fn import_page(
    source: &SourceDocument,
    document: DocumentId,
    page_number: u32,
    output_page: u32,
    config: &MergeConfig,
) -> Result<ImportedPage> {
    let page_id = source.page_id(page_number).ok_or_else(|| Error::PageOutOfRange {
        path: source.path().to_path_buf(),
        page: page_number,
        count: source.page_count(),
    })?;

    let bbox = page_box(source, page_id, config.page_box, config.max_depth)
        .or_else(|| page_box(source, page_id, PageBox::MediaBox, config.max_depth))
        .unwrap_or_else(|| {
            warn!(
                "{} page {}: no usable page box, assuming US Letter",
                source.path().display(),
                page_number
            );
            FALLBACK_BOX
        });

    let rotation = inherited_entry(source.document(), page_id, b"Rotate")
        .and_then(|rotate| resolve(source, &Node::from(rotate), config.max_depth).as_integer())
        .unwrap_or(0);

    let extracted = extract_links(source, document, page_number, output_page, config);

    Ok(ImportedPage {
        template: PageTemplate {
            document,
            page_number,
            bbox,
            rotation,
            links: extracted.links,
        },
        deferred: extracted.deferred,
    })
}

fn page_box(source: &SourceDocument, page_id: lopdf::ObjectId, page_box: PageBox, max_depth: usize) -> Option<[f64; 4]> {
    let value = inherited_entry(source.document(), page_id, page_box.key())?;
    let value = resolve(source, &Node::from(value), max_depth);
    let items = value.as_array()?;
    if items.len() != 4 {
        return None;
    }

    let mut corners = [0.0; 4];
    for (corner, item) in corners.iter_mut().zip(items) {
        *corner = item.as_number()?;
    }

    let [x1, y1, x2, y2] = corners;
    let normalized = [x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2)];
    if normalized[2] - normalized[0] <= 0.0 || normalized[3] - normalized[1] <= 0.0 {
        return None;
    }
    Some(normalized)
}
