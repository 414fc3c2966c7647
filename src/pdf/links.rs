//! Link annotation extraction
//!
//! Every `/Link` annotation on a source page is classified into one of:
//!
//! - an external URI,
//! - a page of a known document (explicit destination, `GoTo` action, or a
//!   `.../curator#curated-page-<n>` URI),
//! - a page found through this document's named destinations,
//! - a name that can only be resolved once every document has been scanned.
//!
//! Anything malformed is skipped with a debug log; link extraction never
//! fails a merge.

use std::fmt;

use log::debug;

use super::destinations::destination_page;
use super::resolve::{direct, resolve, Node};
use super::source::{DocumentId, SourceDocument};
use crate::config::MergeConfig;

/// Marker that turns a URI into a cross-file link: `<anything>/curator#<name>`
const CURATOR_MARKER: &str = "/curator#";

/// Prefix of curated names that carry an explicit page number
const CURATED_PAGE_PREFIX: &str = "curated-page-";

/// Link rectangle in page coordinates
///
/// `h` is negated: a source `/Rect [x1 y1 x2 y2]` becomes
/// `x = x1, y = y1, w = x2 - x1, h = -(y2 - y1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl LinkRect {
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x: x1,
            y: y1,
            w: x2 - x1,
            h: -(y2 - y1),
        }
    }

    /// Back to `[x1 y1 x2 y2]`
    pub fn to_corners(&self) -> [f64; 4] {
        [self.x, self.y, self.x + self.w, self.y - self.h]
    }
}

impl fmt::Display for LinkRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x1, y1, x2, y2] = self.to_corners();
        write!(f, "[{:.1} {:.1} {:.1} {:.1}]", x1, y1, x2, y2)
    }
}

/// Page a link points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRef {
    /// 1-based page of a specific document, mapped to the output on placement
    Local { document: DocumentId, page: u32 },
    /// Page number in the merged output
    Global(u32),
}

/// Resolved target of a link candidate
#[derive(Debug, Clone, PartialEq)]
pub enum LinkTarget {
    ExternalUri(String),
    ResolvedPage(PageRef),
}

/// Link found on a source page whose target is already known
#[derive(Debug, Clone, PartialEq)]
pub struct LinkCandidate {
    pub rect: LinkRect,
    pub target: LinkTarget,
}

/// Link pointing at a destination name not (yet) resolvable
#[derive(Debug, Clone, PartialEq)]
pub struct DeferredDestination {
    pub rect: LinkRect,
    pub name: String,
    /// Resolve through curated (`file:///...#name`) destinations
    pub cross_file: bool,
    /// Output page the finished link is attached to
    pub output_page: u32,
}

/// Result of scanning one page
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExtractedLinks {
    pub links: Vec<LinkCandidate>,
    pub deferred: Vec<DeferredDestination>,
}

impl ExtractedLinks {
    pub fn is_empty(&self) -> bool {
        self.links.is_empty() && self.deferred.is_empty()
    }
}

/// Where the page being scanned sits
#[derive(Debug, Clone, Copy)]
struct PageContext {
    document: DocumentId,
    page_number: u32,
    output_page: u32,
}

impl PageContext {
    fn is_self(&self, page: PageRef) -> bool {
        match page {
            PageRef::Local { document, page } => document == self.document && page == self.page_number,
            PageRef::Global(page) => page == self.output_page,
        }
    }
}

/// Collect the links of one source page
///
/// `output_page` is the page this source page will occupy in the merged
/// document; it is recorded on deferred destinations and used to spot links
/// to the page itself.
pub fn extract_links(
    source: &SourceDocument,
    document: DocumentId,
    page_number: u32,
    output_page: u32,
    config: &MergeConfig,
) -> ExtractedLinks {
    let mut extracted = ExtractedLinks::default();

    let annots = match source.page_node(page_number).and_then(|page| page.get("Annots").cloned()) {
        Some(annots) => direct(source, &annots, config.max_depth),
        None => return extracted,
    };

    let context = PageContext {
        document,
        page_number,
        output_page,
    };

    let mut extractor = Extractor {
        source,
        context,
        config,
        extracted: &mut extracted,
    };
    for item in annots.as_array().unwrap_or_default() {
        let annotation = direct(source, item, config.max_depth);
        if let Err(reason) = extractor.annotation(&annotation) {
            debug!(
                "{} page {}: skipped link annotation: {}",
                source.path().display(),
                page_number,
                reason
            );
        }
    }

    extracted
}

struct Extractor<'a> {
    source: &'a SourceDocument,
    context: PageContext,
    config: &'a MergeConfig,
    extracted: &'a mut ExtractedLinks,
}

impl Extractor<'_> {
    fn resolve(&self, node: &Node) -> Node {
        resolve(self.source, node, self.config.max_depth)
    }

    fn direct(&self, node: &Node) -> Node {
        direct(self.source, node, self.config.max_depth)
    }

    fn annotation(&mut self, annotation: &Node) -> Result<(), String> {
        if !self.is_link_annotation(annotation) {
            return Ok(());
        }

        let rect = annotation
            .get("Rect")
            .map(|rect| self.resolve(rect))
            .and_then(|rect| parse_rect(&rect))
            .ok_or("rectangle is not a 4-element array")?;

        if let Some(action) = annotation.get("A") {
            let action = self.direct(action);
            let kind = action
                .get("S")
                .map(|kind| self.resolve(kind))
                .ok_or("action has no /S entry")?;

            match kind.as_name() {
                Some("URI") => self.uri_action(rect, &action),
                Some("GoTo") => {
                    let destination = action.get("D").ok_or("GoTo action has no /D entry")?;
                    self.destination(rect, destination)
                }
                Some(other) => Err(format!("unsupported action /{}", other)),
                None => Err("action type is not a name".to_string()),
            }
        } else if let Some(destination) = annotation.get("Dest") {
            self.destination(rect, destination)
        } else {
            Err("link has neither an action nor a destination".to_string())
        }
    }

    fn is_link_annotation(&self, annotation: &Node) -> bool {
        if !annotation.is_dictionary() {
            return false;
        }

        let type_ok = annotation
            .get("Type")
            .map_or(true, |kind| self.resolve(kind).is_name("Annot"));
        let subtype_ok = annotation
            .get("Subtype")
            .map_or(false, |subtype| self.resolve(subtype).is_name("Link"));

        type_ok && subtype_ok
    }

    fn uri_action(&mut self, rect: LinkRect, action: &Node) -> Result<(), String> {
        let uri = action
            .get("URI")
            .map(|uri| self.resolve(uri))
            .and_then(|uri| uri.as_text())
            .ok_or("URI action has no string /URI")?;
        let uri = uri.replace('\0', "");
        let uri = uri.trim();

        match curator_fragment(uri) {
            Some(name) => match name.strip_prefix(CURATED_PAGE_PREFIX) {
                Some(_) => {
                    let page = curated_page_number(name)
                        .filter(|page| (1..=self.source.page_count()).contains(page))
                        .ok_or_else(|| format!("curated page link '{}' is out of range", name))?;
                    // Curated page links are kept even when they point at their own page
                    self.push_resolved(
                        rect,
                        PageRef::Local {
                            document: self.context.document,
                            page,
                        },
                    );
                    Ok(())
                }
                None => {
                    self.defer(rect, name, true);
                    Ok(())
                }
            },
            None if !uri.is_empty() => {
                self.extracted.links.push(LinkCandidate {
                    rect,
                    target: LinkTarget::ExternalUri(uri.to_string()),
                });
                Ok(())
            }
            None => Err("URI is empty".to_string()),
        }
    }

    fn destination(&mut self, rect: LinkRect, destination: &Node) -> Result<(), String> {
        let destination = self.direct(destination);

        if destination.as_array().is_some() {
            let page = destination_page(self.source, &destination, self.config.max_depth)
                .ok_or("destination page is not part of this document")?;
            return self.push_page(
                rect,
                PageRef::Local {
                    document: self.context.document,
                    page,
                },
            );
        }

        let name = destination
            .as_destination_name()
            .ok_or("destination is neither an array nor a name")?;
        match self.source.lookup_local(&name) {
            Some(page) => self.push_page(rect, PageRef::Global(page)),
            None => {
                self.defer(rect, &name, false);
                Ok(())
            }
        }
    }

    fn push_page(&mut self, rect: LinkRect, page: PageRef) -> Result<(), String> {
        if self.context.is_self(page) && !self.config.keep_self_links {
            return Err("link targets its own page".to_string());
        }

        self.push_resolved(rect, page);
        Ok(())
    }

    fn push_resolved(&mut self, rect: LinkRect, page: PageRef) {
        self.extracted.links.push(LinkCandidate {
            rect,
            target: LinkTarget::ResolvedPage(page),
        });
    }

    fn defer(&mut self, rect: LinkRect, name: &str, cross_file: bool) {
        self.extracted.deferred.push(DeferredDestination {
            rect,
            name: name.to_string(),
            cross_file,
            output_page: self.context.output_page,
        });
    }
}

fn parse_rect(node: &Node) -> Option<LinkRect> {
    let items = node.as_array()?;
    if items.len() != 4 {
        return None;
    }

    let x1 = items[0].as_number()?;
    let y1 = items[1].as_number()?;
    let x2 = items[2].as_number()?;
    let y2 = items[3].as_number()?;
    Some(LinkRect::from_corners(x1, y1, x2, y2))
}

/// Name after the last `/curator#`, if the URI uses the cross-file convention
pub fn curator_fragment(uri: &str) -> Option<&str> {
    let index = uri.rfind(CURATOR_MARKER)?;
    let name = &uri[index + CURATOR_MARKER.len()..];

    if index == 0 || name.is_empty() || name.contains('/') {
        return None;
    }
    Some(name)
}

/// `curated-page-5` → 5 (digits after the last `-`)
fn curated_page_number(name: &str) -> Option<u32> {
    let (_, digits) = name.rsplit_once('-')?;
    digits.parse().ok()
}
