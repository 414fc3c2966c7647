//! Output page assignment and the resolved link table

use std::collections::BTreeMap;

use log::debug;

use super::links::{LinkRect, LinkTarget, PageRef};
use super::source::DocumentId;
use super::template::{Orientation, PageTemplate};

/// Where a finished link leads
#[derive(Debug, Clone, PartialEq)]
pub enum LinkDestination {
    Uri(String),
    /// 1-based page of the merged output
    Page(u32),
}

/// Link ready to be written to the output
#[derive(Debug, Clone, PartialEq)]
pub struct FinalLink {
    pub rect: LinkRect,
    pub destination: LinkDestination,
}

/// Finished links grouped by output page, in insertion order per page
#[derive(Debug, Default, Clone)]
pub struct ResolvedLinkTable {
    pages: BTreeMap<u32, Vec<FinalLink>>,
}

impl ResolvedLinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, output_page: u32, link: FinalLink) {
        self.pages.entry(output_page).or_default().push(link);
    }

    pub fn links_on(&self, output_page: u32) -> &[FinalLink] {
        self.pages.get(&output_page).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &[FinalLink])> {
        self.pages.iter().map(|(page, links)| (*page, links.as_slice()))
    }

    /// Total number of links across all pages
    pub fn len(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A template after it has been given an output page
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedPage {
    pub output_page: u32,
    pub document: DocumentId,
    pub page_number: u32,
    pub bbox: [f64; 4],
    pub orientation: Orientation,
}

/// Assigns output pages and remembers where each document starts
#[derive(Debug, Default)]
pub struct PageOffsetTracker {
    placed: u32,
    offsets: BTreeMap<DocumentId, u32>,
}

impl PageOffsetTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset of `document`, recorded the first time it is seen
    pub fn register(&mut self, document: DocumentId) -> u32 {
        *self.offsets.entry(document).or_insert(self.placed)
    }

    pub fn offset(&self, document: DocumentId) -> Option<u32> {
        self.offsets.get(&document).copied()
    }

    pub fn pages_placed(&self) -> u32 {
        self.placed
    }

    /// Output page the next placed template will get
    pub fn next_output_page(&self) -> u32 {
        self.placed + 1
    }

    /// Give `template` the next output page and record its resolved links
    ///
    /// Local page targets are shifted by the offset of the document they
    /// point into; global targets are kept as they are.
    pub fn place(&mut self, template: PageTemplate, table: &mut ResolvedLinkTable) -> PlacedPage {
        self.register(template.document);
        self.placed += 1;
        let output_page = self.placed;
        let orientation = template.orientation();

        for link in template.links {
            let destination = match link.target {
                LinkTarget::ExternalUri(uri) => LinkDestination::Uri(uri),
                LinkTarget::ResolvedPage(PageRef::Global(page)) => LinkDestination::Page(page),
                LinkTarget::ResolvedPage(PageRef::Local { document, page }) => match self.offset(document) {
                    Some(offset) => LinkDestination::Page(offset + page),
                    None => {
                        debug!(
                            "output page {}: dropped link into document {} which has no pages placed",
                            output_page, document.0
                        );
                        continue;
                    }
                },
            };

            table.push(
                output_page,
                FinalLink {
                    rect: link.rect,
                    destination,
                },
            );
        }

        debug!(
            "placed page {} of document {} as output page {} ({})",
            template.page_number, template.document.0, output_page, orientation
        );

        PlacedPage {
            output_page,
            document: template.document,
            page_number: template.page_number,
            bbox: template.bbox,
            orientation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::links::LinkCandidate;

    fn template(document: usize, page_number: u32, links: Vec<LinkCandidate>) -> PageTemplate {
        PageTemplate {
            document: DocumentId(document),
            page_number,
            bbox: [0.0, 0.0, 612.0, 792.0],
            rotation: 0,
            links,
        }
    }

    fn link(target: LinkTarget) -> LinkCandidate {
        LinkCandidate {
            rect: LinkRect::from_corners(0.0, 0.0, 10.0, 10.0),
            target,
        }
    }

    #[test]
    fn test_offsets_are_cumulative() {
        let mut tracker = PageOffsetTracker::new();
        let mut table = ResolvedLinkTable::new();

        for page in 1..=3 {
            tracker.place(template(0, page, vec![]), &mut table);
        }
        let placed = tracker.place(template(1, 1, vec![]), &mut table);

        assert_eq!(placed.output_page, 4);
        assert_eq!(tracker.offset(DocumentId(0)), Some(0));
        assert_eq!(tracker.offset(DocumentId(1)), Some(3));
        assert_eq!(tracker.next_output_page(), 5);
        assert!(table.is_empty());
    }

    #[test]
    fn test_register_keeps_first_offset() {
        let mut tracker = PageOffsetTracker::new();
        let mut table = ResolvedLinkTable::new();

        assert_eq!(tracker.register(DocumentId(0)), 0);
        tracker.place(template(0, 1, vec![]), &mut table);
        assert_eq!(tracker.register(DocumentId(0)), 0);
        assert_eq!(tracker.register(DocumentId(1)), 1);
    }

    #[test]
    fn test_links_transcribed_with_target_document_offset() {
        let mut tracker = PageOffsetTracker::new();
        let mut table = ResolvedLinkTable::new();

        tracker.place(template(0, 1, vec![]), &mut table);
        tracker.place(template(0, 2, vec![]), &mut table);
        tracker.register(DocumentId(1));

        let links = vec![
            link(LinkTarget::ExternalUri("https://example.com".to_string())),
            link(LinkTarget::ResolvedPage(PageRef::Local {
                document: DocumentId(1),
                page: 2,
            })),
            link(LinkTarget::ResolvedPage(PageRef::Global(1))),
            link(LinkTarget::ResolvedPage(PageRef::Local {
                document: DocumentId(7),
                page: 1,
            })),
        ];
        let placed = tracker.place(template(1, 1, links), &mut table);

        let destinations: Vec<LinkDestination> = table
            .links_on(placed.output_page)
            .iter()
            .map(|link| link.destination.clone())
            .collect();
        assert_eq!(
            destinations,
            vec![
                LinkDestination::Uri("https://example.com".to_string()),
                LinkDestination::Page(4),
                LinkDestination::Page(1),
            ]
        );
        assert_eq!(table.len(), 3);
        assert!(table.links_on(1).is_empty());
    }
}
