//! Global resolution of deferred destinations
//!
//! Runs once, after every document has been imported, so destinations defined
//! late in the merge order are visible to links authored earlier. A name that
//! matches in more than one document is ambiguous and is never resolved.

use std::collections::HashSet;

use log::debug;

use super::links::DeferredDestination;
use super::placement::{FinalLink, LinkDestination, ResolvedLinkTable};
use super::source::SourceDocument;

/// Destination names known to match more than one document
///
/// Names are compared literally.
#[derive(Debug, Default, Clone)]
pub struct AmbiguousNames {
    names: HashSet<String>,
}

impl AmbiguousNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn insert(&mut self, name: &str) {
        self.names.insert(name.to_string());
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Outcome counts of one resolution pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionReport {
    pub resolved: usize,
    pub unmatched: usize,
    pub ambiguous: usize,
}

enum Matches {
    None,
    One(u32),
    Many,
}

/// Search every document for each deferred name and finalize unique matches
pub fn resolve_deferred(
    deferred: &[DeferredDestination],
    sources: &[SourceDocument],
    ambiguous: &mut AmbiguousNames,
    table: &mut ResolvedLinkTable,
) -> ResolutionReport {
    let mut report = ResolutionReport::default();

    for destination in deferred {
        if ambiguous.contains(&destination.name) {
            report.ambiguous += 1;
            continue;
        }

        match find_matches(destination, sources) {
            Matches::None => {
                debug!("destination '{}' not found in any document", destination.name);
                report.unmatched += 1;
            }
            Matches::Many => {
                debug!("destination '{}' is defined in several documents", destination.name);
                ambiguous.insert(&destination.name);
                report.ambiguous += 1;
            }
            Matches::One(page) => {
                table.push(
                    destination.output_page,
                    FinalLink {
                        rect: destination.rect,
                        destination: LinkDestination::Page(page),
                    },
                );
                report.resolved += 1;
            }
        }
    }

    report
}

fn find_matches(destination: &DeferredDestination, sources: &[SourceDocument]) -> Matches {
    let mut found = Matches::None;

    for source in sources {
        let page = if destination.cross_file {
            source.lookup_curated(&destination.name)
        } else {
            source.lookup_local(&destination.name)
        };

        if let Some(page) = page {
            match found {
                Matches::None => found = Matches::One(page),
                _ => return Matches::Many,
            }
        }
    }

    found
}
