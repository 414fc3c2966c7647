//! Merge configuration

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Default recursion limit for the object resolver
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Page boundary used to size each output page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageBox {
    MediaBox,
    #[default]
    CropBox,
    BleedBox,
    TrimBox,
    ArtBox,
}

impl PageBox {
    /// Key of this box in a page dictionary
    pub fn key(&self) -> &'static [u8] {
        match self {
            PageBox::MediaBox => b"MediaBox",
            PageBox::CropBox => b"CropBox",
            PageBox::BleedBox => b"BleedBox",
            PageBox::TrimBox => b"TrimBox",
            PageBox::ArtBox => b"ArtBox",
        }
    }
}

impl fmt::Display for PageBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.key()))
    }
}

impl FromStr for PageBox {
    type Err = Error;

    /// Accepts `crop`, `CropBox`, `/CropBox` and the like
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().trim_start_matches('/').to_ascii_lowercase();
        let name = normalized.strip_suffix("box").unwrap_or(&normalized);

        match name {
            "media" => Ok(PageBox::MediaBox),
            "crop" => Ok(PageBox::CropBox),
            "bleed" => Ok(PageBox::BleedBox),
            "trim" => Ok(PageBox::TrimBox),
            "art" => Ok(PageBox::ArtBox),
            _ => Err(Error::InvalidPageBox(s.to_string())),
        }
    }
}

/// Settings shared by every step of a merge
#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// Box that defines the output page size
    pub page_box: PageBox,
    /// Recursion limit when resolving annotation and destination objects
    pub max_depth: usize,
    /// Keep links whose target is the page they sit on
    pub keep_self_links: bool,
    /// Compress streams in the output
    pub compress: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            page_box: PageBox::CropBox,
            max_depth: DEFAULT_MAX_DEPTH,
            keep_self_links: false,
            compress: true,
        }
    }
}
