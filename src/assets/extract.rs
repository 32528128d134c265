//! Text-level scan of export documents for asset URLs.

use crate::config::Config;
use crate::error::Result;
use crate::types::{AssetKind, AssetReference};
use regex::bytes::{CaptureMatches, Regex};

/// Finds asset URLs in raw export bytes
///
/// The export is treated as opaque text: only `"url": "<storage URL>"` pairs
/// are recognized, wherever they appear in the document.
#[derive(Clone, Debug)]
pub struct AssetExtractor {
    attachments: Regex,
    backgrounds: Regex,
}

impl AssetExtractor {
    /// Build the patterns for the configured storage hosts
    ///
    /// # Errors
    /// Returns [`crate::Error::Pattern`] if a pattern fails to compile.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            attachments: Regex::new(&Self::pattern_for(
                &config.asset_host(AssetKind::Attachment),
            ))?,
            backgrounds: Regex::new(&Self::pattern_for(
                &config.asset_host(AssetKind::Background),
            ))?,
        })
    }

    /// Pattern matching a `url` string field whose value lives under `host`
    pub fn pattern_for(host: &str) -> String {
        format!(r#""url": ?"(https?://{}/[^"]+)""#, regex::escape(host))
    }

    /// Lazily iterate the URLs of one kind, in document order, duplicates kept
    pub fn extract<'r, 'h>(&'r self, export: &'h [u8], kind: AssetKind) -> AssetMatches<'r, 'h> {
        let pattern = match kind {
            AssetKind::Attachment => &self.attachments,
            AssetKind::Background => &self.backgrounds,
        };
        AssetMatches {
            kind,
            captures: pattern.captures_iter(export),
        }
    }
}

/// Iterator over asset references found by [`AssetExtractor::extract`]
pub struct AssetMatches<'r, 'h> {
    kind: AssetKind,
    captures: CaptureMatches<'r, 'h>,
}

impl Iterator for AssetMatches<'_, '_> {
    type Item = AssetReference;

    fn next(&mut self) -> Option<Self::Item> {
        let caps = self.captures.next()?;
        let url = caps.get(1)?;
        Some(AssetReference {
            kind: self.kind,
            url: String::from_utf8_lossy(url.as_bytes()).into_owned(),
        })
    }
}
