//! Rendering options and request payloads.

use serde::{Deserialize, Serialize};

/// Options that can be configured when generating a PDF document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Left margin in pixels.
    pub margin_left: i32,

    /// Right margin in pixels.
    pub margin_right: i32,

    /// Top margin in pixels.
    pub margin_top: i32,

    /// Bottom margin in pixels.
    pub margin_bottom: i32,

    /// Whether to render the document in gray scale.
    pub grayscale: bool,

    /// Whether to render in landscape. The default, `false`, is portrait.
    pub landscape: bool,
}

impl RenderOptions {
    /// Create options with all defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set all four margins, in pixels.
    #[must_use]
    pub const fn with_margins(mut self, left: i32, right: i32, top: i32, bottom: i32) -> Self {
        self.margin_left = left;
        self.margin_right = right;
        self.margin_top = top;
        self.margin_bottom = bottom;
        self
    }

    /// Toggle gray scale rendering.
    #[must_use]
    pub const fn with_grayscale(mut self, grayscale: bool) -> Self {
        self.grayscale = grayscale;
        self
    }

    /// Toggle landscape orientation.
    #[must_use]
    pub const fn with_landscape(mut self, landscape: bool) -> Self {
        self.landscape = landscape;
        self
    }

    /// Project all known options into query string pairs.
    ///
    /// Key names are part of the wire contract and case-sensitive; booleans
    /// serialize as `true`/`false`.
    #[must_use]
    pub fn to_query(&self) -> [(&'static str, String); 6] {
        [
            ("MarginLeft", self.margin_left.to_string()),
            ("MarginRight", self.margin_right.to_string()),
            ("MarginTop", self.margin_top.to_string()),
            ("MarginBottom", self.margin_bottom.to_string()),
            ("GrayScale", self.grayscale.to_string()),
            ("Landscape", self.landscape.to_string()),
        ]
    }
}

/// A request to generate a PDF from HTML with the given options.
///
/// Used both for single-document calls and as one item of a merge batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRequest {
    /// The HTML to render.
    pub html: String,

    /// Rendering options for this document.
    #[serde(default)]
    pub options: RenderOptions,
}

impl RenderRequest {
    /// Create a request with default options.
    #[must_use]
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            options: RenderOptions::default(),
        }
    }

    /// Replace the rendering options.
    #[must_use]
    pub const fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }
}
