//! Output format and Markdown rewrite mode.

/// Image format produced by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiagramFormat {
    /// Raster image (default).
    #[default]
    Png,
    /// Vector image.
    Svg,
}

impl DiagramFormat {
    /// Parse format from a configuration or CLI value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }

    /// Return format as string representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }

    /// File extension (without dot) for images of this format.
    #[must_use]
    pub fn extension(self) -> &'static str {
        self.as_str()
    }
}

/// How a Markdown document is rewritten around its rendered diagrams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Write image files only; the document is left untouched.
    #[default]
    Export,
    /// Replace each rendered block with an image reference.
    Replace,
    /// Keep each block and append an image reference plus a marker comment.
    Keep,
}

impl RenderMode {
    /// Parse mode from a configuration, profile or CLI value.
    ///
    /// Accepts the short names (`export`, `replace`, `keep`) as well as the
    /// long names used in saved profiles (`export_only`, `render`,
    /// `render_replace`, `render-keep`, `render_keep`).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "export" | "export_only" | "export-only" => Some(Self::Export),
            "replace" | "render" | "render_replace" | "render-replace" => Some(Self::Replace),
            "keep" | "render_keep" | "render-keep" => Some(Self::Keep),
            _ => None,
        }
    }

    /// Return mode as string representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Export => "export",
            Self::Replace => "replace",
            Self::Keep => "keep",
        }
    }

    /// Whether this mode may change the Markdown document.
    #[must_use]
    pub fn rewrites_markdown(self) -> bool {
        !matches!(self, Self::Export)
    }
}
