//! Mermaid diagram rendering for Markdown documents.
//!
//! This crate provides the per-document building blocks of `mdr`:
//! - extracting fenced `mermaid` blocks from Markdown text
//! - deriving content-addressed image names (the filesystem is the cache)
//! - rendering diagrams through the Mermaid CLI (`mmdc`)
//! - rewriting Markdown to reference the rendered images
//!
//! # Architecture
//!
//! The crate is organized into modules:
//! - [`scanner`]: Fence tracking and [`DiagramBlock`] extraction
//! - [`cache`]: [`Fingerprint`], [`ImageKey`] naming and [`CacheDecision`]
//! - [`renderer`]: [`DiagramRenderer`] trait and the [`MermaidCli`] implementation
//! - [`rewriter`]: Export, Replace and Keep rewriting with marker comments
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use mdr_diagrams::{
//!     DiagramFormat, DiagramRenderer, Fingerprint, ImageKey, MermaidCli, RenderMode,
//!     RewriteTarget, rewrite, scan,
//! };
//!
//! let text = "```mermaid\ngraph LR; A-->B\n```\n";
//! let blocks = scan(text);
//! let cli = MermaidCli::new();
//!
//! let fingerprint = Fingerprint::of(&blocks[0].source);
//! let name = ImageKey { stem: "a", index: 1, fingerprint: &fingerprint, format: DiagramFormat::Png }
//!     .file_name();
//! cli.render(&blocks[0].source, DiagramFormat::Png, &Path::new("img").join(&name))?;
//!
//! let link = format!("img/{name}");
//! let targets = [RewriteTarget { block: &blocks[0], file_name: &name, link: &link }];
//! let updated = rewrite(text, "a", RenderMode::Replace, &targets);
//! # Ok::<(), mdr_diagrams::RenderError>(())
//! ```

pub mod cache;
mod consts;
mod format;
pub mod renderer;
pub mod rewriter;
pub mod scanner;

pub use cache::{CacheDecision, Fingerprint, ImageKey, sanitize_stem};
pub use consts::{DEFAULT_BACKGROUND, DEFAULT_TIMEOUT, MERMAID_CLI_ENV};
pub use format::{DiagramFormat, RenderMode};
pub use renderer::{DiagramRenderer, MermaidCli, RenderError, locate_mmdc};
pub use rewriter::{RewriteTarget, marker, rewrite};
pub use scanner::{DiagramBlock, scan};
