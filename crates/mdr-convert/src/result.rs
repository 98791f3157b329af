//! Result types for conversion runs.

use std::path::{Path, PathBuf};

use mdr_diagrams::CacheDecision;

use crate::error::ConvertError;

/// Outcome of one diagram block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockStatus {
    /// The renderer produced the image.
    Rendered,
    /// The image already existed and was reused.
    Cached,
    /// Dry run: what would have happened.
    Planned(CacheDecision),
    /// The renderer failed; the block was left untouched.
    Failed(String),
}

impl BlockStatus {
    /// Whether the block's image can be referenced from the document.
    #[must_use]
    pub fn has_image(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// Per-block report.
#[derive(Debug, Clone)]
pub struct BlockReport {
    /// One-based block index within the document.
    pub index: usize,
    /// One-based line number of the opening fence.
    pub line: usize,
    /// Image file path.
    pub image_path: PathBuf,
    /// Link written into the document, relative to it.
    pub link: String,
    pub status: BlockStatus,
}

/// Per-file report.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub blocks: Vec<BlockReport>,
    /// Whether the Markdown text was (or, in a dry run, would be) rewritten.
    pub markdown_changed: bool,
    /// Backup taken before the document was overwritten.
    pub backup: Option<PathBuf>,
}

impl FileReport {
    /// Blocks whose rendering failed.
    pub fn failed_blocks(&self) -> impl Iterator<Item = &BlockReport> {
        self.blocks
            .iter()
            .filter(|b| matches!(b.status, BlockStatus::Failed(_)))
    }
}

/// A file that could not be converted.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: ConvertError,
}

/// Result of a conversion run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Files that were processed, in processing order.
    pub files: Vec<FileReport>,
    /// Files that could not be processed.
    pub failures: Vec<FileFailure>,
    /// The run stopped early because the cancellation flag was set.
    pub cancelled: bool,
}

impl RunSummary {
    /// Total diagram blocks seen.
    #[must_use]
    pub fn blocks_found(&self) -> usize {
        self.files.iter().map(|f| f.blocks.len()).sum()
    }

    /// Blocks rendered in this run.
    #[must_use]
    pub fn blocks_rendered(&self) -> usize {
        self.count_blocks(|s| matches!(s, BlockStatus::Rendered))
    }

    /// Blocks whose image was reused.
    #[must_use]
    pub fn blocks_cached(&self) -> usize {
        self.count_blocks(|s| matches!(s, BlockStatus::Cached))
    }

    /// Blocks planned in a dry run.
    #[must_use]
    pub fn blocks_planned(&self) -> usize {
        self.count_blocks(|s| matches!(s, BlockStatus::Planned(_)))
    }

    /// Blocks whose rendering failed.
    #[must_use]
    pub fn blocks_failed(&self) -> usize {
        self.count_blocks(|s| matches!(s, BlockStatus::Failed(_)))
    }

    /// Documents rewritten (or that would be rewritten).
    #[must_use]
    pub fn documents_changed(&self) -> usize {
        self.files.iter().filter(|f| f.markdown_changed).count()
    }

    /// Failed blocks together with their document.
    pub fn block_failures(&self) -> impl Iterator<Item = (&Path, &BlockReport)> {
        self.files
            .iter()
            .flat_map(|f| f.failed_blocks().map(move |b| (f.path.as_path(), b)))
    }

    /// Whether nothing could be processed: no file converted and at least one
    /// input or file failed.
    #[must_use]
    pub fn all_failed(&self) -> bool {
        self.files.is_empty() && !self.failures.is_empty()
    }

    fn count_blocks(&self, pred: impl Fn(&BlockStatus) -> bool) -> usize {
        self.files
            .iter()
            .flat_map(|f| &f.blocks)
            .filter(|b| pred(&b.status))
            .count()
    }
}
