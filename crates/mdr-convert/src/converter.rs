//! Batch conversion of Markdown files.
//!
//! For each discovered file the [`Converter`] runs the pipeline:
//! read, scan, derive image paths, render missing images, rewrite the
//! Markdown, back up and write the document if its text changed.
//!
//! Files are processed one after another. Rendering failures are recorded
//! per block, and missing inputs and unreadable files per file; only an
//! unusable renderer stops the run. Documents are replaced atomically, so an
//! interrupted run never leaves a truncated file.

use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use mdr_diagrams::{
    CacheDecision, DiagramFormat, DiagramRenderer, Fingerprint, ImageKey, RenderMode,
    RewriteTarget, rewrite, scan,
};

use crate::backup::create_backup;
use crate::discover::discover;
use crate::error::ConvertError;
use crate::location::ImageLocation;
use crate::result::{BlockReport, BlockStatus, FileFailure, FileReport, RunSummary};

/// Conversion settings.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Image format to render.
    pub format: DiagramFormat,
    /// How documents are rewritten.
    pub mode: RenderMode,
    /// Where images are written.
    pub location: ImageLocation,
    /// Descend into subdirectories of directory inputs.
    pub recursive: bool,
    /// Re-render images that already exist.
    pub force: bool,
    /// Plan only; write nothing.
    pub dry_run: bool,
    /// Back up documents before overwriting them.
    pub backup: bool,
}

/// Converts Mermaid blocks in Markdown files using a [`DiagramRenderer`].
///
/// # Example
///
/// ```no_run
/// use std::path::PathBuf;
/// use mdr_convert::{ConvertOptions, Converter, ImageLocation};
/// use mdr_diagrams::{MermaidCli, RenderMode};
///
/// let options = ConvertOptions {
///     mode: RenderMode::Replace,
///     location: ImageLocation::PerDocument,
///     ..ConvertOptions::default()
/// };
/// let summary = Converter::new(MermaidCli::new(), options).run(&[PathBuf::from("docs")])?;
/// println!("rendered {} diagrams", summary.blocks_rendered());
/// # Ok::<(), mdr_convert::ConvertError>(())
/// ```
pub struct Converter<R> {
    renderer: R,
    options: ConvertOptions,
    cancel: Option<Arc<AtomicBool>>,
}

impl<R: DiagramRenderer> Converter<R> {
    /// Create a converter.
    #[must_use]
    pub fn new(renderer: R, options: ConvertOptions) -> Self {
        Self {
            renderer,
            options,
            cancel: None,
        }
    }

    /// Stop the run before the next file once `flag` is set.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Conversion settings.
    #[must_use]
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// The renderer used for diagrams.
    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Convert all Markdown files found under `inputs`.
    ///
    /// # Errors
    ///
    /// Returns a fatal [`ConvertError`] when the renderer is unavailable.
    /// Missing inputs and per-file problems are collected in the returned
    /// [`RunSummary`].
    pub fn run(&self, inputs: &[PathBuf]) -> Result<RunSummary, ConvertError> {
        let discovery = discover(inputs, self.options.recursive);
        tracing::info!(
            files = discovery.files.len(),
            mode = self.options.mode.as_str(),
            "Starting conversion"
        );

        if !self.options.dry_run {
            self.renderer.check_available()?;
        }

        let mut summary = RunSummary {
            failures: discovery.failures,
            ..RunSummary::default()
        };
        for path in discovery.files {
            if self.is_cancelled() {
                tracing::warn!("Conversion cancelled");
                summary.cancelled = true;
                break;
            }

            match self.convert_file(&path) {
                Ok(report) => summary.files.push(report),
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "File conversion failed");
                    summary.failures.push(FileFailure { path, error });
                }
            }
        }

        tracing::info!(
            files = summary.files.len(),
            rendered = summary.blocks_rendered(),
            cached = summary.blocks_cached(),
            failed = summary.blocks_failed(),
            "Conversion finished"
        );
        Ok(summary)
    }

    /// Convert a single Markdown file.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError`] if the file cannot be read, backed up or
    /// written, or if the renderer fails fatally.
    pub fn convert_file(&self, path: &Path) -> Result<FileReport, ConvertError> {
        let text = fs::read_to_string(path).map_err(|source| ConvertError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let blocks = scan(&text);
        let mut report = FileReport {
            path: path.to_path_buf(),
            blocks: Vec::with_capacity(blocks.len()),
            markdown_changed: false,
            backup: None,
        };
        if blocks.is_empty() {
            tracing::debug!(path = %path.display(), "No diagram blocks");
            return Ok(report);
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let location = self.options.location.resolve(path);

        let mut names = Vec::with_capacity(blocks.len());
        for block in &blocks {
            let fingerprint = Fingerprint::of(&block.source);
            let file_name = ImageKey {
                stem: &stem,
                index: block.index,
                fingerprint: &fingerprint,
                format: self.options.format,
            }
            .file_name();
            let image_path = location.image_path(&file_name);
            let status = self.process_block(path, block.index, block.line, &block.source, &image_path)?;

            report.blocks.push(BlockReport {
                index: block.index,
                line: block.line,
                image_path,
                link: location.link(&file_name),
                status,
            });
            names.push(file_name);
        }

        if !self.options.mode.rewrites_markdown() {
            return Ok(report);
        }

        let targets: Vec<RewriteTarget<'_>> = blocks
            .iter()
            .zip(&report.blocks)
            .zip(&names)
            .filter(|((_, block), _)| block.status.has_image())
            .map(|((block, block_report), file_name)| RewriteTarget {
                block,
                file_name,
                link: &block_report.link,
            })
            .collect();
        let updated = rewrite(&text, &stem, self.options.mode, &targets);
        if updated == text {
            return Ok(report);
        }
        report.markdown_changed = true;

        if self.options.dry_run {
            tracing::info!(path = %path.display(), "Would update Markdown");
            return Ok(report);
        }

        if self.options.backup {
            let backup = create_backup(path).map_err(|source| ConvertError::Backup {
                path: path.to_path_buf(),
                source,
            })?;
            report.backup = Some(backup);
        }

        write_atomic(path, &updated).map_err(|source| ConvertError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "Updated Markdown");

        Ok(report)
    }

    fn process_block(
        &self,
        path: &Path,
        index: usize,
        line: usize,
        source: &str,
        image_path: &Path,
    ) -> Result<BlockStatus, ConvertError> {
        let decision = CacheDecision::decide(image_path, self.options.force);

        if self.options.dry_run {
            tracing::info!(
                path = %path.display(),
                index,
                image = %image_path.display(),
                ?decision,
                "Planned diagram"
            );
            return Ok(BlockStatus::Planned(decision));
        }

        if decision == CacheDecision::Skip {
            tracing::debug!(image = %image_path.display(), "Image exists, skipping render");
            return Ok(BlockStatus::Cached);
        }

        match self
            .renderer
            .render(source, self.options.format, image_path)
        {
            Ok(()) => {
                tracing::info!(image = %image_path.display(), "Rendered diagram");
                Ok(BlockStatus::Rendered)
            }
            Err(e) if e.is_fatal() => Err(e.into()),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    index,
                    line,
                    error = %e,
                    "Diagram rendering failed"
                );
                Ok(BlockStatus::Failed(e.to_string()))
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Replace `path` with `text` through a temporary file in the same directory.
///
/// The document's permissions are carried over to the new file.
fn write_atomic(path: &Path, text: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(text.as_bytes())?;
    tmp.as_file().sync_all()?;
    if let Ok(metadata) = fs::metadata(path) {
        tmp.as_file().set_permissions(metadata.permissions())?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::time::Duration;

    use mdr_diagrams::RenderError;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const DOC: &str = "```mermaid\ngraph LR; A-->B\n```\n";

    /// Renderer that writes stub bytes and counts calls.
    #[derive(Default)]
    struct FakeRenderer {
        calls: Cell<usize>,
        checks: Cell<usize>,
        /// Sources containing this text fail to render.
        fail_on: Option<&'static str>,
        unavailable: bool,
        rendered: RefCell<Vec<PathBuf>>,
    }

    impl DiagramRenderer for FakeRenderer {
        fn check_available(&self) -> Result<(), RenderError> {
            self.checks.set(self.checks.get() + 1);
            if self.unavailable {
                Err(RenderError::NotFound)
            } else {
                Ok(())
            }
        }

        fn render(
            &self,
            source: &str,
            _format: DiagramFormat,
            output: &Path,
        ) -> Result<(), RenderError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail_on.is_some_and(|needle| source.contains(needle)) {
                return Err(RenderError::Timeout(Duration::from_secs(1)));
            }
            if let Some(parent) = output.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(output, b"IMG")?;
            self.rendered.borrow_mut().push(output.to_path_buf());
            Ok(())
        }
    }

    fn options(mode: RenderMode) -> ConvertOptions {
        ConvertOptions {
            mode,
            location: ImageLocation::PerDocument,
            ..ConvertOptions::default()
        }
    }

    fn converter(mode: RenderMode) -> Converter<FakeRenderer> {
        Converter::new(FakeRenderer::default(), options(mode))
    }

    fn write_doc(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, text).unwrap();
        path
    }

    fn expected_name(stem: &str, index: usize, source: &str) -> String {
        format!("{stem}-{index}-{}.png", Fingerprint::of(source).short())
    }

    #[test]
    fn test_export_writes_image_and_leaves_markdown() {
        let tmp = TempDir::new().unwrap();
        let doc = write_doc(tmp.path(), "a.md", DOC);

        let conv = converter(RenderMode::Export);
        let summary = conv.run(&[doc.clone()]).unwrap();

        let image = tmp
            .path()
            .join("a-images")
            .join(expected_name("a", 1, "graph LR; A-->B"));
        assert!(image.is_file());
        assert_eq!(fs::read_to_string(&doc).unwrap(), DOC);
        assert_eq!(conv.renderer().calls.get(), 1);
        assert_eq!(summary.blocks_rendered(), 1);
        assert_eq!(summary.documents_changed(), 0);
    }

    #[test]
    fn test_replace_swaps_block_for_image_link() {
        let tmp = TempDir::new().unwrap();
        let doc = write_doc(tmp.path(), "a.md", DOC);

        converter(RenderMode::Replace).run(&[doc.clone()]).unwrap();

        assert_eq!(
            fs::read_to_string(&doc).unwrap(),
            format!(
                "![a diagram](a-images/{})\n",
                expected_name("a", 1, "graph LR; A-->B")
            )
        );
    }

    #[test]
    fn test_replace_twice_is_stable_without_rendering() {
        let tmp = TempDir::new().unwrap();
        let doc = write_doc(tmp.path(), "a.md", &format!("# T\n\n{DOC}\nend\n"));

        converter(RenderMode::Replace).run(&[doc.clone()]).unwrap();
        let first = fs::read_to_string(&doc).unwrap();

        let second_run = converter(RenderMode::Replace);
        let summary = second_run.run(&[doc.clone()]).unwrap();

        assert_eq!(fs::read_to_string(&doc).unwrap(), first);
        assert_eq!(second_run.renderer().calls.get(), 0);
        assert_eq!(summary.documents_changed(), 0);
    }

    #[test]
    fn test_keep_twice_preserves_source_and_reuses_image() {
        let tmp = TempDir::new().unwrap();
        let source = "```mermaid\nsequenceDiagram\n  Alice->>Bob: Hi  \n```\n";
        let doc = write_doc(tmp.path(), "a.md", source);

        converter(RenderMode::Keep).run(&[doc.clone()]).unwrap();
        let first = fs::read_to_string(&doc).unwrap();
        assert!(first.starts_with(source));
        assert!(first.contains("<!-- mdr-rendered:a-1-"));

        let second_run = converter(RenderMode::Keep);
        let summary = second_run.run(&[doc.clone()]).unwrap();

        assert_eq!(fs::read_to_string(&doc).unwrap(), first);
        assert_eq!(second_run.renderer().calls.get(), 0);
        assert_eq!(summary.blocks_cached(), 1);
    }

    #[test]
    fn test_keep_then_replace_leaves_single_link() {
        let tmp = TempDir::new().unwrap();
        let doc = write_doc(tmp.path(), "a.md", DOC);

        converter(RenderMode::Keep).run(&[doc.clone()]).unwrap();
        let replace = converter(RenderMode::Replace);
        replace.run(&[doc.clone()]).unwrap();

        let text = fs::read_to_string(&doc).unwrap();
        assert_eq!(text.matches("![a diagram]").count(), 1);
        assert!(!text.contains("mdr-rendered"));
        assert_eq!(replace.renderer().calls.get(), 0);
    }

    #[test]
    fn test_zero_block_document_unchanged_in_every_mode() {
        let tmp = TempDir::new().unwrap();
        let text = "# Title\n\n```rust\nfn main() {}\n```\n";
        let doc = write_doc(tmp.path(), "plain.md", text);

        for mode in [RenderMode::Export, RenderMode::Replace, RenderMode::Keep] {
            let conv = converter(mode);
            let summary = conv.run(&[doc.clone()]).unwrap();

            assert_eq!(fs::read_to_string(&doc).unwrap(), text);
            assert_eq!(conv.renderer().calls.get(), 0);
            assert_eq!(summary.blocks_found(), 0);
        }
        assert!(!tmp.path().join("plain-images").exists());
    }

    #[test]
    fn test_identical_blocks_get_distinct_images() {
        let tmp = TempDir::new().unwrap();
        let doc = write_doc(tmp.path(), "a.md", &format!("{DOC}\n{DOC}"));

        let conv = converter(RenderMode::Export);
        conv.run(&[doc]).unwrap();

        let rendered = conv.renderer().rendered.borrow().clone();
        assert_eq!(rendered.len(), 2);
        assert_ne!(rendered[0], rendered[1]);
    }

    #[test]
    fn test_force_rerenders_existing_images() {
        let tmp = TempDir::new().unwrap();
        let doc = write_doc(tmp.path(), "a.md", DOC);
        converter(RenderMode::Export).run(&[doc.clone()]).unwrap();

        let cached = converter(RenderMode::Export);
        cached.run(&[doc.clone()]).unwrap();
        assert_eq!(cached.renderer().calls.get(), 0);

        let forced = Converter::new(
            FakeRenderer::default(),
            ConvertOptions {
                force: true,
                ..options(RenderMode::Export)
            },
        );
        let summary = forced.run(&[doc]).unwrap();
        assert_eq!(forced.renderer().calls.get(), 1);
        assert_eq!(summary.blocks_rendered(), 1);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let doc = write_doc(tmp.path(), "a.md", DOC);

        let conv = Converter::new(
            FakeRenderer {
                unavailable: true,
                ..FakeRenderer::default()
            },
            ConvertOptions {
                dry_run: true,
                backup: true,
                ..options(RenderMode::Replace)
            },
        );
        let summary = conv.run(&[doc.clone()]).unwrap();

        assert_eq!(fs::read_to_string(&doc).unwrap(), DOC);
        assert!(!tmp.path().join("a-images").exists());
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 1);
        assert_eq!(conv.renderer().calls.get(), 0);
        assert_eq!(conv.renderer().checks.get(), 0);

        assert_eq!(summary.blocks_planned(), 1);
        assert_eq!(
            summary.files[0].blocks[0].status,
            BlockStatus::Planned(CacheDecision::Render)
        );
        assert!(summary.files[0].markdown_changed);
        assert_eq!(summary.files[0].backup, None);
    }

    #[test]
    fn test_render_failure_leaves_block_and_reports_position() {
        let tmp = TempDir::new().unwrap();
        let text = "# T\n\n```mermaid\ngraph LR; A-->B\n```\n\n```mermaid\ngraph ??? broken\n```\n";
        let doc = write_doc(tmp.path(), "a.md", text);

        let conv = Converter::new(
            FakeRenderer {
                fail_on: Some("broken"),
                ..FakeRenderer::default()
            },
            options(RenderMode::Replace),
        );
        let summary = conv.run(&[doc.clone()]).unwrap();

        let updated = fs::read_to_string(&doc).unwrap();
        assert!(updated.contains("![a diagram](a-images/a-1-"));
        assert!(updated.contains("```mermaid\ngraph ??? broken\n```\n"));

        let failures: Vec<_> = summary.block_failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, doc.as_path());
        assert_eq!(failures[0].1.index, 2);
        assert_eq!(failures[0].1.line, 7);
        assert!(!summary.all_failed());
    }

    #[test]
    fn test_backup_before_overwrite() {
        let tmp = TempDir::new().unwrap();
        let doc = write_doc(tmp.path(), "a.md", DOC);

        let conv = Converter::new(
            FakeRenderer::default(),
            ConvertOptions {
                backup: true,
                ..options(RenderMode::Replace)
            },
        );
        let summary = conv.run(&[doc.clone()]).unwrap();

        let backup = summary.files[0].backup.clone().unwrap();
        assert_eq!(fs::read_to_string(&backup).unwrap(), DOC);
        assert_ne!(fs::read_to_string(&doc).unwrap(), DOC);
    }

    #[test]
    fn test_no_backup_when_text_unchanged() {
        let tmp = TempDir::new().unwrap();
        let doc = write_doc(tmp.path(), "a.md", DOC);

        let conv = Converter::new(
            FakeRenderer::default(),
            ConvertOptions {
                backup: true,
                ..options(RenderMode::Export)
            },
        );
        let summary = conv.run(&[doc]).unwrap();

        assert_eq!(summary.files[0].backup, None);
    }

    #[test]
    fn test_renderer_not_found_aborts_run() {
        let tmp = TempDir::new().unwrap();
        let doc = write_doc(tmp.path(), "a.md", DOC);

        let conv = Converter::new(
            FakeRenderer {
                unavailable: true,
                ..FakeRenderer::default()
            },
            options(RenderMode::Replace),
        );
        let err = conv.run(&[doc.clone()]).unwrap_err();

        assert!(matches!(err, ConvertError::Renderer(RenderError::NotFound)));
        assert!(err.is_fatal());
        assert_eq!(fs::read_to_string(&doc).unwrap(), DOC);
    }

    #[test]
    fn test_missing_input_does_not_stop_other_files() {
        let tmp = TempDir::new().unwrap();
        let doc = write_doc(tmp.path(), "a.md", DOC);
        let missing = tmp.path().join("missing.md");

        let conv = converter(RenderMode::Export);
        let summary = conv.run(&[doc.clone(), missing.clone()]).unwrap();

        assert_eq!(conv.renderer().calls.get(), 1);
        assert_eq!(summary.files.len(), 1);
        assert_eq!(summary.files[0].path, doc);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].path, missing);
        assert!(matches!(summary.failures[0].error, ConvertError::InputNotFound(_)));
        assert!(!summary.all_failed());
    }

    #[test]
    fn test_only_missing_inputs_fail_the_run() {
        let tmp = TempDir::new().unwrap();
        let summary = converter(RenderMode::Export)
            .run(&[tmp.path().join("missing.md")])
            .unwrap();

        assert!(summary.files.is_empty());
        assert!(summary.all_failed());
    }

    #[test]
    fn test_rewrite_leaves_no_temporary_files() {
        let tmp = TempDir::new().unwrap();
        let doc = write_doc(tmp.path(), "a.md", DOC);

        converter(RenderMode::Replace).run(&[doc.clone()]).unwrap();

        let mut entries: Vec<String> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        entries.sort();
        assert_eq!(entries, vec!["a-images", "a.md"]);
        assert!(fs::read_to_string(&doc).unwrap().starts_with("![a diagram]"));
    }

    #[cfg(unix)]
    #[test]
    fn test_rewrite_keeps_document_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let doc = write_doc(tmp.path(), "a.md", DOC);
        fs::set_permissions(&doc, fs::Permissions::from_mode(0o644)).unwrap();

        converter(RenderMode::Replace).run(&[doc.clone()]).unwrap();

        let mode = fs::metadata(&doc).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[test]
    fn test_unreadable_file_is_recorded() {
        let tmp = TempDir::new().unwrap();
        let doc = tmp.path().join("bad.md");
        fs::write(&doc, [0xff, 0xfe, 0x00]).unwrap();

        let summary = converter(RenderMode::Export).run(&[doc.clone()]).unwrap();

        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].path, doc);
        assert!(matches!(summary.failures[0].error, ConvertError::Read { .. }));
        assert!(summary.all_failed());
    }

    #[test]
    fn test_cancel_flag_stops_between_files() {
        let tmp = TempDir::new().unwrap();
        write_doc(tmp.path(), "a.md", DOC);
        write_doc(tmp.path(), "b.md", DOC);

        let flag = Arc::new(AtomicBool::new(true));
        let conv = converter(RenderMode::Export).with_cancel_flag(Arc::clone(&flag));
        let summary = conv.run(&[tmp.path().to_path_buf()]).unwrap();

        assert!(summary.cancelled);
        assert!(summary.files.is_empty());
        assert_eq!(conv.renderer().calls.get(), 0);
    }

    #[test]
    fn test_shared_location_links_relative_to_document() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("docs/guide")).unwrap();
        let doc = write_doc(&tmp.path().join("docs/guide"), "intro.md", DOC);

        let conv = Converter::new(
            FakeRenderer::default(),
            ConvertOptions {
                location: ImageLocation::Shared(tmp.path().join("docs/_assets/mermaid")),
                ..options(RenderMode::Replace)
            },
        );
        conv.run(&[doc.clone()]).unwrap();

        let name = expected_name("intro", 1, "graph LR; A-->B");
        assert!(tmp.path().join("docs/_assets/mermaid").join(&name).is_file());
        assert_eq!(
            fs::read_to_string(&doc).unwrap(),
            format!("![intro diagram](../../_assets/mermaid/{name})\n")
        );
    }

    #[test]
    fn test_directory_input_converts_every_document() {
        let tmp = TempDir::new().unwrap();
        write_doc(tmp.path(), "a.md", DOC);
        write_doc(tmp.path(), "b.markdown", DOC);
        write_doc(tmp.path(), "c.md", "no diagrams\n");

        let conv = converter(RenderMode::Export);
        let summary = conv.run(&[tmp.path().to_path_buf()]).unwrap();

        assert_eq!(summary.files.len(), 3);
        assert_eq!(summary.blocks_found(), 2);
        assert_eq!(conv.renderer().calls.get(), 2);
        assert!(tmp.path().join("b-images").is_dir());
    }
}
