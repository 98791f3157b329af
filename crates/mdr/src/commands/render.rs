//! `mdr render` command implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use clap::Args;
use mdr_config::{CliSettings, Config, Profile, ProfileStore};
use mdr_convert::{BlockStatus, ConvertOptions, Converter, FileReport, RunSummary};
use mdr_diagrams::{CacheDecision, DiagramFormat, MermaidCli, RenderMode, locate_mmdc};

use crate::error::CliError;
use crate::interrupt;
use crate::output::Output;

/// Conversion options shared by `render` and `profile save`.
#[derive(Args, Debug, Default)]
pub(crate) struct RenderOptions {
    /// Markdown files or directories to convert.
    #[arg(short, long = "input", value_name = "PATH", num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    /// Scan directories recursively.
    #[arg(short, long)]
    recursive: bool,

    /// Shared output directory for images (default: docs/_assets/mermaid).
    #[arg(short, long, value_name = "DIR", conflicts_with = "images_dir")]
    out_dir: Option<PathBuf>,

    /// Place images next to each document: `per-file`, `.` or a subdirectory.
    #[arg(long, value_name = "DIR")]
    images_dir: Option<String>,

    /// Image format (png or svg).
    #[arg(short, long, value_parser = parse_format)]
    format: Option<DiagramFormat>,

    /// Only write images, leave Markdown untouched.
    #[arg(long, conflicts_with_all = ["replace", "keep_source"])]
    export: bool,

    /// Replace diagram blocks with image links.
    #[arg(long, visible_alias = "render")]
    replace: bool,

    /// Keep diagram blocks and add image links below them.
    #[arg(long)]
    keep_source: bool,

    /// Back up Markdown files before rewriting them.
    #[arg(long)]
    backup: bool,

    /// Do not back up Markdown files.
    #[arg(long, conflicts_with = "backup")]
    no_backup: bool,
}

impl RenderOptions {
    /// Rewrite mode selected by flags, if any.
    fn mode(&self) -> Option<RenderMode> {
        if self.keep_source {
            Some(RenderMode::Keep)
        } else if self.replace {
            Some(RenderMode::Replace)
        } else if self.export {
            Some(RenderMode::Export)
        } else {
            None
        }
    }

    /// Resolve backup from --backup/--no-backup flags.
    fn resolve_backup(&self) -> Option<bool> {
        self.no_backup
            .then_some(false)
            .or(self.backup.then_some(true))
    }

    /// Overrides expressed by these options.
    fn settings(&self) -> CliSettings {
        CliSettings {
            format: self.format,
            mode: self.mode(),
            out_dir: self.out_dir.clone(),
            images_dir: self.images_dir.clone(),
            backup: self.resolve_backup(),
            recursive: self.recursive.then_some(true),
            ..CliSettings::default()
        }
    }

    /// Build a profile from these options.
    pub(crate) fn to_profile(&self) -> Result<Profile, CliError> {
        if self.inputs.len() > 1 {
            return Err(CliError::Validation(
                "a profile stores a single input path".to_owned(),
            ));
        }

        Ok(Profile {
            input: self
                .inputs
                .first()
                .map(|p| p.to_string_lossy().into_owned()),
            recursive: self.recursive.then_some(true),
            format: self.format.map(|f| f.as_str().to_owned()),
            out_dir: self
                .out_dir
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
            mode: self.mode().map(|m| m.as_str().to_owned()),
            backup: self.resolve_backup(),
            per_file_images: self.images_dir.as_ref().map(|_| true),
            images_dir: self.images_dir.clone(),
        })
    }
}

fn parse_format(value: &str) -> Result<DiagramFormat, String> {
    DiagramFormat::parse(value).ok_or_else(|| format!("unsupported format {value:?} (use png or svg)"))
}

/// Arguments for the render command.
#[derive(Args, Debug)]
pub(crate) struct RenderArgs {
    #[command(flatten)]
    options: RenderOptions,

    /// Re-render images that already exist.
    #[arg(long)]
    force: bool,

    /// Show what would be done without writing anything.
    #[arg(long)]
    dry_run: bool,

    /// Per-diagram timeout in seconds (overrides config).
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Path to the mmdc executable (overrides config and discovery).
    #[arg(long, value_name = "PATH")]
    mmdc: Option<PathBuf>,

    /// Background color passed to mmdc (overrides config).
    #[arg(long, value_name = "COLOR")]
    background: Option<String>,

    /// Mermaid theme passed to mmdc (overrides config).
    #[arg(long, value_name = "NAME")]
    theme: Option<String>,

    /// Apply a saved profile before command-line options.
    #[arg(short, long, value_name = "NAME")]
    profile: Option<String>,

    /// Path to the profile store (default: .mdr/profiles.json).
    #[arg(long, value_name = "PATH")]
    store: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover mdr.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid, the renderer is missing,
    /// or no input could be processed.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let mut config = Config::load(self.config.as_deref(), None)?;
        let mut inputs = self.options.inputs.clone();

        if let Some(name) = &self.profile {
            let store_path = self.store.clone().unwrap_or_else(|| config.profiles_path());
            let store = ProfileStore::load(&store_path);
            let profile = store.get(name)?;
            config.apply_settings(&profile.to_settings()?)?;
            if inputs.is_empty()
                && let Some(input) = &profile.input
            {
                inputs.push(PathBuf::from(input));
            }
            output.info(&format!("Using profile '{name}'"));
        }
        config.apply_settings(&self.settings())?;

        if inputs.is_empty() {
            return Err(CliError::Validation(
                "no input given (use --input or a profile with an input)".to_owned(),
            ));
        }

        let render = &config.render_resolved;
        let renderer = MermaidCli::with_program(render.mmdc.clone().or_else(locate_mmdc))
            .background(render.background.clone())
            .theme(render.theme.clone())
            .timeout(render.timeout());
        let options = ConvertOptions {
            format: render.format,
            mode: render.mode,
            location: render.image_location(),
            recursive: render.recursive,
            force: self.force,
            dry_run: self.dry_run,
            backup: render.backup,
        };

        if self.dry_run {
            output.highlight("[DRY RUN] Planning only, nothing will be written.");
        } else if options.mode.rewrites_markdown() && !options.backup {
            output.warning("Markdown files will be rewritten without backup (use --backup to keep a copy).");
        }

        let cancel = Arc::new(AtomicBool::new(false));
        interrupt::install(Arc::clone(&cancel));

        let summary = Converter::new(renderer, options)
            .with_cancel_flag(cancel)
            .run(&inputs)?;
        print_summary(&output, &summary, self.dry_run);

        if summary.all_failed() {
            return Err(CliError::Failed(format!(
                "all {} file(s) failed",
                summary.failures.len()
            )));
        }
        Ok(())
    }

    /// Overrides from command-line flags.
    fn settings(&self) -> CliSettings {
        CliSettings {
            mmdc: self.mmdc.clone(),
            background: self.background.clone(),
            theme: self.theme.clone(),
            timeout_secs: self.timeout,
            ..self.options.settings()
        }
    }
}

fn print_summary(output: &Output, summary: &RunSummary, dry_run: bool) {
    for file in &summary.files {
        print_file(output, file, dry_run);
    }
    for failure in &summary.failures {
        output.error(&format!("[ERR] {}: {}", failure.path.display(), failure.error));
    }

    output.separator();
    if summary.cancelled {
        output.warning("Cancelled before all files were processed.");
    }
    output.info(&format!(
        "Done. {} file(s), {} diagram(s): {} rendered, {} cached, {} planned, {} failed; {} document(s) {}.",
        summary.files.len() + summary.failures.len(),
        summary.blocks_found(),
        summary.blocks_rendered(),
        summary.blocks_cached(),
        summary.blocks_planned(),
        summary.blocks_failed(),
        summary.documents_changed(),
        if dry_run { "to update" } else { "updated" },
    ));

    let failed = summary.blocks_failed();
    if failed > 0 {
        output.warning(&format!("{failed} diagram(s) failed to render:"));
        for (path, block) in summary.block_failures() {
            output.info(&format!(
                "  - {} block #{} (line {})",
                path.display(),
                block.index,
                block.line
            ));
        }
    }
}

fn print_file(output: &Output, file: &FileReport, dry_run: bool) {
    let path = file.path.display();

    for block in &file.blocks {
        let image = block.image_path.display();
        let at = format!("{path} #{} (line {})", block.index, block.line);
        match &block.status {
            BlockStatus::Rendered => output.success(&format!("[OK ] {at} -> {image}")),
            BlockStatus::Cached => output.muted(&format!("[SKIP] {at} -> {image} (exists)")),
            BlockStatus::Planned(CacheDecision::Render) => {
                output.highlight(&format!("[DRY] {at} -> {image} (render)"));
            }
            BlockStatus::Planned(CacheDecision::Skip) => {
                output.highlight(&format!("[DRY] {at} -> {image} (exists)"));
            }
            BlockStatus::Failed(message) => output.error(&format!("[ERR] {at}: {message}")),
        }
    }

    if file.markdown_changed {
        if dry_run {
            output.highlight(&format!("[DRY] would update {path}"));
        } else {
            output.success(&format!("[MD ] updated {path}"));
        }
    }
    if let Some(backup) = &file.backup {
        output.info(&format!("[BAK] {}", display_name(backup)));
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
