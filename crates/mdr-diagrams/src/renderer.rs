//! External renderer invocation.
//!
//! [`MermaidCli`] renders each diagram by running the Mermaid CLI (`mmdc`) as a
//! child process:
//! - the source is written to a temporary `diagram.mmd`
//! - `mmdc -i <src> -o <staged> -e <format> -b <background>` is spawned, with
//!   the image staged next to the source
//! - the child is polled until it exits or the timeout expires (then killed)
//! - only a successful render is moved to the final path, so a killed or
//!   failing `mmdc` never leaves a partial image behind
//!
//! The orchestrator renders through the [`DiagramRenderer`] trait so that the
//! process can be swapped out.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use crate::consts::{
    DEFAULT_BACKGROUND, DEFAULT_TIMEOUT, MERMAID_CLI_ENV, POLL_INTERVAL, PROBE_TIMEOUT,
};
use crate::format::DiagramFormat;

/// Name of the temporary diagram source file passed to `mmdc`.
const INPUT_FILE_NAME: &str = "diagram.mmd";

/// Stem of the staged image inside the work directory.
const STAGED_STEM: &str = "diagram";

/// Renders diagram source into an image file.
pub trait DiagramRenderer {
    /// Verify that the renderer can be used at all.
    ///
    /// Called once before a run. An error here aborts the run.
    fn check_available(&self) -> Result<(), RenderError>;

    /// Render `source` as `format` into `output`.
    ///
    /// Creates the parent directory of `output` if needed.
    fn render(&self, source: &str, format: DiagramFormat, output: &Path)
    -> Result<(), RenderError>;
}

/// Diagram rendering error.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// No `mmdc` executable could be located.
    #[error(
        "mmdc not found; install it with `npm install -g @mermaid-js/mermaid-cli` or set {MERMAID_CLI_ENV}"
    )]
    NotFound,

    /// The executable exists but could not be started.
    #[error("failed to start {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The renderer exited with a non-zero status (usually a diagram syntax error).
    #[error("mmdc failed ({status}): {stderr}")]
    Failed { status: ExitStatus, stderr: String },

    /// The renderer did not finish in time and was killed.
    #[error("mmdc timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// The renderer exited successfully without producing the image.
    #[error("mmdc reported success but wrote no file at {}", .0.display())]
    MissingOutput(PathBuf),

    /// I/O error (temp files, output directory).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// Whether this error makes every further render pointless.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::NotFound | Self::Spawn { .. })
    }
}

/// [`DiagramRenderer`] backed by the Mermaid CLI.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use std::time::Duration;
/// use mdr_diagrams::{DiagramFormat, DiagramRenderer, MermaidCli};
///
/// let cli = MermaidCli::new()
///     .background("white")
///     .timeout(Duration::from_secs(30));
/// cli.render("graph LR; A-->B", DiagramFormat::Svg, Path::new("out/a.svg"))?;
/// # Ok::<(), mdr_diagrams::RenderError>(())
/// ```
#[derive(Debug, Clone)]
pub struct MermaidCli {
    /// Resolved executable, `None` when discovery failed.
    program: Option<PathBuf>,
    background: String,
    theme: Option<String>,
    timeout: Duration,
}

impl Default for MermaidCli {
    fn default() -> Self {
        Self::new()
    }
}

impl MermaidCli {
    /// Create a renderer using the discovered `mmdc` (see [`locate_mmdc`]).
    #[must_use]
    pub fn new() -> Self {
        Self::with_program(locate_mmdc())
    }

    /// Create a renderer for an explicit executable.
    ///
    /// `None` behaves like a failed discovery: every call reports
    /// [`RenderError::NotFound`].
    #[must_use]
    pub fn with_program(program: Option<PathBuf>) -> Self {
        Self {
            program,
            background: DEFAULT_BACKGROUND.to_owned(),
            theme: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the background color passed to `mmdc -b`.
    ///
    /// Default is `transparent`.
    #[must_use]
    pub fn background(mut self, background: impl Into<String>) -> Self {
        self.background = background.into();
        self
    }

    /// Set the Mermaid theme passed to `mmdc -t`.
    #[must_use]
    pub fn theme(mut self, theme: Option<String>) -> Self {
        self.theme = theme;
        self
    }

    /// Set the per-diagram timeout.
    ///
    /// Default is 60 seconds.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The executable that will be run, if one was found.
    #[must_use]
    pub fn program(&self) -> Option<&Path> {
        self.program.as_deref()
    }

    fn require_program(&self) -> Result<&Path, RenderError> {
        self.program.as_deref().ok_or(RenderError::NotFound)
    }
}

impl DiagramRenderer for MermaidCli {
    fn check_available(&self) -> Result<(), RenderError> {
        let program = self.require_program()?;
        let mut command = Command::new(program);
        command
            .arg("-v")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // Only a failure to run counts; some versions exit non-zero on -v
        let status = run_with_timeout(program, &mut command, PROBE_TIMEOUT)?;
        tracing::debug!(program = %program.display(), %status, "mmdc probe finished");
        Ok(())
    }

    fn render(
        &self,
        source: &str,
        format: DiagramFormat,
        output: &Path,
    ) -> Result<(), RenderError> {
        let program = self.require_program()?;

        if let Some(parent) = output.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join(INPUT_FILE_NAME);
        fs::write(&input, source)?;

        let staged = workdir
            .path()
            .join(format!("{STAGED_STEM}.{}", format.extension()));
        let stdout_log = workdir.path().join("stdout.log");
        let stderr_log = workdir.path().join("stderr.log");

        let mut command = Command::new(program);
        command
            .arg("-i")
            .arg(&input)
            .arg("-o")
            .arg(&staged)
            .arg("-e")
            .arg(format.as_str())
            .arg("-b")
            .arg(&self.background);
        if let Some(theme) = &self.theme {
            command.arg("-t").arg(theme);
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::from(File::create(&stdout_log)?))
            .stderr(Stdio::from(File::create(&stderr_log)?));

        tracing::debug!(program = %program.display(), output = %output.display(), "running mmdc");
        let status = run_with_timeout(program, &mut command, self.timeout)?;

        if !status.success() {
            let stderr = read_log(&stderr_log);
            let stderr = if stderr.is_empty() {
                read_log(&stdout_log)
            } else {
                stderr
            };
            return Err(RenderError::Failed { status, stderr });
        }

        if !staged.is_file() {
            return Err(RenderError::MissingOutput(output.to_path_buf()));
        }

        publish(&staged, output)?;
        Ok(())
    }
}

/// Move a finished image from the work directory to `output`.
///
/// Falls back to copying through a temporary file next to `output` when the
/// two are on different filesystems.
fn publish(staged: &Path, output: &Path) -> io::Result<()> {
    if fs::rename(staged, output).is_ok() {
        return Ok(());
    }

    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    io::copy(&mut File::open(staged)?, tmp.as_file_mut())?;
    tmp.persist(output).map_err(|e| e.error)?;
    Ok(())
}

/// Locate the `mmdc` executable.
///
/// Priority:
/// 1. `MERMAID_CLI` environment variable (if it points at an existing path)
/// 2. `mmdc` / `mmdc.cmd` on `PATH`
/// 3. `%APPDATA%\npm\mmdc.cmd` on Windows
#[must_use]
pub fn locate_mmdc() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(MERMAID_CLI_ENV).map(PathBuf::from)
        && !path.as_os_str().is_empty()
        && path.exists()
    {
        return Some(path);
    }

    for name in ["mmdc", "mmdc.cmd"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    if cfg!(windows)
        && let Some(appdata) = std::env::var_os("APPDATA")
    {
        let candidate = PathBuf::from(appdata).join("npm").join("mmdc.cmd");
        if candidate.exists() {
            return Some(candidate);
        }
    }

    None
}

/// Spawn `command` and wait for it, killing the child after `timeout`.
fn run_with_timeout(
    program: &Path,
    command: &mut Command,
    timeout: Duration,
) -> Result<ExitStatus, RenderError> {
    let mut child = command.spawn().map_err(|source| RenderError::Spawn {
        program: program.to_path_buf(),
        source,
    })?;
    let start = Instant::now();

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if start.elapsed() > timeout {
            tracing::warn!(program = %program.display(), "renderer timed out, terminating");
            let _ = child.kill();
            let _ = child.wait();
            return Err(RenderError::Timeout(timeout));
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Read a captured output log, trimmed. Missing logs read as empty.
fn read_log(path: &Path) -> String {
    fs::read_to_string(path)
        .map(|s| s.trim().to_owned())
        .unwrap_or_default()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::sync::OnceLock;

    use tempfile::TempDir;

    /// Fake `mmdc` scripts, written once before any test spawns a process.
    struct Fakes {
        dir: TempDir,
    }

    impl Fakes {
        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }
    }

    const OK_SCRIPT: &str = r#"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
[ -n "$out" ] && printf 'IMAGE' > "$out"
exit 0
"#;

    const FAIL_SCRIPT: &str = "#!/bin/sh\necho 'Parse error on line 1' >&2\nexit 1\n";

    const SILENT_SCRIPT: &str = "#!/bin/sh\nexit 0\n";

    const SLOW_SCRIPT: &str = "#!/bin/sh\nsleep 5\n";

    /// Writes part of the image, then hangs.
    const PARTIAL_SCRIPT: &str = r#"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
printf 'PART' > "$out"
sleep 5
"#;

    /// Writes part of the image, then fails.
    const CRASH_SCRIPT: &str = r#"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
printf 'PART' > "$out"
echo 'browser crashed' >&2
exit 1
"#;

    fn fakes() -> &'static Fakes {
        static FAKES: OnceLock<Fakes> = OnceLock::new();
        FAKES.get_or_init(|| {
            let dir = TempDir::new().unwrap();
            for (name, body) in [
                ("ok", OK_SCRIPT),
                ("fail", FAIL_SCRIPT),
                ("silent", SILENT_SCRIPT),
                ("slow", SLOW_SCRIPT),
                ("partial", PARTIAL_SCRIPT),
                ("crash", CRASH_SCRIPT),
            ] {
                let path = dir.path().join(name);
                fs::write(&path, body).unwrap();
                fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            }
            Fakes { dir }
        })
    }

    fn cli(name: &str) -> MermaidCli {
        MermaidCli::with_program(Some(fakes().path(name)))
    }

    #[test]
    fn test_missing_program_is_not_found() {
        let cli = MermaidCli::with_program(None);
        let tmp = TempDir::new().unwrap();

        let err = cli
            .render("graph LR", DiagramFormat::Png, &tmp.path().join("a.png"))
            .unwrap_err();
        assert!(matches!(err, RenderError::NotFound));
        assert!(err.is_fatal());
        assert!(matches!(cli.check_available(), Err(RenderError::NotFound)));
    }

    #[test]
    fn test_render_success_writes_output() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("nested/dir/a-1-abc.png");

        cli("ok")
            .render("graph LR; A-->B", DiagramFormat::Png, &output)
            .unwrap();

        assert_eq!(fs::read(&output).unwrap(), b"IMAGE");
    }

    #[test]
    fn test_render_failure_reports_stderr() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("a.png");

        let err = cli("fail")
            .render("graph ??", DiagramFormat::Png, &output)
            .unwrap_err();

        match &err {
            RenderError::Failed { stderr, .. } => {
                assert_eq!(stderr, "Parse error on line 1");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
        assert!(!err.is_fatal());
        assert!(!output.exists());
    }

    #[test]
    fn test_render_without_output_file() {
        let tmp = TempDir::new().unwrap();
        let err = cli("silent")
            .render("graph LR", DiagramFormat::Svg, &tmp.path().join("a.svg"))
            .unwrap_err();

        assert!(matches!(err, RenderError::MissingOutput(_)));
    }

    #[test]
    fn test_render_timeout_kills_child() {
        let tmp = TempDir::new().unwrap();
        let start = Instant::now();

        let err = cli("slow")
            .timeout(Duration::from_millis(200))
            .render("graph LR", DiagramFormat::Png, &tmp.path().join("a.png"))
            .unwrap_err();

        assert!(matches!(err, RenderError::Timeout(_)));
        assert!(!err.is_fatal());
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_timeout_leaves_no_partial_image() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("a-1-abc.png");

        let err = cli("partial")
            .timeout(Duration::from_millis(300))
            .render("graph LR", DiagramFormat::Png, &output)
            .unwrap_err();

        assert!(matches!(err, RenderError::Timeout(_)));
        assert!(!output.exists());
        assert_eq!(
            crate::cache::CacheDecision::decide(&output, false),
            crate::cache::CacheDecision::Render
        );
    }

    #[test]
    fn test_failed_render_leaves_no_partial_image() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("a-1-abc.svg");

        let err = cli("crash")
            .render("graph LR", DiagramFormat::Svg, &output)
            .unwrap_err();

        assert!(matches!(err, RenderError::Failed { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn test_render_replaces_existing_image() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("a.png");
        fs::write(&output, b"OLD").unwrap();

        cli("ok")
            .render("graph LR", DiagramFormat::Png, &output)
            .unwrap();

        assert_eq!(fs::read(&output).unwrap(), b"IMAGE");
        let entries = fs::read_dir(tmp.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_check_available_with_working_program() {
        assert!(cli("ok").check_available().is_ok());
        // Non-zero exit on -v still counts as available
        assert!(cli("fail").check_available().is_ok());
    }

    #[test]
    fn test_spawn_failure_is_fatal() {
        let cli = cli("does-not-exist");

        let err = cli.check_available().unwrap_err();
        assert!(matches!(err, RenderError::Spawn { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_builder_settings() {
        let cli = MermaidCli::with_program(Some(PathBuf::from("/usr/bin/mmdc")))
            .background("white")
            .theme(Some("dark".to_owned()))
            .timeout(Duration::from_secs(5));

        assert_eq!(cli.program(), Some(Path::new("/usr/bin/mmdc")));
        assert_eq!(cli.background, "white");
        assert_eq!(cli.theme.as_deref(), Some("dark"));
        assert_eq!(cli.timeout, Duration::from_secs(5));
    }
}
