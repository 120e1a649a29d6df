//! HTML and URL rendering through a headless browser.
//!
//! [`Renderer`] is generic over a [`ScreenshotBackend`] so the browser can be
//! swapped for a fake in tests. [`ChromiumBackend`] spawns
//! `chromium-headless-shell` once per call with its own temp files; parallel
//! calls share nothing.
//!
//! Temp files are held as [`tempfile::TempPath`] guards, so they are removed on
//! every return path, including early `?` returns and timeouts.

use std::future::Future;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tempfile::TempPath;
use tokio::process::Command;
use tracing::{debug, error};

use crate::{Dimensions, PipelineError, RenderOutcome};

/// Default timeout for HTML documents, which often pull in remote scripts.
pub const DEFAULT_HTML_TIMEOUT: Duration = Duration::from_millis(15_000);
/// Default timeout for rendering a file path or URL directly.
pub const DEFAULT_TARGET_TIMEOUT: Duration = Duration::from_millis(10_000);
/// Virtual time budget handed to the browser, independent of the timeout.
pub const VIRTUAL_TIME_BUDGET_MS: u64 = 10_000;
/// Extra time granted past the browser's own timeout before it is killed.
///
/// Only the direct child is killed; helper processes Chromium forked (zygote,
/// renderers) are not in its kill path and may outlive a timed-out call.
pub const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(5);

pub const DEFAULT_BINARY: &str = "chromium-headless-shell";

/// Number of leading bytes logged when a screenshot fails to decode.
const HEADER_SNIPPET_LEN: usize = 50;

/// Flags passed on every invocation regardless of target.
const HARDENING_FLAGS: &[&str] = &[
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--use-gl=swiftshader",
    "--hide-scrollbars",
    "--in-process-gpu",
    "--js-flags=--jitless",
    "--disable-zero-copy",
    "--disable-gpu-memory-buffer-compositor-resources",
    "--disable-extensions",
    "--disable-plugins",
    "--mute-audio",
    "--no-sandbox",
];

/// Something that can turn a file path or URL into a bitmap.
pub trait ScreenshotBackend: Send + Sync {
    /// Render `target` in a `size` viewport, giving up after `timeout`.
    fn capture(
        &self,
        target: &str,
        size: Dimensions,
        timeout: Duration,
    ) -> impl Future<Output = RenderOutcome> + Send;
}

/// Screenshots via an external headless Chromium process.
#[derive(Debug, Clone)]
pub struct ChromiumBackend {
    binary: PathBuf,
    virtual_time_budget_ms: u64,
    kill_grace: Duration,
}

impl Default for ChromiumBackend {
    fn default() -> Self {
        Self::new(DEFAULT_BINARY)
    }
}

impl ChromiumBackend {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            virtual_time_budget_ms: VIRTUAL_TIME_BUDGET_MS,
            kill_grace: DEFAULT_KILL_GRACE,
        }
    }

    pub fn with_virtual_time_budget(mut self, budget_ms: u64) -> Self {
        self.virtual_time_budget_ms = budget_ms;
        self
    }

    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Full argument list for one invocation, target first.
    pub fn command_args(
        &self,
        target: &str,
        screenshot: &Path,
        size: Dimensions,
        timeout: Duration,
    ) -> Vec<String> {
        let mut args = vec![
            target.to_string(),
            "--headless".to_string(),
            format!("--screenshot={}", screenshot.display()),
            format!("--window-size={},{}", size.width, size.height),
            format!("--timeout={}", timeout.as_millis()),
        ];
        args.extend(HARDENING_FLAGS.iter().map(|f| f.to_string()));
        args.push(format!("--virtual-time-budget={}", self.virtual_time_budget_ms));
        args
    }
}

impl ScreenshotBackend for ChromiumBackend {
    async fn capture(&self, target: &str, size: Dimensions, timeout: Duration) -> RenderOutcome {
        let screenshot = temp_path(".png")?;
        let args = self.command_args(target, &screenshot, size, timeout);
        debug!(
            binary = %self.binary.display(),
            target,
            %size,
            timeout_ms = timeout.as_millis() as u64,
            screenshot = %screenshot.display(),
            "Spawning headless renderer"
        );

        let child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                error!(binary = %self.binary.display(), "Failed to spawn renderer: {e}");
                PipelineError::Io(e)
            })?;

        // Dropping the wait future drops the child, which kills it.
        let deadline = timeout + self.kill_grace;
        let output = match tokio::time::timeout(deadline, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| {
                error!("Failed to wait for renderer: {e}");
                PipelineError::Io(e)
            })?,
            Err(_) => {
                error!(
                    deadline_ms = deadline.as_millis() as u64,
                    "Renderer overran its deadline, killed"
                );
                return Err(PipelineError::ProcessTimeout(deadline.as_millis() as u64));
            }
        };

        if !output.status.success() {
            let exit_code = output.status.code();
            error!(?exit_code, "Chromium process failed");
            error!("{}", String::from_utf8_lossy(&output.stderr));
            if !output.stdout.is_empty() {
                error!("{}", String::from_utf8_lossy(&output.stdout));
            }
            return Err(PipelineError::ProcessFailed { exit_code });
        }

        load_screenshot(&screenshot)
    }
}

/// Validate and decode the screenshot the browser wrote to `path`.
///
/// The whole file is read into memory before decoding, so the returned
/// image does not depend on the file once this returns.
pub fn load_screenshot(path: &Path) -> RenderOutcome {
    let path_str = path.display().to_string();

    let file_size = match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            error!(path = %path_str, "Screenshot file was not created");
            return Err(PipelineError::OutputMissing(path_str));
        }
        Err(e) => {
            error!(path = %path_str, "Failed to stat screenshot: {e}");
            return Err(PipelineError::Io(e));
        }
    };

    if file_size == 0 {
        error!(path = %path_str, "Screenshot file is empty (0 bytes)");
        return Err(PipelineError::OutputEmpty(path_str));
    }

    let bytes = std::fs::read(path).map_err(|e| {
        error!(path = %path_str, "Failed to read screenshot: {e}");
        PipelineError::Io(e)
    })?;

    image::load_from_memory(&bytes).map_err(|source| {
        let header = &bytes[..bytes.len().min(HEADER_SNIPPET_LEN)];
        error!(
            path = %path_str,
            file_size,
            "Failed to open screenshot file as image: {source}"
        );
        error!(
            "File header (first {} bytes): {}",
            header.len(),
            header.escape_ascii()
        );
        PipelineError::OutputUndecodable { file_size, source }
    })
}

/// Reserve a uniquely named temp file that is deleted when the guard drops.
fn temp_path(suffix: &str) -> Result<TempPath, PipelineError> {
    tempfile::Builder::new()
        .prefix("frame-")
        .suffix(suffix)
        .tempfile()
        .map(|f| f.into_temp_path())
        .map_err(|e| {
            error!(suffix, "Failed to create temp file: {e}");
            PipelineError::Io(e)
        })
}

/// Write `html` to a fresh `.html` temp file.
fn write_html(html: &str) -> Result<TempPath, PipelineError> {
    let mut file = tempfile::Builder::new()
        .prefix("frame-")
        .suffix(".html")
        .tempfile()?;
    file.write_all(html.as_bytes())?;
    file.flush()?;
    Ok(file.into_temp_path())
}

/// Entry points for rendering HTML documents and arbitrary targets.
#[derive(Debug, Clone, Default)]
pub struct Renderer<B = ChromiumBackend> {
    backend: B,
}

impl<B: ScreenshotBackend> Renderer<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Render an HTML document at `size`.
    ///
    /// The document is written to a temp `.html` file that is removed before
    /// this returns, whatever the outcome. `timeout` defaults to 15 s.
    pub async fn render_html(
        &self,
        html: &str,
        size: Dimensions,
        timeout: Option<Duration>,
    ) -> RenderOutcome {
        let timeout = timeout.unwrap_or(DEFAULT_HTML_TIMEOUT);
        let page = write_html(html).inspect_err(|e| {
            error!("Failed to write HTML for rendering: {e}");
        })?;
        let target = page.to_string_lossy().into_owned();
        debug!(bytes = html.len(), page = %target, "Rendering HTML document");

        self.render_target(&target, size, Some(timeout)).await
    }

    /// Render a file path or URL at `size`. `timeout` defaults to 10 s.
    pub async fn render_target(
        &self,
        target: &str,
        size: Dimensions,
        timeout: Option<Duration>,
    ) -> RenderOutcome {
        let timeout = timeout.unwrap_or(DEFAULT_TARGET_TIMEOUT);
        self.backend.capture(target, size, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::sync::Mutex;

    /// Backend that records its inputs and returns a canned result.
    #[derive(Default)]
    struct FakeBackend {
        calls: Mutex<Vec<(String, Dimensions, Duration, Option<String>)>>,
        fail: bool,
    }

    impl ScreenshotBackend for FakeBackend {
        async fn capture(&self, target: &str, size: Dimensions, timeout: Duration) -> RenderOutcome {
            let contents = std::fs::read_to_string(target).ok();
            self.calls
                .lock()
                .unwrap()
                .push((target.to_string(), size, timeout, contents));
            if self.fail {
                return Err(PipelineError::ProcessFailed { exit_code: Some(1) });
            }
            Ok(DynamicImage::ImageRgb8(RgbImage::new(size.width, size.height)))
        }
    }

    #[test]
    fn test_command_args_shape() {
        let backend = ChromiumBackend::default();
        assert_eq!(backend.binary(), Path::new(DEFAULT_BINARY));
        let args = backend.command_args(
            "https://example.com",
            Path::new("/tmp/out.png"),
            Dimensions::new(800, 480),
            Duration::from_millis(12_345),
        );
        assert_eq!(
            args,
            vec![
                "https://example.com",
                "--headless",
                "--screenshot=/tmp/out.png",
                "--window-size=800,480",
                "--timeout=12345",
                "--disable-dev-shm-usage",
                "--disable-gpu",
                "--use-gl=swiftshader",
                "--hide-scrollbars",
                "--in-process-gpu",
                "--js-flags=--jitless",
                "--disable-zero-copy",
                "--disable-gpu-memory-buffer-compositor-resources",
                "--disable-extensions",
                "--disable-plugins",
                "--mute-audio",
                "--no-sandbox",
                "--virtual-time-budget=10000",
            ]
        );
    }

    #[test]
    fn test_virtual_time_budget_override() {
        let backend = ChromiumBackend::default().with_virtual_time_budget(2500);
        let args = backend.command_args(
            "page.html",
            Path::new("out.png"),
            Dimensions::new(1, 1),
            Duration::from_secs(1),
        );
        assert_eq!(args.last().unwrap(), "--virtual-time-budget=2500");
    }

    #[tokio::test]
    async fn test_render_html_writes_and_removes_page() {
        let renderer = Renderer::new(FakeBackend::default());
        let img = renderer
            .render_html("<h1>hi</h1>", Dimensions::new(40, 30), None)
            .await
            .unwrap();
        assert_eq!((img.width(), img.height()), (40, 30));

        let calls = renderer.backend().calls.lock().unwrap();
        let (target, size, timeout, contents) = &calls[0];
        assert!(target.ends_with(".html"));
        assert_eq!(*size, Dimensions::new(40, 30));
        assert_eq!(*timeout, DEFAULT_HTML_TIMEOUT);
        assert_eq!(contents.as_deref(), Some("<h1>hi</h1>"));
        assert!(!Path::new(target).exists(), "HTML temp file left behind");
    }

    #[tokio::test]
    async fn test_render_html_removes_page_on_failure() {
        let renderer = Renderer::new(FakeBackend {
            fail: true,
            ..Default::default()
        });
        let result = renderer
            .render_html("<p>x</p>", Dimensions::new(10, 10), Some(Duration::from_secs(3)))
            .await;
        assert!(matches!(result, Err(PipelineError::ProcessFailed { .. })));

        let calls = renderer.backend().calls.lock().unwrap();
        assert_eq!(calls[0].2, Duration::from_secs(3));
        assert!(!Path::new(&calls[0].0).exists());
    }

    #[tokio::test]
    async fn test_render_target_default_timeout() {
        let renderer = Renderer::new(FakeBackend::default());
        renderer
            .render_target("https://example.com", Dimensions::new(8, 8), None)
            .await
            .unwrap();
        let calls = renderer.backend().calls.lock().unwrap();
        assert_eq!(calls[0].0, "https://example.com");
        assert_eq!(calls[0].2, DEFAULT_TARGET_TIMEOUT);
    }

    #[test]
    fn test_load_screenshot_failure_modes() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.png");
        assert!(matches!(
            load_screenshot(&missing),
            Err(PipelineError::OutputMissing(_))
        ));

        let empty = dir.path().join("empty.png");
        std::fs::write(&empty, b"").unwrap();
        assert!(matches!(
            load_screenshot(&empty),
            Err(PipelineError::OutputEmpty(_))
        ));

        let garbage = dir.path().join("garbage.png");
        std::fs::write(&garbage, b"this is not a png").unwrap();
        assert!(matches!(
            load_screenshot(&garbage),
            Err(PipelineError::OutputUndecodable { file_size: 17, .. })
        ));
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        /// Stand-in for the browser: records the screenshot path and target it
        /// was given, then runs `body` with `$out` set to the screenshot path.
        fn script_backend(dir: &TempDir, body: &str) -> ChromiumBackend {
            let record = dir.path().join("record");
            let script = format!(
                "#!/bin/sh\n\
                 out=\"\"\n\
                 for arg in \"$@\"; do\n\
                   case \"$arg\" in\n\
                     --screenshot=*) out=\"${{arg#--screenshot=}}\" ;;\n\
                   esac\n\
                 done\n\
                 echo \"$out\" > \"{record}\"\n\
                 echo \"$1\" >> \"{record}\"\n\
                 {body}\n",
                record = record.display(),
            );
            let path = dir.path().join("fake-chromium");
            std::fs::write(&path, script).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            ChromiumBackend::new(path).with_kill_grace(Duration::from_millis(200))
        }

        /// (screenshot path, target) recorded by the fake browser.
        fn recorded(dir: &TempDir) -> (PathBuf, String) {
            let text = std::fs::read_to_string(dir.path().join("record")).unwrap();
            let mut lines = text.lines();
            let screenshot = PathBuf::from(lines.next().unwrap());
            let target = lines.next().unwrap_or_default().to_string();
            (screenshot, target)
        }

        fn write_fixture_png(dir: &TempDir) -> PathBuf {
            let path = dir.path().join("fixture.png");
            DynamicImage::ImageRgb8(RgbImage::from_pixel(6, 4, Rgb([1, 2, 3])))
                .save_with_format(&path, ImageFormat::Png)
                .unwrap();
            path
        }

        async fn capture(backend: &ChromiumBackend) -> RenderOutcome {
            Renderer::new(backend.clone())
                .render_target("file:///page.html", Dimensions::new(6, 4), None)
                .await
        }

        #[tokio::test]
        async fn test_success_decodes_and_cleans_up() {
            let dir = tempfile::tempdir().unwrap();
            let fixture = write_fixture_png(&dir);
            let backend = script_backend(&dir, &format!("cp \"{}\" \"$out\"", fixture.display()));

            let img = capture(&backend).await.unwrap();
            assert_eq!((img.width(), img.height()), (6, 4));
            assert_eq!(*img.to_rgb8().get_pixel(5, 3), Rgb([1, 2, 3]));

            let (screenshot, target) = recorded(&dir);
            assert_eq!(target, "file:///page.html");
            assert!(screenshot.to_string_lossy().ends_with(".png"));
            assert!(!screenshot.exists(), "screenshot temp file left behind");
        }

        #[tokio::test]
        async fn test_nonzero_exit_is_absent() {
            let dir = tempfile::tempdir().unwrap();
            let backend = script_backend(&dir, "echo boom >&2\nexit 3");
            let err = capture(&backend).await.unwrap_err();
            assert!(matches!(err, PipelineError::ProcessFailed { exit_code: Some(3) }));
            assert!(!recorded(&dir).0.exists());
        }

        #[tokio::test]
        async fn test_missing_output_is_absent() {
            let dir = tempfile::tempdir().unwrap();
            let backend = script_backend(&dir, "rm -f \"$out\"");
            let err = capture(&backend).await.unwrap_err();
            assert!(matches!(err, PipelineError::OutputMissing(_)));
            assert!(!recorded(&dir).0.exists());
        }

        #[tokio::test]
        async fn test_empty_output_is_absent() {
            let dir = tempfile::tempdir().unwrap();
            let backend = script_backend(&dir, ": > \"$out\"");
            let err = capture(&backend).await.unwrap_err();
            assert!(matches!(err, PipelineError::OutputEmpty(_)));
            assert!(!recorded(&dir).0.exists());
        }

        #[tokio::test]
        async fn test_corrupt_output_is_absent() {
            let dir = tempfile::tempdir().unwrap();
            let backend = script_backend(&dir, "printf 'GIF89a-but-not-really' > \"$out\"");
            let err = capture(&backend).await.unwrap_err();
            assert!(matches!(err, PipelineError::OutputUndecodable { .. }));
            assert!(!recorded(&dir).0.exists());
        }

        #[tokio::test]
        async fn test_hung_process_is_killed() {
            let dir = tempfile::tempdir().unwrap();
            let backend = script_backend(&dir, "sleep 30");
            let err = Renderer::new(backend)
                .render_target("page.html", Dimensions::new(6, 4), Some(Duration::from_millis(100)))
                .await
                .unwrap_err();
            assert!(matches!(err, PipelineError::ProcessTimeout(300)));
            assert!(!recorded(&dir).0.exists());
        }

        #[tokio::test]
        async fn test_missing_binary_is_absent() {
            let backend = ChromiumBackend::new("/nonexistent/chromium-headless-shell");
            let err = capture(&backend).await.unwrap_err();
            assert!(matches!(err, PipelineError::Io(_)));
        }

        #[tokio::test]
        async fn test_render_html_hands_page_to_browser() {
            let dir = tempfile::tempdir().unwrap();
            let fixture = write_fixture_png(&dir);
            let copy = dir.path().join("page-copy.html");
            let body = format!(
                "cp \"$1\" \"{}\"\ncp \"{}\" \"$out\"",
                copy.display(),
                fixture.display()
            );
            let backend = script_backend(&dir, &body);

            let img = Renderer::new(backend)
                .render_html("<b>frame</b>", Dimensions::new(6, 4), None)
                .await
                .unwrap();
            assert_eq!((img.width(), img.height()), (6, 4));

            let (screenshot, page) = recorded(&dir);
            assert!(page.ends_with(".html"));
            assert_eq!(std::fs::read_to_string(&copy).unwrap(), "<b>frame</b>");
            assert!(!Path::new(&page).exists(), "HTML temp file left behind");
            assert!(!screenshot.exists(), "screenshot temp file left behind");
        }
    }
}
