//! Export execution: process lifecycle, progress, cancellation.
//!
//! An export runs on a dedicated worker thread so the caller's control
//! flow never blocks on the encoder. ffmpeg writes `-progress` key/value
//! lines to stdout, which a reader thread parses into fractions; stderr
//! is collected for diagnostics. Output is written to a hidden partial
//! file and only renamed to the requested path on full success, so a
//! failed or cancelled export never leaves anything at the destination.

use clipforge_core::{ClipForgeError, RationalTime, Result};
use clipforge_timeline::Timeline;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::backend::FfmpegBackend;
use crate::command::build_ffmpeg_args;
use crate::plan::build_plan;
use crate::settings::OutputSettings;

/// Lifecycle of one export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    Idle,
    Planning,
    Executing,
    Completed,
    Failed,
    Cancelled,
}

/// Events delivered to the export handle's subscriber.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportEvent {
    StateChanged(ExportState),
    /// Monotonically increasing fraction in [0, 1].
    Progress(f64),
}

#[derive(Debug)]
struct Shared {
    state: Mutex<ExportState>,
    cancel: AtomicBool,
    events: Sender<ExportEvent>,
}

impl Shared {
    fn set_state(&self, state: ExportState) {
        *self.state.lock() = state;
        let _ = self.events.send(ExportEvent::StateChanged(state));
    }
}

/// Per-project export entry point. Holds the backend location and the
/// one-export-at-a-time guard.
pub struct Exporter {
    backend: FfmpegBackend,
    active: Arc<AtomicBool>,
}

impl Exporter {
    pub fn new(backend: FfmpegBackend) -> Self {
        Self {
            backend,
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start exporting `timeline` to `output_path`.
    ///
    /// Planning and preflight run synchronously, so validation errors
    /// surface here; encoding then proceeds on a worker thread behind
    /// the returned handle. A second call while an export is running
    /// fails with `ExportInProgress` rather than queueing.
    pub fn export(
        &self,
        timeline: &Timeline,
        output_path: &Path,
        settings: OutputSettings,
    ) -> Result<ExportHandle> {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ClipForgeError::ExportInProgress);
        }

        let result = self.start(timeline, output_path, settings);
        if result.is_err() {
            self.active.store(false, Ordering::SeqCst);
        }
        result
    }

    fn start(
        &self,
        timeline: &Timeline,
        output_path: &Path,
        settings: OutputSettings,
    ) -> Result<ExportHandle> {
        let (events_tx, events_rx) = unbounded();
        let shared = Arc::new(Shared {
            state: Mutex::new(ExportState::Idle),
            cancel: AtomicBool::new(false),
            events: events_tx,
        });

        shared.set_state(ExportState::Planning);
        let descriptors = clipforge_effects::resolve(timeline)?;
        let plan = build_plan(timeline, &descriptors, &settings)?;

        for input in plan.inputs() {
            if !input.exists() {
                return Err(ClipForgeError::MissingAsset {
                    path: input.clone(),
                    reason: "referenced by render plan but absent on disk".into(),
                });
            }
        }
        let parent = output_path.parent().unwrap_or_else(|| Path::new("."));
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            return Err(ClipForgeError::Output {
                path: output_path.to_path_buf(),
                reason: "destination directory does not exist".into(),
            });
        }
        if output_path.is_dir() {
            return Err(ClipForgeError::Output {
                path: output_path.to_path_buf(),
                reason: "destination is a directory".into(),
            });
        }

        let partial = partial_path(output_path);
        let args = build_ffmpeg_args(&plan, &partial);
        let tracker = ProgressTracker::new(plan.total_duration);

        tracing::info!(
            output = %output_path.display(),
            duration = %plan.total_duration,
            "starting export"
        );

        let worker = ExportWorker {
            ffmpeg: self.backend.ffmpeg.clone(),
            args,
            partial,
            destination: output_path.to_path_buf(),
            shared: Arc::clone(&shared),
            tracker,
        };
        let active = Arc::clone(&self.active);
        let thread = thread::Builder::new()
            .name("clipforge-export".into())
            .spawn(move || {
                let result = worker.run();
                active.store(false, Ordering::SeqCst);
                result
            })?;

        Ok(ExportHandle {
            shared,
            events: events_rx,
            thread: Some(thread),
        })
    }
}

/// Handle to an in-flight export: state inspection, progress
/// subscription, cancellation, and completion.
#[derive(Debug)]
pub struct ExportHandle {
    shared: Arc<Shared>,
    events: Receiver<ExportEvent>,
    thread: Option<thread::JoinHandle<Result<()>>>,
}

impl ExportHandle {
    pub fn state(&self) -> ExportState {
        *self.shared.state.lock()
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.state(),
            ExportState::Completed | ExportState::Failed | ExportState::Cancelled
        )
    }

    /// Event stream for progress and state transitions.
    pub fn events(&self) -> &Receiver<ExportEvent> {
        &self.events
    }

    /// Request cancellation. The pipeline transitions to `Cancelled`
    /// only once the encoder process has exited; await that via
    /// [`ExportHandle::wait`] before assuming resources are released.
    pub fn cancel(&self) {
        self.shared.cancel.store(true, Ordering::SeqCst);
    }

    /// Block until the export finishes and return its outcome.
    pub fn wait(mut self) -> Result<()> {
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| ClipForgeError::Encode {
                status: None,
                diagnostics: "export worker panicked".into(),
            })?,
            None => Ok(()),
        }
    }
}

struct ExportWorker {
    ffmpeg: PathBuf,
    args: Vec<String>,
    partial: PathBuf,
    destination: PathBuf,
    shared: Arc<Shared>,
    tracker: ProgressTracker,
}

impl ExportWorker {
    fn run(mut self) -> Result<()> {
        self.shared.set_state(ExportState::Executing);
        let result = self.encode();
        match &result {
            Ok(()) => self.shared.set_state(ExportState::Completed),
            Err(ClipForgeError::Cancelled) => self.shared.set_state(ExportState::Cancelled),
            Err(e) => {
                tracing::error!(error = %e, "export failed");
                self.shared.set_state(ExportState::Failed);
            }
        }
        result
    }

    fn encode(&mut self) -> Result<()> {
        let mut child = Command::new(&self.ffmpeg)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ClipForgeError::Encode {
                status: None,
                diagnostics: format!("failed to spawn ffmpeg: {e}"),
            })?;

        // stderr drains on its own thread; a full pipe would stall the
        // encoder. Only the tail is kept for diagnostics.
        let stderr = child.stderr.take();
        let stderr_thread = thread::spawn(move || {
            let mut tail: Vec<String> = Vec::new();
            if let Some(stderr) = stderr {
                for line in BufReader::new(stderr).lines().map_while(|l| l.ok()) {
                    if tail.len() >= 40 {
                        tail.remove(0);
                    }
                    tail.push(line);
                }
            }
            tail.join("\n")
        });

        let (progress_tx, progress_rx) = unbounded::<i64>();
        let stdout = child.stdout.take();
        let stdout_thread = thread::spawn(move || {
            if let Some(stdout) = stdout {
                for line in BufReader::new(stdout).lines().map_while(|l| l.ok()) {
                    if let Some(us) = parse_out_time_us(&line) {
                        if progress_tx.send(us).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        let mut cancelled = false;
        loop {
            match progress_rx.recv_timeout(Duration::from_millis(100)) {
                Ok(us) => {
                    if let Some(fraction) = self.tracker.observe_us(us) {
                        let _ = self.shared.events.send(ExportEvent::Progress(fraction));
                    }
                    // A dense progress stream keeps this arm hot, so the
                    // cancel flag must be checked here too, not just on
                    // timeouts.
                    if self.shared.cancel.load(Ordering::SeqCst) {
                        cancelled = true;
                        let _ = child.kill();
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    if self.shared.cancel.load(Ordering::SeqCst) {
                        cancelled = true;
                        let _ = child.kill();
                        break;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        let status = child.wait()?;
        let _ = stdout_thread.join();
        let diagnostics = stderr_thread.join().unwrap_or_default();

        if cancelled {
            let _ = fs::remove_file(&self.partial);
            tracing::info!("export cancelled, partial output removed");
            return Err(ClipForgeError::Cancelled);
        }
        if !status.success() {
            let _ = fs::remove_file(&self.partial);
            return Err(ClipForgeError::Encode {
                status: status.code(),
                diagnostics,
            });
        }

        let _ = self.shared.events.send(ExportEvent::Progress(1.0));
        fs::rename(&self.partial, &self.destination).map_err(|e| ClipForgeError::Output {
            path: self.destination.clone(),
            reason: format!("failed to promote finished export: {e}"),
        })?;
        tracing::info!(output = %self.destination.display(), "export complete");
        Ok(())
    }
}

/// Monotonic progress fraction derived from encoded output time.
/// ffmpeg occasionally reports out-of-order or overshooting values;
/// observations never decrease and never exceed 1.
#[derive(Debug)]
struct ProgressTracker {
    total_us: i64,
    last: f64,
}

impl ProgressTracker {
    fn new(total: RationalTime) -> Self {
        Self {
            total_us: (total.to_seconds_f64() * 1_000_000.0).round() as i64,
            last: 0.0,
        }
    }

    fn observe_us(&mut self, out_time_us: i64) -> Option<f64> {
        if self.total_us <= 0 {
            return None;
        }
        let fraction = (out_time_us as f64 / self.total_us as f64).clamp(0.0, 1.0);
        if fraction > self.last {
            self.last = fraction;
            Some(fraction)
        } else {
            None
        }
    }
}

/// A `-progress` stream line is `key=value`; encoded time arrives as
/// `out_time_us`.
fn parse_out_time_us(line: &str) -> Option<i64> {
    let value = line.strip_prefix("out_time_us=")?;
    value.trim().parse().ok()
}

/// Hidden sibling the encoder writes to until the export succeeds.
fn partial_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".into());
    let ext = output
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mp4".into());
    output.with_file_name(format!(".{stem}.partial.{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipforge_core::FrameRate;
    use clipforge_timeline::{Asset, MediaKind, TrackKind};
    use std::io::Write;

    #[test]
    fn test_partial_path_is_hidden_sibling() {
        let p = partial_path(Path::new("/exports/movie.mp4"));
        assert_eq!(p, PathBuf::from("/exports/.movie.partial.mp4"));
        let q = partial_path(Path::new("out.webm"));
        assert_eq!(q, PathBuf::from(".out.partial.webm"));
    }

    #[test]
    fn test_progress_is_monotonic_and_clamped() {
        let mut tracker = ProgressTracker::new(RationalTime::from_secs(10));
        assert_eq!(tracker.observe_us(2_000_000), Some(0.2));
        assert_eq!(tracker.observe_us(1_000_000), None);
        assert_eq!(tracker.observe_us(5_000_000), Some(0.5));
        assert_eq!(tracker.observe_us(50_000_000), Some(1.0));
        assert_eq!(tracker.observe_us(60_000_000), None);
    }

    #[test]
    fn test_zero_duration_yields_no_progress() {
        let mut tracker = ProgressTracker::new(RationalTime::ZERO);
        assert_eq!(tracker.observe_us(1_000_000), None);
    }

    #[test]
    fn test_parse_progress_lines() {
        assert_eq!(parse_out_time_us("out_time_us=1234567"), Some(1_234_567));
        assert_eq!(parse_out_time_us("frame=42"), None);
        assert_eq!(parse_out_time_us("progress=end"), None);
        assert_eq!(parse_out_time_us("out_time_us=bogus"), None);
    }

    fn timeline_with_fake_asset(path: &Path) -> Timeline {
        let mut tl = Timeline::new("p", 1920, 1080, FrameRate::FPS_30);
        let track = tl.add_track(TrackKind::Video, "V1");
        let asset = tl.register_asset(Asset::new(
            path,
            MediaKind::Video,
            RationalTime::from_secs(60),
        ));
        tl.insert_clip(
            track,
            asset,
            RationalTime::ZERO,
            RationalTime::from_secs(2),
            RationalTime::ZERO,
        )
        .unwrap();
        tl
    }

    #[test]
    fn test_missing_asset_fails_preflight_and_releases_guard() {
        let exporter = Exporter::new(FfmpegBackend::with_paths("/nope/ffmpeg", "/nope/ffprobe"));
        let tl = timeline_with_fake_asset(Path::new("/definitely/not/here.mp4"));
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.mp4");

        let err = exporter
            .export(&tl, &out, OutputSettings::default())
            .unwrap_err();
        assert!(matches!(err, ClipForgeError::MissingAsset { .. }));

        // The guard released, so the second failure is the same one,
        // not ExportInProgress.
        let err = exporter
            .export(&tl, &out, OutputSettings::default())
            .unwrap_err();
        assert!(matches!(err, ClipForgeError::MissingAsset { .. }));
    }

    #[test]
    fn test_unwritable_destination_fails_preflight() {
        let exporter = Exporter::new(FfmpegBackend::with_paths("/nope/ffmpeg", "/nope/ffprobe"));
        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("a.mp4");
        std::fs::File::create(&media)
            .unwrap()
            .write_all(b"x")
            .unwrap();
        let tl = timeline_with_fake_asset(&media);

        let err = exporter
            .export(
                &tl,
                Path::new("/no/such/dir/out.mp4"),
                OutputSettings::default(),
            )
            .unwrap_err();
        assert!(matches!(err, ClipForgeError::Output { .. }));
    }

    #[test]
    fn test_empty_timeline_fails_planning() {
        let exporter = Exporter::new(FfmpegBackend::with_paths("/nope/ffmpeg", "/nope/ffprobe"));
        let tl = Timeline::default();
        let dir = tempfile::tempdir().unwrap();
        let err = exporter
            .export(&tl, &dir.path().join("out.mp4"), OutputSettings::default())
            .unwrap_err();
        assert!(matches!(err, ClipForgeError::EmptyTimeline));
    }

    /// An executable stand-in for the encoder, for driving the worker
    /// without ffmpeg.
    #[cfg(unix)]
    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_cancel_leaves_no_output_files() {
        let dir = tempfile::tempdir().unwrap();
        let encoder = write_script(dir.path(), "slow-encoder", "#!/bin/sh\nsleep 30\n");
        let media = dir.path().join("a.mp4");
        fs::write(&media, b"x").unwrap();
        let tl = timeline_with_fake_asset(&media);
        let out = dir.path().join("out.mp4");

        let exporter = Exporter::new(FfmpegBackend::with_paths(&encoder, "/nope/ffprobe"));
        let handle = exporter
            .export(&tl, &out, OutputSettings::default())
            .unwrap();
        handle.cancel();
        while !handle.is_finished() {
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(handle.state(), ExportState::Cancelled);
        let err = handle.wait().unwrap_err();
        assert!(matches!(err, ClipForgeError::Cancelled));

        assert!(!out.exists());
        assert!(!partial_path(&out).exists());

        // The guard released, so a new export can start.
        let second = exporter
            .export(&tl, &out, OutputSettings::default())
            .unwrap();
        second.cancel();
        assert!(matches!(second.wait(), Err(ClipForgeError::Cancelled)));
    }

    #[cfg(unix)]
    #[test]
    fn test_cancel_overrides_dense_progress_stream() {
        let dir = tempfile::tempdir().unwrap();
        // Floods stdout with progress lines so the supervision loop
        // never idles.
        let encoder = write_script(
            dir.path(),
            "chatty-encoder",
            "#!/bin/sh\nwhile :; do echo out_time_us=500000; done\n",
        );
        let media = dir.path().join("a.mp4");
        fs::write(&media, b"x").unwrap();
        let tl = timeline_with_fake_asset(&media);
        let out = dir.path().join("out.mp4");

        let exporter = Exporter::new(FfmpegBackend::with_paths(&encoder, "/nope/ffprobe"));
        let handle = exporter
            .export(&tl, &out, OutputSettings::default())
            .unwrap();

        // Wait until the stream is demonstrably flowing, then cancel.
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        loop {
            match handle.events().recv_timeout(Duration::from_millis(100)) {
                Ok(ExportEvent::Progress(_)) => break,
                Ok(_) => {}
                Err(_) => assert!(std::time::Instant::now() < deadline, "no progress seen"),
            }
        }
        handle.cancel();
        let err = handle.wait().unwrap_err();
        assert!(matches!(err, ClipForgeError::Cancelled));
        assert!(!out.exists());
        assert!(!partial_path(&out).exists());
    }

    /// End-to-end export against a real ffmpeg install.
    #[test]
    #[ignore = "requires ffmpeg on PATH"]
    fn test_round_trip_export_with_real_backend() {
        let backend = FfmpegBackend::locate().unwrap();
        let dir = tempfile::tempdir().unwrap();

        // Synthesize two seconds of test footage to edit.
        let footage = dir.path().join("footage.mp4");
        let status = Command::new(&backend.ffmpeg)
            .args([
                "-y",
                "-f",
                "lavfi",
                "-i",
                "testsrc=size=320x240:rate=30:duration=2",
                "-pix_fmt",
                "yuv420p",
            ])
            .arg(&footage)
            .status()
            .unwrap();
        assert!(status.success());

        let asset = crate::probe::probe_asset(&backend, &footage).unwrap();
        let mut tl = Timeline::new("e2e", 320, 240, FrameRate::FPS_30);
        let track = tl.add_track(TrackKind::Video, "V1");
        let asset_id = tl.register_asset(asset);
        tl.insert_clip(
            track,
            asset_id,
            RationalTime::ZERO,
            RationalTime::from_secs(1),
            RationalTime::ZERO,
        )
        .unwrap();

        let mut settings = OutputSettings::web_hd();
        settings.width = 320;
        settings.height = 240;
        let out = dir.path().join("out.mp4");
        let exporter = Exporter::new(backend);
        let handle = exporter.export(&tl, &out, settings).unwrap();
        handle.wait().unwrap();
        assert!(out.exists());
        assert!(!partial_path(&out).exists());
    }
}
