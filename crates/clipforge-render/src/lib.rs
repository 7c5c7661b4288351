//! ClipForge Render - planning and ffmpeg export pipeline
//!
//! This crate handles:
//! - Locating the ffmpeg/ffprobe backend
//! - Asset probing on import
//! - Compiling a timeline into a deterministic execution plan
//! - Building the encoder invocation
//! - Running exports with progress reporting and cancellation

pub mod backend;
pub mod command;
pub mod pipeline;
pub mod plan;
pub mod probe;
pub mod settings;

pub use backend::FfmpegBackend;
pub use command::build_ffmpeg_args;
pub use pipeline::{ExportEvent, ExportHandle, ExportState, Exporter};
pub use plan::{build_plan, PlanStage, RenderPlan};
pub use probe::probe_asset;
pub use settings::{AudioCodec, EncoderSpeed, OutputSettings, VideoCodec};
