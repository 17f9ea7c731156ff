//! clipscan
//!
//! Event-triggered video clipping. The crate scans a recording for
//! detector-visible events and produces either a trimmed clip (sparse scan,
//! rewind, dense review around each event) or a fully annotated copy (every
//! frame boxed and labeled).
//!
//! # Module structure
//!
//! - `engine`: the two-mode segment extraction state machine (the core)
//! - `annotate`: the dense per-frame annotation variant
//! - `source`: frame sources (synthetic, FFmpeg files behind `source-ffmpeg`)
//! - `detect`: detector backends (stub, ONNX via `backend-tract`)
//! - `sink`: frame sinks (in-memory recorder, JPEG directory)
//! - `overlay`: box/label/caption drawing
//! - `config`: run configuration (file, env, defaults)
//!
//! Sources, detectors, and sinks are trait collaborators so the engine can
//! be exercised with scripted fakes; model inference and media decode stay
//! behind those seams.

pub mod annotate;
pub mod config;
pub mod detect;
pub mod engine;
pub mod frame;
pub mod overlay;
pub mod sink;
pub mod source;

pub use annotate::annotate_video;
pub use config::ClipConfig;
pub use detect::{BackendRegistry, BoundingBox, Detection, DetectorBackend, StubBackend};
#[cfg(feature = "backend-tract")]
pub use detect::TractBackend;
pub use engine::{ClipEngine, RunSummary, ScanState};
pub use frame::Frame;
pub use sink::{FrameSink, ImageDirSink, MemorySink};
#[cfg(feature = "source-ffmpeg")]
pub use source::FileSource;
pub use source::{FrameSource, SyntheticSource};
