//! Turn execution pipeline.
//!
//! A turn flows through these stages: the orchestrator admits the request
//! and claims the session's exclusive slot, the engine runs on a blocking
//! thread emitting progress through a sink, the sink forwards typed events
//! over a bounded channel, and the encoder drains that channel either as
//! SSE frames or as one aggregated buffered result.

mod diff;
mod encoder;
mod events;
mod orchestrator;
mod sink;

pub use diff::{FileSnapshot, diff_snapshots, snapshot};
pub use encoder::{EventStream, drain_buffered};
pub use events::TurnEvent;
pub use orchestrator::TurnRunner;
pub use sink::{CapturedText, ChannelSink, NullSink, OutputSink};
