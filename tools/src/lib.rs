//! Inspection and simulation tools for deltasnap.
//!
//! - Decode a snapshot frame and summarize its entity list and slices
//! - Run a server and client world over the loopback transport
//!
//! # Design Principles
//!
//! - **First-class tooling** - These tools are part of the product, not afterthoughts.
//! - **Human-readable output** - Make it easy to see where the bytes of a frame go.

mod inspect;
mod simulate;

pub use inspect::{
    builtin_manager, format_inspect_pretty, inspect_frame, FrameSummary, InspectReport,
    SliceSummary,
};
pub use simulate::{run_simulation, LogMetrics, SimulationConfig, SimulationSummary};
