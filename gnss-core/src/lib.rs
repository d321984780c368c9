//! gnss-core: Pure parsing, classification and telemetry state for an NMEA
//! receiver stream.
//!
//! No serial, pipe or network I/O; the only file access is the config
//! loader. The `gnss-processor` binary wraps this crate with the serial
//! port, the relay pipe and the snapshot file.

pub mod accuracy;
pub mod cadence;
pub mod classify;
pub mod config;
pub mod fix;
pub mod line;
pub mod nmea;
pub mod sky;
pub mod snapshot;
pub mod state;
pub mod types;

// Re-export commonly used types at crate root
pub use cadence::{Cadence, Due, ShutdownToken};
pub use line::LineAssembler;
pub use snapshot::Snapshot;
pub use state::ProcessorState;
pub use types::*;
