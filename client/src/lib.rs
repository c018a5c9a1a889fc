//! wleird - Wayland compositor probes
//!
//! Shared client plumbing for small diagnostic clients. Each probe drives one
//! narrow protocol interaction against a live compositor; the state machines
//! behind them are kept free of socket I/O so they can be exercised by the
//! fixtures in [`testing`].
pub mod args;
pub mod event_loop;
pub mod logging;
pub mod outputs;
pub mod pacing;
pub mod probes;
pub mod protocols;
pub mod shm;
pub mod signal;
pub mod surface;
pub mod testing;

pub use args::{SlowAckArgs, WfShellArgs};
pub use outputs::OutputTracker;
pub use pacing::{AckPacer, PacerAction};
