//! Probe programs.
//!
//! Each probe owns its protocol state and a `run` entry point used by the
//! binary of the same name.
pub mod slow_ack;
pub mod wfshell;
