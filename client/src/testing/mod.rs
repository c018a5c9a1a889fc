//! Testing infrastructure for the probes
//!
//! Probes run against a live compositor, which tests cannot rely on. The
//! protocol decisions are therefore kept away from the connection, and this
//! module supplies both ends of a scripted conversation:
//!
//! 1. **Fixtures** (`PacingFixture`, `ShellFixture`) play the compositor:
//!    they hand out configure serials, deliver frame callbacks and advertise
//!    or withdraw globals.
//!
//! 2. **Recorders** (`RecordingSurface`, `RecordingSession`) stand in for the
//!    client's proxies and log every request the probe makes, formatted for
//!    insta snapshots.
//!
//! # Example
//!
//! ```
//! use wleird_client::testing::PacingFixture;
//!
//! let mut fixture = PacingFixture::new(2, 300, 400);
//! fixture.configure(0, 0);
//! fixture.configure(800, 600);
//! fixture.drain_frames();
//!
//! assert_eq!(fixture.surface().acked_serials(), vec![1, 2]);
//! ```

mod client;
mod fixture;

pub use client::{RecordingSession, RecordingSurface, ShellRequest, SurfaceRequest};
pub use fixture::{PacingFixture, ShellFixture};
