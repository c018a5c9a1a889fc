//! Scripted compositors for driving probes in tests
//!
//! A fixture plays the compositor's half of the conversation: it hands out
//! serials and global names, delivers frame callbacks only when one was
//! requested, and feeds each event through the same probe logic the live
//! clients use. The client half is recorded by the types in `client.rs`.

use crate::pacing::{self, AckPacer};
use crate::probes::wfshell::{HotspotProbe, HotspotRequest};

use super::client::{RecordingSession, RecordingSurface};

/// Compositor driving the configure pacing of `slow-ack-configure`
#[derive(Debug)]
pub struct PacingFixture {
    pacer: AckPacer,
    surface: RecordingSurface,
    last_serial: u32,
}

impl PacingFixture {
    /// Create a fixture for a surface with the given default size
    pub fn new(frame_delay: u32, width: u32, height: u32) -> Self {
        Self {
            pacer: AckPacer::new(frame_delay, width, height),
            surface: RecordingSurface::new(width, height),
            last_serial: 0,
        }
    }

    pub fn pacer(&self) -> &AckPacer {
        &self.pacer
    }

    pub fn surface(&self) -> &RecordingSurface {
        &self.surface
    }

    /// Send `xdg_toplevel.configure` only
    pub fn toplevel_configure(&mut self, width: i32, height: i32) {
        self.pacer.toplevel_configure(width, height);
    }

    /// Send `xdg_surface.configure` with the next serial and return it
    pub fn surface_configure(&mut self) -> u32 {
        self.last_serial += 1;
        let actions = self.pacer.surface_configure(self.last_serial);
        pacing::apply(&mut self.surface, actions).expect("recording surface rejected a render");
        self.last_serial
    }

    /// Send a full configure sequence and return its serial
    pub fn configure(&mut self, width: i32, height: i32) -> u32 {
        self.toplevel_configure(width, height);
        self.surface_configure()
    }

    /// Fire one frame callback if the client asked for one.
    /// Returns whether a callback was delivered.
    pub fn frame_done(&mut self) -> bool {
        if self.surface.pending_frames == 0 {
            return false;
        }
        self.surface.pending_frames -= 1;

        let actions = self.pacer.frame_done();
        pacing::apply(&mut self.surface, actions).expect("recording surface rejected a render");
        true
    }

    /// Fire up to `n` frame callbacks, returning how many were delivered
    pub fn run_frames(&mut self, n: usize) -> usize {
        (0..n).take_while(|_| self.frame_done()).count()
    }

    /// Fire frame callbacks until the client stops asking for them
    pub fn drain_frames(&mut self) -> usize {
        let mut delivered = 0;
        while self.frame_done() {
            delivered += 1;
        }
        delivered
    }

    /// Deliver SIGUSR1 to the probe
    pub fn sigusr1(&mut self) {
        pacing::reset_surface(&mut self.pacer, &mut self.surface);
    }

    /// Recorded requests, formatted for snapshots
    pub fn format_requests(&self) -> String {
        self.surface.format_requests()
    }
}

/// Compositor driving the registry of `wfshell-tester`
#[derive(Debug)]
pub struct ShellFixture {
    probe: HotspotProbe<String, String>,
    session: RecordingSession,
    next_name: u32,
}

impl Default for ShellFixture {
    fn default() -> Self {
        Self::new(HotspotRequest::default())
    }
}

impl ShellFixture {
    pub fn new(hotspot: HotspotRequest) -> Self {
        Self {
            probe: HotspotProbe::new(hotspot),
            session: RecordingSession::new(),
            next_name: 0,
        }
    }

    pub fn probe(&self) -> &HotspotProbe<String, String> {
        &self.probe
    }

    pub fn session(&self) -> &RecordingSession {
        &self.session
    }

    /// Advertise a global and return its name
    pub fn add_global(&mut self, interface: &str) -> u32 {
        self.next_name += 1;
        let name = self.next_name;
        self.probe.global(&mut self.session, name, interface);
        name
    }

    pub fn add_shell_manager(&mut self) -> u32 {
        self.add_global("zwf_shell_manager_v2")
    }

    pub fn add_output(&mut self) -> u32 {
        self.add_global("wl_output")
    }

    /// Complete the initial roundtrip
    pub fn finish_roundtrip(&mut self) -> anyhow::Result<usize> {
        self.probe.finish_roundtrip(&mut self.session)
    }

    /// Withdraw a global. Returns whether the probe created a hotspot.
    pub fn remove_global(&mut self, name: u32) -> bool {
        self.probe.global_remove(&mut self.session, name)
    }

    /// Recorded requests, formatted for snapshots
    pub fn format_requests(&self) -> String {
        self.session.format_requests()
    }
}
