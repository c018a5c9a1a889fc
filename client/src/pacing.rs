//! Configure acknowledgment pacing.
//!
//! The first configure is acknowledged immediately. Every later configure is
//! held back until `frame_delay` frame callbacks have fired, and only the most
//! recent serial seen by then is acknowledged. Configures arriving during a
//! countdown are coalesced: once the countdown ends the newest serial starts
//! the next one.
//!
//! The pacer never touches the connection. It returns [`PacerAction`]s which
//! [`apply`] replays against a [`PacedSurface`], so the live probe and the
//! test fixtures follow the same decisions.

use tracing::{debug, info, warn};

/// Width the surface is reset to when SIGUSR1 arrives.
pub const RESET_WIDTH: u32 = 300;
/// Height the surface is reset to when SIGUSR1 arrives.
pub const RESET_HEIGHT: u32 = 400;

/// A configure waiting for its acknowledgment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingConfigure {
    pub serial: u32,
    /// Zero means the compositor left the choice to us
    pub width: u32,
    pub height: u32,
}

/// A request the pacer wants issued on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacerAction {
    /// Acknowledge the very first configure and render at the current size.
    AckFirst { serial: u32 },
    /// Resize, acknowledge and render once the countdown has run out.
    Ack { serial: u32, width: u32, height: u32 },
    /// Ask for a frame callback and commit so the compositor sends it.
    RequestFrame,
}

#[derive(Debug)]
pub struct AckPacer {
    frame_delay: u32,
    default_width: u32,
    default_height: u32,
    acked_first: bool,
    current: PendingConfigure,
    next: PendingConfigure,
    /// Frame callbacks left before `current` is acknowledged. Zero when idle.
    countdown: u32,
}

impl AckPacer {
    /// `frame_delay` is clamped to at least one frame.
    pub fn new(frame_delay: u32, default_width: u32, default_height: u32) -> Self {
        Self {
            frame_delay: frame_delay.max(1),
            default_width,
            default_height,
            acked_first: false,
            current: PendingConfigure::default(),
            next: PendingConfigure::default(),
            countdown: 0,
        }
    }

    pub fn frame_delay(&self) -> u32 {
        self.frame_delay
    }

    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    /// Whether a countdown is running (and so a frame callback is outstanding).
    pub fn is_waiting(&self) -> bool {
        self.countdown > 0
    }

    pub fn acked_first(&self) -> bool {
        self.acked_first
    }

    /// The configure that will be acknowledged when the countdown ends.
    pub fn current(&self) -> PendingConfigure {
        self.current
    }

    /// The newest configure seen so far.
    pub fn next(&self) -> PendingConfigure {
        self.next
    }

    /// Handle `xdg_toplevel.configure`. A zero (or negative) dimension keeps
    /// the previously suggested size.
    pub fn toplevel_configure(&mut self, width: i32, height: i32) {
        if width <= 0 || height <= 0 {
            return;
        }
        self.next.width = width as u32;
        self.next.height = height as u32;
    }

    /// Handle `xdg_surface.configure`.
    pub fn surface_configure(&mut self, serial: u32) -> Vec<PacerAction> {
        if !self.acked_first {
            self.acked_first = true;
            return vec![PacerAction::AckFirst { serial }];
        }

        self.next.serial = serial;

        if self.countdown == 0 {
            self.current = self.next;
            self.countdown = self.frame_delay;
            debug!(serial, frames = self.countdown, "delaying configure ack");
            vec![PacerAction::RequestFrame]
        } else {
            debug!(serial, frames = self.countdown, "configure queued behind countdown");
            Vec::new()
        }
    }

    /// Handle `wl_callback.done` for a frame callback.
    pub fn frame_done(&mut self) -> Vec<PacerAction> {
        if self.countdown == 0 {
            warn!("frame callback without a running countdown");
            return Vec::new();
        }

        self.countdown -= 1;
        if self.countdown > 0 {
            return vec![PacerAction::RequestFrame];
        }

        let ack = PacerAction::Ack {
            serial: self.current.serial,
            width: non_zero_or(self.current.width, self.default_width),
            height: non_zero_or(self.current.height, self.default_height),
        };

        if self.next.serial == self.current.serial {
            return vec![ack];
        }

        self.countdown = self.frame_delay;
        self.current = self.next;
        vec![ack, PacerAction::RequestFrame]
    }

    /// Make the next configure get acknowledged immediately again.
    ///
    /// A countdown that is already running keeps going.
    pub fn reset_first_configure(&mut self) {
        self.acked_first = false;
    }
}

fn non_zero_or(value: u32, default: u32) -> u32 {
    if value == 0 {
        default
    } else {
        value
    }
}

/// The surface operations the pacer drives.
pub trait PacedSurface {
    fn ack_configure(&mut self, serial: u32);
    fn resize(&mut self, width: u32, height: u32);
    fn render(&mut self) -> anyhow::Result<()>;
    fn request_frame(&mut self);
    fn commit(&mut self);
}

/// Issue `actions` on `surface` in order.
pub fn apply<S: PacedSurface + ?Sized>(
    surface: &mut S,
    actions: Vec<PacerAction>,
) -> anyhow::Result<()> {
    for action in actions {
        match action {
            PacerAction::AckFirst { serial } => {
                debug!(serial, "acking first configure");
                surface.ack_configure(serial);
                surface.render()?;
            }
            PacerAction::Ack {
                serial,
                width,
                height,
            } => {
                info!("acking configure {serial}, width: {width}, height: {height}");
                surface.resize(width, height);
                surface.ack_configure(serial);
                surface.render()?;
            }
            PacerAction::RequestFrame => surface.request_frame(),
        }
    }
    Ok(())
}

/// SIGUSR1: forget the first ack, shrink back to the reset size and commit
/// without attaching a new buffer.
pub fn reset_surface<S: PacedSurface + ?Sized>(pacer: &mut AckPacer, surface: &mut S) {
    info!("SIGUSR1 received, committing surface");
    pacer.reset_first_configure();
    surface.resize(RESET_WIDTH, RESET_HEIGHT);
    surface.commit();
}
