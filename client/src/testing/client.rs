//! Recording stand-ins for the client side of a probe.
//!
//! Instead of issuing requests on a Wayland connection, these record them so
//! tests can inspect exactly what a probe would have sent.

use std::fmt::Write;

use crate::pacing::PacedSurface;
use crate::probes::wfshell::{HotspotRequest, ShellSession};

/// A request a probe issued on its toplevel surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceRequest {
    AckConfigure { serial: u32 },
    /// Buffer attached and committed at this size
    Render { width: u32, height: u32 },
    /// Frame callback requested (and surface committed)
    Frame,
    /// Bare commit without a new buffer
    Commit { width: u32, height: u32 },
}

/// A toplevel surface that records instead of sending
#[derive(Debug)]
pub struct RecordingSurface {
    pub width: u32,
    pub height: u32,
    pub requests: Vec<SurfaceRequest>,
    /// Frame callbacks requested but not yet delivered
    pub pending_frames: u32,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            requests: Vec::new(),
            pending_frames: 0,
        }
    }

    /// Serials acknowledged so far, in order
    pub fn acked_serials(&self) -> Vec<u32> {
        self.requests
            .iter()
            .filter_map(|r| match r {
                SurfaceRequest::AckConfigure { serial } => Some(*serial),
                _ => None,
            })
            .collect()
    }

    /// Format requests for snapshot testing. Runs of frame requests are
    /// collapsed into one line.
    pub fn format_requests(&self) -> String {
        let mut output = String::new();
        let mut frames = 0;

        for request in &self.requests {
            if *request == SurfaceRequest::Frame {
                frames += 1;
                continue;
            }
            flush_frames(&mut output, &mut frames);
            match request {
                SurfaceRequest::AckConfigure { serial } => {
                    writeln!(&mut output, "ack_configure {serial}").unwrap();
                }
                SurfaceRequest::Render { width, height } => {
                    writeln!(&mut output, "render {width}x{height}").unwrap();
                }
                SurfaceRequest::Commit { width, height } => {
                    writeln!(&mut output, "commit {width}x{height}").unwrap();
                }
                SurfaceRequest::Frame => unreachable!(),
            }
        }
        flush_frames(&mut output, &mut frames);

        output
    }
}

fn flush_frames(output: &mut String, frames: &mut usize) {
    if *frames > 0 {
        writeln!(output, "frame x{frames}").unwrap();
        *frames = 0;
    }
}

impl PacedSurface for RecordingSurface {
    fn ack_configure(&mut self, serial: u32) {
        self.requests.push(SurfaceRequest::AckConfigure { serial });
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn render(&mut self) -> anyhow::Result<()> {
        crate::shm::buffer_layout(self.width, self.height)?;
        self.requests.push(SurfaceRequest::Render {
            width: self.width,
            height: self.height,
        });
        Ok(())
    }

    fn request_frame(&mut self) {
        self.pending_frames += 1;
        self.requests.push(SurfaceRequest::Frame);
    }

    fn commit(&mut self) {
        self.requests.push(SurfaceRequest::Commit {
            width: self.width,
            height: self.height,
        });
    }
}

/// A request the shell probe issued
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellRequest {
    BindShellManager { name: u32 },
    BindOutput { name: u32 },
    GetWfOutput { name: u32 },
    CreateHotspot { name: u32, hotspot: HotspotRequest },
}

/// Shell session that hands out labels instead of proxies
#[derive(Debug, Default)]
pub struct RecordingSession {
    pub shell_manager: Option<u32>,
    pub requests: Vec<ShellRequest>,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Format requests for snapshot testing
    pub fn format_requests(&self) -> String {
        let mut output = String::new();
        for request in &self.requests {
            match request {
                ShellRequest::BindShellManager { name } => {
                    writeln!(&mut output, "bind zwf_shell_manager_v2 #{name}").unwrap();
                }
                ShellRequest::BindOutput { name } => {
                    writeln!(&mut output, "bind wl_output #{name}").unwrap();
                }
                ShellRequest::GetWfOutput { name } => {
                    writeln!(&mut output, "get_wf_output #{name}").unwrap();
                }
                ShellRequest::CreateHotspot { name, hotspot } => {
                    writeln!(
                        &mut output,
                        "create_hotspot #{name} edge={:?} threshold={} timeout={}",
                        hotspot.edge, hotspot.threshold, hotspot.timeout_ms
                    )
                    .unwrap();
                }
            }
        }
        output
    }
}

impl ShellSession for RecordingSession {
    type Output = String;
    type WfOutput = String;

    fn bind_shell_manager(&mut self, name: u32) {
        self.shell_manager = Some(name);
        self.requests.push(ShellRequest::BindShellManager { name });
    }

    fn has_shell_manager(&self) -> bool {
        self.shell_manager.is_some()
    }

    fn bind_output(&mut self, name: u32) -> String {
        self.requests.push(ShellRequest::BindOutput { name });
        format!("wl_output#{name}")
    }

    fn get_wf_output(&mut self, name: u32, output: &String) -> Option<String> {
        self.shell_manager?;
        self.requests.push(ShellRequest::GetWfOutput { name });
        Some(format!("zwf_output_v2({output})"))
    }

    fn create_hotspot(&mut self, name: u32, _wf_output: &String, hotspot: HotspotRequest) {
        self.requests
            .push(ShellRequest::CreateHotspot { name, hotspot });
    }
}
