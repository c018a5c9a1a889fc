//! `wfshell-tester`: create a hotspot on an output that just went away.
//!
//! Every `wl_output` gets a `zwf_output_v2` from the wayfire shell manager.
//! When an output global is removed, the probe immediately asks for a
//! hotspot on its (now stale) `zwf_output_v2`. The compositor has to cope
//! with that request arriving after it tore the output down.

use std::convert::Infallible;

use anyhow::{bail, Context};
use tracing::{debug, info, warn};
use wayland_client::{
    delegate_noop,
    protocol::{wl_output, wl_registry},
    Connection, Dispatch, EventQueue, Proxy, QueueHandle,
};

use crate::args::WfShellArgs;
use crate::outputs::OutputTracker;
use crate::protocols::wayfire_shell::{
    zwf_hotspot_v2::{self, ZwfHotspotV2},
    zwf_output_v2::{self, HotspotEdge, ZwfOutputV2},
    zwf_shell_manager_v2::ZwfShellManagerV2,
};

/// Version the shell manager and outputs are bound at.
const BIND_VERSION: u32 = 1;

/// Parameters of the hotspot created on output removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotspotRequest {
    pub edge: HotspotEdge,
    /// Distance from the edge, in pixels
    pub threshold: u32,
    pub timeout_ms: u32,
}

impl Default for HotspotRequest {
    fn default() -> Self {
        Self {
            edge: HotspotEdge::Top,
            threshold: 10,
            timeout_ms: 100,
        }
    }
}

/// The protocol requests the probe makes.
///
/// Implemented over live proxies by the probe itself and by a recorder in
/// [`crate::testing`].
pub trait ShellSession {
    type Output;
    type WfOutput;

    fn bind_shell_manager(&mut self, name: u32);
    fn has_shell_manager(&self) -> bool;
    fn bind_output(&mut self, name: u32) -> Self::Output;
    /// Returns `None` while no shell manager is bound.
    fn get_wf_output(&mut self, name: u32, output: &Self::Output) -> Option<Self::WfOutput>;
    fn create_hotspot(&mut self, name: u32, wf_output: &Self::WfOutput, hotspot: HotspotRequest);
}

/// Registry-driven probe logic.
#[derive(Debug)]
pub struct HotspotProbe<O, W> {
    outputs: OutputTracker<O, W>,
    hotspot: HotspotRequest,
    hotspots_created: usize,
}

impl<O, W> HotspotProbe<O, W> {
    pub fn new(hotspot: HotspotRequest) -> Self {
        Self {
            outputs: OutputTracker::new(),
            hotspot,
            hotspots_created: 0,
        }
    }

    pub fn outputs(&self) -> &OutputTracker<O, W> {
        &self.outputs
    }

    pub fn hotspots_created(&self) -> usize {
        self.hotspots_created
    }

    /// Handle `wl_registry.global`.
    pub fn global<S>(&mut self, session: &mut S, name: u32, interface: &str)
    where
        S: ShellSession<Output = O, WfOutput = W>,
    {
        if interface == ZwfShellManagerV2::interface().name {
            debug!(name, "binding zwf_shell_manager_v2");
            session.bind_shell_manager(name);
        }

        if interface == wl_output::WlOutput::interface().name {
            let output = session.bind_output(name);
            let wf_output = session.get_wf_output(name, &output);
            debug!(name, shell = wf_output.is_some(), "tracking wl_output");
            self.outputs.insert(name, output, wf_output);
        }
    }

    /// Called after the initial roundtrip: outputs advertised before the
    /// shell manager get their `zwf_output_v2` now.
    pub fn finish_roundtrip<S>(&mut self, session: &mut S) -> anyhow::Result<usize>
    where
        S: ShellSession<Output = O, WfOutput = W>,
    {
        if !session.has_shell_manager() {
            bail!("compositor does not advertise zwf_shell_manager_v2");
        }

        let attached = self
            .outputs
            .attach_missing(|name, output| session.get_wf_output(name, output));
        info!(
            outputs = self.outputs.len(),
            attached, "wayfire shell outputs ready"
        );
        Ok(attached)
    }

    /// Handle `wl_registry.global_remove`. Returns whether a hotspot was
    /// requested.
    pub fn global_remove<S>(&mut self, session: &mut S, name: u32) -> bool
    where
        S: ShellSession<Output = O, WfOutput = W>,
    {
        let Some(removed) = self.outputs.remove(name) else {
            return false;
        };

        match removed.wf_output {
            Some(wf_output) => {
                info!(
                    name,
                    edge = ?self.hotspot.edge,
                    threshold = self.hotspot.threshold,
                    timeout_ms = self.hotspot.timeout_ms,
                    "output removed, creating hotspot on it"
                );
                session.create_hotspot(name, &wf_output, self.hotspot);
                self.hotspots_created += 1;
                true
            }
            None => {
                warn!(name, "output removed before it had a zwf_output_v2");
                false
            }
        }
    }
}

/// Probe state
pub struct WfShell {
    registry: wl_registry::WlRegistry,
    probe: HotspotProbe<wl_output::WlOutput, ZwfOutputV2>,
    shell_manager: Option<ZwfShellManagerV2>,
    hotspots: Vec<ZwfHotspotV2>,
}

/// Live proxies, borrowed from [`WfShell`] for one registry event.
struct LiveSession<'a> {
    registry: &'a wl_registry::WlRegistry,
    qh: &'a QueueHandle<WfShell>,
    shell_manager: &'a mut Option<ZwfShellManagerV2>,
    hotspots: &'a mut Vec<ZwfHotspotV2>,
}

impl ShellSession for LiveSession<'_> {
    type Output = wl_output::WlOutput;
    type WfOutput = ZwfOutputV2;

    fn bind_shell_manager(&mut self, name: u32) {
        let manager = self
            .registry
            .bind::<ZwfShellManagerV2, _, _>(name, BIND_VERSION, self.qh, ());
        *self.shell_manager = Some(manager);
    }

    fn has_shell_manager(&self) -> bool {
        self.shell_manager.is_some()
    }

    fn bind_output(&mut self, name: u32) -> wl_output::WlOutput {
        self.registry
            .bind::<wl_output::WlOutput, _, _>(name, BIND_VERSION, self.qh, name)
    }

    fn get_wf_output(&mut self, name: u32, output: &wl_output::WlOutput) -> Option<ZwfOutputV2> {
        let manager = self.shell_manager.as_ref()?;
        Some(manager.get_wf_output(output, self.qh, name))
    }

    fn create_hotspot(&mut self, name: u32, wf_output: &ZwfOutputV2, hotspot: HotspotRequest) {
        let created = wf_output.create_hotspot(
            hotspot.edge as u32,
            hotspot.threshold,
            hotspot.timeout_ms,
            self.qh,
            name,
        );
        self.hotspots.push(created);
    }
}

impl WfShell {
    /// Listen on the registry of `conn`, roundtrip once and attach every
    /// output to the shell manager.
    pub fn new(
        conn: &Connection,
        args: &WfShellArgs,
    ) -> anyhow::Result<(Self, EventQueue<Self>)> {
        let mut queue = conn.new_event_queue();
        let qh = queue.handle();

        let registry = conn.display().get_registry(&qh, ());
        let mut state = WfShell {
            registry,
            probe: HotspotProbe::new(args.hotspot),
            shell_manager: None,
            hotspots: Vec::new(),
        };

        queue.roundtrip(&mut state).context("initial roundtrip failed")?;

        let (probe, mut session) = state.session(&qh);
        probe.finish_roundtrip(&mut session)?;

        Ok((state, queue))
    }

    pub fn probe(&self) -> &HotspotProbe<wl_output::WlOutput, ZwfOutputV2> {
        &self.probe
    }

    fn session<'a>(
        &'a mut self,
        qh: &'a QueueHandle<Self>,
    ) -> (
        &'a mut HotspotProbe<wl_output::WlOutput, ZwfOutputV2>,
        LiveSession<'a>,
    ) {
        let WfShell {
            registry,
            probe,
            shell_manager,
            hotspots,
        } = self;

        (
            probe,
            LiveSession {
                registry,
                qh,
                shell_manager,
                hotspots,
            },
        )
    }
}

/// Connect to the compositor and dispatch until the connection fails.
///
/// The probe has no exit of its own, so this only ever returns an error.
pub fn run(args: &WfShellArgs) -> anyhow::Result<Infallible> {
    let conn = Connection::connect_to_env().context("failed to create display")?;
    let (mut state, mut queue) = WfShell::new(&conn, args)?;

    loop {
        queue
            .blocking_dispatch(&mut state)
            .context("lost connection to the compositor")?;
    }
}

delegate_noop!(WfShell: ignore ZwfShellManagerV2);

impl Dispatch<wl_registry::WlRegistry, ()> for WfShell {
    fn event(
        state: &mut Self,
        _: &wl_registry::WlRegistry,
        event: wl_registry::Event,
        _: &(),
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        let (probe, mut session) = state.session(qh);
        match event {
            wl_registry::Event::Global {
                name,
                interface,
                version,
            } => {
                debug!(name, version, "global {}", interface);
                probe.global(&mut session, name, &interface);
            }
            wl_registry::Event::GlobalRemove { name } => {
                debug!(name, "global removed");
                probe.global_remove(&mut session, name);
            }
            _ => {}
        }
    }
}

impl Dispatch<wl_output::WlOutput, u32> for WfShell {
    fn event(
        _: &mut Self,
        _: &wl_output::WlOutput,
        event: wl_output::Event,
        name: &u32,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        match event {
            wl_output::Event::Geometry { make, model, .. } => {
                debug!(name, "wl_output geometry: {} {}", make, model);
            }
            wl_output::Event::Mode {
                width,
                height,
                refresh,
                ..
            } => {
                debug!(name, width, height, refresh, "wl_output mode");
            }
            _ => {}
        }
    }
}

impl Dispatch<ZwfOutputV2, u32> for WfShell {
    fn event(
        _: &mut Self,
        _: &ZwfOutputV2,
        event: zwf_output_v2::Event,
        name: &u32,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        match event {
            zwf_output_v2::Event::EnterFullscreen => info!(name, "output entered fullscreen"),
            zwf_output_v2::Event::LeaveFullscreen => info!(name, "output left fullscreen"),
            zwf_output_v2::Event::ToggleMenu => info!(name, "toggle menu"),
        }
    }
}

impl Dispatch<ZwfHotspotV2, u32> for WfShell {
    fn event(
        _: &mut Self,
        _: &ZwfHotspotV2,
        event: zwf_hotspot_v2::Event,
        name: &u32,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        match event {
            zwf_hotspot_v2::Event::Enter => info!(name, "hotspot entered"),
            zwf_hotspot_v2::Event::Leave => info!(name, "hotspot left"),
        }
    }
}
