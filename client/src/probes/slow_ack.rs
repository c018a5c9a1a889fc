//! `slow-ack-configure`: acknowledge configures late.
//!
//! Opens a red toplevel and acknowledges every configure after the first
//! one only after a run of frame callbacks (see [`crate::pacing`]). SIGUSR1
//! resets the surface and makes the next configure get acknowledged at once.

use anyhow::Context;
use tracing::{debug, error, info};
use wayland_client::{
    delegate_noop,
    globals::{registry_queue_init, GlobalListContents},
    protocol::{wl_buffer, wl_callback, wl_compositor, wl_registry, wl_shm, wl_shm_pool, wl_surface},
    Connection, Dispatch, EventQueue, QueueHandle,
};
use wayland_protocols::xdg::shell::client::{xdg_surface, xdg_toplevel, xdg_wm_base};

use crate::args::SlowAckArgs;
use crate::event_loop::{self, LoopState};
use crate::pacing::{self, AckPacer, PacedSurface, PacerAction};
use crate::shm::Color;
use crate::signal;
use crate::surface::{Globals, Toplevel};

pub const TITLE: &str = "wleird-slow-ack-configure";

/// Probe state
pub struct SlowAck {
    globals: Globals,
    toplevel: Toplevel,
    pacer: AckPacer,
    running: bool,
    failure: Option<anyhow::Error>,
}

/// The live toplevel, borrowed for one batch of pacer actions.
struct LiveSurface<'a> {
    toplevel: &'a mut Toplevel,
    shm: &'a wl_shm::WlShm,
    qh: &'a QueueHandle<SlowAck>,
}

impl PacedSurface for LiveSurface<'_> {
    fn ack_configure(&mut self, serial: u32) {
        self.toplevel.xdg_surface.ack_configure(serial);
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.toplevel.surface.width = width;
        self.toplevel.surface.height = height;
    }

    fn render(&mut self) -> anyhow::Result<()> {
        self.toplevel.surface.render(self.shm, self.qh)
    }

    fn request_frame(&mut self) {
        let wl_surface = &self.toplevel.surface.wl_surface;
        wl_surface.frame(self.qh, ());
        wl_surface.commit();
    }

    fn commit(&mut self) {
        self.toplevel.surface.wl_surface.commit();
    }
}

impl SlowAck {
    /// Bind the globals on `conn` and map the toplevel.
    ///
    /// Performs one blocking roundtrip for the registry.
    pub fn new(
        conn: &Connection,
        args: &SlowAckArgs,
    ) -> anyhow::Result<(Self, EventQueue<Self>)> {
        let (global_list, queue) = registry_queue_init::<SlowAck>(conn)?;
        let qh = queue.handle();

        let globals = Globals::bind(&global_list, &qh)?;
        let toplevel = Toplevel::new(&globals, &qh, TITLE, args.width, args.height, Color::RED);

        let state = SlowAck {
            globals,
            toplevel,
            pacer: AckPacer::new(args.frame_delay, args.width, args.height),
            running: true,
            failure: None,
        };
        Ok((state, queue))
    }

    pub fn pacer(&self) -> &AckPacer {
        &self.pacer
    }

    /// The error that stopped the probe, if any.
    pub fn take_failure(&mut self) -> Option<anyhow::Error> {
        self.failure.take()
    }

    fn drive(&mut self, qh: &QueueHandle<Self>, actions: Vec<PacerAction>) {
        if actions.is_empty() {
            return;
        }

        let mut surface = LiveSurface {
            toplevel: &mut self.toplevel,
            shm: &self.globals.shm,
            qh,
        };
        if let Err(e) = pacing::apply(&mut surface, actions) {
            self.fail(e);
        }
    }

    fn fail(&mut self, e: anyhow::Error) {
        error!("{:#}", e);
        self.failure.get_or_insert(e);
        self.running = false;
    }
}

impl LoopState for SlowAck {
    fn after_dispatch(&mut self, qh: &QueueHandle<Self>) -> anyhow::Result<()> {
        if signal::take_sigusr1() {
            let mut surface = LiveSurface {
                toplevel: &mut self.toplevel,
                shm: &self.globals.shm,
                qh,
            };
            pacing::reset_surface(&mut self.pacer, &mut surface);
        }
        Ok(())
    }

    fn running(&self) -> bool {
        self.running
    }
}

/// Connect to the compositor and run until the window is closed or the
/// connection fails.
pub fn run(args: &SlowAckArgs) -> anyhow::Result<()> {
    let conn = Connection::connect_to_env().context("failed to create display")?;

    signal::install_sigusr1().context("sigaction")?;

    let (mut state, mut queue) = SlowAck::new(&conn, args)?;

    info!(
        width = args.width,
        height = args.height,
        frame_delay = args.frame_delay,
        "slow-ack-configure started"
    );

    event_loop::run(&conn, &mut queue, &mut state)?;

    match state.take_failure() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

delegate_noop!(SlowAck: wl_compositor::WlCompositor);
delegate_noop!(SlowAck: ignore wl_shm::WlShm);
delegate_noop!(SlowAck: wl_shm_pool::WlShmPool);

impl Dispatch<wl_registry::WlRegistry, GlobalListContents> for SlowAck {
    fn event(
        _: &mut Self,
        _: &wl_registry::WlRegistry,
        _: wl_registry::Event,
        _: &GlobalListContents,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<wl_surface::WlSurface, ()> for SlowAck {
    fn event(
        _: &mut Self,
        _: &wl_surface::WlSurface,
        event: wl_surface::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        debug!("wl_surface: {:?}", event);
    }
}

impl Dispatch<wl_buffer::WlBuffer, ()> for SlowAck {
    fn event(
        _: &mut Self,
        buffer: &wl_buffer::WlBuffer,
        event: wl_buffer::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let wl_buffer::Event::Release = event {
            buffer.destroy();
        }
    }
}

impl Dispatch<wl_callback::WlCallback, ()> for SlowAck {
    fn event(
        state: &mut Self,
        _: &wl_callback::WlCallback,
        event: wl_callback::Event,
        _: &(),
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        if let wl_callback::Event::Done { .. } = event {
            let actions = state.pacer.frame_done();
            state.drive(qh, actions);
        }
    }
}

impl Dispatch<xdg_wm_base::XdgWmBase, ()> for SlowAck {
    fn event(
        _: &mut Self,
        wm_base: &xdg_wm_base::XdgWmBase,
        event: xdg_wm_base::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let xdg_wm_base::Event::Ping { serial } = event {
            wm_base.pong(serial);
        }
    }
}

impl Dispatch<xdg_surface::XdgSurface, ()> for SlowAck {
    fn event(
        state: &mut Self,
        _: &xdg_surface::XdgSurface,
        event: xdg_surface::Event,
        _: &(),
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        if let xdg_surface::Event::Configure { serial } = event {
            debug!(serial, "xdg_surface configure");
            let actions = state.pacer.surface_configure(serial);
            state.drive(qh, actions);
        }
    }
}

impl Dispatch<xdg_toplevel::XdgToplevel, ()> for SlowAck {
    fn event(
        state: &mut Self,
        _: &xdg_toplevel::XdgToplevel,
        event: xdg_toplevel::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        match event {
            xdg_toplevel::Event::Configure { width, height, .. } => {
                debug!(width, height, "xdg_toplevel configure");
                state.pacer.toplevel_configure(width, height);
            }
            xdg_toplevel::Event::Close => {
                info!("toplevel closed by the compositor");
                state.running = false;
            }
            _ => {}
        }
    }
}
