//! In-process compositor for the live client tests
//!
//! A `wayland-server` display runs on a background thread and serves one
//! client over a socket pair. Requests the probes make are recorded as text
//! lines; the resources needed to send events back (toplevel, frame
//! callbacks, ...) are kept so tests can drive the probe from the
//! compositor side.

#![allow(dead_code)]

use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use wayland_protocols::xdg::shell::server::{xdg_surface, xdg_toplevel, xdg_wm_base};
use wayland_server::backend::{ClientData, ClientId, DisconnectReason, GlobalId};
use wayland_server::protocol::{
    wl_buffer, wl_callback, wl_compositor, wl_output, wl_shm, wl_shm_pool, wl_surface,
};
use wayland_server::{
    Client, DataInit, Dispatch, Display, DisplayHandle, GlobalDispatch, New, Resource,
};
use wayland_client::EventQueue;
use wleird_client::event_loop::wait_for;

pub mod wayfire_shell {
    #![allow(dead_code, non_camel_case_types, unused_unsafe, unused_variables)]
    #![allow(non_upper_case_globals, non_snake_case, unused_imports)]
    #![allow(missing_docs, clippy::all)]

    use wayland_server;
    use wayland_server::protocol::*;

    pub mod __interfaces {
        use wayland_server::backend as wayland_backend;
        use wayland_server::protocol::__interfaces::*;
        wayland_scanner::generate_interfaces!("protocols/wayfire-shell-unstable-v2.xml");
    }
    use self::__interfaces::*;

    wayland_scanner::generate_server_code!("protocols/wayfire-shell-unstable-v2.xml");
}

use wayfire_shell::{
    zwf_hotspot_v2::ZwfHotspotV2, zwf_output_v2, zwf_output_v2::ZwfOutputV2,
    zwf_shell_manager_v2, zwf_shell_manager_v2::ZwfShellManagerV2, zwf_surface_v2,
    zwf_surface_v2::ZwfSurfaceV2,
};

/// Server tick when no client request is pending
const IDLE_TICK_MS: libc::c_int = 10;

/// What the compositor has seen so far
#[derive(Debug, Default)]
pub struct Observed {
    pub requests: Vec<String>,
    pub wm_base: Option<xdg_wm_base::XdgWmBase>,
    pub xdg_surface: Option<xdg_surface::XdgSurface>,
    pub toplevel: Option<xdg_toplevel::XdgToplevel>,
    /// Frame callbacks not fired yet, oldest first
    pub frames: Vec<wl_callback::WlCallback>,
}

impl Observed {
    fn record(&mut self, line: impl Into<String>) {
        self.requests.push(line.into());
    }

    /// Recorded requests, one per line
    pub fn format_requests(&self) -> String {
        let mut output = String::new();
        for line in &self.requests {
            output.push_str(line);
            output.push('\n');
        }
        output
    }
}

/// Server-side state
pub struct Compositor {
    observed: Arc<Mutex<Observed>>,
}

impl Compositor {
    fn observed(&self) -> MutexGuard<'_, Observed> {
        self.observed.lock().unwrap()
    }
}

struct TestClientData;

impl ClientData for TestClientData {
    fn initialized(&self, _: ClientId) {}
    fn disconnected(&self, _: ClientId, _: DisconnectReason) {}
}

/// A compositor being set up, before its client connects
pub struct TestServer {
    display: Display<Compositor>,
    observed: Arc<Mutex<Observed>>,
}

impl TestServer {
    pub fn new() -> Self {
        Self {
            display: Display::new().unwrap(),
            observed: Arc::default(),
        }
    }

    /// Advertise `wl_compositor`, `wl_shm` and `xdg_wm_base`.
    pub fn with_shell_globals() -> Self {
        let mut server = Self::new();
        server.global::<wl_compositor::WlCompositor>(4);
        server.global::<wl_shm::WlShm>(1);
        server.global::<xdg_wm_base::XdgWmBase>(2);
        server
    }

    pub fn global<I>(&mut self, version: u32) -> GlobalId
    where
        I: Resource + 'static,
        Compositor: GlobalDispatch<I, ()>,
    {
        self.display
            .handle()
            .create_global::<Compositor, I, ()>(version, ())
    }

    /// Connect a client and start serving it on a background thread.
    pub fn start(self) -> (RunningServer, UnixStream) {
        let TestServer {
            mut display,
            observed,
        } = self;

        let (server_socket, client_socket) = UnixStream::pair().unwrap();
        display
            .handle()
            .insert_client(server_socket, Arc::new(TestClientData))
            .unwrap();

        let handle = display.handle();
        let stop = Arc::new(AtomicBool::new(false));
        let mut state = Compositor {
            observed: observed.clone(),
        };

        let thread = {
            let stop = stop.clone();
            thread::spawn(move || {
                while !stop.load(Ordering::Acquire) {
                    let _ = wait_for(display.backend().poll_fd(), libc::POLLIN, IDLE_TICK_MS);
                    if display.dispatch_clients(&mut state).is_err() {
                        break;
                    }
                    let _ = display.flush_clients();
                }
            })
        };

        let server = RunningServer {
            handle,
            observed,
            stop,
            thread: Some(thread),
        };
        (server, client_socket)
    }
}

/// A compositor serving its client
pub struct RunningServer {
    handle: DisplayHandle,
    observed: Arc<Mutex<Observed>>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl RunningServer {
    pub fn observed(&self) -> MutexGuard<'_, Observed> {
        self.observed.lock().unwrap()
    }

    pub fn format_requests(&self) -> String {
        self.observed().format_requests()
    }

    pub fn remove_global(&self, id: GlobalId) {
        self.handle.remove_global::<Compositor>(id);
    }

    pub fn ping(&self, serial: u32) {
        let wm_base = self.observed().wm_base.clone();
        wm_base.expect("xdg_wm_base not bound").ping(serial);
    }

    /// Send a full configure sequence to the toplevel.
    pub fn configure(&self, width: i32, height: i32, serial: u32) {
        let (toplevel, xdg_surface) = {
            let observed = self.observed();
            (observed.toplevel.clone(), observed.xdg_surface.clone())
        };
        toplevel
            .expect("no xdg_toplevel")
            .configure(width, height, Vec::new());
        xdg_surface.expect("no xdg_surface").configure(serial);
    }

    pub fn close(&self) {
        let toplevel = self.observed().toplevel.clone();
        toplevel.expect("no xdg_toplevel").close();
    }

    /// Fire the oldest pending frame callback. Returns false if there is none.
    pub fn frame_done(&self, time: u32) -> bool {
        let callback = {
            let mut observed = self.observed();
            if observed.frames.is_empty() {
                return false;
            }
            observed.frames.remove(0)
        };
        callback.done(time);
        true
    }
}

/// Deliver what the compositor sent, then wait until the client's replies
/// have been processed.
pub fn settle<S: 'static>(queue: &mut EventQueue<S>, state: &mut S) {
    queue.roundtrip(state).unwrap();
    queue.roundtrip(state).unwrap();
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

// Globals

impl GlobalDispatch<wl_compositor::WlCompositor, ()> for Compositor {
    fn bind(
        _: &mut Self,
        _: &DisplayHandle,
        _: &Client,
        resource: New<wl_compositor::WlCompositor>,
        _: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        data_init.init(resource, ());
    }
}

impl GlobalDispatch<wl_shm::WlShm, ()> for Compositor {
    fn bind(
        _: &mut Self,
        _: &DisplayHandle,
        _: &Client,
        resource: New<wl_shm::WlShm>,
        _: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        let shm = data_init.init(resource, ());
        shm.format(wl_shm::Format::Argb8888);
    }
}

impl GlobalDispatch<xdg_wm_base::XdgWmBase, ()> for Compositor {
    fn bind(
        state: &mut Self,
        _: &DisplayHandle,
        _: &Client,
        resource: New<xdg_wm_base::XdgWmBase>,
        _: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        let wm_base = data_init.init(resource, ());
        state.observed().wm_base = Some(wm_base);
    }
}

impl GlobalDispatch<wl_output::WlOutput, ()> for Compositor {
    fn bind(
        _: &mut Self,
        _: &DisplayHandle,
        _: &Client,
        resource: New<wl_output::WlOutput>,
        _: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        data_init.init(resource, ());
    }
}

impl GlobalDispatch<ZwfShellManagerV2, ()> for Compositor {
    fn bind(
        _: &mut Self,
        _: &DisplayHandle,
        _: &Client,
        resource: New<ZwfShellManagerV2>,
        _: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        data_init.init(resource, ());
    }
}

// Core objects

impl Dispatch<wl_compositor::WlCompositor, ()> for Compositor {
    fn request(
        _: &mut Self,
        _: &Client,
        _: &wl_compositor::WlCompositor,
        request: wl_compositor::Request,
        _: &(),
        _: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        if let wl_compositor::Request::CreateSurface { id } = request {
            data_init.init(id, ());
        }
    }
}

impl Dispatch<wl_surface::WlSurface, ()> for Compositor {
    fn request(
        state: &mut Self,
        _: &Client,
        _: &wl_surface::WlSurface,
        request: wl_surface::Request,
        _: &(),
        _: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_surface::Request::Frame { callback } => {
                let callback = data_init.init(callback, ());
                let mut observed = state.observed();
                observed.frames.push(callback);
                observed.record("frame");
            }
            wl_surface::Request::Commit => state.observed().record("commit"),
            _ => {}
        }
    }
}

impl Dispatch<wl_callback::WlCallback, ()> for Compositor {
    fn request(
        _: &mut Self,
        _: &Client,
        _: &wl_callback::WlCallback,
        _: wl_callback::Request,
        _: &(),
        _: &DisplayHandle,
        _: &mut DataInit<'_, Self>,
    ) {
    }
}

impl Dispatch<wl_shm::WlShm, ()> for Compositor {
    fn request(
        _: &mut Self,
        _: &Client,
        _: &wl_shm::WlShm,
        request: wl_shm::Request,
        _: &(),
        _: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        if let wl_shm::Request::CreatePool { id, .. } = request {
            data_init.init(id, ());
        }
    }
}

impl Dispatch<wl_shm_pool::WlShmPool, ()> for Compositor {
    fn request(
        state: &mut Self,
        _: &Client,
        _: &wl_shm_pool::WlShmPool,
        request: wl_shm_pool::Request,
        _: &(),
        _: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        if let wl_shm_pool::Request::CreateBuffer {
            id, width, height, ..
        } = request
        {
            data_init.init(id, ());
            state
                .observed()
                .record(format!("create_buffer {width}x{height}"));
        }
    }
}

impl Dispatch<wl_buffer::WlBuffer, ()> for Compositor {
    fn request(
        _: &mut Self,
        _: &Client,
        _: &wl_buffer::WlBuffer,
        _: wl_buffer::Request,
        _: &(),
        _: &DisplayHandle,
        _: &mut DataInit<'_, Self>,
    ) {
    }
}

impl Dispatch<wl_output::WlOutput, ()> for Compositor {
    fn request(
        _: &mut Self,
        _: &Client,
        _: &wl_output::WlOutput,
        _: wl_output::Request,
        _: &(),
        _: &DisplayHandle,
        _: &mut DataInit<'_, Self>,
    ) {
    }
}

// XDG shell

impl Dispatch<xdg_wm_base::XdgWmBase, ()> for Compositor {
    fn request(
        state: &mut Self,
        _: &Client,
        _: &xdg_wm_base::XdgWmBase,
        request: xdg_wm_base::Request,
        _: &(),
        _: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            xdg_wm_base::Request::GetXdgSurface { id, .. } => {
                let xdg_surface = data_init.init(id, ());
                state.observed().xdg_surface = Some(xdg_surface);
            }
            xdg_wm_base::Request::Pong { serial } => {
                state.observed().record(format!("pong {serial}"));
            }
            _ => {}
        }
    }
}

impl Dispatch<xdg_surface::XdgSurface, ()> for Compositor {
    fn request(
        state: &mut Self,
        _: &Client,
        _: &xdg_surface::XdgSurface,
        request: xdg_surface::Request,
        _: &(),
        _: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            xdg_surface::Request::GetToplevel { id } => {
                let toplevel = data_init.init(id, ());
                state.observed().toplevel = Some(toplevel);
            }
            xdg_surface::Request::AckConfigure { serial } => {
                state.observed().record(format!("ack_configure {serial}"));
            }
            _ => {}
        }
    }
}

impl Dispatch<xdg_toplevel::XdgToplevel, ()> for Compositor {
    fn request(
        state: &mut Self,
        _: &Client,
        _: &xdg_toplevel::XdgToplevel,
        request: xdg_toplevel::Request,
        _: &(),
        _: &DisplayHandle,
        _: &mut DataInit<'_, Self>,
    ) {
        if let xdg_toplevel::Request::SetTitle { title } = request {
            state.observed().record(format!("set_title {title}"));
        }
    }
}

// Wayfire shell

impl Dispatch<ZwfShellManagerV2, ()> for Compositor {
    fn request(
        state: &mut Self,
        _: &Client,
        _: &ZwfShellManagerV2,
        request: zwf_shell_manager_v2::Request,
        _: &(),
        _: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            zwf_shell_manager_v2::Request::GetWfOutput { id, .. } => {
                data_init.init(id, ());
                state.observed().record("get_wf_output");
            }
            zwf_shell_manager_v2::Request::GetWfSurface { id, .. } => {
                data_init.init(id, ());
            }
        }
    }
}

impl Dispatch<ZwfOutputV2, ()> for Compositor {
    fn request(
        state: &mut Self,
        _: &Client,
        _: &ZwfOutputV2,
        request: zwf_output_v2::Request,
        _: &(),
        _: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        if let zwf_output_v2::Request::CreateHotspot {
            hotspot,
            threshold,
            timeout,
            id,
        } = request
        {
            data_init.init(id, ());
            state.observed().record(format!(
                "create_hotspot edge={hotspot} threshold={threshold} timeout={timeout}"
            ));
        }
    }
}

impl Dispatch<ZwfHotspotV2, ()> for Compositor {
    fn request(
        _: &mut Self,
        _: &Client,
        _: &ZwfHotspotV2,
        _: wayfire_shell::zwf_hotspot_v2::Request,
        _: &(),
        _: &DisplayHandle,
        _: &mut DataInit<'_, Self>,
    ) {
    }
}

impl Dispatch<ZwfSurfaceV2, ()> for Compositor {
    fn request(
        _: &mut Self,
        _: &Client,
        _: &ZwfSurfaceV2,
        _: zwf_surface_v2::Request,
        _: &(),
        _: &DisplayHandle,
        _: &mut DataInit<'_, Self>,
    ) {
    }
}
