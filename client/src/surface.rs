//! Toplevel window plumbing shared by the surface-based probes.

use anyhow::Context;
use wayland_client::{
    globals::GlobalList,
    protocol::{wl_buffer, wl_compositor, wl_shm, wl_shm_pool, wl_surface},
    Dispatch, QueueHandle,
};
use wayland_protocols::xdg::shell::client::{xdg_surface, xdg_toplevel, xdg_wm_base};

use crate::shm::{self, Color};

/// Globals every toplevel probe needs.
#[derive(Debug)]
pub struct Globals {
    pub compositor: wl_compositor::WlCompositor,
    pub shm: wl_shm::WlShm,
    pub wm_base: xdg_wm_base::XdgWmBase,
}

impl Globals {
    /// Bind the core globals from an initial registry roundtrip.
    pub fn bind<D>(globals: &GlobalList, qh: &QueueHandle<D>) -> anyhow::Result<Self>
    where
        D: Dispatch<wl_compositor::WlCompositor, ()>
            + Dispatch<wl_shm::WlShm, ()>
            + Dispatch<xdg_wm_base::XdgWmBase, ()>
            + 'static,
    {
        let compositor: wl_compositor::WlCompositor = globals
            .bind(qh, 1..=4, ())
            .context("compositor has no wl_compositor")?;
        let shm: wl_shm::WlShm = globals.bind(qh, 1..=1, ()).context("compositor has no wl_shm")?;
        let wm_base: xdg_wm_base::XdgWmBase = globals
            .bind(qh, 1..=2, ())
            .context("compositor has no xdg_wm_base")?;

        Ok(Self {
            compositor,
            shm,
            wm_base,
        })
    }
}

/// A `wl_surface` drawn as a single solid colour.
#[derive(Debug)]
pub struct Surface {
    pub wl_surface: wl_surface::WlSurface,
    pub width: u32,
    pub height: u32,
    pub color: Color,
}

impl Surface {
    /// Attach a fresh buffer at the current size and commit.
    pub fn render<D>(&self, shm: &wl_shm::WlShm, qh: &QueueHandle<D>) -> anyhow::Result<()>
    where
        D: Dispatch<wl_shm_pool::WlShmPool, ()> + Dispatch<wl_buffer::WlBuffer, ()> + 'static,
    {
        let buffer = shm::create_buffer(shm, qh, self.width, self.height, self.color)?;
        self.wl_surface.attach(Some(&buffer), 0, 0);
        self.wl_surface
            .damage(0, 0, self.width as i32, self.height as i32);
        self.wl_surface.commit();
        Ok(())
    }
}

/// An xdg toplevel window.
#[derive(Debug)]
pub struct Toplevel {
    pub surface: Surface,
    pub xdg_surface: xdg_surface::XdgSurface,
    pub xdg_toplevel: xdg_toplevel::XdgToplevel,
}

impl Toplevel {
    /// Create the toplevel and perform the initial bufferless commit, which
    /// asks the compositor for the first configure.
    pub fn new<D>(
        globals: &Globals,
        qh: &QueueHandle<D>,
        title: &str,
        width: u32,
        height: u32,
        color: Color,
    ) -> Self
    where
        D: Dispatch<wl_surface::WlSurface, ()>
            + Dispatch<xdg_surface::XdgSurface, ()>
            + Dispatch<xdg_toplevel::XdgToplevel, ()>
            + 'static,
    {
        let wl_surface = globals.compositor.create_surface(qh, ());
        let xdg_surface = globals.wm_base.get_xdg_surface(&wl_surface, qh, ());
        let xdg_toplevel = xdg_surface.get_toplevel(qh, ());
        xdg_toplevel.set_title(title.to_string());
        xdg_toplevel.set_app_id(title.to_string());
        wl_surface.commit();

        Self {
            surface: Surface {
                wl_surface,
                width,
                height,
                color,
            },
            xdg_surface,
            xdg_toplevel,
        }
    }
}
