//! Solid-colour `wl_shm` buffers.
//!
//! Probes only ever need a flat rectangle of one colour, so buffers are
//! written straight into a memfd rather than mapped.

use std::ffi::CStr;
use std::fs::File;
use std::io::{self, Write};
use std::os::fd::{AsFd, FromRawFd, OwnedFd};

use anyhow::{bail, Context};
use wayland_client::{
    protocol::{wl_buffer, wl_shm, wl_shm_pool},
    Dispatch, QueueHandle,
};

const BYTES_PER_PIXEL: u32 = 4;

/// RGBA colour with channels in `[0, 1]`, not premultiplied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color(pub [f32; 4]);

impl Color {
    pub const RED: Color = Color([1.0, 0.0, 0.0, 1.0]);

    /// Premultiplied ARGB8888 pixel value.
    pub fn to_argb8888(self) -> u32 {
        let [r, g, b, a] = self.0.map(|c| c.clamp(0.0, 1.0));
        let channel = |v: f32| (v * 255.0).round() as u32;

        (channel(a) << 24) | (channel(r * a) << 16) | (channel(g * a) << 8) | channel(b * a)
    }
}

/// Byte length and stride of a `width` x `height` ARGB8888 buffer.
pub fn buffer_layout(width: u32, height: u32) -> anyhow::Result<(i32, i32)> {
    if width == 0 || height == 0 {
        bail!("cannot create an empty {width}x{height} buffer");
    }

    let stride = width
        .checked_mul(BYTES_PER_PIXEL)
        .and_then(|s| i32::try_from(s).ok());
    let size = stride.and_then(|s| s.checked_mul(i32::try_from(height).ok()?));

    match (stride, size) {
        (Some(stride), Some(size)) => Ok((size, stride)),
        _ => bail!("buffer size {width}x{height} overflows"),
    }
}

/// Fill a new memfd with `pixels` copies of `pixel`.
fn filled_memfd(pixels: usize, pixel: u32) -> io::Result<File> {
    let name: &CStr = c"wleird-shm";

    // SAFETY: name is a valid NUL-terminated string; the returned fd is owned
    // by nothing else.
    let fd = unsafe { libc::memfd_create(name.as_ptr(), libc::MFD_CLOEXEC) };
    if fd == -1 {
        return Err(io::Error::last_os_error());
    }
    let mut file = File::from(unsafe { OwnedFd::from_raw_fd(fd) });

    let row: Vec<u8> = std::iter::repeat(pixel.to_ne_bytes())
        .take(pixels)
        .flatten()
        .collect();
    file.write_all(&row)?;
    file.flush()?;

    Ok(file)
}

/// Create a `wl_buffer` of the given size filled with `color`.
///
/// The pool is destroyed right away; the compositor keeps the memory alive
/// for as long as the buffer exists.
pub fn create_buffer<D>(
    shm: &wl_shm::WlShm,
    qh: &QueueHandle<D>,
    width: u32,
    height: u32,
    color: Color,
) -> anyhow::Result<wl_buffer::WlBuffer>
where
    D: Dispatch<wl_shm_pool::WlShmPool, ()> + Dispatch<wl_buffer::WlBuffer, ()> + 'static,
{
    let (size, stride) = buffer_layout(width, height)?;
    let file = filled_memfd((width * height) as usize, color.to_argb8888())
        .context("failed to allocate shm buffer")?;

    let pool = shm.create_pool(file.as_fd(), size, qh, ());
    let buffer = pool.create_buffer(
        0,
        width as i32,
        height as i32,
        stride,
        wl_shm::Format::Argb8888,
        qh,
        (),
    );
    pool.destroy();

    Ok(buffer)
}
