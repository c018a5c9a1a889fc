//! Single-threaded poll/dispatch loop.
//!
//! `EventQueue::blocking_dispatch` restarts its wait when a signal
//! interrupts it, which would leave a signal flag unnoticed until the next
//! protocol event. This loop polls the connection itself with a short
//! timeout, treats `EINTR` as a wakeup and hands control back to the probe
//! after every dispatch.

use std::io;
use std::os::fd::{AsRawFd, BorrowedFd};

use anyhow::Context;
use tracing::trace;
use wayland_client::{backend::WaylandError, Connection, EventQueue, QueueHandle};

/// Upper bound on how long a single poll blocks.
pub const POLL_TIMEOUT_MS: libc::c_int = 100;

/// Probe state driven by [`run`].
pub trait LoopState: Sized + 'static {
    /// Called after every dispatch, including idle wakeups.
    fn after_dispatch(&mut self, _qh: &QueueHandle<Self>) -> anyhow::Result<()> {
        Ok(())
    }

    /// The loop exits once this returns false.
    fn running(&self) -> bool;
}

/// Run the event loop until the state stops or the connection fails.
pub fn run<S: LoopState>(
    conn: &Connection,
    queue: &mut EventQueue<S>,
    state: &mut S,
) -> anyhow::Result<()> {
    let qh = queue.handle();

    while state.running() {
        flush(conn)?;

        match queue.prepare_read() {
            None => {
                queue.dispatch_pending(state)?;
            }
            Some(guard) => {
                let ready = wait_for(guard.connection_fd(), libc::POLLIN, POLL_TIMEOUT_MS);
                match ready {
                    Ok(true) => match guard.read() {
                        Ok(_) => {}
                        Err(WaylandError::Io(e)) if e.kind() == io::ErrorKind::WouldBlock => {}
                        Err(e) => return Err(e).context("failed to read Wayland events"),
                    },
                    // Timeout: dropping the guard cancels the read
                    Ok(false) => drop(guard),
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                        trace!("poll interrupted by signal");
                        drop(guard);
                    }
                    Err(e) => {
                        drop(guard);
                        return Err(e).context("poll failed");
                    }
                }
            }
        }

        queue.dispatch_pending(state)?;
        state.after_dispatch(&qh)?;
    }

    Ok(())
}

/// Flush outgoing requests, waiting for the socket to drain if it is full.
fn flush(conn: &Connection) -> anyhow::Result<()> {
    loop {
        match conn.flush() {
            Ok(()) => return Ok(()),
            Err(WaylandError::Io(e)) if e.kind() == io::ErrorKind::WouldBlock => {
                let backend = conn.backend();
                match wait_for(backend.poll_fd(), libc::POLLOUT, -1) {
                    Ok(_) => {}
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                    Err(e) => return Err(e).context("poll failed"),
                }
            }
            Err(e) => return Err(e).context("failed to flush Wayland requests"),
        }
    }
}

/// Poll a single fd. Returns whether it became ready (hangups and errors
/// count as ready so the following read reports them).
pub fn wait_for(
    fd: BorrowedFd<'_>,
    events: libc::c_short,
    timeout_ms: libc::c_int,
) -> io::Result<bool> {
    let mut pfd = libc::pollfd {
        fd: fd.as_raw_fd(),
        events,
        revents: 0,
    };

    // SAFETY: pfd is a valid pollfd for the duration of the call.
    let ret = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
    match ret {
        -1 => Err(io::Error::last_os_error()),
        0 => Ok(false),
        _ => Ok(pfd.revents & (events | libc::POLLERR | libc::POLLHUP) != 0),
    }
}
