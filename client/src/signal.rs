//! SIGUSR1 delivery as a pollable flag.
//!
//! The handler is installed without `SA_RESTART`: a `poll()` blocked in the
//! event loop returns `EINTR` as soon as the signal lands, so the loop gets to
//! look at the flag without waiting for the poll timeout.

use std::io;
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};

static SIGUSR1_RECEIVED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_sigusr1(_: libc::c_int) {
    SIGUSR1_RECEIVED.store(true, Ordering::SeqCst);
}

/// Install the SIGUSR1 handler for this process.
pub fn install_sigusr1() -> io::Result<()> {
    let handler: extern "C" fn(libc::c_int) = on_sigusr1;

    // SAFETY: the sigaction struct is fully initialized before use and the
    // handler only touches an atomic, which is async-signal-safe.
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = handler as libc::sighandler_t;
        action.sa_flags = 0;
        if libc::sigemptyset(&mut action.sa_mask) == -1 {
            return Err(io::Error::last_os_error());
        }
        if libc::sigaction(libc::SIGUSR1, &action, ptr::null_mut()) == -1 {
            return Err(io::Error::last_os_error());
        }
    }

    Ok(())
}

/// Returns true once per received SIGUSR1 burst and clears the flag.
pub fn take_sigusr1() -> bool {
    SIGUSR1_RECEIVED.swap(false, Ordering::SeqCst)
}

/// Serializes tests that raise SIGUSR1, since the flag is process-wide.
#[cfg(test)]
pub(crate) static TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
