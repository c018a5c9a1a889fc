//! Logging setup shared by the probes.
//!
//! Probes report what they do on stderr, which is where a person running
//! them from a terminal is looking. Probes started by a compositor's
//! autostart usually have no terminal, so journald is available as well.

use std::sync::Once;

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "wleird_client=debug,wleird_probes=debug,info";

/// Where log records go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogTarget {
    #[default]
    Stderr,
    Journald,
}

/// Initialize logging. Filter controlled by RUST_LOG.
/// Only the first call has an effect.
pub fn init(target: LogTarget) {
    static INIT_LOG: Once = Once::new();
    INIT_LOG.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        if target == LogTarget::Journald {
            match tracing_journald::layer() {
                Ok(journald) => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(journald.with_syslog_identifier("wleird".to_string()))
                        .init();
                    return;
                }
                Err(e) => eprintln!("journald unavailable, logging to stderr: {e}"),
            }
        }

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    });
}
