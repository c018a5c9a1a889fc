//! Command-line parsing for the probe binaries.
//!
//! Each probe takes a handful of flags, so arguments are walked by hand
//! instead of through a parser framework.

use anyhow::{anyhow, bail, Context};

use crate::logging::LogTarget;
use crate::probes::wfshell::HotspotRequest;
use crate::protocols::wayfire_shell::zwf_output_v2::HotspotEdge;

/// Size used when the compositor leaves the choice to the client.
pub const DEFAULT_WIDTH: u32 = 300;
pub const DEFAULT_HEIGHT: u32 = 400;

/// Frame callbacks to wait before acknowledging a configure.
pub const DEFAULT_FRAME_DELAY: u32 = 32;

pub const SLOW_ACK_USAGE: &str = "\
Usage: slow-ack-configure [OPTIONS] [WIDTH] [HEIGHT]

Acknowledges every configure after the first one only after a number of
frame callbacks. Send SIGUSR1 to reset the surface and ack the next
configure immediately.

Options:
  --frame-delay N   frame callbacks to wait before acking (default 32)
  --journald        log to journald instead of stderr
  -h, --help        print this help";

pub const WFSHELL_USAGE: &str = "\
Usage: wfshell-tester [OPTIONS]

Creates a wayfire-shell hotspot on every output right after its wl_output
global is removed.

Options:
  --edge EDGE       top, bottom, left or right (default top)
  --threshold N     hotspot distance from the edge (default 10)
  --timeout MS      hotspot activation delay (default 100)
  --journald        log to journald instead of stderr
  -h, --help        print this help";

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation<T> {
    Run(T),
    Help,
}

/// Options for `slow-ack-configure`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlowAckArgs {
    /// Width used when a configure carries no size
    pub width: u32,
    /// Height used when a configure carries no size
    pub height: u32,
    pub frame_delay: u32,
    pub log_target: LogTarget,
}

impl Default for SlowAckArgs {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            frame_delay: DEFAULT_FRAME_DELAY,
            log_target: LogTarget::Stderr,
        }
    }
}

impl SlowAckArgs {
    /// Parse arguments, excluding the program name.
    pub fn parse<I, S>(args: I) -> anyhow::Result<Invocation<Self>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parsed = Self::default();
        let mut positional = Vec::new();
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => return Ok(Invocation::Help),
                "--journald" => parsed.log_target = LogTarget::Journald,
                "--frame-delay" => {
                    parsed.frame_delay = parse_positive(&arg, args.next())?;
                }
                flag if flag.starts_with("--") => bail!("unknown option {flag}"),
                other => positional.push(other.to_string()),
            }
        }

        let mut positional = positional.into_iter();
        if let Some(width) = positional.next() {
            parsed.width = parse_positive("WIDTH", Some(width))?;
        }
        if let Some(height) = positional.next() {
            parsed.height = parse_positive("HEIGHT", Some(height))?;
        }
        if let Some(extra) = positional.next() {
            bail!("unexpected argument {extra:?}");
        }

        Ok(Invocation::Run(parsed))
    }
}

/// Options for `wfshell-tester`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WfShellArgs {
    pub hotspot: HotspotRequest,
    pub log_target: LogTarget,
}

impl Default for WfShellArgs {
    fn default() -> Self {
        Self {
            hotspot: HotspotRequest::default(),
            log_target: LogTarget::Stderr,
        }
    }
}

impl WfShellArgs {
    /// Parse arguments, excluding the program name.
    pub fn parse<I, S>(args: I) -> anyhow::Result<Invocation<Self>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parsed = Self::default();
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => return Ok(Invocation::Help),
                "--journald" => parsed.log_target = LogTarget::Journald,
                "--edge" => {
                    let value = args.next().ok_or_else(|| anyhow!("--edge needs a value"))?;
                    parsed.hotspot.edge = parse_edge(&value)?;
                }
                "--threshold" => parsed.hotspot.threshold = parse_number(&arg, args.next())?,
                "--timeout" => parsed.hotspot.timeout_ms = parse_number(&arg, args.next())?,
                other => bail!("unexpected argument {other:?}"),
            }
        }

        Ok(Invocation::Run(parsed))
    }
}

/// Map an edge name to the protocol enum.
pub fn parse_edge(value: &str) -> anyhow::Result<HotspotEdge> {
    match value.to_ascii_lowercase().as_str() {
        "top" => Ok(HotspotEdge::Top),
        "bottom" => Ok(HotspotEdge::Bottom),
        "left" => Ok(HotspotEdge::Left),
        "right" => Ok(HotspotEdge::Right),
        _ => bail!("unknown edge {value:?}, expected top, bottom, left or right"),
    }
}

fn parse_number(name: &str, value: Option<String>) -> anyhow::Result<u32> {
    let value = value.ok_or_else(|| anyhow!("{name} needs a value"))?;
    value
        .parse::<u32>()
        .with_context(|| format!("invalid value {value:?} for {name}"))
}

fn parse_positive(name: &str, value: Option<String>) -> anyhow::Result<u32> {
    let number = parse_number(name, value)?;
    if number == 0 {
        bail!("{name} must be greater than zero");
    }
    Ok(number)
}
