//! Client bindings for `wayfire-shell-unstable-v2`.
//!
//! The protocol is not part of `wayland-protocols`, so the XML is vendored
//! under `protocols/` and expanded here by `wayland-scanner`.

#![allow(dead_code, non_camel_case_types, unused_unsafe, unused_variables)]
#![allow(non_upper_case_globals, non_snake_case, unused_imports)]
#![allow(missing_docs, clippy::all)]

use wayland_client;
use wayland_client::protocol::*;

pub mod __interfaces {
    use wayland_client::backend as wayland_backend;
    use wayland_client::protocol::__interfaces::*;
    wayland_scanner::generate_interfaces!("protocols/wayfire-shell-unstable-v2.xml");
}
use self::__interfaces::*;

wayland_scanner::generate_client_code!("protocols/wayfire-shell-unstable-v2.xml");
