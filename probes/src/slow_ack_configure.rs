//! slow-ack-configure entry point
//!
//! Opens a toplevel that acknowledges configures only after a delay of
//! frame callbacks.

use tracing::{error, info};
use wleird_client::args::{Invocation, SLOW_ACK_USAGE};
use wleird_client::{logging, probes, SlowAckArgs};

fn main() {
    let args = match SlowAckArgs::parse(std::env::args().skip(1)) {
        Ok(Invocation::Run(args)) => args,
        Ok(Invocation::Help) => {
            println!("{SLOW_ACK_USAGE}");
            return;
        }
        Err(e) => {
            eprintln!("slow-ack-configure: {:#}", e);
            eprintln!();
            eprintln!("{SLOW_ACK_USAGE}");
            std::process::exit(1);
        }
    };

    logging::init(args.log_target);
    info!("Starting slow-ack-configure");

    if let Err(e) = probes::slow_ack::run(&args) {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}
