//! wfshell-tester entry point

use tracing::{error, info};
use wleird_client::args::{Invocation, WFSHELL_USAGE};
use wleird_client::{logging, probes, WfShellArgs};

fn main() {
    let args = match WfShellArgs::parse(std::env::args().skip(1)) {
        Ok(Invocation::Run(args)) => args,
        Ok(Invocation::Help) => {
            println!("{WFSHELL_USAGE}");
            return;
        }
        Err(e) => {
            eprintln!("wfshell-tester: {:#}", e);
            eprintln!();
            eprintln!("{WFSHELL_USAGE}");
            std::process::exit(1);
        }
    };

    logging::init(args.log_target);
    info!(hotspot = ?args.hotspot, "Starting wfshell-tester");

    match probes::wfshell::run(&args) {
        Ok(never) => match never {},
        Err(e) => {
            error!("Fatal error: {:#}", e);
            std::process::exit(1);
        }
    }
}
