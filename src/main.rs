use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use natsd::Broker;

/// natsd - a blocking, thread-per-connection broker for the NATS text wire protocol.
#[derive(Parser, Debug)]
#[command(name = "natsd", version, about)]
struct Cli {
    /// Address to bind the listener on.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on. Kept as text and parsed by hand, rather than clap's
    /// own `u16` value_parser, so a malformed value exits 1 instead of clap's
    /// own usage-error exit code 2.
    #[arg(long, default_value = "4222")]
    port: String,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let port: u16 = match cli.port.parse() {
        Ok(port) => port,
        Err(_) => {
            log::error!(target: "natsd", "invalid port number: {}", cli.port);
            return ExitCode::from(1);
        }
    };

    let broker = Arc::new(Broker::new(cli.host, port));

    use signal_hook::consts::signal::{SIGINT, SIGTERM};

    let shutdown = Arc::new(AtomicBool::new(false));
    for sig in [SIGINT, SIGTERM] {
        if let Err(e) = signal_hook::flag::register(sig, Arc::clone(&shutdown)) {
            log::error!(target: "natsd", "failed to register signal handler: {}", e);
            return ExitCode::FAILURE;
        }
    }

    if let Err(e) = broker.start() {
        log::error!(target: "natsd", "failed to start: {}", e);
        return ExitCode::FAILURE;
    }

    while broker.is_running() && !shutdown.load(Ordering::Relaxed) {
        std::thread::sleep(Duration::from_millis(200));
    }

    broker.stop();
    ExitCode::SUCCESS
}
