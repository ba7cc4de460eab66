use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dpslink_bridge::{Bridge, BridgeConfig};
use dpslink_transport::{BridgeListener, ConsoleEndpoint, SerialDevice};
use tracing::info;

use crate::cmd::{parse_duration, ServeArgs};
use crate::exit::{bridge_error, transport_error, CliError, CliResult, SUCCESS};
use crate::output::OutputFormat;

/// Sleep between polling iterations so an idle bridge does not spin.
const IDLE_SLEEP: Duration = Duration::from_millis(1);

pub fn run(args: ServeArgs, _format: OutputFormat) -> CliResult<i32> {
    let config = BridgeConfig {
        max_clients: args.max_clients,
        max_frame: args.max_frame,
        response_timeout: parse_duration(&args.timeout)?,
        query_policy: args.query_policy.into(),
    };

    let device = SerialDevice::open(&args.device, args.baud)
        .map_err(|err| transport_error("serial open failed", err))?;
    let listener =
        BridgeListener::bind(args.listen).map_err(|err| transport_error("bind failed", err))?;

    let mut bridge = Bridge::new(device, &config);
    if args.console {
        bridge = bridge.with_console(ConsoleEndpoint::stdio());
    }

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    info!(
        device = %args.device,
        listen = %listener.local_addr(),
        max_clients = config.max_clients,
        "bridge running"
    );

    while running.load(Ordering::SeqCst) {
        if let Some(conn) = listener
            .try_accept()
            .map_err(|err| transport_error("accept failed", err))?
        {
            bridge.accept(conn);
        }

        bridge
            .poll_cycle(Instant::now())
            .map_err(|err| bridge_error("bridge poll failed", err))?;

        std::thread::sleep(IDLE_SLEEP);
    }

    info!("bridge stopped");
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
