use std::fs;
use std::time::Instant;

use dpslink_bridge::{Bridge, BridgeConfig, Completion, QueryPolicy};
use dpslink_transport::{SerialDevice, TcpEndpoint};

use crate::cmd::{parse_duration, ProbeArgs};
use crate::exit::{
    bridge_error, transport_error, CliError, CliResult, DATA_INVALID, SUCCESS, TIMEOUT, USAGE,
};
use crate::output::{from_hex, print_response, OutputFormat};

pub fn run(args: ProbeArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = resolve_payload(&args)?;
    let frame = dpslink_frame::seal(&payload);
    if frame.len() > args.max_frame {
        return Err(CliError::new(
            DATA_INVALID,
            format!(
                "sealed frame is {} bytes, max {}",
                frame.len(),
                args.max_frame
            ),
        ));
    }

    let config = BridgeConfig {
        max_clients: 0,
        max_frame: args.max_frame,
        response_timeout: parse_duration(&args.timeout)?,
        query_policy: QueryPolicy::Discard,
    };
    let device = SerialDevice::open(&args.device, args.baud)
        .map_err(|err| transport_error("serial open failed", err))?;
    let mut bridge: Bridge<SerialDevice, TcpEndpoint> = Bridge::new(device, &config);

    let started = Instant::now();
    let completion = bridge
        .execute(&frame)
        .map_err(|err| bridge_error("probe failed", err))?;

    match completion {
        Completion::Response(response) => {
            print_response(&args.device, &response, started.elapsed(), format);
            Ok(SUCCESS)
        }
        Completion::Timeout => Err(CliError::new(
            TIMEOUT,
            format!("device did not respond within {}", args.timeout),
        )),
        Completion::Overflow => Err(CliError::new(
            DATA_INVALID,
            format!("device response exceeded {} bytes", args.max_frame),
        )),
    }
}

fn resolve_payload(args: &ProbeArgs) -> CliResult<Vec<u8>> {
    if let Some(hex) = &args.hex {
        return from_hex(hex)
            .ok_or_else(|| CliError::new(USAGE, format!("--hex is not valid hex: {hex}")));
    }
    if let Some(path) = &args.file {
        return fs::read(path).map_err(|err| {
            crate::exit::io_error(&format!("failed reading {}", path.display()), err)
        });
    }
    Err(CliError::new(USAGE, "provide a payload via --hex or --file"))
}
