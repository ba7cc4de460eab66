use std::io::{IsTerminal, Write};
use std::time::Duration;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ResponseOutput<'a> {
    device: &'a str,
    frame_len: usize,
    frame_hex: String,
    payload_hex: Option<String>,
    elapsed_ms: u128,
}

/// Print one completed transaction's response frame.
pub fn print_response(device: &str, frame: &[u8], elapsed: Duration, format: OutputFormat) {
    let payload = dpslink_frame::open(frame);
    match format {
        OutputFormat::Json => {
            let out = ResponseOutput {
                device,
                frame_len: frame.len(),
                frame_hex: to_hex(frame),
                payload_hex: payload.as_deref().map(to_hex),
                elapsed_ms: elapsed.as_millis(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["DEVICE", "LEN", "ELAPSED", "FRAME"])
                .add_row(vec![
                    device.to_string(),
                    frame.len().to_string(),
                    format!("{}ms", elapsed.as_millis()),
                    to_hex(frame),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "device={} len={} elapsed={}ms frame={}",
                device,
                frame.len(),
                elapsed.as_millis(),
                to_hex(frame)
            );
        }
        OutputFormat::Raw => {
            print_raw(frame);
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

pub fn to_hex(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    for byte in data {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Parse a hex string (whitespace tolerated) into bytes.
pub fn from_hex(input: &str) -> Option<Vec<u8>> {
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.len() % 2 != 0 {
        return None;
    }
    let mut out = Vec::with_capacity(cleaned.len() / 2);
    let digits = cleaned.as_bytes();
    for pair in digits.chunks(2) {
        let hi = (pair[0] as char).to_digit(16)?;
        let lo = (pair[1] as char).to_digit(16)?;
        out.push(((hi << 4) | lo) as u8);
    }
    Some(out)
}
