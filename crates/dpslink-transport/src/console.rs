use std::io::Write;
use std::sync::mpsc::{Receiver, TryRecvError};

use bytes::{Buf, BytesMut};
use tracing::debug;

use crate::traits::Endpoint;

/// The local console endpoint.
///
/// Input bytes arrive through a channel fed by a dedicated stdin reader
/// thread, so the polling loop never blocks on the terminal. Output goes to
/// a boxed writer — stdout in production, a capture buffer in tests. The
/// console exists for the lifetime of the process and is always live, even
/// after stdin reaches EOF.
pub struct ConsoleEndpoint {
    rx: Receiver<Vec<u8>>,
    pending: BytesMut,
    out: Box<dyn Write + Send>,
}

impl ConsoleEndpoint {
    /// Build a console endpoint from an input channel and an output sink.
    pub fn new(rx: Receiver<Vec<u8>>, out: Box<dyn Write + Send>) -> Self {
        Self {
            rx,
            pending: BytesMut::new(),
            out,
        }
    }

    /// Attach the process's stdin and stdout.
    pub fn stdio() -> Self {
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            use std::io::Read;
            let mut stdin = std::io::stdin();
            let mut chunk = [0u8; 256];
            loop {
                match stdin.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(chunk[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        debug!(%err, "console stdin read failed");
                        break;
                    }
                }
            }
        });
        Self::new(rx, Box::new(std::io::stdout()))
    }

    fn pump(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(chunk) => self.pending.extend_from_slice(&chunk),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }
}

impl Endpoint for ConsoleEndpoint {
    fn is_live(&self) -> bool {
        true
    }

    fn peek(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.pump();
        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        Ok(n)
    }

    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.pump();
        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.advance(n);
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.out.write_all(buf)?;
        self.out.flush()
    }
}
