//! Stream transport: Unix-socket source, line-oriented result sink.
//!
//! The transport owns the read loop. It frames records out of the byte
//! stream, decodes each one leniently, hands the batch to the scheduler
//! core serially, and writes one result line per processed record, in
//! stream order. Skipped records never produce output; identical input
//! streams produce byte-identical output streams.

use std::io::{ErrorKind, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, info};

use crate::engine::Scheduler;
use crate::event::EventBatch;
use crate::frame::FrameExtractor;

/// Connect to the socket and run the scheduler against the stream
/// until end-of-stream.
pub fn run(socket: &Path, sched: &mut Scheduler) -> Result<()> {
    let stream = UnixStream::connect(socket)
        .with_context(|| format!("failed to connect to {}", socket.display()))?;
    info!(socket = %socket.display(), "connected");

    let stdout = std::io::stdout();
    serve(stream, sched, &mut stdout.lock())
}

/// The core loop over any byte source/sink pair; separated from
/// [`run`] so tests can drive it with in-memory buffers.
pub fn serve<R: Read, W: Write>(mut source: R, sched: &mut Scheduler, sink: &mut W) -> Result<()> {
    let mut extractor = FrameExtractor::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = match source.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context("transport read failed"),
        };
        extractor.extend(&chunk[..n]);

        while let Some(record) = extractor.next_record() {
            let value: Value = match serde_json::from_slice(&record) {
                Ok(v) => v,
                Err(e) => {
                    debug!(error = %e, "skipping unparseable record");
                    continue;
                }
            };
            let Some(batch) = EventBatch::decode(&value) else {
                debug!("skipping record without vtime/events");
                continue;
            };

            let result = sched.tick(batch.vtime, &batch.events);
            let line = serde_json::to_string(&result).context("result encoding failed")?;
            sink.write_all(line.as_bytes()).context("result write failed")?;
            sink.write_all(b"\n").context("result write failed")?;
            sink.flush().context("result flush failed")?;
        }
    }

    if extractor.buffered() > 0 {
        debug!(
            bytes = extractor.buffered(),
            "discarding incomplete record at end-of-stream"
        );
    }
    info!("end of stream");
    Ok(())
}
