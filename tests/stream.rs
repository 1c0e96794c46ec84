use std::io::{Cursor, Read};

use fairsim::{transport, Scheduler};

mod common;

/// A reader that hands out at most `chunk` bytes per call, exercising
/// record reassembly across reads.
struct ChunkedReader {
    data: Vec<u8>,
    pos: usize,
    chunk: usize,
}

impl ChunkedReader {
    fn new(data: &[u8], chunk: usize) -> Self {
        ChunkedReader {
            data: data.to_vec(),
            pos: 0,
            chunk,
        }
    }
}

impl Read for ChunkedReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = buf
            .len()
            .min(self.chunk)
            .min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

fn run_stream(input: &[u8], cpus: usize, quanta: i64) -> String {
    let mut sched = Scheduler::new(cpus, quanta);
    let mut out = Vec::new();
    transport::serve(Cursor::new(input.to_vec()), &mut sched, &mut out)
        .expect("stream processing failed");
    String::from_utf8(out).expect("output is UTF-8")
}

/// End-to-end: framed records in, exact result lines out.
#[test]
fn test_stream_end_to_end() {
    common::setup_test();
    let input = concat!(
        r#"{"vtime":1,"events":[{"action":"TASK_CREATE","taskId":"A"}]}"#,
        r#"{"vtime":2,"events":[]}"#,
    );
    let out = run_stream(input.as_bytes(), 1, 1);
    assert_eq!(
        out,
        concat!(
            r#"{"vtime":1,"schedule":["A"],"meta":{"preemptions":0,"migrations":0}}"#,
            "\n",
            r#"{"vtime":2,"schedule":["A"],"meta":{"preemptions":0,"migrations":0}}"#,
            "\n",
        )
    );
}

/// Records that fail to parse or lack vtime/events are skipped without
/// producing output; the stream continues.
#[test]
fn test_bad_records_skipped() {
    common::setup_test();
    let input = concat!(
        r#"{"vtime":}"#,                   // parse failure
        r#"{"vtime":1}"#,                  // missing events
        r#"{"events":[]}"#,                // missing vtime
        r#"{"vtime":"soon","events":[]}"#, // mistyped vtime
        r#"{"vtime":5,"events":[]}"#,      // finally, a valid record
    );
    let out = run_stream(input.as_bytes(), 2, 1);
    assert_eq!(
        out,
        concat!(
            r#"{"vtime":5,"schedule":["idle","idle"],"meta":{"preemptions":0,"migrations":0}}"#,
            "\n",
        )
    );
}

/// Garbage between records and records split across tiny reads both
/// reassemble cleanly.
#[test]
fn test_chunked_and_noisy_stream() {
    common::setup_test();
    let input = concat!(
        "  noise\n",
        r#"{"vtime":1,"events":[{"action":"TASK_CREATE","taskId":"{odd} id"}]}"#,
        "garbage between",
        r#"{"vtime":2,"events":[]}"#,
    );

    let mut sched = Scheduler::new(1, 1);
    let mut out = Vec::new();
    transport::serve(ChunkedReader::new(input.as_bytes(), 3), &mut sched, &mut out)
        .expect("stream processing failed");

    let out = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[0],
        r#"{"vtime":1,"schedule":["{odd} id"],"meta":{"preemptions":0,"migrations":0}}"#
    );
    assert_eq!(
        lines[1],
        r#"{"vtime":2,"schedule":["{odd} id"],"meta":{"preemptions":0,"migrations":0}}"#
    );
}

/// An unterminated trailing record is discarded at end-of-stream.
#[test]
fn test_incomplete_trailing_record_discarded() {
    common::setup_test();
    let input = concat!(
        r#"{"vtime":1,"events":[]}"#,
        r#"{"vtime":2,"events":["#, // never closes
    );
    let out = run_stream(input.as_bytes(), 1, 1);
    assert_eq!(out.lines().count(), 1);
}

/// Identical input streams produce byte-identical output streams.
#[test]
fn test_deterministic_output() {
    common::setup_test();
    let input = concat!(
        r#"{"vtime":1,"events":[
            {"action":"CGROUP_CREATE","cgroupId":"g","cpuShares":512},
            {"action":"TASK_CREATE","taskId":"a","cgroupId":"g"},
            {"action":"TASK_CREATE","taskId":"b","nice":-3},
            {"action":"TASK_CREATE","taskId":"c"}]}"#,
        r#"{"vtime":2,"events":[{"action":"TASK_SET_AFFINITY","taskId":"b","cpuMask":[1]}]}"#,
        r#"{"vtime":3,"events":[{"action":"TASK_BLOCK","taskId":"c"}]}"#,
        r#"{"vtime":4,"events":[{"action":"TASK_UNBLOCK","taskId":"c"}]}"#,
        r#"{"vtime":5,"events":[]}"#,
    );

    let first = run_stream(input.as_bytes(), 2, 10);
    let second = run_stream(input.as_bytes(), 2, 10);
    assert_eq!(first, second);
    assert_eq!(first.lines().count(), 5);
}
