//! Call journal: one JSON line per bridge decision.
//!
//! Lines look like
//! `{"timestamp": "...", "type": "upstream_call", "method": "status", ...}`.
//! The bridge emits these event types:
//!
//! | type             | fields                                                   |
//! |------------------|----------------------------------------------------------|
//! | `upstream_call`  | `method`, `transport`, `duration_ms`, `ok`, `error?`, `error_kind?` |
//! | `cache_hit`      | `method`                                                 |
//! | `coalesced`      | `method`                                                 |
//! | `batch_rejected` | `requested`, `max`                                       |

use bridge_application::ports::call_logger::{CallEvent, CallLogger};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// One journal line. Object payloads are flattened next to `type`;
/// anything else is kept under `data`.
#[derive(Serialize)]
struct JournalLine<'a> {
    timestamp: String,
    #[serde(rename = "type")]
    event_type: &'a str,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl<'a> JournalLine<'a> {
    fn new(event_type: &'a str, payload: Value) -> Self {
        let fields = match payload {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => Map::from_iter([("data".to_string(), other)]),
        };
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            event_type,
            fields,
        }
    }
}

/// Append-only JSONL journal of [`CallEvent`]s.
pub struct JsonlCallLogger {
    path: PathBuf,
    out: Mutex<BufWriter<File>>,
}

impl JsonlCallLogger {
    /// Open `path` for appending, creating it and its parent directories.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            out: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &JournalLine<'_>) -> io::Result<()> {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        serde_json::to_writer(&mut *out, line)?;
        out.write_all(b"\n")?;
        out.flush()
    }
}

impl CallLogger for JsonlCallLogger {
    fn log(&self, event: CallEvent) {
        let line = JournalLine::new(event.event_type, event.payload);
        if let Err(e) = self.append(&line) {
            warn!(
                "Dropping {} journal entry for {}: {}",
                line.event_type,
                self.path.display(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read_journal(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_upstream_call_fields_are_flattened() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls.jsonl");
        let journal = JsonlCallLogger::open(&path).unwrap();

        journal.log(CallEvent::new(
            "upstream_call",
            json!({"method": "status", "transport": "socket", "duration_ms": 12, "ok": true}),
        ));
        journal.log(CallEvent::new("cache_hit", json!({"method": "status"})));

        let lines = read_journal(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "upstream_call");
        assert_eq!(lines[0]["transport"], "socket");
        assert_eq!(lines[0]["duration_ms"], 12);
        assert_eq!(lines[1]["type"], "cache_hit");
        for line in &lines {
            let timestamp = line["timestamp"].as_str().unwrap();
            assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
        }
    }

    #[test]
    fn test_scalar_payload_kept_under_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls.jsonl");
        let journal = JsonlCallLogger::open(&path).unwrap();

        journal.log(CallEvent::new("coalesced", json!("status")));
        journal.log(CallEvent::new("coalesced", Value::Null));

        let lines = read_journal(&path);
        assert_eq!(lines[0]["data"], "status");
        assert!(lines[1].get("data").is_none());
    }

    #[test]
    fn test_reopening_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("calls.jsonl");

        for _ in 0..2 {
            let journal = JsonlCallLogger::open(&path).unwrap();
            journal.log(CallEvent::new(
                "batch_rejected",
                json!({"requested": 11, "max": 10}),
            ));
        }

        let lines = read_journal(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["requested"], 11);
    }

    #[test]
    fn test_open_fails_when_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        assert!(JsonlCallLogger::open(blocker.join("calls.jsonl")).is_err());
    }
}
