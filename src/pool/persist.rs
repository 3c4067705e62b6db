//! JSON-lines persistence for the pool store.
//!
//! One serialized `CallRecord` per line, appended through as records arrive
//! and replayed on startup. Local file only; long-term durability beyond the
//! host is out of scope.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, LineWriter, Write};
use std::path::Path;

use crate::model::CallRecord;

/// Append-through writer for the pool's backing file.
///
/// `LineWriter` flushes on every newline, so a record is on its way to disk
/// before `append` returns; no fsync, matching the store's
/// survive-a-restart (not survive-a-power-cut) durability goal.
#[derive(Debug)]
pub struct LineAppender {
    writer: LineWriter<File>,
}

impl LineAppender {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: LineWriter::new(file),
        })
    }

    pub fn append(&mut self, record: &CallRecord) -> std::io::Result<()> {
        let line = serde_json::to_string(record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Rewrite the backing file to exactly `records`, then reopen an appender.
///
/// Used after eviction so evicted records do not resurrect on the next
/// replay. Survivors go to a temp file first; the rename makes the swap
/// all-or-nothing.
pub fn rewrite<'a>(
    path: &Path,
    records: impl Iterator<Item = &'a CallRecord>,
) -> std::io::Result<LineAppender> {
    let tmp = path.with_extension("tmp");
    {
        let file = File::create(&tmp)?;
        let mut writer = LineWriter::new(file);
        for record in records {
            let line = serde_json::to_string(record)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
    }
    std::fs::rename(&tmp, path)?;
    LineAppender::open(path)
}

/// Outcome of replaying a backing file.
#[derive(Debug, Default)]
pub struct ReplayOutcome {
    pub records: Vec<CallRecord>,
    /// Lines that did not deserialize, typically a torn tail after a crash.
    pub skipped_lines: usize,
}

/// Replay a backing file written by `LineAppender`.
///
/// Undeserializable lines are skipped and counted rather than failing the
/// whole replay; a crash mid-append leaves at most a torn final line.
pub fn replay(path: &Path) -> std::io::Result<ReplayOutcome> {
    let mut outcome = ReplayOutcome::default();
    if !path.exists() {
        return Ok(outcome);
    }

    let reader = BufReader::new(File::open(path)?);
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<CallRecord>(&line) {
            Ok(record) => outcome.records.push(record),
            Err(e) => {
                outcome.skipped_lines += 1;
                tracing::warn!(error = %e, "Skipping unreadable pool record during replay");
            }
        }
    }
    Ok(outcome)
}
