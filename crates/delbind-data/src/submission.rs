//! Append-only CSV submission output.
//!
//! The file carries a header followed by `(id, probability)` rows. Rows are
//! flushed chunk by chunk so an interrupted run leaves at most one torn
//! trailing line, and a later run can resume by skipping the ids already on
//! disk rather than by counting rows.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;

fn ends_with_newline(path: &Path) -> Result<bool> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

pub struct SubmissionWriter {
    writer: csv::Writer<File>,
    path: PathBuf,
    rows_written: usize,
}

impl SubmissionWriter {
    /// Opens `path` for appending, creating it first when absent. The header
    /// is written only when the file is new or empty, so re-running against
    /// an existing submission never duplicates it.
    pub fn create_or_append(path: &Path, id_header: &str, outcome_header: &str) -> Result<Self> {
        let existing_bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        if existing_bytes > 0 && !ends_with_newline(path)? {
            // A torn trailing line from an interrupted run. Terminate it so
            // the next record starts on its own line instead of merging into
            // the fragment.
            file.write_all(b"\n")?;
            warn!(
                path = %path.display(),
                "terminating torn trailing line before appending"
            );
        }
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if existing_bytes == 0 {
            writer.write_record([id_header, outcome_header])?;
            writer.flush()?;
        }
        Ok(Self {
            writer,
            path: path.to_path_buf(),
            rows_written: 0,
        })
    }

    /// Appends one scored chunk and flushes it to disk.
    pub fn append_chunk(&mut self, rows: &[(i64, f32)]) -> Result<()> {
        for (id, probability) in rows {
            self.writer
                .write_record([id.to_string(), probability.to_string()])?;
        }
        self.writer.flush()?;
        self.rows_written += rows.len();
        debug!(
            path = %self.path.display(),
            rows = rows.len(),
            total = self.rows_written,
            "submission chunk flushed"
        );
        Ok(())
    }

    /// Rows appended by this writer, excluding anything already on disk.
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }
}

/// Collects the ids already present in a submission file.
///
/// Lines that do not hold a parseable id and a second field are counted and
/// skipped; an interrupted writer leaves at most one such line. A line torn
/// inside the probability field still counts as written, so its id is not
/// re-scored on resume.
pub fn existing_ids(path: &Path) -> Result<HashSet<i64>> {
    let mut ids = HashSet::new();
    if !path.exists() {
        return Ok(ids);
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let mut malformed = 0usize;
    for record in reader.records() {
        let Ok(record) = record else {
            malformed += 1;
            continue;
        };
        match (record.get(0).map(str::parse::<i64>), record.get(1)) {
            (Some(Ok(id)), Some(_)) => {
                ids.insert(id);
            }
            _ => malformed += 1,
        }
    }
    if malformed > 0 {
        warn!(
            path = %path.display(),
            lines = malformed,
            "ignoring malformed submission lines"
        );
    }
    Ok(ids)
}

// ── Tests ────────────────────────────────────────────────────────────────────
