//! Bulk reader for headerless NSL-KDD files (KDDTrain+.txt / KDDTest+.txt)

use std::fs::File;
use std::io::Read;
use std::path::Path;
use csv::{ReaderBuilder, StringRecord};

use super::record::{RawRecord, RejectedRecord};
use crate::error::{NidsError, Result};

/// Parsed rows plus the rows that were rejected, both in file order
#[derive(Debug, Default)]
pub struct BulkRead {
    pub records: Vec<RawRecord>,
    pub rejected: Vec<RejectedRecord>,
}

impl BulkRead {
    pub fn total_lines(&self) -> usize {
        self.records.len() + self.rejected.len()
    }
}

/// Read a bulk file. A missing file is an error; bad rows are not.
pub fn read_path(path: &Path) -> Result<BulkRead> {
    if !path.is_file() {
        return Err(NidsError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Bulk file not found: {}", path.display()),
        )));
    }

    log::info!("Reading bulk records from {}", path.display());
    let file = File::open(path)?;
    Ok(read_from(file))
}

pub fn read_from<R: Read>(input: R) -> BulkRead {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);

    let mut out = BulkRead::default();
    let mut row = StringRecord::new();
    let mut line = 0u64;

    loop {
        line += 1;
        match reader.read_record(&mut row) {
            Ok(false) => break,
            Ok(true) => {
                // Blank lines are skipped by the csv reader; trust its count
                if let Some(pos) = row.position() {
                    line = pos.line();
                }
                match RawRecord::parse(line, &row) {
                    Ok(record) => out.records.push(record),
                    Err(e) => reject(&mut out, line, e),
                }
            }
            Err(e) => {
                if let Some(pos) = e.position() {
                    line = pos.line();
                }
                // Invalid UTF-8 and friends only cost the one row
                let fatal = matches!(e.kind(), csv::ErrorKind::Io(_));
                reject(&mut out, line, NidsError::Csv(e));
                if fatal {
                    break;
                }
            }
        }
    }

    if !out.rejected.is_empty() {
        log::warn!(
            "Bulk read: {} rows accepted, {} rejected",
            out.records.len(),
            out.rejected.len()
        );
    }

    out
}

fn reject(out: &mut BulkRead, line: u64, err: NidsError) {
    let reason = match err {
        NidsError::MalformedRecord { reason, .. } => reason,
        other => other.to_string(),
    };
    log::warn!("Rejected bulk record at line {}: {}", line, reason);
    out.rejected.push(RejectedRecord { line, reason });
}
