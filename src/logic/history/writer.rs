//! JSONL persistence for scan reports, one file per size-bounded segment

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use chrono::Utc;
use parking_lot::Mutex;

use crate::error::Result;
use crate::logic::context::ScanReport;

const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10 MB
const FILE_PREFIX: &str = "scans-";
const FILE_EXT: &str = "jsonl";

pub struct HistoryWriter {
    file: Mutex<Option<File>>,
    base_dir: PathBuf,
    max_file_size: u64,
}

impl HistoryWriter {
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_max_size(base_dir, MAX_FILE_SIZE)
    }

    pub fn with_max_size(base_dir: impl Into<PathBuf>, max_file_size: u64) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)?;

        Ok(Self {
            file: Mutex::new(None),
            base_dir,
            max_file_size,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.base_dir
    }

    /// Append one report; rotates once the current segment is full
    pub fn append(&self, report: &ScanReport) -> Result<()> {
        let mut guard = self.file.lock();

        if guard.is_none() {
            *guard = Some(match self.latest_segment()? {
                Some(path) => OpenOptions::new().create(true).append(true).open(path)?,
                None => self.create_segment()?,
            });
        }

        let full = match guard.as_ref() {
            Some(f) => f.metadata()?.len() >= self.max_file_size,
            None => false,
        };
        if full {
            *guard = Some(self.create_segment()?);
        }

        if let Some(file) = guard.as_mut() {
            let json = serde_json::to_string(report)?;
            writeln!(file, "{}", json)?;
        }

        Ok(())
    }

    /// Read every persisted report, oldest first. Unparseable lines are skipped.
    pub fn load_all(&self) -> Result<Vec<ScanReport>> {
        let mut reports = Vec::new();

        for path in self.segments()? {
            let reader = BufReader::new(File::open(&path)?);
            for (i, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<ScanReport>(&line) {
                    Ok(r) => reports.push(r),
                    Err(e) => log::warn!("Skipping {}:{}: {}", path.display(), i + 1, e),
                }
            }
        }

        Ok(reports)
    }

    /// (segment count, total size in MB, newest segment name)
    pub fn get_stats(&self) -> Result<(usize, f32, String)> {
        let segments = self.segments()?;
        let mut size = 0u64;
        for path in &segments {
            size += fs::metadata(path)?.len();
        }

        let latest = segments
            .last()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or("None")
            .to_string();

        Ok((segments.len(), size as f32 / 1024.0 / 1024.0, latest))
    }

    fn create_segment(&self) -> Result<File> {
        let now = Utc::now();
        // Sub-second part keeps names unique and sortable under fast rotation
        let mut path = self.base_dir.join(format!(
            "{}{}.{}",
            FILE_PREFIX,
            now.format("%Y-%m-%d-%H%M%S%.6f"),
            FILE_EXT
        ));
        let mut n = 1;
        while path.exists() {
            path = self.base_dir.join(format!(
                "{}{}_{}.{}",
                FILE_PREFIX,
                now.format("%Y-%m-%d-%H%M%S%.6f"),
                n,
                FILE_EXT
            ));
            n += 1;
        }

        log::info!("Opened scan history segment {}", path.display());
        Ok(OpenOptions::new().create(true).append(true).open(path)?)
    }

    /// Segment files sorted by name (timestamp order)
    fn segments(&self) -> Result<Vec<PathBuf>> {
        let mut entries = fs::read_dir(&self.base_dir)?
            .filter_map(|res| res.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map_or(false, |ext| ext == FILE_EXT))
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map_or(false, |n| n.starts_with(FILE_PREFIX))
            })
            .collect::<Vec<_>>();

        entries.sort();
        Ok(entries)
    }

    fn latest_segment(&self) -> Result<Option<PathBuf>> {
        Ok(self.segments()?.pop())
    }
}
