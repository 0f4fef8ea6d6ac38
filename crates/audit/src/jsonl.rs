//! JSONL audit trail - append-only writer
//!
//! One serialized record per line, flushed on every append so a crash
//! loses at most the record being written.

use crate::record::AuditRecord;
use crate::sink::{AuditError, AuditSink};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Append-only JSONL audit log
pub struct JsonlAuditLog {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl JsonlAuditLog {
    /// Open (or create) the audit trail at the given file path
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every record in the trail (diagnostics/tests)
    pub fn read_all(&self) -> Result<Vec<AuditRecord>, AuditError> {
        // Flush pending writes so the read sees everything
        self.writer.lock().unwrap().flush()?;
        let content = fs::read_to_string(&self.path)?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(AuditError::from))
            .collect()
    }
}

impl AuditSink for JsonlAuditLog {
    fn record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let json = serde_json::to_string(record)?;
        let mut writer = self.writer.lock().unwrap();
        writeln!(writer, "{}", json)?;
        writer.flush()?;
        Ok(())
    }
}

impl Drop for JsonlAuditLog {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
