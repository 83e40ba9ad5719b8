// jsonl.rs — Append-only JSONL audit sink with hash chaining.
//
// One JSON object per line. Each event's `previous_hash` links it to the
// prior line, so inserting, deleting, or editing any line breaks the chain
// and is detectable with `verify_chain`. Used for local operator
// deployments; production tenants append through the repository instead.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AuditError;
use crate::event::AuditEvent;
use crate::hasher;
use crate::sink::AuditSink;

struct ChainedWriter {
    writer: BufWriter<File>,
    /// Hash of the last line written, used to link the next event.
    last_hash: Option<String>,
}

/// A file-backed [`AuditSink`] storing one event per line.
pub struct JsonlAuditSink {
    inner: Mutex<ChainedWriter>,
    path: PathBuf,
}

impl JsonlAuditSink {
    /// Open (or create) a log at the given path.
    ///
    /// If the file already exists, the last line is re-hashed so new
    /// events continue the existing chain.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();

        let last_hash = if path.exists() {
            Self::read_last_hash(&path)?
        } else {
            None
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| AuditError::OpenFailed {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            inner: Mutex::new(ChainedWriter {
                writer: BufWriter::new(file),
                last_hash,
            }),
            path,
        })
    }

    /// Read all events from a log file, oldest first.
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<AuditEvent>, AuditError> {
        let file = File::open(path.as_ref()).map_err(|source| AuditError::OpenFailed {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);
        let mut events = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            events.push(serde_json::from_str(&line)?);
        }

        Ok(events)
    }

    /// Verify a log file's hash chain.
    ///
    /// Hashes the raw JSON lines rather than re-serialized events, since
    /// re-serialization could reorder fields.
    pub fn verify_chain(path: impl AsRef<Path>) -> Result<bool, AuditError> {
        let file = File::open(path.as_ref()).map_err(|source| AuditError::OpenFailed {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);
        let mut previous_hash: Option<String> = None;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let event: AuditEvent = serde_json::from_str(&line)?;
            if event.previous_hash != previous_hash {
                return Err(AuditError::IntegrityViolation {
                    line: line_num + 1,
                    expected: previous_hash.unwrap_or_else(|| "None".to_string()),
                    actual: event.previous_hash.unwrap_or_else(|| "None".to_string()),
                });
            }

            previous_hash = Some(hasher::hash_str(&line));
        }

        Ok(true)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_last_hash(path: &Path) -> Result<Option<String>, AuditError> {
        let file = File::open(path).map_err(|source| AuditError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);
        let mut last_line: Option<String> = None;

        for line in reader.lines() {
            let line = line?;
            if !line.trim().is_empty() {
                last_line = Some(line);
            }
        }

        Ok(last_line.map(|line| hasher::hash_str(&line)))
    }

    fn append_sync(&self, mut event: AuditEvent) -> Result<(), AuditError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| AuditError::SinkFailed("audit writer poisoned".to_string()))?;

        event.previous_hash = inner.last_hash.clone();
        let json = serde_json::to_string(&event)?;
        inner.last_hash = Some(hasher::hash_str(&json));

        writeln!(inner.writer, "{}", json)?;
        inner.writer.flush()?;
        Ok(())
    }
}

#[async_trait]
impl AuditSink for JsonlAuditSink {
    async fn append(&self, event: AuditEvent) -> Result<(), AuditError> {
        self.append_sync(event)
    }
}
