use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use crate::assessment::gateways::{CollaboratorError, SubmissionStore};
use crate::assessment::submission::SubmissionRecord;

/// Append-only document store keeping one JSON record per line.
#[derive(Debug)]
pub struct JsonlSubmissionStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unable to access submission store {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to encode submission record: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<StoreError> for CollaboratorError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Io { .. } => CollaboratorError::Unavailable(value.to_string()),
            StoreError::Encode(_) => CollaboratorError::InvalidResponse(value.to_string()),
        }
    }
}

impl JsonlSubmissionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn append_line(&self, record: &SubmissionRecord) -> Result<String, StoreError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().expect("store mutex poisoned");
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| self.io_error(err))?;
        file.write_all(line.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|err| self.io_error(err))?;

        Ok(format!(
            "{}-{}",
            record.submission_id,
            record.created_at.timestamp_micros()
        ))
    }

    fn read_all(&self) -> Result<Vec<SubmissionRecord>, StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(self.io_error(err)),
        };

        let mut records = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|err| self.io_error(err))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(record) => records.push(record),
                Err(err) => warn!(
                    path = %self.path.display(),
                    line = index + 1,
                    error = %err,
                    "skipping unreadable submission record"
                ),
            }
        }
        Ok(records)
    }
}

impl SubmissionStore for JsonlSubmissionStore {
    fn append(&self, record: &SubmissionRecord) -> Result<String, CollaboratorError> {
        Ok(self.append_line(record)?)
    }

    fn list(&self) -> Result<Vec<SubmissionRecord>, CollaboratorError> {
        Ok(self.read_all()?)
    }
}
