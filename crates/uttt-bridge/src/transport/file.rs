use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::{debug, trace};

use uttt_core::config::FileConfig;
use uttt_core::error::LifecycleError;

use crate::codec;
use crate::error::BridgeError;
use crate::protocol::{Message, MessageKind};
use crate::transport::Transport;

/// Message exchange through well-known files in a shared directory.
///
/// The producer writes a whole encoded message into the file for its kind;
/// the consumer polls until the file is non-empty, reads it, and truncates
/// it to signal consumption. An empty or missing file means "nothing
/// pending". Nothing stops a second writer, so this relies on the engine
/// being the only producer on each file.
#[derive(Debug)]
pub struct FileTransport {
    dir: PathBuf,
    poll_interval: Duration,
    closed: bool,
}

impl FileTransport {
    /// Use the message files in `config.dir`.
    ///
    /// # Errors
    ///
    /// [`BridgeError::TransportUnavailable`] if the directory does not exist
    /// or is not a directory.
    pub fn open(config: &FileConfig) -> Result<Self, BridgeError> {
        let target = || format!("message directory {}", config.dir.display());
        let meta = fs::metadata(&config.dir).map_err(|e| BridgeError::unavailable(target(), e))?;
        if !meta.is_dir() {
            return Err(BridgeError::unavailable(
                target(),
                std::io::Error::new(ErrorKind::NotADirectory, "not a directory"),
            ));
        }
        debug!(dir = %config.dir.display(), "file transport opened");
        Ok(Self {
            dir: config.dir.clone(),
            poll_interval: config.poll_interval(),
            closed: false,
        })
    }

    /// Path of the file carrying `kind`.
    #[must_use]
    pub fn path(&self, kind: MessageKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    /// Whether a message of `kind` is waiting to be read.
    #[must_use]
    pub fn pending(&self, kind: MessageKind) -> bool {
        fs::metadata(self.path(kind)).is_ok_and(|m| m.len() > 0)
    }

    /// Read the file if it holds a message. `Ok(None)` when it is missing
    /// or empty.
    fn try_take(path: &Path, kind: MessageKind) -> Result<Option<Vec<u8>>, BridgeError> {
        let bytes = match fs::read(path) {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BridgeError::io(kind, e)),
        };
        OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|e| BridgeError::io(kind, e))?;
        Ok(Some(bytes))
    }
}

impl Transport for FileTransport {
    fn send(&mut self, msg: &Message) -> Result<(), BridgeError> {
        if self.closed {
            return Err(LifecycleError::Closed.into());
        }
        let kind = msg.kind();
        let bytes = codec::encode(msg);
        fs::write(self.path(kind), &bytes).map_err(|e| BridgeError::io(kind, e))?;
        debug!(channel = %kind, bytes = bytes.len(), "wrote message file");
        Ok(())
    }

    fn recv(&mut self, kind: MessageKind) -> Result<Message, BridgeError> {
        if self.closed {
            return Err(LifecycleError::Closed.into());
        }
        let path = self.path(kind);
        trace!(path = %path.display(), "polling");
        loop {
            if let Some(bytes) = Self::try_take(&path, kind)? {
                debug!(channel = %kind, bytes = bytes.len(), "read message file");
                return Ok(codec::decode(&bytes, kind)?);
            }
            thread::sleep(self.poll_interval);
        }
    }

    fn close(&mut self) -> Result<(), BridgeError> {
        // The files belong to the shared directory; only stop using them.
        self.closed = true;
        Ok(())
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "FileTransport"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
