//! Syslog sinks.

use std::io;
use std::path::Path;

use chrono::{DateTime, Local};

use super::Severity;

/// Facility `user` (1), shifted into the priority value.
const FACILITY_USER: u8 = 1 << 3;

/// Destination for syslog messages.
pub trait SyslogWriter: Send + Sync {
    /// Writes one message at `severity`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the message could not be sent.
    fn write(&self, severity: Severity, message: &str) -> io::Result<()>;
}

/// Formats a local RFC 3164 message: `<PRI>TIMESTAMP TAG[PID]: MSG`.
///
/// The hostname is omitted, as is customary for the local socket.
#[must_use]
pub fn format_rfc3164(
    severity: Severity,
    timestamp: DateTime<Local>,
    tag: &str,
    pid: u32,
    message: &str,
) -> String {
    let priority = FACILITY_USER | severity.code();
    let message = message.trim_end_matches('\n');
    format!(
        "<{priority}>{} {tag}[{pid}]: {message}\n",
        timestamp.format("%b %e %H:%M:%S")
    )
}

/// Tag used when none is configured: the program name.
#[must_use]
pub fn default_tag() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .map(Path::new)
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}

#[cfg(unix)]
pub use unix::UnixSyslogWriter;

#[cfg(unix)]
mod unix {
    use std::io;
    use std::os::unix::net::UnixDatagram;
    use std::path::{Path, PathBuf};
    use std::sync::{Mutex, MutexGuard};

    use chrono::Local;
    use tracing::debug;

    use super::{format_rfc3164, Severity, SyslogWriter};

    /// Writes to the local syslog daemon over a datagram socket.
    ///
    /// A failed send reconnects to the same path once and retries, so a
    /// restarted daemon keeps receiving messages.
    #[derive(Debug)]
    pub struct UnixSyslogWriter {
        socket: Mutex<UnixDatagram>,
        path: PathBuf,
        tag: String,
        pid: u32,
    }

    fn dial(path: &Path) -> io::Result<UnixDatagram> {
        let socket = UnixDatagram::unbound()?;
        socket.connect(path)?;
        Ok(socket)
    }

    impl UnixSyslogWriter {
        /// Connects to the daemon listening on `path`.
        ///
        /// # Errors
        ///
        /// Returns the I/O error if the socket cannot be created or connected.
        pub fn connect(path: impl AsRef<Path>, tag: impl Into<String>) -> io::Result<Self> {
            let path = path.as_ref().to_path_buf();
            let socket = dial(&path)?;
            Ok(Self {
                socket: Mutex::new(socket),
                path,
                tag: tag.into(),
                pid: std::process::id(),
            })
        }

        /// Path of the daemon socket.
        #[must_use]
        pub fn path(&self) -> &Path {
            &self.path
        }

        /// Tag prefixed to each message.
        #[must_use]
        pub fn tag(&self) -> &str {
            &self.tag
        }

        fn socket(&self) -> io::Result<MutexGuard<'_, UnixDatagram>> {
            self.socket
                .lock()
                .map_err(|_| io::Error::new(io::ErrorKind::Other, "syslog socket lock poisoned"))
        }
    }

    impl SyslogWriter for UnixSyslogWriter {
        fn write(&self, severity: Severity, message: &str) -> io::Result<()> {
            let line = format_rfc3164(severity, Local::now(), &self.tag, self.pid, message);
            let mut socket = self.socket()?;
            if let Err(err) = socket.send(line.as_bytes()) {
                debug!(error = %err, path = %self.path.display(), "Reconnecting to syslog");
                *socket = dial(&self.path)?;
                socket.send(line.as_bytes())?;
            }
            Ok(())
        }
    }
}
