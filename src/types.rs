use std::fmt;

/// Which of the child's output pipes an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Stdout => f.write_str("stdout"),
            StreamKind::Stderr => f.write_str("stderr"),
        }
    }
}

/// Abnormal condition reported by a stream watch instead of data.
///
/// - `Hangup`: the other end went away while we were reading.
/// - `InvalidDescriptor`: the pipe can no longer be read at all.
///
/// Both end the watch; neither is shown to the user on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFault {
    Hangup,
    InvalidDescriptor,
}

impl StreamFault {
    /// Map a read error from a pipe onto the fault it represents.
    pub fn from_io_error(err: &std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::BrokenPipe | ErrorKind::ConnectionReset | ErrorKind::UnexpectedEof => {
                StreamFault::Hangup
            }
            _ => StreamFault::InvalidDescriptor,
        }
    }
}

impl fmt::Display for StreamFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamFault::Hangup => f.write_str("hangup"),
            StreamFault::InvalidDescriptor => f.write_str("invalid descriptor"),
        }
    }
}
