use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// The underlying memory provider could not satisfy a request for
    /// `requested` bytes.
    pub fn memory_exhausted(requested: usize) -> Error {
        Error(ErrorKind::MemoryExhausted { requested }.into())
    }

    /// A payload of `payload_len` bytes would overflow the total allocation
    /// size computation.
    pub fn capacity_overflow(payload_len: usize) -> Error {
        Error(ErrorKind::CapacityOverflow { payload_len }.into())
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error(Box::new(kind))
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("memory exhausted: failed to obtain {requested} bytes")]
    MemoryExhausted { requested: usize },

    #[error("capacity overflow: a payload of {payload_len} bytes is not representable")]
    CapacityOverflow { payload_len: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_roundtrip() {
        let err = Error::memory_exhausted(4096);
        assert!(matches!(
            err.kind(),
            ErrorKind::MemoryExhausted { requested: 4096 }
        ));
        assert!(matches!(
            err.into_kind(),
            ErrorKind::MemoryExhausted { requested: 4096 }
        ));
    }

    #[test]
    fn test_error_display() {
        let err = Error::capacity_overflow(usize::MAX);
        let msg = err.to_string();
        assert!(msg.contains("capacity overflow"));
    }
}
