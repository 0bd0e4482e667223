//! Transport error types.

use thiserror::Error;

use crate::error::ProtocolError;

/// Errors that can occur when reading from a transport.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportReadError {
    /// An I/O error occurred.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A framing or validation error occurred.
    #[error("transport protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl From<TransportReadError> for ProtocolError {
    fn from(err: TransportReadError) -> Self {
        match err {
            TransportReadError::Io(e) => Self::Io(e),
            TransportReadError::Protocol(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io_err =
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let transport_err: TransportReadError = io_err.into();
        assert!(matches!(transport_err, TransportReadError::Io(_)));
        assert_eq!(
            transport_err.to_string(),
            "transport I/O error: connection refused"
        );
    }

    #[test]
    fn test_protocol_error_conversion() {
        let transport_err: TransportReadError = ProtocolError::MessageTooLong {
            actual: 1024,
            limit: 512,
        }
        .into();
        assert!(transport_err.to_string().contains("message too long"));

        let back: ProtocolError = transport_err.into();
        assert!(matches!(back, ProtocolError::MessageTooLong { .. }));
    }
}
