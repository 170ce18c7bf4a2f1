use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Failures of the external data source feeding the producer loop.
///
/// All of these end the producer; none of them touch connected clients.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to open source {address}: {source}")]
    Open {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("source read error: {0}")]
    Io(#[from] std::io::Error),

    #[error("source closed")]
    Closed,
}

/// Result of handing a frame to one client's send path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("client connection closed")]
    Closed,

    #[error("client send queue overflowed")]
    Overflow,
}

#[derive(Debug, thiserror::Error)]
pub enum HsiError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("websocket error: {0}")]
    WebSocket(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ParseError("unexpected token".into());
        assert_eq!(err.to_string(), "config parse error: unexpected token");

        let err = ConfigError::ValidationError("server.port = 0 is out of range".into());
        assert_eq!(
            err.to_string(),
            "config validation error: server.port = 0 is out of range"
        );
    }

    #[test]
    fn source_error_display() {
        let err = SourceError::Open {
            address: "/dev/ttyUSB0".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such device"),
        };
        assert_eq!(
            err.to_string(),
            "failed to open source /dev/ttyUSB0: no such device"
        );

        assert_eq!(SourceError::Closed.to_string(), "source closed");
    }

    #[test]
    fn delivery_error_display() {
        assert_eq!(DeliveryError::Closed.to_string(), "client connection closed");
        assert_eq!(
            DeliveryError::Overflow.to_string(),
            "client send queue overflowed"
        );
    }

    #[test]
    fn hsi_error_from_config() {
        let config_err = ConfigError::ParseError("bad toml".into());
        let err: HsiError = config_err.into();
        assert!(matches!(err, HsiError::Config(_)));
        assert!(err.to_string().contains("bad toml"));
    }

    #[test]
    fn hsi_error_from_source() {
        let err: HsiError = SourceError::Closed.into();
        assert!(matches!(err, HsiError::Source(SourceError::Closed)));
    }

    #[test]
    fn hsi_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        let err: HsiError = io_err.into();
        assert!(matches!(err, HsiError::Io(_)));
        assert!(err.to_string().contains("port taken"));
    }

    #[test]
    fn websocket_error_display() {
        let err = HsiError::WebSocket("handshake rejected".into());
        assert_eq!(err.to_string(), "websocket error: handshake rejected");
    }
}
