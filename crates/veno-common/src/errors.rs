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

#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    #[error("websocket connect failed: {0}")]
    Connect(String),

    #[error("channel join rejected: {0}")]
    JoinRejected(String),

    #[error("connection closed")]
    Closed,

    #[error("protocol error: {0}")]
    Protocol(String),
}

#[derive(Debug, thiserror::Error)]
pub enum VenoError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Realtime(#[from] RealtimeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("api error: {0}")]
    Api(String),

    #[error("billing error: {0}")]
    Billing(String),

    #[error("test session error: {0}")]
    Session(String),

    #[error("{0}")]
    Other(String),
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

        let err = ConfigError::ValidationError("heartbeat out of range".into());
        assert_eq!(
            err.to_string(),
            "config validation error: heartbeat out of range"
        );
    }

    #[test]
    fn realtime_error_display() {
        let err = RealtimeError::Connect("dns failure".into());
        assert_eq!(err.to_string(), "websocket connect failed: dns failure");

        let err = RealtimeError::JoinRejected("unauthorized".into());
        assert_eq!(err.to_string(), "channel join rejected: unauthorized");

        let err = RealtimeError::Closed;
        assert_eq!(err.to_string(), "connection closed");

        let err = RealtimeError::Protocol("bad envelope".into());
        assert_eq!(err.to_string(), "protocol error: bad envelope");
    }

    #[test]
    fn veno_error_from_config() {
        let config_err = ConfigError::ParseError("bad toml".into());
        let veno_err: VenoError = config_err.into();
        assert!(matches!(veno_err, VenoError::Config(_)));
        assert!(veno_err.to_string().contains("bad toml"));
    }

    #[test]
    fn veno_error_from_realtime() {
        let rt_err = RealtimeError::Closed;
        let veno_err: VenoError = rt_err.into();
        assert!(matches!(veno_err, VenoError::Realtime(_)));
        assert_eq!(veno_err.to_string(), "connection closed");
    }

    #[test]
    fn veno_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let veno_err: VenoError = io_err.into();
        assert!(matches!(veno_err, VenoError::Io(_)));
        assert!(veno_err.to_string().contains("file missing"));
    }

    #[test]
    fn veno_error_string_variants() {
        let err = VenoError::Api("timeout".into());
        assert_eq!(err.to_string(), "api error: timeout");

        let err = VenoError::Billing("provider declined".into());
        assert_eq!(err.to_string(), "billing error: provider declined");

        let err = VenoError::Session("already submitted".into());
        assert_eq!(err.to_string(), "test session error: already submitted");

        let err = VenoError::Other("something went wrong".into());
        assert_eq!(err.to_string(), "something went wrong");
    }
}
