use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("Connection error to {addr}: {source}")]
    Connection {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Transfer to {addr} timed out after {timeout_ms}ms")]
    TransferTimeout { addr: String, timeout_ms: u64 },
    #[error("Agent {addr} rejected {operation}: {message}")]
    TransferRejected {
        addr: String,
        operation: String,
        message: String,
    },
    #[error("Wire message exceeded max size ({max_bytes} bytes)")]
    WireMessageTooLarge { max_bytes: usize },
    #[error("Wire message was not valid UTF-8: {source}")]
    WireMessageInvalidUtf8 {
        #[source]
        source: std::str::Utf8Error,
    },
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("I/O error during {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("Serialization error during {context}: {source}")]
    Serialize {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Deserialization error during {context}: {source}")]
    Deserialize {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unexpected message from agent {addr}")]
    UnexpectedMessage { addr: String },
    #[error("Priming write for key {key:?} failed after {attempts} attempts")]
    PrimingExhausted { key: String, attempts: usize },
    #[error("Histogram error: {message}")]
    Histogram { message: String },
}
