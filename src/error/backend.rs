use thiserror::Error;

use crate::args::Database;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP request failed: {source}")]
    Http {
        #[from]
        source: reqwest::Error,
    },
    #[error("{database} returned status {status}: {body}")]
    UnexpectedStatus {
        database: Database,
        status: u16,
        body: String,
    },
    #[error("Operation payload {payload} does not match the {database} backend")]
    PayloadMismatch {
        database: Database,
        payload: &'static str,
    },
    #[error("Unexpected {database} response shape: {detail}")]
    UnexpectedResponse { database: Database, detail: String },
    #[error("No endpoints to dial")]
    NoEndpoints,
    #[error("ZooKeeper connection to {addr} failed: {source}")]
    ZkConnection {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("ZooKeeper I/O error: {source}")]
    ZkIo {
        #[source]
        source: std::io::Error,
    },
    #[error("ZooKeeper error code {code} for {op}")]
    ZkCode { code: i32, op: &'static str },
    #[error("ZooKeeper handshake rejected by {addr}")]
    ZkHandshake { addr: String },
    #[cfg(test)]
    #[error("Injected failure")]
    Injected,
}
