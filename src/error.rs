use std::fmt::Display;

use alloy::{sol_types, transports};

/// Error returned by the ledger (RPC node) as a result of a read call.
#[derive(Clone, Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("fatal error: {0}")]
    Fatal(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unexpected empty RPC response")]
    NullResp,

    #[error("call reverted: {0}")]
    Reverted(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("log is missing its {0}")]
    MissingLogField(&'static str),
}

/// Malformed or incomplete interface descriptor.
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("descriptor is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("entry {0} has no name")]
    Unnamed(usize),

    #[error("parameter `{param}` of `{entry}` is a tuple without components")]
    MissingComponents { entry: String, param: String },

    #[error("event `{0}` is not present in the descriptor")]
    UnknownEvent(&'static str),
}

/// Deployment configuration conversion failure.
#[derive(Debug, thiserror::Error)]
pub enum DeployConfigError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("record {record}: invalid {field} `{value}`")]
    InvalidField {
        record: usize,
        field: &'static str,
        value: String,
    },

    #[error("record {record}: expected at least {expected} columns, got {actual}")]
    MissingColumns {
        record: usize,
        expected: usize,
        actual: usize,
    },
}

impl<E: Display> From<transports::RpcError<E>> for LedgerError {
    fn from(value: transports::RpcError<E>) -> Self {
        match value {
            transports::RpcError::ErrorResp(ref resp) => {
                let msg = resp.message.to_ascii_lowercase();
                if ((resp.code == -32600 || resp.code == -32601 || resp.code == -32602)
                    && (msg.contains("invalid") || msg.contains("not found")))
                    || (resp.code == -32603
                        && (msg.contains("block by number") || msg.contains("getting block")))
                {
                    Self::InvalidRequest(msg)
                } else if (resp.code == 3 || resp.code == -32000) && msg.contains("revert") {
                    Self::Reverted(msg)
                } else if resp.code == -32005 || msg.contains("range") || msg.contains("limit") {
                    // Providers reject oversized log queries with a variety of codes
                    Self::InvalidRequest(msg)
                } else {
                    Self::Transport(value.to_string())
                }
            }
            transports::RpcError::NullResp => Self::NullResp,
            _ => Self::Transport(value.to_string()),
        }
    }
}

impl From<sol_types::Error> for LedgerError {
    fn from(value: sol_types::Error) -> Self {
        Self::Fatal(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resp(code: i64, message: &str) -> transports::TransportError {
        let payload = format!(r#"{{"code":{code},"message":"{message}"}}"#);
        transports::RpcError::ErrorResp(serde_json::from_str(&payload).unwrap())
    }

    #[test]
    fn test_rpc_error_classification() {
        assert!(matches!(
            LedgerError::from(resp(-32602, "invalid block range")),
            LedgerError::InvalidRequest(_)
        ));
        assert!(matches!(
            LedgerError::from(resp(3, "execution reverted")),
            LedgerError::Reverted(_)
        ));
        assert!(matches!(
            LedgerError::from(resp(-32005, "query returned more than 10000 results")),
            LedgerError::InvalidRequest(_)
        ));
        assert!(matches!(
            LedgerError::from(resp(-32099, "upstream unavailable")),
            LedgerError::Transport(_)
        ));
        assert!(matches!(
            LedgerError::from(transports::TransportError::NullResp),
            LedgerError::NullResp
        ));
    }
}
