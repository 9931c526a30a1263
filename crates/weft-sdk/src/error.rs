//! Errors surfaced by the ledger SDK boundary.

/// Error returned by any SDK port operation.
///
/// `AlreadyInstalled` is split out from the generic peer error because the
/// chaincode installer treats it as benign.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SdkError {
    /// Certificate authority rejected or failed the request
    #[error("certificate authority error: {0}")]
    Ca(String),

    /// A peer returned an error or was unreachable
    #[error("peer {peer}: {message}")]
    Peer { peer: String, message: String },

    /// The ordering service rejected or failed the request
    #[error("orderer error: {0}")]
    Orderer(String),

    /// Chaincode at this id and version is already present on the peer
    #[error("chaincode {chaincode} v{version} already installed on peer {peer}")]
    AlreadyInstalled {
        peer: String,
        chaincode: String,
        version: String,
    },

    /// The named channel does not exist on the contacted node
    #[error("unknown channel {0}")]
    UnknownChannel(String),

    /// Commit event stream failure
    #[error("event stream error: {0}")]
    Stream(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_peer_name() {
        let err = SdkError::Peer {
            peer: "peer0".into(),
            message: "connection refused".into(),
        };
        let text = err.to_string();
        assert!(text.contains("peer0"));
        assert!(text.contains("connection refused"));
    }

    #[test]
    fn test_already_installed_is_distinguishable() {
        let err = SdkError::AlreadyInstalled {
            peer: "peer1".into(),
            chaincode: "accounts".into(),
            version: "1.0".into(),
        };
        assert!(matches!(err, SdkError::AlreadyInstalled { .. }));
    }
}
