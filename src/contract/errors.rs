use ethers::contract::ContractError;
use ethers::providers::Middleware;
use std::fmt;

/// Outcome of a transaction that did not go through.
///
/// `Reverted` keeps the coarse signal every node gives us; `reason` is only
/// filled when the revert data decodes as an `Error(string)` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxError {
    Reverted {
        reason: Option<String>,
        data: Option<String>,
    },
    NoReceipt,
    Provider(String),
}

impl TxError {
    pub fn reverted(reason: impl Into<String>) -> Self {
        TxError::Reverted {
            reason: Some(reason.into()),
            data: None,
        }
    }

    pub fn is_revert(&self) -> bool {
        matches!(self, TxError::Reverted { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            TxError::Reverted { reason, .. } => reason.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for TxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxError::Reverted {
                reason: Some(reason),
                ..
            } => write!(f, "Transaction reverted: {}", reason),
            TxError::Reverted {
                reason: None,
                data: Some(data),
            } => write!(f, "Transaction reverted (data 0x{})", data),
            TxError::Reverted { .. } => write!(f, "Transaction reverted"),
            TxError::NoReceipt => write!(f, "Transaction dropped before a receipt was produced"),
            TxError::Provider(msg) => write!(f, "Provider error: {}", msg),
        }
    }
}

impl std::error::Error for TxError {}

impl<M: Middleware> From<ContractError<M>> for TxError {
    fn from(err: ContractError<M>) -> Self {
        if err.is_revert() {
            TxError::Reverted {
                reason: err.decode_revert::<String>(),
                data: err.as_revert().map(hex::encode),
            }
        } else {
            TxError::Provider(err.to_string())
        }
    }
}
