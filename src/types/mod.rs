mod event;
mod info;

use std::fmt;

pub use event::*;
pub use info::*;
use serde::Serialize;

/// Kind of ledger event consumed by the history tracker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum EventKind {
    SwapExactTokenToToken,
    SwapTokenToExactToken,
    UpdateOrder,
    WithdrawAssets,
    OrderInitialized,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::SwapExactTokenToToken,
        EventKind::SwapTokenToExactToken,
        EventKind::UpdateOrder,
        EventKind::WithdrawAssets,
        EventKind::OrderInitialized,
    ];

    /// Event name as declared in the order contract interface.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::SwapExactTokenToToken => "SwapExactTokenToToken",
            EventKind::SwapTokenToExactToken => "SwapTokenToExactToken",
            EventKind::UpdateOrder => "UpdateOrder",
            EventKind::WithdrawAssets => "WithdrawAssets",
            EventKind::OrderInitialized => "OrderInitialized",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Coarse classification of an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum OperationType {
    Swap,
    Deposit,
    Withdraw,
    UpdateCurve,
    Create,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperationType::Swap => "Swap",
            OperationType::Deposit => "Deposit",
            OperationType::Withdraw => "Withdraw",
            OperationType::UpdateCurve => "UpdateCurve",
            OperationType::Create => "Create",
        })
    }
}

/// Economic direction of a swap from the taker's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Lend,
    Borrow,
    Other,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Lend => "LEND",
            Direction::Borrow => "BORROW",
            Direction::Other => "OTHER",
        })
    }
}

/// Position of a log in the ledger, unique per event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LogPosition {
    block_number: u64,
    log_index: u64,
}

impl LogPosition {
    pub fn new(block_number: u64, log_index: u64) -> Self {
        Self {
            block_number,
            log_index,
        }
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    pub fn log_index(&self) -> u64 {
        self.log_index
    }

    /// Zero-padded composite key, sorts lexicographically like the position.
    pub fn sort_key(&self) -> String {
        format!("{:012}-{:06}", self.block_number, self.log_index)
    }
}

/// Best-effort value along with the reason it may be incomplete.
#[must_use]
#[derive(Clone, Debug, Serialize)]
pub struct Partial<T> {
    #[serde(flatten)]
    pub value: T,
    #[serde(rename = "error", skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl<T> Partial<T> {
    pub fn complete(value: T) -> Self {
        Self {
            value,
            diagnostic: None,
        }
    }

    pub fn degraded(value: T, diagnostic: impl fmt::Display) -> Self {
        Self {
            value,
            diagnostic: Some(diagnostic.to_string()),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.diagnostic.is_none()
    }

    pub fn into_parts(self) -> (T, Option<String>) {
        (self.value, self.diagnostic)
    }
}

/// Serializes any [`fmt::Display`] value, big integers in particular, as a string.
pub(crate) fn display_string<T: fmt::Display, S: serde::Serializer>(
    value: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_order() {
        let mut positions = vec![
            LogPosition::new(10, 2),
            LogPosition::new(12, 0),
            LogPosition::new(10, 0),
        ];
        positions.sort();
        assert_eq!(
            positions,
            vec![
                LogPosition::new(10, 0),
                LogPosition::new(10, 2),
                LogPosition::new(12, 0)
            ]
        );
        assert!(LogPosition::new(9, 5).sort_key() < LogPosition::new(10, 0).sort_key());
        assert!(LogPosition::new(10, 2).sort_key() < LogPosition::new(10, 11).sort_key());
    }

    #[test]
    fn test_partial_serialization() {
        #[derive(Serialize)]
        struct Info {
            name: &'static str,
        }
        let ok = serde_json::to_value(Partial::complete(Info { name: "a" })).unwrap();
        assert_eq!(ok, serde_json::json!({"name": "a"}));
        let degraded =
            serde_json::to_value(Partial::degraded(Info { name: "b" }, "boom")).unwrap();
        assert_eq!(degraded, serde_json::json!({"name": "b", "error": "boom"}));
    }
}
