//! Interface descriptor loading.
//!
//! Turns JSON interface descriptors into event signatures and the topic
//! hashes the ledger indexes logs by.

use std::collections::BTreeMap;

use alloy::primitives::{B256, keccak256};
use serde::Deserialize;

use crate::{error::DescriptorError, types::EventKind};

/// Parameter of a descriptor entry.
#[derive(Clone, Debug, Deserialize)]
pub struct Param {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub indexed: bool,
    #[serde(default)]
    pub components: Option<Vec<Param>>,
}

/// Single function, event or error entry of a descriptor.
#[derive(Clone, Debug, Deserialize)]
pub struct Entry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub inputs: Vec<Param>,
    #[serde(default)]
    pub anonymous: bool,
}

/// Event signature derived from a descriptor entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventSignature {
    /// Signature with structs spelled out as `tuple(...)`.
    pub display: String,
    /// Signature in the form the ledger hashes, structs as bare `(...)`.
    pub canonical: String,
    /// keccak-256 of the canonical signature.
    pub topic: B256,
}

#[derive(Clone, Copy)]
enum Style {
    Display,
    Canonical,
}

/// Parses descriptor JSON into its entries.
///
/// Entries that do not match the expected shape are logged and skipped, only
/// a document that is not a JSON array is rejected.
pub fn parse_descriptor(json: &str) -> Result<Vec<Entry>, DescriptorError> {
    let raw: Vec<serde_json::Value> = serde_json::from_str(json)?;
    Ok(raw
        .into_iter()
        .enumerate()
        .filter_map(|(idx, value)| match serde_json::from_value::<Entry>(value) {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::error!(entry = idx, %err, "skipping malformed descriptor entry");
                None
            }
        })
        .collect())
}

/// Derives the signature of a single event entry.
pub fn event_signature(idx: usize, entry: &Entry) -> Result<(String, EventSignature), DescriptorError> {
    let name = entry
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
        .ok_or(DescriptorError::Unnamed(idx))?;
    let display = signature(name, &entry.inputs, Style::Display)?;
    let canonical = signature(name, &entry.inputs, Style::Canonical)?;
    let topic = keccak256(canonical.as_bytes());
    Ok((
        name.to_string(),
        EventSignature {
            display,
            canonical,
            topic,
        },
    ))
}

/// Maps every well-formed event of the descriptor to its signature.
///
/// Malformed event entries are logged and skipped so the remaining events
/// stay discoverable.
pub fn event_signatures(entries: &[Entry]) -> BTreeMap<String, EventSignature> {
    entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.kind == "event")
        .filter_map(|(idx, entry)| match event_signature(idx, entry) {
            Ok(sig) => Some(sig),
            Err(err) => {
                tracing::error!(entry = idx, %err, "skipping event entry");
                None
            }
        })
        .collect()
}

fn signature(name: &str, inputs: &[Param], style: Style) -> Result<String, DescriptorError> {
    let types = inputs
        .iter()
        .map(|p| render_type(name, p, style))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("{name}({})", types.join(",")))
}

fn render_type(entry: &str, param: &Param, style: Style) -> Result<String, DescriptorError> {
    let Some(suffix) = param.ty.strip_prefix("tuple") else {
        return Ok(param.ty.clone());
    };
    let components = param
        .components
        .as_deref()
        .ok_or_else(|| DescriptorError::MissingComponents {
            entry: entry.to_string(),
            param: param.name.clone(),
        })?;
    let inner = components
        .iter()
        .map(|c| render_type(entry, c, style))
        .collect::<Result<Vec<_>, _>>()?
        .join(",");
    Ok(match style {
        Style::Display => format!("tuple({inner}){suffix}"),
        Style::Canonical => format!("({inner}){suffix}"),
    })
}

/// Topics of the five order events the history tracker consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackedTopics {
    swap_exact_token_to_token: B256,
    swap_token_to_exact_token: B256,
    update_order: B256,
    withdraw_assets: B256,
    order_initialized: B256,
}

impl TrackedTopics {
    pub fn from_signatures(
        signatures: &BTreeMap<String, EventSignature>,
    ) -> Result<Self, DescriptorError> {
        let topic = |kind: EventKind| {
            signatures
                .get(kind.name())
                .map(|s| s.topic)
                .ok_or(DescriptorError::UnknownEvent(kind.name()))
        };
        Ok(Self {
            swap_exact_token_to_token: topic(EventKind::SwapExactTokenToToken)?,
            swap_token_to_exact_token: topic(EventKind::SwapTokenToExactToken)?,
            update_order: topic(EventKind::UpdateOrder)?,
            withdraw_assets: topic(EventKind::WithdrawAssets)?,
            order_initialized: topic(EventKind::OrderInitialized)?,
        })
    }

    /// Topics derived from the bundled order contract descriptor.
    pub fn order() -> Result<Self, DescriptorError> {
        let entries = parse_descriptor(crate::abi::ORDER_DESCRIPTOR)?;
        Self::from_signatures(&event_signatures(&entries))
    }

    pub fn topic(&self, kind: EventKind) -> B256 {
        match kind {
            EventKind::SwapExactTokenToToken => self.swap_exact_token_to_token,
            EventKind::SwapTokenToExactToken => self.swap_token_to_exact_token,
            EventKind::UpdateOrder => self.update_order,
            EventKind::WithdrawAssets => self.withdraw_assets,
            EventKind::OrderInitialized => self.order_initialized,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy::sol_types::SolEvent;

    use super::*;
    use crate::abi::order::TermMaxOrder;

    #[test]
    fn test_tuple_array_flattening() {
        let json = r#"[{
            "type": "event",
            "name": "EventName",
            "anonymous": false,
            "inputs": [{
                "name": "foos",
                "type": "tuple[]",
                "indexed": false,
                "components": [
                    {"name": "amount", "type": "uint256"},
                    {"name": "owner", "type": "address"}
                ]
            }]
        }]"#;
        let sigs = event_signatures(&parse_descriptor(json).unwrap());
        let sig = &sigs["EventName"];
        assert_eq!(sig.display, "EventName(tuple(uint256,address)[])");
        assert_eq!(sig.canonical, "EventName((uint256,address)[])");
        assert_eq!(sig.topic, keccak256("EventName((uint256,address)[])"));
    }

    #[test]
    fn test_nested_tuples() {
        let json = r#"[{
            "type": "event",
            "name": "Nested",
            "inputs": [
                {"name": "a", "type": "address", "indexed": true},
                {"name": "b", "type": "tuple", "components": [
                    {"name": "c", "type": "tuple[2]", "components": [
                        {"name": "d", "type": "int256"}
                    ]},
                    {"name": "e", "type": "bool"}
                ]}
            ]
        }]"#;
        let sigs = event_signatures(&parse_descriptor(json).unwrap());
        assert_eq!(
            sigs["Nested"].display,
            "Nested(address,tuple(tuple(int256)[2],bool))"
        );
        assert_eq!(sigs["Nested"].canonical, "Nested(address,((int256)[2],bool))");
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let json = r#"[
            {"type": "event", "name": "Broken", "inputs": [{"name": "x", "type": "tuple"}]},
            {"type": "event", "inputs": []},
            {"type": "event", "name": "Bad", "inputs": "nope"},
            {"type": "function", "name": "f", "inputs": []},
            {"type": "event", "name": "Ok", "inputs": [{"name": "v", "type": "uint8"}]}
        ]"#;
        let sigs = event_signatures(&parse_descriptor(json).unwrap());
        assert_eq!(sigs.len(), 1);
        assert_eq!(sigs["Ok"].display, "Ok(uint8)");
    }

    #[test]
    fn test_order_topics_match_bindings() {
        let entries = parse_descriptor(crate::abi::ORDER_DESCRIPTOR).unwrap();
        let sigs = event_signatures(&entries);
        let topics = TrackedTopics::from_signatures(&sigs).unwrap();

        assert_eq!(
            topics.topic(EventKind::SwapExactTokenToToken),
            TermMaxOrder::SwapExactTokenToToken::SIGNATURE_HASH
        );
        assert_eq!(
            topics.topic(EventKind::SwapTokenToExactToken),
            TermMaxOrder::SwapTokenToExactToken::SIGNATURE_HASH
        );
        assert_eq!(
            topics.topic(EventKind::UpdateOrder),
            TermMaxOrder::UpdateOrder::SIGNATURE_HASH
        );
        assert_eq!(
            topics.topic(EventKind::WithdrawAssets),
            TermMaxOrder::WithdrawAssets::SIGNATURE_HASH
        );
        assert_eq!(
            topics.topic(EventKind::OrderInitialized),
            TermMaxOrder::OrderInitialized::SIGNATURE_HASH
        );
        assert_eq!(
            sigs["UpdateOrder"].canonical,
            TermMaxOrder::UpdateOrder::SIGNATURE
        );
        assert!(sigs["UpdateOrder"].display.contains("tuple(tuple(uint256,uint256,int256)[]"));
    }

    #[test]
    fn test_unknown_tracked_event() {
        let sigs = event_signatures(&parse_descriptor(crate::abi::MARKET_DESCRIPTOR).unwrap());
        assert!(matches!(
            TrackedTopics::from_signatures(&sigs),
            Err(DescriptorError::UnknownEvent(_))
        ));
    }
}
