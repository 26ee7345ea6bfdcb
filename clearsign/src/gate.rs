//! Level-boundary gate.
//!
//! Decides whether a `#`-path walk may step through a `valueDecoded`
//! segment into a nested call. Fail-closed: expansion is permitted
//! only when some loaded metadata plausibly covers a nested operation,
//! or a target address exists whose metadata could be fetched for a
//! later render. Showing truncated hex beats showing a wrong
//! human-readable label.

use serde_json::Value;
use tracing::debug;

use crate::erc7730::MetadataEntry;
use crate::extract::extract_calls;
use crate::transaction::DecodedTransaction;

/// Depth cap for the target-address sweep. The call tree is not
/// expected to be cyclic, but the sweep is bounded anyway.
const MAX_ADDRESS_SCAN_DEPTH: usize = 20;

/// Whether nested `valueDecoded` payloads of this transaction may be
/// expanded with the currently loaded metadata.
///
/// Only names of calls at level 1 and below open the gate on the
/// metadata side: the root call's own name is always covered by the
/// format that matched it and says nothing about whether the inner
/// payload is understood.
pub fn can_expand(tx: &DecodedTransaction, entries: &[MetadataEntry]) -> bool {
    let nested_names: Vec<String> = extract_calls(tx)
        .into_iter()
        .filter(|call| call.level >= 1)
        .map(|call| call.name)
        .collect();

    let covered = nested_names.iter().any(|name| {
        entries.iter().any(|entry| {
            entry
                .document
                .display
                .formats
                .keys()
                .any(|key| key.contains(name.as_str()))
        })
    });
    if covered {
        return true;
    }

    let targets = collect_target_addresses(tx);
    if !targets.is_empty() {
        debug!(
            targets = targets.len(),
            "expansion permitted on fetchable target addresses"
        );
        return true;
    }

    debug!("expansion refused: no covering format and no target address");
    false
}

/// Candidate contract addresses: any `target` property, or any
/// parameter literally named `target`, anywhere in the tree.
/// Duplicates are collapsed case-insensitively, first spelling wins.
pub fn collect_target_addresses(tx: &DecodedTransaction) -> Vec<String> {
    let mut targets = Vec::new();
    collect_targets(&tx.envelope, 0, &mut targets);
    let mut seen = Vec::new();
    targets.retain(|addr| {
        let key = addr.to_ascii_lowercase();
        if seen.contains(&key) {
            false
        } else {
            seen.push(key);
            true
        }
    });
    targets
}

fn collect_targets(node: &Value, depth: usize, out: &mut Vec<String>) {
    if depth > MAX_ADDRESS_SCAN_DEPTH {
        return;
    }
    match node {
        Value::Object(map) => {
            if let Some(target) = map.get("target").and_then(Value::as_str) {
                out.push(target.to_string());
            }
            if map.get("name").and_then(Value::as_str) == Some("target") {
                if let Some(value) = map.get("value").and_then(Value::as_str) {
                    out.push(value.to_string());
                }
            }
            for child in map.values() {
                collect_targets(child, depth + 1, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_targets(item, depth + 1, out);
            }
        }
        _ => {}
    }
}
