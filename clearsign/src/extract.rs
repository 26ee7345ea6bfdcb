//! Transaction call-tree extraction.
//!
//! Walks the whole decoded-transaction graph and records every
//! function-call-shaped node together with its nesting level. The
//! level increments only when the walk crosses a `valueDecoded`
//! boundary: that is a genuine inner transaction, while `components`
//! and array recursion are just structural decomposition of one call's
//! arguments.

use serde_json::{json, Value};
use tracing::trace;

use crate::transaction::{DecodedTransaction, MethodCall, Param, ParamShape};

/// One function call found in the transaction tree.
///
/// Derived fresh per render and never mutated. `data` is the raw call
/// node so path walks can address anything the decoder attached to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedCall {
    pub name: String,
    pub signature: String,
    pub level: usize,
    pub data: Value,
    pub params: Value,
}

/// Extract every call from the transaction, depth first.
///
/// Structurally identical calls at different tree positions are all
/// recorded; collapsing duplicates is the matcher's concern, not the
/// extractor's.
pub fn extract_calls(tx: &DecodedTransaction) -> Vec<ExtractedCall> {
    let mut calls = Vec::new();
    walk(&tx.envelope, 0, &mut calls);
    trace!(count = calls.len(), "extracted calls");
    calls
}

fn walk(node: &Value, level: usize, out: &mut Vec<ExtractedCall>) {
    match node {
        Value::Object(map) => {
            // A node carrying name + signature + params is a call
            // wherever it sits in the tree. Once a node parses as a
            // call, the typed walk owns everything beneath it.
            if let Some(call) = MethodCall::from_signed_node(node) {
                out.push(record(&call, level, node));
                walk_params(&call.params, level, out);
                return;
            }
            // The top-level convenience shape: a methodCall child that
            // needs only name + params, with the signature synthesized
            // from the parameter types.
            if let Some(mc_node) = map.get("methodCall") {
                if let Some(call) = MethodCall::from_method_call_node(mc_node) {
                    out.push(record(&call, level, mc_node));
                    walk_params(&call.params, level, out);
                }
            }
            for (key, child) in map {
                if key == "methodCall" {
                    continue;
                }
                let next_level = if key == "valueDecoded" { level + 1 } else { level };
                walk(child, next_level, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, level, out);
            }
        }
        _ => {}
    }
}

/// Typed descent through a call's parameters. Only a `valueDecoded`
/// crossing raises the level; tuple decomposition stays on it.
fn walk_params(params: &[Param], level: usize, out: &mut Vec<ExtractedCall>) {
    for param in params {
        match param.shape() {
            ParamShape::Scalar(_) => {}
            ParamShape::Tuple(components) => walk_params(components, level, out),
            ParamShape::Nested(call) => {
                // A valueDecoded payload is a call by construction,
                // signed or not; decoders that omit the signature get
                // one synthesized from the parameter types.
                let node = serde_json::to_value(call).unwrap_or(Value::Null);
                out.push(record(call, level + 1, &node));
                walk_params(&call.params, level + 1, out);
            }
        }
    }
}

fn record(call: &MethodCall, level: usize, node: &Value) -> ExtractedCall {
    ExtractedCall {
        name: call.name.clone(),
        signature: call.signature_or_synthesized(),
        level,
        data: node.clone(),
        params: node.get("params").cloned().unwrap_or_else(|| json!([])),
    }
}
