//! Path expression resolver.
//!
//! Resolves the `#.` / `$.` / `@.`-rooted mini-language used by
//! ERC-7730 field paths against decoded call data, metadata constants,
//! or the transaction envelope. Segment addressing follows a fixed
//! precedence: slice and index syntax beat name-based lookup, which
//! beats plain property access. Path segments are ambiguous strings
//! and every metadata author must get the same disambiguation, so the
//! order must not be changed.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::ClearSignError;

/// Path that renders a blank row. Never walked.
pub const SEPARATOR: &str = "separator";

/// The three data roots a path can select with its first character.
#[derive(Debug, Clone, Copy)]
pub struct PathRoots<'a> {
    /// `#` — the matched call's decoded parameters.
    pub data: &'a Value,
    /// `$` — the metadata document's constants view.
    pub constants: &'a Value,
    /// `@` — the transaction envelope. Always anchored at the
    /// transaction root, never at the enclosing call's level.
    pub envelope: &'a Value,
}

/// Whether a walk may step through a `valueDecoded` boundary.
///
/// Decided once per render by the level-boundary gate and applied to
/// every `#`-rooted walk. `$` and `@` walks ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandPolicy {
    Allow,
    Deny,
}

/// Outcome of a path walk.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Walk reached a terminal value.
    Value(Value),
    /// Walk stopped at a `valueDecoded` boundary the gate refused to
    /// cross. Carries the still-encoded value at the stopping point,
    /// to be formatted as raw hex rather than dropped.
    Halted(Value),
    /// Some segment matched nothing.
    Unresolved,
}

// ASCII classes only: the regex build has no unicode tables.
static SLICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+)\[(-?[0-9]*):(-?[0-9]*)\]$").expect("slice pattern"));
static INDEX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+)\[([0-9]+)\]$").expect("index pattern"));

/// Resolve `path` against the given roots.
///
/// `"separator"` resolves to the empty string without touching any
/// root. An unrecognized root character is an irrecoverable error for
/// the field (not the render); callers catch it at the field boundary.
pub fn resolve_path(
    roots: &PathRoots<'_>,
    path: &str,
    policy: ExpandPolicy,
) -> Result<Resolution, ClearSignError> {
    if path == SEPARATOR {
        return Ok(Resolution::Value(Value::String(String::new())));
    }

    let mut chars = path.chars();
    let root_char = chars
        .next()
        .ok_or(ClearSignError::UnsupportedRootNode('\0'))?;
    let (root, policy) = match root_char {
        '#' => (roots.data, policy),
        // Constants and envelope walks never cross a call boundary,
        // the gate does not apply to them.
        '$' => (roots.constants, ExpandPolicy::Allow),
        '@' => (roots.envelope, ExpandPolicy::Allow),
        other => return Err(ClearSignError::UnsupportedRootNode(other)),
    };

    let remainder = path[root_char.len_utf8()..].strip_prefix('.').unwrap_or("");
    if remainder.is_empty() {
        return Ok(Resolution::Value(unwrap_terminal(root)));
    }

    let mut current = root.clone();
    for segment in remainder.split('.') {
        match step(&current, segment, policy) {
            Step::Into(next) => current = next,
            Step::Halt(stopped) => return Ok(Resolution::Halted(stopped)),
            Step::Miss => {
                debug!(path, segment, "path segment matched nothing");
                return Ok(Resolution::Unresolved);
            }
        }
    }
    Ok(Resolution::Value(unwrap_terminal(&current)))
}

enum Step {
    Into(Value),
    Halt(Value),
    Miss,
}

/// Advance one segment. Precedence order is load-bearing; see module
/// docs.
fn step(current: &Value, segment: &str, policy: ExpandPolicy) -> Step {
    // 1. Slice: name[start:end], either bound optional, negatives
    // count from the end.
    if let Some(caps) = SLICE_RE.captures(segment) {
        let Some(target) = lookup_member(current, &caps[1]) else {
            return Step::Miss;
        };
        let start = parse_bound(&caps[2]);
        let end = parse_bound(&caps[3]);
        return match slice_value(&target, start, end) {
            Some(sliced) => Step::Into(sliced),
            None => Step::Miss,
        };
    }

    // 2. Index: name[N]. "params[N]" reaches through a methodCall
    // wrapper and unwraps the indexed parameter's value.
    if let Some(caps) = INDEX_RE.captures(segment) {
        let name = &caps[1];
        let idx: usize = match caps[2].parse() {
            Ok(i) => i,
            Err(_) => return Step::Miss,
        };
        let target = if name == "params" {
            params_array(current)
        } else {
            lookup_member(current, name)
        };
        let Some(Value::Array(items)) = target else {
            return Step::Miss;
        };
        return match items.get(idx) {
            Some(item) => Step::Into(unwrap_param(item)),
            None => Step::Miss,
        };
    }

    // 3. Full-array marker: the "[]" left over from "name.[]" keeps
    // the whole array unchanged.
    if segment == "[]" {
        return match current {
            Value::Array(_) => Step::Into(current.clone()),
            _ => Step::Miss,
        };
    }

    // 4. Bare params advances into the call's parameter array.
    if segment == "params" {
        if let Some(params) = params_array(current) {
            return Step::Into(params);
        }
    }

    // 5. Tuple component by name.
    if let Some(Value::Array(components)) = current.get("components") {
        if let Some(hit) = find_named(components, segment) {
            return Step::Into(unwrap_param(hit));
        }
    }

    // 6. valueDecoded crosses into a nested call's parameters. This
    // is the only segment the gate applies to.
    if segment == "valueDecoded" {
        if let Some(decoded) = current.get("valueDecoded") {
            if policy == ExpandPolicy::Deny {
                let stopped = current.get("value").cloned().unwrap_or_else(|| current.clone());
                return Step::Halt(stopped);
            }
            return match decoded.get("params") {
                Some(params) => Step::Into(params.clone()),
                None => Step::Into(decoded.clone()),
            };
        }
        return Step::Miss;
    }

    // 7. Named parameter inside an already-present valueDecoded.
    if let Some(Value::Array(params)) = current.get("valueDecoded").and_then(|d| d.get("params")) {
        if let Some(hit) = find_named(params, segment) {
            return Step::Into(unwrap_param(hit));
        }
    }

    // 8. Named parameter in the current parameter list. This is what
    // makes "#.to" work when the data root is the params array itself.
    if let Some(Value::Array(params)) = params_array(current) {
        if let Some(hit) = find_named(&params, segment) {
            return Step::Into(unwrap_param(hit));
        }
    }
    if let Value::Array(items) = current {
        if let Some(hit) = find_named(items, segment) {
            return Step::Into(unwrap_param(hit));
        }
    }

    // 9. Plain property access.
    if let Some(v) = current.get(segment) {
        return Step::Into(v.clone());
    }

    // 10. Value-wrapper fallback: descend through a {value: {...}}
    // envelope when the inner object exposes the segment.
    if let Some(inner) = current.get("value") {
        if inner.is_object() {
            if let Some(v) = inner.get(segment) {
                return Step::Into(v.clone());
            }
        }
    }

    Step::Miss
}

/// General member lookup backing slice and index segments: plain
/// property first, then parameter-by-name in an array or params-shaped
/// context.
fn lookup_member(current: &Value, name: &str) -> Option<Value> {
    if let Some(v) = current.get(name) {
        return Some(v.clone());
    }
    if let Value::Array(items) = current {
        if let Some(hit) = find_named(items, name) {
            return Some(unwrap_param(hit));
        }
    }
    if let Some(Value::Array(params)) = params_array(current) {
        if let Some(hit) = find_named(&params, name) {
            return Some(unwrap_param(hit));
        }
    }
    if let Some(inner) = current.get("value") {
        if inner.is_object() {
            return inner.get(name).cloned();
        }
    }
    None
}

/// The parameter array of a methodCall-shaped context, reaching
/// through a `methodCall` wrapper when present.
fn params_array(current: &Value) -> Option<Value> {
    if let Some(params) = current.get("methodCall").and_then(|mc| mc.get("params")) {
        if params.is_array() {
            return Some(params.clone());
        }
    }
    match current.get("params") {
        Some(params) if params.is_array() => Some(params.clone()),
        _ => None,
    }
}

/// Find an element whose `name` equals `name` in a parameter or
/// component list.
fn find_named<'a>(items: &'a [Value], name: &str) -> Option<&'a Value> {
    items
        .iter()
        .find(|item| item.get("name").and_then(Value::as_str) == Some(name))
}

/// Unwrap a parameter to its scalar value, but keep the wrapper when
/// the parameter still carries structure (`components` or
/// `valueDecoded`) that later segments may need to address.
fn unwrap_param(param: &Value) -> Value {
    if param.get("components").is_some() || param.get("valueDecoded").is_some() {
        return param.clone();
    }
    match param.get("value") {
        Some(v) if !v.is_null() => v.clone(),
        _ => param.clone(),
    }
}

/// Terminal unwrap: a walk ending on a `{value: X, ...}` wrapper
/// yields X.
fn unwrap_terminal(v: &Value) -> Value {
    if v.is_object() {
        if let Some(inner) = v.get("value") {
            return inner.clone();
        }
    }
    v.clone()
}

fn parse_bound(text: &str) -> Option<i64> {
    if text.is_empty() {
        None
    } else {
        text.parse().ok()
    }
}

/// Python-style slicing over arrays and strings. Out-of-range bounds
/// clamp instead of failing.
fn slice_value(target: &Value, start: Option<i64>, end: Option<i64>) -> Option<Value> {
    match target {
        Value::Array(items) => {
            let (lo, hi) = clamp_bounds(items.len(), start, end);
            Some(Value::Array(items[lo..hi].to_vec()))
        }
        Value::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            let (lo, hi) = clamp_bounds(chars.len(), start, end);
            Some(Value::String(chars[lo..hi].iter().collect()))
        }
        _ => None,
    }
}

fn clamp_bounds(len: usize, start: Option<i64>, end: Option<i64>) -> (usize, usize) {
    let len = len as i64;
    let norm = |bound: i64| -> i64 {
        let b = if bound < 0 { bound + len } else { bound };
        b.clamp(0, len)
    };
    let lo = norm(start.unwrap_or(0));
    let hi = norm(end.unwrap_or(len));
    (lo as usize, hi.max(lo) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn roots<'a>(data: &'a Value, constants: &'a Value, envelope: &'a Value) -> PathRoots<'a> {
        PathRoots {
            data,
            constants,
            envelope,
        }
    }

    fn resolve(data: &Value, path: &str) -> Resolution {
        let empty = json!({});
        resolve_path(&roots(data, &empty, &empty), path, ExpandPolicy::Allow).unwrap()
    }

    fn transfer_params() -> Value {
        json!([
            {"name": "to", "type": "address", "value": "0x2f2d854c1d6d5bb8936bb85bc07c28ebb42c9b10"},
            {"name": "value", "type": "uint256", "value": "1000000"}
        ])
    }

    #[test]
    fn test_separator_resolves_to_empty_string() {
        let data = json!({});
        assert_eq!(resolve(&data, "separator"), Resolution::Value(json!("")));
    }

    #[test]
    fn test_unsupported_root_is_an_error() {
        let data = json!({});
        let empty = json!({});
        let err = resolve_path(&roots(&data, &empty, &empty), "%.foo", ExpandPolicy::Allow)
            .unwrap_err();
        assert_eq!(err.to_string(), "unsupported root node: %");
    }

    #[test]
    fn test_named_parameter_lookup_from_params_root() {
        let data = transfer_params();
        assert_eq!(
            resolve(&data, "#.to"),
            Resolution::Value(json!("0x2f2d854c1d6d5bb8936bb85bc07c28ebb42c9b10"))
        );
        assert_eq!(resolve(&data, "#.value"), Resolution::Value(json!("1000000")));
    }

    #[test]
    fn test_index_beats_name_lookup() {
        // A property literally named "params[0]" must never be
        // preferred over indexing, per the fixed precedence.
        let data = json!({
            "params": [
                {"name": "first", "value": "a"},
                {"name": "second", "value": "b"}
            ]
        });
        assert_eq!(resolve(&data, "#.params[1]"), Resolution::Value(json!("b")));
    }

    #[test]
    fn test_params_index_reaches_through_method_call() {
        let data = json!({
            "methodCall": {
                "name": "transfer",
                "params": [{"name": "to", "value": "0xabc"}]
            }
        });
        assert_eq!(resolve(&data, "#.params[0]"), Resolution::Value(json!("0xabc")));
    }

    #[test]
    fn test_slice_with_negative_bounds() {
        let data = json!({"data": "0x1234567890abcdef"});
        assert_eq!(resolve(&data, "#.data[0:10]"), Resolution::Value(json!("0x12345678")));
        assert_eq!(resolve(&data, "#.data[-7:]"), Resolution::Value(json!("0abcdef")));
        assert_eq!(resolve(&data, "#.data[2:]"), Resolution::Value(json!("1234567890abcdef")));
        // Out-of-range bounds clamp.
        assert_eq!(
            resolve(&data, "#.data[0:99]"),
            Resolution::Value(json!("0x1234567890abcdef"))
        );
    }

    #[test]
    fn test_slice_of_array_property() {
        let data = json!({"items": [1, 2, 3, 4, 5]});
        assert_eq!(resolve(&data, "#.items[1:3]"), Resolution::Value(json!([2, 3])));
        assert_eq!(resolve(&data, "#.items[-2:]"), Resolution::Value(json!([4, 5])));
    }

    #[test]
    fn test_full_array_marker_keeps_array() {
        let data = json!({"transfers": [{"amount": 1}, {"amount": 2}]});
        assert_eq!(
            resolve(&data, "#.transfers.[]"),
            Resolution::Value(json!([{"amount": 1}, {"amount": 2}]))
        );
    }

    #[test]
    fn test_tuple_component_by_name() {
        let data = json!([{
            "name": "order",
            "type": "tuple",
            "components": [
                {"name": "maker", "type": "address", "value": "0x1111111111111111111111111111111111111111"},
                {"name": "amount", "type": "uint256", "value": "42"}
            ]
        }]);
        assert_eq!(
            resolve(&data, "#.order.amount"),
            Resolution::Value(json!("42"))
        );
    }

    #[test]
    fn test_value_decoded_traversal() {
        let data = json!([{
            "name": "data",
            "type": "bytes",
            "value": "0xa9059cbb0000",
            "valueDecoded": {
                "name": "transfer",
                "signature": "transfer(address,uint256)",
                "params": [
                    {"name": "to", "value": "0x2f2d854c1d6d5bb8936bb85bc07c28ebb42c9b10"},
                    {"name": "value", "value": "1000000"}
                ]
            }
        }]);
        assert_eq!(
            resolve(&data, "#.data.valueDecoded.to"),
            Resolution::Value(json!("0x2f2d854c1d6d5bb8936bb85bc07c28ebb42c9b10"))
        );
        // The gate halts the same walk at the boundary, keeping the
        // still-encoded value.
        let empty = json!({});
        let halted = resolve_path(
            &roots(&data, &empty, &empty),
            "#.data.valueDecoded.to",
            ExpandPolicy::Deny,
        )
        .unwrap();
        assert_eq!(halted, Resolution::Halted(json!("0xa9059cbb0000")));
    }

    #[test]
    fn test_gate_does_not_apply_to_envelope_paths() {
        let data = json!({});
        let constants = json!({});
        let envelope = json!({
            "inner": {"valueDecoded": {"params": [{"name": "to", "value": "0xabc"}]}}
        });
        let got = resolve_path(
            &roots(&data, &constants, &envelope),
            "@.inner.valueDecoded.to",
            ExpandPolicy::Deny,
        )
        .unwrap();
        assert_eq!(got, Resolution::Value(json!("0xabc")));
    }

    #[test]
    fn test_constants_root() {
        let data = json!({});
        let constants = json!({"contract": {"address": "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"}});
        let envelope = json!({});
        let got = resolve_path(
            &roots(&data, &constants, &envelope),
            "$.contract.address",
            ExpandPolicy::Allow,
        )
        .unwrap();
        assert_eq!(
            got,
            Resolution::Value(json!("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"))
        );
    }

    #[test]
    fn test_value_wrapper_fallback() {
        let data = json!({
            "payment": {"value": {"currency": "ETH", "amount": "5"}}
        });
        assert_eq!(
            resolve(&data, "#.payment.currency"),
            Resolution::Value(json!("ETH"))
        );
    }

    #[test]
    fn test_terminal_value_unwrap() {
        let data = json!({"fee": {"value": "250", "type": "uint256"}});
        assert_eq!(resolve(&data, "#.fee"), Resolution::Value(json!("250")));
    }

    #[test]
    fn test_miss_short_circuits() {
        let data = transfer_params();
        assert_eq!(resolve(&data, "#.nosuch.deeper"), Resolution::Unresolved);
        assert_eq!(resolve(&data, "#.to.deeper"), Resolution::Unresolved);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let data = transfer_params();
        let first = resolve(&data, "#.to");
        let second = resolve(&data, "#.to");
        assert_eq!(first, second);
        // Inputs are untouched.
        assert_eq!(data, transfer_params());
    }
}
