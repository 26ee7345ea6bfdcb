//! Field value resolution and display formatting.
//!
//! Turns a matched operation's fields into render-ready strings.
//! Failure is always field-local: a field that cannot be resolved
//! renders the `"[unmapped]"` sentinel and never breaks the rest of
//! the screen.

use alloy_primitives::{utils::format_units, U256};
use serde_json::Value;
use tracing::debug;

use crate::erc7730::{Field, MetadataEntry, TokenInfo};
use crate::gate::can_expand;
use crate::matcher::MatchedOperation;
use crate::path::{self, resolve_path, ExpandPolicy, PathRoots, Resolution};
use crate::transaction::DecodedTransaction;

/// Sentinel for a field whose value could not be resolved.
pub const UNMAPPED: &str = "[unmapped]";
/// Sentinel the paginator substitutes for an empty non-separator
/// value.
pub const UNDEFINED: &str = "[undefined]";
/// Path of a blank spacer row.
pub const SEPARATOR_PATH: &str = path::SEPARATOR;

/// A field paired with its final display string.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    pub field: Field,
    pub display_value: String,
}

impl ResolvedField {
    pub fn label(&self) -> Option<&str> {
        self.field.label.as_deref().filter(|l| !l.is_empty())
    }

    pub fn is_separator(&self) -> bool {
        self.field.path.as_deref() == Some(SEPARATOR_PATH)
    }
}

/// Resolve every field of a matched operation.
///
/// `#`-paths walk the matched call's decoded data, `$`-paths the
/// owning document's constants, `@`-paths the transaction envelope
/// (always from the root, whatever the call's level). The expansion
/// gate is consulted once per operation and applied to every walk.
pub fn resolve_operation_fields(
    matched: &MatchedOperation,
    tx: &DecodedTransaction,
    entries: &[MetadataEntry],
) -> Vec<ResolvedField> {
    let policy = if can_expand(tx, entries) {
        ExpandPolicy::Allow
    } else {
        ExpandPolicy::Deny
    };
    let constants = matched.entry.document.constants();
    let roots = PathRoots {
        data: &matched.call.data,
        constants: &constants,
        envelope: &tx.envelope,
    };

    matched
        .operation
        .fields
        .iter()
        .map(|field| resolve_field(field, &roots, policy))
        .collect()
}

fn resolve_field(field: &Field, roots: &PathRoots<'_>, policy: ExpandPolicy) -> ResolvedField {
    // Static fields bypass path resolution entirely.
    if let Some(value) = &field.value {
        let display_value = format_display_value(field.format.as_deref(), value, token_for(field, roots));
        return ResolvedField {
            field: field.clone(),
            display_value,
        };
    }

    let Some(path) = field.path.as_deref() else {
        return ResolvedField {
            field: field.clone(),
            display_value: UNMAPPED.to_string(),
        };
    };

    let display_value = match resolve_path(roots, path, policy) {
        Ok(Resolution::Value(value)) => {
            format_display_value(field.format.as_deref(), &value, token_for(field, roots))
        }
        // A walk the gate stopped keeps the still-encoded value and
        // renders it as truncated hex, whatever format was declared.
        Ok(Resolution::Halted(value)) => format_display_value(Some("raw"), &value, None),
        Ok(Resolution::Unresolved) => UNMAPPED.to_string(),
        Err(err) => {
            debug!(path, %err, "field path failed");
            UNMAPPED.to_string()
        }
    };
    ResolvedField {
        field: field.clone(),
        display_value,
    }
}

/// Token constants referenced by the field's `params.tokenPath`, when
/// present and resolvable.
fn token_for(field: &Field, roots: &PathRoots<'_>) -> Option<TokenInfo> {
    let token_path = field.params.as_ref()?.get("tokenPath")?.as_str()?;
    let resolved = match resolve_path(roots, token_path, ExpandPolicy::Allow) {
        Ok(Resolution::Value(v)) => v,
        _ => return None,
    };
    let decimals = resolved.get("decimals")?.as_u64()?;
    let ticker = resolved
        .get("ticker")
        .or_else(|| resolved.get("symbol"))
        .and_then(Value::as_str)?;
    Some(TokenInfo {
        decimals: u8::try_from(decimals).ok()?,
        ticker: ticker.to_string(),
    })
}

/// Format a resolved value for on-device display.
pub fn format_display_value(format: Option<&str>, value: &Value, token: Option<TokenInfo>) -> String {
    match format {
        Some("addressName") => {
            let text = coerce(value);
            if looks_like_address(&text) {
                shorten(&text, 6, 4)
            } else {
                text
            }
        }
        Some("amount") | Some("tokenAmount") => format_amount(value, token),
        Some("raw") => {
            let text = coerce(value);
            // Anything longer than a plain address gets truncated.
            // Non-ASCII input is oracle garbage; show it whole rather
            // than slice mid-character.
            if text.starts_with("0x") && text.len() > 42 && text.is_ascii() {
                shorten(&text, 10, 7)
            } else {
                text
            }
        }
        _ => coerce(value),
    }
}

/// Scale an integer amount by the token's decimals and append its
/// ticker. Without token constants the raw numeric string is shown
/// unscaled. `"0"` always renders as `"0"`.
fn format_amount(value: &Value, token: Option<TokenInfo>) -> String {
    let text = coerce(value);
    if text == "0" {
        return "0".to_string();
    }
    let Some(token) = token else {
        return text;
    };
    let Some(raw) = parse_u256(&text) else {
        return text;
    };
    match format_units(raw, token.decimals) {
        Ok(scaled) => {
            let trimmed = scaled.trim_end_matches('0').trim_end_matches('.');
            format!("{} {}", trimmed, token.ticker)
        }
        Err(_) => text,
    }
}

fn parse_u256(text: &str) -> Option<U256> {
    if let Some(hex) = text.strip_prefix("0x") {
        U256::from_str_radix(hex, 16).ok()
    } else {
        U256::from_str_radix(text, 10).ok()
    }
}

fn looks_like_address(text: &str) -> bool {
    // ASCII-only: `shorten` slices by byte offset, and a multibyte
    // 42-byte string is not an address anyway.
    text.len() == 42 && text.starts_with("0x") && text.is_ascii()
}

fn shorten(text: &str, head: usize, tail: usize) -> String {
    format!("{}...{}", &text[..head], &text[text.len() - tail..])
}

/// Render-ready string for any JSON value. Strings pass through
/// unquoted; structured values keep their JSON form.
fn coerce(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
