//! Operation matching.
//!
//! Associates each extracted call with a display format from the
//! loaded metadata collection. Signature match beats name match
//! because signatures disambiguate overloads; level affinity before
//! the reuse fallback lets a multi-document session bind document N to
//! nesting level N by convention while a single-document session still
//! works for nested calls.

use tracing::debug;

use crate::erc7730::{MetadataEntry, Operation};
use crate::extract::ExtractedCall;

/// Where a matched operation sits in the transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchContext {
    /// The top-level call.
    Main,
    /// A call reached through one or more `valueDecoded` boundaries.
    Nested,
}

/// A call paired with the format that will render it.
#[derive(Debug, Clone)]
pub struct MatchedOperation {
    pub operation: Operation,
    /// The format key that matched (signature or bare name).
    pub format_key: String,
    pub entry: MetadataEntry,
    pub context: MatchContext,
    pub call: ExtractedCall,
    pub level: usize,
}

impl MatchedOperation {
    /// A match with no usable intent must not render; the session
    /// reports it as not clear-signable instead.
    pub fn is_clear_signable(&self) -> bool {
        self.operation.is_clear_signable()
    }
}

/// Match every call against the metadata collection.
///
/// Candidate entries for a call are those whose level association
/// (explicit `preferred_level`, else position in the collection)
/// equals the call's level; when none qualify, every entry is a
/// candidate. A call no candidate covers produces nothing: dropping it
/// silently is the designed failure mode, not an error.
pub fn match_all(calls: &[ExtractedCall], entries: &[MetadataEntry]) -> Vec<MatchedOperation> {
    calls
        .iter()
        .filter_map(|call| match_one(call, entries))
        .collect()
}

fn match_one(call: &ExtractedCall, entries: &[MetadataEntry]) -> Option<MatchedOperation> {
    let affine: Vec<&MetadataEntry> = entries
        .iter()
        .enumerate()
        .filter(|(idx, entry)| entry.preferred_level.unwrap_or(*idx) == call.level)
        .map(|(_, entry)| entry)
        .collect();
    let candidates: Vec<&MetadataEntry> = if affine.is_empty() {
        entries.iter().collect()
    } else {
        affine
    };

    for entry in candidates {
        let formats = &entry.document.display.formats;
        let hit = formats
            .get_key_value(call.signature.as_str())
            .or_else(|| formats.get_key_value(call.name.as_str()));
        if let Some((key, operation)) = hit {
            return Some(MatchedOperation {
                operation: operation.clone(),
                format_key: key.clone(),
                entry: entry.clone(),
                context: if call.level == 0 {
                    MatchContext::Main
                } else {
                    MatchContext::Nested
                },
                call: call.clone(),
                level: call.level,
            });
        }
    }
    debug!(
        name = %call.name,
        signature = %call.signature,
        level = call.level,
        "no metadata format covers call"
    );
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::erc7730::Erc7730Document;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn entry(id: &str, formats: serde_json::Value) -> MetadataEntry {
        let doc: Erc7730Document =
            serde_json::from_value(json!({"display": {"formats": formats}})).unwrap();
        MetadataEntry::new(id, id, doc)
    }

    fn call(name: &str, signature: &str, level: usize) -> ExtractedCall {
        ExtractedCall {
            name: name.to_string(),
            signature: signature.to_string(),
            level,
            data: json!({}),
            params: json!([]),
        }
    }

    #[test]
    fn test_signature_match_beats_name_match() {
        let entries = vec![entry(
            "doc",
            json!({
                "transfer": {"intent": "by name", "fields": []},
                "transfer(address,uint256)": {"intent": "by signature", "fields": []}
            }),
        )];
        let matched = match_all(&[call("transfer", "transfer(address,uint256)", 0)], &entries);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].operation.intent_text(), Some("by signature"));
        assert_eq!(matched[0].format_key, "transfer(address,uint256)");
    }

    #[test]
    fn test_name_match_when_signature_absent() {
        let entries = vec![entry(
            "doc",
            json!({"transfer": {"intent": "by name", "fields": []}}),
        )];
        let matched = match_all(&[call("transfer", "transfer(address,uint256)", 0)], &entries);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].format_key, "transfer");
    }

    #[test]
    fn test_level_affinity_selects_positional_entry() {
        let entries = vec![
            entry("outer", json!({"transfer": {"intent": "outer doc", "fields": []}})),
            entry("inner", json!({"transfer": {"intent": "inner doc", "fields": []}})),
        ];
        let matched = match_all(&[call("transfer", "transfer(address,uint256)", 1)], &entries);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].operation.intent_text(), Some("inner doc"));
        assert_eq!(matched[0].context, MatchContext::Nested);
    }

    #[test]
    fn test_reuse_fallback_when_no_entry_at_level() {
        // One loaded document, a level-1 call: no positional entry at
        // index 1, so the whole collection is reconsidered.
        let entries = vec![entry(
            "only",
            json!({"transfer(address,uint256)": {"intent": "reused", "fields": []}}),
        )];
        let matched = match_all(&[call("transfer", "transfer(address,uint256)", 1)], &entries);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].operation.intent_text(), Some("reused"));
        assert_eq!(matched[0].level, 1);
    }

    #[test]
    fn test_preferred_level_overrides_position() {
        let doc: Erc7730Document = serde_json::from_value(
            json!({"display": {"formats": {"transfer": {"intent": "pinned", "fields": []}}}}),
        )
        .unwrap();
        let entries = vec![
            entry("outer", json!({"transfer": {"intent": "positional", "fields": []}})),
            MetadataEntry::new("pinned", "pinned", doc).with_preferred_level(0),
        ];
        // Both entries now claim level 0; collection order breaks the
        // tie.
        let matched = match_all(&[call("transfer", "transfer()", 0)], &entries);
        assert_eq!(matched[0].operation.intent_text(), Some("positional"));

        // And nothing claims level 1, so fallback kicks in.
        let matched = match_all(&[call("transfer", "transfer()", 1)], &entries);
        assert_eq!(matched[0].operation.intent_text(), Some("positional"));
    }

    #[test]
    fn test_uncovered_call_is_silently_dropped() {
        let entries = vec![entry("doc", json!({"approve": {"intent": "x", "fields": []}}))];
        let matched = match_all(&[call("transfer", "transfer()", 0)], &entries);
        assert!(matched.is_empty());
    }
}
