//! Render pipeline: transaction plus metadata collection in, device
//! screens out.

use clearsign::{
    extract_calls, match_all, paginate, resolve_operation_fields, DecodedTransaction,
    MatchContext, MetadataEntry, ResolvedField,
};
use tracing::debug;

/// A clear-signable operation rendered to screens.
#[derive(Debug, Clone)]
pub struct OperationScreens {
    pub intent: String,
    /// Name of the metadata entry that supplied the format.
    pub source: String,
    pub context: MatchContext,
    pub level: usize,
    pub screens: Vec<Vec<ResolvedField>>,
}

/// Outcome per matched call. Calls no metadata covers produce nothing
/// at all; calls whose format has no usable intent surface explicitly
/// as not clear-signable rather than being rendered from guesswork.
#[derive(Debug, Clone)]
pub enum RenderedOperation {
    Operation(OperationScreens),
    NotClearSignable { name: String, level: usize },
}

/// Run the whole pipeline for one transaction.
pub fn render_operations(
    tx: &DecodedTransaction,
    entries: &[MetadataEntry],
) -> Vec<RenderedOperation> {
    let calls = extract_calls(tx);
    let mut matched = match_all(&calls, entries);
    // Present outer operations before the calls they wrap; extraction
    // order already does this within one branch, the sort makes it
    // hold across branches.
    matched.sort_by_key(|m| m.level);
    matched
        .into_iter()
        .map(|matched| {
            let Some(intent) = matched.operation.intent_text() else {
                debug!(
                    name = %matched.call.name,
                    level = matched.level,
                    "matched format has no intent, not clear-signable"
                );
                return RenderedOperation::NotClearSignable {
                    name: matched.call.name.clone(),
                    level: matched.level,
                };
            };
            let intent = intent.to_string();
            let fields = resolve_operation_fields(&matched, tx, entries);
            RenderedOperation::Operation(OperationScreens {
                intent,
                source: matched.entry.name.clone(),
                context: matched.context,
                level: matched.level,
                screens: paginate(&fields),
            })
        })
        .collect()
}
