//! Signing session state: the ordered metadata collection and the
//! transaction under review.

use anyhow::Context;
use clearsign::{collect_target_addresses, DecodedTransaction, MetadataEntry};
use tracing::{info, warn};

use crate::loader::{MetadataLoader, SampleSet};
use crate::render::{render_operations, RenderedOperation};

/// At most this many target addresses are fetched per transaction.
/// Batched transactions can name dozens of targets and the viewer
/// must stay responsive.
const MAX_TARGET_FETCHES: usize = 4;

/// One viewing session. Entry order is significant: the matcher binds
/// collection index N to nesting level N.
#[derive(Debug, Default)]
pub struct SigningSession {
    entries: Vec<MetadataEntry>,
    transaction: Option<DecodedTransaction>,
    /// `(entry id, format key)` of the operation the UI focuses on.
    selection: Option<(String, String)>,
}

impl SigningSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[MetadataEntry] {
        &self.entries
    }

    pub fn transaction(&self) -> Option<&DecodedTransaction> {
        self.transaction.as_ref()
    }

    /// Append a metadata document. An entry with the same id replaces
    /// the earlier one in place, keeping its level slot.
    pub fn add_metadata(&mut self, entry: MetadataEntry) {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.id == entry.id) {
            *existing = entry;
        } else {
            self.entries.push(entry);
        }
        self.refresh_selection();
    }

    pub fn remove_metadata(&mut self, id: &str) {
        self.entries.retain(|e| e.id != id);
        self.refresh_selection();
    }

    pub fn rename_metadata(&mut self, id: &str, name: impl Into<String>) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
            entry.name = name.into();
        }
    }

    pub fn set_transaction(&mut self, tx: DecodedTransaction) {
        self.transaction = Some(tx);
        self.refresh_selection();
    }

    /// Set the transaction from raw JSON text. Malformed input is
    /// rejected here; the engine never sees it.
    pub fn set_transaction_json(&mut self, text: &str) -> Result<(), clearsign::ClearSignError> {
        let tx = DecodedTransaction::from_json(text)?;
        self.set_transaction(tx);
        Ok(())
    }

    pub fn clear_transaction(&mut self) {
        self.transaction = None;
        self.selection = None;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.transaction = None;
        self.selection = None;
    }

    /// The operation the UI focuses on, as `(entry id, format key)`.
    pub fn selection(&self) -> Option<(&str, &str)> {
        self.selection
            .as_ref()
            .map(|(id, key)| (id.as_str(), key.as_str()))
    }

    pub fn select(&mut self, entry_id: impl Into<String>, format_key: impl Into<String>) {
        self.selection = Some((entry_id.into(), format_key.into()));
    }

    /// Re-pick the focused operation: first entry whose document
    /// offers a format for the transaction's selector (exact
    /// signature, else name containment, else the document's first
    /// format).
    fn refresh_selection(&mut self) {
        self.selection = None;
        let Some(call) = self.transaction.as_ref().and_then(DecodedTransaction::method_call)
        else {
            return;
        };
        let selector = call.signature_or_synthesized();
        for entry in &self.entries {
            if let Some(key) = entry.document.select_format(&selector, &call.name) {
                self.selection = Some((entry.id.clone(), key.to_string()));
                return;
            }
        }
    }

    /// Render the current transaction with the current collection.
    /// Everything is re-derived from scratch; nothing is cached across
    /// metadata or transaction changes.
    pub fn render(&self) -> Vec<RenderedOperation> {
        match &self.transaction {
            Some(tx) => render_operations(tx, &self.entries),
            None => Vec::new(),
        }
    }

    /// Target addresses in the transaction not yet covered by any
    /// loaded document.
    pub fn missing_target_addresses(&self) -> Vec<String> {
        let Some(tx) = &self.transaction else {
            return Vec::new();
        };
        collect_target_addresses(tx)
            .into_iter()
            .filter(|addr| {
                !self
                    .entries
                    .iter()
                    .any(|e| e.document.binds_address(addr))
            })
            .collect()
    }

    /// Try to fetch metadata for uncovered target addresses so a
    /// re-render can expand their payloads. Individual misses are
    /// logged and skipped; returns how many documents were added.
    pub async fn load_target_metadata(&mut self, loader: &MetadataLoader) -> usize {
        let mut added = 0;
        for address in self
            .missing_target_addresses()
            .into_iter()
            .take(MAX_TARGET_FETCHES)
        {
            match loader.fetch_metadata_for_address(&address).await {
                Ok(document) => {
                    let name = document.owner().map(str::to_string).unwrap_or_else(|| {
                        clearsign::format_display_value(
                            Some("addressName"),
                            &serde_json::Value::String(address.clone()),
                            None,
                        )
                    });
                    info!(%address, %name, "loaded metadata for target address");
                    self.add_metadata(MetadataEntry::new(address.to_ascii_lowercase(), name, document));
                    added += 1;
                }
                Err(err) => {
                    warn!(%address, %err, "no metadata for target address");
                }
            }
        }
        added
    }

    /// Replace the whole session with a sample set's documents and
    /// transaction.
    pub async fn load_sample_set(
        &mut self,
        loader: &MetadataLoader,
        set: &SampleSet,
    ) -> anyhow::Result<()> {
        let (entries, tx) = loader
            .load_sample_set(set)
            .await
            .with_context(|| format!("loading sample set {}", set.id))?;
        self.entries = entries;
        self.transaction = tx;
        self.refresh_selection();
        Ok(())
    }
}
