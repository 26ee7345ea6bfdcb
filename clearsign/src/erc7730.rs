//! ERC-7730 metadata document model.
//!
//! Accepts both the minimal shape used by demo samples and the fuller
//! v1 schema shape (`id`, `screens`, `required`, `excluded` on formats
//! and fields). Unrecognized fields are ignored, not rejected.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An ERC-7730 "clear signing" metadata document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Erc7730Document {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Contract binding: address/chainId or deployments plus an
    /// optional ABI. Kept as raw JSON since both demo and v1 shapes
    /// must be accepted.
    #[serde(default)]
    pub context: Value,
    /// Owner info and optional token constants (decimals/ticker).
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub display: DisplaySection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplaySection {
    /// Operation key (full function signature or bare name) to display
    /// format. Key order is author order and is significant: the first
    /// key is the fallback selection when nothing matches exactly.
    #[serde(default)]
    pub formats: IndexMap<String, Operation>,
}

/// One display format: how to render a single contract function.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Operation {
    /// Human-readable intent. Empty or missing intent means the
    /// operation is not clear-signable and must not render.
    #[serde(default)]
    pub intent: Option<Value>,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screens: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl Operation {
    /// The intent as display text, when it is a plain string.
    pub fn intent_text(&self) -> Option<&str> {
        match &self.intent {
            Some(Value::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    /// An operation with no usable intent signals "not clear
    /// signable" and suppresses rendering.
    pub fn is_clear_signable(&self) -> bool {
        self.intent_text().is_some()
    }
}

/// One display row of an operation.
///
/// A field carries exactly one of `path` (dynamic, resolved against
/// the decoded data) or `value` (static). A field with neither
/// resolves to the unmapped sentinel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Field {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub params: Option<Value>,
}

/// Token constants declared under `metadata.token`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub decimals: u8,
    pub ticker: String,
}

impl Erc7730Document {
    /// Parse a document from JSON text, validating at the input
    /// boundary so the core never sees malformed metadata.
    pub fn from_json(text: &str) -> Result<Self, crate::ClearSignError> {
        serde_json::from_str(text)
            .map_err(|e| crate::ClearSignError::InvalidDocument(e.to_string()))
    }

    /// The constants view backing `$`-rooted paths.
    ///
    /// Merges the document's `context` and `metadata` objects into one
    /// object so that `$.contract`, `$.token` and `$.owner` all
    /// resolve. `context` keys win on collision.
    pub fn constants(&self) -> Value {
        let mut merged = serde_json::Map::new();
        if let Value::Object(meta) = &self.metadata {
            for (k, v) in meta {
                merged.insert(k.clone(), v.clone());
            }
        }
        if let Value::Object(ctx) = &self.context {
            for (k, v) in ctx {
                merged.insert(k.clone(), v.clone());
            }
        }
        Value::Object(merged)
    }

    /// Owner string from `metadata.owner`, used to name auto-loaded
    /// entries.
    pub fn owner(&self) -> Option<&str> {
        self.metadata.get("owner").and_then(Value::as_str)
    }

    /// The bound contract address, from either the demo shape
    /// (`context.contract.address`) or the v1 shape
    /// (`context.contract.deployments[0].address`).
    pub fn contract_address(&self) -> Option<&str> {
        let contract = self.context.get("contract")?;
        if let Some(addr) = contract.get("address").and_then(Value::as_str) {
            return Some(addr);
        }
        contract
            .get("deployments")
            .and_then(Value::as_array)
            .and_then(|deps| deps.first())
            .and_then(|dep| dep.get("address"))
            .and_then(Value::as_str)
    }

    /// Whether this document is bound to the given contract address
    /// (case-insensitive hex comparison).
    pub fn binds_address(&self, address: &str) -> bool {
        self.contract_address()
            .is_some_and(|a| a.eq_ignore_ascii_case(address))
    }

    /// Best format key for a transaction selector: exact signature
    /// match, else a key containing the bare function name, else the
    /// first declared key.
    pub fn select_format(&self, selector: &str, name: &str) -> Option<&str> {
        let formats = &self.display.formats;
        if let Some((key, _)) = formats.get_key_value(selector) {
            return Some(key.as_str());
        }
        if let Some(key) = formats.keys().find(|key| key.contains(name)) {
            return Some(key);
        }
        formats.keys().next().map(String::as_str)
    }

    /// Token constants from `metadata.token`, when declared.
    pub fn token_info(&self) -> Option<TokenInfo> {
        let token = self.metadata.get("token")?;
        let decimals = token.get("decimals")?.as_u64()?;
        let ticker = token
            .get("ticker")
            .or_else(|| token.get("symbol"))
            .and_then(Value::as_str)?;
        Some(TokenInfo {
            decimals: u8::try_from(decimals).ok()?,
            ticker: ticker.to_string(),
        })
    }
}

/// A loaded metadata document in the viewer's ordered collection.
///
/// Collection order matters: the matcher prefers the entry whose
/// position equals a call's nesting level. `preferred_level` makes
/// that association explicit and overrides the positional default.
#[derive(Debug, Clone)]
pub struct MetadataEntry {
    pub id: String,
    pub name: String,
    pub preferred_level: Option<usize>,
    pub document: Erc7730Document,
}

impl MetadataEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>, document: Erc7730Document) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            preferred_level: None,
            document,
        }
    }

    pub fn with_preferred_level(mut self, level: usize) -> Self {
        self.preferred_level = Some(level);
        self
    }
}
