//! Decoded-transaction model.
//!
//! The transaction envelope itself stays an opaque [`serde_json::Value`]
//! (it is oracle-supplied and carries arbitrary extra properties like
//! `transfers` or `addressesMeta` addressed via `@`-paths). The only
//! shapes the engine gives structure to are function calls and their
//! parameters, modeled here so the extractor can match exhaustively
//! instead of probing properties ad hoc.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A decoded function call: the root `methodCall` or any nested
/// `valueDecoded` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodCall {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default)]
    pub params: Vec<Param>,
}

/// One decoded parameter of a call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<Param>>,
    #[serde(
        rename = "valueDecoded",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub value_decoded: Option<Box<MethodCall>>,
}

/// What a parameter actually is, for exhaustive matching.
///
/// A nested decode wins over tuple decomposition when a parameter
/// somehow carries both, since `valueDecoded` means a whole inner
/// transaction while `components` is only structural.
#[derive(Debug)]
pub enum ParamShape<'a> {
    /// Plain ABI value (address, uint, bytes hex, ...).
    Scalar(&'a Value),
    /// Tuple/struct decomposition of a single call's argument.
    Tuple(&'a [Param]),
    /// A further ABI-decoded payload carried inside a `bytes` value.
    Nested(&'a MethodCall),
}

impl Param {
    pub fn shape(&self) -> ParamShape<'_> {
        if let Some(call) = &self.value_decoded {
            ParamShape::Nested(call)
        } else if let Some(components) = &self.components {
            ParamShape::Tuple(components)
        } else {
            ParamShape::Scalar(&self.value)
        }
    }

    /// The parameter's ABI type for signature synthesis. Tuples
    /// resolve to their parenthesized component types.
    fn synthesized_type(&self) -> String {
        if let Some(components) = &self.components {
            let inner: Vec<String> = components.iter().map(Param::synthesized_type).collect();
            format!("({})", inner.join(","))
        } else {
            self.param_type.clone().unwrap_or_default()
        }
    }
}

impl MethodCall {
    /// The call's signature, synthesizing `name(type1,type2,...)` from
    /// the parameter types when the decoder did not provide one.
    pub fn signature_or_synthesized(&self) -> String {
        if let Some(sig) = &self.signature {
            if !sig.is_empty() {
                return sig.clone();
            }
        }
        let types: Vec<String> = self.params.iter().map(Param::synthesized_type).collect();
        format!("{}({})", self.name, types.join(","))
    }

    /// Parse a call from a JSON node that carries `name`, `signature`
    /// and `params`. Used by the extractor's anywhere-in-the-tree
    /// shape test, so all three keys must be present.
    pub fn from_signed_node(node: &Value) -> Option<Self> {
        let obj = node.as_object()?;
        if !obj.contains_key("name") || !obj.contains_key("signature") || !obj.contains_key("params")
        {
            return None;
        }
        serde_json::from_value(node.clone()).ok()
    }

    /// Parse a call from the top-level `methodCall` convenience shape,
    /// which needs only `name` and `params`.
    pub fn from_method_call_node(node: &Value) -> Option<Self> {
        let obj = node.as_object()?;
        if !obj.contains_key("name") || !obj.contains_key("params") {
            return None;
        }
        serde_json::from_value(node.clone()).ok()
    }
}

/// A user/oracle-supplied decoded transaction. Wraps the raw envelope
/// so `@`-paths can address any of its properties while the call tree
/// gets typed access.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecodedTransaction {
    pub envelope: Value,
}

impl DecodedTransaction {
    pub fn new(envelope: Value) -> Self {
        Self { envelope }
    }

    pub fn from_json(text: &str) -> Result<Self, crate::ClearSignError> {
        let envelope: Value = serde_json::from_str(text)
            .map_err(|e| crate::ClearSignError::InvalidTransaction(e.to_string()))?;
        if !envelope.is_object() {
            return Err(crate::ClearSignError::InvalidTransaction(
                "transaction must be a JSON object".to_string(),
            ));
        }
        Ok(Self { envelope })
    }

    /// The top-level call, when the envelope has one.
    pub fn method_call(&self) -> Option<MethodCall> {
        self.envelope
            .get("methodCall")
            .and_then(MethodCall::from_method_call_node)
    }

    /// The top-level call's `name(type1,...)` selector, used to
    /// auto-select a display format for the transaction.
    pub fn function_selector(&self) -> Option<String> {
        self.method_call()
            .map(|call| call.signature_or_synthesized())
    }
}
