//! Shared fixtures for unit and integration tests: a Safe
//! `execTransaction` wrapping a USDC transfer, with the two metadata
//! documents that clear-sign it.

use serde_json::json;

use crate::erc7730::{Erc7730Document, MetadataEntry};
use crate::fields::ResolvedField;
use crate::transaction::DecodedTransaction;

pub fn assert_has_field(fields: &[ResolvedField], label: &str) {
    let (found, _) = check_fields(fields, label);
    assert!(found, "Should have a {label} field");
}

pub fn assert_has_field_with_value(fields: &[ResolvedField], label: &str, expected_value: &str) {
    let (found, values) = check_fields(fields, label);
    assert!(
        found,
        "Should have a {label} field with value {expected_value}"
    );
    assert!(
        values.contains(&expected_value.to_string()),
        "Should have a {label} field with value {expected_value}. Actual values: {:?}",
        values
    );
}

pub fn check_fields(fields: &[ResolvedField], label: &str) -> (bool, Vec<String>) {
    let values: Vec<String> = fields
        .iter()
        .filter(|f| f.label() == Some(label))
        .map(|f| f.display_value.clone())
        .collect();
    (!values.is_empty(), values)
}

pub const SAFE_ADDRESS: &str = "0x6092722B33FcF90af6e99C93F5F9349473869e23";
pub const USDC_ADDRESS: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";
pub const RECIPIENT: &str = "0x2f2d854c1d6d5bb8936bb85bc07c28ebb42c9b10";

pub const EXEC_TRANSACTION_SIGNATURE: &str =
    "execTransaction(address,uint256,bytes,uint8,uint256,uint256,uint256,address,address,bytes)";

/// Metadata for the Safe wallet contract, bound at collection index 0.
pub fn safe_metadata() -> MetadataEntry {
    let doc: Erc7730Document = serde_json::from_value(json!({
        "context": {"contract": {"address": SAFE_ADDRESS, "chainId": 1}},
        "metadata": {"owner": "SAFE"},
        "display": {"formats": {
            "execTransaction(address,uint256,bytes,uint8,uint256,uint256,uint256,address,address,bytes)": {
                "intent": "execute transaction",
                "fields": [
                    {"label": "Interacting with", "format": "addressName", "path": "#.to"},
                    {"label": "Value", "format": "amount", "path": "#.value"},
                    {"label": "Operation", "format": "raw", "path": "#.operation"},
                    {"label": " ", "path": "separator"},
                    {"label": "Data", "format": "raw", "path": "#.data"}
                ]
            }
        }}
    }))
    .expect("safe fixture document");
    MetadataEntry::new("safe", "SAFE", doc)
}

/// Metadata for the USDC token contract, bound at collection index 1.
pub fn usdc_metadata() -> MetadataEntry {
    let doc: Erc7730Document = serde_json::from_value(json!({
        "context": {"contract": {"address": USDC_ADDRESS, "chainId": 1}},
        "metadata": {"owner": "Circle", "token": {"ticker": "USDC", "decimals": 6}},
        "display": {"formats": {
            "transfer(address,uint256)": {
                "intent": "Transfer USDC",
                "fields": [
                    {"label": "To", "format": "addressName", "path": "#.to"},
                    {"label": "Amount", "format": "tokenAmount", "path": "#.value",
                     "params": {"tokenPath": "$.token"}}
                ]
            }
        }}
    }))
    .expect("usdc fixture document");
    MetadataEntry::new("usdc", "Circle", doc)
}

/// The inner transfer's calldata, as the decoder would leave it on
/// the `data` parameter.
pub fn transfer_calldata() -> String {
    format!(
        "0xa9059cbb000000000000000000000000{}00000000000000000000000000000000000000000000000000000000000f4240",
        RECIPIENT.trim_start_matches("0x")
    )
}

/// A Safe `execTransaction` whose `data` payload decodes to a USDC
/// `transfer` of 1 USDC.
pub fn safe_exec_transfer_tx() -> DecodedTransaction {
    DecodedTransaction::new(json!({
        "chainID": "1",
        "to": SAFE_ADDRESS,
        "methodCall": {
            "name": "execTransaction",
            "signature": EXEC_TRANSACTION_SIGNATURE,
            "params": [
                {"name": "to", "type": "address", "value": USDC_ADDRESS},
                {"name": "value", "type": "uint256", "value": "0"},
                {
                    "name": "data",
                    "type": "bytes",
                    "value": transfer_calldata(),
                    "valueDecoded": {
                        "name": "transfer",
                        "signature": "transfer(address,uint256)",
                        "params": [
                            {"name": "to", "type": "address", "value": RECIPIENT},
                            {"name": "value", "type": "uint256", "value": "1000000"}
                        ]
                    }
                },
                {"name": "operation", "type": "uint8", "value": "0"},
                {"name": "safeTxGas", "type": "uint256", "value": "0"},
                {"name": "baseGas", "type": "uint256", "value": "0"},
                {"name": "gasPrice", "type": "uint256", "value": "0"},
                {"name": "gasToken", "type": "address", "value": "0x0000000000000000000000000000000000000000"},
                {"name": "refundReceiver", "type": "address", "value": "0x0000000000000000000000000000000000000000"},
                {"name": "signatures", "type": "bytes", "value": "0x"}
            ]
        }
    }))
}
