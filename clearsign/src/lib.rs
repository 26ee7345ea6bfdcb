//! ERC-7730 clear-signing engine.
//!
//! Renders decoded Ethereum transactions the way a hardware wallet
//! would display them, driven by ERC-7730 metadata documents. The
//! pipeline is: extract every function call from the transaction tree
//! ([`extract`]), match each call to a metadata format ([`matcher`]),
//! resolve each display field's path expression against the decoded
//! data ([`path`], [`fields`]), and group the results into fixed-size
//! screens ([`screens`]).
//!
//! Everything in this crate is pure and synchronous. Resolution never
//! mutates its inputs and is re-run in full whenever the transaction
//! or the metadata collection changes. Diagnostics go through
//! `tracing` and are silent unless a subscriber is installed.

pub mod erc7730;
pub mod error;
pub mod extract;
pub mod fields;
pub mod gate;
pub mod matcher;
pub mod path;
pub mod screens;
pub mod test_utils;
pub mod transaction;

pub use erc7730::{Erc7730Document, Field, MetadataEntry, Operation, TokenInfo};
pub use error::ClearSignError;
pub use extract::{extract_calls, ExtractedCall};
pub use fields::{
    format_display_value, resolve_operation_fields, ResolvedField, SEPARATOR_PATH, UNDEFINED,
    UNMAPPED,
};
pub use gate::{can_expand, collect_target_addresses};
pub use matcher::{match_all, MatchContext, MatchedOperation};
pub use path::{resolve_path, ExpandPolicy, PathRoots, Resolution};
pub use screens::{paginate, ROWS_PER_SCREEN};
pub use transaction::{DecodedTransaction, MethodCall, Param, ParamShape};
