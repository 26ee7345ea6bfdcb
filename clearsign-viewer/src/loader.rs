//! HTTP loading of metadata documents and sample sets.

use std::time::Duration;

use clearsign::{ClearSignError, DecodedTransaction, Erc7730Document, MetadataEntry};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Per-request timeout. Metadata files are small; anything slower
/// than this is treated as unavailable.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error(transparent)]
    Document(#[from] ClearSignError),
}

/// Index of demo scenarios served next to the metadata files.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleSetsConfig {
    pub sample_sets: Vec<SampleSet>,
}

/// One demo scenario: the metadata files to load, in level order, and
/// the decoded transaction to view.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleSet {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub metadata_files: Vec<String>,
    #[serde(default)]
    pub transaction_data: Option<serde_json::Value>,
}

/// Fetches ERC-7730 documents and sample sets from a base URL.
pub struct MetadataLoader {
    client: reqwest::Client,
    base_url: String,
}

impl MetadataLoader {
    pub fn new(base_url: impl Into<String>) -> Result<Self, LoaderError> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, LoaderError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoaderError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(response.json().await?)
    }

    /// Fetch the sample-set index (`sample-sets.json`).
    pub async fn fetch_sample_sets(&self) -> Result<SampleSetsConfig, LoaderError> {
        let config: SampleSetsConfig = self.get_json(&self.url("sample-sets.json")).await?;
        info!(sets = config.sample_sets.len(), "loaded sample-set index");
        Ok(config)
    }

    /// Fetch one metadata document by file path relative to the base
    /// URL.
    pub async fn fetch_metadata_file(&self, file: &str) -> Result<Erc7730Document, LoaderError> {
        self.get_json(&self.url(file)).await
    }

    /// Fetch the metadata document registered for a contract address.
    ///
    /// Used to opportunistically cover `target` addresses found in a
    /// transaction; a miss here is expected and non-fatal for the
    /// caller.
    pub async fn fetch_metadata_for_address(
        &self,
        address: &str,
    ) -> Result<Erc7730Document, LoaderError> {
        let file = format!("{}.json", address.to_ascii_lowercase());
        self.fetch_metadata_file(&file).await
    }

    /// Fetch everything a sample set names: its metadata files, in
    /// declared order, plus its transaction when it carries one.
    pub async fn load_sample_set(
        &self,
        set: &SampleSet,
    ) -> Result<(Vec<MetadataEntry>, Option<DecodedTransaction>), LoaderError> {
        let mut entries = Vec::with_capacity(set.metadata_files.len());
        for file in &set.metadata_files {
            let document = self.fetch_metadata_file(file).await?;
            let name = document
                .owner()
                .map(str::to_string)
                .unwrap_or_else(|| file.clone());
            entries.push(MetadataEntry::new(file.clone(), name, document));
        }
        let tx = match &set.transaction_data {
            Some(data) if data.is_object() => Some(DecodedTransaction::new(data.clone())),
            Some(_) => {
                return Err(ClearSignError::InvalidTransaction(format!(
                    "sample set {} transaction is not a JSON object",
                    set.id
                ))
                .into())
            }
            None => None,
        };
        info!(set = %set.id, entries = entries.len(), "loaded sample set");
        Ok((entries, tx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sample_sets_config_shape() {
        let config: SampleSetsConfig = serde_json::from_str(
            r#"{
            "sampleSets": [{
                "id": "safe-usdc-transfer",
                "name": "Safe: USDC transfer",
                "metadataFiles": ["safe.json", "usdc.json"],
                "transactionData": {"methodCall": {"name": "execTransaction", "params": []}}
            }]
        }"#,
        )
        .unwrap();
        assert_eq!(config.sample_sets.len(), 1);
        let set = &config.sample_sets[0];
        assert_eq!(set.id, "safe-usdc-transfer");
        assert_eq!(set.metadata_files, vec!["safe.json", "usdc.json"]);
        let tx = set.transaction_data.as_ref().expect("transaction data");
        assert!(tx.get("methodCall").is_some());
    }

    #[test]
    fn test_sample_set_without_transaction_parses() {
        let set: SampleSet = serde_json::from_str(
            r#"{"id": "docs-only", "name": "Docs only", "metadataFiles": ["usdc.json"]}"#,
        )
        .unwrap();
        assert!(set.transaction_data.is_none());
    }

    #[test]
    fn test_url_joining_tolerates_slashes() {
        let loader = MetadataLoader::new("https://example.com/samples/").unwrap();
        assert_eq!(
            loader.url("/sample-sets.json"),
            "https://example.com/samples/sample-sets.json"
        );
        assert_eq!(
            loader.url("metadata/0xabc.json"),
            "https://example.com/samples/metadata/0xabc.json"
        );
    }
}
