use crate::core::{Dataset, Product, Review, SourceData, Storage, User};
use crate::utils::error::{Result, ReviewError};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// Reads and parses the three datasets through a [`Storage`].
///
/// Paths default to `<dataset>.json` relative to the storage root.
pub struct SourceLoader<S: Storage> {
    storage: S,
    paths: HashMap<Dataset, String>,
}

impl<S: Storage> SourceLoader<S> {
    pub fn new(storage: S) -> Self {
        let paths = Dataset::ALL
            .iter()
            .map(|dataset| (*dataset, dataset.file_name().to_string()))
            .collect();
        Self { storage, paths }
    }

    pub fn with_path(mut self, dataset: Dataset, path: impl Into<String>) -> Self {
        self.paths.insert(dataset, path.into());
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn path(&self, dataset: Dataset) -> &str {
        self.paths
            .get(&dataset)
            .map(String::as_str)
            .unwrap_or_else(|| dataset.file_name())
    }

    /// Loads all three datasets with their reads overlapped.
    ///
    /// The first read or parse failure aborts the others.
    pub async fn load_all(&self) -> Result<SourceData> {
        let (products, reviews, users) = tokio::try_join!(
            self.load_one::<Product>(Dataset::Products),
            self.load_one::<Review>(Dataset::Reviews),
            self.load_one::<User>(Dataset::Users),
        )?;

        Ok(SourceData {
            products,
            reviews,
            users,
        })
    }

    pub async fn load_one<T: DeserializeOwned>(&self, dataset: Dataset) -> Result<Vec<T>> {
        let raw = self
            .storage
            .read_file(self.path(dataset))
            .await
            .map_err(|e| self.read_error(dataset, e))?;
        parse(dataset, &raw)
    }

    pub fn load_blocking<T: DeserializeOwned>(&self, dataset: Dataset) -> Result<Vec<T>> {
        let raw = self
            .storage
            .read_file_blocking(self.path(dataset))
            .map_err(|e| self.read_error(dataset, e))?;
        parse(dataset, &raw)
    }

    pub(crate) fn read_error(&self, dataset: Dataset, source: std::io::Error) -> ReviewError {
        tracing::debug!("Read of {} failed: {}", dataset, source);
        ReviewError::ReadError {
            dataset,
            path: self.path(dataset).to_string(),
            source,
        }
    }
}

pub fn parse<T: DeserializeOwned>(dataset: Dataset, raw: &[u8]) -> Result<Vec<T>> {
    let parsed: Vec<T> =
        serde_json::from_slice(raw).map_err(|source| ReviewError::ParseError { dataset, source })?;
    tracing::debug!("Parsed {} {} records", parsed.len(), dataset);
    Ok(parsed)
}
