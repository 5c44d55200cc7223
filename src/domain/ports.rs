use crate::domain::model::{Dataset, MissingReferencePolicy};
use std::io;

/// Byte-level access to the persisted datasets.
///
/// Read failures are plain `io::Error`s; the loader attaches the dataset
/// they belong to.
pub trait Storage: Send + Sync {
    fn read_file(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = io::Result<Vec<u8>>> + Send;

    fn read_file_blocking(&self, path: &str) -> io::Result<Vec<u8>>;

    /// Completion-callback flavour of [`Storage::read_file_blocking`].
    fn read_file_callback<F>(&self, path: &str, callback: F)
    where
        F: FnOnce(io::Result<Vec<u8>>),
    {
        callback(self.read_file_blocking(path))
    }

    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = io::Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn data_dir(&self) -> &str;
    fn source_path(&self, dataset: Dataset) -> &str;
    fn missing_reference_policy(&self) -> MissingReferencePolicy;
}
