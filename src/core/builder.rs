use crate::core::aggregate::produce_result;
use crate::core::loader::{parse, SourceLoader};
use crate::core::{
    AggregatedResult, ConfigProvider, Dataset, MissingReferencePolicy, SourceData, Storage,
};
use crate::utils::error::{Result, ReviewError};
use futures::future::{self, BoxFuture, FutureExt, TryFutureExt};
use std::fmt;
use tokio::runtime::{Handle, RuntimeFlavor};

/// The I/O style used to acquire the three datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Sequential blocking reads on the calling thread.
    Sync,
    /// Sequential reads chained through completion callbacks.
    Callbacks,
    /// Overlapped reads, result chained with future combinators.
    Deferred,
    /// Overlapped reads awaited inline.
    Async,
}

impl BuildMode {
    pub const ALL: [BuildMode; 4] = [
        BuildMode::Sync,
        BuildMode::Callbacks,
        BuildMode::Deferred,
        BuildMode::Async,
    ];
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildMode::Sync => "sync",
            BuildMode::Callbacks => "callbacks",
            BuildMode::Deferred => "deferred",
            BuildMode::Async => "async",
        };
        f.write_str(name)
    }
}

/// Loads products, reviews and users and joins them into an [`AggregatedResult`].
///
/// Every entry point produces the same result for the same sources; they
/// differ only in how the reads are scheduled.
pub struct ReviewBuilder<S: Storage> {
    loader: SourceLoader<S>,
    policy: MissingReferencePolicy,
}

impl<S: Storage> ReviewBuilder<S> {
    pub fn new(storage: S) -> Self {
        Self {
            loader: SourceLoader::new(storage),
            policy: MissingReferencePolicy::default(),
        }
    }

    pub fn from_config<C: ConfigProvider>(storage: S, config: &C) -> Self {
        let loader = Dataset::ALL
            .iter()
            .fold(SourceLoader::new(storage), |loader, dataset| {
                loader.with_path(*dataset, config.source_path(*dataset))
            });

        Self {
            loader,
            policy: config.missing_reference_policy(),
        }
    }

    pub fn with_policy(mut self, policy: MissingReferencePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_path(mut self, dataset: Dataset, path: impl Into<String>) -> Self {
        self.loader = self.loader.with_path(dataset, path);
        self
    }

    pub fn policy(&self) -> MissingReferencePolicy {
        self.policy
    }

    pub fn storage(&self) -> &S {
        self.loader.storage()
    }

    pub fn build_reviews_sync(&self) -> Result<AggregatedResult> {
        tracing::debug!("Building reviews with blocking reads");
        let products = self.loader.load_blocking(Dataset::Products)?;
        let reviews = self.loader.load_blocking(Dataset::Reviews)?;
        let users = self.loader.load_blocking(Dataset::Users)?;

        self.join(&SourceData {
            products,
            reviews,
            users,
        })
    }

    /// Reads each dataset from inside the previous read's completion callback.
    ///
    /// The first failure ends the chain and is handed to `callback`; the
    /// remaining reads never start.
    pub fn build_reviews_callbacks<F>(&self, callback: F)
    where
        F: FnOnce(Result<AggregatedResult>),
    {
        tracing::debug!("Building reviews with chained callbacks");
        let storage = self.loader.storage();

        storage.read_file_callback(self.loader.path(Dataset::Products), |products| {
            let products = match products {
                Ok(raw) => raw,
                Err(e) => return callback(Err(self.loader.read_error(Dataset::Products, e))),
            };

            storage.read_file_callback(self.loader.path(Dataset::Reviews), |reviews| {
                let reviews = match reviews {
                    Ok(raw) => raw,
                    Err(e) => return callback(Err(self.loader.read_error(Dataset::Reviews, e))),
                };

                storage.read_file_callback(self.loader.path(Dataset::Users), |users| {
                    let users = match users {
                        Ok(raw) => raw,
                        Err(e) => return callback(Err(self.loader.read_error(Dataset::Users, e))),
                    };

                    callback(self.join_raw(&products, &reviews, &users));
                });
            });
        });
    }

    /// Overlapped load with the join attached as a continuation.
    pub fn build_reviews_deferred(&self) -> BoxFuture<'_, Result<AggregatedResult>> {
        tracing::debug!("Building reviews with chained futures");
        self.loader
            .load_all()
            .and_then(move |data| future::ready(self.join(&data)))
            .boxed()
    }

    pub async fn build_reviews_async(&self) -> Result<AggregatedResult> {
        tracing::debug!("Building reviews with async/await");
        let data = self.loader.load_all().await?;
        self.join(&data)
    }

    /// Builds with the given mode.
    ///
    /// `Sync` and `Callbacks` read with blocking calls. On a multi-threaded
    /// runtime they run under `block_in_place` so the worker's other tasks
    /// move elsewhere; on a current-thread runtime they block it until the
    /// build finishes.
    pub async fn build(&self, mode: BuildMode) -> Result<AggregatedResult> {
        let result = match mode {
            BuildMode::Sync => run_blocking(|| self.build_reviews_sync()),
            BuildMode::Callbacks => run_blocking(|| {
                let mut outcome = None;
                self.build_reviews_callbacks(|result| outcome = Some(result));
                outcome.unwrap_or_else(|| {
                    Err(ReviewError::ProcessingError {
                        message: "callback chain finished without a result".to_string(),
                    })
                })
            }),
            BuildMode::Deferred => self.build_reviews_deferred().await,
            BuildMode::Async => self.build_reviews_async().await,
        }?;

        tracing::info!(
            "Built {} enriched reviews ({} mode)",
            result.reviews.len(),
            mode
        );
        Ok(result)
    }

    /// Runs every mode and checks they agree.
    ///
    /// Fails with the first build error, or with a processing error if two
    /// modes produce different results.
    pub async fn build_all(&self) -> Result<AggregatedResult> {
        let mut reference: Option<AggregatedResult> = None;

        for mode in BuildMode::ALL {
            let result = self.build(mode).await?;
            match &reference {
                None => reference = Some(result),
                Some(expected) if *expected != result => {
                    return Err(ReviewError::ProcessingError {
                        message: format!("{} mode produced a different result", mode),
                    });
                }
                Some(_) => {}
            }
        }

        reference.ok_or_else(|| ReviewError::ProcessingError {
            message: "no build mode ran".to_string(),
        })
    }

    fn join_raw(&self, products: &[u8], reviews: &[u8], users: &[u8]) -> Result<AggregatedResult> {
        let data = SourceData {
            products: parse(Dataset::Products, products)?,
            reviews: parse(Dataset::Reviews, reviews)?,
            users: parse(Dataset::Users, users)?,
        };
        self.join(&data)
    }

    fn join(&self, data: &SourceData) -> Result<AggregatedResult> {
        tracing::debug!(
            "Joining {} products, {} reviews, {} users",
            data.products.len(),
            data.reviews.len(),
            data.users.len()
        );
        produce_result(data, self.policy)
    }
}

// block_in_place panics outside a multi-threaded runtime
fn run_blocking<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStorage;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn storage() -> MemoryStorage {
        MemoryStorage::new()
            .with_file(
                "products.json",
                r#"[{"id": 1, "name": "Widget"}, {"id": 2, "name": "Gadget"}]"#,
            )
            .with_file(
                "reviews.json",
                r#"[
                    {"productId": 1, "userId": 10, "rating": 5, "text": "Great"},
                    {"productId": 2, "userId": 11, "rating": 2, "text": "Meh"},
                    {"productId": 99, "userId": 10, "rating": 1}
                ]"#,
            )
            .with_file(
                "users.json",
                r#"[{"id": 10, "name": "Ann"}, {"id": 11, "name": "Bob"}]"#,
            )
    }

    fn callback_result<S: Storage>(builder: &ReviewBuilder<S>) -> Result<AggregatedResult> {
        let mut outcome = None;
        builder.build_reviews_callbacks(|result| outcome = Some(result));
        outcome.expect("callback was not invoked")
    }

    #[tokio::test]
    async fn test_all_modes_agree() {
        let builder = ReviewBuilder::new(storage());

        let sync = builder.build_reviews_sync().unwrap();
        let callbacks = callback_result(&builder).unwrap();
        let deferred = builder.build_reviews_deferred().await.unwrap();
        let awaited = builder.build_reviews_async().await.unwrap();

        assert_eq!(sync.reviews.len(), 3);
        assert_eq!(sync, callbacks);
        assert_eq!(sync, deferred);
        assert_eq!(sync, awaited);

        let bytes = serde_json::to_vec(&sync).unwrap();
        assert_eq!(bytes, serde_json::to_vec(&awaited).unwrap());
    }

    #[tokio::test]
    async fn test_read_failure_fails_every_mode() {
        let builder = ReviewBuilder::new(storage().with_failure("reviews.json"));

        for mode in BuildMode::ALL {
            let err = builder.build(mode).await.unwrap_err();
            assert!(
                matches!(
                    err,
                    ReviewError::ReadError {
                        dataset: Dataset::Reviews,
                        ..
                    }
                ),
                "{} mode returned {:?}",
                mode,
                err
            );
        }
    }

    #[tokio::test]
    async fn test_parse_failure_fails_every_mode() {
        let builder = ReviewBuilder::new(storage().with_file("users.json", "[{\"id\": 10,"));

        for mode in BuildMode::ALL {
            let err = builder.build(mode).await.unwrap_err();
            assert!(
                matches!(
                    err,
                    ReviewError::ParseError {
                        dataset: Dataset::Users,
                        ..
                    }
                ),
                "{} mode returned {:?}",
                mode,
                err
            );
        }
    }

    #[test]
    fn test_callback_chain_stops_at_first_failure() {
        let storage = storage().with_failure("products.json");
        let builder = ReviewBuilder::new(storage.clone());

        let err = callback_result(&builder).unwrap_err();

        assert!(matches!(
            err,
            ReviewError::ReadError {
                dataset: Dataset::Products,
                ..
            }
        ));
        assert_eq!(storage.read_count(), 1);
    }

    #[tokio::test]
    async fn test_sequential_modes_never_overlap_reads() {
        let storage = storage().with_latency(Duration::from_millis(5));
        let builder = ReviewBuilder::new(storage.clone());

        builder.build_reviews_sync().unwrap();
        callback_result(&builder).unwrap();

        assert_eq!(storage.read_count(), 6);
        assert_eq!(storage.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_modes_overlap_reads() {
        for mode in [BuildMode::Deferred, BuildMode::Async] {
            let storage = storage().with_latency(Duration::from_millis(20));
            let builder = ReviewBuilder::new(storage.clone());

            builder.build(mode).await.unwrap();

            assert_eq!(storage.max_in_flight(), 3, "{} mode", mode);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_blocking_modes_on_multi_thread_runtime() {
        let storage = storage().with_latency(Duration::from_millis(5));
        let builder = ReviewBuilder::new(storage.clone());

        for mode in [BuildMode::Sync, BuildMode::Callbacks] {
            let result = builder.build(mode).await.unwrap();
            assert_eq!(result.reviews.len(), 3, "{} mode", mode);
        }
        assert_eq!(storage.max_in_flight(), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_every_mode_on_current_thread_runtime() {
        let builder = ReviewBuilder::new(storage());

        for mode in BuildMode::ALL {
            let result = builder.build(mode).await.unwrap();
            assert_eq!(result.reviews.len(), 3, "{} mode", mode);
        }
    }

    #[test]
    fn test_blocking_modes_under_block_on() {
        let builder = ReviewBuilder::new(storage());

        let sync = tokio_test::block_on(builder.build(BuildMode::Sync)).unwrap();
        let callbacks = tokio_test::block_on(builder.build(BuildMode::Callbacks)).unwrap();

        assert_eq!(sync, callbacks);
    }

    #[test]
    fn test_deferred_build_is_lazy_until_polled() {
        let storage = storage();
        let builder = ReviewBuilder::new(storage.clone());

        let pending = builder.build_reviews_deferred();
        assert_eq!(storage.read_count(), 0);

        let result = tokio_test::assert_ok!(tokio_test::block_on(pending));
        assert_eq!(result.reviews.len(), 3);
        assert_eq!(storage.read_count(), 3);
    }

    #[tokio::test]
    async fn test_policy_applies_to_every_mode() {
        let builder = ReviewBuilder::new(storage()).with_policy(MissingReferencePolicy::Skip);

        let result = builder.build_all().await.unwrap();

        assert_eq!(result.reviews.len(), 2);
        assert!(result.reviews.iter().all(|r| r.product.is_some()));
    }

    #[tokio::test]
    async fn test_join_error_policy() {
        let builder = ReviewBuilder::new(storage()).with_policy(MissingReferencePolicy::Error);

        let err = builder.build(BuildMode::Async).await.unwrap_err();

        assert!(matches!(err, ReviewError::JoinError { review_index: 2, .. }));
    }
}
