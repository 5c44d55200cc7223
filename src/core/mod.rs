pub mod aggregate;
pub mod builder;
pub mod loader;
pub mod report;

pub use crate::domain::model::{
    AggregatedResult, Dataset, EnrichedReview, EntityId, MissingReferencePolicy, Product,
    ProductSummary, Review, SourceData, User,
};
pub use crate::domain::ports::{ConfigProvider, Storage};
pub use crate::utils::error::Result;
