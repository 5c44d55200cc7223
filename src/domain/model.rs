use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The three fixed logical sources joined by the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Products,
    Reviews,
    Users,
}

impl Dataset {
    pub const ALL: [Dataset; 3] = [Dataset::Products, Dataset::Reviews, Dataset::Users];

    pub fn name(&self) -> &'static str {
        match self {
            Dataset::Products => "products",
            Dataset::Reviews => "reviews",
            Dataset::Users => "users",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Dataset::Products => "products.json",
            Dataset::Reviews => "reviews.json",
            Dataset::Users => "users.json",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifier as it appears in the source JSON. `1` and `"1"` are different ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(i64),
    Text(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Number(n) => write!(f, "{}", n),
            EntityId::Text(s) => write!(f, "\"{}\"", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: EntityId,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Product {
    pub fn name(&self) -> Option<&str> {
        self.attributes.get("name").and_then(|v| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl User {
    pub fn name(&self) -> Option<&str> {
        self.attributes.get("name").and_then(|v| v.as_str())
    }
}

/// A review links a product and a user; everything else it carries
/// (rating, text, dates) is kept as-is in `attributes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub product_id: EntityId,
    pub user_id: EntityId,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Review {
    pub fn rating(&self) -> Option<&Value> {
        self.attributes.get("rating")
    }

    /// The rating when it is a JSON number.
    pub fn numeric_rating(&self) -> Option<f64> {
        self.rating().and_then(Value::as_f64)
    }

    pub fn text(&self) -> Option<&Value> {
        self.attributes.get("text")
    }
}

/// The three parsed collections, in (products, reviews, users) order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceData {
    pub products: Vec<Product>,
    pub reviews: Vec<Review>,
    pub users: Vec<User>,
}

/// The source review stays nested so its own keys never clash with
/// `product` and `user`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedReview {
    pub review: Review,
    pub product: Option<Product>,
    pub user: Option<User>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub product_id: EntityId,
    pub review_count: usize,
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregatedResult {
    pub reviews: Vec<EnrichedReview>,
    pub products: Vec<ProductSummary>,
}

impl AggregatedResult {
    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }
}

/// What to do with a review whose product or user id does not resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum MissingReferencePolicy {
    /// Keep the review, leave the unresolved side `null`.
    #[default]
    Null,
    Skip,
    Error,
}
