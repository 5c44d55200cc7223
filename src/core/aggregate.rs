use crate::core::{
    AggregatedResult, EnrichedReview, EntityId, MissingReferencePolicy, ProductSummary, SourceData,
};
use crate::utils::error::{Result, ReviewError};
use std::collections::HashMap;

/// Joins every review with its product and user.
///
/// Output rows follow review input order. Duplicate product or user ids
/// resolve to their first occurrence. When the product or user collection is
/// empty no review can match and the result is empty.
pub fn produce_result(
    data: &SourceData,
    policy: MissingReferencePolicy,
) -> Result<AggregatedResult> {
    if data.products.is_empty() || data.users.is_empty() || data.reviews.is_empty() {
        return Ok(AggregatedResult::default());
    }

    let products = index_by_id(&data.products, |p| &p.id);
    let users = index_by_id(&data.users, |u| &u.id);

    let mut reviews = Vec::with_capacity(data.reviews.len());
    for (index, review) in data.reviews.iter().enumerate() {
        let product = products.get(&review.product_id).copied();
        let user = users.get(&review.user_id).copied();

        if product.is_none() || user.is_none() {
            match policy {
                MissingReferencePolicy::Null => {
                    tracing::warn!(
                        "Review #{} has dangling references (product {}: {}, user {}: {})",
                        index,
                        review.product_id,
                        resolved(product.is_some()),
                        review.user_id,
                        resolved(user.is_some())
                    );
                }
                MissingReferencePolicy::Skip => {
                    tracing::warn!("Skipping review #{} with dangling references", index);
                    continue;
                }
                MissingReferencePolicy::Error => {
                    let (entity, id) = if product.is_none() {
                        ("product", &review.product_id)
                    } else {
                        ("user", &review.user_id)
                    };
                    return Err(ReviewError::JoinError {
                        review_index: index,
                        entity,
                        id: id.to_string(),
                    });
                }
            }
        }

        reviews.push(EnrichedReview {
            review: review.clone(),
            product: product.cloned(),
            user: user.cloned(),
        });
    }

    let products = summarize(&reviews);
    tracing::debug!(
        "Aggregated {} reviews across {} products",
        reviews.len(),
        products.len()
    );

    Ok(AggregatedResult { reviews, products })
}

fn index_by_id<'a, T>(
    items: &'a [T],
    id: impl Fn(&T) -> &EntityId,
) -> HashMap<&'a EntityId, &'a T> {
    let mut index = HashMap::with_capacity(items.len());
    for item in items {
        index.entry(id(item)).or_insert(item);
    }
    index
}

fn resolved(found: bool) -> &'static str {
    if found {
        "ok"
    } else {
        "missing"
    }
}

fn summarize(reviews: &[EnrichedReview]) -> Vec<ProductSummary> {
    struct Tally<'a> {
        product_id: &'a EntityId,
        count: usize,
        rating_sum: f64,
        rated: usize,
    }

    let mut order: Vec<Tally> = Vec::new();
    let mut positions: HashMap<&EntityId, usize> = HashMap::new();

    for enriched in reviews {
        let Some(product) = enriched.product.as_ref() else {
            continue;
        };

        let slot = *positions.entry(&product.id).or_insert_with(|| {
            order.push(Tally {
                product_id: &product.id,
                count: 0,
                rating_sum: 0.0,
                rated: 0,
            });
            order.len() - 1
        });

        let tally = &mut order[slot];
        tally.count += 1;
        if let Some(rating) = enriched.review.numeric_rating() {
            tally.rating_sum += rating;
            tally.rated += 1;
        }
    }

    order
        .into_iter()
        .map(|tally| ProductSummary {
            product_id: tally.product_id.clone(),
            review_count: tally.count,
            average_rating: (tally.rated > 0).then(|| tally.rating_sum / tally.rated as f64),
        })
        .collect()
}
