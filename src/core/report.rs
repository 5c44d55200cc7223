use crate::core::{AggregatedResult, EntityId, Storage};
use crate::utils::error::{Result, ReviewError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Csv => f.write_str("csv"),
        }
    }
}

const CSV_HEADER: [&str; 6] = [
    "product_id",
    "product_name",
    "user_id",
    "user_name",
    "rating",
    "text",
];

pub fn render(result: &AggregatedResult, format: OutputFormat, pretty: bool) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Json if pretty => Ok(serde_json::to_vec_pretty(result)?),
        OutputFormat::Json => Ok(serde_json::to_vec(result)?),
        OutputFormat::Csv => render_csv(result),
    }
}

fn render_csv(result: &AggregatedResult) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for row in &result.reviews {
        let review = &row.review;
        writer.write_record([
            id_cell(&review.product_id),
            row.product
                .as_ref()
                .and_then(|p| p.name())
                .unwrap_or_default()
                .to_string(),
            id_cell(&review.user_id),
            row.user
                .as_ref()
                .and_then(|u| u.name())
                .unwrap_or_default()
                .to_string(),
            review.rating().map(value_cell).unwrap_or_default(),
            review.text().map(value_cell).unwrap_or_default(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| ReviewError::IoError(e.into_error()))
}

fn id_cell(id: &EntityId) -> String {
    match id {
        EntityId::Number(n) => n.to_string(),
        EntityId::Text(s) => s.clone(),
    }
}

/// Strings are written without JSON quotes; `null` is an empty cell.
fn value_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Renders `result` and stores it at `path`.
pub async fn write_report<S: Storage>(
    storage: &S,
    path: &str,
    result: &AggregatedResult,
    format: OutputFormat,
    pretty: bool,
) -> Result<usize> {
    let bytes = render(result, format, pretty)?;
    tracing::debug!("Writing {} report ({} bytes) to {}", format, bytes.len(), path);
    storage.write_file(path, &bytes).await?;
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStorage;
    use crate::core::aggregate::produce_result;
    use crate::core::{MissingReferencePolicy, SourceData};
    use serde_json::json;

    fn result() -> AggregatedResult {
        let data = SourceData {
            products: serde_json::from_value(json!([{"id": 1, "name": "Widget"}])).unwrap(),
            reviews: serde_json::from_value(json!([
                {"productId": 1, "userId": "ann", "rating": 5, "text": "Great, really"},
                {"productId": 7, "userId": "ann"}
            ]))
            .unwrap(),
            users: serde_json::from_value(json!([{"id": "ann", "name": "Ann"}])).unwrap(),
        };
        produce_result(&data, MissingReferencePolicy::Null).unwrap()
    }

    #[test]
    fn test_render_csv() {
        let csv = String::from_utf8(render(&result(), OutputFormat::Csv, false).unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "product_id,product_name,user_id,user_name,rating,text");
        assert_eq!(lines[1], "1,Widget,ann,Ann,5,\"Great, really\"");
        assert_eq!(lines[2], "7,,ann,Ann,,");
    }

    #[test]
    fn test_render_csv_untyped_rating_and_text() {
        let data = SourceData {
            products: serde_json::from_value(json!([{"id": 1, "name": "Widget"}])).unwrap(),
            reviews: serde_json::from_value(json!([
                {"productId": 1, "userId": 10, "rating": "4.5", "text": 7},
                {"productId": 1, "userId": 10, "rating": null, "text": ["a", "b"]}
            ]))
            .unwrap(),
            users: serde_json::from_value(json!([{"id": 10, "name": "Ann"}])).unwrap(),
        };
        let result = produce_result(&data, MissingReferencePolicy::Null).unwrap();

        let csv = String::from_utf8(render(&result, OutputFormat::Csv, false).unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[1], "1,Widget,10,Ann,4.5,7");
        assert_eq!(lines[2], "1,Widget,10,Ann,,\"[\"\"a\"\",\"\"b\"\"]\"");
    }

    #[test]
    fn test_render_json_round_trips_as_value() {
        let bytes = render(&result(), OutputFormat::Json, true).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["reviews"][0]["product"]["name"], json!("Widget"));
        assert_eq!(value["reviews"][1]["product"], json!(null));
    }

    #[tokio::test]
    async fn test_write_report_goes_through_storage() {
        let storage = MemoryStorage::new();

        let written = write_report(&storage, "out/report.csv", &result(), OutputFormat::Csv, false)
            .await
            .unwrap();

        let stored = storage.get_file("out/report.csv").unwrap();
        assert_eq!(stored.len(), written);
    }
}
