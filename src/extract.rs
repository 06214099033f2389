use crate::errors::CheckError;
use crate::jsonquery;
use crate::types::{Document, ReportField};
use serde_json::Value;

/// Report field kind evaluating `property` as a path query.
pub const PROPERTY_KIND_JSON_QUERY: &str = "jsonquery";

/// Evaluate one report field against a document.
///
/// `Ok(None)` means the property did not resolve and the field contributes nothing.
pub fn extract_field(
    field: &ReportField,
    document: &Document,
) -> Result<Option<(String, Value)>, CheckError> {
    if !field.kind.eq_ignore_ascii_case(PROPERTY_KIND_JSON_QUERY) {
        return Err(CheckError::UnsupportedRule(field.kind.clone()));
    }

    let extracted = jsonquery::run_single_output(&field.property, document.object()).map_err(
        |source| CheckError::Extraction {
            property: field.property.clone(),
            object: document.to_string(),
            source,
        },
    )?;
    let Some(extracted) = extracted else {
        return Ok(None);
    };

    let value = match field.literal_value() {
        Some(literal) => Value::String(literal.to_string()),
        None => extracted,
    };
    Ok(Some((field.report_name().to_string(), value)))
}
