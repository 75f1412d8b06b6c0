// src/domain/normalize.rs

use crate::domain::{Category, NormalizedRecord};
use crate::errors::NormalizeError;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::debug;

/// One row of a published dataset, keyed by column name.
/// Absent columns and empty cells are `Value::Null`.
pub type RawRow = Map<String, Value>;

/// Separator between the fields that make up the identity hash.
const HASH_DELIMITER: &str = "|";

/// The record fields filled from source columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Member,
    Party,
    MnisId,
    TwfyId,
    Summary,
    Value,
    PayerName,
    ReceivedDate,
    Registered,
    Published,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::Member,
        Field::Party,
        Field::MnisId,
        Field::TwfyId,
        Field::Summary,
        Field::Value,
        Field::PayerName,
        Field::ReceivedDate,
        Field::Registered,
        Field::Published,
    ];

    /// Column name the field is published under.
    pub fn column(&self) -> &'static str {
        match self {
            Field::Member => "member",
            Field::Party => "party",
            Field::MnisId => "mnis_id",
            Field::TwfyId => "twfy_id",
            Field::Summary => "summary",
            Field::Value => "value",
            Field::PayerName => "payer_name",
            Field::ReceivedDate => "received_date",
            Field::Registered => "registered",
            Field::Published => "published",
        }
    }
}

/// Where each record field is read from: an ordered list of candidate
/// columns, the first one holding a value wins.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPolicy {
    candidates: HashMap<Field, Vec<String>>,
}

impl Default for FieldPolicy {
    fn default() -> Self {
        let policy = Field::ALL.iter().fold(
            FieldPolicy {
                candidates: HashMap::new(),
            },
            |policy, field| policy.with_candidates(*field, &[field.column()]),
        );
        // Donations publish the payer as `donor_name`.
        policy.with_candidates(Field::PayerName, &["payer_name", "donor_name"])
    }
}

impl FieldPolicy {
    /// Replaces the candidate columns for `field`.
    pub fn with_candidates(mut self, field: Field, columns: &[&str]) -> Self {
        self.candidates
            .insert(field, columns.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn candidates(&self, field: Field) -> &[String] {
        self.candidates
            .get(&field)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// First non-missing cell among the field's candidate columns.
    pub fn resolve<'r>(&self, row: &'r RawRow, field: Field) -> Option<&'r Value> {
        self.candidates(field)
            .iter()
            .filter_map(|column| row.get(column))
            .find(|value| !is_missing(value))
    }

    fn text(&self, row: &RawRow, field: Field) -> Option<String> {
        self.resolve(row, field).and_then(cell_text)
    }

    /// Converts one raw row fetched under `category` into a record with its
    /// identity hash. Pure: the same input always gives the same output.
    ///
    /// A value or id that is not a number leaves the typed field empty; the
    /// text is still in `raw_json`, and a textual value keeps its place in
    /// the hash.
    pub fn normalize(
        &self,
        row: &RawRow,
        category: Category,
    ) -> Result<NormalizedRecord, NormalizeError> {
        if Field::ALL.iter().all(|field| self.resolve(row, *field).is_none()) {
            return Err(NormalizeError::EmptyRow);
        }

        let value_cell = self.resolve(row, Field::Value);
        let value = value_cell.map(parse_value).transpose()?.flatten();
        let value_key = match value {
            Some(n) => Some(canonical_number(n)),
            None => value_cell.and_then(cell_text),
        };
        let mnis_id = self
            .resolve(row, Field::MnisId)
            .map(parse_id)
            .transpose()?
            .flatten();

        let member = self.text(row, Field::Member);
        let summary = self.text(row, Field::Summary);
        let payer_name = self.text(row, Field::PayerName);
        let received_date = self.text(row, Field::ReceivedDate);

        let hash = identity_hash(
            member.as_deref(),
            category,
            summary.as_deref(),
            value_key.as_deref(),
            payer_name.as_deref(),
            received_date.as_deref(),
        );

        Ok(NormalizedRecord {
            category,
            party: self.text(row, Field::Party),
            mnis_id,
            twfy_id: self.text(row, Field::TwfyId),
            registered: self.text(row, Field::Registered),
            published: self.text(row, Field::Published),
            raw_json: raw_json(row),
            member,
            summary,
            value,
            payer_name,
            received_date,
            hash,
        })
    }
}

/// Normalizes with the default [`FieldPolicy`].
pub fn normalize(row: &RawRow, category: Category) -> Result<NormalizedRecord, NormalizeError> {
    FieldPolicy::default().normalize(row, category)
}

/// SHA-256 (hex) over the fields that identify a disclosed fact. Missing
/// fields hash as empty strings so positions never shift. `value` is the
/// canonical number text, or the trimmed cell when it is not a number.
pub fn identity_hash(
    member: Option<&str>,
    category: Category,
    summary: Option<&str>,
    value: Option<&str>,
    payer_name: Option<&str>,
    received_date: Option<&str>,
) -> String {
    let key = [
        member.unwrap_or(""),
        category.as_str(),
        summary.unwrap_or(""),
        value.unwrap_or(""),
        payer_name.unwrap_or(""),
        received_date.unwrap_or(""),
    ]
    .join(HASH_DELIMITER);

    format!("{:x}", Sha256::digest(key.as_bytes()))
}

/// `100`, `100.0` and `"100"` all render as `100`; `-0` renders as `0`.
pub fn canonical_number(n: f64) -> String {
    // -0.0 == 0.0, so this folds the negative zero.
    let n = if n == 0.0 { 0.0 } else { n };
    format!("{n}")
}

fn is_missing(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Text form of a cell, surrounding whitespace trimmed. Non-primitive values
/// are rendered as JSON.
fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => n.as_f64().map(canonical_number),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// `Ok(None)` for text that is not a number; nested values are malformed.
fn parse_value(value: &Value) -> Result<Option<f64>, NormalizeError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !matches!(c, '£' | ',') && !c.is_whitespace())
                .collect();
            cleaned.parse::<f64>().ok()
        }
        Value::Bool(_) | Value::Null => None,
        Value::Array(_) | Value::Object(_) => {
            return Err(NormalizeError::InvalidValue(render(value)));
        }
    };

    let parsed = parsed.filter(|n| n.is_finite());
    if parsed.is_none() {
        debug!(value = %render(value), "value is not a number, keeping it as text");
    }
    Ok(parsed)
}

fn parse_id(value: &Value) -> Result<Option<i64>, NormalizeError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        Value::Bool(_) | Value::Null => None,
        Value::Array(_) | Value::Object(_) => {
            return Err(NormalizeError::InvalidId(render(value)));
        }
    };

    if parsed.is_none() {
        debug!(mnis_id = %render(value), "mnis_id is not an integer, leaving it unset");
    }
    Ok(parsed)
}

fn integral(n: f64) -> Option<i64> {
    (n.is_finite() && n.fract() == 0.0).then_some(n as i64)
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The whole row as a JSON object, nested values flattened to strings.
fn raw_json(row: &RawRow) -> String {
    let flat: Map<String, Value> = row
        .iter()
        .map(|(column, value)| {
            let value = match value {
                Value::Array(_) | Value::Object(_) => Value::String(value.to_string()),
                primitive => primitive.clone(),
            };
            (column.clone(), value)
        })
        .collect();
    Value::Object(flat).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> RawRow {
        match value {
            Value::Object(map) => map,
            _ => panic!("test rows must be objects"),
        }
    }

    fn donation() -> RawRow {
        row(json!({
            "member": "A",
            "party": "Independent",
            "mnis_id": 4001,
            "twfy_id": "uk.org.publicwhip/person/10001",
            "summary": "gift",
            "value": 100,
            "payer_name": "X",
            "received_date": "2024-01-01",
            "registered": "2024-01-15",
            "published": "2024-02-01",
        }))
    }

    #[test]
    fn same_row_hashes_the_same() {
        let a = normalize(&donation(), Category::Donations).unwrap();
        let b = normalize(&donation(), Category::Donations).unwrap();
        assert_eq!(a.hash, b.hash);
        assert_eq!(a, b);
        assert_eq!(a.hash.len(), 64);
    }

    #[test]
    fn hash_matches_delimited_fields() {
        let record = normalize(&donation(), Category::Donations).unwrap();
        let expected = format!(
            "{:x}",
            Sha256::digest("A|donations|gift|100|X|2024-01-01".as_bytes())
        );
        assert_eq!(record.hash, expected);
    }

    #[test]
    fn category_participates_in_identity() {
        let a = normalize(&donation(), Category::Donations).unwrap();
        let b = normalize(&donation(), Category::GiftsUk).unwrap();
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn integral_float_and_text_values_hash_identically() {
        let mut as_float = donation();
        as_float.insert("value".into(), json!(100.0));
        let mut as_text = donation();
        as_text.insert("value".into(), json!("£100"));

        let base = normalize(&donation(), Category::Donations).unwrap();
        assert_eq!(normalize(&as_float, Category::Donations).unwrap().hash, base.hash);
        assert_eq!(normalize(&as_text, Category::Donations).unwrap().hash, base.hash);
    }

    #[test]
    fn missing_value_and_payer_use_empty_placeholders() {
        let mut sparse = donation();
        sparse.remove("value");
        sparse.insert("payer_name".into(), Value::Null);

        let record = normalize(&sparse, Category::Donations).unwrap();
        assert_eq!(record.value, None);
        assert_eq!(record.payer_name, None);

        let expected = identity_hash(
            Some("A"),
            Category::Donations,
            Some("gift"),
            None,
            None,
            Some("2024-01-01"),
        );
        assert_eq!(record.hash, expected);
        assert_eq!(
            record.hash,
            format!("{:x}", Sha256::digest("A|donations|gift|||2024-01-01".as_bytes()))
        );
    }

    #[test]
    fn payer_falls_back_to_donor_name() {
        let mut donor = donation();
        donor.remove("payer_name");
        donor.insert("donor_name".into(), json!("Y Ltd"));

        let record = normalize(&donor, Category::Donations).unwrap();
        assert_eq!(record.payer_name.as_deref(), Some("Y Ltd"));
    }

    #[test]
    fn empty_payer_also_falls_back() {
        let mut donor = donation();
        donor.insert("payer_name".into(), json!("  "));
        donor.insert("donor_name".into(), json!("Y Ltd"));

        let record = normalize(&donor, Category::Donations).unwrap();
        assert_eq!(record.payer_name.as_deref(), Some("Y Ltd"));
    }

    #[test]
    fn custom_policy_reads_other_columns() {
        let mut renamed = donation();
        renamed.remove("member");
        renamed.insert("member_name".into(), json!("B"));

        let policy = FieldPolicy::default().with_candidates(Field::Member, &["member", "member_name"]);
        let record = policy.normalize(&renamed, Category::Donations).unwrap();
        assert_eq!(record.member.as_deref(), Some("B"));
    }

    #[test]
    fn textual_value_is_kept_and_hashed_as_text() {
        let mut vague = donation();
        vague.insert("value".into(), json!(" about fifty "));

        let record = normalize(&vague, Category::Donations).unwrap();
        assert_eq!(record.value, None);
        assert_eq!(
            record.hash,
            format!(
                "{:x}",
                Sha256::digest("A|donations|gift|about fifty|X|2024-01-01".as_bytes())
            )
        );
        let raw: Value = serde_json::from_str(&record.raw_json).unwrap();
        assert_eq!(raw["value"], json!(" about fifty "));

        let mut missing = donation();
        missing.remove("value");
        assert_ne!(normalize(&missing, Category::Donations).unwrap().hash, record.hash);
    }

    #[test]
    fn nested_value_is_malformed() {
        let mut bad = donation();
        bad.insert("value".into(), json!({"amount": 100}));
        assert_eq!(
            normalize(&bad, Category::Donations),
            Err(NormalizeError::InvalidValue(r#"{"amount":100}"#.into()))
        );
    }

    #[test]
    fn row_without_any_field_is_malformed() {
        let blank = row(json!({"member": "", "summary": null, "notes": "x"}));
        assert_eq!(normalize(&blank, Category::Donations), Err(NormalizeError::EmptyRow));
    }

    #[test]
    fn integral_float_id_is_accepted() {
        let mut float_id = donation();
        float_id.insert("mnis_id".into(), json!(4001.0));
        assert_eq!(normalize(&float_id, Category::Donations).unwrap().mnis_id, Some(4001));

        float_id.insert("mnis_id".into(), json!("n/a"));
        let record = normalize(&float_id, Category::Donations).unwrap();
        assert_eq!(record.mnis_id, None);
        let raw: Value = serde_json::from_str(&record.raw_json).unwrap();
        assert_eq!(raw["mnis_id"], json!("n/a"));
    }

    #[test]
    fn negative_zero_hashes_like_zero() {
        assert_eq!(canonical_number(-0.0), "0");

        let mut zero = donation();
        zero.insert("value".into(), json!(0));
        let mut negative = donation();
        negative.insert("value".into(), json!("-0"));
        assert_eq!(
            normalize(&zero, Category::Donations).unwrap().hash,
            normalize(&negative, Category::Donations).unwrap().hash
        );
    }

    #[test]
    fn raw_json_keeps_every_column() {
        let mut extra = donation();
        extra.insert("notes".into(), json!(["a", "b"]));

        let record = normalize(&extra, Category::Donations).unwrap();
        let parsed: Value = serde_json::from_str(&record.raw_json).unwrap();
        assert_eq!(parsed["published"], json!("2024-02-01"));
        assert_eq!(parsed["mnis_id"], json!(4001));
        assert_eq!(parsed["notes"], json!(r#"["a","b"]"#));
    }

    #[test]
    fn identity_ignores_non_key_fields() {
        let mut republished = donation();
        republished.insert("published".into(), json!("2024-03-01"));
        republished.insert("party".into(), json!("Labour"));

        let a = normalize(&donation(), Category::Donations).unwrap();
        let b = normalize(&republished, Category::Donations).unwrap();
        assert_eq!(a.hash, b.hash);
        assert_ne!(a.raw_json, b.raw_json);
    }
}
