#![deny(unsafe_code)]

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ModelError, Result};
use crate::ids::{RowId, UserId};

/// Descriptive (text) columns of a row, in schema order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextField {
    Thematique,
    Origine,
    Difficulte,
    Synthese,
    Nature,
    Estimation,
    EstimationComment,
}

impl TextField {
    pub const ALL: [TextField; 7] = [
        Self::Thematique,
        Self::Origine,
        Self::Difficulte,
        Self::Synthese,
        Self::Nature,
        Self::Estimation,
        Self::EstimationComment,
    ];

    /// Document key of the column.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Thematique => "thematique",
            Self::Origine => "origine",
            Self::Difficulte => "difficulte",
            Self::Synthese => "synthese",
            Self::Nature => "nature",
            Self::Estimation => "estimation",
            Self::EstimationComment => "estimationComment",
        }
    }
}

impl fmt::Display for TextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for TextField {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|field| field.key().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ModelError::UnknownField(s.to_string()))
    }
}

/// One unit of work in a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub id: RowId,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub thematique: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub origine: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub difficulte: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub synthese: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub nature: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub estimation: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub estimation_comment: String,
    #[serde(default, deserialize_with = "lenient_slots")]
    pub contributions: Vec<u64>,
    #[serde(default)]
    pub comments: BTreeMap<UserId, String>,
}

impl Row {
    /// Blank row with a zeroed contribution vector of `team_count` slots.
    pub fn new(id: RowId, thematique: impl Into<String>, team_count: usize) -> Self {
        Self {
            id,
            thematique: thematique.into(),
            origine: String::new(),
            difficulte: String::new(),
            synthese: String::new(),
            nature: String::new(),
            estimation: String::new(),
            estimation_comment: String::new(),
            contributions: vec![0; team_count],
            comments: BTreeMap::new(),
        }
    }

    pub fn text(&self, field: TextField) -> &str {
        match field {
            TextField::Thematique => &self.thematique,
            TextField::Origine => &self.origine,
            TextField::Difficulte => &self.difficulte,
            TextField::Synthese => &self.synthese,
            TextField::Nature => &self.nature,
            TextField::Estimation => &self.estimation,
            TextField::EstimationComment => &self.estimation_comment,
        }
    }

    pub fn text_mut(&mut self, field: TextField) -> &mut String {
        match field {
            TextField::Thematique => &mut self.thematique,
            TextField::Origine => &mut self.origine,
            TextField::Difficulte => &mut self.difficulte,
            TextField::Synthese => &mut self.synthese,
            TextField::Nature => &mut self.nature,
            TextField::Estimation => &mut self.estimation,
            TextField::EstimationComment => &mut self.estimation_comment,
        }
    }

    /// Value of a slot; missing slots read as zero.
    pub fn slot(&self, slot: usize) -> u64 {
        self.contributions.get(slot).copied().unwrap_or(0)
    }

    /// Sum of every contribution slot, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.contributions
            .iter()
            .fold(0u64, |total, value| total.saturating_add(*value))
    }

    /// Pads or truncates the contribution vector to the roster size.
    pub fn fit_to_roster(&mut self, team_count: usize) {
        self.contributions.resize(team_count, 0);
    }
}

impl AsRef<Row> for Row {
    fn as_ref(&self) -> &Row {
        self
    }
}

/// Parses a contribution typed at the edit boundary.
///
/// Accepts whole, non-negative numbers only; surrounding whitespace is ignored
/// and an empty input reads as zero.
pub fn parse_contribution(raw: &str) -> Result<u64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    if let Ok(value) = trimmed.parse::<u64>() {
        return Ok(value);
    }
    if trimmed
        .parse::<i64>()
        .is_ok_and(|value| value < 0)
        || trimmed.parse::<f64>().is_ok_and(|value| value < 0.0)
    {
        return Err(ModelError::NegativeContribution {
            raw: raw.to_string(),
        });
    }
    Err(ModelError::NotANumber {
        raw: raw.to_string(),
    })
}

/// Coerces one stored slot value to a number; anything unusable reads as 0.
pub fn coerce_slot(value: &serde_json::Value) -> u64 {
    match value {
        serde_json::Value::Number(number) => number
            .as_u64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|v| v.is_finite() && *v > 0.0)
                    .map(|v| v.trunc() as u64)
            })
            .unwrap_or(0),
        serde_json::Value::String(text) => {
            let text = text.trim();
            text.parse::<u64>()
                .ok()
                .or_else(|| {
                    text.parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite() && *v > 0.0)
                        .map(|v| v.trunc() as u64)
                })
                .unwrap_or(0)
        }
        serde_json::Value::Bool(true) => 1,
        _ => 0,
    }
}

fn lenient_slots<'de, D>(deserializer: D) -> std::result::Result<Vec<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?;
    Ok(values
        .unwrap_or_default()
        .iter()
        .map(coerce_slot)
        .collect())
}

fn text_or_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) | Some(serde_json::Value::Bool(false)) => {
            String::new()
        }
        Some(serde_json::Value::String(text)) => text,
        Some(other) => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_contribution_accepts_whole_numbers() {
        assert_eq!(parse_contribution(" 12 "), Ok(12));
        assert_eq!(parse_contribution(""), Ok(0));
    }

    #[test]
    fn parse_contribution_rejects_negative_and_garbage() {
        assert!(matches!(
            parse_contribution("-3"),
            Err(ModelError::NegativeContribution { .. })
        ));
        assert!(matches!(
            parse_contribution("-0.5"),
            Err(ModelError::NegativeContribution { .. })
        ));
        assert!(matches!(
            parse_contribution("abc"),
            Err(ModelError::NotANumber { .. })
        ));
        assert!(matches!(
            parse_contribution("1.5"),
            Err(ModelError::NotANumber { .. })
        ));
    }

    #[test]
    fn total_saturates() {
        let mut row = Row::new(RowId::new(1), "A", 3);
        row.contributions = vec![u64::MAX, 1, 2];
        assert_eq!(row.total(), u64::MAX);
        row.contributions = vec![4, 0, 5];
        assert_eq!(row.total(), 9);
    }

    #[test]
    fn stored_rows_are_decoded_leniently() {
        let row: Row = serde_json::from_value(json!({
            "id": 4,
            "thematique": "Energie",
            "origine": null,
            "contributions": [1, "2", "x", -4, 2.7, null],
        }))
        .unwrap();
        assert_eq!(row.origine, "");
        assert_eq!(row.contributions, vec![1, 2, 0, 0, 2, 0]);
        assert!(row.comments.is_empty());
    }

    #[test]
    fn row_serializes_with_camel_case_keys() {
        let mut row = Row::new(RowId::new(1), "A", 2);
        row.estimation_comment = "rough".to_string();
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["estimationComment"], "rough");
        assert_eq!(value["contributions"], json!([0, 0]));
    }

    #[test]
    fn text_field_round_trips_through_its_key() {
        for field in TextField::ALL {
            assert_eq!(field.key().parse::<TextField>(), Ok(field));
        }
        assert!("budget".parse::<TextField>().is_err());
    }
}
