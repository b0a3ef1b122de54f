//! Row normalization: raw CSV cells to typed [`StudentRecord`]s.
//!
//! Columns are resolved through a fixed table of canonical names and accepted
//! aliases. Header cells are compared after [`normalize_header`], so exports
//! that wrap header names in stray quotes or carry a byte-order mark still
//! match.
//!
//! Normalization is a pure function of the row and the [`ScoreRangePolicy`]:
//! the same row always yields the same record or the same [`SkipReason`].

use std::collections::HashMap;

use csv::StringRecord;
use serde::Serialize;

use crate::config::ScoreRangePolicy;
use crate::error::AppError;
use crate::models::{MAX_SCORE, MIN_SCORE, StudentRecord, Subject};

/// A column the normalizer knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Sbd,
    Score(Subject),
    LanguageCode,
}

/// Canonical column name first, then accepted aliases.
const FIELD_NAMES: &[(Field, &[&str])] = &[
    (Field::Sbd, &["sbd", "so_bao_danh", "registration_number"]),
    (Field::Score(Subject::Toan), &["toan"]),
    (Field::Score(Subject::NguVan), &["ngu_van"]),
    (Field::Score(Subject::NgoaiNgu), &["ngoai_ngu"]),
    (Field::Score(Subject::VatLi), &["vat_li", "vat_ly"]),
    (Field::Score(Subject::HoaHoc), &["hoa_hoc"]),
    (Field::Score(Subject::SinhHoc), &["sinh_hoc"]),
    (Field::Score(Subject::LichSu), &["lich_su"]),
    (Field::Score(Subject::DiaLi), &["dia_li", "dia_ly"]),
    (Field::Score(Subject::Gdcd), &["gdcd"]),
    (Field::LanguageCode, &["ma_ngoai_ngu"]),
];

impl Field {
    /// Canonical name followed by aliases.
    pub fn names(&self) -> &'static [&'static str] {
        FIELD_NAMES
            .iter()
            .find(|(field, _)| field == self)
            .map(|(_, names)| *names)
            .unwrap_or(&[])
    }

    /// Resolves a raw header cell to a field.
    pub fn from_header(header: &str) -> Option<Field> {
        let key = normalize_header(header);
        FIELD_NAMES
            .iter()
            .find(|(_, names)| names.contains(&key.as_str()))
            .map(|(field, _)| *field)
    }
}

/// Trims a header cell, drops quote and BOM characters, and lowercases it.
pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | '\u{FEFF}'))
        .collect::<String>()
        .trim()
        .to_lowercase()
}

/// Why a row was not imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Registration number absent or blank.
    MissingId,
    /// A score fell outside `[0, 10]` under [`ScoreRangePolicy::Reject`].
    ScoreOutOfRange,
    /// The CSV reader could not decode the row.
    Malformed,
}

/// Per-reason skip counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkipTally {
    pub missing_id: u64,
    pub score_out_of_range: u64,
    pub malformed: u64,
}

impl SkipTally {
    pub fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::MissingId => self.missing_id += 1,
            SkipReason::ScoreOutOfRange => self.score_out_of_range += 1,
            SkipReason::Malformed => self.malformed += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.missing_id + self.score_out_of_range + self.malformed
    }
}

/// Anything the normalizer can read named fields from.
pub trait FieldSource {
    /// Raw cell value for a field, or None if the column is absent.
    fn field(&self, field: Field) -> Option<&str>;
}

/// Open-ended string mapping, as produced by generic CSV-to-map readers.
///
/// When several keys name the same field, the earliest name in
/// [`Field::names`] wins. Keys that normalize to the same name resolve to the
/// lexicographically smallest raw key.
impl FieldSource for HashMap<String, String> {
    fn field(&self, field: Field) -> Option<&str> {
        field.names().iter().find_map(|name| {
            self.iter()
                .filter(|(key, _)| normalize_header(key) == *name)
                .min_by(|(a, _), (b, _)| a.cmp(b))
                .map(|(_, value)| value.as_str())
        })
    }
}

/// Positions of known fields within a CSV header.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    positions: HashMap<Field, usize>,
}

impl ColumnMap {
    /// Resolves every header cell once. The first column matching a field wins.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::MissingIdColumn`] when no cell names the
    /// registration number.
    pub fn from_headers(headers: &StringRecord) -> Result<Self, AppError> {
        let mut positions = HashMap::new();
        for (index, header) in headers.iter().enumerate() {
            if let Some(field) = Field::from_header(header) {
                positions.entry(field).or_insert(index);
            }
        }

        if !positions.contains_key(&Field::Sbd) {
            return Err(AppError::MissingIdColumn(Field::Sbd.names().join(", ")));
        }

        Ok(Self { positions })
    }

    pub fn position(&self, field: Field) -> Option<usize> {
        self.positions.get(&field).copied()
    }

    /// Pairs this map with one data row.
    pub fn bind<'a>(&'a self, record: &'a StringRecord) -> MappedRow<'a> {
        MappedRow {
            columns: self,
            record,
        }
    }
}

/// A CSV data row viewed through a [`ColumnMap`].
pub struct MappedRow<'a> {
    columns: &'a ColumnMap,
    record: &'a StringRecord,
}

impl FieldSource for MappedRow<'_> {
    fn field(&self, field: Field) -> Option<&str> {
        self.columns
            .position(field)
            .and_then(|index| self.record.get(index))
    }
}

/// Parses a score cell.
///
/// Blank, missing, non-numeric, and non-finite cells become `None`.
///
/// # Examples
///
/// ```
/// use diemthi_core::normalize::parse_nullable_float;
///
/// assert_eq!(parse_nullable_float(Some("7.5")), Some(7.5));
/// assert_eq!(parse_nullable_float(Some("10")), Some(10.0));
/// assert_eq!(parse_nullable_float(Some("abc")), None);
/// assert_eq!(parse_nullable_float(Some("")), None);
/// assert_eq!(parse_nullable_float(None), None);
/// ```
pub fn parse_nullable_float(value: Option<&str>) -> Option<f64> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn parse_nullable_string(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Converts one row into a [`StudentRecord`].
///
/// # Errors
///
/// - [`SkipReason::MissingId`] if the registration number is absent or blank.
/// - [`SkipReason::ScoreOutOfRange`] if a score is outside `[0, 10]` and the
///   policy is [`ScoreRangePolicy::Reject`].
pub fn normalize<R: FieldSource + ?Sized>(
    row: &R,
    policy: ScoreRangePolicy,
) -> Result<StudentRecord, SkipReason> {
    let sbd = row
        .field(Field::Sbd)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(SkipReason::MissingId)?;

    let mut record = StudentRecord::new(sbd);
    for subject in Subject::ALL {
        let score = match parse_nullable_float(row.field(Field::Score(subject))) {
            Some(v) if !(MIN_SCORE..=MAX_SCORE).contains(&v) => match policy {
                ScoreRangePolicy::PassThrough => Some(v),
                ScoreRangePolicy::Clamp => Some(v.clamp(MIN_SCORE, MAX_SCORE)),
                ScoreRangePolicy::Reject => return Err(SkipReason::ScoreOutOfRange),
            },
            other => other,
        };
        record.set_score(subject, score);
    }
    record.ma_ngoai_ngu = parse_nullable_string(row.field(Field::LanguageCode));

    Ok(record)
}
