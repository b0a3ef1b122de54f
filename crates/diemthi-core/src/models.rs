//! Domain models for exam results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Inclusive upper bound of a subject score.
pub const MAX_SCORE: f64 = 10.0;

/// Inclusive lower bound of a subject score.
pub const MIN_SCORE: f64 = 0.0;

/// One of the nine examined subjects.
///
/// The string form of a subject is both its CSV header and its column name
/// in the `students` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    Toan,
    NguVan,
    NgoaiNgu,
    VatLi,
    HoaHoc,
    SinhHoc,
    LichSu,
    DiaLi,
    Gdcd,
}

impl Subject {
    /// All subjects in table column order.
    pub const ALL: [Subject; 9] = [
        Subject::Toan,
        Subject::NguVan,
        Subject::NgoaiNgu,
        Subject::VatLi,
        Subject::HoaHoc,
        Subject::SinhHoc,
        Subject::LichSu,
        Subject::DiaLi,
        Subject::Gdcd,
    ];

    /// Column name. Always a static literal, so it is safe to splice into SQL.
    pub fn column(&self) -> &'static str {
        match self {
            Subject::Toan => "toan",
            Subject::NguVan => "ngu_van",
            Subject::NgoaiNgu => "ngoai_ngu",
            Subject::VatLi => "vat_li",
            Subject::HoaHoc => "hoa_hoc",
            Subject::SinhHoc => "sinh_hoc",
            Subject::LichSu => "lich_su",
            Subject::DiaLi => "dia_li",
            Subject::Gdcd => "gdcd",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Subject {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Subject::ALL
            .into_iter()
            .find(|subject| subject.column() == key)
            .ok_or_else(|| AppError::InvalidSubject(s.to_string()))
    }
}

/// Exam subject combination used for university admission ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Group {
    A,
    A1,
    B,
    C,
    D,
}

impl Group {
    pub const ALL: [Group; 5] = [Group::A, Group::A1, Group::B, Group::C, Group::D];

    /// The three subjects whose scores are summed for this group.
    pub fn subjects(&self) -> [Subject; 3] {
        match self {
            Group::A => [Subject::Toan, Subject::VatLi, Subject::HoaHoc],
            Group::A1 => [Subject::Toan, Subject::VatLi, Subject::NgoaiNgu],
            Group::B => [Subject::Toan, Subject::HoaHoc, Subject::SinhHoc],
            Group::C => [Subject::NguVan, Subject::LichSu, Subject::DiaLi],
            Group::D => [Subject::Toan, Subject::NguVan, Subject::NgoaiNgu],
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Group::A => "A",
            Group::A1 => "A1",
            Group::B => "B",
            Group::C => "C",
            Group::D => "D",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Group {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_uppercase();
        Group::ALL
            .into_iter()
            .find(|group| group.code() == key)
            .ok_or_else(|| AppError::InvalidGroup(s.to_string()))
    }
}

/// Score band used by the level distribution report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreLevel {
    /// score >= 8
    Excellent,
    /// 6 <= score < 8
    Good,
    /// 4 <= score < 6
    Average,
    /// score < 4
    Weak,
}

impl ScoreLevel {
    pub fn of(score: f64) -> Self {
        if score >= 8.0 {
            ScoreLevel::Excellent
        } else if score >= 6.0 {
            ScoreLevel::Good
        } else if score >= 4.0 {
            ScoreLevel::Average
        } else {
            ScoreLevel::Weak
        }
    }
}

/// Exam results of one candidate, keyed by registration number (`sbd`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StudentRecord {
    pub sbd: String,
    pub toan: Option<f64>,
    pub ngu_van: Option<f64>,
    pub ngoai_ngu: Option<f64>,
    pub vat_li: Option<f64>,
    pub hoa_hoc: Option<f64>,
    pub sinh_hoc: Option<f64>,
    pub lich_su: Option<f64>,
    pub dia_li: Option<f64>,
    pub gdcd: Option<f64>,
    pub ma_ngoai_ngu: Option<String>,
}

impl StudentRecord {
    /// Creates a record with no scores and no language code.
    pub fn new(sbd: impl Into<String>) -> Self {
        Self {
            sbd: sbd.into(),
            toan: None,
            ngu_van: None,
            ngoai_ngu: None,
            vat_li: None,
            hoa_hoc: None,
            sinh_hoc: None,
            lich_su: None,
            dia_li: None,
            gdcd: None,
            ma_ngoai_ngu: None,
        }
    }

    pub fn score(&self, subject: Subject) -> Option<f64> {
        *self.score_slot(subject)
    }

    pub fn set_score(&mut self, subject: Subject, score: Option<f64>) {
        *self.score_slot_mut(subject) = score;
    }

    /// Builder-style variant of [`set_score`](Self::set_score).
    pub fn with_score(mut self, subject: Subject, score: f64) -> Self {
        self.set_score(subject, Some(score));
        self
    }

    pub fn with_language(mut self, code: impl Into<String>) -> Self {
        self.ma_ngoai_ngu = Some(code.into());
        self
    }

    /// Iterates the nine scores in table column order.
    pub fn scores(&self) -> impl Iterator<Item = (Subject, Option<f64>)> + '_ {
        Subject::ALL.into_iter().map(|s| (s, self.score(s)))
    }

    /// Sum of the group's three scores, or None if any of them is missing.
    pub fn group_total(&self, group: Group) -> Option<f64> {
        group
            .subjects()
            .into_iter()
            .map(|s| self.score(s))
            .sum::<Option<f64>>()
    }

    fn score_slot(&self, subject: Subject) -> &Option<f64> {
        match subject {
            Subject::Toan => &self.toan,
            Subject::NguVan => &self.ngu_van,
            Subject::NgoaiNgu => &self.ngoai_ngu,
            Subject::VatLi => &self.vat_li,
            Subject::HoaHoc => &self.hoa_hoc,
            Subject::SinhHoc => &self.sinh_hoc,
            Subject::LichSu => &self.lich_su,
            Subject::DiaLi => &self.dia_li,
            Subject::Gdcd => &self.gdcd,
        }
    }

    fn score_slot_mut(&mut self, subject: Subject) -> &mut Option<f64> {
        match subject {
            Subject::Toan => &mut self.toan,
            Subject::NguVan => &mut self.ngu_van,
            Subject::NgoaiNgu => &mut self.ngoai_ngu,
            Subject::VatLi => &mut self.vat_li,
            Subject::HoaHoc => &mut self.hoa_hoc,
            Subject::SinhHoc => &mut self.sinh_hoc,
            Subject::LichSu => &mut self.lich_su,
            Subject::DiaLi => &mut self.dia_li,
            Subject::Gdcd => &mut self.gdcd,
        }
    }
}

/// A student together with a group total, as returned by ranking queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedStudent {
    pub student: StudentRecord,
    pub total: f64,
}

/// Number of candidates per score level for one subject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LevelCounts {
    pub excellent: i64,
    pub good: i64,
    pub average: i64,
    pub weak: i64,
}

impl LevelCounts {
    pub fn record(&mut self, level: ScoreLevel) {
        match level {
            ScoreLevel::Excellent => self.excellent += 1,
            ScoreLevel::Good => self.good += 1,
            ScoreLevel::Average => self.average += 1,
            ScoreLevel::Weak => self.weak += 1,
        }
    }

    pub fn total(&self) -> i64 {
        self.excellent + self.good + self.average + self.weak
    }
}
