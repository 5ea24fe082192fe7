use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};
use strum::{AsRefStr, EnumIter, EnumProperty, EnumString, IntoEnumIterator};

/// The quarters of an academic year, identified by the suffix of a term code.
///
/// Variants are declared in calendar order so that terms sort chronologically.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumString,
    EnumIter,
    AsRefStr,
    EnumProperty,
)]
pub enum Quarter {
    #[strum(serialize = "03", props(letter = "W"))]
    Winter,
    #[strum(serialize = "14", props(letter = "S"))]
    Spring,
    #[strum(serialize = "92", props(letter = "F"))]
    Fall,
}

impl Quarter {
    /// The two-digit term code suffix
    pub fn code(&self) -> &str {
        self.as_ref()
    }

    /// Single letter used when summarising the terms a course is offered
    pub fn letter(&self) -> &'static str {
        self.get_str("letter").unwrap_or_default()
    }

    pub fn all() -> Vec<Quarter> {
        Quarter::iter().collect()
    }

    /// The calendar year in which the next occurrence of this quarter falls.
    ///
    /// Fall always belongs to the current calendar year; once July arrives the
    /// upcoming Winter and Spring quarters belong to the following year.
    pub fn upcoming_year(&self, today: NaiveDate) -> i32 {
        match self {
            Quarter::Fall => today.year(),
            Quarter::Winter | Quarter::Spring if today.month() > 6 => today.year() + 1,
            Quarter::Winter | Quarter::Spring => today.year(),
        }
    }
}

/// Error returned when a term code is not `YYYY-SS` with a recognised suffix
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseTermError {
    InvalidLength,
    InvalidYear,
    UnknownQuarter(String),
}

impl Display for ParseTermError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::InvalidLength => write!(f, "Term code must be a 4-digit year and 2-digit suffix"),
            Self::InvalidYear => write!(f, "Term code does not start with a 4-digit year"),
            Self::UnknownQuarter(suffix) => write!(f, "Unknown quarter suffix: {suffix}"),
        }
    }
}

impl std::error::Error for ParseTermError {}

/// An academic term such as `2017-92` (Fall 2017)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Term {
    pub year: u16,
    pub quarter: Quarter,
}

impl Term {
    pub fn new(year: u16, quarter: Quarter) -> Self {
        Self { year, quarter }
    }

    pub fn fall(year: u16) -> Self {
        Self::new(year, Quarter::Fall)
    }

    pub fn winter(year: u16) -> Self {
        Self::new(year, Quarter::Winter)
    }

    pub fn spring(year: u16) -> Self {
        Self::new(year, Quarter::Spring)
    }

    pub fn is_fall(&self) -> bool {
        self.quarter == Quarter::Fall
    }

    pub fn is_winter(&self) -> bool {
        self.quarter == Quarter::Winter
    }

    pub fn is_spring(&self) -> bool {
        self.quarter == Quarter::Spring
    }

    /// Whether `code` names one of the three regular academic quarters
    pub fn is_academic(code: &str) -> bool {
        code.parse::<Term>().is_ok()
    }
}

impl FromStr for Term {
    type Err = ParseTermError;

    /// Accepts `2017-92` as well as the undelimited `201792`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (year, suffix) = match s.len() {
            7 if s.as_bytes()[4] == b'-' => (&s[..4], &s[5..]),
            6 if s.is_ascii() => (&s[..4], &s[4..]),
            _ => return Err(ParseTermError::InvalidLength),
        };

        if !year.chars().all(|c| c.is_ascii_digit()) {
            return Err(ParseTermError::InvalidYear);
        }
        let year = year.parse().map_err(|_| ParseTermError::InvalidYear)?;

        let quarter = Quarter::from_str(suffix)
            .map_err(|_| ParseTermError::UnknownQuarter(suffix.to_string()))?;

        Ok(Self { year, quarter })
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{:04}-{}", self.year, self.quarter.code())
    }
}

impl Serialize for Term {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Term {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        code.parse().map_err(serde::de::Error::custom)
    }
}

/// The calendar year in which the academic year containing `today` began
pub fn academic_year(today: NaiveDate) -> i32 {
    if today.month() <= 6 {
        today.year() - 1
    } else {
        today.year()
    }
}

/// The three quarters of the academic year containing `today`, most recent first
pub fn academic_terms(today: NaiveDate) -> Vec<Term> {
    let start = academic_year(today) as u16;
    let mut terms = vec![
        Term::fall(start),
        Term::winter(start + 1),
        Term::spring(start + 1),
    ];
    sort_recent_first(&mut terms);
    terms
}

/// Orders terms reverse-chronologically
pub fn sort_recent_first(terms: &mut [Term]) {
    terms.sort_by(|a, b| b.cmp(a));
}
