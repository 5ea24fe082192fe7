use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    ops::{BitAnd, BitOr, BitOrAssign},
    str::FromStr,
};

/// Represents the days of the week a class section meets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct DaySet(u8);

impl DaySet {
    // Constants for individual days
    pub const SUNDAY: Self = DaySet(1 << 0);
    pub const MONDAY: Self = DaySet(1 << 1);
    pub const TUESDAY: Self = DaySet(1 << 2);
    pub const WEDNESDAY: Self = DaySet(1 << 3);
    pub const THURSDAY: Self = DaySet(1 << 4);
    pub const FRIDAY: Self = DaySet(1 << 5);
    pub const SATURDAY: Self = DaySet(1 << 6);

    pub const NONE: Self = DaySet(0);

    /// Day-to-token mapping used by the schedule listing, in week order
    const DAY_TOKENS: [(Self, &'static str); 7] = [
        (Self::SUNDAY, "Su"),
        (Self::MONDAY, "M"),
        (Self::TUESDAY, "Tu"),
        (Self::WEDNESDAY, "W"),
        (Self::THURSDAY, "Th"),
        (Self::FRIDAY, "F"),
        (Self::SATURDAY, "Sa"),
    ];

    pub fn new() -> Self {
        Self::NONE
    }

    pub fn contains(self, day: Self) -> bool {
        (self & day) == day
    }

    pub fn add(&mut self, day: Self) {
        *self |= day;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of distinct meeting days
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }
}

impl FromStr for DaySet {
    type Err = ();

    /// Tokens are an uppercase letter optionally followed by one lowercase
    /// letter (`MWF`, `TuTh`, `SuSa`). Unrecognised tokens are ignored.
    fn from_str(days: &str) -> Result<Self, Self::Err> {
        let mut result = Self::NONE;
        let mut chars = days.chars().peekable();

        while let Some(c) = chars.next() {
            if !c.is_ascii_uppercase() {
                continue;
            }

            let mut token = String::from(c);
            if let Some(&next) = chars.peek()
                && next.is_ascii_lowercase()
            {
                token.push(next);
                chars.next();
            }

            if let Some(&(day, _)) = Self::DAY_TOKENS.iter().find(|(_, t)| *t == token) {
                result |= day;
            }
        }

        Ok(result)
    }
}

impl Display for DaySet {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for &(day, token) in &Self::DAY_TOKENS {
            if self.contains(day) {
                f.write_str(token)?;
            }
        }

        Ok(())
    }
}

impl Serialize for DaySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DaySet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let days = String::deserialize(deserializer)?;
        Ok(Self::from_str(&days).unwrap_or_default())
    }
}

// Bitwise operators
impl BitOr for DaySet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        DaySet(self.0 | rhs.0)
    }
}

impl BitAnd for DaySet {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        DaySet(self.0 & rhs.0)
    }
}

impl BitOrAssign for DaySet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
