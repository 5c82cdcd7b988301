// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Report codes.
//!
//! Every work report carries a human-readable code of the form
//! `SEQ/PEP82600/YEAR-SO`, e.g. `007/PEP82600/2025-SO`. The sequence is the
//! only part an operator chooses; facility and suffix are constant and the
//! year is taken from the calendar.
//!
//! Parsing is strict. A full code must match `^\d{3}/PEP82600/\d{4}-SO$` and
//! its sequence must lie in `1..=999`. Anything else is rejected as
//! `DomainError::MalformedCode` before any uniqueness check happens.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The facility segment shared by every report code.
pub const FACILITY: &str = "PEP82600";

/// The trailing suffix shared by every report code.
pub const SUFFIX: &str = "SO";

/// Smallest sequence number that may be assigned.
pub const MIN_SEQUENCE: u16 = 1;

/// Largest sequence number that may be assigned.
pub const MAX_SEQUENCE: u16 = 999;

/// The numeric part of a report code, always in `1..=999`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Sequence(u16);

impl Sequence {
    /// Creates a sequence from its numeric value.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::MalformedCode` if `value` is outside `1..=999`.
    pub fn new(value: u16) -> Result<Self, DomainError> {
        if (MIN_SEQUENCE..=MAX_SEQUENCE).contains(&value) {
            Ok(Self(value))
        } else {
            Err(DomainError::MalformedCode {
                input: value.to_string(),
                reason: "sequence must be between 001 and 999",
            })
        }
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Iterates every valid sequence in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (MIN_SEQUENCE..=MAX_SEQUENCE).map(Self)
    }
}

impl FromStr for Sequence {
    type Err = DomainError;

    /// Parses the 3-digit numeral form (`"007"`).
    ///
    /// Exactly three ASCII digits are accepted. `"7"`, `"0007"`, `" 07"` and
    /// `"000"` are all rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 3 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::MalformedCode {
                input: s.to_string(),
                reason: "sequence must be exactly 3 digits",
            });
        }
        let value: u16 = s.parse().map_err(|_| DomainError::MalformedCode {
            input: s.to_string(),
            reason: "sequence must be exactly 3 digits",
        })?;
        Self::new(value).map_err(|_| DomainError::MalformedCode {
            input: s.to_string(),
            reason: "sequence must be between 001 and 999",
        })
    }
}

impl TryFrom<u16> for Sequence {
    type Error = DomainError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Sequence> for u16 {
    fn from(sequence: Sequence) -> Self {
        sequence.0
    }
}

impl std::fmt::Display for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

/// The year part of a report code, rendered as four digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct CodeYear(u16);

impl CodeYear {
    /// Creates a code year.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::MalformedCode` if the year has more than four digits.
    pub fn new(year: u16) -> Result<Self, DomainError> {
        if year <= 9999 {
            Ok(Self(year))
        } else {
            Err(DomainError::MalformedCode {
                input: year.to_string(),
                reason: "year must be 4 digits",
            })
        }
    }

    /// Returns the calendar year of a date as a code year.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::MalformedCode` for years outside `0..=9999`.
    pub fn from_date(date: time::Date) -> Result<Self, DomainError> {
        let year: i32 = date.year();
        let year: u16 = u16::try_from(year).map_err(|_| DomainError::MalformedCode {
            input: year.to_string(),
            reason: "year must be 4 digits",
        })?;
        Self::new(year)
    }

    /// Returns the numeric year.
    #[must_use]
    pub const fn value(self) -> u16 {
        self.0
    }
}

impl FromStr for CodeYear {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::MalformedCode {
                input: s.to_string(),
                reason: "year must be 4 digits",
            });
        }
        let year: u16 = s.parse().map_err(|_| DomainError::MalformedCode {
            input: s.to_string(),
            reason: "year must be 4 digits",
        })?;
        Self::new(year)
    }
}

impl TryFrom<u16> for CodeYear {
    type Error = DomainError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CodeYear> for u16 {
    fn from(year: CodeYear) -> Self {
        year.0
    }
}

impl std::fmt::Display for CodeYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

/// A complete report code: `{sequence:03}/PEP82600/{year:04}-SO`.
///
/// Facility and suffix are not stored; they are constant for every code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReportCode {
    year: CodeYear,
    sequence: Sequence,
}

impl ReportCode {
    /// Creates a code from its parts.
    #[must_use]
    pub const fn new(sequence: Sequence, year: CodeYear) -> Self {
        Self { year, sequence }
    }

    /// Returns the sequence part.
    #[must_use]
    pub const fn sequence(&self) -> Sequence {
        self.sequence
    }

    /// Returns the year part.
    #[must_use]
    pub const fn year(&self) -> CodeYear {
        self.year
    }
}

impl std::fmt::Display for ReportCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{FACILITY}/{}-{SUFFIX}", self.sequence, self.year)
    }
}

impl FromStr for ReportCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &'static str| DomainError::MalformedCode {
            input: s.to_string(),
            reason,
        };

        let (sequence, rest) = s
            .split_once('/')
            .ok_or_else(|| malformed("expected SEQ/PEP82600/YEAR-SO"))?;
        let (facility, rest) = rest
            .split_once('/')
            .ok_or_else(|| malformed("expected SEQ/PEP82600/YEAR-SO"))?;
        if facility != FACILITY {
            return Err(malformed("facility must be PEP82600"));
        }
        let (year, suffix) = rest
            .split_once('-')
            .ok_or_else(|| malformed("expected SEQ/PEP82600/YEAR-SO"))?;
        if suffix != SUFFIX {
            return Err(malformed("suffix must be SO"));
        }

        let sequence: Sequence = sequence.parse().map_err(|e| match e {
            DomainError::MalformedCode { reason, .. } => malformed(reason),
            _ => malformed("invalid sequence"),
        })?;
        let year: CodeYear = year.parse().map_err(|e| match e {
            DomainError::MalformedCode { reason, .. } => malformed(reason),
            _ => malformed("invalid year"),
        })?;

        Ok(Self::new(sequence, year))
    }
}

impl TryFrom<String> for ReportCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReportCode> for String {
    fn from(code: ReportCode) -> Self {
        code.to_string()
    }
}
