// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::code::{CodeYear, ReportCode, Sequence};

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// A report code or one of its components does not match the format contract.
    MalformedCode {
        /// The rejected input.
        input: String,
        /// Which part of the contract was violated.
        reason: &'static str,
    },
    /// The sequence is already used by another report in scope.
    DuplicateCode {
        /// The conflicting sequence.
        sequence: Sequence,
        /// The year scope of the check, `None` when all years were checked.
        year: Option<CodeYear>,
        /// Title of the report that already owns the sequence.
        conflicting_report_title: String,
    },
    /// Every sequence in `[1, 999]` is taken within the scope.
    CodesExhausted {
        /// The year scope, `None` when all years were checked.
        year: Option<CodeYear>,
    },
    /// Report title is empty.
    InvalidTitle(String),
    /// Report description is too short.
    InvalidDescription(String),
    /// Worker count is below the minimum.
    InvalidWorkerCount(u32),
    /// No responsible person was named.
    MissingResponsiblePerson,
    /// Location name is empty.
    InvalidLocation(String),
    /// Latitude or longitude is outside the valid range.
    InvalidCoordinates {
        /// The latitude, if provided.
        latitude: Option<f64>,
        /// The longitude, if provided.
        longitude: Option<f64>,
    },
    /// End date is before the start date.
    InvalidDateRange {
        /// The start date.
        start_date: time::Date,
        /// The end date.
        end_date: time::Date,
    },
    /// Progress is outside `0..=100`.
    InvalidProgress(u8),
    /// A closed enumeration received an unknown value.
    InvalidEnumValue {
        /// The enumeration name (e.g. "status").
        kind: &'static str,
        /// The rejected value.
        value: String,
    },
    /// Failed to parse date from string.
    DateParseError {
        /// The invalid date string.
        date_string: String,
        /// The parsing error message.
        error: String,
    },
    /// Date arithmetic overflow.
    DateArithmeticOverflow {
        /// Description of the operation that failed.
        operation: String,
    },
    /// A system setting is invalid.
    InvalidSetting {
        /// The setting name.
        setting: &'static str,
        /// Why it was rejected.
        reason: String,
    },
    /// A code was assigned that does not belong to the registry's year.
    RegistryScopeMismatch {
        /// The code being checked.
        code: ReportCode,
        /// The registry's year.
        registry_year: CodeYear,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedCode { input, reason } => {
                write!(f, "Malformed report code '{input}': {reason}")
            }
            Self::DuplicateCode {
                sequence,
                year,
                conflicting_report_title,
            } => match year {
                Some(year) => write!(
                    f,
                    "Code {sequence} is already used in {year} by report: {conflicting_report_title}"
                ),
                None => write!(
                    f,
                    "Code {sequence} is already used by report: {conflicting_report_title}"
                ),
            },
            Self::CodesExhausted { year } => match year {
                Some(year) => write!(f, "All report code sequences for {year} are in use"),
                None => write!(f, "All report code sequences are in use"),
            },
            Self::InvalidTitle(msg) => write!(f, "Invalid title: {msg}"),
            Self::InvalidDescription(msg) => write!(f, "Invalid description: {msg}"),
            Self::InvalidWorkerCount(count) => {
                write!(f, "Invalid worker count: {count}. Must be at least 1")
            }
            Self::MissingResponsiblePerson => {
                write!(f, "At least one responsible person must be named")
            }
            Self::InvalidLocation(msg) => write!(f, "Invalid location: {msg}"),
            Self::InvalidCoordinates {
                latitude,
                longitude,
            } => write!(
                f,
                "Invalid coordinates: latitude={latitude:?}, longitude={longitude:?}"
            ),
            Self::InvalidDateRange {
                start_date,
                end_date,
            } => write!(
                f,
                "End date {end_date} must not be before start date {start_date}"
            ),
            Self::InvalidProgress(progress) => {
                write!(f, "Invalid progress: {progress}. Must be between 0 and 100")
            }
            Self::InvalidEnumValue { kind, value } => write!(f, "Invalid {kind}: '{value}'"),
            Self::DateParseError { date_string, error } => {
                write!(f, "Failed to parse date '{date_string}': {error}")
            }
            Self::DateArithmeticOverflow { operation } => {
                write!(f, "Date arithmetic overflow while {operation}")
            }
            Self::InvalidSetting { setting, reason } => {
                write!(f, "Invalid setting '{setting}': {reason}")
            }
            Self::RegistryScopeMismatch {
                code,
                registry_year,
            } => write!(
                f,
                "Code {code} cannot be checked against the registry for {registry_year}"
            ),
        }
    }
}

impl std::error::Error for DomainError {}
