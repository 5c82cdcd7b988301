// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::report::{Location, ReportDetails};
use time::Date;
use time::macros::format_description;

/// Minimum number of characters in a report description.
pub const MIN_DESCRIPTION_LEN: usize = 10;

/// Validates that a report's field constraints are met.
///
/// This function checks each field in isolation and the date ordering.
/// It does NOT check the report code (that requires a registry).
///
/// # Arguments
///
/// * `details` - The report content to validate
///
/// # Returns
///
/// * `Ok(())` if the fields are valid
/// * `Err(DomainError)` for the first field that is invalid
///
/// # Errors
///
/// Returns an error if:
/// - The title is blank
/// - The description is shorter than 10 characters
/// - The worker count is zero
/// - No responsible person is named
/// - The location name is blank or its coordinates are out of range
/// - The end date is before the start date
/// - Progress is above 100
pub fn validate_report_details(details: &ReportDetails) -> Result<(), DomainError> {
    if details.title.trim().is_empty() {
        return Err(DomainError::InvalidTitle(String::from(
            "Title cannot be empty",
        )));
    }

    if details.description.trim().chars().count() < MIN_DESCRIPTION_LEN {
        return Err(DomainError::InvalidDescription(format!(
            "Description must be at least {MIN_DESCRIPTION_LEN} characters"
        )));
    }

    if details.worker_count < 1 {
        return Err(DomainError::InvalidWorkerCount(details.worker_count));
    }

    if !details
        .responsible_persons
        .iter()
        .any(|person| !person.trim().is_empty())
    {
        return Err(DomainError::MissingResponsiblePerson);
    }

    validate_location(&details.location)?;

    if details.end_date < details.start_date {
        return Err(DomainError::InvalidDateRange {
            start_date: details.start_date,
            end_date: details.end_date,
        });
    }

    if details.progress > 100 {
        return Err(DomainError::InvalidProgress(details.progress));
    }

    Ok(())
}

/// Validates a work site.
///
/// # Errors
///
/// Returns an error if the name is blank, if only one coordinate is given,
/// or if a coordinate is out of range.
pub fn validate_location(location: &Location) -> Result<(), DomainError> {
    if location.name.trim().is_empty() {
        return Err(DomainError::InvalidLocation(String::from(
            "Location name cannot be empty",
        )));
    }

    let invalid = || DomainError::InvalidCoordinates {
        latitude: location.latitude,
        longitude: location.longitude,
    };
    match (location.latitude, location.longitude) {
        (None, None) => Ok(()),
        (Some(lat), Some(lon)) => {
            if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) {
                Ok(())
            } else {
                Err(invalid())
            }
        }
        _ => Err(invalid()),
    }
}

/// Parses an ISO 8601 calendar date (`YYYY-MM-DD`).
///
/// # Errors
///
/// Returns `DomainError::DateParseError` if the string is not a valid date.
pub fn parse_date(value: &str) -> Result<Date, DomainError> {
    Date::parse(value, format_description!("[year]-[month]-[day]")).map_err(|e| {
        DomainError::DateParseError {
            date_string: value.to_string(),
            error: e.to_string(),
        }
    })
}

/// Formats a date as `YYYY-MM-DD`.
///
/// # Errors
///
/// Returns `DomainError::DateParseError` if the date cannot be formatted.
pub fn format_date(date: Date) -> Result<String, DomainError> {
    date.format(format_description!("[year]-[month]-[day]"))
        .map_err(|e| DomainError::DateParseError {
            date_string: date.to_string(),
            error: e.to_string(),
        })
}
