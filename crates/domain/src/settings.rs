// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! System-wide settings.
//!
//! Settings are a single document persisted as JSON. Every field has a
//! default so that a partially written or older document still loads.

use crate::error::DomainError;
use chrono::{Datelike, TimeZone};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::{Date, Month, OffsetDateTime};

/// Allowed session timeout, in minutes.
pub const SESSION_TIMEOUT_RANGE: std::ops::RangeInclusive<u32> = 15..=480;

/// Allowed password expiry, in days.
pub const PASSWORD_EXPIRY_RANGE: std::ops::RangeInclusive<u32> = 30..=365;

/// Interface language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    /// Bahasa Indonesia
    #[default]
    #[serde(rename = "id")]
    Indonesian,
    /// English
    #[serde(rename = "en")]
    English,
}

impl Language {
    /// Returns the language tag.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Indonesian => "id",
            Self::English => "en",
        }
    }
}

impl FromStr for Language {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Indonesian),
            "en" => Ok(Self::English),
            _ => Err(DomainError::InvalidEnumValue {
                kind: "language",
                value: s.to_string(),
            }),
        }
    }
}

/// How dates are rendered to operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DateFormat {
    /// `dd/MM/yyyy`
    #[default]
    #[serde(rename = "dd/MM/yyyy")]
    DayMonthYear,
    /// `MM/dd/yyyy`
    #[serde(rename = "MM/dd/yyyy")]
    MonthDayYear,
    /// `yyyy-MM-dd`
    #[serde(rename = "yyyy-MM-dd")]
    YearMonthDay,
}

impl DateFormat {
    /// Returns the pattern string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DayMonthYear => "dd/MM/yyyy",
            Self::MonthDayYear => "MM/dd/yyyy",
            Self::YearMonthDay => "yyyy-MM-dd",
        }
    }

    /// Renders `date` in this format.
    #[must_use]
    pub fn render(&self, date: Date) -> String {
        let (year, month, day) = (date.year(), u8::from(date.month()), date.day());
        match self {
            Self::DayMonthYear => format!("{day:02}/{month:02}/{year:04}"),
            Self::MonthDayYear => format!("{month:02}/{day:02}/{year:04}"),
            Self::YearMonthDay => format!("{year:04}-{month:02}-{day:02}"),
        }
    }
}

/// An IANA timezone name, checked against the timezone database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timezone(String);

impl Timezone {
    /// Creates a timezone from its IANA name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidSetting` if the name is unknown.
    pub fn new(name: &str) -> Result<Self, DomainError> {
        chrono_tz::Tz::from_str(name).map_err(|_| DomainError::InvalidSetting {
            setting: "timezone",
            reason: format!("unknown timezone '{name}'"),
        })?;
        Ok(Self(name.to_string()))
    }

    /// Returns the IANA name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Returns the local calendar date at `now` in this timezone.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidSetting` if the instant cannot be
    /// represented in the timezone.
    pub fn local_date(&self, now: OffsetDateTime) -> Result<Date, DomainError> {
        let tz: chrono_tz::Tz =
            chrono_tz::Tz::from_str(&self.0).map_err(|_| DomainError::InvalidSetting {
                setting: "timezone",
                reason: format!("unknown timezone '{}'", self.0),
            })?;
        let unrepresentable = || DomainError::InvalidSetting {
            setting: "timezone",
            reason: format!("{now} cannot be represented in {}", self.0),
        };
        let local = tz
            .timestamp_opt(now.unix_timestamp(), 0)
            .single()
            .ok_or_else(unrepresentable)?;
        let month: Month = u8::try_from(local.month())
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .ok_or_else(unrepresentable)?;
        let day: u8 = u8::try_from(local.day()).map_err(|_| unrepresentable())?;
        Date::from_calendar_date(local.year(), month, day).map_err(|_| unrepresentable())
    }
}

impl Default for Timezone {
    fn default() -> Self {
        Self(String::from("Asia/Jakarta"))
    }
}

impl TryFrom<String> for Timezone {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Timezone> for String {
    fn from(tz: Timezone) -> Self {
        tz.0
    }
}

/// An ISO 4217 currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Creates a currency code.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidSetting` unless `code` is three uppercase
    /// ASCII letters.
    pub fn new(code: &str) -> Result<Self, DomainError> {
        if code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase()) {
            Ok(Self(code.to_string()))
        } else {
            Err(DomainError::InvalidSetting {
                setting: "currency",
                reason: format!("'{code}' is not a 3-letter currency code"),
            })
        }
    }

    /// Returns the code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self(String::from("IDR"))
    }
}

impl TryFrom<String> for Currency {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

/// Which notifications operators receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct NotificationPreferences {
    /// Send email notifications.
    pub email: bool,
    /// Send push notifications.
    pub push: bool,
    /// Notify on report creation and status changes.
    pub report_updates: bool,
    /// Notify on system alerts.
    pub system_alerts: bool,
    /// Send a weekly digest.
    pub weekly_digest: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email: true,
            push: true,
            report_updates: true,
            system_alerts: true,
            weekly_digest: false,
        }
    }
}

/// Session and password policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySettings {
    /// Require a second factor at login.
    pub two_factor_auth: bool,
    /// Idle session timeout in minutes.
    pub session_timeout_minutes: u32,
    /// Days before a password must be changed.
    pub password_expiry_days: u32,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            two_factor_auth: false,
            session_timeout_minutes: 30,
            password_expiry_days: 90,
        }
    }
}

/// Locale and presentation settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemSettings {
    /// Interface language.
    pub language: Language,
    /// Timezone used to decide "today".
    pub timezone: Timezone,
    /// Date rendering.
    pub date_format: DateFormat,
    /// Currency for cost fields.
    pub currency: Currency,
}

/// The complete settings document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Notification preferences.
    pub notifications: NotificationPreferences,
    /// Security policy.
    pub security: SecuritySettings,
    /// Locale settings.
    pub system: SystemSettings,
}

impl Settings {
    /// Checks the numeric policy values.
    ///
    /// String-typed fields are validated when they are constructed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidSetting` if the session timeout or the
    /// password expiry is out of range.
    pub fn validate(&self) -> Result<(), DomainError> {
        if !SESSION_TIMEOUT_RANGE.contains(&self.security.session_timeout_minutes) {
            return Err(DomainError::InvalidSetting {
                setting: "session_timeout_minutes",
                reason: format!(
                    "must be between {} and {} minutes",
                    SESSION_TIMEOUT_RANGE.start(),
                    SESSION_TIMEOUT_RANGE.end()
                ),
            });
        }
        if !PASSWORD_EXPIRY_RANGE.contains(&self.security.password_expiry_days) {
            return Err(DomainError::InvalidSetting {
                setting: "password_expiry_days",
                reason: format!(
                    "must be between {} and {} days",
                    PASSWORD_EXPIRY_RANGE.start(),
                    PASSWORD_EXPIRY_RANGE.end()
                ),
            });
        }
        Ok(())
    }
}
