// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Work reports and their closed enumerations.

use crate::code::ReportCode;
use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::{Date, OffsetDateTime};

/// Progress value a completed report is forced to.
pub const COMPLETED_PROGRESS: u8 = 100;

/// The kind of job a report describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportCategory {
    /// Routine maintenance
    Maintenance,
    /// New construction
    Construction,
    /// Upgrade of existing equipment
    Upgrade,
    /// Repair of a fault
    Repair,
}

impl ReportCategory {
    /// Every category, in display order.
    pub const ALL: [Self; 4] = [
        Self::Maintenance,
        Self::Construction,
        Self::Upgrade,
        Self::Repair,
    ];

    /// Returns the string representation used for persistence and the API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Maintenance => "maintenance",
            Self::Construction => "construction",
            Self::Upgrade => "upgrade",
            Self::Repair => "repair",
        }
    }

    /// Returns the human-readable label used in exports.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Maintenance => "Maintenance",
            Self::Construction => "Construction",
            Self::Upgrade => "Upgrade",
            Self::Repair => "Repair",
        }
    }
}

impl FromStr for ReportCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "maintenance" => Ok(Self::Maintenance),
            "construction" => Ok(Self::Construction),
            "upgrade" => Ok(Self::Upgrade),
            "repair" => Ok(Self::Repair),
            _ => Err(DomainError::InvalidEnumValue {
                kind: "category",
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for ReportCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a report is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Not started yet
    Planning,
    /// Work is in progress
    Ongoing,
    /// Work is finished
    Completed,
    /// Work is behind schedule
    Delayed,
}

impl ReportStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Planning,
        Self::Ongoing,
        Self::Completed,
        Self::Delayed,
    ];

    /// Returns the string representation used for persistence and the API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
            Self::Delayed => "delayed",
        }
    }

    /// Returns the human-readable label used in exports.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Planning => "Planning",
            Self::Ongoing => "Ongoing",
            Self::Completed => "Completed",
            Self::Delayed => "Delayed",
        }
    }

    /// Returns true once work is finished.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl FromStr for ReportStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planning" => Ok(Self::Planning),
            "ongoing" => Ok(Self::Ongoing),
            "completed" => Ok(Self::Completed),
            "delayed" => Ok(Self::Delayed),
            _ => Err(DomainError::InvalidEnumValue {
                kind: "status",
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HSSE risk assessment for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Low risk
    Low,
    /// Medium risk
    Medium,
    /// High risk
    High,
}

impl RiskLevel {
    /// Every risk level, lowest first.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Returns the string representation used for persistence and the API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for RiskLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(DomainError::InvalidEnumValue {
                kind: "risk level",
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weather on site when the report was filed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    /// Clear
    Sunny,
    /// Overcast
    Cloudy,
    /// Rain
    Rainy,
    /// Storm
    Stormy,
}

impl WeatherCondition {
    /// Every weather condition.
    pub const ALL: [Self; 4] = [Self::Sunny, Self::Cloudy, Self::Rainy, Self::Stormy];

    /// Returns the string representation used for persistence and the API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sunny => "sunny",
            Self::Cloudy => "cloudy",
            Self::Rainy => "rainy",
            Self::Stormy => "stormy",
        }
    }
}

impl FromStr for WeatherCondition {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sunny" => Ok(Self::Sunny),
            "cloudy" => Ok(Self::Cloudy),
            "rainy" => Ok(Self::Rainy),
            "stormy" => Ok(Self::Stormy),
            _ => Err(DomainError::InvalidEnumValue {
                kind: "weather condition",
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named work site, optionally pinned to coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    /// Site name.
    pub name: String,
    /// Latitude in degrees.
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    pub longitude: Option<f64>,
}

impl Location {
    /// Creates a location without coordinates.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            latitude: None,
            longitude: None,
        }
    }

    /// Returns both coordinates when the location is pinned.
    #[must_use]
    pub const fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Health, safety, security and environment data for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsseData {
    /// Assessed risk.
    pub risk_level: RiskLevel,
    /// Weather on site.
    pub weather_condition: WeatherCondition,
    /// Number of safety incidents recorded.
    pub safety_incidents: u32,
}

impl Default for HsseData {
    fn default() -> Self {
        Self {
            risk_level: RiskLevel::Low,
            weather_condition: WeatherCondition::Sunny,
            safety_incidents: 0,
        }
    }
}

/// Everything about a report other than its identity and code.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDetails {
    /// Short title.
    pub title: String,
    /// Free-form description of the work.
    pub description: String,
    /// Job category.
    pub category: ReportCategory,
    /// First day of work.
    pub start_date: Date,
    /// Last day of work.
    pub end_date: Date,
    /// Lifecycle status.
    pub status: ReportStatus,
    /// Percentage complete.
    pub progress: u8,
    /// Number of workers assigned.
    pub worker_count: u32,
    /// Names of the people in charge.
    pub responsible_persons: Vec<String>,
    /// Work site.
    pub location: Location,
    /// HSSE assessment.
    pub hsse: HsseData,
    /// Photo references.
    pub photos: Vec<String>,
}

impl ReportDetails {
    /// Applies the rules that tie fields together.
    ///
    /// A completed report is always at 100% progress.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.status.is_completed() {
            self.progress = COMPLETED_PROGRESS;
        }
        self
    }

    /// Returns true if `date` falls within `[start_date, end_date]`.
    #[must_use]
    pub fn is_active_on(&self, date: Date) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// A report that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    /// Report content.
    pub details: ReportDetails,
    /// Operator creating the report.
    pub created_by: i64,
}

/// A persisted work report.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkReport {
    report_id: i64,
    code: ReportCode,
    details: ReportDetails,
    created_by: i64,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl WorkReport {
    /// Assembles a persisted report.
    #[must_use]
    pub const fn new(
        report_id: i64,
        code: ReportCode,
        details: ReportDetails,
        created_by: i64,
        created_at: OffsetDateTime,
        updated_at: OffsetDateTime,
    ) -> Self {
        Self {
            report_id,
            code,
            details,
            created_by,
            created_at,
            updated_at,
        }
    }

    /// The store identifier.
    #[must_use]
    pub const fn report_id(&self) -> i64 {
        self.report_id
    }

    /// The assigned code.
    #[must_use]
    pub const fn code(&self) -> ReportCode {
        self.code
    }

    /// Report content.
    #[must_use]
    pub const fn details(&self) -> &ReportDetails {
        &self.details
    }

    /// Operator who created the report.
    #[must_use]
    pub const fn created_by(&self) -> i64 {
        self.created_by
    }

    /// Creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    /// Last modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> OffsetDateTime {
        self.updated_at
    }
}

/// A partial update to an existing report.
///
/// `None` leaves a field unchanged. A code change must be validated against
/// the registry before the patch reaches the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportPatch {
    /// New code.
    pub code: Option<ReportCode>,
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New category.
    pub category: Option<ReportCategory>,
    /// New start date.
    pub start_date: Option<Date>,
    /// New end date.
    pub end_date: Option<Date>,
    /// New status.
    pub status: Option<ReportStatus>,
    /// New progress.
    pub progress: Option<u8>,
    /// New worker count.
    pub worker_count: Option<u32>,
    /// Replacement list of responsible persons.
    pub responsible_persons: Option<Vec<String>>,
    /// New location.
    pub location: Option<Location>,
    /// New HSSE data.
    pub hsse: Option<HsseData>,
    /// Replacement list of photos.
    pub photos: Option<Vec<String>>,
}

impl ReportPatch {
    /// Returns true if the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns the code and details `report` would have after this patch.
    #[must_use]
    pub fn apply_to(&self, report: &WorkReport) -> (ReportCode, ReportDetails) {
        let current: &ReportDetails = report.details();
        let details: ReportDetails = ReportDetails {
            title: self.title.clone().unwrap_or_else(|| current.title.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| current.description.clone()),
            category: self.category.unwrap_or(current.category),
            start_date: self.start_date.unwrap_or(current.start_date),
            end_date: self.end_date.unwrap_or(current.end_date),
            status: self.status.unwrap_or(current.status),
            progress: self.progress.unwrap_or(current.progress),
            worker_count: self.worker_count.unwrap_or(current.worker_count),
            responsible_persons: self
                .responsible_persons
                .clone()
                .unwrap_or_else(|| current.responsible_persons.clone()),
            location: self
                .location
                .clone()
                .unwrap_or_else(|| current.location.clone()),
            hsse: self.hsse.unwrap_or(current.hsse),
            photos: self.photos.clone().unwrap_or_else(|| current.photos.clone()),
        };
        (self.code.unwrap_or(report.code()), details.normalized())
    }
}
