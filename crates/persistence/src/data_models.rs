// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use num_traits::ToPrimitive;
use pep_report_domain::{
    CodeYear, HsseData, Location, NotificationKind, ReportCategory, ReportCode, ReportDetails,
    ReportStatus, RiskLevel, Sequence, WeatherCondition, WorkReport, format_date, parse_date,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::diesel_schema::work_reports;
use crate::error::PersistenceError;

/// An operator account as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorData {
    pub operator_id: i64,
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
    pub role: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub is_disabled: bool,
    pub created_at: String,
    pub disabled_at: Option<String>,
    pub last_login_at: Option<String>,
}

/// Profile fields an operator may edit on their own account.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OperatorProfile {
    pub display_name: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
}

/// A login session as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub session_id: i64,
    pub session_token: String,
    pub operator_id: i64,
    pub created_at: String,
    pub last_activity_at: String,
    pub expires_at: String,
}

/// A work report together with its creator's name and email.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRecord {
    pub report: WorkReport,
    pub creator_name: String,
    pub creator_email: String,
}

/// A notification delivered to one operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    pub notification_id: i64,
    pub operator_id: i64,
    pub report_id: Option<i64>,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub is_read: bool,
    pub created_at: String,
}

/// Content of a notification fanned out to several operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub report_id: Option<i64>,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
}

/// Formats the current instant for a text timestamp column.
pub(crate) fn now_timestamp() -> Result<String, PersistenceError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|e| PersistenceError::SerializationError(e.to_string()))
}

fn parse_timestamp(value: &str) -> Result<OffsetDateTime, PersistenceError> {
    OffsetDateTime::parse(value, &Rfc3339)
        .map_err(|e| PersistenceError::InvalidRow(format!("timestamp '{value}': {e}")))
}

fn invalid<E: std::fmt::Display>(column: &'static str) -> impl FnOnce(E) -> PersistenceError {
    move |e| PersistenceError::InvalidRow(format!("{column}: {e}"))
}

fn out_of_range(column: &'static str, value: i64) -> PersistenceError {
    PersistenceError::InvalidRow(format!("{column}: {value} is out of range"))
}

/// A `work_reports` row.
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = work_reports)]
pub(crate) struct WorkReportRow {
    pub report_id: i64,
    pub code_year: i32,
    pub code_sequence: i32,
    pub title: String,
    pub description: String,
    pub category: String,
    pub start_date: String,
    pub end_date: String,
    pub status: String,
    pub progress: i32,
    pub worker_count: i32,
    pub responsible_persons: String,
    pub location_name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub risk_level: String,
    pub weather_condition: String,
    pub safety_incidents: i32,
    pub photos: String,
    pub created_by: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl WorkReportRow {
    /// Rebuilds the domain report from the stored columns.
    pub(crate) fn into_report(self) -> Result<WorkReport, PersistenceError> {
        let year: u16 = self
            .code_year
            .to_u16()
            .ok_or_else(|| out_of_range("code_year", i64::from(self.code_year)))?;
        let sequence: u16 = self
            .code_sequence
            .to_u16()
            .ok_or_else(|| out_of_range("code_sequence", i64::from(self.code_sequence)))?;
        let code: ReportCode = ReportCode::new(
            Sequence::new(sequence).map_err(invalid("code_sequence"))?,
            CodeYear::new(year).map_err(invalid("code_year"))?,
        );

        let details: ReportDetails = ReportDetails {
            title: self.title,
            description: self.description,
            category: ReportCategory::from_str(&self.category).map_err(invalid("category"))?,
            start_date: parse_date(&self.start_date).map_err(invalid("start_date"))?,
            end_date: parse_date(&self.end_date).map_err(invalid("end_date"))?,
            status: ReportStatus::from_str(&self.status).map_err(invalid("status"))?,
            progress: self
                .progress
                .to_u8()
                .ok_or_else(|| out_of_range("progress", i64::from(self.progress)))?,
            worker_count: self
                .worker_count
                .to_u32()
                .ok_or_else(|| out_of_range("worker_count", i64::from(self.worker_count)))?,
            responsible_persons: serde_json::from_str(&self.responsible_persons)?,
            location: Location {
                name: self.location_name,
                latitude: self.latitude,
                longitude: self.longitude,
            },
            hsse: HsseData {
                risk_level: RiskLevel::from_str(&self.risk_level).map_err(invalid("risk_level"))?,
                weather_condition: WeatherCondition::from_str(&self.weather_condition)
                    .map_err(invalid("weather_condition"))?,
                safety_incidents: self.safety_incidents.to_u32().ok_or_else(|| {
                    out_of_range("safety_incidents", i64::from(self.safety_incidents))
                })?,
            },
            photos: serde_json::from_str(&self.photos)?,
        };

        Ok(WorkReport::new(
            self.report_id,
            code,
            details,
            self.created_by,
            parse_timestamp(&self.created_at)?,
            parse_timestamp(&self.updated_at)?,
        ))
    }
}

/// Report columns in storage form, shared by inserts and updates.
pub(crate) struct EncodedReport {
    pub code_year: i32,
    pub code_sequence: i32,
    pub start_date: String,
    pub end_date: String,
    pub progress: i32,
    pub worker_count: i32,
    pub responsible_persons: String,
    pub safety_incidents: i32,
    pub photos: String,
}

impl EncodedReport {
    pub(crate) fn new(code: ReportCode, details: &ReportDetails) -> Result<Self, PersistenceError> {
        let worker_count: i32 = details.worker_count.to_i32().ok_or_else(|| {
            PersistenceError::InvalidRow(format!(
                "worker_count: {} is out of range",
                details.worker_count
            ))
        })?;
        let safety_incidents: i32 = details.hsse.safety_incidents.to_i32().ok_or_else(|| {
            PersistenceError::InvalidRow(format!(
                "safety_incidents: {} is out of range",
                details.hsse.safety_incidents
            ))
        })?;

        Ok(Self {
            code_year: i32::from(code.year().value()),
            code_sequence: i32::from(code.sequence().value()),
            start_date: format_date(details.start_date).map_err(invalid("start_date"))?,
            end_date: format_date(details.end_date).map_err(invalid("end_date"))?,
            progress: i32::from(details.progress),
            worker_count,
            responsible_persons: serde_json::to_string(&details.responsible_persons)?,
            safety_incidents,
            photos: serde_json::to_string(&details.photos)?,
        })
    }
}

/// Values written when a report is inserted.
#[derive(Insertable)]
#[diesel(table_name = work_reports)]
pub(crate) struct NewWorkReportRow<'a> {
    pub code_year: i32,
    pub code_sequence: i32,
    pub title: &'a str,
    pub description: &'a str,
    pub category: &'a str,
    pub start_date: &'a str,
    pub end_date: &'a str,
    pub status: &'a str,
    pub progress: i32,
    pub worker_count: i32,
    pub responsible_persons: &'a str,
    pub location_name: &'a str,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub risk_level: &'a str,
    pub weather_condition: &'a str,
    pub safety_incidents: i32,
    pub photos: &'a str,
    pub created_by: i64,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Values written when a report is edited. Cleared coordinates become NULL.
#[derive(AsChangeset)]
#[diesel(table_name = work_reports)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct WorkReportChanges<'a> {
    pub code_year: i32,
    pub code_sequence: i32,
    pub title: &'a str,
    pub description: &'a str,
    pub category: &'a str,
    pub start_date: &'a str,
    pub end_date: &'a str,
    pub status: &'a str,
    pub progress: i32,
    pub worker_count: i32,
    pub responsible_persons: &'a str,
    pub location_name: &'a str,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub risk_level: &'a str,
    pub weather_condition: &'a str,
    pub safety_incidents: i32,
    pub photos: &'a str,
    pub updated_at: &'a str,
}

