//! Dispenser DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::dispenser::flow_volume::INVALID_NUMBER;
use crate::domain::{Dispenser, DomainError, DomainResult, FlowVolume, SpendingReport, UsageSpend};
use crate::shared::types::{parse_timestamp, timestamp_format};

/// Register a dispenser
///
/// Fields stay raw JSON until the handler reads them, so a value of the
/// wrong type is reported against its field instead of as a body error.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDispenserRequest {
    /// Liters per second as a number or numeric string; at most 5 digits,
    /// 4 of them decimals
    #[validate(required(message = "This field is required."))]
    #[schema(value_type = String, example = "0.0653")]
    pub flow_volume: Option<Value>,
}

impl CreateDispenserRequest {
    pub fn flow_volume(&self) -> DomainResult<FlowVolume> {
        match &self.flow_volume {
            None => Err(DomainError::validation("flow_volume", "This field is required.")),
            Some(Value::Number(n)) => n.to_string().parse(),
            Some(Value::String(s)) => s.parse(),
            Some(_) => Err(DomainError::validation("flow_volume", INVALID_NUMBER)),
        }
    }
}

/// Newly created dispenser
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DispenserResponse {
    pub id: String,
    #[schema(value_type = String, example = "0.0653")]
    pub flow_volume: Decimal,
}

impl DispenserResponse {
    pub fn from_domain(d: &Dispenser) -> Self {
        Self {
            id: d.id.to_string(),
            flow_volume: d.flow_volume.value(),
        }
    }
}

/// Dispenser with its current status
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DispenserDetailResponse {
    pub id: String,
    #[schema(value_type = String, example = "0.0653")]
    pub flow_volume: Decimal,
    /// "open" or "closed"
    pub status: String,
}

impl DispenserDetailResponse {
    pub fn from_domain(d: &Dispenser) -> Self {
        Self {
            id: d.id.to_string(),
            flow_volume: d.flow_volume.value(),
            status: d.status().to_string(),
        }
    }
}

/// Open or close a dispenser at a given instant
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStatusRequest {
    #[validate(required(message = "This field is required."))]
    #[schema(value_type = String, example = "open")]
    pub status: Option<Value>,
    /// `YYYY-MM-DDThh:mm[:ss[.ffffff]]`, optional offset; naive values are UTC
    #[validate(required(message = "This field is required."))]
    #[schema(value_type = String, example = "2022-01-01T02:00:00Z")]
    pub updated_at: Option<Value>,
}

impl UpdateStatusRequest {
    /// `status` as the client sent it, for error messages
    pub fn raw_status(&self) -> String {
        match &self.status {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }

    /// `None` unless `updated_at` is a string in an accepted layout
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
            .as_ref()
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
    }
}

/// Echo of an accepted status change
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
    #[serde(serialize_with = "timestamp_format::serialize")]
    #[schema(value_type = String, example = "2022-01-01T02:00:00")]
    pub updated_at: DateTime<Utc>,
}

/// One usage session line of the spending report
#[derive(Debug, Serialize, ToSchema)]
pub struct UsageResponse {
    #[serde(serialize_with = "timestamp_format::serialize")]
    #[schema(value_type = String, example = "2022-01-01T02:00:00")]
    pub opened_at: DateTime<Utc>,
    #[serde(serialize_with = "timestamp_format::option::serialize")]
    #[schema(value_type = Option<String>, example = "2022-01-01T02:00:50")]
    pub closed_at: Option<DateTime<Utc>>,
    #[schema(value_type = String, example = "0.0653")]
    pub flow_volume: Decimal,
    #[schema(value_type = String, example = "39.996")]
    pub total_spent: Decimal,
}

impl From<UsageSpend> for UsageResponse {
    fn from(u: UsageSpend) -> Self {
        Self {
            opened_at: u.opened_at,
            closed_at: u.closed_at,
            flow_volume: u.flow_volume,
            total_spent: u.total_spent,
        }
    }
}

/// Total spend of a dispenser with per-session breakdown
#[derive(Debug, Serialize, ToSchema)]
pub struct SpendingResponse {
    #[schema(value_type = String, example = "39.996")]
    pub amount: Decimal,
    pub usages: Vec<UsageResponse>,
}

impl From<SpendingReport> for SpendingResponse {
    fn from(report: SpendingReport) -> Self {
        Self {
            amount: report.amount,
            usages: report.usages.into_iter().map(Into::into).collect(),
        }
    }
}
