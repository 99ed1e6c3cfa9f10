use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::calls::models::Call;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartCallDto {
    /// Optional file the call relates to
    pub file_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallStartedDto {
    pub id: Uuid,
    pub start_call_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EndCallDto {
    pub call_id: String,
    pub feedback_message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallEndedDto {
    pub id: Uuid,
    pub end_call_time: DateTime<Utc>,
    /// Whole seconds between start and end
    pub duration: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallDto {
    pub id: Uuid,
    pub file_id: Option<Uuid>,
    pub start_call_time: DateTime<Utc>,
    pub end_call_time: Option<DateTime<Utc>>,
    pub duration: i64,
    pub feedback_message: String,
    pub created_at: DateTime<Utc>,
}

impl From<Call> for CallDto {
    fn from(call: Call) -> Self {
        Self {
            id: call.id,
            file_id: call.file_id,
            start_call_time: call.start_call_time,
            end_call_time: call.end_call_time,
            duration: call.duration,
            feedback_message: call.feedback_message,
            created_at: call.created_at,
        }
    }
}

/// One day bucket in the weekly usage chart
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DayCountDto {
    /// Day name, Sunday through Saturday
    pub day: String,
    pub count: i64,
}

/// Weekly usage aggregation over calls longer than a minute
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyChartDto {
    pub total_calls: i64,
    /// Rounded average of calls per day over the current week
    pub per_day: i64,
    /// Percent change versus the prior week's total
    pub change_percent: i64,
    pub daily_counts: Vec<DayCountDto>,
}
