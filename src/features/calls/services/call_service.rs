use chrono::{DateTime, Datelike, Duration, FixedOffset, Timelike, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::calls::dtos::{
    CallDto, CallEndedDto, CallStartedDto, DayCountDto, WeeklyChartDto,
};
use crate::features::calls::models::Call;

/// Reference zone for week boundaries and day bucketing (UTC+05:30,
/// no daylight saving)
const CHART_UTC_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Calls shorter than this are left out of the usage chart
const CHART_MIN_DURATION_SECS: i64 = 60;

const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Service for call session tracking and usage aggregation
pub struct CallService {
    pool: PgPool,
}

impl CallService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a call session, optionally tied to a file
    pub async fn start(&self, file_id: Option<Uuid>) -> Result<CallStartedDto> {
        let call = sqlx::query_as::<_, Call>(
            r#"
            INSERT INTO calls (file_id)
            VALUES ($1)
            RETURNING *
            "#,
        )
        .bind(file_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to start call: {:?}", e);
            AppError::Database(e)
        })?;

        info!("Call started: id={}, file_id={:?}", call.id, call.file_id);

        Ok(CallStartedDto {
            id: call.id,
            start_call_time: call.start_call_time,
        })
    }

    /// Close a call session exactly once.
    ///
    /// The conditional update keyed on `end_call_time IS NULL` makes two
    /// concurrent ends race to a single winner; the loser sees the same
    /// failure as ending a call that never existed.
    pub async fn end(&self, call_id: Uuid, feedback_message: &str) -> Result<CallEndedDto> {
        let call = sqlx::query_as::<_, Call>(
            r#"
            UPDATE calls
            SET end_call_time = NOW(),
                duration = FLOOR(EXTRACT(EPOCH FROM (NOW() - start_call_time)))::BIGINT,
                feedback_message = $2
            WHERE id = $1 AND end_call_time IS NULL
            RETURNING *
            "#,
        )
        .bind(call_id)
        .bind(feedback_message)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to end call {}: {:?}", call_id, e);
            AppError::Database(e)
        })?
        .ok_or_else(|| {
            AppError::BadRequest("Call not found or already ended".to_string())
        })?;

        info!("Call ended: id={}, duration={}s", call.id, call.duration);

        // end_call_time was just written by the update
        let end_call_time = call.end_call_time.unwrap_or(call.start_call_time);

        Ok(CallEndedDto {
            id: call.id,
            end_call_time,
            duration: call.duration,
        })
    }

    /// All calls, newest first
    pub async fn list(&self) -> Result<Vec<CallDto>> {
        let calls = sqlx::query_as::<_, Call>(
            "SELECT * FROM calls ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list calls: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(calls.into_iter().map(CallDto::from).collect())
    }

    /// Usage chart for the current calendar week
    pub async fn weekly_chart(&self) -> Result<WeeklyChartDto> {
        let now = Utc::now();
        let window_start = week_start(now) - Duration::days(7);

        let starts: Vec<DateTime<Utc>> = sqlx::query_scalar(
            r#"
            SELECT start_call_time FROM calls
            WHERE duration > $1 AND start_call_time >= $2
            "#,
        )
        .bind(CHART_MIN_DURATION_SECS)
        .bind(window_start)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load chart data: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(build_weekly_chart(now, &starts))
    }
}

fn chart_zone() -> FixedOffset {
    FixedOffset::east_opt(CHART_UTC_OFFSET_SECS).expect("offset constant is in range")
}

/// Most recent Sunday midnight in the chart zone, as a UTC instant
fn week_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let local = now.with_timezone(&chart_zone());
    let secs_into_day = local.num_seconds_from_midnight() as i64;
    let days_since_sunday = local.weekday().num_days_from_sunday() as i64;

    now - Duration::nanoseconds(local.nanosecond() as i64)
        - Duration::seconds(secs_into_day)
        - Duration::days(days_since_sunday)
}

/// Bucket qualifying call starts into the current week's days and compare
/// the total against the prior week.
fn build_weekly_chart(now: DateTime<Utc>, starts: &[DateTime<Utc>]) -> WeeklyChartDto {
    let zone = chart_zone();
    let current_start = week_start(now);
    let prior_start = current_start - Duration::days(7);

    let mut per_day_counts = [0_i64; 7];
    let mut prior_total = 0_i64;

    for &start in starts {
        if start >= current_start {
            let day = start.with_timezone(&zone).weekday().num_days_from_sunday() as usize;
            per_day_counts[day] += 1;
        } else if start >= prior_start {
            prior_total += 1;
        }
    }

    let total_calls: i64 = per_day_counts.iter().sum();

    let change_percent = if prior_total == 0 && total_calls == 0 {
        0
    } else if prior_total == 0 {
        100
    } else {
        let delta = (total_calls - prior_total) as f64 / prior_total as f64 * 100.0;
        delta.round() as i64
    };

    let per_day = (total_calls as f64 / 7.0).round() as i64;

    let daily_counts = DAY_NAMES
        .iter()
        .zip(per_day_counts)
        .map(|(day, count)| DayCountDto {
            day: (*day).to_string(),
            count,
        })
        .collect();

    WeeklyChartDto {
        total_calls,
        per_day,
        change_percent,
        daily_counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // 2026-08-26 12:00 UTC is a Wednesday; the week began Sunday
    // 2026-08-23 00:00 at +05:30, i.e. 2026-08-22 18:30 UTC.
    fn wednesday_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 26, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_week_start_is_local_sunday_midnight() {
        let start = week_start(wednesday_noon());
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 8, 22, 18, 30, 0).unwrap());
    }

    #[test]
    fn test_chart_empty_weeks() {
        let chart = build_weekly_chart(wednesday_noon(), &[]);

        assert_eq!(chart.total_calls, 0);
        assert_eq!(chart.per_day, 0);
        assert_eq!(chart.change_percent, 0);
        assert_eq!(chart.daily_counts.len(), 7);
        assert!(chart.daily_counts.iter().all(|d| d.count == 0));
        assert_eq!(chart.daily_counts[0].day, "Sunday");
        assert_eq!(chart.daily_counts[6].day, "Saturday");
    }

    #[test]
    fn test_chart_prior_week_zero_gives_full_change() {
        let now = wednesday_noon();
        let starts: Vec<_> = (0..5).map(|h| now - Duration::hours(h)).collect();

        let chart = build_weekly_chart(now, &starts);

        assert_eq!(chart.total_calls, 5);
        assert_eq!(chart.change_percent, 100);
        assert_eq!(chart.per_day, 1);
    }

    #[test]
    fn test_chart_percent_delta_against_prior_week() {
        let now = wednesday_noon();
        let mut starts: Vec<_> = (0..3).map(|h| now - Duration::hours(h)).collect();
        // Four calls in the prior week
        starts.extend((0..4).map(|h| now - Duration::days(5) - Duration::hours(h)));

        let chart = build_weekly_chart(now, &starts);

        assert_eq!(chart.total_calls, 3);
        // (3 - 4) / 4 * 100 = -25
        assert_eq!(chart.change_percent, -25);
    }

    #[test]
    fn test_chart_buckets_by_local_day() {
        let now = wednesday_noon();
        // 19:30 UTC on Tuesday is already Wednesday at +05:30
        let tuesday_late = Utc.with_ymd_and_hms(2026, 8, 25, 19, 30, 0).unwrap();

        let chart = build_weekly_chart(now, &[tuesday_late]);

        assert_eq!(chart.daily_counts[3].day, "Wednesday");
        assert_eq!(chart.daily_counts[3].count, 1);
        assert_eq!(chart.daily_counts[2].count, 0);
    }

    #[test]
    fn test_chart_ignores_starts_before_prior_week() {
        let now = wednesday_noon();
        let ancient = now - Duration::days(30);

        let chart = build_weekly_chart(now, &[ancient]);

        assert_eq!(chart.total_calls, 0);
        assert_eq!(chart.change_percent, 0);
    }
}
