//! DiscoverySchedule model
//!
//! Recurring discovery for a project. The maintenance channel enqueues a
//! discovery job whenever `next_run_at` passes, then moves it forward.

use chrono::{DateTime, Days, Months, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::kernel::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "schedule_frequency", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleFrequency {
    Weekly,
    Monthly,
    Quarterly,
}

impl ScheduleFrequency {
    /// First whole-period step after `from` that is later than `now`.
    ///
    /// Steps are counted from `from` rather than chained, so a monthly
    /// schedule anchored on the 31st returns to the 31st after a short month.
    pub fn next_after(&self, from: DateTime<Utc>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let mut periods: u32 = 1;
        loop {
            let next = self.advance_by(from, periods)?;
            if next > now {
                return Some(next);
            }
            periods = periods.checked_add(1)?;
        }
    }

    /// `periods` whole periods after `from`. Monthly periods are calendar
    /// months, so Jan 31 + 1 month lands on the last day of February.
    fn advance_by(&self, from: DateTime<Utc>, periods: u32) -> Option<DateTime<Utc>> {
        match self {
            ScheduleFrequency::Weekly => from.checked_add_days(Days::new(7 * u64::from(periods))),
            ScheduleFrequency::Monthly => from.checked_add_months(Months::new(periods)),
            ScheduleFrequency::Quarterly => from.checked_add_months(Months::new(periods.checked_mul(3)?)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DiscoverySchedule {
    pub id: Uuid,
    pub project_id: Uuid,
    pub job_type: String,
    pub frequency: ScheduleFrequency,
    pub config: Value,
    pub enabled: bool,
    pub next_run_at: DateTime<Utc>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl DiscoverySchedule {
    /// Enabled schedules whose `next_run_at` is at or before `now`.
    pub async fn find_due(now: DateTime<Utc>, pool: &PgPool) -> Result<Vec<Self>, StoreError> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM discovery_schedules
             WHERE enabled AND next_run_at <= $1
             ORDER BY next_run_at",
        )
        .bind(now)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn advance(
        id: Uuid,
        next_run_at: DateTime<Utc>,
        last_run_at: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE discovery_schedules SET next_run_at = $2, last_run_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(next_run_at)
        .bind(last_run_at)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "discovery_schedule",
                id,
            });
        }
        Ok(())
    }
}
