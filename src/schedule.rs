//! # Scheduling Directive
//!
//! The recurrence rule attached to a parent workflow and consumed by the
//! external orchestrator. Sub-workflows carry no schedule of their own; they
//! run solely when invoked by their parent chain.
//!
//! The start anchor is relative ("N days before load time") so that first
//! deploys never point at a fixed historical date, and the catch-up flag
//! controls whether occurrences missed while the orchestrator was down are
//! backfilled. The reference configuration fires monthly on day 30 with
//! catch-up disabled.

use chrono::{DateTime, Duration, Utc};
use cron::Schedule;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Result, TableflowError};

/// Recurrence rule, start anchor, and catch-up policy for a parent workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSpec {
    /// Cron recurrence expression (six-field, seconds first)
    pub cron_expression: String,

    /// Start anchor: this many days before load time
    pub start_offset_days: i64,

    /// Whether missed historical occurrences are backfilled
    #[serde(default)]
    pub catchup: bool,
}

impl ScheduleSpec {
    /// Monthly on day 30 at midnight, anchored two days back, no catch-up.
    /// Mirrors the reference load configuration.
    pub fn monthly_day30() -> Self {
        Self {
            cron_expression: "0 0 0 30 * *".to_string(),
            start_offset_days: 2,
            catchup: false,
        }
    }

    pub fn new(cron_expression: impl Into<String>, start_offset_days: i64, catchup: bool) -> Self {
        Self {
            cron_expression: cron_expression.into(),
            start_offset_days,
            catchup,
        }
    }

    /// Validate that the cron expression parses.
    pub fn validate(&self) -> Result<()> {
        self.parse_cron().map(|_| ())
    }

    fn parse_cron(&self) -> Result<Schedule> {
        Schedule::from_str(&self.cron_expression).map_err(|e| {
            TableflowError::ScheduleError(format!(
                "Invalid cron expression '{}': {e}",
                self.cron_expression
            ))
        })
    }

    /// Resolve the relative start anchor against a load time.
    pub fn start_date(&self, load_time: DateTime<Utc>) -> DateTime<Utc> {
        load_time - Duration::days(self.start_offset_days)
    }

    /// Next occurrence strictly after `t`.
    pub fn next_occurrence_after(&self, t: DateTime<Utc>) -> Result<Option<DateTime<Utc>>> {
        let schedule = self.parse_cron()?;
        Ok(schedule.after(&t).next())
    }

    /// Occurrences that would be backfilled at registration time.
    ///
    /// With catch-up disabled this is always empty: only the next future
    /// occurrence fires, no matter how far in the past the start anchor lies.
    /// With catch-up enabled, every occurrence between the start anchor and
    /// `now` is due.
    pub fn backfill_occurrences(
        &self,
        registered_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>> {
        if !self.catchup {
            return Ok(Vec::new());
        }

        let schedule = self.parse_cron()?;
        let start = self.start_date(registered_at);
        Ok(schedule
            .after(&start)
            .take_while(|occurrence| *occurrence <= now)
            .collect())
    }
}
