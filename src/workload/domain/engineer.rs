//! Engineer record and daily capacity accounting.

use super::{EngineerId, WorkloadDomainError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Minutes in one hour of daily capacity.
pub const MINUTES_PER_HOUR: u64 = 60;

/// A worker with a daily time budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Engineer {
    id: EngineerId,
    name: String,
    daily_capacity_hours: u32,
    efficiency_factor: f64,
    #[serde(default)]
    minutes_worked_today: u64,
    #[serde(default)]
    minutes_day: Option<NaiveDate>,
}

impl Engineer {
    /// Creates a validated engineer with no time worked today.
    ///
    /// # Errors
    ///
    /// Returns [`WorkloadDomainError::EmptyName`] for a blank name,
    /// [`WorkloadDomainError::InvalidCapacity`] for zero capacity, and
    /// [`WorkloadDomainError::InvalidEfficiency`] for a non-positive or
    /// non-finite efficiency factor.
    pub fn new(
        id: EngineerId,
        name: impl Into<String>,
        daily_capacity_hours: u32,
        efficiency_factor: f64,
    ) -> Result<Self, WorkloadDomainError> {
        let raw_name = name.into();
        let engineer = Self {
            id,
            name: raw_name.trim().to_owned(),
            daily_capacity_hours,
            efficiency_factor,
            minutes_worked_today: 0,
            minutes_day: None,
        };
        engineer.ensure_valid()?;
        Ok(engineer)
    }

    /// Re-checks the constructor rules on a record that bypassed
    /// [`Engineer::new`], such as one read from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Engineer::new`].
    pub fn ensure_valid(&self) -> Result<(), WorkloadDomainError> {
        if self.name.trim().is_empty() {
            return Err(WorkloadDomainError::EmptyName);
        }
        if self.daily_capacity_hours == 0 {
            return Err(WorkloadDomainError::InvalidCapacity);
        }
        if !self.efficiency_factor.is_finite() || self.efficiency_factor <= 0.0 {
            return Err(WorkloadDomainError::InvalidEfficiency(
                self.efficiency_factor.to_string(),
            ));
        }
        Ok(())
    }

    /// Sets the minutes already worked today.
    #[must_use]
    pub const fn with_minutes_worked_today(mut self, minutes: u64) -> Self {
        self.minutes_worked_today = minutes;
        self
    }

    /// Overwrites the minutes worked today.
    pub const fn set_minutes_worked_today(&mut self, minutes: u64) {
        self.minutes_worked_today = minutes;
    }

    /// Returns the engineer identifier.
    #[must_use]
    pub const fn id(&self) -> EngineerId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the daily capacity in hours.
    #[must_use]
    pub const fn daily_capacity_hours(&self) -> u32 {
        self.daily_capacity_hours
    }

    /// Returns the efficiency factor used by effort reporting.
    #[must_use]
    pub const fn efficiency_factor(&self) -> f64 {
        self.efficiency_factor
    }

    /// Returns the calendar day `minutes_worked_today` was last reset for.
    ///
    /// `None` until the first day rollover is recorded.
    #[must_use]
    pub const fn minutes_day(&self) -> Option<NaiveDate> {
        self.minutes_day
    }

    /// Opens `day` for daily accounting.
    ///
    /// The counter is cleared only when `day` is later than the last day
    /// opened, so repeated calls on the same day keep the minutes credited
    /// since. Returns `true` when the counter was cleared.
    pub fn begin_day(&mut self, day: NaiveDate) -> bool {
        if self.minutes_day.is_some_and(|current| current >= day) {
            return false;
        }
        self.minutes_day = Some(day);
        self.minutes_worked_today = 0;
        true
    }

    /// Returns the minutes accumulated today across all tasks.
    #[must_use]
    pub const fn minutes_worked_today(&self) -> u64 {
        self.minutes_worked_today
    }

    /// Returns the daily capacity converted to minutes.
    #[must_use]
    pub const fn capacity_minutes(&self) -> u64 {
        capacity_minutes(self.daily_capacity_hours)
    }

    /// Returns `true` once today's minutes reach the daily capacity.
    #[must_use]
    pub const fn is_at_capacity(&self) -> bool {
        self.minutes_worked_today >= self.capacity_minutes()
    }

    /// Fails when the engineer cannot take on more work today.
    ///
    /// # Errors
    ///
    /// Returns [`WorkloadDomainError::CapacityExceeded`] when
    /// `minutes_worked_today` is at or over the daily capacity.
    pub const fn ensure_capacity_remaining(&self) -> Result<(), WorkloadDomainError> {
        if self.is_at_capacity() {
            return Err(WorkloadDomainError::CapacityExceeded {
                engineer_id: self.id,
                worked_minutes: self.minutes_worked_today,
                capacity_minutes: self.capacity_minutes(),
            });
        }
        Ok(())
    }
}

/// Converts a daily capacity in hours to minutes.
#[must_use]
pub const fn capacity_minutes(daily_capacity_hours: u32) -> u64 {
    (daily_capacity_hours as u64) * MINUTES_PER_HOUR
}
