use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};
use serde::Serialize;

use super::domain::{Lawyer, LawyerId};

/// Why a lawyer was left out of the scoring round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Exclusion {
    MarkedUnavailable,
    OnLeave,
    AtCapacity,
    OutsideOfficeHours,
}

impl Exclusion {
    pub const fn label(self) -> &'static str {
        match self {
            Exclusion::MarkedUnavailable => "marked unavailable",
            Exclusion::OnLeave => "on leave",
            Exclusion::AtCapacity => "at capacity",
            Exclusion::OutsideOfficeHours => "outside office hours",
        }
    }
}

/// Result of splitting the pool into lawyers that may be scored and the rest.
#[derive(Debug, Default)]
pub struct AvailabilityPartition<'a> {
    pub kept: Vec<&'a Lawyer>,
    pub excluded: Vec<(LawyerId, Exclusion)>,
}

/// Time-of-check predicate over the candidate pool.
#[derive(Debug, Clone, Copy)]
pub struct AvailabilityFilter {
    now: DateTime<Utc>,
    office_hours_offset: FixedOffset,
}

impl AvailabilityFilter {
    pub fn new(now: DateTime<Utc>, office_hours_offset: FixedOffset) -> Self {
        Self {
            now,
            office_hours_offset,
        }
    }

    pub fn check(&self, lawyer: &Lawyer) -> Result<(), Exclusion> {
        if !lawyer.available {
            return Err(Exclusion::MarkedUnavailable);
        }

        if lawyer
            .leave
            .map(|window| window.contains(self.now))
            .unwrap_or(false)
        {
            return Err(Exclusion::OnLeave);
        }

        if !lawyer.has_capacity() {
            return Err(Exclusion::AtCapacity);
        }

        if let Some(hours) = &lawyer.office_hours {
            let local = self.now.with_timezone(&self.office_hours_offset);
            if !hours.covers(local.weekday(), local.hour()) {
                return Err(Exclusion::OutsideOfficeHours);
            }
        }

        Ok(())
    }

    /// Keeps pool order for the lawyers that pass, so ranking ties stay stable.
    pub fn partition<'a, I>(&self, pool: I) -> AvailabilityPartition<'a>
    where
        I: IntoIterator<Item = &'a Lawyer>,
    {
        let mut partition = AvailabilityPartition::default();
        for lawyer in pool {
            match self.check(lawyer) {
                Ok(()) => partition.kept.push(lawyer),
                Err(reason) => partition.excluded.push((lawyer.id.clone(), reason)),
            }
        }
        partition
    }
}
