use chrono::{Datelike, FixedOffset, Timelike};
use serde::Serialize;

use crate::adherence::AdherenceLog;

use super::{recent_window, AdherenceRate};

const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayPattern {
    pub day: &'static str,
    pub adherence_rate: AdherenceRate,
}

#[derive(Clone, Copy, Debug, Serialize, Eq, PartialEq)]
pub enum DayPeriod {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl DayPeriod {
    pub const ALL: [DayPeriod; 4] = [
        DayPeriod::Morning,
        DayPeriod::Afternoon,
        DayPeriod::Evening,
        DayPeriod::Night,
    ];

    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => Self::Morning,
            12..=17 => Self::Afternoon,
            18..=23 => Self::Evening,
            _ => Self::Night,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PeriodPattern {
    pub period: DayPeriod,
    pub taken: usize,
    pub total: usize,
    pub adherence_rate: AdherenceRate,
}

#[derive(Clone, Copy, Default)]
struct Tally {
    taken: usize,
    total: usize,
}

impl Tally {
    fn add(&mut self, entry: &AdherenceLog) {
        self.total += 1;
        if entry.is_taken() {
            self.taken += 1;
        }
    }

    fn rate(&self) -> AdherenceRate {
        AdherenceRate::from_counts(self.taken, self.total)
    }
}

/// Adherence by weekday over the most recent entries, Sunday first. Always
/// seven records; weekdays are taken in `offset`.
pub fn weekly_pattern(entries: &[AdherenceLog], offset: FixedOffset) -> Vec<DayPattern> {
    let mut days = [Tally::default(); 7];
    for entry in recent_window(entries) {
        let weekday = entry.scheduled_time.with_timezone(&offset).weekday();
        days[weekday.num_days_from_sunday() as usize].add(entry);
    }

    DAY_NAMES
        .iter()
        .zip(days.iter())
        .map(|(day, tally)| DayPattern {
            day: *day,
            adherence_rate: tally.rate(),
        })
        .collect()
}

/// Adherence by part of day over the most recent entries, in
/// [`DayPeriod::ALL`] order.
pub fn time_of_day_pattern(entries: &[AdherenceLog], offset: FixedOffset) -> Vec<PeriodPattern> {
    let mut periods = [Tally::default(); 4];
    for entry in recent_window(entries) {
        let hour = entry.scheduled_time.with_timezone(&offset).hour();
        periods[DayPeriod::from_hour(hour).index()].add(entry);
    }

    DayPeriod::ALL
        .iter()
        .map(|period| {
            let tally = periods[period.index()];
            PeriodPattern {
                period: *period,
                taken: tally.taken,
                total: tally.total,
                adherence_rate: tally.rate(),
            }
        })
        .collect()
}
