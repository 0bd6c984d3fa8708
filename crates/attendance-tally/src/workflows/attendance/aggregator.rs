use super::domain::{Blacklist, DateSource, ParsedDate};
use super::normalizer::normalize_name;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

/// Canonical name to the dates that participant was seen on.
///
/// Names iterate in the order they first appeared; dates are kept sorted.
#[derive(Debug, Default, Clone)]
pub struct AttendanceRecord {
    order: Vec<String>,
    attended: HashMap<String, BTreeSet<NaiveDate>>,
    dates: BTreeSet<NaiveDate>,
}

impl AttendanceRecord {
    pub fn add_date(&mut self, date: NaiveDate) {
        self.dates.insert(date);
    }

    /// Returns `false` when the name was already marked for that date.
    pub fn mark_present(&mut self, name: &str, date: NaiveDate) -> bool {
        self.dates.insert(date);
        if let Some(dates) = self.attended.get_mut(name) {
            return dates.insert(date);
        }

        self.order.push(name.to_string());
        self.attended
            .insert(name.to_string(), BTreeSet::from([date]));
        true
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn dates(&self) -> &BTreeSet<NaiveDate> {
        &self.dates
    }

    pub fn attended(&self, name: &str, date: NaiveDate) -> bool {
        self.attended
            .get(name)
            .is_some_and(|dates| dates.contains(&date))
    }

    pub fn dates_for(&self, name: &str) -> Option<&BTreeSet<NaiveDate>> {
        self.attended.get(name)
    }

    pub fn participant_count(&self) -> usize {
        self.order.len()
    }
}

/// Folds the names of each dated file into an [`AttendanceRecord`].
#[derive(Debug)]
pub struct AttendanceAggregator<'a> {
    blacklist: &'a Blacklist,
    record: AttendanceRecord,
    explicit_years: BTreeSet<i32>,
    used_assumed_year: bool,
}

impl<'a> AttendanceAggregator<'a> {
    pub fn new(blacklist: &'a Blacklist) -> Self {
        Self {
            blacklist,
            record: AttendanceRecord::default(),
            explicit_years: BTreeSet::new(),
            used_assumed_year: false,
        }
    }

    /// Records one file. The date becomes a column even when no names match.
    pub fn record_file<S: AsRef<str>>(&mut self, date: ParsedDate, raw_names: &[S]) {
        match date.source {
            DateSource::Explicit => {
                self.explicit_years.insert(date.year());
            }
            DateSource::AssumedYear => self.used_assumed_year = true,
        }

        self.record.add_date(date.date);
        for raw in raw_names {
            let canonical = normalize_name(raw.as_ref(), self.blacklist);
            self.record.mark_present(&canonical, date.date);
        }
    }

    /// Explicit years that differ from `assumed_year`, if month/day-only
    /// names were placed in `assumed_year` during this run.
    pub fn conflicting_years(&self, assumed_year: i32) -> Option<Vec<i32>> {
        if !self.used_assumed_year {
            return None;
        }

        let years: Vec<i32> = self
            .explicit_years
            .iter()
            .copied()
            .filter(|year| *year != assumed_year)
            .collect();
        (!years.is_empty()).then_some(years)
    }

    pub fn record(&self) -> &AttendanceRecord {
        &self.record
    }

    pub fn into_record(self) -> AttendanceRecord {
        self.record
    }
}
