//! Compliance metrics derived from stored submissions.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::domain::SubmissionRecord;
use super::store::{StoreError, SubmissionStore};

/// One row per calendar day (UTC) and checklist template.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceMetricRow {
    pub day: NaiveDate,
    pub filename: String,
    pub total_submissions: usize,
    pub validated_submissions: usize,
    pub validation_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_completion_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_validation_success_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_validation_hours: Option<f64>,
}

/// Per-supervisor workload for one calendar month of sign-offs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupervisorMetricRow {
    pub supervisor_name: String,
    /// First day of the month the sign-offs fall in.
    pub month: NaiveDate,
    pub total_validations: usize,
    pub unique_checklists: usize,
    pub avg_turnaround_hours: f64,
    pub min_turnaround_hours: f64,
    pub max_turnaround_hours: f64,
}

#[derive(Default)]
struct DailyTally {
    total: usize,
    validated: usize,
    completion: Mean,
    success: Mean,
    turnaround: Mean,
}

#[derive(Default)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Ratio of validated to total submissions, rounded to four places. Zero when nothing was
/// submitted.
pub fn validation_rate(validated: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_to(validated as f64 / total as f64, 4)
}

/// Group submissions by UTC day and template, newest day first and templates alphabetical
/// within a day.
pub fn daily_compliance<'a, I>(records: I) -> Vec<ComplianceMetricRow>
where
    I: IntoIterator<Item = &'a SubmissionRecord>,
{
    let mut groups: BTreeMap<(Reverse<NaiveDate>, &'a str), DailyTally> = BTreeMap::new();

    for record in records {
        let key = (
            Reverse(record.submitted_at.date_naive()),
            record.original_filename.as_str(),
        );
        let tally = groups.entry(key).or_default();
        tally.total += 1;

        if let Some(completion) = record.completion_percentage() {
            tally.completion.push(completion);
        }

        if let (true, Some(sign_off)) = (record.is_validated(), &record.supervisor_validation) {
            tally.validated += 1;
            if let Some(success) = sign_off.success_percentage() {
                tally.success.push(success);
            }
            tally
                .turnaround
                .push(hours_between(record, sign_off.validated_at));
        }
    }

    groups
        .into_iter()
        .map(|((Reverse(day), filename), tally)| ComplianceMetricRow {
            day,
            filename: filename.to_string(),
            total_submissions: tally.total,
            validated_submissions: tally.validated,
            validation_rate: validation_rate(tally.validated, tally.total),
            avg_completion_percentage: tally.completion.value().map(|v| round_to(v, 2)),
            avg_validation_success_percentage: tally.success.value().map(|v| round_to(v, 2)),
            avg_validation_hours: tally.turnaround.value().map(|v| round_to(v, 2)),
        })
        .collect()
}

/// Summarize validated submissions per supervisor and month of sign-off.
pub fn supervisor_activity<'a, I>(records: I) -> Vec<SupervisorMetricRow>
where
    I: IntoIterator<Item = &'a SubmissionRecord>,
{
    let mut groups: BTreeMap<(NaiveDate, &'a str), (Vec<f64>, BTreeSet<&'a str>)> =
        BTreeMap::new();

    for record in records {
        let Some(sign_off) = record
            .supervisor_validation
            .as_ref()
            .filter(|_| record.is_validated())
        else {
            continue;
        };

        let month = sign_off
            .validated_at
            .date_naive()
            .with_day(1)
            .unwrap_or_else(|| sign_off.validated_at.date_naive());
        let (turnarounds, checklists) = groups
            .entry((month, sign_off.supervisor_name.as_str()))
            .or_default();
        turnarounds.push(hours_between(record, sign_off.validated_at));
        checklists.insert(record.original_filename.as_str());
    }

    let mut rows: Vec<SupervisorMetricRow> = groups
        .into_iter()
        .map(|((month, supervisor_name), (turnarounds, checklists))| {
            let total = turnarounds.len();
            let sum: f64 = turnarounds.iter().sum();
            let min = turnarounds.iter().copied().fold(f64::INFINITY, f64::min);
            let max = turnarounds
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max);
            SupervisorMetricRow {
                supervisor_name: supervisor_name.to_string(),
                month,
                total_validations: total,
                unique_checklists: checklists.len(),
                avg_turnaround_hours: round_to(sum / total as f64, 2),
                min_turnaround_hours: round_to(min, 2),
                max_turnaround_hours: round_to(max, 2),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.month
            .cmp(&a.month)
            .then_with(|| b.total_validations.cmp(&a.total_validations))
            .then_with(|| a.supervisor_name.cmp(&b.supervisor_name))
    });
    rows
}

/// Store-backed entry point for reporting consumers.
pub struct ComplianceAggregator<S> {
    store: Arc<S>,
}

impl<S> ComplianceAggregator<S>
where
    S: SubmissionStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn daily_metrics(&self) -> Result<Vec<ComplianceMetricRow>, StoreError> {
        let snapshot = self.store.list_all()?;
        Ok(daily_compliance(&snapshot))
    }

    pub fn supervisor_metrics(&self) -> Result<Vec<SupervisorMetricRow>, StoreError> {
        let snapshot = self.store.list_all()?;
        Ok(supervisor_activity(&snapshot))
    }
}

fn hours_between(record: &SubmissionRecord, validated_at: chrono::DateTime<chrono::Utc>) -> f64 {
    (validated_at - record.submitted_at).num_seconds() as f64 / 3600.0
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
