//! In-memory cost provider for local runs and tests.
//!
//! Rows are canned per granularity; the query's range and filter are applied
//! here the same way the real API applies them on its side.

use crate::{CostProvider, ProviderError, Result};
use async_trait::async_trait;
use chrono::{Datelike, Days, NaiveDate};
use costboard_common::query::{month_start, DIMENSION_RECORD_TYPE, DIMENSION_SERVICE};
use costboard_common::{CostQuery, Granularity, RawCostEntry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

const SAMPLE_SERVICES: [(&str, f64); 5] = [
    ("Amazon Elastic Compute Cloud - Compute", 412.37),
    ("Amazon Simple Storage Service", 58.12),
    ("Amazon Relational Database Service", 133.9),
    ("AWS Lambda", 7.44),
    ("AmazonCloudWatch", 21.05),
];

#[derive(Debug, Clone, PartialEq)]
pub struct MockCostRow {
    pub granularity: Granularity,
    pub bucket: NaiveDate,
    pub service: String,
    pub amount: String,
    pub record_type: String,
}

impl MockCostRow {
    pub fn monthly(bucket: NaiveDate, service: &str, amount: &str) -> Self {
        Self {
            granularity: Granularity::Monthly,
            bucket: month_start(bucket),
            service: service.to_string(),
            amount: amount.to_string(),
            record_type: "Usage".to_string(),
        }
    }

    pub fn daily(bucket: NaiveDate, service: &str, amount: &str) -> Self {
        Self {
            granularity: Granularity::Daily,
            bucket,
            service: service.to_string(),
            amount: amount.to_string(),
            record_type: "Usage".to_string(),
        }
    }

    pub fn with_record_type(mut self, record_type: &str) -> Self {
        self.record_type = record_type.to_string();
        self
    }

    fn dimension(&self, dimension: &str) -> Option<&str> {
        match dimension {
            DIMENSION_RECORD_TYPE => Some(self.record_type.as_str()),
            DIMENSION_SERVICE => Some(self.service.as_str()),
            _ => None,
        }
    }
}

pub struct MockCostProvider {
    rows: Vec<MockCostRow>,
    delay: Option<Duration>,
    failure: Mutex<Option<(usize, ProviderError)>>,
    calls: AtomicUsize,
    last_query: Mutex<Option<CostQuery>>,
}

impl MockCostProvider {
    pub fn new(rows: Vec<MockCostRow>) -> Self {
        Self {
            rows,
            delay: None,
            failure: Mutex::new(None),
            calls: AtomicUsize::new(0),
            last_query: Mutex::new(None),
        }
    }

    /// Plausible data for the year before `today`, plus a credit line per
    /// month so filtered and unfiltered reports differ.
    pub fn sample(today: NaiveDate) -> Self {
        let mut rows = Vec::new();
        let current = month_start(today);

        for back in 1..=13u32 {
            let Some(month) = current.checked_sub_months(chrono::Months::new(back)) else {
                continue;
            };
            let wobble = 1.0 + f64::from(month.month() % 4) * 0.07;
            for (service, base) in SAMPLE_SERVICES {
                let amount = format!("{:.10}", base * wobble);
                rows.push(MockCostRow::monthly(month, service, &amount));
            }
            rows.push(
                MockCostRow::monthly(month, "Tax", "-25.0").with_record_type("Credit"),
            );
        }

        for back in 1..=35u64 {
            let Some(day) = today.checked_sub_days(Days::new(back)) else {
                continue;
            };
            let wobble = 1.0 + f64::from(day.weekday().num_days_from_monday()) * 0.03;
            for (service, base) in SAMPLE_SERVICES {
                let amount = format!("{:.10}", base / 30.0 * wobble);
                rows.push(MockCostRow::daily(day, service, &amount));
            }
        }

        Self::new(rows)
    }

    /// Sleep before answering, to hold a fetch in flight.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make the next `times` calls fail with `error`.
    pub fn fail_times(&self, times: usize, error: ProviderError) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = (times > 0).then_some((times, error));
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<CostQuery> {
        self.last_query.lock().ok().and_then(|q| q.clone())
    }

    fn take_failure(&self) -> Option<ProviderError> {
        let mut guard = self.failure.lock().ok()?;
        let (remaining, error) = guard.as_mut()?;
        let error = error.clone();
        *remaining -= 1;
        if *remaining == 0 {
            *guard = None;
        }
        Some(error)
    }

    fn select(&self, query: &CostQuery) -> Vec<RawCostEntry> {
        self.rows
            .iter()
            .filter(|row| row.granularity == query.granularity)
            .filter(|row| query.range.contains(row.bucket))
            .filter(|row| {
                query
                    .filter
                    .as_ref()
                    .map_or(true, |f| f.accepts(|dim| row.dimension(dim)))
            })
            .map(|row| {
                let category = row
                    .dimension(&query.group_by)
                    .unwrap_or("No grouping")
                    .to_string();
                RawCostEntry {
                    bucket: row.bucket.format("%Y-%m-%d").to_string(),
                    category,
                    amount: row.amount.clone(),
                }
            })
            .collect()
    }
}

#[async_trait]
impl CostProvider for MockCostProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn fetch_costs(&self, query: &CostQuery) -> Result<Vec<RawCostEntry>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_query.lock() {
            *last = Some(query.clone());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.take_failure() {
            tracing::debug!(error = %error, "mock provider failing on request");
            return Err(error);
        }

        let entries = self.select(query);
        tracing::debug!(
            rows = entries.len(),
            granularity = query.granularity.as_str(),
            "mock provider answered"
        );
        Ok(entries)
    }
}
