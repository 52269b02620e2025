use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------------
// Granularity
// -----------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, utoipa::ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Granularity {
    Daily,
    Monthly,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Daily => "DAILY",
            Granularity::Monthly => "MONTHLY",
        }
    }
}

// -----------------------------------------------------------------------------
// Date ranges
// -----------------------------------------------------------------------------

/// Calendar range with an inclusive `start` and an exclusive `end`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, utoipa::ToSchema)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// First day of the month containing `day`.
pub fn month_start(day: NaiveDate) -> NaiveDate {
    day - Days::new(u64::from(day.day0()))
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The `months` whole calendar months that precede the month of `today`.
    pub fn whole_months_before(today: NaiveDate, months: u32) -> Option<Self> {
        let end = month_start(today);
        let start = end.checked_sub_months(Months::new(months))?;
        Some(Self { start, end })
    }

    /// The `days` days ending yesterday (today itself is excluded).
    pub fn days_ending_yesterday(today: NaiveDate, days: u64) -> Option<Self> {
        let start = today.checked_sub_days(Days::new(days))?;
        Some(Self { start, end: today })
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day < self.end
    }

    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// `YYYY-MM-DD` pair as sent upstream.
    pub fn to_iso_pair(&self) -> (String, String) {
        (
            self.start.format("%Y-%m-%d").to_string(),
            self.end.format("%Y-%m-%d").to_string(),
        )
    }
}

// -----------------------------------------------------------------------------
// Filters
// -----------------------------------------------------------------------------

pub const DIMENSION_RECORD_TYPE: &str = "RECORD_TYPE";
pub const DIMENSION_SERVICE: &str = "SERVICE";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DimensionMatch {
    pub dimension: String,
    pub values: Vec<String>,
}

impl DimensionMatch {
    pub fn new(dimension: &str, values: &[&str]) -> Self {
        Self {
            dimension: dimension.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    fn matches(&self, value: Option<&str>) -> bool {
        value.is_some_and(|v| self.values.iter().any(|allowed| allowed == v))
    }
}

/// Conjunction evaluated upstream: every `include` match must hold and no
/// `exclude` match may hold.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct CostFilter {
    pub include: Vec<DimensionMatch>,
    pub exclude: Vec<DimensionMatch>,
}

impl CostFilter {
    /// Usage records only; credits and refunds never reach the aggregator.
    pub fn billable_usage() -> Self {
        Self {
            include: vec![DimensionMatch::new(DIMENSION_RECORD_TYPE, &["Usage"])],
            exclude: vec![DimensionMatch::new(
                DIMENSION_RECORD_TYPE,
                &["Credit", "Refund"],
            )],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Evaluate the filter against a row, given a lookup from dimension name
    /// to that row's value. Used by providers that cannot push the filter to
    /// a remote API.
    pub fn accepts<'a>(&self, lookup: impl Fn(&str) -> Option<&'a str>) -> bool {
        self.include
            .iter()
            .all(|m| m.matches(lookup(m.dimension.as_str())))
            && !self
                .exclude
                .iter()
                .any(|m| m.matches(lookup(m.dimension.as_str())))
    }
}

// -----------------------------------------------------------------------------
// Upstream query
// -----------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CostQuery {
    pub range: DateRange,
    pub granularity: Granularity,
    pub group_by: String,
    pub metric: String,
    pub filter: Option<CostFilter>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn whole_months_cover_previous_half_year() {
        let range = DateRange::whole_months_before(d(2024, 8, 17), 6).unwrap();
        assert_eq!(range.start, d(2024, 2, 1));
        assert_eq!(range.end, d(2024, 8, 1));
        assert!(!range.contains(d(2024, 8, 1)));
        assert!(range.contains(d(2024, 7, 31)));
    }

    #[test]
    fn whole_months_roll_over_year() {
        let range = DateRange::whole_months_before(d(2024, 1, 1), 12).unwrap();
        assert_eq!(range.start, d(2023, 1, 1));
        assert_eq!(range.end, d(2024, 1, 1));
    }

    #[test]
    fn four_weeks_end_yesterday() {
        let range = DateRange::days_ending_yesterday(d(2024, 3, 2), 28).unwrap();
        assert_eq!(range.start, d(2024, 2, 3));
        assert_eq!(range.end, d(2024, 3, 2));
        assert_eq!(range.num_days(), 28);
        assert!(range.contains(d(2024, 3, 1)));
        assert!(!range.contains(d(2024, 3, 2)));
    }

    #[test]
    fn iso_pair_formatting() {
        let range = DateRange::new(d(2024, 2, 3), d(2024, 3, 2));
        assert_eq!(
            range.to_iso_pair(),
            ("2024-02-03".to_string(), "2024-03-02".to_string())
        );
    }

    #[test]
    fn billable_usage_filter_rules() {
        let filter = CostFilter::billable_usage();
        assert!(filter.accepts(|dim| (dim == DIMENSION_RECORD_TYPE).then_some("Usage")));
        assert!(!filter.accepts(|dim| (dim == DIMENSION_RECORD_TYPE).then_some("Credit")));
        assert!(!filter.accepts(|dim| (dim == DIMENSION_RECORD_TYPE).then_some("Refund")));
        assert!(!filter.accepts(|dim| (dim == DIMENSION_RECORD_TYPE).then_some("Tax")));
        // a row without the dimension cannot satisfy an include
        assert!(!filter.accepts(|_| None));
    }

    #[test]
    fn empty_filter_accepts_everything() {
        let filter = CostFilter::default();
        assert!(filter.is_empty());
        assert!(filter.accepts(|_| None));
    }

    #[test]
    fn granularity_wire_names() {
        assert_eq!(Granularity::Daily.as_str(), "DAILY");
        assert_eq!(
            serde_json::to_string(&Granularity::Monthly).unwrap(),
            "\"MONTHLY\""
        );
    }
}
