use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;

/// One CSV row exactly as it appears in the file. Everything is kept as text
/// so the loader can report which column failed to parse.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Branch")]
    pub branch: Option<String>,
    #[serde(rename = "City")]
    pub city: Option<String>,
    #[serde(rename = "Customer type")]
    pub customer_type: Option<String>,
    #[serde(rename = "Gender")]
    pub gender: Option<String>,
    #[serde(rename = "Product line")]
    pub product_line: Option<String>,
    #[serde(rename = "Unit price")]
    pub unit_price: Option<String>,
    #[serde(rename = "Quantity")]
    pub quantity: Option<String>,
    #[serde(rename = "Tax 5%")]
    pub tax: Option<String>,
    #[serde(rename = "Total")]
    pub total: Option<String>,
    #[serde(rename = "Date")]
    pub date: Option<String>,
    #[serde(rename = "Time")]
    pub time: Option<String>,
    #[serde(rename = "Payment")]
    pub payment: Option<String>,
    #[serde(rename = "cogs")]
    pub cogs: Option<String>,
    #[serde(rename = "gross income")]
    pub gross_income: Option<String>,
    #[serde(rename = "Rating")]
    pub rating: Option<String>,
}

/// Header names the input file must carry.
pub const REQUIRED_COLUMNS: [&str; 15] = [
    "Branch",
    "City",
    "Customer type",
    "Gender",
    "Product line",
    "Unit price",
    "Quantity",
    "Tax 5%",
    "Total",
    "Date",
    "Time",
    "Payment",
    "cogs",
    "gross income",
    "Rating",
];

/// Calendar month. Variant order is calendar order, so sorting by `Month`
/// never falls back to alphabetical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    pub fn of(date: NaiveDate) -> Month {
        // `month0` is always 0..=11.
        Month::ALL[date.month0() as usize]
    }

    pub fn name(self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }

    /// Three-letter abbreviation, as used in period labels.
    pub fn abbrev(self) -> &'static str {
        &self.name()[..3]
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Month-year bucket for the time series. Field order gives chronological
/// ordering through the derived `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthYear {
    pub year: i32,
    pub month: Month,
}

impl MonthYear {
    pub fn of(date: NaiveDate) -> MonthYear {
        MonthYear {
            year: date.year(),
            month: Month::of(date),
        }
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.year, self.month.abbrev())
    }
}

/// A normalized transaction row.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub branch: String,
    pub city: String,
    pub customer_type: String,
    pub gender: String,
    pub product_line: String,
    pub payment: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub unit_price: f64,
    pub quantity: u32,
    pub tax: f64,
    pub total: f64,
    pub cogs: f64,
    pub gross_income: f64,
    pub rating: f64,
    pub month: Month,
    pub period: MonthYear,
}

/// The loaded dataset. Built once by the loader and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct SalesTable {
    records: Vec<Record>,
}

impl SalesTable {
    /// Wraps already-normalized records, stable-sorting them by month.
    pub fn new(mut records: Vec<Record>) -> Self {
        records.sort_by_key(|r| r.month);
        SalesTable { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.date).min()?;
        let max = self.records.iter().map(|r| r.date).max()?;
        Some((min, max))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    pub key: String,
    pub value: f64,
}

/// A `key -> value` aggregate, e.g. Total per City. Rows are unique by key and
/// already in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedSum {
    pub key_label: String,
    pub value_label: String,
    pub rows: Vec<GroupRow>,
}

impl GroupedSum {
    pub fn total(&self) -> f64 {
        self.rows.iter().map(|r| r.value).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One leaf of the City > Product line > Gender treemap.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyRow {
    pub city: String,
    pub product_line: String,
    pub gender: String,
    pub cogs: f64,
}

/// Mean cogs per month for one city. `None` marks a month with no rows.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow {
    pub city: String,
    pub cells: Vec<(Month, Option<f64>)>,
}

/// Scalar metrics shown on the dashboard cards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub row_count: usize,
    pub total_sales: f64,
    pub total_cogs: f64,
    pub total_profit: f64,
    pub total_revenue: f64,
    pub profit_margin_pct: Option<f64>,
    pub total_quantity: u64,
    pub total_tax: f64,
    pub total_gross_income: f64,
    pub avg_unit_price: Option<f64>,
    pub avg_rating: Option<f64>,
}

/// Reference values the gauges are drawn against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Targets {
    pub rating: f64,
    pub sales: f64,
}

impl Default for Targets {
    fn default() -> Self {
        Targets {
            rating: 8.0,
            sales: 5000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gauges {
    /// Average rating on a 0-10 axis, `None` when nothing matched.
    pub rating: Option<f64>,
    pub rating_target: f64,
    pub rating_on_target: bool,
    /// Total sales as a percentage of the sales target.
    pub sales_performance_pct: Option<f64>,
}

/// Everything written to `summary.json`.
#[derive(Debug, Serialize)]
pub struct SummaryStats<'a> {
    pub filters: &'a crate::filter::FilterSpec,
    pub metrics: &'a Metrics,
    pub gauges: &'a Gauges,
}

/// Row of the sample-table preview.
#[derive(Debug, Clone, Tabled)]
pub struct SampleRow {
    #[tabled(rename = "Customer type")]
    pub customer_type: String,
    #[tabled(rename = "Branch")]
    pub branch: String,
    #[tabled(rename = "City")]
    pub city: String,
    #[tabled(rename = "Total")]
    pub total: String,
    #[tabled(rename = "cogs")]
    pub cogs: String,
    #[tabled(rename = "Product line")]
    pub product_line: String,
    #[tabled(rename = "Quantity")]
    pub quantity: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_order_is_calendar_order() {
        assert!(Month::February < Month::December);
        assert!(Month::April < Month::August); // alphabetical would say otherwise
        let mut names = vec![Month::December, Month::April, Month::January];
        names.sort();
        assert_eq!(names, vec![Month::January, Month::April, Month::December]);
    }

    #[test]
    fn month_from_date() {
        let d = NaiveDate::from_ymd_opt(2019, 3, 8).unwrap();
        assert_eq!(Month::of(d), Month::March);
        assert_eq!(Month::of(d).abbrev(), "Mar");
        assert_eq!(Month::December.to_string(), "December");
    }

    #[test]
    fn month_year_label_and_order() {
        let a = MonthYear::of(NaiveDate::from_ymd_opt(2018, 12, 31).unwrap());
        let b = MonthYear::of(NaiveDate::from_ymd_opt(2019, 1, 1).unwrap());
        assert!(a < b);
        assert_eq!(b.to_string(), "2019 : Jan");
        assert_eq!(a.to_string(), "2018 : Dec");
    }
}
