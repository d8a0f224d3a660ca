// Sidebar filters: categorical equality plus an inclusive date range.
use crate::types::{Record, SalesTable};
use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// One categorical control. `All` disables the predicate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => wanted == value,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }
}

impl FromStr for Selection {
    type Err = Infallible;

    /// Blank input and `all` (any case) mean no filter. Anything else is an
    /// exact, case-sensitive value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(Selection::All)
        } else {
            Ok(Selection::Only(s.to_string()))
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => f.write_str("all"),
            Selection::Only(v) => f.write_str(v),
        }
    }
}

impl Serialize for Selection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The active set of predicates. `Default` matches every row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilterSpec {
    pub branch: Selection,
    pub customer_type: Selection,
    pub gender: Selection,
    pub city: Selection,
    /// Inclusive. `None` means the earliest date in the table.
    pub date_start: Option<NaiveDate>,
    /// Inclusive. `None` means the latest date in the table.
    pub date_end: Option<NaiveDate>,
}

impl FilterSpec {
    /// Predicates run in the order branch, customer type, gender, city, dates.
    pub fn matches(&self, r: &Record) -> bool {
        self.branch.matches(&r.branch)
            && self.customer_type.matches(&r.customer_type)
            && self.gender.matches(&r.gender)
            && self.city.matches(&r.city)
            && self.date_start.map_or(true, |start| r.date >= start)
            && self.date_end.map_or(true, |end| r.date <= end)
    }

    pub fn is_unfiltered(&self) -> bool {
        self.branch.is_all()
            && self.customer_type.is_all()
            && self.gender.is_all()
            && self.city.is_all()
            && self.date_start.is_none()
            && self.date_end.is_none()
    }
}

/// Borrowed subset of a `SalesTable`, in table order.
#[derive(Debug, Clone)]
pub struct View<'a> {
    rows: Vec<&'a Record>,
}

impl<'a> View<'a> {
    pub fn all(table: &'a SalesTable) -> Self {
        View {
            rows: table.records().iter().collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Record> + '_ {
        self.rows.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Applies `spec` to `table`. A start date after the end date yields an
/// empty view rather than an error.
pub fn apply<'a>(table: &'a SalesTable, spec: &FilterSpec) -> View<'a> {
    if spec.is_unfiltered() {
        return View::all(table);
    }
    let rows: Vec<&Record> = table
        .records()
        .iter()
        .filter(|r| spec.matches(r))
        .collect();
    debug!(kept = rows.len(), of = table.len(), "filters applied");
    View { rows }
}

/// Values each sidebar control can offer, sorted ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOptions {
    pub branches: Vec<String>,
    pub customer_types: Vec<String>,
    pub genders: Vec<String>,
    pub cities: Vec<String>,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

impl FilterOptions {
    pub fn from_table(table: &SalesTable) -> Self {
        fn distinct<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
            values.cloned().collect::<BTreeSet<_>>().into_iter().collect()
        }
        let rows = table.records();
        FilterOptions {
            branches: distinct(rows.iter().map(|r| &r.branch)),
            customer_types: distinct(rows.iter().map(|r| &r.customer_type)),
            genders: distinct(rows.iter().map(|r| &r.gender)),
            cities: distinct(rows.iter().map(|r| &r.city)),
            date_range: table.date_range(),
        }
    }
}
