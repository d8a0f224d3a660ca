use crate::filter::View;
use crate::types::{
    Gauges, GroupRow, GroupedSum, HierarchyRow, Metrics, Month, MonthYear, PivotRow, Record,
    SampleRow, Targets,
};
use crate::util::{format_number, mean};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Categorical column a grouped aggregate is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    City,
    ProductLine,
    Branch,
    CustomerType,
    Gender,
    Payment,
}

impl Dimension {
    pub fn label(self) -> &'static str {
        match self {
            Dimension::City => "City",
            Dimension::ProductLine => "Product line",
            Dimension::Branch => "Branch",
            Dimension::CustomerType => "Customer type",
            Dimension::Gender => "Gender",
            Dimension::Payment => "Payment",
        }
    }

    pub fn key(self, r: &Record) -> &str {
        match self {
            Dimension::City => &r.city,
            Dimension::ProductLine => &r.product_line,
            Dimension::Branch => &r.branch,
            Dimension::CustomerType => &r.customer_type,
            Dimension::Gender => &r.gender,
            Dimension::Payment => &r.payment,
        }
    }
}

/// Numeric column being summed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Measure {
    #[default]
    Total,
    Cogs,
    GrossIncome,
    Rating,
    Quantity,
    Tax,
}

impl Measure {
    pub fn label(self) -> &'static str {
        match self {
            Measure::Total => "Total",
            Measure::Cogs => "cogs",
            Measure::GrossIncome => "gross income",
            Measure::Rating => "Rating",
            Measure::Quantity => "Quantity",
            Measure::Tax => "Tax 5%",
        }
    }

    pub fn value(self, r: &Record) -> f64 {
        match self {
            Measure::Total => r.total,
            Measure::Cogs => r.cogs,
            Measure::GrossIncome => r.gross_income,
            Measure::Rating => r.rating,
            Measure::Quantity => f64::from(r.quantity),
            Measure::Tax => r.tax,
        }
    }
}

impl FromStr for Measure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let all = [
            Measure::Total,
            Measure::Cogs,
            Measure::GrossIncome,
            Measure::Rating,
            Measure::Quantity,
            Measure::Tax,
        ];
        all.into_iter()
            .find(|m| m.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown measure {:?}", s))
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn metrics(view: &View<'_>) -> Metrics {
    let total_sales: f64 = view.iter().map(|r| r.total).sum();
    let total_cogs: f64 = view.iter().map(|r| r.cogs).sum();
    let total_profit = total_sales - total_cogs;
    // Observed dashboard formula: revenue counts profit on top of sales.
    let total_revenue = total_sales + total_profit;
    let profit_margin_pct = if total_revenue == 0.0 {
        None
    } else {
        Some(total_profit / total_revenue * 100.0)
    };
    Metrics {
        row_count: view.len(),
        total_sales,
        total_cogs,
        total_profit,
        total_revenue,
        profit_margin_pct,
        total_quantity: view.iter().map(|r| u64::from(r.quantity)).sum(),
        total_tax: view.iter().map(|r| r.tax).sum(),
        total_gross_income: view.iter().map(|r| r.gross_income).sum(),
        avg_unit_price: mean(view.iter().map(|r| r.unit_price)),
        avg_rating: mean(view.iter().map(|r| r.rating)),
    }
}

/// Sums `measure` per distinct `dimension` value, keys ascending.
pub fn group_sum(view: &View<'_>, dimension: Dimension, measure: Measure) -> GroupedSum {
    let mut map: BTreeMap<&str, f64> = BTreeMap::new();
    for r in view.iter() {
        *map.entry(dimension.key(r)).or_insert(0.0) += measure.value(r);
    }
    GroupedSum {
        key_label: dimension.label().to_string(),
        value_label: measure.label().to_string(),
        rows: map
            .into_iter()
            .map(|(key, value)| GroupRow {
                key: key.to_string(),
                value,
            })
            .collect(),
    }
}

/// cogs per `"YYYY : Mon"` bucket, chronological.
pub fn time_series(view: &View<'_>) -> GroupedSum {
    let mut map: BTreeMap<MonthYear, f64> = BTreeMap::new();
    for r in view.iter() {
        *map.entry(r.period).or_insert(0.0) += r.cogs;
    }
    GroupedSum {
        key_label: "month_year".to_string(),
        value_label: Measure::Cogs.label().to_string(),
        rows: map
            .into_iter()
            .map(|(period, value)| GroupRow {
                key: period.to_string(),
                value,
            })
            .collect(),
    }
}

/// `measure` per month name in calendar order. Years are folded together and
/// only months that occur in the view are listed.
pub fn month_series(view: &View<'_>, measure: Measure) -> GroupedSum {
    let mut map: BTreeMap<Month, f64> = BTreeMap::new();
    for r in view.iter() {
        *map.entry(r.month).or_insert(0.0) += measure.value(r);
    }
    GroupedSum {
        key_label: "Month Name".to_string(),
        value_label: measure.label().to_string(),
        rows: map
            .into_iter()
            .map(|(month, value)| GroupRow {
                key: month.name().to_string(),
                value,
            })
            .collect(),
    }
}

/// Treemap leaves: cogs along City > Product line > Gender.
pub fn hierarchy(view: &View<'_>) -> Vec<HierarchyRow> {
    let mut map: BTreeMap<(&str, &str, &str), f64> = BTreeMap::new();
    for r in view.iter() {
        let key = (r.city.as_str(), r.product_line.as_str(), r.gender.as_str());
        *map.entry(key).or_insert(0.0) += r.cogs;
    }
    map.into_iter()
        .map(|((city, product_line, gender), cogs)| HierarchyRow {
            city: city.to_string(),
            product_line: product_line.to_string(),
            gender: gender.to_string(),
            cogs,
        })
        .collect()
}

/// Mean cogs per City x Month. Columns are the months present in the view;
/// a city with no rows in one of them gets `None` for that cell.
pub fn city_month_pivot(view: &View<'_>) -> Vec<PivotRow> {
    let mut cells: BTreeMap<&str, BTreeMap<Month, Vec<f64>>> = BTreeMap::new();
    let mut months: Vec<Month> = Vec::new();
    for r in view.iter() {
        cells
            .entry(r.city.as_str())
            .or_default()
            .entry(r.month)
            .or_default()
            .push(r.cogs);
        if !months.contains(&r.month) {
            months.push(r.month);
        }
    }
    months.sort();

    cells
        .into_iter()
        .map(|(city, by_month)| PivotRow {
            city: city.to_string(),
            cells: months
                .iter()
                .map(|m| {
                    let avg = by_month.get(m).and_then(|v| mean(v.iter().copied()));
                    (*m, avg)
                })
                .collect(),
        })
        .collect()
}

pub fn gauges(metrics: &Metrics, targets: &Targets) -> Gauges {
    let sales_performance_pct = if targets.sales == 0.0 {
        None
    } else {
        Some(metrics.total_sales / targets.sales * 100.0)
    };
    Gauges {
        rating: metrics.avg_rating,
        rating_target: targets.rating,
        rating_on_target: metrics.avg_rating.is_some_and(|r| r >= targets.rating),
        sales_performance_pct,
    }
}

/// First `n` rows of the view in the summary-table layout.
pub fn sample_rows(view: &View<'_>, n: usize) -> Vec<SampleRow> {
    view.iter()
        .take(n)
        .map(|r| SampleRow {
            customer_type: r.customer_type.clone(),
            branch: r.branch.clone(),
            city: r.city.clone(),
            total: format_number(r.total, 2),
            cogs: format_number(r.cogs, 2),
            product_line: r.product_line.clone(),
            quantity: r.quantity,
        })
        .collect()
}

/// Every aggregate one dashboard refresh displays.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub metrics: Metrics,
    pub gauges: Gauges,
    pub sales_by_city: GroupedSum,
    pub sales_by_product_line: GroupedSum,
    pub sales_by_branch: GroupedSum,
    pub sales_by_customer_type: GroupedSum,
    pub sales_by_gender: GroupedSum,
    pub cogs_by_product_line: GroupedSum,
    pub cogs_by_payment: GroupedSum,
    pub cogs_by_customer_type: GroupedSum,
    pub time_series: GroupedSum,
    pub month_series: GroupedSum,
    pub hierarchy: Vec<HierarchyRow>,
    pub pivot: Vec<PivotRow>,
    pub sample: Vec<SampleRow>,
}

impl Dashboard {
    pub fn build(
        view: &View<'_>,
        targets: &Targets,
        month_measure: Measure,
        sample_size: usize,
    ) -> Dashboard {
        let metrics = metrics(view);
        let gauges = gauges(&metrics, targets);
        Dashboard {
            sales_by_city: group_sum(view, Dimension::City, Measure::Total),
            sales_by_product_line: group_sum(view, Dimension::ProductLine, Measure::Total),
            sales_by_branch: group_sum(view, Dimension::Branch, Measure::Total),
            sales_by_customer_type: group_sum(view, Dimension::CustomerType, Measure::Total),
            sales_by_gender: group_sum(view, Dimension::Gender, Measure::Total),
            cogs_by_product_line: group_sum(view, Dimension::ProductLine, Measure::Cogs),
            cogs_by_payment: group_sum(view, Dimension::Payment, Measure::Cogs),
            cogs_by_customer_type: group_sum(view, Dimension::CustomerType, Measure::Cogs),
            time_series: time_series(view),
            month_series: month_series(view, month_measure),
            hierarchy: hierarchy(view),
            pivot: city_month_pivot(view),
            sample: sample_rows(view, sample_size),
            metrics,
            gauges,
        }
    }

    /// Grouped aggregates paired with the file name each is exported under.
    pub fn exports(&self) -> Vec<(&'static str, &GroupedSum)> {
        vec![
            ("City.csv", &self.sales_by_city),
            ("Product line.csv", &self.sales_by_product_line),
            ("Branch.csv", &self.sales_by_branch),
            ("Customer type.csv", &self.sales_by_customer_type),
            ("Gender.csv", &self.sales_by_gender),
            ("Payment.csv", &self.cogs_by_payment),
            ("TimeSeries.csv", &self.time_series),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{apply, FilterSpec, Selection};
    use crate::fixtures::{approx, record, sample_table, value_of, ymd};
    use crate::types::SalesTable;

    #[test]
    fn city_filter_example() {
        let table = SalesTable::new(vec![
            record("Lagos", 100.0, 60.0, ymd(2019, 1, 1)),
            record("Abuja", 50.0, 20.0, ymd(2019, 1, 2)),
        ]);
        let spec = FilterSpec {
            city: Selection::Only("Lagos".into()),
            ..FilterSpec::default()
        };
        let m = metrics(&apply(&table, &spec));
        assert_eq!(m.total_sales, 100.0);
        assert_eq!(m.total_cogs, 60.0);
        assert_eq!(m.total_profit, 40.0);
        assert_eq!(m.total_revenue, 140.0);
        let margin = m.profit_margin_pct.unwrap();
        assert!((margin - 28.571428).abs() < 1e-4, "margin was {margin}");
    }

    #[test]
    fn scalar_metrics_over_fixture() {
        let table = sample_table();
        let m = metrics(&View::all(&table));
        assert_eq!(m.row_count, 8);
        assert!(approx(m.total_sales, 525.0));
        assert!(approx(m.total_cogs, 500.0));
        assert!(approx(m.total_profit, m.total_sales - m.total_cogs));
        assert!(approx(m.total_revenue, 550.0));
        assert_eq!(m.total_quantity, 30);
        assert!(approx(m.total_tax, 25.0));
        assert!(approx(m.total_gross_income, 25.0));
        assert!(approx(m.avg_unit_price.unwrap(), 24.375));
        assert!(approx(m.avg_rating.unwrap(), 7.3375));
    }

    #[test]
    fn empty_view_gives_degenerate_values() {
        let table = sample_table();
        let spec = FilterSpec {
            date_start: Some(ymd(2019, 3, 1)),
            date_end: Some(ymd(2019, 1, 1)),
            ..FilterSpec::default()
        };
        let view = apply(&table, &spec);
        let d = Dashboard::build(&view, &Targets::default(), Measure::Total, 5);
        assert_eq!(d.metrics.total_sales, 0.0);
        assert_eq!(d.metrics.total_cogs, 0.0);
        assert_eq!(d.metrics.total_profit, 0.0);
        assert_eq!(d.metrics.total_revenue, 0.0);
        assert_eq!(d.metrics.total_quantity, 0);
        assert_eq!(d.metrics.profit_margin_pct, None);
        assert_eq!(d.metrics.avg_unit_price, None);
        assert_eq!(d.metrics.avg_rating, None);
        assert_eq!(d.gauges.rating, None);
        assert_eq!(d.gauges.sales_performance_pct, Some(0.0));
        assert!(!d.gauges.rating_on_target);
        for (_, g) in d.exports() {
            assert!(g.is_empty());
        }
        assert!(d.month_series.is_empty());
        assert!(d.hierarchy.is_empty());
        assert!(d.pivot.is_empty());
        assert!(d.sample.is_empty());
    }

    #[test]
    fn grouped_sums_agree_with_scalars() {
        let table = sample_table();
        let specs = [
            FilterSpec::default(),
            FilterSpec {
                gender: Selection::Only("Male".into()),
                ..FilterSpec::default()
            },
            FilterSpec {
                customer_type: Selection::Only("Member".into()),
                date_end: Some(ymd(2019, 2, 28)),
                ..FilterSpec::default()
            },
        ];
        let dims = [
            Dimension::City,
            Dimension::ProductLine,
            Dimension::Branch,
            Dimension::CustomerType,
            Dimension::Gender,
            Dimension::Payment,
        ];
        for spec in &specs {
            let view = apply(&table, spec);
            let m = metrics(&view);
            for dim in dims {
                assert!(approx(group_sum(&view, dim, Measure::Total).total(), m.total_sales));
                assert!(approx(group_sum(&view, dim, Measure::Cogs).total(), m.total_cogs));
            }
            assert!(approx(time_series(&view).total(), m.total_cogs));
            let tree: f64 = hierarchy(&view).iter().map(|h| h.cogs).sum();
            assert!(approx(tree, m.total_cogs));
        }
    }

    #[test]
    fn group_keys_are_unique_and_ascending() {
        let table = sample_table();
        let g = group_sum(&View::all(&table), Dimension::City, Measure::Total);
        let keys: Vec<&str> = g.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["Mandalay", "Naypyitaw", "Yangon"]);
        assert!(approx(value_of(&g, "Yangon").unwrap(), 210.0));
        assert!(approx(value_of(&g, "Mandalay").unwrap(), 168.0));
        assert!(approx(value_of(&g, "Naypyitaw").unwrap(), 147.0));
        assert_eq!(g.key_label, "City");
        assert_eq!(g.value_label, "Total");
    }

    #[test]
    fn time_series_is_chronological() {
        let table = sample_table();
        let ts = time_series(&View::all(&table));
        let keys: Vec<&str> = ts.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["2018 : Dec", "2019 : Jan", "2019 : Feb", "2019 : Mar"]
        );
        let values: Vec<f64> = ts.rows.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![40.0, 160.0, 190.0, 110.0]);
    }

    #[test]
    fn month_series_uses_calendar_order() {
        let table = sample_table();
        let ms = month_series(&View::all(&table), Measure::Cogs);
        let keys: Vec<&str> = ms.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["January", "February", "March", "December"]);
    }

    #[test]
    fn pivot_marks_missing_cells() {
        let table = sample_table();
        let pivot = city_month_pivot(&View::all(&table));
        let mandalay = pivot.iter().find(|p| p.city == "Mandalay").unwrap();
        assert_eq!(
            mandalay.cells,
            vec![
                (Month::January, None),
                (Month::February, Some(100.0)),
                (Month::March, Some(60.0)),
                (Month::December, None),
            ]
        );
        let yangon = pivot.iter().find(|p| p.city == "Yangon").unwrap();
        // February: (40 + 50) / 2
        assert_eq!(yangon.cells[1], (Month::February, Some(45.0)));
    }

    #[test]
    fn gauges_against_targets() {
        let table = sample_table();
        let m = metrics(&View::all(&table));
        let g = gauges(&m, &Targets::default());
        assert!(approx(g.sales_performance_pct.unwrap(), 10.5));
        assert!(!g.rating_on_target);

        let g = gauges(
            &m,
            &Targets {
                rating: 7.0,
                sales: 525.0,
            },
        );
        assert!(g.rating_on_target);
        assert!(approx(g.sales_performance_pct.unwrap(), 100.0));
    }

    #[test]
    fn sales_gauge_is_zero_for_no_sales_and_undefined_for_zero_target() {
        let empty = SalesTable::default();
        let m = metrics(&View::all(&empty));
        assert_eq!(gauges(&m, &Targets::default()).sales_performance_pct, Some(0.0));

        let table = sample_table();
        let m = metrics(&View::all(&table));
        let zero = Targets {
            rating: 8.0,
            sales: 0.0,
        };
        assert_eq!(gauges(&m, &zero).sales_performance_pct, None);
    }

    #[test]
    fn sample_rows_follow_table_order() {
        let table = sample_table();
        let rows = sample_rows(&View::all(&table), 3);
        assert_eq!(rows.len(), 3);
        // January rows come first after the month sort.
        assert_eq!(rows[0].city, "Yangon");
        assert_eq!(rows[0].total, "63.00");
        assert_eq!(rows[1].city, "Naypyitaw");
    }

    #[test]
    fn measure_parsing() {
        assert_eq!("cogs".parse::<Measure>(), Ok(Measure::Cogs));
        assert_eq!("Gross Income".parse::<Measure>(), Ok(Measure::GrossIncome));
        assert!("profit".parse::<Measure>().is_err());
    }
}
