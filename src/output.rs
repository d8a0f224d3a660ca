use crate::error::ExportError;
use crate::reports::Dashboard;
use crate::types::{GroupRow, GroupedSum, HierarchyRow, Metrics, PivotRow};
use crate::util::{format_number, format_opt};
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

/// Writes a grouped aggregate as UTF-8 CSV: a `key,value` header named after
/// the grouping, then one row per group in display order.
pub fn write_grouped<W: Write>(writer: W, grouped: &GroupedSum) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([grouped.key_label.as_str(), grouped.value_label.as_str()])?;
    for row in &grouped.rows {
        wtr.write_record([row.key.as_str(), row.value.to_string().as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_grouped_file(path: &Path, grouped: &GroupedSum) -> Result<(), ExportError> {
    write_grouped(File::create(path)?, grouped)
}

/// Parses a file produced by `write_grouped` back into a `GroupedSum`.
pub fn read_grouped<R: Read>(reader: R) -> Result<GroupedSum, ExportError> {
    let mut rdr = csv::ReaderBuilder::new().from_reader(reader);
    let headers = rdr.headers()?.clone();
    if headers.len() != 2 {
        return Err(ExportError::MalformedExport(format!(
            "expected 2 columns, found {}",
            headers.len()
        )));
    }
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let value = record[1].parse::<f64>().map_err(|_| {
            ExportError::MalformedExport(format!("not a number: {:?}", &record[1]))
        })?;
        rows.push(GroupRow {
            key: record[0].to_string(),
            value,
        });
    }
    Ok(GroupedSum {
        key_label: headers[0].to_string(),
        value_label: headers[1].to_string(),
        rows,
    })
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ExportError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Writes every grouped export of `dashboard` into `dir` and returns the
/// paths written.
pub fn export_all(dir: &Path, dashboard: &Dashboard) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    for (name, grouped) in dashboard.exports() {
        let path = dir.join(name);
        write_grouped_file(&path, grouped)?;
        written.push(path);
    }
    info!(files = written.len(), dir = %dir.display(), "exports written");
    Ok(written)
}

pub fn print_cards(m: &Metrics) {
    println!("Total Sales: ${}", format_number(m.total_sales, 2));
    println!("Total Profit: ${}", format_number(m.total_profit, 2));
    println!("Total Revenue: ${}", format_number(m.total_revenue, 2));
    println!(
        "Total Profit Margin: {}%",
        format_opt(m.profit_margin_pct, 2)
    );
    println!(
        "Average Unit Price: {} | Total Quantity Sold: {} | Total Tax Amount: {}",
        format_opt(m.avg_unit_price, 2),
        crate::util::format_int(m.total_quantity),
        format_number(m.total_tax, 2)
    );
    println!(
        "Total Gross Income: {} | Average Rating: {}\n",
        format_number(m.total_gross_income, 2),
        format_opt(m.avg_rating, 2)
    );
}

/// Renders a grouped aggregate as a markdown table headed by its labels.
pub fn grouped_table(grouped: &GroupedSum) -> String {
    let mut lines = vec![vec![grouped.key_label.clone(), grouped.value_label.clone()]];
    lines.extend(
        grouped
            .rows
            .iter()
            .map(|r| vec![r.key.clone(), format_number(r.value, 2)]),
    );
    Table::from_iter(lines).with(Style::markdown()).to_string()
}

pub fn preview_grouped(title: &str, grouped: &GroupedSum) {
    println!("{}\n", title);
    if grouped.is_empty() {
        println!("(no rows)\n");
        return;
    }
    println!("{}", grouped_table(grouped));
    println!("Sum: {}\n", format_number(grouped.total(), 2));
}

pub fn preview_hierarchy(rows: &[HierarchyRow]) {
    if rows.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let mut lines = vec![vec![
        "City".to_string(),
        "Product line".to_string(),
        "Gender".to_string(),
        "cogs".to_string(),
    ]];
    lines.extend(rows.iter().map(|h| {
        vec![
            h.city.clone(),
            h.product_line.clone(),
            h.gender.clone(),
            format_number(h.cogs, 2),
        ]
    }));
    println!("{}\n", Table::from_iter(lines).with(Style::markdown()));
}

pub fn preview_pivot(rows: &[PivotRow]) {
    let Some(first) = rows.first() else {
        println!("(no rows)\n");
        return;
    };
    let mut header = vec!["City".to_string()];
    header.extend(first.cells.iter().map(|(m, _)| m.name().to_string()));
    let mut lines = vec![header];
    lines.extend(rows.iter().map(|p| {
        let mut line = vec![p.city.clone()];
        line.extend(p.cells.iter().map(|(_, v)| format_opt(*v, 2)));
        line
    }));
    println!("{}\n", Table::from_iter(lines).with(Style::markdown()));
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}
