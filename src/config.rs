// Command-line configuration.
use crate::filter::{FilterSpec, Selection};
use crate::loader::DEFAULT_ENCODING;
use crate::reports::Measure;
use crate::types::Targets;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "sales-dashboard")]
#[command(about = "Filter a supermarket sales CSV and summarize it")]
#[command(version)]
pub struct Config {
    /// Path to the sales CSV
    #[arg(default_value = "supermarket_sales.csv")]
    pub data: PathBuf,

    /// Text encoding of the input file (any WHATWG label)
    #[arg(long, default_value = DEFAULT_ENCODING)]
    pub encoding: String,

    /// Directory the CSV exports and summary.json are written to
    #[arg(short, long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Branch to keep, or "all"
    #[arg(long, default_value = "all")]
    pub branch: Selection,

    /// Customer type to keep, or "all"
    #[arg(long, default_value = "all")]
    pub customer_type: Selection,

    /// Gender to keep, or "all"
    #[arg(long, default_value = "all")]
    pub gender: Selection,

    /// City to keep, or "all"
    #[arg(long, default_value = "all")]
    pub city: Selection,

    /// First date to include (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last date to include (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Column summed in the month-by-month series
    #[arg(long, default_value = "Total")]
    pub metric: Measure,

    /// Rating the rating gauge is measured against
    #[arg(long, default_value_t = 8.0)]
    pub target_rating: f64,

    /// Sales figure that counts as 100% on the performance gauge
    #[arg(long, default_value_t = 5000.0)]
    pub target_sales: f64,

    /// Rows shown in the sample table
    #[arg(long, default_value_t = 5)]
    pub preview_rows: usize,

    /// Run the menu-driven session instead of a single report
    #[arg(short, long)]
    pub interactive: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    pub fn filters(&self) -> FilterSpec {
        FilterSpec {
            branch: self.branch.clone(),
            customer_type: self.customer_type.clone(),
            gender: self.gender.clone(),
            city: self.city.clone(),
            date_start: self.start,
            date_end: self.end,
        }
    }

    pub fn targets(&self) -> Targets {
        Targets {
            rating: self.target_rating,
            sales: self.target_sales,
        }
    }
}
