// Entry point and high-level CLI flow.
//
// By default the binary loads the file, applies the filters given on the
// command line, prints the dashboard and writes the exports. With
// `--interactive` it runs a menu loop instead:
// - [1] loads the file,
// - [2] changes the filters,
// - [3] prints the dashboard and writes the exports.
// Each change of filters produces a fresh `Session`; nothing is global.
use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use sales_dashboard::config::Config;
use sales_dashboard::filter::{FilterSpec, Selection};
use sales_dashboard::session::Session;
use sales_dashboard::types::SummaryStats;
use sales_dashboard::{loader, output, util};
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Print `prompt` and read one trimmed line. `None` once the input is closed.
fn read_line<R: BufRead>(input: &mut R, prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match input.read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Loads `config.data`; the path `-` reads the CSV from stdin.
fn load_session(config: &Config) -> anyhow::Result<Session> {
    let encoding = loader::resolve_encoding(&config.encoding)?;
    let loaded = if config.data == Path::new("-") {
        loader::load_reader(io::stdin().lock(), encoding)
    } else {
        loader::load_path(&config.data, encoding)
    };
    let (table, report) =
        loaded.with_context(|| format!("Failed to load {}", config.data.display()))?;
    println!(
        "Processing dataset... ({} rows loaded)",
        util::format_int(report.total_rows)
    );
    if report.decode_errors {
        println!("Note: some bytes were not valid {} and were replaced.", config.encoding);
    }
    if table.is_empty() {
        println!("Warning: the file has a header but no rows.");
    }
    if let Some((first, last)) = report.date_range {
        println!("Dates: {} to {}", first, last);
    }
    let months: Vec<&str> = report.months.iter().map(|m| m.name()).collect();
    println!("Months present: {}\n", months.join(", "));
    Ok(Session::new(table, config.targets()))
}

fn describe_filters(spec: &FilterSpec) -> String {
    if spec.is_unfiltered() {
        return "none".to_string();
    }
    let date = |d: Option<chrono::NaiveDate>| d.map_or("-".to_string(), |d| d.to_string());
    format!(
        "branch={} customer_type={} gender={} city={} dates={}..{}",
        spec.branch,
        spec.customer_type,
        spec.gender,
        spec.city,
        date(spec.date_start),
        date(spec.date_end)
    )
}

/// Prints every dashboard section for the session's current filters and
/// writes the CSV exports plus `summary.json`.
fn generate_reports(session: &Session, config: &Config) -> anyhow::Result<()> {
    let dashboard = session.dashboard(config.metric, config.preview_rows);
    println!("Filters: {}", describe_filters(session.filters()));
    println!(
        "Rows matched: {} of {}\n",
        util::format_int(dashboard.metrics.row_count),
        util::format_int(session.table().len())
    );
    if dashboard.metrics.row_count == 0 {
        println!("No rows match the selected filters.\n");
    }

    println!("Total Metrics\n");
    output::print_cards(&dashboard.metrics);

    println!(
        "Average Customer Rating: {} (target {})",
        util::format_opt(dashboard.gauges.rating, 2),
        util::format_number(dashboard.gauges.rating_target, 1)
    );
    println!(
        "Sales Performance: {}% of target\n",
        util::format_opt(dashboard.gauges.sales_performance_pct, 2)
    );

    output::preview_grouped("City wise Sales", &dashboard.sales_by_city);
    output::preview_grouped("Product wise Sales (cogs)", &dashboard.cogs_by_product_line);
    output::preview_grouped("Time Series Analysis", &dashboard.time_series);
    println!("Hierarchical view of Sales (cogs)\n");
    output::preview_hierarchy(&dashboard.hierarchy);
    println!("Month wise Sales Summary\n");
    output::preview_table_rows(&dashboard.sample, config.preview_rows);
    println!("Month wise sub-Category Table (mean cogs)\n");
    output::preview_pivot(&dashboard.pivot);
    output::preview_grouped("Payment wise Sales (cogs)", &dashboard.cogs_by_payment);
    output::preview_grouped("Customer wise Sales (cogs)", &dashboard.cogs_by_customer_type);
    output::preview_grouped("Total Sales By Branch", &dashboard.sales_by_branch);
    output::preview_grouped("Total Sales By Customer", &dashboard.sales_by_customer_type);
    output::preview_grouped("Sales By Gender", &dashboard.sales_by_gender);
    output::preview_grouped("Sales By Product Line", &dashboard.sales_by_product_line);
    output::preview_grouped(
        &format!("{} Over Months", config.metric),
        &dashboard.month_series,
    );

    let written = output::export_all(&config.out_dir, &dashboard)
        .with_context(|| format!("Failed to export to {}", config.out_dir.display()))?;
    let summary_path = config.out_dir.join("summary.json");
    output::write_json(
        &summary_path,
        &SummaryStats {
            filters: session.filters(),
            metrics: &dashboard.metrics,
            gauges: &dashboard.gauges,
        },
    )
    .with_context(|| format!("Failed to write {}", summary_path.display()))?;
    println!(
        "(Exported {} tables and summary.json to {})\n",
        written.len(),
        config.out_dir.display()
    );
    Ok(())
}

fn pick<R: BufRead>(input: &mut R, label: &str, values: &[String], current: Selection) -> Selection {
    let prompt = format!("{} [all, {}] (now: {}): ", label, values.join(", "), current);
    match read_line(input, &prompt) {
        Some(answer) if !answer.is_empty() => answer.parse().unwrap_or(current),
        _ => current,
    }
}

fn ask_date<R: BufRead>(
    input: &mut R,
    label: &str,
    hint: &str,
    current: Option<NaiveDate>,
) -> Option<NaiveDate> {
    loop {
        let prompt = format!("{} (blank = {}, '-' = unbounded): ", label, hint);
        let Some(answer) = read_line(input, &prompt) else {
            return current;
        };
        match answer.as_str() {
            "" => return current,
            "-" => return None,
            text => match util::parse_date_safe(Some(text)) {
                Some(d) => return Some(d),
                None => println!("Invalid date. Use YYYY-MM-DD or M/D/YYYY."),
            },
        }
    }
}

/// Ask for each filter in turn. A blank answer, or closed input, keeps the
/// current value.
fn prompt_filters<R: BufRead>(input: &mut R, session: &Session) -> FilterSpec {
    let options = session.options();
    let current = session.filters().clone();

    let branch = pick(input, "Branch", &options.branches, current.branch);
    let customer_type = pick(
        input,
        "Customer type",
        &options.customer_types,
        current.customer_type,
    );
    let gender = pick(input, "Gender", &options.genders, current.gender);
    let city = pick(input, "City", &options.cities, current.city);

    let (min, max) = match options.date_range {
        Some((min, max)) => (min.to_string(), max.to_string()),
        None => ("-".to_string(), "-".to_string()),
    };
    let date_start = ask_date(input, "Start Date", &min, current.date_start);
    let date_end = ask_date(input, "End Date", &max, current.date_end);

    FilterSpec {
        branch,
        customer_type,
        gender,
        city,
        date_start,
        date_end,
    }
}

/// Menu loop. Returns the session that was active when the user exited or
/// the input ran out.
fn run_interactive<R: BufRead>(config: &Config, input: &mut R) -> Option<Session> {
    let mut session: Option<Session> = None;
    loop {
        println!("Sales Dashboard:");
        println!("[1] Load the file");
        println!("[2] Set filters");
        println!("[3] Generate Reports");
        println!("[4] Exit\n");
        let Some(choice) = read_line(input, "Enter choice: ") else {
            println!("\nExiting the program.");
            return session;
        };
        match choice.as_str() {
            "1" => match load_session(config) {
                Ok(loaded) => session = Some(loaded.with_filters(config.filters())),
                Err(e) => eprintln!("{:#}\n", e),
            },
            "2" => match &session {
                Some(current) => {
                    let spec = prompt_filters(input, current);
                    session = Some(current.with_filters(spec));
                    println!();
                }
                None => println!("Error: No data loaded. Please load the CSV file first (option 1).\n"),
            },
            "3" => match &session {
                Some(current) => {
                    println!();
                    if let Err(e) = generate_reports(current, config) {
                        eprintln!("{:#}\n", e);
                    }
                }
                None => println!("Error: No data loaded. Please load the CSV file first (option 1).\n"),
            },
            "4" => {
                println!("Exiting the program.");
                return session;
            }
            _ => println!("Invalid choice. Please enter 1, 2, 3 or 4.\n"),
        }
    }
}

/// `--verbose` forces DEBUG. Otherwise `RUST_LOG` decides, falling back to
/// WARN when it is unset or unparseable.
fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    rust_log
        .and_then(|spec| EnvFilter::try_new(spec).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(config.verbose, rust_log.as_deref()))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    if config.interactive {
        if config.data == Path::new("-") {
            anyhow::bail!("--interactive reads menu choices from stdin; pass a file path as data");
        }
        run_interactive(&config, &mut io::stdin().lock());
        return Ok(());
    }

    let session = load_session(&config)?.with_filters(config.filters());
    generate_reports(&session, &config)
}
