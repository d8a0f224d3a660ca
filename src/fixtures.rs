// Shared test data. Eight rows across three branches, four months and two
// years: Total sums to 525, cogs to 500, Quantity to 30.
use crate::loader::load_reader;
use crate::types::{GroupedSum, Month, MonthYear, Record, SalesTable};
use chrono::{NaiveDate, NaiveTime};

pub const HEADER: &str = "Invoice ID,Branch,City,Customer type,Gender,Product line,Unit price,Quantity,Tax 5%,Total,Date,Time,Payment,cogs,gross margin percentage,gross income,Rating";

pub const SAMPLE_CSV: &str = "\
Invoice ID,Branch,City,Customer type,Gender,Product line,Unit price,Quantity,Tax 5%,Total,Date,Time,Payment,cogs,gross margin percentage,gross income,Rating
750-67-8428,A,Yangon,Member,Female,Health and beauty,10.00,5,2.5,52.5,3/8/2019,10:29,Ewallet,50,4.761904762,2.5,9.1
226-31-3081,C,Naypyitaw,Normal,Female,Electronic accessories,20.00,2,2,42,12/8/2018,10:29,Cash,40,4.761904762,2,9.6
631-41-3108,A,Yangon,Normal,Male,Home and lifestyle,40.00,1,2,42,2/3/2019,13:23,Credit card,40,4.761904762,2,7.4
123-19-1176,A,Yangon,Member,Male,Health and beauty,30.00,2,3,63,1/27/2019,20:33,Ewallet,60,4.761904762,3,8.4
373-73-7910,B,Mandalay,Normal,Male,Sports and travel,50.00,2,5,105,2/8/2019,10:37,Ewallet,100,4.761904762,5,5.3
699-14-3026,B,Mandalay,Member,Female,Electronic accessories,15.00,4,3,63,3/25/2019,18:30,Ewallet,60,4.761904762,3,4.1
355-53-5943,C,Naypyitaw,Member,Male,Food and beverages,25.00,4,5,105,1/10/2019,14:36,Cash,100,4.761904762,5,5.8
315-22-5665,A,Yangon,Normal,Female,Fashion accessories,5.00,10,2.5,52.5,2/20/2019,11:38,Credit card,50,4.761904762,2.5,9.0
";

pub fn sample_table() -> SalesTable {
    let (table, _) = load_reader(SAMPLE_CSV.as_bytes(), encoding_rs::UTF_8).unwrap();
    table
}

/// Minimal record for hand-built tables.
pub fn record(city: &str, total: f64, cogs: f64, date: NaiveDate) -> Record {
    Record {
        branch: "A".into(),
        city: city.into(),
        customer_type: "Member".into(),
        gender: "Female".into(),
        product_line: "Food and beverages".into(),
        payment: "Cash".into(),
        date,
        time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        unit_price: cogs,
        quantity: 1,
        tax: total - cogs,
        total,
        cogs,
        gross_income: total - cogs,
        rating: 7.0,
        month: Month::of(date),
        period: MonthYear::of(date),
    }
}

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

pub fn value_of(grouped: &GroupedSum, key: &str) -> Option<f64> {
    grouped.rows.iter().find(|r| r.key == key).map(|r| r.value)
}
