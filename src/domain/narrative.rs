//! Plain-text market report: a fixed-width price table followed by a short
//! narrative of the window's moves.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const NO_DATA_MESSAGE: &str = "No data available for analysis.";

/// Points needed before a short-term trend line is emitted.
const TREND_WINDOW: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OilDataPoint {
    pub date: NaiveDate,
    /// Closing price.
    pub price: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub volume: u64,
}

/// 1_234 -> "1.23K", 2_500_000 -> "2.50M", 999 -> "999".
pub fn format_volume(volume: u64) -> String {
    if volume >= 1_000_000 {
        format!("{:.2}M", volume as f64 / 1_000_000.0)
    } else if volume >= 1_000 {
        format!("{:.2}K", volume as f64 / 1_000.0)
    } else {
        volume.to_string()
    }
}

/// Render the report for `series`, newest point first.
///
/// The input is expected newest-first; it is re-sorted that way so an
/// ascending series renders the same.
pub fn format_market_report(series: &[OilDataPoint]) -> String {
    if series.is_empty() {
        return NO_DATA_MESSAGE.to_string();
    }

    let mut points: Vec<&OilDataPoint> = series.iter().collect();
    points.sort_by(|a, b| b.date.cmp(&a.date));

    let mut out = String::new();
    write_table(&mut out, &points);
    out.push('\n');
    write_summary(&mut out, &points);
    out
}

fn write_table(out: &mut String, points: &[&OilDataPoint]) {
    out.push_str(&format!(
        "{:<12} {:>10} {:>10} {:>10} {:>10} {:>10}\n",
        "Date", "Price", "Open", "High", "Low", "Volume"
    ));
    out.push_str(&"-".repeat(67));
    out.push('\n');
    for p in points {
        out.push_str(&format!(
            "{:<12} {:>10} {:>10} {:>10} {:>10} {:>10}\n",
            p.date.format("%Y-%m-%d").to_string(),
            format!("${:.2}", p.price),
            format!("${:.2}", p.open),
            format!("${:.2}", p.high),
            format!("${:.2}", p.low),
            format_volume(p.volume),
        ));
    }
}

fn write_summary(out: &mut String, points: &[&OilDataPoint]) {
    let newest = points[0];
    let oldest = points[points.len() - 1];

    let change = newest.price - oldest.price;
    let change_pct = if oldest.price != 0.0 {
        change / oldest.price * 100.0
    } else {
        0.0
    };
    let direction = if change > 0.0 {
        "increased"
    } else if change < 0.0 {
        "decreased"
    } else {
        "remained unchanged"
    };

    out.push_str("Summary:\n");
    if change == 0.0 {
        out.push_str(&format!(
            "From {} to {}, the price {} at ${:.2}.\n",
            oldest.date, newest.date, direction, newest.price
        ));
    } else {
        out.push_str(&format!(
            "From {} to {}, the price {} by ${:.2} ({:+.2}%).\n",
            oldest.date,
            newest.date,
            direction,
            change.abs(),
            change_pct
        ));
    }
    out.push_str(&format!(
        "The latest price is ${:.2} ({}).\n",
        newest.price, newest.date
    ));

    let min = points.iter().map(|p| p.price).fold(f64::INFINITY, f64::min);
    let max = points.iter().map(|p| p.price).fold(f64::NEG_INFINITY, f64::max);
    let avg = points.iter().map(|p| p.price).sum::<f64>() / points.len() as f64;
    out.push_str(&format!(
        "Over the period the price ranged from ${:.2} to ${:.2}, averaging ${:.2}.\n",
        min, max, avg
    ));

    if let Some((date, move_by)) = largest_daily_move(points) {
        out.push_str(&format!(
            "The largest daily move was {}${:.2} on {}.\n",
            if move_by >= 0.0 { "+" } else { "-" },
            move_by.abs(),
            date
        ));
    }

    if points.len() >= TREND_WINDOW {
        let recent = points[0].price;
        let earlier = points[TREND_WINDOW - 1].price;
        let trend = if recent > earlier {
            "an upward"
        } else if recent < earlier {
            "a downward"
        } else {
            "a flat"
        };
        out.push_str(&format!(
            "Over the last {} data points the price shows {} trend (${:.2} vs ${:.2}).\n",
            TREND_WINDOW, trend, recent, earlier
        ));
    }
}

/// Day-over-day close change with the largest magnitude, dated on the later
/// day. First occurrence wins ties.
fn largest_daily_move(points: &[&OilDataPoint]) -> Option<(NaiveDate, f64)> {
    // points are newest-first, so pair[0] is the later day
    points
        .windows(2)
        .map(|pair| (pair[0].date, pair[0].price - pair[1].price))
        .fold(None, |best, (date, delta)| match best {
            Some((_, b)) if f64::abs(b) >= delta.abs() => best,
            _ => Some((date, delta)),
        })
}
