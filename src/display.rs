//! Text rendering of dashboard state. Every function here is a pure
//! projection; nothing reads back from formatted output.

use std::fmt::Write;

use crate::models::{AssetRecord, PriceHistory, SwapResult};

pub fn format_usd(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    if value.abs() < 1.0 && value != 0.0 {
        return format!("{}${:.4}", sign, value.abs());
    }
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("{}${}.{}", sign, grouped, cents)
}

pub fn format_trend(trend_pct: f64) -> String {
    let arrow = if trend_pct >= 0.0 { '▲' } else { '▼' };
    format!("{} {:.2}%", arrow, trend_pct.abs())
}

/// `1 BTC = 20.00 ETH = $50000.00`
pub fn rate_line(from_symbol: &str, to_symbol: &str, swap: &SwapResult) -> String {
    format!(
        "{} {} = {:.2} {} = ${:.2}",
        swap.from_amount, from_symbol, swap.to_amount, to_symbol, swap.usd_value
    )
}

pub fn asset_count_label(count: usize) -> String {
    format!("{} Assets", count)
}

pub fn render_table(rows: &[AssetRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<20} {:<8} {:>16} {:>10} {:>16} {:>16}",
        "COIN", "SYMBOL", "LAST PRICE", "TREND", "VOLUME", "VALUE"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:<20} {:<8} {:>16} {:>10} {:>16.4} {:>16}",
            row.name,
            row.symbol,
            format_usd(row.last_price),
            format_trend(row.trend_pct),
            row.volume,
            format_usd(row.value_usd())
        );
    }
    let _ = write!(out, "{}", asset_count_label(rows.len()));
    out
}

pub fn history_summary(history: &PriceHistory) -> String {
    match (history.last_price(), history.min_price(), history.max_price(), history.trend_pct()) {
        (Some(last), Some(min), Some(max), trend) => format!(
            "{}: last {} | low {} | high {} | trend {}",
            history.coin_id,
            format_usd(last),
            format_usd(min),
            format_usd(max),
            trend.map(format_trend).unwrap_or_else(|| "--".to_string())
        ),
        _ => format!("{}: no data", history.coin_id),
    }
}
