//! Shared formatting helpers for grid cells.
//!
//! All pure formatting functions (no layout, no styling) live here.

use chrono::{DateTime, Utc};

/// Placeholder for missing values.
pub const MISSING: &str = "-";

/// Format milliseconds as human-readable.
///
/// `"1.5m"`, `"2.3s"`, `"120ms"`, `"0.4ms"`.
pub fn format_ms(ms: f64) -> String {
    if !ms.is_finite() || ms < 0.0 {
        return MISSING.to_string();
    }
    if ms >= 3_600_000.0 {
        format!("{:.1}h", ms / 3_600_000.0)
    } else if ms >= 60_000.0 {
        format!("{:.1}m", ms / 60_000.0)
    } else if ms >= 1_000.0 {
        format!("{:.1}s", ms / 1_000.0)
    } else if ms >= 1.0 {
        format!("{:.0}ms", ms)
    } else {
        format!("{:.1}ms", ms)
    }
}

/// Format an estimated cost in dollars.
///
/// Two decimals from one cent up, otherwise up to six decimals with trailing
/// zeros removed: `"$1.25"`, `"$0.000312"`, `"$0"`.
pub fn format_cost(cost: f64) -> String {
    if !cost.is_finite() {
        return MISSING.to_string();
    }
    if cost == 0.0 {
        return "$0".to_string();
    }
    if cost.abs() >= 0.01 {
        return format!("${:.2}", cost);
    }
    let s = format!("{:.6}", cost);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "0" || s == "-0" {
        // below display precision
        "<$0.000001".to_string()
    } else {
        format!("${}", s)
    }
}

/// Format a timestamp the way the grid shows dates: `"03/14/25 09:26 AM"`.
pub fn format_time(ts: &DateTime<Utc>) -> String {
    ts.format("%m/%d/%y %I:%M %p").to_string()
}

/// Format a number without a trailing `.0` for integral values.
pub fn format_number(v: f64) -> String {
    if !v.is_finite() {
        return MISSING.to_string();
    }
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        let s = format!("{:.4}", v);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Truncate to at most `max_chars` characters, ending with `…` when cut.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

/// Normalize text for single-line display.
/// Replaces newlines and tabs with spaces and collapses runs of spaces.
pub fn normalize_for_display(s: &str) -> String {
    let s = s.replace('\n', " ").replace('\r', "").replace('\t', " ");
    let mut result = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch == ' ' {
            if !prev_space {
                result.push(ch);
            }
            prev_space = true;
        } else {
            result.push(ch);
            prev_space = false;
        }
    }
    result.trim().to_string()
}
