//! Display formatting for currency amounts and durations.

/// Compact currency: whole number below 1K, then `K`/`M`/`B`/`T` suffixes.
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return "∞".to_string();
    }
    if n < 0.0 {
        return format!("-{}", format_number(-n));
    }
    if n < 1_000.0 {
        format!("{}", n.floor() as u64)
    } else if n < 1_000_000.0 {
        format!("{:.1}K", n / 1_000.0)
    } else if n < 1_000_000_000.0 {
        format!("{:.2}M", n / 1_000_000.0)
    } else if n < 1_000_000_000_000.0 {
        format!("{:.2}B", n / 1_000_000_000.0)
    } else {
        format!("{:.2}T", n / 1_000_000_000_000.0)
    }
}

/// Like [`format_number`] but keeps one decimal for small rates (`0.5/s`).
pub fn format_rate(n: f64) -> String {
    if n.is_finite() && n > 0.0 && n < 1_000.0 && n.fract() != 0.0 {
        format!("{:.1}", n)
    } else {
        format_number(n)
    }
}

/// Human-readable time span: `N seconds`, `N minutes`, `Xh Ym`, `Xd Yh`.
pub fn format_duration(seconds: f64) -> String {
    let s = if seconds.is_finite() { seconds.max(0.0).floor() as u64 } else { 0 };
    if s < 60 {
        format!("{} seconds", s)
    } else if s < 3_600 {
        format!("{} minutes", s / 60)
    } else if s < 86_400 {
        format!("{}h {}m", s / 3_600, (s % 3_600) / 60)
    } else {
        format!("{}d {}h", s / 86_400, (s % 86_400) / 3_600)
    }
}
