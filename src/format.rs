//! Display formatting in the Indonesian locale.
//!
//! Currency follows `Intl.NumberFormat('id-ID', {style: 'currency', currency: 'IDR'})`
//! with zero fractional digits: `Rp`, a no-break space, `.` as the group separator.

pub const NOT_AVAILABLE: &str = "N/A";

const CURRENCY_SYMBOL: &str = "Rp";
const SYMBOL_SPACING: char = '\u{a0}';
const GROUP_SEPARATOR: char = '.';

pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    let rounded = amount.round();
    let digits = group_digits(rounded.abs() as u64);
    if rounded < 0.0 {
        format!("-{CURRENCY_SYMBOL}{SYMBOL_SPACING}{digits}")
    } else {
        format!("{CURRENCY_SYMBOL}{SYMBOL_SPACING}{digits}")
    }
}

pub fn format_count(count: u64) -> String {
    group_digits(count)
}

/// `ratio` in [0, 1] rendered as a one-decimal percentage.
pub fn format_percent(ratio: f64) -> String {
    if !ratio.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    format!("{:.1}%", ratio * 100.0)
}

pub fn format_optional_percent(ratio: Option<f64>) -> String {
    ratio
        .map(format_percent)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Two-decimal threshold label, also used as the chart's x-axis label.
pub fn format_threshold(threshold: f64) -> String {
    format!("{threshold:.2}")
}

fn group_digits(value: u64) -> String {
    let raw = value.to_string();
    let mut out = String::with_capacity(raw.len() + raw.len() / 3);
    for (idx, ch) in raw.chars().enumerate() {
        if idx > 0 && (raw.len() - idx) % 3 == 0 {
            out.push(GROUP_SEPARATOR);
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_uses_indonesian_grouping() {
        assert_eq!(format_currency(1_234_567.0), "Rp\u{a0}1.234.567");
        assert_eq!(format_currency(950.0), "Rp\u{a0}950");
        assert_eq!(format_currency(0.0), "Rp\u{a0}0");
    }

    #[test]
    fn currency_rounds_to_whole_rupiah() {
        assert_eq!(format_currency(1_499.5), "Rp\u{a0}1.500");
        assert_eq!(format_currency(-20_000.4), "-Rp\u{a0}20.000");
        assert_eq!(format_currency(-0.3), "Rp\u{a0}0");
    }

    #[test]
    fn non_finite_amounts_are_not_available() {
        assert_eq!(format_currency(f64::NAN), NOT_AVAILABLE);
        assert_eq!(format_percent(f64::INFINITY), NOT_AVAILABLE);
        assert_eq!(format_optional_percent(None), NOT_AVAILABLE);
    }

    #[test]
    fn percent_has_one_decimal() {
        assert_eq!(format_percent(0.1234), "12.3%");
        assert_eq!(format_percent(1.0), "100.0%");
        assert_eq!(format_optional_percent(Some(0.0)), "0.0%");
    }

    #[test]
    fn counts_and_thresholds() {
        assert_eq!(format_count(1_000), "1.000");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_threshold(0.5), "0.50");
        assert_eq!(format_threshold(0.06157894736842105), "0.06");
    }
}
