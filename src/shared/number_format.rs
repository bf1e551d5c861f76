/// Format a number with `,` thousands separators and fixed decimals.
pub fn format_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let formatted = format!("{:.*}", decimals, value.abs());
    let (integer, fraction) = match formatted.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && formatted.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };

    match fraction {
        Some(fraction) => format!("{}{}.{}", sign, grouped, fraction),
        None => format!("{}{}", sign, grouped),
    }
}

pub fn format_count(value: usize) -> String {
    format_number(value as f64, 0)
}

/// Currency-style amount with two decimals and a `$` prefix
pub fn format_amount(value: f64) -> String {
    let formatted = format_number(value, 2);
    match formatted.strip_prefix('-') {
        Some(positive) => format!("-${}", positive),
        None => format!("${}", formatted),
    }
}
