/// Formats an integer with `,` thousands separators, e.g. `-1234567` → `-1,234,567`.
pub fn format_integer(value: i128) -> String {
    let digits = value.unsigned_abs().to_string();
    let grouped = group_thousands(&digits);
    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Formats a float with `,` thousands separators and exactly two decimals,
/// rounding half to even on the exact binary value (`1234.5` → `1,234.50`).
pub fn format_decimal(value: f64) -> String {
    let fixed = format!("{:.2}", value);
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, "00"));

    format!("{}{}.{}", sign, group_thousands(int_part), frac_part)
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_integer() {
        assert_eq!(format_integer(0), "0");
        assert_eq!(format_integer(42), "42");
        assert_eq!(format_integer(999), "999");
        assert_eq!(format_integer(1000), "1,000");
        assert_eq!(format_integer(-1_234_567), "-1,234,567");
        assert_eq!(format_integer(i128::from(i64::MIN)), "-9,223,372,036,854,775,808");
        assert_eq!(
            format_integer(-118_050_000_000_000_000_000_000_000_000),
            "-118,050,000,000,000,000,000,000,000,000"
        );
    }

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(0.1), "0.10");
        assert_eq!(format_decimal(-5.5), "-5.50");
        assert_eq!(format_decimal(1.234567), "1.23");
        assert_eq!(format_decimal(1_234_567.891), "1,234,567.89");
        assert_eq!(format_decimal(-1000.0), "-1,000.00");
        assert_eq!(format_decimal(999.999), "1,000.00");
    }
}
