/// Two-decimal text for an amount, with negative zero printed as `0.00`.
pub fn fixed2(val: f64) -> String {
    let s = format!("{val:.2}");
    match s.strip_prefix('-') {
        Some(rest) if rest.bytes().all(|b| b == b'0' || b == b'.') => rest.to_string(),
        _ => s,
    }
}

/// Peso amount with thousands separators for console output: $1,234.56
pub fn money(val: f64) -> String {
    let text = fixed2(val);
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int_part, dec_part) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{sign}${grouped}.{dec_part}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed2() {
        assert_eq!(fixed2(1000.0), "1000.00");
        assert_eq!(fixed2(2.5), "2.50");
        assert_eq!(fixed2(-0.001), "0.00");
        assert_eq!(fixed2(-0.0), "0.00");
        assert_eq!(fixed2(-12.3), "-12.30");
    }

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(1234.56), "$1,234.56");
        assert_eq!(money(-500.00), "-$500.00");
        assert_eq!(money(0.0), "$0.00");
        assert_eq!(money(1000000.99), "$1,000,000.99");
        assert_eq!(money(160.0), "$160.00");
        assert_eq!(money(-0.004), "$0.00");
    }
}
