//! Human-readable values with SI prefixes, e.g. `0.0015 s` -> `1.50 ms`.

/// (power of ten, prefix), ascending. Ties in "closest prefix" go to the lower one.
const PREFIXES: [(i32, &str); 9] = [
    (-9, "n"),
    (-6, "µ"),
    (-3, "m"),
    (-2, "c"),
    (-1, "d"),
    (0, ""),
    (3, "k"),
    (6, "M"),
    (9, "G"),
];

/// Units that are printed as-is, never with a prefix.
const UNPREFIXED: [&str; 3] = ["dB", "Hz", "%"];

fn prefix_power(c: char) -> Option<i32> {
    match c {
        'u' => Some(-6),
        _ => PREFIXES
            .iter()
            .find(|(_, p)| p.chars().eq(std::iter::once(c)))
            .map(|(mag, _)| *mag),
    }
}

/// Format `value` with the SI prefix that fits its magnitude.
///
/// `unit` may itself carry a prefix (`"µm"`, `"us"`, `"ms"`); the value is
/// rescaled from it first. Units ending in `s` only use prefixes that are
/// multiples of three. `sep` goes between number and unit and defaults to a
/// space (no separator at all for `%`). With `precision = None` the number is
/// printed in short general form with thousands grouping.
pub fn unit_string(value: f64, unit: &str, sep: Option<&str>, precision: Option<usize>) -> String {
    let sep = if unit.contains('%') {
        ""
    } else {
        match sep {
            Some(s) if !s.is_empty() => s,
            _ => " ",
        }
    };

    if UNPREFIXED.contains(&unit) {
        let num = match precision {
            Some(p) if p > 0 => format!("{value:.p$}"),
            _ => format_general(value),
        };
        return format!("{num}{sep}{unit}");
    }

    if unit.is_empty() {
        return match precision {
            Some(p) => format!("{value:.p$}"),
            None => format_general(value),
        };
    }

    let seconds_like = unit.ends_with('s');
    let allowed = |mag: i32| !seconds_like || mag % 3 == 0;

    let (sign, mut magnitude_value) = if value < 0.0 { ("-", -value) } else { ("", value) };

    let mut chars = unit.chars();
    let first = chars.next();
    let rest = chars.as_str();
    let given = first.and_then(prefix_power).filter(|_| !rest.is_empty());
    let base_unit = match given {
        Some(power) => {
            magnitude_value *= 10f64.powi(power);
            rest
        }
        None => unit,
    };

    let mut magnitude = if magnitude_value != 0.0 {
        magnitude_value.log10().floor() as i32
    } else {
        0
    };
    let exact = PREFIXES.iter().any(|(mag, _)| *mag == magnitude && allowed(*mag));
    if !exact {
        magnitude = PREFIXES
            .iter()
            .map(|(mag, _)| *mag)
            .filter(|mag| allowed(*mag))
            .min_by_key(|mag| (magnitude - mag).abs())
            .unwrap_or(0);
    }
    let prefix = PREFIXES
        .iter()
        .find(|(mag, _)| *mag == magnitude)
        .map(|(_, p)| *p)
        .unwrap_or("");

    let scaled = magnitude_value / 10f64.powi(magnitude);
    let num = match precision {
        Some(p) => format!("{scaled:.p$}"),
        None => format_general(scaled),
    };
    format!("{sign}{num}{sep}{prefix}{base_unit}")
}

/// Six significant digits, trailing zeros removed, thousands grouped, and
/// scientific notation outside `1e-4 ..< 1e6`.
pub fn format_general(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let sci = format!("{value:.5e}");
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    if !(-4..6).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{}e{sign}{:02}", trim_zeros(mantissa), exp.abs());
    }
    let decimals = (5 - exp).max(0) as usize;
    group_thousands(trim_zeros(&format!("{value:.decimals$}")))
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

fn group_thousands(s: &str) -> String {
    let (sign, unsigned) = match s.strip_prefix('-') {
        Some(u) => ("-", u),
        None => ("", s),
    };
    let (int_part, frac) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    match frac {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_input_unit_is_rescaled() {
        assert_eq!(unit_string(3_000_000.0, "µm", None, Some(0)), "3 m");
        assert_eq!(unit_string(5.0, "us", None, Some(1)), "5.0 µs");
    }

    #[test]
    fn seconds_use_multiples_of_three() {
        assert_eq!(unit_string(0.0015, "s", None, Some(2)), "1.50 ms");
        assert_eq!(unit_string(0.02, "s", None, Some(0)), "20 ms");
        assert_eq!(unit_string(25.0, "s", None, None), "25 s");
    }

    #[test]
    fn centi_allowed_for_other_units() {
        assert_eq!(unit_string(-0.02, "m", None, Some(1)), "-2.0 cm");
    }

    #[test]
    fn closest_prefix_for_gaps() {
        assert_eq!(unit_string(25_000.0, "V", None, Some(0)), "25 kV");
        assert_eq!(unit_string(1.5e12, "V", None, Some(0)), "1500 GV");
    }

    #[test]
    fn special_units_are_never_prefixed() {
        assert_eq!(unit_string(1500.0, "Hz", None, Some(1)), "1500.0 Hz");
        assert_eq!(unit_string(42.0, "%", Some(" "), None), "42%");
        assert_eq!(unit_string(-3.5, "dB", Some("_"), Some(1)), "-3.5_dB");
    }

    #[test]
    fn empty_unit_formats_bare_number() {
        assert_eq!(unit_string(12345.0, "", None, None), "12,345");
        assert_eq!(unit_string(2.0, "", None, Some(3)), "2.000");
        assert_eq!(unit_string(0.0, "V", None, Some(2)), "0.00 V");
    }

    #[test]
    fn general_format() {
        assert_eq!(format_general(1_234_567.0), "1.23457e+06");
        assert_eq!(format_general(0.00001), "1e-05");
        assert_eq!(format_general(0.5), "0.5");
        assert_eq!(format_general(-98765.4321), "-98,765.4");
        assert_eq!(format_general(100.0), "100");
    }
}
