//! Metric prefixes for scaled quantities.
//!
//! A [`MetricPrefix`] is a power of ten whose exponent is a multiple of three,
//! from quecto (10⁻³⁰) to quetta (10³⁰). Solutions report their running time as
//! an integer count of some prefixed second; this module converts between that
//! representation, plain floats and human-readable text.
//!
//! The lookup tables are built once and never mutated:
//! - long name → prefix (`"nano"` → [`MetricPrefix::Nano`])
//! - symbol → prefix (`"n"` → [`MetricPrefix::Nano`])
//! - exponent → prefix (`-9` → [`MetricPrefix::Nano`])

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Errors produced by the unit codec.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnitError {
    /// The text does not end with the unit suffix, or the prefix fragment is unknown.
    #[error("cannot parse {value:?} as a prefixed {unit}")]
    Parse { value: String, unit: String },

    /// The normalized exponent has no matching prefix.
    #[error("exponent {0} is not a valid metric prefix")]
    Range(i32),

    /// NaN or infinity cannot be normalized.
    #[error("{0} is not a finite value")]
    NotFinite(f64),
}

/// A power-of-ten scale factor with exponent in `-30..=30`, step 3.
///
/// Variants are declared in ascending exponent order, so the derived `Ord`
/// is the order by exponent. Serialized as the integer exponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum MetricPrefix {
    Quecto,
    Ronto,
    Yocto,
    Zepto,
    Atto,
    Femto,
    Pico,
    Nano,
    Micro,
    Milli,
    /// No prefix (10⁰). Renders as an empty name and symbol.
    Base,
    Kilo,
    Mega,
    Giga,
    Tera,
    Peta,
    Exa,
    Zetta,
    Yotta,
    Ronna,
    Quetta,
}

/// Relative slack absorbing the few ulps `log10` and `powi` can be off by.
const NORMALIZE_EPSILON: f64 = 16.0 * f64::EPSILON;

static BY_NAME: OnceLock<HashMap<&'static str, MetricPrefix>> = OnceLock::new();
static BY_SYMBOL: OnceLock<HashMap<&'static str, MetricPrefix>> = OnceLock::new();
static BY_EXPONENT: OnceLock<BTreeMap<i32, MetricPrefix>> = OnceLock::new();

fn by_name() -> &'static HashMap<&'static str, MetricPrefix> {
    BY_NAME.get_or_init(|| MetricPrefix::ALL.iter().map(|p| (p.name(), *p)).collect())
}

fn by_symbol() -> &'static HashMap<&'static str, MetricPrefix> {
    BY_SYMBOL.get_or_init(|| MetricPrefix::ALL.iter().map(|p| (p.symbol(), *p)).collect())
}

fn by_exponent() -> &'static BTreeMap<i32, MetricPrefix> {
    BY_EXPONENT.get_or_init(|| MetricPrefix::ALL.iter().map(|p| (p.exponent(), *p)).collect())
}

impl MetricPrefix {
    /// Every prefix in ascending exponent order.
    pub const ALL: [MetricPrefix; 21] = [
        Self::Quecto,
        Self::Ronto,
        Self::Yocto,
        Self::Zepto,
        Self::Atto,
        Self::Femto,
        Self::Pico,
        Self::Nano,
        Self::Micro,
        Self::Milli,
        Self::Base,
        Self::Kilo,
        Self::Mega,
        Self::Giga,
        Self::Tera,
        Self::Peta,
        Self::Exa,
        Self::Zetta,
        Self::Yotta,
        Self::Ronna,
        Self::Quetta,
    ];

    pub const MIN_EXPONENT: i32 = -30;
    pub const MAX_EXPONENT: i32 = 30;

    /// The power of ten this prefix stands for.
    pub const fn exponent(self) -> i32 {
        match self {
            Self::Quecto => -30,
            Self::Ronto => -27,
            Self::Yocto => -24,
            Self::Zepto => -21,
            Self::Atto => -18,
            Self::Femto => -15,
            Self::Pico => -12,
            Self::Nano => -9,
            Self::Micro => -6,
            Self::Milli => -3,
            Self::Base => 0,
            Self::Kilo => 3,
            Self::Mega => 6,
            Self::Giga => 9,
            Self::Tera => 12,
            Self::Peta => 15,
            Self::Exa => 18,
            Self::Zetta => 21,
            Self::Yotta => 24,
            Self::Ronna => 27,
            Self::Quetta => 30,
        }
    }

    /// Long name, e.g. `"nano"`. Empty for [`MetricPrefix::Base`].
    pub const fn name(self) -> &'static str {
        match self {
            Self::Quecto => "quecto",
            Self::Ronto => "ronto",
            Self::Yocto => "yocto",
            Self::Zepto => "zepto",
            Self::Atto => "atto",
            Self::Femto => "femto",
            Self::Pico => "pico",
            Self::Nano => "nano",
            Self::Micro => "micro",
            Self::Milli => "milli",
            Self::Base => "",
            Self::Kilo => "kilo",
            Self::Mega => "mega",
            Self::Giga => "giga",
            Self::Tera => "tera",
            Self::Peta => "peta",
            Self::Exa => "exa",
            Self::Zetta => "zetta",
            Self::Yotta => "yotta",
            Self::Ronna => "ronna",
            Self::Quetta => "quetta",
        }
    }

    /// SI symbol, e.g. `"n"`. Empty for [`MetricPrefix::Base`].
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Quecto => "q",
            Self::Ronto => "r",
            Self::Yocto => "y",
            Self::Zepto => "z",
            Self::Atto => "a",
            Self::Femto => "f",
            Self::Pico => "p",
            Self::Nano => "n",
            Self::Micro => "μ",
            Self::Milli => "m",
            Self::Base => "",
            Self::Kilo => "k",
            Self::Mega => "M",
            Self::Giga => "G",
            Self::Tera => "T",
            Self::Peta => "P",
            Self::Exa => "E",
            Self::Zetta => "Z",
            Self::Yotta => "Y",
            Self::Ronna => "R",
            Self::Quetta => "Q",
        }
    }

    pub fn from_exponent(exponent: i32) -> Option<Self> {
        by_exponent().get(&exponent).copied()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        by_name().get(name).copied()
    }

    /// Look up a symbol. `u` and the micro sign `µ` (U+00B5) are accepted for micro.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "u" | "\u{b5}" => Some(Self::Micro),
            _ => by_symbol().get(symbol).copied(),
        }
    }

    /// Parse a prefixed unit token such as `"ns"`, `"nanoseconds"` or `"s"`.
    ///
    /// `suffix` is the long unit name (`"second"`; a trailing plural `s` is
    /// accepted) and `abbrev` its symbol (`"s"`). Long unit names take long
    /// prefix names, symbols take prefix symbols. An empty prefix fragment is
    /// [`MetricPrefix::Base`].
    pub fn parse(value: &str, suffix: &str, abbrev: &str) -> Result<Self, UnitError> {
        let error = || UnitError::Parse {
            value: value.to_string(),
            unit: suffix.to_string(),
        };

        let plural = format!("{suffix}s");
        if let Some(prefix) = value
            .strip_suffix(plural.as_str())
            .or_else(|| value.strip_suffix(suffix))
        {
            return Self::from_name(prefix).ok_or_else(error);
        }

        value
            .strip_suffix(abbrev)
            .and_then(Self::from_symbol)
            .ok_or_else(error)
    }

    /// `mantissa × 10^exponent`.
    pub fn to_float(self, mantissa: f64) -> f64 {
        scale(mantissa, self.exponent())
    }

    /// Normalize `value × 10^exponent_offset` into a mantissa in `[1, 1000)`
    /// and the prefix with the largest exponent not above the value's.
    ///
    /// Zero normalizes to `(0.0, Base)`.
    pub fn from_float(value: f64, exponent_offset: i32) -> Result<(f64, Self), UnitError> {
        if !value.is_finite() {
            return Err(UnitError::NotFinite(value));
        }
        if value == 0.0 {
            return Ok((0.0, Self::Base));
        }

        let magnitude = value.abs().log10().floor() as i32 + exponent_offset;
        let mut exponent = magnitude.div_euclid(3) * 3;
        let mut mantissa = scale(value, exponent_offset - exponent);

        // log10 and non-exact powers of ten may land a few ulps off
        if mantissa.abs() >= 1000.0 * (1.0 - NORMALIZE_EPSILON) {
            exponent += 3;
            mantissa /= 1000.0;
        } else if mantissa.abs() < 1.0 - NORMALIZE_EPSILON {
            exponent -= 3;
            mantissa *= 1000.0;
        }
        // a few ulps under a power of 1000 counts as that power
        if mantissa.abs() < 1.0 {
            mantissa = mantissa.signum();
        }

        let prefix = Self::from_exponent(exponent).ok_or(UnitError::Range(exponent))?;
        Ok((mantissa, prefix))
    }

    /// Render `"<mantissa> <prefix><suffix>"`.
    ///
    /// With `precision` the mantissa is rounded to that many decimals,
    /// otherwise the shortest exact representation is used. `short` selects
    /// the symbol instead of the long name.
    pub fn format(self, mantissa: f64, suffix: &str, precision: Option<usize>, short: bool) -> String {
        let prefix = if short { self.symbol() } else { self.name() };
        match precision {
            Some(precision) => format!("{mantissa:.precision$} {prefix}{suffix}"),
            None => format!("{mantissa} {prefix}{suffix}"),
        }
    }

    /// Normalize `value` with [`MetricPrefix::from_float`] and render it.
    pub fn format_float(
        value: f64,
        suffix: &str,
        precision: Option<usize>,
        short: bool,
    ) -> Result<String, UnitError> {
        let (mantissa, prefix) = Self::from_float(value, 0)?;
        Ok(prefix.format(mantissa, suffix, precision, short))
    }
}

/// Multiply by `10^exponent`, dividing for negative exponents so that exact
/// powers of ten stay exact.
fn scale(value: f64, exponent: i32) -> f64 {
    if exponent >= 0 {
        value * 10f64.powi(exponent)
    } else {
        value / 10f64.powi(-exponent)
    }
}

impl fmt::Display for MetricPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<MetricPrefix> for i32 {
    fn from(prefix: MetricPrefix) -> Self {
        prefix.exponent()
    }
}

impl TryFrom<i32> for MetricPrefix {
    type Error = UnitError;

    fn try_from(exponent: i32) -> Result<Self, Self::Error> {
        Self::from_exponent(exponent).ok_or(UnitError::Range(exponent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const SAMPLE: f64 = 1.23;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1e-300)
    }

    #[test]
    fn test_all_sorted_by_exponent() {
        let exponents: Vec<i32> = MetricPrefix::ALL.iter().map(|p| p.exponent()).collect();
        let expected: Vec<i32> = (-10..=10).map(|i| i * 3).collect();
        assert_eq!(exponents, expected);

        for pair in MetricPrefix::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_lookup_tables_are_injective() {
        let names: HashSet<_> = MetricPrefix::ALL.iter().map(|p| p.name()).collect();
        let symbols: HashSet<_> = MetricPrefix::ALL.iter().map(|p| p.symbol()).collect();
        assert_eq!(names.len(), MetricPrefix::ALL.len());
        assert_eq!(symbols.len(), MetricPrefix::ALL.len());

        assert_eq!(by_name().len(), MetricPrefix::ALL.len());
        assert_eq!(by_symbol().len(), MetricPrefix::ALL.len());
        assert_eq!(by_exponent().len(), MetricPrefix::ALL.len());

        for prefix in MetricPrefix::ALL {
            assert_eq!(MetricPrefix::from_name(prefix.name()), Some(prefix));
            assert_eq!(MetricPrefix::from_symbol(prefix.symbol()), Some(prefix));
            assert_eq!(MetricPrefix::from_exponent(prefix.exponent()), Some(prefix));
        }
    }

    #[test]
    fn test_parse_seconds() {
        let cases = [
            ("ns", MetricPrefix::Nano),
            ("ms", MetricPrefix::Milli),
            ("μs", MetricPrefix::Micro),
            ("us", MetricPrefix::Micro),
            ("s", MetricPrefix::Base),
            ("ks", MetricPrefix::Kilo),
            ("seconds", MetricPrefix::Base),
            ("second", MetricPrefix::Base),
            ("nanoseconds", MetricPrefix::Nano),
            ("nanosecond", MetricPrefix::Nano),
            ("milliseconds", MetricPrefix::Milli),
            ("picoseconds", MetricPrefix::Pico),
        ];
        for (text, expected) in cases {
            assert_eq!(MetricPrefix::parse(text, "second", "s"), Ok(expected), "{text}");
        }
    }

    #[test]
    fn test_parse_every_prefix_with_meters() {
        for prefix in MetricPrefix::ALL {
            let short = format!("{}m", prefix.symbol());
            let long = format!("{}meters", prefix.name());
            assert_eq!(MetricPrefix::parse(&short, "meter", "m"), Ok(prefix), "{short}");
            assert_eq!(MetricPrefix::parse(&long, "meter", "m"), Ok(prefix), "{long}");
        }
    }

    #[test]
    fn test_parse_failures() {
        for text in ["abc", "petermeters", "nanopeters", "Xm", "nmeters", "nanom"] {
            let result = MetricPrefix::parse(text, "meter", "m");
            assert!(
                matches!(result, Err(UnitError::Parse { .. })),
                "{text} parsed as {result:?}"
            );
        }
        assert!(MetricPrefix::parse("Xs", "second", "s").is_err());
        assert!(MetricPrefix::parse("", "second", "s").is_err());
    }

    #[test]
    fn test_to_float() {
        assert!(approx(MetricPrefix::Base.to_float(SAMPLE), SAMPLE));
        assert!(approx(MetricPrefix::Nano.to_float(SAMPLE), SAMPLE * 1e-9));
        assert!(approx(MetricPrefix::Kilo.to_float(SAMPLE), SAMPLE * 1e3));
        assert!(approx(MetricPrefix::Kilo.to_float(1.0), 1000.0));
    }

    #[test]
    fn test_from_float() {
        let cases = [
            (SAMPLE, MetricPrefix::Base),
            (SAMPLE * 1e3, MetricPrefix::Kilo),
            (SAMPLE * 1e-9, MetricPrefix::Nano),
            (-SAMPLE * 1e6, MetricPrefix::Mega),
        ];
        for (value, expected) in cases {
            let (mantissa, prefix) = MetricPrefix::from_float(value, 0).unwrap();
            assert!(approx(mantissa.abs(), SAMPLE), "{value}: mantissa {mantissa}");
            assert_eq!(prefix, expected);
        }

        let (mantissa, prefix) = MetricPrefix::from_float(4500.0, 0).unwrap();
        assert!(approx(mantissa, 4.5));
        assert_eq!(prefix, MetricPrefix::Kilo);
    }

    #[test]
    fn test_from_float_exact_powers() {
        for prefix in MetricPrefix::ALL {
            let (mantissa, parsed) = MetricPrefix::from_float(prefix.to_float(1.0), 0).unwrap();
            assert_eq!(parsed, prefix);
            assert!(approx(mantissa, 1.0), "{prefix:?}: mantissa {mantissa}");
        }
    }

    #[test]
    fn test_from_float_just_below_boundary() {
        let cases = [
            (999.9999999995, MetricPrefix::Base),
            (0.9999999999995, MetricPrefix::Milli),
            (999999.9999995, MetricPrefix::Kilo),
            (-999.9999999995, MetricPrefix::Base),
        ];
        for (value, expected) in cases {
            let (mantissa, prefix) = MetricPrefix::from_float(value, 0).unwrap();
            assert_eq!(prefix, expected, "{value}");
            assert!(
                (1.0..1000.0).contains(&mantissa.abs()),
                "{value}: mantissa {mantissa}"
            );
            assert!(approx(prefix.to_float(mantissa), value), "{value}");
        }
    }

    #[test]
    fn test_from_float_with_exponent_offset() {
        let cases = [
            (SAMPLE, MetricPrefix::Kilo),
            (SAMPLE * 1e3, MetricPrefix::Mega),
            (SAMPLE * 1e-9, MetricPrefix::Micro),
        ];
        for (value, expected) in cases {
            let (mantissa, prefix) = MetricPrefix::from_float(value, 3).unwrap();
            assert!(approx(mantissa, SAMPLE));
            assert_eq!(prefix, expected);
        }

        let (mantissa, prefix) = MetricPrefix::from_float(1500.0, -9).unwrap();
        assert!(approx(mantissa, 1.5));
        assert_eq!(prefix, MetricPrefix::Micro);
    }

    #[test]
    fn test_from_float_out_of_range() {
        assert_eq!(MetricPrefix::from_float(1e40, 0), Err(UnitError::Range(39)));
        assert!(matches!(
            MetricPrefix::from_float(1e-40, 0),
            Err(UnitError::Range(_))
        ));
        assert!(matches!(
            MetricPrefix::from_float(f64::NAN, 0),
            Err(UnitError::NotFinite(_))
        ));
        assert!(matches!(
            MetricPrefix::from_float(f64::INFINITY, 0),
            Err(UnitError::NotFinite(_))
        ));
    }

    #[test]
    fn test_from_float_zero() {
        assert_eq!(MetricPrefix::from_float(0.0, 0), Ok((0.0, MetricPrefix::Base)));
    }

    #[test]
    fn test_format() {
        assert_eq!(MetricPrefix::Base.format(SAMPLE, "meters", None, false), "1.23 meters");
        assert_eq!(MetricPrefix::Nano.format(SAMPLE, "meters", None, false), "1.23 nanometers");
        assert_eq!(MetricPrefix::Kilo.format(SAMPLE, "meters", None, false), "1.23 kilometers");
        assert_eq!(MetricPrefix::Nano.format(1500.0, "seconds", Some(0), false), "1500 nanoseconds");
        assert_eq!(MetricPrefix::Micro.format(1.5, "s", Some(2), true), "1.50 μs");
        assert_eq!(MetricPrefix::Base.format(2.0, "s", Some(1), true), "2.0 s");
    }

    #[test]
    fn test_format_float() {
        assert_eq!(
            MetricPrefix::format_float(0.0015, "seconds", Some(1), false).unwrap(),
            "1.5 milliseconds"
        );
        assert_eq!(MetricPrefix::format_float(4500.0, "s", None, true).unwrap(), "4.5 ks");
        assert!(MetricPrefix::format_float(1e40, "s", None, true).is_err());
    }

    #[test]
    fn test_format_parse_round_trip() {
        for prefix in MetricPrefix::ALL {
            for mantissa in [1.5, 12.34, 999.0] {
                let value = prefix.to_float(mantissa);
                for short in [false, true] {
                    let suffix = if short { "s" } else { "seconds" };
                    let text = MetricPrefix::format_float(value, suffix, Some(3), short).unwrap();
                    let token = text.split_whitespace().nth(1).unwrap();
                    assert_eq!(MetricPrefix::parse(token, "second", "s"), Ok(prefix), "{text}");
                }
            }
        }
    }

    #[test]
    fn test_serialize_as_exponent() {
        assert_eq!(serde_json::to_string(&MetricPrefix::Base).unwrap(), "0");
        assert_eq!(serde_json::to_string(&MetricPrefix::Nano).unwrap(), "-9");
        assert_eq!(serde_json::to_string(&MetricPrefix::Kilo).unwrap(), "3");

        let parsed: MetricPrefix = serde_json::from_str("-9").unwrap();
        assert_eq!(parsed, MetricPrefix::Nano);
        assert!(serde_json::from_str::<MetricPrefix>("2").is_err());
    }
}
