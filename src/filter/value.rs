use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

static MEMORY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?)\s*([KMGTP])(?:i?B)?$").expect("valid memory size regex")
});
static CLUSTER_HMS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d+)-)?(\d+):(\d{2}):(\d{2})$").expect("valid cluster duration regex")
});
static CLUSTER_DAY_HM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)-(\d+):(\d{2})$").expect("valid cluster day duration regex")
});
static CLUSTER_MS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+):(\d{2})$").expect("valid cluster mm:ss regex"));
static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d+(?:\.\d+)?(?:ms|s|m|h|d|w))+$").expect("valid duration regex")
});
static DURATION_PART_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)(ms|s|m|h|d|w)").expect("valid duration part regex")
});

const KIB: u64 = 1024;
const MEMORY_UNITS: [(char, u64); 5] = [
    ('P', KIB * KIB * KIB * KIB * KIB),
    ('T', KIB * KIB * KIB * KIB),
    ('G', KIB * KIB * KIB),
    ('M', KIB * KIB),
    ('K', KIB),
];

/// A typed value produced by [`coerce_value`] or supplied by a record
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// Byte count of a memory size such as `4G`
    Memory(u64),
    /// Duration written as `[D-]HH:MM:SS`
    ClusterDuration(Duration),
    /// Duration written with unit suffixes such as `1h30m`
    Duration(Duration),
    String(String),
}

/// Which interpretation a [`Scalar`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Integer,
    Float,
    Boolean,
    Memory,
    ClusterDuration,
    Duration,
    String,
}

impl ScalarKind {
    pub fn name(&self) -> &'static str {
        match self {
            ScalarKind::Integer => "integer",
            ScalarKind::Float => "float",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Memory => "memory",
            ScalarKind::ClusterDuration => "cluster-duration",
            ScalarKind::Duration => "duration",
            ScalarKind::String => "string",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Integer(_) => ScalarKind::Integer,
            Scalar::Float(_) => ScalarKind::Float,
            Scalar::Boolean(_) => ScalarKind::Boolean,
            Scalar::Memory(_) => ScalarKind::Memory,
            Scalar::ClusterDuration(_) => ScalarKind::ClusterDuration,
            Scalar::Duration(_) => ScalarKind::Duration,
            Scalar::String(_) => ScalarKind::String,
        }
    }

    /// True when coercion found no typed interpretation
    pub fn is_fallback(&self) -> bool {
        self.kind() == ScalarKind::String
    }

    /// The value as a byte count, if it is or reads as a memory size
    pub fn memory_bytes(&self) -> Option<u64> {
        match self {
            Scalar::Memory(bytes) => Some(*bytes),
            Scalar::String(s) => parse_memory(s.trim()),
            _ => None,
        }
    }

    /// The value as a duration, if it is or reads as either duration form
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Scalar::ClusterDuration(d) | Scalar::Duration(d) => Some(*d),
            Scalar::String(s) => {
                let s = s.trim();
                parse_cluster_duration(s).or_else(|| parse_duration(s))
            }
            _ => None,
        }
    }

    /// The value as a float, if it is numeric or a numeric string
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Integer(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            Scalar::Memory(bytes) => Some(*bytes as f64),
            Scalar::ClusterDuration(d) | Scalar::Duration(d) => Some(d.as_secs_f64()),
            Scalar::String(s) => parse_float(s.trim()),
            Scalar::Boolean(_) => None,
        }
    }

    /// Canonical text used for equality
    ///
    /// String values are re-coerced first, and both duration forms share one
    /// rendering, so `2:30:00`, `02:30:00` and `2h30m` compare equal, as do
    /// `4096M` and `4G`.
    pub fn canonical(&self) -> String {
        match self {
            Scalar::String(s) => match coerce_value(s.trim()) {
                Scalar::String(text) => text,
                typed => typed.canonical(),
            },
            Scalar::ClusterDuration(d) | Scalar::Duration(d) => format_duration(*d),
            // Integral floats equal the matching integer
            Scalar::Float(v) => v.to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Integer(i) => write!(f, "{i}"),
            Scalar::Float(v) => write!(f, "{v:?}"),
            Scalar::Boolean(b) => write!(f, "{b}"),
            Scalar::Memory(bytes) => f.write_str(&format_memory(*bytes)),
            Scalar::ClusterDuration(d) => f.write_str(&format_cluster_duration(*d)),
            Scalar::Duration(d) => f.write_str(&format_duration(*d)),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Integer(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Boolean(value)
    }
}

impl From<Duration> for Scalar {
    fn from(value: Duration) -> Self {
        Scalar::Duration(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

/// Convert raw filter text into a typed value
///
/// Interpretations are tried in a fixed order (integer, float, boolean,
/// memory size, cluster duration, generic duration) and the first that
/// succeeds wins. Anything else is kept as a string, so this never fails.
pub fn coerce_value(raw: &str) -> Scalar {
    if let Ok(i) = raw.parse::<i64>() {
        return Scalar::Integer(i);
    }
    if let Some(f) = parse_float(raw) {
        return Scalar::Float(f);
    }
    if let Some(b) = parse_bool(raw) {
        return Scalar::Boolean(b);
    }
    if let Some(bytes) = parse_memory(raw) {
        return Scalar::Memory(bytes);
    }
    if let Some(d) = parse_cluster_duration(raw) {
        return Scalar::ClusterDuration(d);
    }
    if let Some(d) = parse_duration(raw) {
        return Scalar::Duration(d);
    }
    Scalar::String(raw.to_string())
}

/// Floats must contain a digit, so `inf` and `NaN` stay strings
fn parse_float(s: &str) -> Option<f64> {
    if !s.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<f64>().ok().filter(|f| f.is_finite())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "True" | "TRUE" | "t" | "T" => Some(true),
        "false" | "False" | "FALSE" | "f" | "F" => Some(false),
        _ => None,
    }
}

/// Parse a memory size with an upper-case binary unit (`512M`, `4G`, `1.5TiB`)
pub fn parse_memory(s: &str) -> Option<u64> {
    let caps = MEMORY_RE.captures(s)?;
    let mantissa: f64 = caps[1].parse().ok()?;
    let unit = caps[2].chars().next()?;
    let (_, multiplier) = MEMORY_UNITS.iter().find(|(u, _)| *u == unit)?;
    let bytes = mantissa * *multiplier as f64;
    if bytes > u64::MAX as f64 {
        return None;
    }
    Some(bytes.round() as u64)
}

/// Parse a scheduler time (`MM:SS`, `HH:MM:SS`, `D-HH:MM`, `D-HH:MM:SS`)
///
/// Minutes are only unbounded in the bare `MM:SS` form.
pub fn parse_cluster_duration(s: &str) -> Option<Duration> {
    let (days, hours, minutes, seconds, bounded_minutes) =
        if let Some(caps) = CLUSTER_HMS_RE.captures(s) {
            (
                capture_number(caps.get(1))?,
                capture_number(caps.get(2))?,
                capture_number(caps.get(3))?,
                capture_number(caps.get(4))?,
                true,
            )
        } else if let Some(caps) = CLUSTER_DAY_HM_RE.captures(s) {
            (
                capture_number(caps.get(1))?,
                capture_number(caps.get(2))?,
                capture_number(caps.get(3))?,
                0,
                true,
            )
        } else if let Some(caps) = CLUSTER_MS_RE.captures(s) {
            (
                0,
                0,
                capture_number(caps.get(1))?,
                capture_number(caps.get(2))?,
                false,
            )
        } else {
            return None;
        };

    if seconds >= 60 || (bounded_minutes && minutes >= 60) {
        return None;
    }

    let total = days
        .checked_mul(86_400)?
        .checked_add(hours.checked_mul(3_600)?)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)?;
    Some(Duration::from_secs(total))
}

fn capture_number(m: Option<regex::Match<'_>>) -> Option<u64> {
    match m {
        Some(m) => m.as_str().parse().ok(),
        None => Some(0),
    }
}

/// Parse a compact duration made of `<number><unit>` groups (`30m`, `1h30m`, `1.5d`)
pub fn parse_duration(s: &str) -> Option<Duration> {
    if !DURATION_RE.is_match(s) {
        return None;
    }

    let mut total = 0f64;
    for caps in DURATION_PART_RE.captures_iter(s) {
        let amount: f64 = caps[1].parse().ok()?;
        let unit_secs = match &caps[2] {
            "ms" => 0.001,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3_600.0,
            "d" => 86_400.0,
            "w" => 604_800.0,
            _ => return None,
        };
        total += amount * unit_secs;
    }
    Duration::try_from_secs_f64(total).ok()
}

/// Render bytes with the largest binary unit that divides them exactly
///
/// Sizes that are not a whole number of kibibytes use a fractional `K`
/// mantissa (`1536` bytes is `1.5K`), so the result always carries a unit.
pub fn format_memory(bytes: u64) -> String {
    if bytes == 0 {
        return "0K".to_string();
    }
    match MEMORY_UNITS
        .iter()
        .find(|(_, multiplier)| bytes % multiplier == 0)
    {
        Some((unit, multiplier)) => format!("{}{}", bytes / multiplier, unit),
        None => format!("{}K", bytes as f64 / KIB as f64),
    }
}

/// Render as `HH:MM:SS`, or `D-HH:MM:SS` once the duration reaches a day
pub fn format_cluster_duration(d: Duration) -> String {
    let total = d.as_secs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    if days > 0 {
        format!("{days}-{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    }
}

/// Render as compact unit groups, largest first (`1d2h`, `90s` becomes `1m30s`)
pub fn format_duration(d: Duration) -> String {
    let mut millis = d.as_millis();
    if millis == 0 {
        return "0s".to_string();
    }

    let mut out = String::new();
    for (unit, size) in [("d", 86_400_000u128), ("h", 3_600_000), ("m", 60_000), ("s", 1_000)] {
        if millis >= size {
            out.push_str(&format!("{}{}", millis / size, unit));
            millis %= size;
        }
    }
    if millis > 0 {
        out.push_str(&format!("{millis}ms"));
    }
    out
}
