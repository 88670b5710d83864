//! Timespan literals ("1h30m", "10s", 2500)

use crate::core::error::FlowError;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

/// A duration accepted by the sleep primitive.
///
/// Written either as a raw millisecond count (`2500`, `1.5`) or as
/// concatenated `<number><unit>` tokens with unit in `d`, `h`, `m`, `s`,
/// which are summed. Serialized as a millisecond count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Timespan(Duration);

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"([\d.]+)([dhms])").expect("timespan pattern is valid"))
}

fn unit_seconds(unit: &str) -> f64 {
    match unit {
        "d" => 86400.0,
        "h" => 3600.0,
        "m" => 60.0,
        _ => 1.0,
    }
}

/// Sum the `<number><unit>` tokens of `input`, in seconds.
pub fn parse_seconds(input: &str) -> Result<f64, FlowError> {
    let mut total = 0.0;
    let mut matched = false;

    for caps in token_pattern().captures_iter(input) {
        let magnitude: f64 = caps[1]
            .parse()
            .map_err(|_| FlowError::InvalidConfig(format!("Invalid timespan \"{}\"", input)))?;
        total += magnitude * unit_seconds(&caps[2]);
        matched = true;
    }

    if !matched {
        return Err(FlowError::InvalidConfig(format!(
            "Invalid timespan \"{}\": expected tokens like \"1h30m\" or a millisecond count",
            input
        )));
    }

    Ok(total)
}

fn is_bare_number(input: &str) -> bool {
    input.chars().any(|c| c.is_ascii_digit()) && input.chars().all(|c| c.is_ascii_digit() || c == '.')
}

impl Timespan {
    pub const ZERO: Timespan = Timespan(Duration::ZERO);

    pub fn from_millis(millis: u64) -> Self {
        Timespan(Duration::from_millis(millis))
    }

    pub fn from_secs(secs: u64) -> Self {
        Timespan(Duration::from_secs(secs))
    }

    /// Parse a timespan literal. A bare number is a millisecond count.
    pub fn parse(input: &str) -> Result<Self, FlowError> {
        let trimmed = input.trim();
        let invalid = || FlowError::InvalidConfig(format!("Invalid timespan \"{}\"", input));

        if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
            return trimmed.parse::<u64>().map(Self::from_millis).map_err(|_| invalid());
        }

        let seconds = if is_bare_number(trimmed) {
            trimmed.parse::<f64>().map_err(|_| invalid())? / 1000.0
        } else {
            parse_seconds(trimmed)?
        };

        Duration::try_from_secs_f64(seconds)
            .map(Timespan)
            .map_err(|_| FlowError::InvalidConfig(format!("Timespan \"{}\" is out of range", input)))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn as_millis(&self) -> u64 {
        self.0.as_millis() as u64
    }

    /// `self × factor`, used for linear backoff.
    pub fn times(&self, factor: u32) -> Self {
        Timespan(self.0 * factor)
    }
}

impl From<Duration> for Timespan {
    fn from(duration: Duration) -> Self {
        Timespan(duration)
    }
}

impl FromStr for Timespan {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timespan::parse(s)
    }
}

impl fmt::Display for Timespan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = self.as_millis();
        if millis == 0 {
            return write!(f, "0s");
        }
        if millis % 1000 != 0 {
            return write!(f, "{}ms", millis);
        }

        let mut secs = millis / 1000;
        let mut out = String::new();
        for (unit, size) in [("d", 86400), ("h", 3600), ("m", 60), ("s", 1)] {
            if secs >= size {
                out.push_str(&format!("{}{}", secs / size, unit));
                secs %= size;
            }
        }
        write!(f, "{}", out)
    }
}

impl Serialize for Timespan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.as_millis())
    }
}

impl<'de> Deserialize<'de> for Timespan {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Millis(u64),
            Literal(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Millis(ms) => Ok(Timespan::from_millis(ms)),
            Raw::Literal(s) => Timespan::parse(&s).map_err(serde::de::Error::custom),
        }
    }
}

/// Suspend the current task for `timespan`.
pub async fn sleep(timespan: Timespan) {
    tokio::time::sleep(timespan.as_duration()).await;
}
