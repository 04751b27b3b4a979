//! Live Observation - the partial record an operator can supply
//!
//! Only seven attributes are observable interactively. The input is
//! validated here, before any vector is built; everything else is filled
//! by the normalizer.

use serde::{Deserialize, Serialize};
use crate::error::{NidsError, Result};

/// Upper bound of the NSL-KDD `count` column (2-second window)
pub const MAX_CONNECTION_COUNT: u16 = 511;

/// Saturation value of the host-based count columns
pub const MAX_DST_HOST_COUNT: f32 = 255.0;

// ============================================================================
// ENUMERATED INPUTS
// ============================================================================

/// Protocols offered by the live-scoring input. `http` is offered even
/// though the NSL-KDD vocabulary has no such protocol; it encodes as unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
    Http,
}

impl Protocol {
    pub const ALL: [Protocol; 4] = [Protocol::Tcp, Protocol::Udp, Protocol::Icmp, Protocol::Http];

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Icmp => "icmp",
            Protocol::Http => "http",
        }
    }
}

impl std::str::FromStr for Protocol {
    type Err = NidsError;

    fn from_str(s: &str) -> Result<Self> {
        Protocol::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| NidsError::InvalidObservation {
                field: "protocol",
                reason: format!("{:?} is not one of tcp, udp, icmp, http", s),
            })
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Connection status flags offered by the live-scoring input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnFlag {
    SF,
    S0,
    REJ,
    RSTR,
}

impl ConnFlag {
    pub const ALL: [ConnFlag; 4] = [ConnFlag::SF, ConnFlag::S0, ConnFlag::REJ, ConnFlag::RSTR];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnFlag::SF => "SF",
            ConnFlag::S0 => "S0",
            ConnFlag::REJ => "REJ",
            ConnFlag::RSTR => "RSTR",
        }
    }
}

impl std::str::FromStr for ConnFlag {
    type Err = NidsError;

    fn from_str(s: &str) -> Result<Self> {
        ConnFlag::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| NidsError::InvalidObservation {
                field: "flag",
                reason: format!("{:?} is not one of SF, S0, REJ, RSTR", s),
            })
    }
}

impl std::fmt::Display for ConnFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// OBSERVATION
// ============================================================================

/// Unvalidated input as it arrives from the CLI / JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservationInput {
    pub duration: Option<f64>,
    pub protocol: Option<String>,
    pub flag: Option<String>,
    pub src_bytes: Option<f64>,
    pub dst_bytes: Option<f64>,
    pub count: Option<f64>,
    pub serror_rate: Option<f64>,
}

/// Validated live observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveObservation {
    pub duration: f64,
    pub protocol: Protocol,
    pub flag: ConnFlag,
    pub src_bytes: f64,
    pub dst_bytes: f64,
    pub count: u16,
    pub serror_rate: f64,
}

impl LiveObservation {
    pub fn new(
        duration: f64,
        protocol: Protocol,
        flag: ConnFlag,
        src_bytes: f64,
        dst_bytes: f64,
        count: u16,
        serror_rate: f64,
    ) -> Result<Self> {
        let obs = Self { duration, protocol, flag, src_bytes, dst_bytes, count, serror_rate };
        obs.validate()?;
        Ok(obs)
    }

    pub fn validate(&self) -> Result<()> {
        non_negative("duration", self.duration)?;
        non_negative("src_bytes", self.src_bytes)?;
        non_negative("dst_bytes", self.dst_bytes)?;

        if self.count > MAX_CONNECTION_COUNT {
            return Err(NidsError::InvalidObservation {
                field: "count",
                reason: format!("{} is outside [0, {}]", self.count, MAX_CONNECTION_COUNT),
            });
        }

        if !self.serror_rate.is_finite() || !(0.0..=1.0).contains(&self.serror_rate) {
            return Err(NidsError::InvalidObservation {
                field: "serror_rate",
                reason: format!("{} is outside [0, 1]", self.serror_rate),
            });
        }

        Ok(())
    }

    pub fn total_bytes(&self) -> f64 {
        self.src_bytes + self.dst_bytes
    }
}

impl TryFrom<ObservationInput> for LiveObservation {
    type Error = NidsError;

    fn try_from(input: ObservationInput) -> Result<Self> {
        let count = required("count", input.count)?;
        if count.fract() != 0.0 || count < 0.0 || count > MAX_CONNECTION_COUNT as f64 {
            return Err(NidsError::InvalidObservation {
                field: "count",
                reason: format!("{} is not an integer in [0, {}]", count, MAX_CONNECTION_COUNT),
            });
        }

        let protocol = input
            .protocol
            .ok_or(NidsError::InvalidObservation { field: "protocol", reason: "missing".into() })?
            .parse::<Protocol>()?;
        let flag = input
            .flag
            .ok_or(NidsError::InvalidObservation { field: "flag", reason: "missing".into() })?
            .parse::<ConnFlag>()?;

        LiveObservation::new(
            required("duration", input.duration)?,
            protocol,
            flag,
            required("src_bytes", input.src_bytes)?,
            required("dst_bytes", input.dst_bytes)?,
            count as u16,
            required("serror_rate", input.serror_rate)?,
        )
    }
}

fn required(field: &'static str, value: Option<f64>) -> Result<f64> {
    value.ok_or(NidsError::InvalidObservation {
        field,
        reason: "missing".to_string(),
    })
}

fn non_negative(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(NidsError::InvalidObservation {
            field,
            reason: format!("{} must be a non-negative number", value),
        })
    }
}

// ============================================================================
// DEFAULT-FILL POLICY
// ============================================================================

/// Shape assumed for the statistics a live observation cannot supply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowShape {
    /// SYN errors dominate: modelled as a SYN flood
    SynFlood,
    WellBehaved,
}

/// Values for unobserved columns, by column name
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedFields {
    pub shape: FlowShape,
    pub values: Vec<(&'static str, f32)>,
}

/// Heuristic completion of an under-specified record.
///
/// This is NOT a statistical estimate. Above `threshold` the flow is shaped
/// like a SYN flood (mirrored `srv_serror_rate`, `diff_srv_rate` = 1.0,
/// `dst_host_srv_count` saturated at 255); otherwise `same_srv_rate` = 1.0.
/// It materially biases interactive scores and is up for product review.
pub fn heuristic_fill(serror_rate: f64, threshold: f64) -> DerivedFields {
    if serror_rate > threshold {
        DerivedFields {
            shape: FlowShape::SynFlood,
            values: vec![
                ("srv_serror_rate", serror_rate as f32),
                ("diff_srv_rate", 1.0),
                ("dst_host_srv_count", MAX_DST_HOST_COUNT),
            ],
        }
    } else {
        DerivedFields {
            shape: FlowShape::WellBehaved,
            values: vec![("same_srv_rate", 1.0)],
        }
    }
}
