//! Network module: /24 subnet model, host ranges and ICMP packet handling

pub mod icmp;

use crate::error::{SweepError, SweepResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Lowest usable last octet in a /24
pub const FIRST_HOST: u8 = 1;

/// Highest usable last octet in a /24
pub const LAST_HOST: u8 = 254;

/// A /24 subnet identified by its first three octets, e.g. `192.168.50`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Subnet {
    octets: [u8; 3],
}

impl Subnet {
    pub const fn new(a: u8, b: u8, c: u8) -> Self {
        Self { octets: [a, b, c] }
    }

    pub fn octets(&self) -> [u8; 3] {
        self.octets
    }

    /// Build the address of `last` inside this subnet.
    ///
    /// Network (0) and broadcast (255) octets are rejected.
    pub fn host(&self, last: u8) -> SweepResult<Ipv4Addr> {
        if !(FIRST_HOST..=LAST_HOST).contains(&last) {
            return Err(SweepError::InvalidHostRange(format!(
                "host octet {} is outside {}-{} in {}",
                last, FIRST_HOST, LAST_HOST, self
            )));
        }
        let [a, b, c] = self.octets;
        Ok(Ipv4Addr::new(a, b, c, last))
    }

    /// Whether the subnet lies in one of the RFC 1918 private blocks
    pub fn is_private(&self) -> bool {
        Ipv4Addr::new(self.octets[0], self.octets[1], self.octets[2], 0).is_private()
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.octets;
        write!(f, "{}.{}.{}", a, b, c)
    }
}

impl FromStr for Subnet {
    type Err = SweepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches('.');
        let parts: Vec<&str> = trimmed.split('.').collect();
        if parts.len() != 3 {
            return Err(SweepError::InvalidSubnet(format!(
                "'{}' must have exactly three octets (e.g. 192.168.1)",
                s
            )));
        }

        let mut octets = [0u8; 3];
        for (slot, part) in octets.iter_mut().zip(&parts) {
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                return Err(SweepError::InvalidSubnet(format!("'{}' has a non-numeric octet", s)));
            }
            *slot = part
                .parse::<u8>()
                .map_err(|_| SweepError::InvalidSubnet(format!("octet '{}' in '{}' is out of range", part, s)))?;
        }

        Ok(Self { octets })
    }
}

impl TryFrom<String> for Subnet {
    type Error = SweepError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Subnet> for String {
    fn from(subnet: Subnet) -> Self {
        subnet.to_string()
    }
}

/// Inclusive range of last octets inside a /24
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawHostRange")]
pub struct HostRange {
    start: u8,
    end: u8,
}

/// Unchecked wire form; deserialized ranges go through [`HostRange::new`]
#[derive(Deserialize)]
struct RawHostRange {
    start: u8,
    end: u8,
}

impl TryFrom<RawHostRange> for HostRange {
    type Error = SweepError;

    fn try_from(raw: RawHostRange) -> Result<Self, Self::Error> {
        HostRange::new(raw.start, raw.end)
    }
}

impl HostRange {
    /// Every usable host in a /24
    pub const FULL: HostRange = HostRange {
        start: FIRST_HOST,
        end: LAST_HOST,
    };

    /// Create a validated range. Both bounds must be in 1..=254 and start <= end.
    pub fn new(start: u8, end: u8) -> SweepResult<Self> {
        if start < FIRST_HOST || end > LAST_HOST {
            return Err(SweepError::InvalidHostRange(format!(
                "{}-{} must stay within {}-{}",
                start, end, FIRST_HOST, LAST_HOST
            )));
        }
        if start > end {
            return Err(SweepError::InvalidHostRange(format!(
                "start {} is greater than end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse `N-M` or a single `N`
    pub fn parse(s: &str) -> SweepResult<Self> {
        let parse_bound = |v: &str| {
            v.trim()
                .parse::<u8>()
                .map_err(|_| SweepError::InvalidHostRange(format!("'{}' is not a host octet", v)))
        };

        match s.split_once('-') {
            Some((start, end)) => Self::new(parse_bound(start)?, parse_bound(end)?),
            None => {
                let single = parse_bound(s)?;
                Self::new(single, single)
            }
        }
    }

    pub fn start(&self) -> u8 {
        self.start
    }

    pub fn end(&self) -> u8 {
        self.end
    }

    /// Number of hosts in the range; never zero
    pub fn len(&self) -> usize {
        (self.end - self.start) as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> RangeInclusive<u8> {
        self.start..=self.end
    }
}

impl Default for HostRange {
    fn default() -> Self {
        Self::FULL
    }
}

impl fmt::Display for HostRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
