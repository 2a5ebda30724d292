// src/config/models.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

/// Which IP stacks the listeners should cover. `Dual` is the default and
/// expands into one socket pair per stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    V4,
    V6,
    Dual,
}

impl AddressFamily {
    /// Derive the family selection from the CLI flags. Neither flag means
    /// both stacks, and so does asking for both.
    pub fn from_flags(ipv4: bool, ipv6: bool) -> Self {
        match (ipv4, ipv6) {
            (true, false) => AddressFamily::V4,
            (false, true) => AddressFamily::V6,
            _ => AddressFamily::Dual,
        }
    }

    /// The concrete stacks behind this selection.
    pub fn stacks(self) -> &'static [IpStack] {
        match self {
            AddressFamily::V4 => &[IpStack::V4],
            AddressFamily::V6 => &[IpStack::V6],
            AddressFamily::Dual => &[IpStack::V4, IpStack::V6],
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::V4 => write!(f, "ipv4"),
            AddressFamily::V6 => write!(f, "ipv6"),
            AddressFamily::Dual => write!(f, "dual"),
        }
    }
}

/// One concrete stack, i.e. what a single socket actually binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpStack {
    V4,
    V6,
}

impl IpStack {
    /// The all-interfaces address for this stack.
    pub fn wildcard(self) -> IpAddr {
        match self {
            IpStack::V4 => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            IpStack::V6 => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        }
    }

    pub fn matches(self, addr: IpAddr) -> bool {
        matches!(
            (self, addr),
            (IpStack::V4, IpAddr::V4(_)) | (IpStack::V6, IpAddr::V6(_))
        )
    }
}

impl fmt::Display for IpStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpStack::V4 => write!(f, "ipv4"),
            IpStack::V6 => write!(f, "ipv6"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("bind address {addr} cannot be served with family selection '{family}'")]
    AddressFamilyMismatch { addr: IpAddr, family: AddressFamily },
}

/// Resolved listener configuration. Assembled once at startup from CLI
/// flags, an optional config file, and the interactive prompt; immutable
/// afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Raw port specification: single ports, comma lists, and ranges.
    #[serde(default)]
    pub ports: String,

    /// Explicit bind address; `None` binds the per-stack wildcard.
    #[serde(default)]
    pub bind_address: Option<IpAddr>,

    #[serde(default = "default_family")]
    pub family: AddressFamily,

    /// Minutes until unattended shutdown; 0 disables the timer.
    #[serde(default = "default_auto_close")]
    pub auto_close_minutes: u64,
}

fn default_family() -> AddressFamily {
    AddressFamily::Dual
}

fn default_auto_close() -> u64 {
    15
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ports: String::new(),
            bind_address: None,
            family: default_family(),
            auto_close_minutes: default_auto_close(),
        }
    }
}

impl Config {
    /// Reject combinations no listener could ever satisfy. An explicit bind
    /// address pins one stack, so the selected family must include it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(addr) = self.bind_address {
            let satisfiable = self.family.stacks().iter().any(|s| s.matches(addr));
            if !satisfiable {
                return Err(ConfigError::AddressFamilyMismatch {
                    addr,
                    family: self.family,
                });
            }
        }
        Ok(())
    }

    pub fn auto_close(&self) -> Option<Duration> {
        if self.auto_close_minutes > 0 {
            Some(Duration::from_secs(self.auto_close_minutes * 60))
        } else {
            None
        }
    }
}
