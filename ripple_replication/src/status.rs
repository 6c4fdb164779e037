//! Replica status and the probabilistic sampler that drives it
//! (`spec.md` §3's `Status` entity, §4.3 `_updateStatus`).

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Active = 0,
    Overloaded = 1,
    Offline = 2,
}

impl Status {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Active,
            1 => Self::Overloaded,
            _ => Self::Offline,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Overloaded => "overloaded",
            Self::Offline => "offline",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "overloaded" => Some(Self::Overloaded),
            "offline" => Some(Self::Offline),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A lock-free cell holding the current [`Status`], settable from either
/// the gossip loop's own sampler or an external control command.
pub struct StatusCell(AtomicU8);

impl StatusCell {
    pub fn new(initial: Status) -> Self {
        Self(AtomicU8::new(initial as u8))
    }

    pub fn get(&self) -> Status {
        Status::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub fn set(&self, status: Status) {
        self.0.store(status as u8, Ordering::SeqCst);
    }
}

/// Configuration for the probabilistic status sampler
/// (`spec.md` §6 "Operational parameters").
#[derive(Copy, Clone, Debug)]
pub struct StatusSamplerConfig {
    pub failure_prob: f64,
    pub overload_prob: f64,
}

impl Default for StatusSamplerConfig {
    fn default() -> Self {
        Self {
            failure_prob: 0.10,
            overload_prob: 0.20,
        }
    }
}

/// Samples two independent uniform reals and derives a status
/// (`spec.md` §4.3 `_updateStatus`): offline wins over overloaded.
pub fn sample_status(config: StatusSamplerConfig) -> Status {
    let failed: f64 = rand::random();
    let overloaded: f64 = rand::random();
    if failed < config.failure_prob {
        Status::Offline
    } else if overloaded < config.overload_prob {
        Status::Overloaded
    } else {
        Status::Active
    }
}
