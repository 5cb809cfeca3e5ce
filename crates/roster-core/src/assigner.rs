//! Section assignment strategies for new registrations.
//!
//! Assignment is a load-spreading heuristic only. No section fill state is
//! tracked, so every strategy just has to return one of the offered sections.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Picks a section for a registration.
pub trait SectionAssigner {
    /// Chooses one of `sections` for `course`.
    ///
    /// Returns `None` exactly when `sections` is empty.
    fn assign(&mut self, course: &str, sections: &[String]) -> Option<String>;
}

/// Uniform random choice.
#[derive(Debug)]
pub struct RandomAssigner {
    rng: StdRng,
}

impl Default for RandomAssigner {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomAssigner {
    /// Creates an assigner seeded from the OS.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a deterministic assigner.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl SectionAssigner for RandomAssigner {
    fn assign(&mut self, _course: &str, sections: &[String]) -> Option<String> {
        sections.choose(&mut self.rng).cloned()
    }
}

/// Cycles through each course's sections in catalog order.
#[derive(Debug, Default)]
pub struct RoundRobinAssigner {
    cursors: HashMap<String, usize>,
}

impl RoundRobinAssigner {
    /// Creates an assigner with every cursor at the first section.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SectionAssigner for RoundRobinAssigner {
    fn assign(&mut self, course: &str, sections: &[String]) -> Option<String> {
        if sections.is_empty() {
            return None;
        }
        let cursor = self.cursors.entry(course.to_string()).or_insert(0);
        let section = sections.get(*cursor % sections.len()).cloned();
        *cursor = cursor.wrapping_add(1);
        section
    }
}

/// Which assigner to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SectionStrategy {
    /// [`RandomAssigner`] (default).
    #[default]
    Random,
    /// [`RoundRobinAssigner`].
    RoundRobin,
}

impl SectionStrategy {
    /// Parses a strategy name, case-insensitively.
    fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "random" => Some(Self::Random),
            "roundrobin" | "round_robin" | "round-robin" => Some(Self::RoundRobin),
            _ => None,
        }
    }

    /// Builds a boxed assigner for this strategy.
    #[must_use]
    pub fn build(self) -> Box<dyn SectionAssigner + Send> {
        match self {
            Self::Random => Box::new(RandomAssigner::new()),
            Self::RoundRobin => Box::new(RoundRobinAssigner::new()),
        }
    }
}

impl std::str::FromStr for SectionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_case_insensitive(s).ok_or_else(|| {
            format!("invalid section strategy '{s}': expected one of 'random', 'roundRobin'")
        })
    }
}

impl<'de> Deserialize<'de> for SectionStrategy {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for SectionStrategy {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let s = match self {
            Self::Random => "random",
            Self::RoundRobin => "roundRobin",
        };
        serializer.serialize_str(s)
    }
}
