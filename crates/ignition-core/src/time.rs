//! Logical time used to order runs and run requests.

use std::fmt;

/// A point on the engine's logical clock.
///
/// `Earliest` sorts before every tick and means "never"; `Latest` sorts after
/// every tick and forces a rerun.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EngineTime {
    #[default]
    Earliest,
    At(u64),
    Latest,
}

impl EngineTime {
    pub const EARLIEST: Self = Self::Earliest;
    pub const LATEST: Self = Self::Latest;
}

impl fmt::Display for EngineTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Earliest => f.write_str("-inf"),
            Self::At(tick) => write!(f, "{}", tick),
            Self::Latest => f.write_str("+inf"),
        }
    }
}

/// The greatest of `times`, or [`EngineTime::Earliest`] if there are none.
pub fn latest(times: impl IntoIterator<Item = EngineTime>) -> EngineTime {
    times.into_iter().max().unwrap_or(EngineTime::Earliest)
}

/// Monotonic source of [`EngineTime`] values.
#[derive(Debug, Clone, Default)]
pub struct EngineClock {
    tick: u64,
}

impl EngineClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance and return the new time.
    pub fn advance(&mut self) -> EngineTime {
        self.tick += 1;
        EngineTime::At(self.tick)
    }

    /// The most recent time handed out, `Earliest` before the first advance.
    pub fn now(&self) -> EngineTime {
        if self.tick == 0 {
            EngineTime::Earliest
        } else {
            EngineTime::At(self.tick)
        }
    }
}
