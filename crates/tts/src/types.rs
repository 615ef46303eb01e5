use std::fmt;

/// Outcome of initializing a provider from its settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderState {
    /// A client was built and synthesis may be attempted
    Ready,
    /// No usable client; `reason` says what to fix
    Uninitialized { reason: String },
}

impl ProviderState {
    pub(crate) fn uninitialized(reason: impl Into<String>) -> Self {
        Self::Uninitialized { reason: reason.into() }
    }

    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Character usage reported by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
    /// Characters used against the plan limit
    Quota { used: u64, limit: u64 },
    /// The provider has no usage endpoint; do not show a ratio
    Unavailable,
}

impl Usage {
    /// Pair used by presentations that expect `(-1, -1)` for unavailable usage
    pub fn as_pair(self) -> (i64, i64) {
        match self {
            Self::Quota { used, limit } => (
                i64::try_from(used).unwrap_or(i64::MAX),
                i64::try_from(limit).unwrap_or(i64::MAX),
            ),
            Self::Unavailable => (-1, -1),
        }
    }

    /// Characters left before the limit is reached
    pub const fn remaining(self) -> Option<u64> {
        match self {
            Self::Quota { used, limit } => Some(limit.saturating_sub(used)),
            Self::Unavailable => None,
        }
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quota { used, limit } => write!(f, "{used} / {limit} characters"),
            Self::Unavailable => f.write_str("usage not available"),
        }
    }
}
