use serde::{Serialize, Serializer};

use crate::http_probe::report;

/// Placeholder reported in place of a measurement that could not be taken.
pub const NOT_AVAILABLE: &str = "N/A";

/// Result of a single probe: either a measurement or the explicit fact that
/// none could be taken. Probes never propagate transient network errors; they
/// log them and hand back `Unavailable`, which serializes as `"N/A"`.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome<T> {
    Ok(T),
    Unavailable,
}

impl<T> ProbeOutcome<T> {
    /// Convert a fallible probe step into an outcome, logging the full error
    /// chain under `probe` when it failed.
    pub fn from_result<E>(probe: &str, result: Result<T, E>) -> Self
    where
        E: std::error::Error + 'static,
    {
        match result {
            Ok(value) => Self::Ok(value),
            Err(e) => {
                log::warn!("[{probe}] unavailable: {}", report(&e));
                Self::Unavailable
            }
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ProbeOutcome<U> {
        match self {
            Self::Ok(value) => ProbeOutcome::Ok(f(value)),
            Self::Unavailable => ProbeOutcome::Unavailable,
        }
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Self::Ok(value) => Some(value),
            Self::Unavailable => None,
        }
    }
}

impl<T> From<Option<T>> for ProbeOutcome<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Unavailable, Self::Ok)
    }
}

impl<T: Serialize> Serialize for ProbeOutcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Ok(value) => value.serialize(serializer),
            Self::Unavailable => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}
