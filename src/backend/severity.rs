//! Ordered log severity and the shared per-request severity cell.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

/// Log severity, numbered like Cloud Logging's `LogSeverity`.
///
/// The derived ordering follows the numeric value, so `max` picks the worst.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[default]
    Default = 0,
    Debug = 100,
    Info = 200,
    Notice = 300,
    Warning = 400,
    Error = 500,
    Critical = 600,
    Alert = 700,
    Emergency = 800,
}

impl Severity {
    pub const ALL: [Severity; 9] = [
        Severity::Default,
        Severity::Debug,
        Severity::Info,
        Severity::Notice,
        Severity::Warning,
        Severity::Error,
        Severity::Critical,
        Severity::Alert,
        Severity::Emergency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Default => "DEFAULT",
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Notice => "NOTICE",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
            Severity::Alert => "ALERT",
            Severity::Emergency => "EMERGENCY",
        }
    }
}

impl From<u16> for Severity {
    /// Unknown values round down to the nearest defined level.
    fn from(val: u16) -> Self {
        Severity::ALL
            .iter()
            .rev()
            .copied()
            .find(|s| *s as u16 <= val)
            .unwrap_or_default()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity slot shared by every context derived from one root request.
///
/// Writes only ever move the value up.
#[derive(Debug, Clone, Default)]
pub struct SeverityCell(Arc<AtomicU16>);

impl SeverityCell {
    pub fn new(initial: Severity) -> Self {
        Self(Arc::new(AtomicU16::new(initial as u16)))
    }

    /// Raise the stored severity to `severity` if it is higher.
    pub fn raise(&self, severity: Severity) {
        self.0.fetch_max(severity as u16, Ordering::Relaxed);
    }

    pub fn get(&self) -> Severity {
        Severity::from(self.0.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_order() {
        for pair in Severity::ALL.windows(2) {
            assert!(pair[0] < pair[1], "{} should sort below {}", pair[0], pair[1]);
        }
        assert_eq!(Severity::Debug.max(Severity::Error), Severity::Error);
    }

    #[test]
    fn test_from_u16_rounds_down() {
        assert_eq!(Severity::from(500), Severity::Error);
        assert_eq!(Severity::from(550), Severity::Error);
        assert_eq!(Severity::from(99), Severity::Default);
        assert_eq!(Severity::from(u16::MAX), Severity::Emergency);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Severity::Warning).unwrap();
        assert_eq!(json, "\"WARNING\"");
        let parsed: Severity = serde_json::from_str("\"CRITICAL\"").unwrap();
        assert_eq!(parsed, Severity::Critical);
    }

    #[test]
    fn test_cell_only_escalates() {
        let cell = SeverityCell::new(Severity::Default);
        cell.raise(Severity::Error);
        cell.raise(Severity::Debug);
        assert_eq!(cell.get(), Severity::Error);
    }

    #[test]
    fn test_cell_is_shared_between_clones() {
        let cell = SeverityCell::new(Severity::Info);
        let other = cell.clone();
        other.raise(Severity::Critical);
        assert_eq!(cell.get(), Severity::Critical);
    }
}
