//! Collector configuration.

/// Tunables for the collector
///
/// The defaults match the documented policy: a size class whose occupancy
/// climbs past 90% triggers a collection at the next allocation, and if
/// occupancy stays past the threshold after the sweep a fresh block is
/// added.
#[derive(Clone, Copy, Debug)]
pub struct GcConfig {
    /// Collection can be suppressed entirely (measurement, critical
    /// sections)
    pub enabled: bool,

    /// Occupancy percentage above which an allocation triggers collection
    pub collect_threshold_pct: usize,

    /// Collect on every allocation (stress mode for tests)
    pub stress: bool,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            collect_threshold_pct: 90,
            stress: false,
        }
    }
}
