/// Configuration for a [`crate::Mars`] instance.
///
/// Defaults match the reference ICWS'94 environment used by pMARS-compatible
/// tournaments.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MarsProperties {
    /// Number of addresses in the shared core.
    pub core_size: u32,
    /// Maximum number of rounds [`crate::Mars::run`] will execute before
    /// declaring the battle a draw among survivors.
    pub max_cycles: u64,
    /// Maximum size of any one warrior's thread queue. `SPL` beyond this
    /// behaves as `NOP`.
    pub max_processes: u64,
    /// Maximum number of instructions a single warrior's program may contain.
    pub max_length: u32,
    /// Minimum number of cells guaranteed between the end of one loaded
    /// warrior and the start of the next.
    pub min_distance: u32,
}

impl Default for MarsProperties {
    fn default() -> Self {
        Self {
            core_size: 8000,
            max_cycles: 80_000,
            max_processes: 8000,
            max_length: 100,
            min_distance: 100,
        }
    }
}

impl MarsProperties {
    /// Size of each warrior's private P-space, following the pMARS-compatible
    /// convention of `core_size / 16`.
    #[must_use]
    pub const fn pspace_size(&self) -> u32 {
        self.core_size / 16
    }

    /// Named integer constants exposed to the assembler's expression
    /// evaluator (e.g. `CORESIZE`), so that `redcode-parser` never needs to
    /// depend back on this crate to know these values.
    #[must_use]
    pub fn assembler_constants(&self) -> Vec<(&'static str, i64)> {
        vec![
            ("CORESIZE", i64::from(self.core_size)),
            ("MAXCYCLES", i64::try_from(self.max_cycles).unwrap_or(i64::MAX)),
            (
                "MAXPROCESSES",
                i64::try_from(self.max_processes).unwrap_or(i64::MAX),
            ),
            ("MAXLENGTH", i64::from(self.max_length)),
            ("MINDISTANCE", i64::from(self.min_distance)),
            ("PSPACESIZE", i64::from(self.pspace_size())),
        ]
    }
}

#[cfg(test)]
mod tests {
    use coverage_helper::test;

    use super::MarsProperties;

    #[test]
    fn defaults_match_reference_environment() {
        let config = MarsProperties::default();
        assert_eq!(config.core_size, 8000);
        assert_eq!(config.max_cycles, 80_000);
        assert_eq!(config.max_processes, 8000);
        assert_eq!(config.max_length, 100);
        assert_eq!(config.min_distance, 100);
    }

    #[test]
    fn pspace_size_is_a_sixteenth_of_core_size() {
        let config = MarsProperties::default();
        assert_eq!(config.pspace_size(), 500);
    }

    #[test]
    fn assembler_constants_include_core_size() {
        let config = MarsProperties::default();
        let constants = config.assembler_constants();
        assert!(constants.contains(&("CORESIZE", 8000)));
    }
}
