//! CLI Exit Code Registry
//!
//! Exit codes are part of the shell contract: cron jobs and scripts branch on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain     | Description                              |
//! |---------|------------|------------------------------------------|
//! | 0       | Universal  | Success                                  |
//! | 1       | Universal  | General error (unspecified)              |
//! | 2       | Universal  | CLI usage error (bad args, missing URL)  |
//! | 3       | Summary    | Discrepancy alert raised                 |
//! | 10-19   | config     | Settings file codes                      |
//! | 20-29   | data       | Source fetch and payload codes           |

use volsync_config::ConfigError;
use volsync_source::SourceError;

use crate::monitor::CycleError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, no source URL configured.
pub const EXIT_USAGE: u8 = 2;

/// Latest readings differ by more than the alert threshold
/// (only with --fail-on-alert).
pub const EXIT_ALERT: u8 = 3;

// =============================================================================
// Config (10-19)
// =============================================================================

/// Settings file parsed but a value is out of range, or TOML is invalid.
pub const EXIT_CONFIG_INVALID: u8 = 10;

/// Settings file could not be read or written.
pub const EXIT_CONFIG_IO: u8 = 11;

// =============================================================================
// Data (20-29)
// =============================================================================

/// Transport failure, timeout or non-2xx response.
pub const EXIT_NETWORK: u8 = 20;

/// Payload is not a JSON array of well-formed records (including bodies that
/// are not UTF-8 or exceed the size cap).
pub const EXIT_MALFORMED_DATA: u8 = 21;

pub fn config_exit_code(err: &ConfigError) -> u8 {
    match err {
        ConfigError::Io(_) => EXIT_CONFIG_IO,
        ConfigError::Parse(_) | ConfigError::Invalid(_) => EXIT_CONFIG_INVALID,
    }
}

pub fn cycle_exit_code(err: &CycleError) -> u8 {
    match err {
        CycleError::Source(e) if e.is_network() => EXIT_NETWORK,
        // A body that is not UTF-8 or over the cap can never be a usable payload
        CycleError::Source(SourceError::Parse(_) | SourceError::TooLarge(_)) => EXIT_MALFORMED_DATA,
        // Local file unreadable
        CycleError::Source(_) => EXIT_ERROR,
        CycleError::Data(e) if e.is_malformed_data() => EXIT_MALFORMED_DATA,
        CycleError::Data(_) => EXIT_CONFIG_INVALID,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use volsync_align::AlignError;

    #[test]
    fn cycle_codes() {
        let net = CycleError::Source(SourceError::Http(503, String::new()));
        assert_eq!(cycle_exit_code(&net), EXIT_NETWORK);

        let io = CycleError::Source(SourceError::Io("gone".into()));
        assert_eq!(cycle_exit_code(&io), EXIT_ERROR);

        let data = CycleError::Data(AlignError::Json("eof".into()));
        assert_eq!(cycle_exit_code(&data), EXIT_MALFORMED_DATA);

        let not_utf8 = CycleError::Source(SourceError::Parse("invalid utf-8".into()));
        assert_eq!(cycle_exit_code(&not_utf8), EXIT_MALFORMED_DATA);

        let oversized = CycleError::Source(SourceError::TooLarge(1024));
        assert_eq!(cycle_exit_code(&oversized), EXIT_MALFORMED_DATA);
    }

    #[test]
    fn config_codes() {
        assert_eq!(config_exit_code(&ConfigError::Io("x".into())), EXIT_CONFIG_IO);
        assert_eq!(config_exit_code(&ConfigError::Parse("x".into())), EXIT_CONFIG_INVALID);
    }
}
