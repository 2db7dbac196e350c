// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Process Exit Codes
//!
//! The orchestrator wrapper's exit code contract (§6): 0 success, 1
//! operational error, 2 configuration error, 130 user cancellation, 3
//! recovery-incomplete.

use std::process::ExitCode as StdExitCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    OperationalError = 1,
    ConfigurationError = 2,
    RecoveryIncomplete = 3,
    UserCancellation = 130,
}

impl From<ExitCode> for StdExitCode {
    fn from(code: ExitCode) -> Self {
        StdExitCode::from(code as u8)
    }
}

/// Classifies a top-level run error into its exit code. `CoreError::Fatal`
/// and catalog/transaction failures are operational; `InvalidConfiguration`
/// is a configuration error; a recovery run that ends `corrupted` (§4.10) is
/// reported separately by the caller as `RecoveryIncomplete` since it is not
/// itself a `CoreError` variant.
pub fn map_error_to_exit_code(error: &trackvault_domain::CoreError) -> ExitCode {
    use trackvault_domain::CoreError;
    match error {
        CoreError::InvalidConfiguration(_) | CoreError::Config(_) => ExitCode::ConfigurationError,
        _ => ExitCode::OperationalError,
    }
}

pub fn result_to_exit_code<T>(result: Result<T, trackvault_domain::CoreError>) -> StdExitCode {
    match result {
        Ok(_) => ExitCode::Success.into(),
        Err(e) => map_error_to_exit_code(&e).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_map_to_exit_code_2() {
        let err = trackvault_domain::CoreError::InvalidConfiguration("bad template".to_string());
        assert_eq!(map_error_to_exit_code(&err), ExitCode::ConfigurationError);
    }

    #[test]
    fn fatal_errors_map_to_operational_exit_code() {
        let err = trackvault_domain::CoreError::Fatal("catalog io failure".to_string());
        assert_eq!(map_error_to_exit_code(&err), ExitCode::OperationalError);
    }
}
