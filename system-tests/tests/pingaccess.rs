// system-tests/tests/pingaccess.rs
// ============================================================================
// Module: PingAccess SSO Tests
// Description: Live single sign-on battery for the PingAccess admin console.
// Purpose: Prove the right identities reach PingAccess and the wrong ones do not.
// Dependencies: system-tests helpers
// ============================================================================

//! PingAccess SSO system tests.

mod helpers;

use helpers::live::TestResult;
use helpers::live::run_console;

#[test]
fn pingaccess_sso_battery() -> TestResult {
    run_console("pingaccess_sso_battery", "pingaccess")
}
