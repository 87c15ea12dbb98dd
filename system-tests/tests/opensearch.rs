// system-tests/tests/opensearch.rs
// ============================================================================
// Module: OpenSearch SSO Tests
// Description: Live single sign-on battery for the OpenSearch admin console.
// Purpose: Prove the right identities reach OpenSearch and the wrong ones do not.
// Dependencies: system-tests helpers
// ============================================================================

//! OpenSearch SSO system tests.

mod helpers;

use helpers::live::TestResult;
use helpers::live::run_console;

#[test]
fn opensearch_sso_battery() -> TestResult {
    run_console("opensearch_sso_battery", "opensearch")
}
