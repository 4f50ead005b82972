//! Installs the global subscriber, so it runs in its own test binary.

use provisionwait::logging::{init, try_init};

#[test]
fn init_is_idempotent() {
    init();
    init();

    let error = try_init().expect_err("subscriber already installed");

    assert!(error
        .to_string()
        .starts_with("failed to install tracing subscriber"));
}
