//! Behaviour every client must show for the polling core to work.
//!
//! Each check takes a fixture factory returning a fresh client and the
//! handle of one existing, settled resource that accepts a plain delete.
//! [`client_contract_tests!`] turns them into `#[tokio::test]`s.

use std::fmt;

use provisionwait_types::{ApiError, ResourceApi, ResourceHandle};

/// Number of existence checks a client may take to reflect a delete.
pub const REMOVAL_OBSERVATIONS: usize = 50;

/// A contract check that did not hold.
#[derive(Debug)]
pub struct ContractTestFailure {
    scenario: &'static str,
    detail: String,
}

impl ContractTestFailure {
    fn new(scenario: &'static str, detail: impl Into<String>) -> Self {
        Self {
            scenario,
            detail: detail.into(),
        }
    }

    fn api_error(scenario: &'static str, operation: &'static str, error: &ApiError) -> Self {
        Self::new(
            scenario,
            format!("{operation} operation returned unexpected error: {error}"),
        )
    }
}

impl fmt::Display for ContractTestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.scenario, self.detail)
    }
}

impl std::error::Error for ContractTestFailure {}

/// Outcome of one contract check.
pub type ContractTestResult = Result<(), ContractTestFailure>;

fn missing_sibling(
    scenario: &'static str,
    handle: &ResourceHandle,
) -> Result<ResourceHandle, ContractTestFailure> {
    ResourceHandle::parse(handle.kind(), format!("{}-missing", handle.id())).map_err(|error| {
        ContractTestFailure::new(scenario, format!("cannot derive missing handle: {error}"))
    })
}

fn expect_not_found<T: fmt::Debug>(
    scenario: &'static str,
    operation: &'static str,
    result: Result<T, ApiError>,
) -> ContractTestResult {
    match result {
        Err(ApiError::NotFound { .. }) => Ok(()),
        Err(error) => Err(ContractTestFailure::api_error(scenario, operation, &error)),
        Ok(value) => Err(ContractTestFailure::new(
            scenario,
            format!("{operation} on a missing resource returned {value:?} instead of not found"),
        )),
    }
}

/// Every operation on an unknown resource answers "not found".
pub async fn test_missing_resource_is_not_found<F, A>(make_api: F) -> ContractTestResult
where
    F: Fn() -> (A, ResourceHandle),
    A: ResourceApi,
{
    const SCENARIO: &str = "missing_resource_is_not_found";

    let (api, existing) = make_api();
    let missing = missing_sibling(SCENARIO, &existing)?;

    expect_not_found(SCENARIO, "fetch_state", api.fetch_state(&missing).await)?;
    expect_not_found(SCENARIO, "show", api.show(&missing).await)?;
    expect_not_found(SCENARIO, "delete", api.delete(&missing).await)
}

/// An existing resource reports a status and is visible to `show`.
pub async fn test_existing_resource_is_visible<F, A>(make_api: F) -> ContractTestResult
where
    F: Fn() -> (A, ResourceHandle),
    A: ResourceApi,
{
    const SCENARIO: &str = "existing_resource_is_visible";

    let (api, existing) = make_api();

    let _status = api
        .fetch_state(&existing)
        .await
        .map_err(|error| ContractTestFailure::api_error(SCENARIO, "fetch_state", &error))?;
    api.show(&existing)
        .await
        .map_err(|error| ContractTestFailure::api_error(SCENARIO, "show", &error))
}

/// An accepted delete is eventually reflected as "not found".
pub async fn test_delete_is_eventually_observed<F, A>(make_api: F) -> ContractTestResult
where
    F: Fn() -> (A, ResourceHandle),
    A: ResourceApi,
{
    const SCENARIO: &str = "delete_is_eventually_observed";

    let (api, existing) = make_api();

    api.delete(&existing)
        .await
        .map_err(|error| ContractTestFailure::api_error(SCENARIO, "delete", &error))?;

    for _ in 0..REMOVAL_OBSERVATIONS {
        match api.show(&existing).await {
            Err(ApiError::NotFound { .. }) => return Ok(()),
            Err(error) => return Err(ContractTestFailure::api_error(SCENARIO, "show", &error)),
            Ok(()) => {}
        }
    }

    Err(ContractTestFailure::new(
        SCENARIO,
        format!("resource still visible after {REMOVAL_OBSERVATIONS} existence checks"),
    ))
}

/// Deleting a resource that is already gone answers "not found".
pub async fn test_repeated_delete_is_not_found<F, A>(make_api: F) -> ContractTestResult
where
    F: Fn() -> (A, ResourceHandle),
    A: ResourceApi,
{
    const SCENARIO: &str = "repeated_delete_is_not_found";

    let (api, existing) = make_api();

    api.delete(&existing)
        .await
        .map_err(|error| ContractTestFailure::api_error(SCENARIO, "delete", &error))?;
    for _ in 0..REMOVAL_OBSERVATIONS {
        if api.show(&existing).await.is_err() {
            break;
        }
    }

    expect_not_found(SCENARIO, "delete", api.delete(&existing).await)
}

/// Generate the client contract suite for a fixture factory.
#[macro_export]
macro_rules! client_contract_tests {
    (suite = $suite:ident, make_api = $make_api:expr $(,)?) => {
        mod $suite {
            use $crate::contract::{
                test_delete_is_eventually_observed, test_existing_resource_is_visible,
                test_missing_resource_is_not_found, test_repeated_delete_is_not_found,
            };

            #[tokio::test]
            async fn missing_resource_is_not_found_contract() {
                test_missing_resource_is_not_found($make_api)
                    .await
                    .expect("client contract failed");
            }

            #[tokio::test]
            async fn existing_resource_is_visible_contract() {
                test_existing_resource_is_visible($make_api)
                    .await
                    .expect("client contract failed");
            }

            #[tokio::test]
            async fn delete_is_eventually_observed_contract() {
                test_delete_is_eventually_observed($make_api)
                    .await
                    .expect("client contract failed");
            }

            #[tokio::test]
            async fn repeated_delete_is_not_found_contract() {
                test_repeated_delete_is_not_found($make_api)
                    .await
                    .expect("client contract failed");
            }
        }
    };
}

pub use client_contract_tests;
