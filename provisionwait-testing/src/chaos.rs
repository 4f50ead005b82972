//! Fault injection for exercising the polling core against unreliable clients.
//!
//! [`ChaosProvisioningApi`] wraps any client and, at the rates set in a
//! [`ChaosConfig`], answers deletes with conflicts, status reads with a
//! spurious "not found", and any call with a server error. A fixed seed
//! makes the injected faults repeatable.

use std::sync::Mutex;

use async_trait::async_trait;
use nutype::nutype;
use provisionwait_types::{
    ApiError, ResourceDeleter, ResourceHandle, ResourceShow, ResourceStatus, StatusProbe,
};
use rand::{random, rngs::StdRng, Rng, SeedableRng};
use tracing::debug;

/// Probability value for chaos injection rates.
///
/// Probability represents a value in the range [0.0, 1.0] where 0.0 means
/// never inject a fault and 1.0 means always inject it.
///
/// # Examples
///
/// ```ignore
/// use provisionwait_testing::chaos::Probability;
///
/// let never = Probability::try_new(0.0).unwrap();
/// let always = Probability::try_new(1.0).unwrap();
///
/// // Values outside [0.0, 1.0] are rejected
/// assert!(Probability::try_new(1.5).is_err());
/// ```
#[nutype(
    validate(greater_or_equal = 0.0, less_or_equal = 1.0),
    derive(Debug, Clone, Copy, PartialEq, PartialOrd, Display, Into)
)]
pub struct Probability(f32);

fn clamped(probability: f32) -> Probability {
    Probability::try_new(probability.clamp(0.0, 1.0)).expect("clamped value is always valid")
}

/// Which faults a [`ChaosProvisioningApi`] injects, and how often.
#[derive(Debug, Clone)]
pub struct ChaosConfig {
    deterministic_seed: Option<u64>,
    failure_probability: Probability,
    conflict_probability: Probability,
    not_found_probability: Probability,
}

impl ChaosConfig {
    /// No faults, fixed seed.
    pub fn deterministic() -> Self {
        Self {
            deterministic_seed: Some(0),
            ..Self::default()
        }
    }

    /// Use `seed` for the fault RNG.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.deterministic_seed = Some(seed);
        self
    }

    /// Rate of server errors on every operation.
    #[must_use]
    pub fn with_failure_probability(mut self, probability: f32) -> Self {
        self.failure_probability = clamped(probability);
        self
    }

    /// Rate of conflicts on deletes.
    #[must_use]
    pub fn with_conflict_probability(mut self, probability: f32) -> Self {
        self.conflict_probability = clamped(probability);
        self
    }

    /// Rate of spurious "not found" answers to status reads, as seen while
    /// a freshly created resource is not yet visible everywhere.
    #[must_use]
    pub fn with_not_found_probability(mut self, probability: f32) -> Self {
        self.not_found_probability = clamped(probability);
        self
    }
}

impl Default for ChaosConfig {
    fn default() -> Self {
        Self {
            deterministic_seed: None,
            failure_probability: clamped(0.0),
            conflict_probability: clamped(0.0),
            not_found_probability: clamped(0.0),
        }
    }
}

/// Wrap a client so it injects faults.
pub trait ChaosApiExt: Sized {
    /// Wrap `self` with the faults described by `config`.
    fn with_chaos(self, config: ChaosConfig) -> ChaosProvisioningApi<Self>;
}

/// Client wrapper that injects conflicts, server errors and visibility lag.
#[derive(Debug)]
pub struct ChaosProvisioningApi<A> {
    api: A,
    config: ChaosConfig,
    rng: Mutex<StdRng>,
}

impl<A> ChaosProvisioningApi<A> {
    /// Wrap `api`.
    pub fn new(api: A, config: ChaosConfig) -> Self {
        let rng = match config.deterministic_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(random()),
        };

        Self {
            api,
            config,
            rng: Mutex::new(rng),
        }
    }

    /// The wrapped client.
    pub const fn inner(&self) -> &A {
        &self.api
    }

    fn should_inject(&self, probability: Probability) -> bool {
        let prob_f32: f32 = probability.into();

        if prob_f32 <= 0.0 {
            return false;
        }

        if prob_f32 >= 1.0 {
            return true;
        }

        let mut rng = self
            .rng
            .lock()
            .expect("chaos RNG mutex should not be poisoned");

        rng.random_bool(f64::from(prob_f32))
    }

    fn injected_failure(&self, handle: &ResourceHandle, operation: &str) -> Option<ApiError> {
        self.should_inject(self.config.failure_probability).then(|| {
            debug!(resource = %handle, operation, "Injecting server error");
            ApiError::other(handle, format!("chaos: injected failure during {operation}"))
        })
    }
}

#[async_trait]
impl<A> StatusProbe for ChaosProvisioningApi<A>
where
    A: StatusProbe,
{
    async fn fetch_state(&self, handle: &ResourceHandle) -> Result<ResourceStatus, ApiError> {
        if self.should_inject(self.config.not_found_probability) {
            debug!(resource = %handle, "Injecting visibility lag");
            return Err(ApiError::not_found(handle));
        }
        if let Some(error) = self.injected_failure(handle, "fetch_state") {
            return Err(error);
        }
        self.api.fetch_state(handle).await
    }
}

#[async_trait]
impl<A> ResourceDeleter for ChaosProvisioningApi<A>
where
    A: ResourceDeleter,
{
    async fn delete(&self, handle: &ResourceHandle) -> Result<(), ApiError> {
        if self.should_inject(self.config.conflict_probability) {
            debug!(resource = %handle, "Injecting delete conflict");
            return Err(ApiError::conflict(handle, "chaos: injected conflict"));
        }
        if let Some(error) = self.injected_failure(handle, "delete") {
            return Err(error);
        }
        self.api.delete(handle).await
    }
}

#[async_trait]
impl<A> ResourceShow for ChaosProvisioningApi<A>
where
    A: ResourceShow,
{
    async fn show(&self, handle: &ResourceHandle) -> Result<(), ApiError> {
        if let Some(error) = self.injected_failure(handle, "show") {
            return Err(error);
        }
        self.api.show(handle).await
    }
}

impl<A> ChaosApiExt for A
where
    A: StatusProbe + ResourceDeleter + ResourceShow,
{
    fn with_chaos(self, config: ChaosConfig) -> ChaosProvisioningApi<Self> {
        ChaosProvisioningApi::new(self, config)
    }
}
