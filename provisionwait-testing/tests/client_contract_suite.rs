//! Client contract suite entry point.
//!
//! Runs every check in `provisionwait_testing::contract` against the
//! in-memory client, once as provisioned and once with a lingering delete.

use provisionwait_memory::{InMemoryProvisioningApi, SimulatedResource};
use provisionwait_testing::contract::client_contract_tests;
use provisionwait_types::{ResourceHandle, ResourceKind, ResourceStatus};

fn settled_instance() -> (InMemoryProvisioningApi, ResourceHandle) {
    let api = InMemoryProvisioningApi::new();
    let handle = ResourceHandle::parse(ResourceKind::Instance, "contract-1").expect("valid id");
    api.provision(&handle, SimulatedResource::settled(ResourceStatus::active()));
    (api, handle)
}

fn lingering_network() -> (InMemoryProvisioningApi, ResourceHandle) {
    let api = InMemoryProvisioningApi::new();
    let handle = ResourceHandle::parse(ResourceKind::Network, "contract-2").expect("valid id");
    api.provision(
        &handle,
        SimulatedResource::settled(ResourceStatus::active()).lingering_after_delete(5),
    );
    (api, handle)
}

client_contract_tests! {
    suite = in_memory,
    make_api = super::settled_instance,
}

client_contract_tests! {
    suite = in_memory_lingering,
    make_api = super::lingering_network,
}
