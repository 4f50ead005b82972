#![forbid(
    dead_code,
    invalid_value,
    overflowing_literals,
    unconditional_recursion,
    unreachable_pub,
    unused_allocation,
    unsafe_code
)]
#![deny(
    bad_style,
    clippy::allow_attributes,
    deprecated,
    meta_variable_misuse,
    non_ascii_idents,
    non_camel_case_types,
    non_snake_case,
    non_upper_case_globals,
    rust_2018_idioms,
    rust_2021_compatibility,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_code,
    unused_assignments,
    unused_attributes,
    unused_extern_crates,
    unused_imports,
    unused_must_use,
    unused_mut,
    unused_parens,
    unused_qualifications,
    unused_results,
    unused_variables
)]

//! Shared vocabulary types and traits for provisionwait.
//!
//! This crate holds the types shared between the `provisionwait` core and
//! the client implementations that back it (`provisionwait-memory`, the
//! chaos wrapper in `provisionwait-testing`, or a real REST client living in
//! a test plugin). Keeping them here lets clients depend on the vocabulary
//! without pulling in the polling machinery.
//!
//! # Overview
//!
//! - Addressing: `ResourceHandle`, `ResourceId`, `ResourceKind`
//! - Lifecycle: `ResourceStatus`
//! - Client seam: `StatusProbe`, `ResourceDeleter`, `ResourceShow`, `ResourceApi`
//! - Errors: `ApiError`

mod client;
mod errors;
mod resource;
mod validation;

pub use client::{ResourceApi, ResourceDeleter, ResourceShow, StatusProbe};
pub use errors::ApiError;
pub use resource::{
    ResourceHandle, ResourceId, ResourceIdError, ResourceKind, ResourceStatus, ResourceStatusError,
};
