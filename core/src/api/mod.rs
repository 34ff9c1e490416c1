//! Typed facades, one per remote resource group.
//!
//! Each facade method fixes the relative path, verb, payload, result shape
//! and exception map of one remote operation and delegates to a
//! `WebServiceProxy`. Obtain facades from an `ApiProvider`.

mod account;
mod domains;
mod utility;

pub use account::AccountApi;
pub use domains::DomainsApi;
pub use test::TestApi;
pub use utility::UtilityApi;
