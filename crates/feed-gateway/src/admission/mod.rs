//! Connection admission
//!
//! Gates shipped with the gateway, and the policy that turns a gate's
//! verdict into a close code at upgrade time.

mod local;
mod policy;

pub use local::LocalAdmissionGate;
pub use policy::AdmissionPolicy;
