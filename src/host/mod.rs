//! Host SDK integration
//!
//! Capability traits for the hosting application (`HostSdk`,
//! `IdentityProvider`, `PermissionProbe`), the `HostShim` that initializes
//! the host once per panel, and `StandaloneHost` for running outside Teams.

mod sdk;
mod shim;
mod standalone;

pub use sdk::{
    AccessToken, HostContext, HostError, HostSdk, IdentityProvider, PermissionProbe,
    PermissionState, UserInfo, AUTHORIZATION_MARKER,
};
pub use shim::{HostShim, ProbeReport};
pub use standalone::{StandaloneHost, ACCESS_TOKEN_ENV};
