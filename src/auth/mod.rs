//! Account sessions: registration, sign-in, profile editing and page gating.
//!
//! Every visitor gets an [`AuthSession`] wrapping a narrow [`IdentityProvider`]
//! handle. Signed-in sessions are tracked by [`SessionRegistry`] under their
//! access token so HTTP handlers can gate members-only routes.

pub mod domain;
pub mod forms;
pub mod gate;
pub mod provider;
pub mod registry;
pub mod remote;
pub mod router;
pub mod session;

#[cfg(test)]
mod tests;

pub use domain::{
    ProfileUpdate, ProviderSession, SessionEvent, SignUpAttributes, User, UserId, UserProfile,
};
pub use forms::{validate_profile_update, LoginForm, RegistrationForm};
pub use gate::{guest_only, require_user, GuestAccess, RouteAccess};
pub use provider::{IdentityConnector, IdentityProvider, ProfileStore, ProviderError};
pub use registry::{bearer_token, GateRejection, SessionRegistry};
pub use remote::{RemoteIdentityConnector, RemoteIdentityProvider, RemoteProfileStore};
pub use router::auth_router;
pub use session::{
    AuthError, AuthOperation, AuthOutcome, AuthSession, ProfileState, SessionState, HOME_PATH,
    LOGIN_PATH,
};
