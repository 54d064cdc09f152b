use super::domain::User;
use super::session::SessionState;

/// Outcome of guarding a members-only page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAccess {
    /// Initial session check still running; show a placeholder.
    Pending,
    Granted(User),
    RedirectToLogin,
}

/// Outcome of guarding a guest-only page such as registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuestAccess {
    Pending,
    Allowed,
    RedirectHome,
}

pub fn require_user(state: &SessionState) -> RouteAccess {
    if state.is_loading {
        return RouteAccess::Pending;
    }
    match &state.user {
        Some(user) => RouteAccess::Granted(user.clone()),
        None => RouteAccess::RedirectToLogin,
    }
}

pub fn guest_only(state: &SessionState) -> GuestAccess {
    if state.is_loading {
        GuestAccess::Pending
    } else if state.user.is_some() {
        GuestAccess::RedirectHome
    } else {
        GuestAccess::Allowed
    }
}
