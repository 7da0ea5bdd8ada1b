/// Router Module Index
///
/// Organizes the application's routing logic into access-segregated modules
/// so that the gate for each tier is applied once, at the module boundary,
/// instead of being re-checked inside individual handlers.
///
/// The three modules map directly to the access tiers.

/// Routes accessible to anyone: the landing page, the login/logout flow,
/// and self-service registration.
pub mod public;

/// Routes protected by the session-auth layer. Anonymous requests are
/// redirected to the login page before a handler runs.
pub mod authenticated;

/// Routes restricted to accounts with the 'admin' role: the host
/// management panel.
pub mod admin;
