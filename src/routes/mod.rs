/// Router Module Index
///
/// Splits the portal shell into three access tiers, each enforced by its own
/// layer rather than inside handlers.

/// Routes reachable without a session: health, login, logout, session state.
pub mod public;

/// Session API routes. Require an authenticated session (401 otherwise).
pub mod authenticated;

/// Portal pages generated from the role policy table, each behind the route guard.
pub mod portal;
