//! Reactive access hook.
//!
//! The page-level counterpart of the route guard: instead of being asked once
//! per request, it follows the session and navigates away as soon as the
//! current role or token validity stops satisfying the page.

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::{
    access,
    models::{Role, SessionSnapshot},
    redirect::RedirectPaths,
    session::SessionManager,
    token::is_valid_opt,
};

/// Navigator
///
/// Performs the navigation side effect on behalf of the hook.
pub trait Navigator: Send + Sync + 'static {
    fn navigate(&self, path: &str);
}

/// AccessWatch
///
/// Handle owned by the consuming view. Dropping it tears the hook down and
/// cancels any navigation that has not run yet.
pub struct AccessWatch {
    task: JoinHandle<()>,
}

impl AccessWatch {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for AccessWatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// hook_decision
///
/// `None` when the page may stay, otherwise the path to navigate to.
pub fn hook_decision(
    snapshot: &SessionSnapshot,
    allowed_roles: &[Role],
    redirects: &RedirectPaths,
) -> Option<String> {
    if !is_valid_opt(snapshot.token()) {
        return Some(redirects.login.clone());
    }
    let role = snapshot.role();
    if !allowed_roles.is_empty() && !access::has_access(role, Some(allowed_roles)) {
        return Some(redirects.hook_fallback_path(role).to_string());
    }
    None
}

/// watch_access
///
/// Spawns the hook on the current tokio runtime. It re-evaluates once per
/// change of (role, token validity) after the session has finished loading,
/// and stops when the session is disposed or the handle is dropped.
pub fn watch_access(
    session: &SessionManager,
    allowed_roles: Vec<Role>,
    redirects: RedirectPaths,
    navigator: Arc<dyn Navigator>,
) -> AccessWatch {
    let mut rx = session.subscribe();

    let task = tokio::spawn(async move {
        let mut last_inputs: Option<(Option<String>, bool)> = None;

        loop {
            let snapshot = rx.borrow_and_update().clone();

            if !snapshot.is_loading {
                let inputs = (
                    snapshot.role().map(str::to_string),
                    is_valid_opt(snapshot.token()),
                );
                if last_inputs.as_ref() != Some(&inputs) {
                    last_inputs = Some(inputs);
                    if let Some(path) = hook_decision(&snapshot, &allowed_roles, &redirects) {
                        tracing::debug!(target_path = %path, "access hook navigating");
                        navigator.navigate(&path);
                    }
                }
            }

            if rx.changed().await.is_err() {
                break;
            }
        }
    });

    AccessWatch { task }
}
