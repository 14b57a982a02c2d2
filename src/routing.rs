//! Route table and access guard.
//!
//! Public routes always render. Protected routes under `/app` need a signed-in
//! session and an existing profile; a missing profile leads to onboarding.

/// Application routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Landing,
    Auth,
    Onboarding,
    Dashboard,
    Journal,
    Calm,
    Insights,
    Settings,
}

impl Route {
    pub const ALL: &'static [Route] = &[
        Route::Landing,
        Route::Auth,
        Route::Onboarding,
        Route::Dashboard,
        Route::Journal,
        Route::Calm,
        Route::Insights,
        Route::Settings,
    ];

    /// Resolve a path. Trailing slashes are ignored and `/app` means the
    /// dashboard.
    pub fn parse(path: &str) -> Option<Route> {
        let trimmed = path.trim();
        let normalized = match trimmed.trim_end_matches('/') {
            "" if trimmed.starts_with('/') => "/",
            other => other,
        };

        match normalized {
            "/" => Some(Route::Landing),
            "/auth" => Some(Route::Auth),
            "/onboarding" => Some(Route::Onboarding),
            "/app" | "/app/dashboard" => Some(Route::Dashboard),
            "/app/journal" => Some(Route::Journal),
            "/app/calm" => Some(Route::Calm),
            "/app/insights" => Some(Route::Insights),
            "/app/settings" => Some(Route::Settings),
            _ => None,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Auth => "/auth",
            Route::Onboarding => "/onboarding",
            Route::Dashboard => "/app/dashboard",
            Route::Journal => "/app/journal",
            Route::Calm => "/app/calm",
            Route::Insights => "/app/insights",
            Route::Settings => "/app/settings",
        }
    }

    /// Whether the route lives in the protected `/app` tree.
    pub fn is_protected(&self) -> bool {
        matches!(
            self,
            Route::Dashboard | Route::Journal | Route::Calm | Route::Insights | Route::Settings
        )
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// What is known about the signed-in user's profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileState {
    /// Still being fetched
    Loading,
    Found,
    /// The backend has no profile for this user
    Missing,
    /// The fetch failed for another reason; carries the user-facing message
    Failed(String),
}

#[cfg(feature = "api")]
impl From<&Result<crate::api::ProfileStatus, crate::api::ApiError>> for ProfileState {
    fn from(result: &Result<crate::api::ProfileStatus, crate::api::ApiError>) -> Self {
        use crate::api::{ApiError, ProfileStatus};

        match result {
            Ok(ProfileStatus::Found(_)) => ProfileState::Found,
            Ok(ProfileStatus::Missing) | Err(ApiError::NotFound(_)) => ProfileState::Missing,
            Err(e) => ProfileState::Failed(e.user_message()),
        }
    }
}

/// Outcome of guarding a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Render(Route),
    Redirect(Route),
    /// Profile still loading; show a spinner
    Loading,
    /// Profile fetch failed; show an inline retry affordance
    ProfileError(String),
}

/// Decide what to show for `route`.
pub fn guard(route: Route, has_session: bool, profile: &ProfileState) -> RouteDecision {
    if !route.is_protected() {
        return RouteDecision::Render(route);
    }
    if !has_session {
        return RouteDecision::Redirect(Route::Auth);
    }

    match profile {
        ProfileState::Loading => RouteDecision::Loading,
        ProfileState::Found => RouteDecision::Render(route),
        ProfileState::Missing => {
            tracing::debug!(route = %route, "No profile, redirecting to onboarding");
            RouteDecision::Redirect(Route::Onboarding)
        }
        ProfileState::Failed(message) => RouteDecision::ProfileError(message.clone()),
    }
}
