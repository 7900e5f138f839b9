//! Explicit authenticated-session lifecycle
//!
//! The session is process-wide state with explicit init and teardown: on
//! startup the app resolves the current user (or refuses entry), and the
//! resolved [`Session`] is passed down to each view. No view performs an
//! ambient auth lookup of its own.

use agora_client::effects::AuthEffects;
use agora_core::{AuthError, User};

/// A resolved authenticated session.
#[derive(Debug, Clone)]
pub struct Session {
    user: User,
}

impl Session {
    /// Resolve the current user, or refuse entry.
    pub async fn resolve<A>(auth: &A) -> Result<Self, AuthError>
    where
        A: AuthEffects + ?Sized,
    {
        let user = auth.current_user().await?;
        tracing::info!(user = %user.username, "session resolved");
        Ok(Self { user })
    }

    /// The signed-in user.
    pub fn user(&self) -> &User {
        &self.user
    }

    /// The signed-in user's name.
    pub fn username(&self) -> &str {
        &self.user.username
    }

    /// End the session. Consumes the session so no view can keep using it.
    pub async fn sign_out<A>(self, auth: &A) -> Result<(), AuthError>
    where
        A: AuthEffects + ?Sized,
    {
        auth.sign_out().await?;
        tracing::info!(user = %self.user.username, "signed out");
        Ok(())
    }
}
