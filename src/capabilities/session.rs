use crux_core::capability::{CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;


/// Authentication session held by the shell.
#[derive(crux_core::macros::Capability)]
pub struct Session<Ev> {
    context: CapabilityContext<SessionOperation, Ev>,
}

impl<Ev> Session<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<SessionOperation, Ev>) -> Self {
        Self { context }
    }

    /// Ends the session server-side. The callback fires once the shell
    /// acknowledges the invalidation.
    pub fn logout<F>(&self, callback: F)
    where
        F: FnOnce(Result<(), SessionError>) -> Ev + Send + Sync + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = ctx
                .request_from_shell(SessionOperation::Logout)
                .await
                .and_then(|output| match output {
                    SessionOutput::LoggedOut => Ok(()),
                    SessionOutput::Status(_) => Err(SessionError::UnexpectedResponse),
                });
            ctx.update_app(callback(result));
        });
    }

    pub fn refresh_status<F>(&self, callback: F)
    where
        F: FnOnce(Result<AuthState, SessionError>) -> Ev + Send + Sync + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = ctx
                .request_from_shell(SessionOperation::RefreshStatus)
                .await
                .and_then(|output| match output {
                    SessionOutput::Status(state) => Ok(state),
                    SessionOutput::LoggedOut => Ok(AuthState::SignedOut),
                });
            ctx.update_app(callback(result));
        });
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionOperation {
    Logout,
    RefreshStatus,
}

impl Operation for SessionOperation {
    type Output = SessionResult;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuthState {
    SignedIn,
    SignedOut,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionOutput {
    LoggedOut,
    Status(AuthState),
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionError {
    #[error("could not reach the session service: {reason}")]
    Unreachable { reason: String },

    #[error("session service rejected the request: {reason}")]
    Rejected { reason: String },

    #[error("unexpected response from the session service")]
    UnexpectedResponse,
}

pub type SessionResult = Result<SessionOutput, SessionError>;
