use crux_core::capability::{CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::image_source::ImageDescriptor;

/// Remote user-data service: picture upload and full profile reload.
#[derive(crux_core::macros::Capability)]
pub struct ProfileStore<Ev> {
    context: CapabilityContext<ProfileOperation, Ev>,
}

impl<Ev> ProfileStore<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<ProfileOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn upload_picture<F>(&self, image: ImageDescriptor, callback: F)
    where
        F: FnOnce(Result<UploadReceipt, ProfileError>) -> Ev + Send + Sync + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = ctx
                .request_from_shell(ProfileOperation::UploadPicture { image })
                .await
                .and_then(|output| match output {
                    ProfileOutput::PictureUploaded(receipt) => Ok(receipt),
                    ProfileOutput::Snapshot(snapshot) => Ok(UploadReceipt {
                        picture: snapshot.picture,
                    }),
                });
            ctx.update_app(callback(result));
        });
    }

    pub fn reload<F>(&self, callback: F)
    where
        F: FnOnce(Result<ProfileSnapshot, ProfileError>) -> Ev + Send + Sync + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = ctx
                .request_from_shell(ProfileOperation::Reload)
                .await
                .and_then(|output| match output {
                    ProfileOutput::Snapshot(snapshot) => Ok(snapshot),
                    ProfileOutput::PictureUploaded(_) => Err(ProfileError::UnexpectedResponse {
                        operation: "reload".to_string(),
                    }),
                });
            ctx.update_app(callback(result));
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProfileOperation {
    UploadPicture { image: ImageDescriptor },
    Reload,
}

impl Operation for ProfileOperation {
    type Output = ProfileResult;
}

/// Everything the account screen shows about the signed-in user.
///
/// Replaced as a whole on every reload; never patched field by field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ProfileSnapshot {
    pub name: String,
    pub email: String,
    pub picture: Option<String>,
    /// Older profile services don't report it.
    #[serde(default)]
    pub dogs_seen_count: u32,
    pub collected_breeds_count: u32,
    pub score: u64,
}

/// Server acknowledgment of an upload. `picture` is the URI the profile
/// will report once reloaded, when the server tells us.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct UploadReceipt {
    pub picture: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProfileOutput {
    PictureUploaded(UploadReceipt),
    Snapshot(ProfileSnapshot),
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProfileError {
    #[error("{reason}")]
    UploadFailed { reason: String },

    #[error("could not load your profile: {reason}")]
    ReloadFailed { reason: String },

    #[error("unexpected response to {operation}")]
    UnexpectedResponse { operation: String },
}

impl ProfileError {
    pub fn upload(reason: impl Into<String>) -> Self {
        Self::UploadFailed {
            reason: reason.into(),
        }
    }

    pub fn reload(reason: impl Into<String>) -> Self {
        Self::ReloadFailed {
            reason: reason.into(),
        }
    }
}

pub type ProfileResult = Result<ProfileOutput, ProfileError>;
