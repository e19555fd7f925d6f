use serde::{Deserialize, Serialize};
use std::fmt;

use crate::capabilities::{
    AuthState, CaptureOptions, ImageSourceResult, ProfileError, ProfileSnapshot, SessionError,
    UploadReceipt,
};

// --- Sequence token ---

/// Tags one picture-change attempt or profile reload. Issued in strictly
/// increasing order by [`crate::model::SequenceCounter`].
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequenceToken(pub u64);

impl fmt::Display for SequenceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// --- Picture source ---

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PictureSource {
    Gallery,
    Camera,
}

impl fmt::Display for PictureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gallery => f.write_str("photo library"),
            Self::Camera => f.write_str("camera"),
        }
    }
}

// --- Event enum: large payloads boxed ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Event {
    // Account screen
    AccountOpened,
    RefreshProfile,
    DismissError,
    ToastDismissed,
    CaptureOptionsChanged(Box<CaptureOptions>),

    // Picture flow
    OpenPictureModal,
    ClosePictureModal,
    ChoosePicture {
        source: PictureSource,
    },

    // Session
    LogoutRequested,

    // Capability responses
    ImageSourceResponded {
        token: SequenceToken,
        result: Box<ImageSourceResult>,
    },
    PictureUploaded {
        token: SequenceToken,
        result: Box<Result<UploadReceipt, ProfileError>>,
    },
    ProfileReloaded {
        token: SequenceToken,
        result: Box<Result<ProfileSnapshot, ProfileError>>,
    },
    LogoutAcknowledged(Box<Result<(), SessionError>>),
    SessionStatusRefreshed(Box<Result<AuthState, SessionError>>),
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AccountOpened => "account_opened",
            Self::RefreshProfile => "refresh_profile",
            Self::DismissError => "dismiss_error",
            Self::ToastDismissed => "toast_dismissed",
            Self::CaptureOptionsChanged(_) => "capture_options_changed",
            Self::OpenPictureModal => "open_picture_modal",
            Self::ClosePictureModal => "close_picture_modal",
            Self::ChoosePicture { .. } => "choose_picture",
            Self::LogoutRequested => "logout_requested",
            Self::ImageSourceResponded { .. } => "image_source_responded",
            Self::PictureUploaded { .. } => "picture_uploaded",
            Self::ProfileReloaded { .. } => "profile_reloaded",
            Self::LogoutAcknowledged(_) => "logout_acknowledged",
            Self::SessionStatusRefreshed(_) => "session_status_refreshed",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::AccountOpened
                | Self::RefreshProfile
                | Self::DismissError
                | Self::ToastDismissed
                | Self::OpenPictureModal
                | Self::ClosePictureModal
                | Self::ChoosePicture { .. }
                | Self::LogoutRequested
        )
    }
}
