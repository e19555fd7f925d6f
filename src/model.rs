use serde::{Deserialize, Serialize};
use std::mem;

use crate::capabilities::{AuthState, CaptureOptions, ProfileSnapshot};
use crate::event::{PictureSource, SequenceToken};
use crate::{INFO_TOAST_DURATION_MS, WARNING_TOAST_DURATION_MS};

// --- Sequencing ---

/// Hands out sequence tokens. Never reused within a model's lifetime.
#[derive(Debug, Default, Clone)]
pub struct SequenceCounter {
    last: u64,
}

impl SequenceCounter {
    pub fn next(&mut self) -> SequenceToken {
        self.last += 1;
        SequenceToken(self.last)
    }

    pub fn last_issued(&self) -> Option<SequenceToken> {
        (self.last > 0).then_some(SequenceToken(self.last))
    }
}

// --- Picture flow ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpdateStage {
    AwaitingImage,
    Uploading,
    Reloading { expected_picture: Option<String> },
}

/// A picture-change sequence that has not reached a terminal state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingUpdate {
    pub token: SequenceToken,
    pub source: PictureSource,
    pub stage: UpdateStage,
}

impl PendingUpdate {
    pub fn new(token: SequenceToken, source: PictureSource) -> Self {
        Self {
            token,
            source,
            stage: UpdateStage::AwaitingImage,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SequenceOutcome {
    Updated,
    Cancelled,
    Failed(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowRejection {
    ModalClosed,
    SequenceInFlight(SequenceToken),
}

/// Dialog visibility, the in-flight sequence and both error slots as one
/// value. An open dialog never sits next to a screen-level error.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PictureFlow {
    #[default]
    Closed,
    /// Dialog shown. `pending` is set when the user re-opened it while an
    /// earlier sequence is still running.
    Open {
        error: Option<String>,
        pending: Option<PendingUpdate>,
    },
    Updating(PendingUpdate),
    Error {
        message: String,
    },
}

impl PictureFlow {
    #[must_use]
    pub fn is_modal_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    #[must_use]
    pub fn pending(&self) -> Option<&PendingUpdate> {
        match self {
            Self::Updating(update) | Self::Open { pending: Some(update), .. } => Some(update),
            _ => None,
        }
    }

    #[must_use]
    pub fn pending_for(&self, token: SequenceToken) -> Option<&PendingUpdate> {
        self.pending().filter(|update| update.token == token)
    }

    #[must_use]
    pub fn screen_error(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message),
            _ => None,
        }
    }

    #[must_use]
    pub fn modal_error(&self) -> Option<&str> {
        match self {
            Self::Open { error, .. } => error.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn open(&mut self) {
        *self = match mem::take(self) {
            Self::Closed | Self::Error { .. } => Self::Open {
                error: None,
                pending: None,
            },
            Self::Updating(update) => Self::Open {
                error: None,
                pending: Some(update),
            },
            Self::Open { pending, .. } => Self::Open {
                error: None,
                pending,
            },
        };
    }

    pub(crate) fn close(&mut self) {
        *self = match mem::take(self) {
            Self::Open {
                pending: Some(update),
                ..
            } => Self::Updating(update),
            Self::Open { pending: None, .. } => Self::Closed,
            other => other,
        };
    }

    pub(crate) fn dismiss_error(&mut self) -> bool {
        if matches!(self, Self::Error { .. }) {
            *self = Self::Closed;
            return true;
        }
        false
    }

    /// Closes the dialog and starts `update`, unless the dialog is not
    /// showing or another sequence is still in flight.
    pub(crate) fn begin(&mut self, update: PendingUpdate) -> Result<(), FlowRejection> {
        match self {
            Self::Open { pending: None, .. } => {
                *self = Self::Updating(update);
                Ok(())
            }
            Self::Open {
                error,
                pending: Some(in_flight),
            } => {
                let token = in_flight.token;
                *error = Some(crate::UPDATE_IN_PROGRESS_MESSAGE.to_string());
                Err(FlowRejection::SequenceInFlight(token))
            }
            _ => Err(FlowRejection::ModalClosed),
        }
    }

    pub(crate) fn advance(&mut self, token: SequenceToken, stage: UpdateStage) -> bool {
        match self {
            Self::Updating(update)
            | Self::Open {
                pending: Some(update),
                ..
            } if update.token == token => {
                update.stage = stage;
                true
            }
            _ => false,
        }
    }

    /// Ends the sequence tagged `token`. A failure lands in the modal slot
    /// when the dialog is showing, otherwise in the screen slot.
    pub(crate) fn finish(&mut self, token: SequenceToken, outcome: SequenceOutcome) -> bool {
        if self.pending_for(token).is_none() {
            return false;
        }

        *self = match (mem::take(self), outcome) {
            (Self::Open { .. }, SequenceOutcome::Failed(message)) => Self::Open {
                error: Some(message),
                pending: None,
            },
            (Self::Open { error, .. }, _) => Self::Open {
                error,
                pending: None,
            },
            (_, SequenceOutcome::Failed(message)) => Self::Error { message },
            (_, _) => Self::Closed,
        };
        true
    }
}

// --- Profile cell ---

/// Sole owner of the loaded profile. Readers borrow; only the update loop
/// replaces it, always as a whole.
#[derive(Debug, Default, Clone)]
pub struct ProfileCell {
    snapshot: Option<ProfileSnapshot>,
    applied: Option<SequenceToken>,
}

impl ProfileCell {
    #[must_use]
    pub fn get(&self) -> Option<&ProfileSnapshot> {
        self.snapshot.as_ref()
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Token of the reload that produced the current snapshot.
    #[must_use]
    pub fn applied_token(&self) -> Option<SequenceToken> {
        self.applied
    }

    /// True when no snapshot from a later reload has been applied yet.
    #[must_use]
    pub fn accepts(&self, token: SequenceToken) -> bool {
        match self.applied {
            Some(applied) => token > applied,
            None => true,
        }
    }

    pub(crate) fn replace(&mut self, snapshot: ProfileSnapshot, token: SequenceToken) {
        self.snapshot = Some(snapshot);
        self.applied = Some(token);
    }

    pub(crate) fn clear(&mut self) {
        self.snapshot = None;
        self.applied = None;
    }
}

// --- Session ---

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    SignedIn,
    SigningOut,
    SignedOut,
}

impl SessionStatus {
    #[must_use]
    pub fn is_signed_in(self) -> bool {
        self == Self::SignedIn
    }
}

impl From<AuthState> for SessionStatus {
    fn from(state: AuthState) -> Self {
        match state {
            AuthState::SignedIn => Self::SignedIn,
            AuthState::SignedOut => Self::SignedOut,
        }
    }
}

// --- Toasts ---

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    Info,
    Warning,
}

impl ToastKind {
    #[must_use]
    pub const fn duration_ms(self) -> u64 {
        match self {
            Self::Info => INFO_TOAST_DURATION_MS,
            Self::Warning => WARNING_TOAST_DURATION_MS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
}

// --- Model ---

#[derive(Debug, Default)]
pub struct Model {
    pub session: SessionStatus,
    pub profile: ProfileCell,
    pub picture: PictureFlow,
    pub sequences: SequenceCounter,
    /// Newest reload request; answers to any other token never touch the
    /// snapshot.
    pub latest_reload: Option<SequenceToken>,
    pub is_refreshing: bool,
    /// Last reload failed; the view offers a manual refresh.
    pub profile_stale: bool,
    pub stale_message: Option<String>,
    /// Answers to tokens up to this one belong to abandoned work.
    pub discard_through: Option<SequenceToken>,
    /// The session service did not confirm the logout; the notice waits
    /// for the status refresh.
    pub logout_unconfirmed: bool,
    pub active_toast: Option<Toast>,
    pub capture_options: CaptureOptions,
}

impl Model {
    pub fn show_toast(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.active_toast = Some(Toast {
            message: message.into(),
            kind,
        });
    }

    pub fn clear_toast(&mut self) {
        self.active_toast = None;
    }

    pub fn mark_stale(&mut self, message: Option<String>) {
        self.profile_stale = true;
        self.stale_message = message;
    }

    pub fn mark_fresh(&mut self) {
        self.profile_stale = false;
        self.stale_message = None;
    }

    #[must_use]
    pub fn is_abandoned(&self, token: SequenceToken) -> bool {
        self.discard_through.is_some_and(|through| token <= through)
    }

    /// Drops every in-flight picture sequence and reload so their late
    /// answers are discarded.
    pub fn abandon_in_flight(&mut self) {
        self.picture = PictureFlow::Closed;
        self.latest_reload = None;
        self.is_refreshing = false;
        self.discard_through = self.sequences.last_issued();
    }
}
