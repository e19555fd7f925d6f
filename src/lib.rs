// lib.rs - Account screen core: profile display, picture change, logout

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod capabilities;
pub mod event;
pub mod model;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use capabilities::{ImageSourceError, ProfileError, ProfileSnapshot};
use model::{PictureFlow, Toast, ToastKind, UpdateStage};

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use event::{Event, PictureSource, SequenceToken};
pub use model::{Model, SessionStatus};

pub const PROFILE_IMAGE_FILE_NAME: &str = "profileImage";
pub const UPDATE_IN_PROGRESS_MESSAGE: &str =
    "Your picture is still updating. Try again once it finishes.";
pub const LOGOUT_NOTICE: &str = "You have been logged out.";
pub const LOGOUT_UNCONFIRMED_NOTICE: &str =
    "You have been logged out on this device, but the server could not confirm it.";
pub const LOGOUT_FAILED_NOTICE: &str = "Logging out did not go through. You are still signed in.";
pub const INFO_TOAST_DURATION_MS: u64 = 3_000;
pub const WARNING_TOAST_DURATION_MS: u64 = 5_000;

pub const USERNAME_LABEL: &str = "Username";
pub const EMAIL_LABEL: &str = "Email";
pub const DOGS_LABEL: &str = "Total Dogs Seen";
pub const BREEDS_LABEL: &str = "Total Breeds Seen";
pub const SCORE_LABEL: &str = "Score";

// --- Errors ---

/// Every way a picture change or profile refresh can end badly. None of
/// them is fatal; each one degrades to "previous state kept".
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum PictureError {
    #[error("picture selection cancelled")]
    Cancelled,

    #[error(transparent)]
    Device(ImageSourceError),

    #[error("{reason}")]
    Upload { reason: String },

    #[error("could not refresh your profile: {reason}")]
    Reload { reason: String },
}

impl PictureError {
    /// Errors built from a failed reload, whatever the store reported.
    #[must_use]
    pub fn reload(error: ProfileError) -> Self {
        match error {
            ProfileError::ReloadFailed { reason } => Self::Reload { reason },
            other => Self::Reload {
                reason: other.to_string(),
            },
        }
    }

    #[must_use]
    pub const fn is_silent(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Text for the error slot, or `None` when nothing should be shown.
    #[must_use]
    pub fn user_facing_message(&self) -> Option<String> {
        match self {
            Self::Cancelled => None,
            Self::Device(error) => Some(capitalize(&error.to_string())),
            Self::Upload { reason } => Some(reason.clone()),
            Self::Reload { .. } => Some(capitalize(&self.to_string())),
        }
    }
}

impl From<ImageSourceError> for PictureError {
    fn from(error: ImageSourceError) -> Self {
        if error.is_cancelled() {
            Self::Cancelled
        } else {
            Self::Device(error)
        }
    }
}

impl From<ProfileError> for PictureError {
    fn from(error: ProfileError) -> Self {
        match error {
            ProfileError::UploadFailed { reason } => Self::Upload { reason },
            ProfileError::ReloadFailed { reason } => Self::Reload { reason },
            other @ ProfileError::UnexpectedResponse { .. } => Self::Upload {
                reason: other.to_string(),
            },
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// --- View model ---

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct InfoRow {
    pub label: String,
    pub value: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountView {
    pub name: String,
    pub email: String,
    pub picture: Option<String>,
    pub dogs_seen_count: u32,
    pub collected_breeds_count: u32,
    pub score: u64,
    pub rows: Vec<InfoRow>,
}

impl From<&ProfileSnapshot> for AccountView {
    fn from(snapshot: &ProfileSnapshot) -> Self {
        let row = |label: &str, value: String| InfoRow {
            label: label.to_string(),
            value,
        };

        Self {
            name: snapshot.name.clone(),
            email: snapshot.email.clone(),
            picture: snapshot.picture.clone(),
            dogs_seen_count: snapshot.dogs_seen_count,
            collected_breeds_count: snapshot.collected_breeds_count,
            score: snapshot.score,
            rows: vec![
                row(USERNAME_LABEL, snapshot.name.clone()),
                row(EMAIL_LABEL, snapshot.email.clone()),
                row(DOGS_LABEL, snapshot.dogs_seen_count.to_string()),
                row(BREEDS_LABEL, snapshot.collected_breeds_count.to_string()),
                row(SCORE_LABEL, snapshot.score.to_string()),
            ],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PictureView {
    Closed,
    Modal { error: Option<String>, busy: bool },
    Updating { stage: UpdateStage },
    Error { message: String },
}

impl From<&PictureFlow> for PictureView {
    fn from(flow: &PictureFlow) -> Self {
        match flow {
            PictureFlow::Closed => Self::Closed,
            PictureFlow::Open { error, pending } => Self::Modal {
                error: error.clone(),
                busy: pending.is_some(),
            },
            PictureFlow::Updating(update) => Self::Updating {
                stage: update.stage.clone(),
            },
            PictureFlow::Error { message } => Self::Error {
                message: message.clone(),
            },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToastView {
    pub message: String,
    pub kind: ToastKind,
    pub duration_ms: u64,
}

impl From<&Toast> for ToastView {
    fn from(toast: &Toast) -> Self {
        Self {
            message: toast.message.clone(),
            kind: toast.kind,
            duration_ms: toast.kind.duration_ms(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewModel {
    pub session: SessionStatus,
    /// `None` until the first reload lands.
    pub account: Option<AccountView>,
    pub picture: PictureView,
    pub toast: Option<ToastView>,
    /// Why the shown profile may be out of date; paired with `can_refresh`.
    pub stale_message: Option<String>,
    pub can_refresh: bool,
    pub is_refreshing: bool,
    /// The session ended; the shell hands off to the login route.
    pub show_login: bool,
}

pub mod app {
    use std::mem;

    use tracing::{debug, info, warn};

    use super::*;
    use crate::capabilities::{
        Capabilities, ImageSourceResult, ProfileError, ProfileSnapshot, UploadReceipt,
    };
    use crate::model::{FlowRejection, PendingUpdate, SequenceOutcome, ToastKind, UpdateStage};

    #[derive(Default)]
    pub struct App;

    impl App {
        fn send_reload(model: &mut Model, caps: &Capabilities, token: SequenceToken) {
            model.latest_reload = Some(token);
            caps.profile.reload(move |result| Event::ProfileReloaded {
                token,
                result: Box::new(result),
            });
        }

        fn fail_sequence(model: &mut Model, token: SequenceToken, error: &PictureError) {
            let outcome = if error.is_silent() {
                info!(%token, "picture selection cancelled");
                SequenceOutcome::Cancelled
            } else {
                warn!(%token, %error, "picture update failed");
                SequenceOutcome::Failed(
                    error.user_facing_message().unwrap_or_else(|| error.to_string()),
                )
            };
            model.picture.finish(token, outcome);
        }

        fn choose_picture(source: PictureSource, model: &mut Model, caps: &Capabilities) {
            let token = model.sequences.next();

            match model.picture.begin(PendingUpdate::new(token, source)) {
                Ok(()) => {
                    info!(%token, %source, "picture update started");
                    caps.image_source.choose(
                        source,
                        model.capture_options.clone(),
                        move |result| Event::ImageSourceResponded {
                            token,
                            result: Box::new(result),
                        },
                    );
                }
                Err(FlowRejection::ModalClosed) => {
                    debug!(%source, "picture dialog is not open; ignoring choice");
                }
                Err(FlowRejection::SequenceInFlight(in_flight)) => {
                    warn!(%in_flight, %source, "picture update already in progress; choice rejected");
                }
            }
        }

        fn on_image(
            token: SequenceToken,
            result: ImageSourceResult,
            model: &mut Model,
            caps: &Capabilities,
        ) {
            let awaiting = model
                .picture
                .pending_for(token)
                .is_some_and(|update| update.stage == UpdateStage::AwaitingImage);
            if !awaiting {
                debug!(%token, "discarding stale image source response");
                return;
            }

            let image = match result.and_then(|image| image.validate().map(|()| image)) {
                Ok(image) => image,
                Err(e) => {
                    Self::fail_sequence(model, token, &PictureError::from(e));
                    return;
                }
            };

            debug!(%token, mime_type = %image.mime_type, "uploading picture");
            model.picture.advance(token, UpdateStage::Uploading);
            caps.profile.upload_picture(image, move |result| Event::PictureUploaded {
                token,
                result: Box::new(result),
            });
        }

        fn on_uploaded(
            token: SequenceToken,
            result: Result<UploadReceipt, ProfileError>,
            model: &mut Model,
            caps: &Capabilities,
        ) {
            let uploading = model
                .picture
                .pending_for(token)
                .is_some_and(|update| update.stage == UpdateStage::Uploading);
            if !uploading {
                debug!(%token, "discarding stale upload response");
                return;
            }

            match result {
                Ok(receipt) => {
                    debug!(%token, "picture uploaded; reloading profile");
                    model.picture.advance(
                        token,
                        UpdateStage::Reloading {
                            expected_picture: receipt.picture,
                        },
                    );
                    Self::send_reload(model, caps, token);
                }
                Err(e) => Self::fail_sequence(model, token, &PictureError::from(e)),
            }
        }

        fn on_reloaded(
            token: SequenceToken,
            result: Result<ProfileSnapshot, ProfileError>,
            model: &mut Model,
        ) {
            if model.is_abandoned(token) {
                debug!(%token, "discarding reload from abandoned work");
                return;
            }

            if model.latest_reload == Some(token) {
                model.latest_reload = None;
                model.is_refreshing = false;
            }

            let expected_picture = match model.picture.pending_for(token).map(|u| &u.stage) {
                Some(UpdateStage::Reloading { expected_picture }) => Some(expected_picture.clone()),
                _ => None,
            };
            // A later snapshot already on screen wins over this answer,
            // whatever the answer is.
            let is_newest = model.profile.accepts(token);

            match result {
                Ok(snapshot) if is_newest => {
                    if let Some(Some(expected)) = &expected_picture {
                        if snapshot.picture.as_deref() != Some(expected.as_str()) {
                            warn!(%token, "reloaded profile does not show the uploaded picture");
                        }
                    }
                    model.profile.replace(snapshot, token);
                    model.mark_fresh();
                }
                Ok(_) => {
                    debug!(%token, "newer snapshot already applied; discarding reload");
                }
                Err(e) => {
                    let error = PictureError::reload(e);
                    warn!(%token, %error, "profile reload failed; keeping previous snapshot");
                    if is_newest {
                        model.mark_stale(error.user_facing_message());
                    }
                }
            }

            // The upload already succeeded server-side, so even a failed
            // reload ends the sequence without a screen-level error.
            if expected_picture.is_some() {
                model.picture.finish(token, SequenceOutcome::Updated);
                info!(%token, "picture update finished");
            }
        }
    }

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
            debug!(
                event = event.name(),
                user_initiated = event.is_user_initiated(),
                "handling event"
            );

            match event {
                Event::AccountOpened | Event::RefreshProfile => {
                    if !model.session.is_signed_in() {
                        debug!(session = ?model.session, "not signed in; skipping profile reload");
                        return;
                    }

                    let token = model.sequences.next();
                    model.is_refreshing = true;
                    Self::send_reload(model, caps, token);
                    caps.render.render();
                }

                Event::OpenPictureModal => {
                    if !model.session.is_signed_in() {
                        return;
                    }
                    model.picture.open();
                    caps.render.render();
                }

                Event::ClosePictureModal => {
                    model.picture.close();
                    caps.render.render();
                }

                Event::ChoosePicture { source } => {
                    if !model.session.is_signed_in() {
                        debug!(%source, "not signed in; ignoring picture choice");
                        return;
                    }
                    Self::choose_picture(source, model, caps);
                    caps.render.render();
                }

                Event::ImageSourceResponded { token, result } => {
                    Self::on_image(token, *result, model, caps);
                    caps.render.render();
                }

                Event::PictureUploaded { token, result } => {
                    Self::on_uploaded(token, *result, model, caps);
                    caps.render.render();
                }

                Event::ProfileReloaded { token, result } => {
                    Self::on_reloaded(token, *result, model);
                    caps.render.render();
                }

                Event::DismissError => {
                    if model.picture.dismiss_error() {
                        caps.render.render();
                    }
                }

                Event::ToastDismissed => {
                    model.clear_toast();
                    caps.render.render();
                }

                Event::CaptureOptionsChanged(options) => {
                    model.capture_options = options.validated();
                    debug!(options = ?model.capture_options, "capture options updated");
                }

                Event::LogoutRequested => {
                    if !model.session.is_signed_in() {
                        debug!(session = ?model.session, "logout already underway");
                        return;
                    }

                    if let Some(update) = model.picture.pending() {
                        info!(token = %update.token, "abandoning picture update for logout");
                    }
                    model.session = SessionStatus::SigningOut;
                    model.abandon_in_flight();

                    info!("logging out");
                    caps.session
                        .logout(|result| Event::LogoutAcknowledged(Box::new(result)));
                    caps.render.render();
                }

                Event::LogoutAcknowledged(result) => {
                    if model.session != SessionStatus::SigningOut {
                        debug!(session = ?model.session, "discarding unexpected logout acknowledgment");
                        return;
                    }

                    match *result {
                        Ok(()) => {
                            info!("session service acknowledged logout");
                            model.show_toast(LOGOUT_NOTICE, ToastKind::Info);
                        }
                        Err(e) => {
                            warn!(error = %e, "logout was not acknowledged");
                            model.logout_unconfirmed = true;
                        }
                    }

                    caps.session
                        .refresh_status(|result| Event::SessionStatusRefreshed(Box::new(result)));
                    caps.render.render();
                }

                Event::SessionStatusRefreshed(result) => {
                    let status = match *result {
                        Ok(state) => SessionStatus::from(state),
                        Err(e) => {
                            warn!(error = %e, "session status unavailable; treating session as ended");
                            SessionStatus::SignedOut
                        }
                    };

                    let was_signing_out = model.session == SessionStatus::SigningOut;
                    let unconfirmed = mem::take(&mut model.logout_unconfirmed);

                    model.session = status;
                    match status {
                        SessionStatus::SignedOut => {
                            if unconfirmed {
                                model.show_toast(LOGOUT_UNCONFIRMED_NOTICE, ToastKind::Warning);
                            }
                            model.profile.clear();
                            model.mark_fresh();
                            model.abandon_in_flight();
                        }
                        SessionStatus::SignedIn if was_signing_out => {
                            warn!("session still active after logout");
                            model.show_toast(LOGOUT_FAILED_NOTICE, ToastKind::Warning);
                        }
                        _ => {}
                    }

                    info!(session = ?status, "session status refreshed");
                    caps.render.render();
                }
            }
        }

        fn view(&self, model: &Model) -> ViewModel {
            ViewModel {
                session: model.session,
                account: model.profile.get().map(AccountView::from),
                picture: PictureView::from(&model.picture),
                toast: model.active_toast.as_ref().map(ToastView::from),
                stale_message: model
                    .stale_message
                    .clone()
                    .filter(|_| model.session.is_signed_in() && model.profile_stale),
                can_refresh: model.session.is_signed_in()
                    && model.profile_stale
                    && !model.is_refreshing,
                is_refreshing: model.is_refreshing,
                show_login: model.session == SessionStatus::SignedOut,
            }
        }
    }
}
