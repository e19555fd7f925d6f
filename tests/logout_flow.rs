use crux_core::capability::Operation;
use crux_core::testing::AppTester;
use crux_core::Request;

use profile_core::capabilities::{
    AuthState, ImageDescriptor, ImageSourceOperation, ProfileOperation, ProfileOutput,
    ProfileSnapshot, SessionError, SessionOperation, SessionOutput,
};
use profile_core::model::{PictureFlow, ToastKind};
use profile_core::{
    App, Effect, Event, Model, PictureSource, SessionStatus, LOGOUT_FAILED_NOTICE, LOGOUT_NOTICE,
    LOGOUT_UNCONFIRMED_NOTICE,
};

type Tester = AppTester<App, Effect>;

fn snapshot() -> ProfileSnapshot {
    ProfileSnapshot {
        name: "Ana".into(),
        email: "a@x.com".into(),
        picture: Some("https://cdn/old.jpg".into()),
        dogs_seen_count: 5,
        collected_breeds_count: 3,
        score: 120,
    }
}

fn session_requests(effects: Vec<Effect>) -> Vec<Request<SessionOperation>> {
    effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::Session(request) => Some(request),
            _ => None,
        })
        .collect()
}

fn profile_requests(effects: Vec<Effect>) -> Vec<Request<ProfileOperation>> {
    effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::ProfileStore(request) => Some(request),
            _ => None,
        })
        .collect()
}

fn image_requests(effects: Vec<Effect>) -> Vec<Request<ImageSourceOperation>> {
    effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::ImageSource(request) => Some(request),
            _ => None,
        })
        .collect()
}

fn only<T>(mut items: Vec<T>) -> T {
    assert_eq!(items.len(), 1, "expected exactly one request");
    items.remove(0)
}

fn resolve<Op: Operation>(
    app: &Tester,
    model: &mut Model,
    request: &mut Request<Op>,
    output: Op::Output,
) -> Vec<Effect> {
    let update = app.resolve(request, output).expect("request should resolve");
    let mut effects = update.effects;
    for event in update.events {
        effects.extend(app.update(event, model).effects);
    }
    effects
}

fn mounted(app: &Tester) -> Model {
    let mut model = Model::default();
    let update = app.update(Event::AccountOpened, &mut model);
    let mut reload = only(profile_requests(update.effects));
    resolve(app, &mut model, &mut reload, Ok(ProfileOutput::Snapshot(snapshot())));
    model
}

/// Requests logout and returns the pending logout request.
fn log_out(app: &Tester, model: &mut Model) -> Request<SessionOperation> {
    let update = app.update(Event::LogoutRequested, model);
    only(session_requests(update.effects))
}

#[test]
fn logout_waits_for_acknowledgment_before_refreshing_status() {
    let app = Tester::default();
    let mut model = mounted(&app);

    let update = app.update(Event::LogoutRequested, &mut model);
    assert_eq!(model.session, SessionStatus::SigningOut);

    let mut requests = session_requests(update.effects);
    assert_eq!(requests.len(), 1);
    let mut logout = requests.remove(0);
    assert_eq!(logout.operation, SessionOperation::Logout);
    assert!(app.view(&model).toast.is_none());

    let effects = resolve(&app, &mut model, &mut logout, Ok(SessionOutput::LoggedOut));

    let toast = app.view(&model).toast.expect("logout notice is shown");
    assert_eq!(toast.message, LOGOUT_NOTICE);
    assert_eq!(toast.kind, ToastKind::Info);
    assert_eq!(toast.duration_ms, 3_000);

    let mut refresh = only(session_requests(effects));
    assert_eq!(refresh.operation, SessionOperation::RefreshStatus);

    resolve(
        &app,
        &mut model,
        &mut refresh,
        Ok(SessionOutput::Status(AuthState::SignedOut)),
    );
    assert_eq!(model.session, SessionStatus::SignedOut);
    let view = app.view(&model);
    assert!(view.account.is_none());
    assert!(view.show_login);
    assert_eq!(view.toast.map(|t| t.message), Some(LOGOUT_NOTICE.to_string()));
}

#[test]
fn second_logout_request_is_ignored() {
    let app = Tester::default();
    let mut model = mounted(&app);

    let _logout = log_out(&app, &mut model);
    let update = app.update(Event::LogoutRequested, &mut model);

    assert!(session_requests(update.effects).is_empty());
    assert_eq!(model.session, SessionStatus::SigningOut);
}

#[test]
fn unacknowledged_logout_warns_and_still_refreshes() {
    let app = Tester::default();
    let mut model = mounted(&app);

    let mut logout = log_out(&app, &mut model);
    let effects = resolve(
        &app,
        &mut model,
        &mut logout,
        Err(SessionError::Unreachable {
            reason: "offline".into(),
        }),
    );

    assert!(app.view(&model).toast.is_none(), "notice waits for the status");

    let mut refresh = only(session_requests(effects));
    assert_eq!(refresh.operation, SessionOperation::RefreshStatus);
    resolve(
        &app,
        &mut model,
        &mut refresh,
        Ok(SessionOutput::Status(AuthState::SignedOut)),
    );

    let toast = app.view(&model).toast.expect("warning is shown");
    assert_eq!(toast.message, LOGOUT_UNCONFIRMED_NOTICE);
    assert_eq!(toast.kind, ToastKind::Warning);

    let _ = app.update(Event::ToastDismissed, &mut model);
    assert!(app.view(&model).toast.is_none());
}

#[test]
fn failed_logout_with_live_session_says_still_signed_in() {
    let app = Tester::default();
    let mut model = mounted(&app);

    let mut logout = log_out(&app, &mut model);
    let effects = resolve(
        &app,
        &mut model,
        &mut logout,
        Err(SessionError::Unreachable {
            reason: "offline".into(),
        }),
    );
    let mut refresh = only(session_requests(effects));
    resolve(
        &app,
        &mut model,
        &mut refresh,
        Ok(SessionOutput::Status(AuthState::SignedIn)),
    );

    assert_eq!(model.session, SessionStatus::SignedIn);
    let view = app.view(&model);
    assert!(!view.show_login);
    let toast = view.toast.expect("failure is shown");
    assert_eq!(toast.message, LOGOUT_FAILED_NOTICE);
    assert_eq!(toast.kind, ToastKind::Warning);
}

#[test]
fn status_error_is_treated_as_signed_out() {
    let app = Tester::default();
    let mut model = mounted(&app);

    let mut logout = log_out(&app, &mut model);
    let effects = resolve(&app, &mut model, &mut logout, Ok(SessionOutput::LoggedOut));
    let mut refresh = only(session_requests(effects));

    resolve(
        &app,
        &mut model,
        &mut refresh,
        Err(SessionError::Rejected {
            reason: "token revoked".into(),
        }),
    );

    assert_eq!(model.session, SessionStatus::SignedOut);
    assert!(!model.profile.is_loaded());
}

#[test]
fn still_signed_in_keeps_profile() {
    let app = Tester::default();
    let mut model = mounted(&app);

    let mut logout = log_out(&app, &mut model);
    let effects = resolve(&app, &mut model, &mut logout, Ok(SessionOutput::LoggedOut));
    let mut refresh = only(session_requests(effects));
    resolve(
        &app,
        &mut model,
        &mut refresh,
        Ok(SessionOutput::Status(AuthState::SignedIn)),
    );

    assert_eq!(model.session, SessionStatus::SignedIn);
    assert_eq!(model.profile.get(), Some(&snapshot()));
    let toast = app.view(&model).toast.expect("logout notice is replaced");
    assert_eq!(toast.message, LOGOUT_FAILED_NOTICE);
}

#[test]
fn picture_events_are_ignored_while_signing_out() {
    let app = Tester::default();
    let mut model = mounted(&app);
    let _logout = log_out(&app, &mut model);

    let _ = app.update(Event::OpenPictureModal, &mut model);
    assert!(!model.picture.is_modal_open());

    let update = app.update(
        Event::ChoosePicture {
            source: PictureSource::Gallery,
        },
        &mut model,
    );
    assert!(image_requests(update.effects).is_empty());

    let update = app.update(Event::RefreshProfile, &mut model);
    assert!(profile_requests(update.effects).is_empty());
}

#[test]
fn logout_abandons_pending_picture_update() {
    let app = Tester::default();
    let mut model = mounted(&app);

    let _ = app.update(Event::OpenPictureModal, &mut model);
    let update = app.update(
        Event::ChoosePicture {
            source: PictureSource::Camera,
        },
        &mut model,
    );
    let mut capture = only(image_requests(update.effects));

    let _logout = log_out(&app, &mut model);
    assert_eq!(model.picture, PictureFlow::Closed);

    let effects = resolve(
        &app,
        &mut model,
        &mut capture,
        Ok(ImageDescriptor::new(
            "file://a.jpg",
            "image/jpeg",
            "profileImage",
        )),
    );

    assert!(profile_requests(effects).is_empty(), "no upload after logout");
    assert_eq!(model.picture, PictureFlow::Closed);
}

#[test]
fn late_reload_after_logout_is_discarded() {
    let app = Tester::default();
    let mut model = mounted(&app);

    let update = app.update(Event::RefreshProfile, &mut model);
    let mut reload = only(profile_requests(update.effects));

    let mut logout = log_out(&app, &mut model);
    assert!(!model.is_refreshing);

    let effects = resolve(&app, &mut model, &mut logout, Ok(SessionOutput::LoggedOut));
    let mut refresh = only(session_requests(effects));
    resolve(
        &app,
        &mut model,
        &mut refresh,
        Ok(SessionOutput::Status(AuthState::SignedOut)),
    );

    resolve(
        &app,
        &mut model,
        &mut reload,
        Ok(ProfileOutput::Snapshot(snapshot())),
    );
    assert!(!model.profile.is_loaded());
}

#[test]
fn stray_acknowledgment_is_ignored() {
    let app = Tester::default();
    let mut model = mounted(&app);

    let update = app.update(Event::LogoutAcknowledged(Box::new(Ok(()))), &mut model);

    assert!(session_requests(update.effects).is_empty());
    assert!(model.active_toast.is_none());
    assert_eq!(model.session, SessionStatus::SignedIn);
}
