mod image_source;
mod profile;
mod session;

pub use self::image_source::{
    CaptureOptions, ImageDescriptor, ImageSource, ImageSourceError, ImageSourceOperation,
    ImageSourceResult, DEFAULT_CROP_HEIGHT, DEFAULT_CROP_WIDTH, DEFAULT_JPEG_QUALITY,
    MAX_CROP_DIMENSION,
};
pub use self::profile::{
    ProfileError, ProfileOperation, ProfileOutput, ProfileResult, ProfileSnapshot, ProfileStore,
    UploadReceipt,
};
pub use self::session::{
    AuthState, Session, SessionError, SessionOperation, SessionOutput, SessionResult,
};

// Crux's built-in Render capability is used as is; it covers everything
// needed to trigger view updates.
pub use crux_core::render::Render;

use crate::app::App;
use crate::event::Event;

pub type AppRender = Render<Event>;
pub type AppImageSource = ImageSource<Event>;
pub type AppProfile = ProfileStore<Event>;
pub type AppSession = Session<Event>;

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub render: Render<Event>,
    pub image_source: ImageSource<Event>,
    pub profile: ProfileStore<Event>,
    pub session: Session<Event>,
}
