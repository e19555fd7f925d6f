use crux_core::capability::{CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::event::PictureSource;
use crate::PROFILE_IMAGE_FILE_NAME;

pub const DEFAULT_CROP_WIDTH: u32 = 400;
pub const DEFAULT_CROP_HEIGHT: u32 = 400;
pub const MAX_CROP_DIMENSION: u32 = 2048;
pub const DEFAULT_JPEG_QUALITY: u8 = 80;
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// Device image picker and camera, cropped to the profile aspect.
#[derive(crux_core::macros::Capability)]
pub struct ImageSource<Ev> {
    context: CapabilityContext<ImageSourceOperation, Ev>,
}

impl<Ev> ImageSource<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<ImageSourceOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn pick_from_gallery<F>(&self, options: CaptureOptions, callback: F)
    where
        F: FnOnce(ImageSourceResult) -> Ev + Send + Sync + 'static,
    {
        let options = options.validated();
        self.request(ImageSourceOperation::PickFromGallery { options }, callback);
    }

    pub fn capture_from_camera<F>(&self, options: CaptureOptions, callback: F)
    where
        F: FnOnce(ImageSourceResult) -> Ev + Send + Sync + 'static,
    {
        let options = options.validated();
        self.request(ImageSourceOperation::CaptureFromCamera { options }, callback);
    }

    pub fn choose<F>(&self, source: PictureSource, options: CaptureOptions, callback: F)
    where
        F: FnOnce(ImageSourceResult) -> Ev + Send + Sync + 'static,
    {
        match source {
            PictureSource::Gallery => self.pick_from_gallery(options, callback),
            PictureSource::Camera => self.capture_from_camera(options, callback),
        }
    }

    fn request<F>(&self, operation: ImageSourceOperation, callback: F)
    where
        F: FnOnce(ImageSourceResult) -> Ev + Send + Sync + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = ctx.request_from_shell(operation).await;
            ctx.update_app(callback(result));
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ImageSourceOperation {
    PickFromGallery { options: CaptureOptions },
    CaptureFromCamera { options: CaptureOptions },
}

impl ImageSourceOperation {
    pub fn options(&self) -> &CaptureOptions {
        match self {
            Self::PickFromGallery { options } | Self::CaptureFromCamera { options } => options,
        }
    }

    pub fn source(&self) -> PictureSource {
        match self {
            Self::PickFromGallery { .. } => PictureSource::Gallery,
            Self::CaptureFromCamera { .. } => PictureSource::Camera,
        }
    }
}

impl Operation for ImageSourceOperation {
    type Output = ImageSourceResult;
}

/// Fixed crop configuration sent with every pick/capture request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaptureOptions {
    pub width: u32,
    pub height: u32,
    pub cropping: bool,
    pub circular_overlay: bool,
    pub quality: u8,
    pub mime_type: String,
    pub file_name: String,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_CROP_WIDTH,
            height: DEFAULT_CROP_HEIGHT,
            cropping: true,
            circular_overlay: true,
            quality: DEFAULT_JPEG_QUALITY,
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            file_name: PROFILE_IMAGE_FILE_NAME.to_string(),
        }
    }
}

impl CaptureOptions {
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width.clamp(1, MAX_CROP_DIMENSION);
        self.height = height.clamp(1, MAX_CROP_DIMENSION);
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.min(100);
        self
    }

    pub fn without_cropping(mut self) -> Self {
        self.cropping = false;
        self.circular_overlay = false;
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn validated(mut self) -> Self {
        self.width = self.width.clamp(1, MAX_CROP_DIMENSION);
        self.height = self.height.clamp(1, MAX_CROP_DIMENSION);
        self.quality = self.quality.min(100);
        if !self.cropping {
            self.circular_overlay = false;
        }
        if !self.mime_type.starts_with("image/") {
            self.mime_type = DEFAULT_MIME_TYPE.to_string();
        }
        if self.file_name.trim().is_empty() {
            self.file_name = PROFILE_IMAGE_FILE_NAME.to_string();
        }
        self
    }
}

/// A locally available image ready for upload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub uri: String,
    pub mime_type: String,
    pub file_name: String,
}

impl ImageDescriptor {
    pub fn new(
        uri: impl Into<String>,
        mime_type: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            mime_type: mime_type.into(),
            file_name: file_name.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ImageSourceError> {
        Url::parse(&self.uri).map_err(|e| ImageSourceError::InvalidImage {
            reason: format!("unreadable image location: {e}"),
        })?;

        if !self.mime_type.starts_with("image/") {
            return Err(ImageSourceError::InvalidImage {
                reason: format!("unsupported content type {}", self.mime_type),
            });
        }

        if self.file_name.trim().is_empty() {
            return Err(ImageSourceError::InvalidImage {
                reason: "image has no file name".to_string(),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum ImageSourceError {
    #[error("picture selection cancelled")]
    Cancelled,

    #[error("permission to use the camera or photo library was denied")]
    PermissionDenied,

    #[error("the {device} is not available on this device")]
    Unavailable { device: PictureSource },

    #[error("could not get the picture: {reason}")]
    CaptureFailed { reason: String },

    #[error("the selected picture can't be used: {reason}")]
    InvalidImage { reason: String },
}

impl ImageSourceError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ImageSourceError::Cancelled)
    }
}

pub type ImageSourceResult = Result<ImageDescriptor, ImageSourceError>;
