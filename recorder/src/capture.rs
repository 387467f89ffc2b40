//! Screen sampling.
//!
//! [`ScreenSource::grab`] is the only thing that talks to the OS; scaling and
//! cropping are done here on the returned raster.

use image::imageops::{self, FilterType};
use image::RgbImage;
use slidewatch_common::frame::Rectangle;
use xcap::Monitor;

/// How to resize a grabbed screen before cropping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scale {
    /// Uniform scaling of both axes.
    Factor(f64),
    /// Resize to exactly this size, possibly changing the aspect ratio.
    Exact { width: u32, height: u32 },
}

impl Scale {
    /// Per-axis factors this scale applies to a `source`-sized raster, as
    /// `(x, y)`.
    pub fn axis_factors(&self, source: (u32, u32)) -> (f64, f64) {
        match *self {
            Scale::Factor(f) => (f, f),
            Scale::Exact { width, height } => (
                width as f64 / source.0.max(1) as f64,
                height as f64 / source.1.max(1) as f64,
            ),
        }
    }
}

/// Anything that can produce a full-resolution raster of the screen.
pub trait ScreenSource {
    fn grab(&mut self) -> Result<RgbImage, CaptureError>;

    /// Grab the screen, then scale it, then crop it.
    ///
    /// The crop is interpreted in the coordinates of the scaled raster and
    /// clamped to its bounds; a crop that ends up empty is an error.
    fn capture(
        &mut self,
        crop: Option<Rectangle>,
        scale: Option<Scale>,
    ) -> Result<RgbImage, CaptureError> {
        let mut image = self.grab()?;
        if let Some(scale) = scale {
            image = rescale(&image, scale)?;
        }
        if let Some(crop) = crop {
            image = crop_to(&image, crop)?;
        }
        Ok(image)
    }
}

/// Resize `image` according to `scale`.
pub fn rescale(image: &RgbImage, scale: Scale) -> Result<RgbImage, CaptureError> {
    let (width, height) = match scale {
        Scale::Factor(f) => {
            if !(f.is_finite() && f > 0.0) {
                return Err(CaptureError::InvalidScale(format!("factor {f}")));
            }
            (
                ((image.width() as f64 * f).round() as u32).max(1),
                ((image.height() as f64 * f).round() as u32).max(1),
            )
        }
        Scale::Exact { width, height } => {
            if width == 0 || height == 0 {
                return Err(CaptureError::InvalidScale(format!("size {width}x{height}")));
            }
            (width, height)
        }
    };
    if (width, height) == image.dimensions() {
        return Ok(image.clone());
    }
    Ok(imageops::resize(image, width, height, FilterType::Triangle))
}

/// Copy the part of `image` covered by `rect`, clamped to the image bounds.
pub fn crop_to(image: &RgbImage, rect: Rectangle) -> Result<RgbImage, CaptureError> {
    let (img_width, img_height) = image.dimensions();
    let clamped = rect.clamp_to(img_width, img_height);
    if clamped.is_empty() {
        return Err(CaptureError::EmptyCrop {
            requested: rect,
            image_size: (img_width, img_height),
        });
    }
    Ok(imageops::crop_imm(
        image,
        clamped.x_start(),
        clamped.y_start(),
        clamped.width(),
        clamped.height(),
    )
    .to_image())
}

/// The primary monitor, captured with `xcap`.
pub struct XcapScreen {
    monitor: Monitor,
}

impl XcapScreen {
    pub fn primary() -> Result<Self, CaptureError> {
        let monitors =
            Monitor::all().map_err(|e| CaptureError::MonitorEnumeration(e.to_string()))?;

        let mut fallback = None;
        for monitor in monitors {
            if monitor.is_primary().unwrap_or(false) {
                return Ok(Self { monitor });
            }
            fallback.get_or_insert(monitor);
        }
        // No monitor reports as primary: use the first one.
        fallback
            .map(|monitor| Self { monitor })
            .ok_or(CaptureError::NoPrimaryMonitor)
    }
}

impl ScreenSource for XcapScreen {
    fn grab(&mut self) -> Result<RgbImage, CaptureError> {
        let shot = self
            .monitor
            .capture_image()
            .map_err(|e| CaptureError::CaptureFailed(e.to_string()))?;

        let (width, height) = (shot.width(), shot.height());
        let rgba = image::RgbaImage::from_raw(width, height, shot.into_raw())
            .ok_or_else(|| CaptureError::CaptureFailed("short pixel buffer".into()))?;
        Ok(image::DynamicImage::ImageRgba8(rgba).to_rgb8())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("failed to enumerate monitors: {0}")]
    MonitorEnumeration(String),
    #[error("no monitor found")]
    NoPrimaryMonitor,
    #[error("screen capture failed: {0}")]
    CaptureFailed(String),
    #[error("unsupported scale: {0}")]
    InvalidScale(String),
    #[error(
        "crop {requested} does not overlap the {}x{} capture",
        image_size.0, image_size.1
    )]
    EmptyCrop {
        requested: Rectangle,
        image_size: (u32, u32),
    },
}
