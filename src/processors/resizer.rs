// imgconv/src/processors/resizer.rs
use crate::core::{ImageConvError, Interpolator, ResizeMode, ResizePolicy, Result};
use image::{imageops::FilterType, DynamicImage};

/// Pixel rectangle. Resolution only touches `width` and `height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    fn with_size(self, width: u32, height: u32) -> Self {
        Self { width, height, ..self }
    }
}

/// `value * numerator / denominator`, truncated.
fn scale_axis(value: u32, numerator: u32, denominator: u32) -> u32 {
    let scaled = u64::from(value) * u64::from(numerator) / u64::from(denominator);
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

/// Maps a source rectangle to the destination rectangle for `policy`.
///
/// Proportional modes use truncating integer division, so a 100x33 source
/// scaled to height 10 comes out 30 pixels wide, not 30.3 rounded.
pub fn resolve_dimensions(src: Rect, policy: &ResizePolicy) -> Rect {
    let (w, h) = (src.width, src.height);

    match policy.mode {
        ResizeMode::Absolute { width, height } => {
            src.with_size(width.unwrap_or(w), height.unwrap_or(h))
        }
        _ if w == 0 || h == 0 => src,
        ResizeMode::ScaleToHeight(target) => src.with_size(scale_axis(w, target, h), target),
        ResizeMode::ScaleToWidth(target) => src.with_size(target, scale_axis(h, target, w)),
        ResizeMode::MaxSide(n) => {
            let long = w.max(h);
            if long <= n && !policy.allow_upsize {
                return src;
            }
            if h > w {
                src.with_size(scale_axis(w, n, h), n)
            } else {
                src.with_size(n, scale_axis(h, n, w))
            }
        }
        ResizeMode::MinSide(n) => {
            let short = w.min(h);
            if short >= n && !policy.allow_upsize {
                return src;
            }
            if h < w {
                src.with_size(scale_axis(w, n, h), n)
            } else {
                src.with_size(n, scale_axis(h, n, w))
            }
        }
        ResizeMode::None => src,
    }
}

pub struct Resizer {
    policy: ResizePolicy,
}

impl Resizer {
    pub fn new(policy: ResizePolicy) -> Self {
        Self { policy }
    }

    pub fn is_active(&self) -> bool {
        self.policy.is_active()
    }

    /// Resamples `image` to the size the policy resolves to.
    pub fn resize(&self, image: DynamicImage) -> Result<DynamicImage> {
        let src = Rect::from_size(image.width(), image.height());
        let dst = resolve_dimensions(src, &self.policy);

        if dst.width == 0 || dst.height == 0 {
            return Err(ImageConvError::Encode(format!(
                "resizing {}x{} gives an empty {}x{} image",
                src.width, src.height, dst.width, dst.height
            )));
        }

        if dst == src {
            log::debug!("Image dimensions unchanged, skipping resize");
            return Ok(image);
        }

        log::debug!(
            "Resizing image from {}x{} to {}x{}",
            src.width,
            src.height,
            dst.width,
            dst.height
        );

        Ok(image.resize_exact(dst.width, dst.height, self.filter_type()))
    }

    fn filter_type(&self) -> FilterType {
        match self.policy.interpolator {
            Interpolator::NearestNeighbor => FilterType::Nearest,
            Interpolator::ApproxBiLinear => FilterType::Triangle,
            Interpolator::CatmullRom => FilterType::CatmullRom,
        }
    }
}
