//! Frame-plus-overlay rasterization.

use super::captured::CapturedImage;
use super::layout::fit_contain;
use crate::capture::{VideoFrame, CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::frames::{AssetError, AssetStore, FrameAsset};
use image::imageops::{self, FilterType};
use image::RgbaImage;
use std::io::Cursor;
use thiserror::Error;

/// Reasons a capture did not produce an image.
#[derive(Debug, Clone, Error)]
pub enum CompositingError {
    #[error("invalid canvas size {width}x{height}")]
    InvalidCanvas { width: u32, height: u32 },
    #[error("camera stream not ready ({width}x{height} source)")]
    SourceNotReady { width: u32, height: u32 },
    #[error("frame buffer does not match its dimensions")]
    MalformedFrame,
    #[error("failed to load overlay: {0}")]
    OverlayLoad(#[from] AssetError),
    #[error("failed to encode capture: {0}")]
    Encode(String),
    #[error("unknown frame: {0}")]
    UnknownFrame(String),
}

/// Composites camera frames onto a fixed-size canvas.
#[derive(Debug, Clone)]
pub struct Compositor {
    width: u32,
    height: u32,
    filter: FilterType,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(CANVAS_WIDTH, CANVAS_HEIGHT)
    }
}

impl Compositor {
    /// Creates a compositor for a `width`×`height` canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            filter: FilterType::Triangle,
        }
    }

    /// Canvas size.
    pub fn canvas(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Composites `frame` with an already loaded overlay and encodes PNG.
    pub fn composite(
        &self,
        frame: &VideoFrame,
        overlay: &RgbaImage,
    ) -> Result<CapturedImage, CompositingError> {
        let mut canvas = self.draw_frame(frame)?;
        self.draw_overlay(&mut canvas, overlay);
        self.encode(&canvas)
    }

    /// Draws the frame, then loads the overlay from `store` and finishes the
    /// composition. An overlay that fails to load yields no image.
    pub fn composite_from_store<S: AssetStore + ?Sized>(
        &self,
        frame: &VideoFrame,
        store: &S,
        asset: &FrameAsset,
    ) -> Result<CapturedImage, CompositingError> {
        let mut canvas = self.draw_frame(frame)?;
        let overlay = store.load_image(&asset.source).map_err(|e| {
            tracing::warn!(frame = %asset.id, error = %e, "Overlay failed to load");
            e
        })?;
        self.draw_overlay(&mut canvas, &overlay);
        self.encode(&canvas)
    }

    /// Transparent canvas with the frame placed "contain"-style.
    pub fn draw_frame(&self, frame: &VideoFrame) -> Result<RgbaImage, CompositingError> {
        if self.width == 0 || self.height == 0 {
            return Err(CompositingError::InvalidCanvas {
                width: self.width,
                height: self.height,
            });
        }
        let placement = fit_contain(frame.width(), frame.height(), self.width, self.height)
            .ok_or(CompositingError::SourceNotReady {
                width: frame.width(),
                height: frame.height(),
            })?;
        let source = frame.to_image().ok_or(CompositingError::MalformedFrame)?;

        let (x, y, width, height) = placement.pixel_rect();
        let scaled = if source.dimensions() == (width, height) {
            source
        } else {
            imageops::resize(&source, width, height, self.filter)
        };

        let mut canvas = RgbaImage::new(self.width, self.height);
        draw_over(&mut canvas, &scaled, x, y);

        tracing::debug!(
            source_width = frame.width(),
            source_height = frame.height(),
            x,
            y,
            width,
            height,
            "Drew camera frame"
        );
        Ok(canvas)
    }

    /// Stretches the overlay over the whole canvas.
    fn draw_overlay(&self, canvas: &mut RgbaImage, overlay: &RgbaImage) {
        if overlay.dimensions() == (self.width, self.height) {
            draw_over(canvas, overlay, 0, 0);
        } else {
            let stretched = imageops::resize(overlay, self.width, self.height, self.filter);
            draw_over(canvas, &stretched, 0, 0);
        }
    }

    fn encode(&self, canvas: &RgbaImage) -> Result<CapturedImage, CompositingError> {
        let mut png = Vec::new();
        canvas
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| CompositingError::Encode(e.to_string()))?;
        Ok(CapturedImage::new(png, self.width, self.height))
    }
}

/// Draws `top` onto `canvas` at `(x, y)` with straight-alpha source-over,
/// clipping to the canvas.
fn draw_over(canvas: &mut RgbaImage, top: &RgbaImage, x: i64, y: i64) {
    let (cw, ch) = (i64::from(canvas.width()), i64::from(canvas.height()));
    for (tx, ty, src) in top.enumerate_pixels() {
        let (dx, dy) = (x + i64::from(tx), y + i64::from(ty));
        if dx < 0 || dy < 0 || dx >= cw || dy >= ch {
            continue;
        }
        let dst = canvas.get_pixel_mut(dx as u32, dy as u32);
        dst.0 = over(dst.0, src.0);
    }
}

/// Source-over for straight (non-premultiplied) RGBA8.
fn over(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let sa = u32::from(src[3]);
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }

    let da = u32::from(dst[3]);
    // Alpha scaled by 255.
    let out_a = sa * 255 + da * (255 - sa);
    if out_a == 0 {
        return [0, 0, 0, 0];
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        let c = u32::from(src[i]) * sa * 255 + u32::from(dst[i]) * da * (255 - sa);
        out[i] = ((c + out_a / 2) / out_a).min(255) as u8;
    }
    out[3] = ((out_a + 127) / 255).min(255) as u8;
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::MemoryAssetStore;
    use image::Rgba;

    fn solid_frame(width: u32, height: u32, rgba: [u8; 4]) -> VideoFrame {
        let pixels = rgba.repeat((width * height) as usize);
        VideoFrame::new(pixels, width, height, 1)
    }

    fn decode(captured: &CapturedImage) -> RgbaImage {
        image::load_from_memory(captured.png_bytes()).unwrap().to_rgba8()
    }

    /// Resampling may shift a channel by one step.
    fn assert_close(actual: &Rgba<u8>, expected: [u8; 4]) {
        for (a, e) in actual.0.iter().zip(expected) {
            assert!(a.abs_diff(e) <= 1, "{:?} != {:?}", actual.0, expected);
        }
    }

    #[test]
    fn test_over_blending() {
        assert_eq!(over([1, 2, 3, 255], [9, 9, 9, 0]), [1, 2, 3, 255]);
        assert_eq!(over([1, 2, 3, 255], [9, 8, 7, 255]), [9, 8, 7, 255]);
        assert_eq!(over([0, 0, 0, 0], [200, 100, 50, 128]), [200, 100, 50, 128]);
        assert_eq!(over([0, 0, 0, 255], [255, 255, 255, 128]), [128, 128, 128, 255]);
    }

    #[test]
    fn test_pillarbox_margins_stay_transparent() {
        let compositor = Compositor::new(192, 108);
        let frame = solid_frame(64, 48, [0, 0, 255, 255]);
        let overlay = RgbaImage::new(192, 108);

        let out = decode(&compositor.composite(&frame, &overlay).unwrap());
        assert_eq!(out.dimensions(), (192, 108));

        // 4:3 into 16:9: width 144, offset 24.
        assert_eq!(out.get_pixel(0, 54)[3], 0);
        assert_eq!(out.get_pixel(23, 54)[3], 0);
        assert_close(out.get_pixel(96, 54), [0, 0, 255, 255]);
        assert_eq!(out.get_pixel(168, 54)[3], 0);
    }

    #[test]
    fn test_overlay_stretched_over_canvas() {
        let compositor = Compositor::new(160, 90);
        let frame = solid_frame(160, 90, [0, 0, 0, 255]);
        let overlay = RgbaImage::from_pixel(16, 9, Rgba([255, 0, 0, 255]));

        let out = decode(&compositor.composite(&frame, &overlay).unwrap());
        assert_close(out.get_pixel(0, 0), [255, 0, 0, 255]);
        assert_close(out.get_pixel(159, 89), [255, 0, 0, 255]);
    }

    #[test]
    fn test_overlay_covers_margins() {
        let compositor = Compositor::new(192, 108);
        let frame = solid_frame(48, 48, [0, 255, 0, 255]);
        let overlay = RgbaImage::from_pixel(192, 108, Rgba([10, 20, 30, 255]));

        let out = decode(&compositor.composite(&frame, &overlay).unwrap());
        assert_eq!(out.get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_composite_is_deterministic() {
        let compositor = Compositor::new(192, 108);
        let frame = VideoFrame::new(
            (0..64u32 * 48 * 4).map(|i| (i % 251) as u8).collect(),
            64,
            48,
            1,
        );
        let overlay = RgbaImage::from_fn(192, 108, |x, y| {
            Rgba([x as u8, y as u8, 0, if x < 20 { 200 } else { 0 }])
        });

        let a = compositor.composite(&frame, &overlay).unwrap();
        let b = compositor.composite(&frame, &overlay).unwrap();
        assert_eq!(a.png_bytes(), b.png_bytes());
    }

    #[test]
    fn test_zero_dimension_source_rejected() {
        let compositor = Compositor::default();
        let frame = VideoFrame::new(Vec::new(), 0, 0, 1);
        let overlay = RgbaImage::new(1920, 1080);

        assert!(matches!(
            compositor.composite(&frame, &overlay),
            Err(CompositingError::SourceNotReady { width: 0, height: 0 })
        ));
    }

    #[test]
    fn test_zero_canvas_rejected() {
        let compositor = Compositor::new(0, 108);
        let frame = solid_frame(64, 48, [0, 0, 255, 255]);
        assert!(matches!(
            compositor.draw_frame(&frame),
            Err(CompositingError::InvalidCanvas { width: 0, height: 108 })
        ));
    }

    #[test]
    fn test_malformed_frame_rejected() {
        let compositor = Compositor::new(16, 9);
        let frame = VideoFrame::new(vec![0u8; 10], 4, 4, 1);
        assert!(matches!(
            compositor.draw_frame(&frame),
            Err(CompositingError::MalformedFrame)
        ));
    }

    #[test]
    fn test_missing_overlay_yields_no_image() {
        let compositor = Compositor::new(32, 18);
        let frame = solid_frame(32, 18, [1, 2, 3, 255]);
        let store = MemoryAssetStore::new();

        let result = compositor.composite_from_store(&frame, &store, &FrameAsset::new("kana", "kana-frame.png"));
        assert!(matches!(result, Err(CompositingError::OverlayLoad(_))));
    }

    #[test]
    fn test_full_size_canvas() {
        let compositor = Compositor::default();
        let frame = solid_frame(1280, 720, [200, 100, 50, 255]);
        let overlay = RgbaImage::new(1920, 1080);

        let captured = compositor.composite(&frame, &overlay).unwrap();
        assert_eq!((captured.width(), captured.height()), (1920, 1080));

        let out = decode(&captured);
        assert_eq!(out.dimensions(), (1920, 1080));
        assert_close(out.get_pixel(0, 0), [200, 100, 50, 255]);
        assert_close(out.get_pixel(1919, 1079), [200, 100, 50, 255]);
    }
}
