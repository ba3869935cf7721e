//! "Contain" placement of a source frame on a fixed canvas.

/// Where a scaled source frame lands on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Placement {
    /// Whole-pixel rectangle `(x, y, width, height)` for drawing.
    pub fn pixel_rect(&self) -> (i64, i64, u32, u32) {
        (
            self.x.round() as i64,
            self.y.round() as i64,
            self.width.round().max(1.0) as u32,
            self.height.round().max(1.0) as u32,
        )
    }
}

/// Fits a `source_width`×`source_height` frame inside the canvas without
/// cropping or stretching, centred along the axis with spare room.
///
/// Returns `None` for a zero-area source or canvas.
pub fn fit_contain(
    source_width: u32,
    source_height: u32,
    canvas_width: u32,
    canvas_height: u32,
) -> Option<Placement> {
    if source_width == 0 || source_height == 0 || canvas_width == 0 || canvas_height == 0 {
        return None;
    }

    let (sw, sh) = (f64::from(source_width), f64::from(source_height));
    let (cw, ch) = (f64::from(canvas_width), f64::from(canvas_height));

    let placement = if sw / sh > cw / ch {
        // Wider than the canvas: full width, letterboxed.
        let height = cw * (sh / sw);
        Placement {
            x: 0.0,
            y: (ch - height) / 2.0,
            width: cw,
            height,
        }
    } else {
        // Pillarboxed.
        let width = ch * (sw / sh);
        Placement {
            x: (cw - width) / 2.0,
            y: 0.0,
            width,
            height: ch,
        }
    };

    tracing::trace!(
        source_width,
        source_height,
        x = placement.x,
        y = placement.y,
        width = placement.width,
        height = placement.height,
        "Computed contain placement"
    );
    Some(placement)
}
