//! Frame compositing.
//!
//! Maps a camera frame of any aspect ratio onto a fixed canvas without
//! cropping (transparent letterbox or pillarbox margins), stretches the
//! selected overlay across the full canvas, and encodes the result as PNG.

mod captured;
mod layout;
mod render;

pub use captured::{CapturedImage, DEFAULT_FILE_NAME};
pub use layout::{fit_contain, Placement};
pub use render::{CompositingError, Compositor};
