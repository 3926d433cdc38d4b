//! Collaborators that produce artifacts and their text.
//!
//! - [`ScreenCapture`]: returns one screen image.
//! - [`OcrEngine`]: returns the raw text of an image.
//! - [`Clock`]: timestamps captures.
//!
//! The shipped implementations drive external tools (`scrot`, `tesseract`, ...)
//! through `tokio::process`, bounded by a timeout.

mod command;

pub mod clock;
#[cfg(test)]
pub(crate) mod fakes;
pub mod ocr;
pub mod screen_capture;
pub mod types;

pub use clock::{Clock, SteppingClock, SystemClock};
pub use command::PATH_PLACEHOLDER;
pub use ocr::{normalize_text, CommandOcr, OcrEngine};
pub use screen_capture::{CommandCapture, ScreenCapture};
pub use types::CapturedImage;
