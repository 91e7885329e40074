pub mod active;
pub mod clock;
pub mod config;
pub mod key_cache;
pub mod keyboard;
pub mod notes;
pub mod palette;
pub mod pixel_font;
pub mod raster;
pub mod renderer;
pub mod song;
pub mod surface;
pub mod viewport;

#[cfg(feature = "desktop")]
pub mod desktop_frontend;

pub use config::{ConfigRepository, RenderConfig};
pub use notes::{Note, NoteSequence};
pub use renderer::{FrameReport, PianoRoll};
pub use surface::Surface2d;
