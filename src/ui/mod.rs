//! Card interface, pile layout and rendering

pub mod card;
pub mod layout;
pub mod renderer;

pub use card::{Card, CardCall, RecordingCard};
pub use layout::{CardPlacement, LayoutMetrics, PileLayout};
pub use renderer::{PileRenderer, RendererError};
