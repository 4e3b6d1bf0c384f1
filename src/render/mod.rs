//! Frame selection and draw planning for the sequence canvas.

pub mod canvas;
pub mod mapper;
pub mod overlay;

pub use canvas::{
    fit_rect, surface_size, CanvasRenderer, DrawOp, DrawRect, ViewportPolicy, DPR_CAP,
};
pub use mapper::map_to_frame;
pub use overlay::{sample_sections, OverlayState, SECTION_COUNT};
