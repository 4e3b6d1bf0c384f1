mod loading_overlay;
mod sequence_view;
mod text_overlays;
mod texture_cache;
mod window;

pub use window::MainWindow;
