use std::fmt;

/// Which side of the viewport the hero text anchors to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlignment {
    Left,
    Right,
}

/// Per-product art-direction adjustments applied on top of the letterbox fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visuals {
    /// Zoom multiplier applied after the contain-fit (1.0 = default).
    pub scale: f64,
    /// Vertical bias in [-1, 1], relative to canvas height.
    pub y_offset: f64,
    pub text_alignment: TextAlignment,
}

impl Default for Visuals {
    fn default() -> Self {
        Self {
            scale: 1.0,
            y_offset: 0.0,
            text_alignment: TextAlignment::Left,
        }
    }
}

/// One spec line shown in the overlay panels.
#[derive(Debug, Clone)]
pub struct ProductSpec {
    pub label: &'static str,
    pub value: &'static str,
}

/// A storytelling phase keyed to a scroll band of the sequence.
#[derive(Debug, Clone)]
pub struct ProductPhase {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub description: &'static str,
}

/// Immutable product descriptor consumed by the sequence engine.
///
/// Owned by the surrounding catalog; the core only reads it. `frame_count`
/// is expected to match the actual asset count under `folder` — a mismatch
/// is tolerated at runtime by treating missing indices as failed frames.
///
/// All fields are shared references or small scalars, so descriptors copy
/// by value out of the static catalog.
#[derive(Debug, Clone, Copy)]
pub struct Product {
    pub id: &'static str,
    pub name: &'static str,
    /// Brand line, e.g. "UMBRA" (model selector and hero overlay).
    pub hero_name: &'static str,
    /// Model line, e.g. "ONE" (hero overlay).
    pub model_name: &'static str,
    pub tagline: &'static str,
    pub sub_headline: &'static str,
    /// Price in whole currency units.
    pub price: u32,
    /// Frame asset base path; frames live at `{folder}/{index}.{extension}`.
    pub folder: &'static str,
    pub file_extension: &'static str,
    /// Total frames in the sequence. Always positive for catalog entries.
    pub frame_count: usize,
    /// Accent color as a CSS hex string, consumed by the overlay styling.
    pub accent_color: &'static str,
    pub specs: &'static [ProductSpec],
    pub phases: &'static [ProductPhase],
    pub visuals: Visuals,
}

impl Product {
    /// Asset path for a single frame, zero-based contiguous indexing.
    pub fn frame_path(&self, index: usize) -> String {
        format!("{}/{}.{}", self.folder, index, self.file_extension)
    }

    /// Pre-encoded fallback video used on constrained viewports.
    pub fn video_path(&self) -> String {
        format!("{}/sequence.mp4", self.folder)
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} frames)", self.name, self.frame_count)
    }
}

/// Payload handed to the cart collaborator when the user adds the active
/// product. The receiving store is external; the engine never reads it back.
#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    pub id: String,
    pub name: String,
    pub price: u32,
    pub image: String,
    pub quantity: u32,
    pub edition: String,
}

impl CartItem {
    /// Single unit of a product in its given edition, using frame 0 as the
    /// cart thumbnail.
    pub fn from_product(product: &Product, edition: &str) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.to_string(),
            price: product.price,
            image: product.frame_path(0),
            quantity: 1,
            edition: edition.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data;

    #[test]
    fn frame_paths_are_zero_based() {
        let product = &data::catalog()[0];
        assert_eq!(
            product.frame_path(0),
            format!("{}/0.{}", product.folder, product.file_extension)
        );
        assert_eq!(
            product.frame_path(product.frame_count - 1),
            format!(
                "{}/{}.{}",
                product.folder,
                product.frame_count - 1,
                product.file_extension
            )
        );
    }

    #[test]
    fn cart_item_carries_first_frame_as_image() {
        let product = &data::catalog()[0];
        let item = CartItem::from_product(product, "PRIME");
        assert_eq!(item.id, product.id);
        assert_eq!(item.quantity, 1);
        assert_eq!(item.image, product.frame_path(0));
        assert_eq!(item.edition, "PRIME");
    }
}
