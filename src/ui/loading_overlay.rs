// Loading indicator shown over the canvas until the critical frames settle.
// Terminal aesthetic: bracketed title, percent readout, thin progress bar.
// Also hosts the "signal lost" card for sequences that settled with zero
// loaded frames.

use gtk4::prelude::*;
use gtk4::{Align, Box as GtkBox, Label, Orientation, ProgressBar};

use crate::models::Product;

pub struct LoadingOverlay {
    root: GtkBox,
    title: Label,
    percent: Label,
    bar: ProgressBar,
    status: Label,
}

impl LoadingOverlay {
    pub fn new() -> Self {
        let root = GtkBox::new(Orientation::Vertical, 8);
        root.set_halign(Align::Center);
        root.set_valign(Align::Center);
        root.add_css_class("loading-overlay");

        let title = Label::new(Some("> INITIALIZING"));
        title.add_css_class("loading-title");
        title.set_halign(Align::Center);

        let percent = Label::new(Some("0%"));
        percent.add_css_class("loading-percent");
        percent.set_halign(Align::Center);

        let bar = ProgressBar::new();
        bar.set_width_request(240);
        bar.add_css_class("loading-bar");

        let status = Label::new(None);
        status.add_css_class("loading-status");
        status.set_halign(Align::Center);
        status.set_visible(false);

        root.append(&title);
        root.append(&percent);
        root.append(&bar);
        root.append(&status);

        Self {
            root,
            title,
            percent,
            bar,
            status,
        }
    }

    pub fn widget(&self) -> &GtkBox {
        &self.root
    }

    pub fn set_product(&self, product: &Product) {
        self.title
            .set_text(&format!("> LOADING {}", product.hero_name));
        self.set_progress(0);
        self.set_unavailable(false);
        self.root.set_visible(true);
    }

    pub fn set_progress(&self, percent: u8) {
        let percent = percent.min(100);
        self.percent.set_text(&format!("{}%", percent));
        self.bar.set_fraction(f64::from(percent) / 100.0);
    }

    /// Hide once playback is ready. Stays hidden until the next product.
    pub fn set_ready(&self) {
        self.root.set_visible(false);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        if unavailable {
            self.status.set_text("> SIGNAL LOST - SEQUENCE UNAVAILABLE");
            self.status.set_visible(true);
            self.percent.set_visible(false);
            self.bar.set_visible(false);
            self.root.set_visible(true);
        } else {
            self.status.set_visible(false);
            self.percent.set_visible(true);
            self.bar.set_visible(true);
        }
    }
}

impl Default for LoadingOverlay {
    fn default() -> Self {
        Self::new()
    }
}
