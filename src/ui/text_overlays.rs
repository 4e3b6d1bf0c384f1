// Scroll-keyed storytelling overlays.
// Four sections (intro, feature, detail, call-to-action) whose opacity and
// offsets come from the keyframe bands sampled against raw scroll progress.
// Raw progress (not the smoothed value) keeps text snapping in step with
// the scrollbar rather than trailing the spring.

use gtk4::prelude::*;
use gtk4::{Align, Box as GtkBox, Button, Fixed, Label, Orientation};
use std::rc::Rc;

use crate::models::{Product, TextAlignment};
use crate::render::{sample_sections, SECTION_COUNT};

const EDGE_MARGIN: f64 = 48.0;

struct Section {
    root: GtkBox,
    heading: Label,
    body: Label,
}

impl Section {
    fn new(css_class: &str) -> Self {
        let root = GtkBox::new(Orientation::Vertical, 4);
        root.add_css_class("overlay-section");
        root.add_css_class(css_class);
        root.set_opacity(0.0);

        let heading = Label::new(None);
        heading.add_css_class("overlay-heading");
        heading.set_halign(Align::Start);

        let body = Label::new(None);
        body.add_css_class("overlay-body");
        body.set_halign(Align::Start);
        body.set_wrap(true);
        body.set_max_width_chars(36);

        root.append(&heading);
        root.append(&body);
        Self {
            root,
            heading,
            body,
        }
    }
}

pub struct TextOverlays {
    root: Fixed,
    sections: Vec<Section>,
    cta_button: Button,
}

impl TextOverlays {
    pub fn new() -> Self {
        let root = Fixed::new();
        root.set_hexpand(true);
        root.set_vexpand(true);
        // The canvas underneath must keep receiving scroll events.
        root.set_can_target(false);

        let mut sections = Vec::with_capacity(SECTION_COUNT);
        for class in ["overlay-intro", "overlay-feature", "overlay-detail", "overlay-cta"] {
            let section = Section::new(class);
            root.put(&section.root, 0.0, 0.0);
            sections.push(section);
        }

        let cta_button = Button::with_label("[ADD TO CART]");
        cta_button.add_css_class("btn-primary");
        cta_button.set_halign(Align::Start);
        if let Some(cta) = sections.last() {
            cta.root.append(&cta_button);
        }

        Self {
            root,
            sections,
            cta_button,
        }
    }

    pub fn widget(&self) -> &Fixed {
        &self.root
    }

    /// Fill section copy from the product descriptor.
    pub fn set_product(&self, product: &'static Product) {
        let [intro, feature, detail, cta] = self.sections.as_slice() else {
            return;
        };

        intro
            .heading
            .set_text(&format!("{} {}", product.hero_name, product.model_name));
        intro.body.set_text(product.tagline);

        if let Some(phase) = product.phases.first() {
            feature.heading.set_text(phase.title);
            feature.body.set_text(phase.description);
        } else {
            feature.heading.set_text(product.sub_headline);
            feature.body.set_text("");
        }

        if let Some(phase) = product.phases.get(1) {
            detail.heading.set_text(phase.title);
            detail.body.set_text(phase.description);
        } else {
            let specs: Vec<String> = product
                .specs
                .iter()
                .map(|s| format!("{}: {}", s.label, s.value))
                .collect();
            detail.heading.set_text("SPECIFICATIONS");
            detail.body.set_text(&specs.join("\n"));
        }

        cta.heading.set_text(product.name);
        cta.body.set_text(&format!("${}", product.price));

        let align = product.visuals.text_alignment;
        for section in &self.sections {
            section.root.set_halign(match align {
                TextAlignment::Left => Align::Start,
                TextAlignment::Right => Align::End,
            });
        }
    }

    /// Reposition and fade the sections for the given raw scroll progress.
    pub fn update(&self, progress: f64, alignment: TextAlignment) {
        let width = f64::from(self.root.width());
        let height = f64::from(self.root.height());
        if width <= 0.0 || height <= 0.0 {
            return;
        }

        let states = sample_sections(progress);
        for (section, state) in self.sections.iter().zip(states.iter()) {
            section.root.set_opacity(state.opacity);
            // Fully faded sections must not occlude pointer targets.
            section.root.set_visible(state.opacity > 0.0);

            let base_x = match alignment {
                TextAlignment::Left => EDGE_MARGIN,
                TextAlignment::Right => {
                    (width - f64::from(section.root.width()) - EDGE_MARGIN).max(EDGE_MARGIN)
                }
            };
            let base_y = height * 0.5 - f64::from(section.root.height()) * 0.5;
            self.root
                .move_(&section.root, base_x + state.x, base_y + state.y);
        }
    }

    pub fn connect_add_to_cart<F: Fn() + 'static>(&self, f: F) {
        let f = Rc::new(f);
        self.cta_button.connect_clicked(move |_| f());
    }
}

impl Default for TextOverlays {
    fn default() -> Self {
        Self::new()
    }
}
