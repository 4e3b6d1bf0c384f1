// Main window for the vitrine product showcase.
// Composes the sequence view, storytelling overlays, and loading card over
// a dark terminal-styled shell, with a model selector bar and an accessory
// grid page.

use gdk4::Display;
use gtk4::prelude::*;
use gtk4::{
    Align, Application, ApplicationWindow, Box as GtkBox, Button, CssProvider, Label, Orientation,
    Overlay, Settings, Stack, StackTransitionType, STYLE_PROVIDER_PRIORITY_APPLICATION,
};
use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::{Rc, Weak};

use once_cell::sync::Lazy;
use tokio::runtime::Handle;
use tracing::info;

use crate::data;
use crate::models::CartItem;
use crate::store::{ProductStore, ShowcaseView, StoreEvent};

use super::loading_overlay::LoadingOverlay;
use super::sequence_view::SequenceView;
use super::text_overlays::TextOverlays;

/// Logical width below which the video fallback path is used.
const CONSTRAINED_WIDTH_PX: i32 = 768;

/// `VITRINE_FORCE_VIDEO=1` pins the constrained profile regardless of
/// window size; useful for exercising the video path on a desktop.
static FORCE_CONSTRAINED: Lazy<Option<bool>> = Lazy::new(|| {
    std::env::var("VITRINE_FORCE_VIDEO").ok().map(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
});

/// CSS for the showcase - embedded as fallback
const FALLBACK_CSS: &str = r#"
* {
    border-radius: 0;
    box-shadow: none;
    background-image: none;
}

window {
    background-color: #0a0a0a;
    color: #e0e0e0;
}

button {
    background-color: transparent;
    border: 1px solid #333333;
    color: #e0e0e0;
}

button:hover {
    background-color: rgba(224, 224, 224, 0.05);
    border-color: #555555;
}

button.selected {
    border-color: #00ff88;
    color: #00ff88;
}

.loading-overlay {
    background-color: rgba(10, 10, 10, 0.85);
    padding: 24px;
}

.loading-title, .loading-percent, .loading-status {
    color: #00ff88;
    font-family: monospace;
}

.overlay-heading {
    color: #e0e0e0;
    font-size: 28px;
    font-weight: bold;
}

.overlay-body {
    color: #9a9a9a;
    font-size: 14px;
}
"#;

/// Load and apply the showcase stylesheet.
fn load_css() {
    let provider = CssProvider::new();

    let css_path = concat!(env!("CARGO_MANIFEST_DIR"), "/src/style.css");
    if Path::new(css_path).exists() {
        provider.load_from_path(css_path);
        tracing::info!("Loaded CSS from: {}", css_path);
    } else {
        provider.load_from_data(FALLBACK_CSS);
        tracing::info!("Loaded fallback embedded CSS");
    }

    if let Some(display) = Display::default() {
        gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }
}

pub struct MainWindow {
    self_weak: RefCell<Weak<MainWindow>>,
    window: ApplicationWindow,
    store: Rc<ProductStore>,
    sequence_view: SequenceView,
    loading: LoadingOverlay,
    overlays: TextOverlays,
    stack: Stack,
    cart_button: Button,
    cart_items: RefCell<Vec<CartItem>>,
    selector_buttons: RefCell<Vec<(&'static str, Button)>>,
    constrained: Cell<bool>,
    was_ready: Cell<bool>,
}

impl MainWindow {
    pub fn new(app: &Application, runtime: Handle) -> Rc<Self> {
        // Load CSS before creating widgets
        load_css();
        if let Some(settings) = Settings::default() {
            settings.set_gtk_application_prefer_dark_theme(true);
        }

        let window = ApplicationWindow::builder()
            .application(app)
            .title("vitrine")
            .default_width(1200)
            .default_height(800)
            .build();

        let store = Rc::new(ProductStore::new(data::catalog()));
        let sequence_view = SequenceView::new(runtime);
        let loading = LoadingOverlay::new();
        let overlays = TextOverlays::new();

        // Top bar: model selector on the left, view toggle and cart on the
        // right.
        let top_bar = GtkBox::new(Orientation::Horizontal, 8);
        top_bar.set_margin_start(8);
        top_bar.set_margin_end(8);
        top_bar.set_margin_top(4);
        top_bar.set_margin_bottom(4);

        let selector = GtkBox::new(Orientation::Horizontal, 4);
        top_bar.append(&selector);

        let spacer = GtkBox::new(Orientation::Horizontal, 0);
        spacer.set_hexpand(true);
        top_bar.append(&spacer);

        let grid_button = Button::with_label("[ACCESSORIES]");
        grid_button.set_tooltip_text(Some("Browse accessories"));
        top_bar.append(&grid_button);

        let cart_button = Button::with_label("[CART 0]");
        cart_button.set_tooltip_text(Some("Cart contents"));
        top_bar.append(&cart_button);

        // Showcase page: canvas, then text overlays, then the loading card.
        let showcase = Overlay::new();
        showcase.set_child(Some(&sequence_view.widget()));
        showcase.add_overlay(overlays.widget());
        showcase.add_overlay(loading.widget());

        // Accessory grid page.
        let grid_page = GtkBox::new(Orientation::Vertical, 8);
        grid_page.set_margin_top(24);
        grid_page.set_margin_start(24);
        grid_page.set_halign(Align::Start);

        let stack = Stack::new();
        stack.set_transition_type(StackTransitionType::Crossfade);
        stack.set_transition_duration(150);
        stack.add_named(&showcase, Some("showcase"));
        stack.add_named(&grid_page, Some("grid"));
        stack.set_visible_child_name("showcase");
        stack.set_hexpand(true);
        stack.set_vexpand(true);

        let root = GtkBox::new(Orientation::Vertical, 0);
        root.append(&top_bar);
        root.append(&stack);
        window.set_child(Some(&root));

        let this = Rc::new(Self {
            self_weak: RefCell::new(Weak::new()),
            window,
            store,
            sequence_view,
            loading,
            overlays,
            stack,
            cart_button,
            cart_items: RefCell::new(Vec::new()),
            selector_buttons: RefCell::new(Vec::new()),
            constrained: Cell::new(false),
            was_ready: Cell::new(false),
        });
        *this.self_weak.borrow_mut() = Rc::downgrade(&this);

        this.build_selector(&selector);
        this.build_grid(&grid_page);

        let weak = Rc::downgrade(&this);
        grid_button.connect_clicked(move |_| {
            if let Some(window) = weak.upgrade() {
                window.store.set_view(ShowcaseView::Grid);
            }
        });

        let weak = Rc::downgrade(&this);
        this.store.subscribe(move |event| {
            if let Some(window) = weak.upgrade() {
                window.on_store_event(event);
            }
        });

        let weak = Rc::downgrade(&this);
        this.store.on_add_to_cart(move |item| {
            if let Some(window) = weak.upgrade() {
                window.on_cart_item(item);
            }
        });

        let weak = Rc::downgrade(&this);
        this.overlays.connect_add_to_cart(move || {
            if let Some(window) = weak.upgrade() {
                window.store.add_active_to_cart("STANDARD");
            }
        });

        let weak = Rc::downgrade(&this);
        this.sequence_view.connect_frame(move || {
            if let Some(window) = weak.upgrade() {
                window.on_frame();
            }
        });

        this.mount_active_product();
        this
    }

    pub fn present(&self) {
        self.window.present();
    }

    fn build_selector(&self, selector: &GtkBox) {
        let mut buttons = self.selector_buttons.borrow_mut();
        for product in self.store.products() {
            let label = format!("[{} {}]", product.hero_name, product.model_name);
            let button = Button::with_label(&label);
            button.set_tooltip_text(Some(product.tagline));

            let weak = self.self_weak.borrow().clone();
            let id = product.id;
            button.connect_clicked(move |_| {
                if let Some(window) = weak.upgrade() {
                    window.store.set_active_product(id);
                }
            });

            selector.append(&button);
            buttons.push((product.id, button));
        }
        drop(buttons);
        self.sync_selector();
    }

    fn build_grid(&self, grid_page: &GtkBox) {
        let heading = Label::new(Some("> ACCESSORIES"));
        heading.add_css_class("overlay-heading");
        heading.set_halign(Align::Start);
        grid_page.append(&heading);

        for product in self.store.products() {
            let row = Button::with_label(&format!("{}  ${}", product.name, product.price));
            row.set_halign(Align::Start);

            let weak = self.self_weak.borrow().clone();
            let id = product.id;
            row.connect_clicked(move |_| {
                if let Some(window) = weak.upgrade() {
                    window.store.set_active_product(id);
                }
            });
            grid_page.append(&row);
        }
    }

    fn sync_selector(&self) {
        let active = self.store.active_product().id;
        for (id, button) in self.selector_buttons.borrow().iter() {
            if *id == active {
                button.add_css_class("selected");
            } else {
                button.remove_css_class("selected");
            }
        }
    }

    fn on_store_event(&self, event: StoreEvent) {
        match event {
            StoreEvent::ActiveProductChanged => {
                self.sync_selector();
                self.mount_active_product();
            }
            StoreEvent::ViewChanged => {
                let name = match self.store.view() {
                    ShowcaseView::Product => "showcase",
                    ShowcaseView::Grid => "grid",
                };
                self.stack.set_visible_child_name(name);
            }
            StoreEvent::IntroPlayed => {}
        }
    }

    fn on_cart_item(&self, item: CartItem) {
        info!(id = %item.id, edition = %item.edition, "Cart item added");
        let mut items = self.cart_items.borrow_mut();
        if let Some(existing) = items
            .iter_mut()
            .find(|i| i.id == item.id && i.edition == item.edition)
        {
            existing.quantity += item.quantity;
        } else {
            items.push(item);
        }
        let count: u32 = items.iter().map(|i| i.quantity).sum();
        self.cart_button.set_label(&format!("[CART {}]", count));
    }

    fn is_constrained_now(&self) -> bool {
        if let Some(forced) = *FORCE_CONSTRAINED {
            return forced;
        }
        let width = self.window.width();
        width > 0 && width < CONSTRAINED_WIDTH_PX
    }

    fn mount_active_product(&self) {
        let product = self.store.active_product();
        let constrained = self.is_constrained_now();
        self.constrained.set(constrained);
        self.was_ready.set(false);

        self.sequence_view.set_constrained(constrained);
        self.sequence_view.show_product(product);
        self.loading.set_product(product);
        self.overlays.set_product(product);
    }

    /// Per-frame companion update, driven by the sequence view's tick.
    fn on_frame(&self) {
        // Crossing the width threshold swaps playback path; remount so the
        // right pipeline (canvas vs video) is active.
        let constrained = self.is_constrained_now();
        if constrained != self.constrained.get() {
            info!(constrained, "Device profile changed, remounting product");
            self.mount_active_product();
            return;
        }

        if self.sequence_view.sequence_unavailable() {
            self.loading.set_unavailable(true);
        } else if self.sequence_view.is_ready() {
            if !self.was_ready.get() {
                self.was_ready.set(true);
                self.loading.set_ready();
                self.store.mark_intro_played();
            }
        } else {
            self.loading.set_progress(self.sequence_view.progress_percent());
        }

        let product = self.store.active_product();
        self.overlays.update(
            self.sequence_view.raw_progress(),
            product.visuals.text_alignment,
        );
    }
}
