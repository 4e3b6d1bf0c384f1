//! Showcase state container.
//!
//! The active product, view mode, and intro flag live in one explicitly
//! injected store owned by the root UI composition, with change events for
//! interested widgets. The cart itself is an external collaborator: the
//! store only invokes a callback with the item payload.

use std::cell::{Cell, RefCell};

use tracing::debug;

use crate::models::{CartItem, Product};

/// Which page body is showing: the scroll sequence or the accessory grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowcaseView {
    Product,
    Grid,
}

/// Change notifications published to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    ActiveProductChanged,
    ViewChanged,
    IntroPlayed,
}

type Subscriber = Box<dyn Fn(StoreEvent)>;
type CartCallback = Box<dyn Fn(CartItem)>;

/// Main-thread state container for the showcase page.
pub struct ProductStore {
    products: &'static [Product],
    active: Cell<usize>,
    view: Cell<ShowcaseView>,
    intro_played: Cell<bool>,
    subscribers: RefCell<Vec<Subscriber>>,
    cart_callback: RefCell<Option<CartCallback>>,
}

impl ProductStore {
    /// Build a store over a catalog; the first product is active, matching
    /// the page's initial hydration.
    pub fn new(products: &'static [Product]) -> Self {
        assert!(!products.is_empty(), "catalog must not be empty");
        Self {
            products,
            active: Cell::new(0),
            view: Cell::new(ShowcaseView::Product),
            intro_played: Cell::new(false),
            subscribers: RefCell::new(Vec::new()),
            cart_callback: RefCell::new(None),
        }
    }

    pub fn products(&self) -> &'static [Product] {
        self.products
    }

    pub fn active_product(&self) -> &'static Product {
        &self.products[self.active.get()]
    }

    /// Activate a product by id. Switching product forces the sequence
    /// view. Unknown ids are ignored.
    pub fn set_active_product(&self, id: &str) {
        let Some(index) = self.products.iter().position(|p| p.id == id) else {
            debug!(id, "Ignoring unknown product id");
            return;
        };
        let product_changed = index != self.active.get();
        let view_changed = self.view.get() != ShowcaseView::Product;
        self.active.set(index);
        self.view.set(ShowcaseView::Product);
        if product_changed {
            self.emit(StoreEvent::ActiveProductChanged);
        }
        if view_changed {
            self.emit(StoreEvent::ViewChanged);
        }
    }

    pub fn view(&self) -> ShowcaseView {
        self.view.get()
    }

    pub fn set_view(&self, view: ShowcaseView) {
        if self.view.get() != view {
            self.view.set(view);
            self.emit(StoreEvent::ViewChanged);
        }
    }

    pub fn intro_played(&self) -> bool {
        self.intro_played.get()
    }

    /// Latches forever; the boot intro runs at most once per process.
    pub fn mark_intro_played(&self) {
        if !self.intro_played.get() {
            self.intro_played.set(true);
            self.emit(StoreEvent::IntroPlayed);
        }
    }

    pub fn subscribe<F: Fn(StoreEvent) + 'static>(&self, f: F) {
        self.subscribers.borrow_mut().push(Box::new(f));
    }

    fn emit(&self, event: StoreEvent) {
        for subscriber in self.subscribers.borrow().iter() {
            subscriber(event);
        }
    }

    /// Register the external cart collaborator.
    pub fn on_add_to_cart<F: Fn(CartItem) + 'static>(&self, f: F) {
        *self.cart_callback.borrow_mut() = Some(Box::new(f));
    }

    /// Hand the active product to the cart collaborator.
    pub fn add_active_to_cart(&self, edition: &str) {
        let item = CartItem::from_product(self.active_product(), edition);
        debug!(id = %item.id, edition = %item.edition, "Adding product to cart");
        if let Some(callback) = self.cart_callback.borrow().as_ref() {
            callback(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use crate::data;

    #[test]
    fn first_product_is_active_initially() {
        let store = ProductStore::new(data::catalog());
        assert_eq!(store.active_product().id, data::catalog()[0].id);
        assert_eq!(store.view(), ShowcaseView::Product);
    }

    #[test]
    fn switching_product_forces_sequence_view() {
        let store = ProductStore::new(data::catalog());
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        store.subscribe(move |e| sink.borrow_mut().push(e));

        store.set_view(ShowcaseView::Grid);
        store.set_active_product("umbra-carbon");

        assert_eq!(store.active_product().id, "umbra-carbon");
        assert_eq!(store.view(), ShowcaseView::Product);
        assert_eq!(
            events.borrow().as_slice(),
            &[
                StoreEvent::ViewChanged,
                StoreEvent::ActiveProductChanged,
                StoreEvent::ViewChanged,
            ]
        );
    }

    #[test]
    fn unknown_product_id_is_ignored() {
        let store = ProductStore::new(data::catalog());
        store.set_active_product("does-not-exist");
        assert_eq!(store.active_product().id, data::catalog()[0].id);
    }

    #[test]
    fn intro_flag_latches_once() {
        let store = ProductStore::new(data::catalog());
        let count = Rc::new(Cell::new(0));
        let sink = Rc::clone(&count);
        store.subscribe(move |e| {
            if e == StoreEvent::IntroPlayed {
                sink.set(sink.get() + 1);
            }
        });
        store.mark_intro_played();
        store.mark_intro_played();
        assert!(store.intro_played());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn add_to_cart_invokes_the_collaborator() {
        let store = ProductStore::new(data::catalog());
        let received = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&received);
        store.on_add_to_cart(move |item| *sink.borrow_mut() = Some(item));

        store.add_active_to_cart("PRIME");
        let item = received.borrow().clone().unwrap();
        assert_eq!(item.id, data::catalog()[0].id);
        assert_eq!(item.quantity, 1);
        assert_eq!(item.edition, "PRIME");
    }
}
