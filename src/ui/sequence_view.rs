// Scroll-driven sequence view.
// Hosts the canvas (Fixed + Picture) and the constrained-device video path
// in a Stack, owns the playback controller, and drives it from a frame
// clock tick callback. All draw planning happens in the controller; this
// widget only executes DrawOps and keeps GPU textures warm.

use gdk4::{MemoryFormat, MemoryTexture, Texture};
use gtk4::prelude::*;
use gtk4::subclass::prelude::*;
use gtk4::{
    glib, EventControllerScroll, EventControllerScrollFlags, Fixed, MediaFile, MediaStream,
    Overlay, Picture, Stack, StackTransitionType, Video,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::Handle;

use crate::loader::{FsFetcher, SequenceLoader};
use crate::models::{FrameImage, LoadState, Product};
use crate::playback::{seek_position, Phase, SequencePlaybackController};
use crate::render::DPR_CAP;

use super::texture_cache::TextureCache;

const DEFAULT_TEXTURE_CACHE_MB: usize = 256;
/// Virtual scroll pixels per wheel unit.
const SCROLL_UNIT_PX: f64 = 120.0;
/// Minimum seek delta before re-seeking the scrubbed video.
const VIDEO_SEEK_EPSILON_US: i64 = 33_000;

fn texture_cache_bytes() -> usize {
    std::env::var("VITRINE_TEXTURE_MB")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .map(|mb| mb * 1024 * 1024)
        .unwrap_or(DEFAULT_TEXTURE_CACHE_MB * 1024 * 1024)
}

/// Upload one decoded RGBA frame as a GPU texture.
fn create_texture_from_rgba(frame: &FrameImage) -> Option<Texture> {
    if frame.width == 0 || frame.height == 0 {
        return None;
    }
    let expected = (frame.width as usize) * (frame.height as usize) * 4;
    if frame.data.len() < expected {
        return None;
    }
    let bytes = glib::Bytes::from(&frame.data[..]);
    Some(
        MemoryTexture::new(
            frame.width as i32,
            frame.height as i32,
            MemoryFormat::R8g8b8a8,
            &bytes,
            (frame.width * 4) as usize,
        )
        .upcast(),
    )
}

// GObject subclass for SequenceView
mod imp {
    use super::*;

    pub struct SequenceViewInner {
        // Root overlay container
        pub overlay: RefCell<Option<Overlay>>,
        // Switches between the canvas path and the video path
        pub content_stack: RefCell<Option<Stack>>,
        // Fixed container positioning the frame picture
        pub fixed: RefCell<Option<Fixed>>,
        pub picture: RefCell<Option<Picture>>,
        pub video_area: RefCell<Option<Video>>,
        pub video_stream: RefCell<Option<MediaFile>>,
        pub controller: RefCell<Option<SequencePlaybackController>>,
        pub texture_cache: RefCell<TextureCache<Texture>>,
        // Frame clock bookkeeping
        pub last_tick: Cell<Option<Instant>>,
        pub last_size: Cell<(i32, i32)>,
        pub last_seek_us: Cell<i64>,
        // Called after every tick so companions (loader card, overlays)
        // can refresh from the accessors.
        pub on_frame: RefCell<Option<Rc<dyn Fn()>>>,
    }

    impl Default for SequenceViewInner {
        fn default() -> Self {
            Self {
                overlay: RefCell::new(None),
                content_stack: RefCell::new(None),
                fixed: RefCell::new(None),
                picture: RefCell::new(None),
                video_area: RefCell::new(None),
                video_stream: RefCell::new(None),
                controller: RefCell::new(None),
                texture_cache: RefCell::new(TextureCache::new(texture_cache_bytes())),
                last_tick: Cell::new(None),
                last_size: Cell::new((0, 0)),
                last_seek_us: Cell::new(-1),
                on_frame: RefCell::new(None),
            }
        }
    }

    #[glib::object_subclass]
    impl ObjectSubclass for SequenceViewInner {
        const NAME: &'static str = "VitrineSequenceView";
        type Type = super::SequenceView;
        type ParentType = glib::Object;
    }

    impl ObjectImpl for SequenceViewInner {}
}

glib::wrapper! {
    pub struct SequenceView(ObjectSubclass<imp::SequenceViewInner>);
}

impl SequenceView {
    pub fn new(runtime: Handle) -> Self {
        let obj: Self = glib::Object::builder().build();
        let loader = SequenceLoader::new(runtime, Arc::new(FsFetcher::new()));
        *obj.imp().controller.borrow_mut() = Some(SequencePlaybackController::new(loader, 600.0));
        obj.setup_widgets();
        obj
    }

    /// The root widget to mount in the window.
    pub fn widget(&self) -> Overlay {
        self.imp()
            .overlay
            .borrow()
            .clone()
            .unwrap_or_else(Overlay::new)
    }

    fn setup_widgets(&self) {
        let imp = self.imp();

        let overlay = Overlay::new();
        overlay.set_hexpand(true);
        overlay.set_vexpand(true);
        overlay.add_css_class("sequence-view");

        let content_stack = Stack::new();
        content_stack.set_hexpand(true);
        content_stack.set_vexpand(true);
        content_stack.set_transition_type(StackTransitionType::None);

        let fixed = Fixed::new();
        fixed.set_hexpand(true);
        fixed.set_vexpand(true);

        let picture = Picture::new();
        picture.set_can_shrink(true);
        picture.set_content_fit(gtk4::ContentFit::Fill);
        picture.add_css_class("sequence-frame");
        fixed.put(&picture, 0.0, 0.0);

        let video_area = Video::new();
        video_area.set_autoplay(false);
        video_area.set_loop(false);
        video_area.set_hexpand(true);
        video_area.set_vexpand(true);
        video_area.add_css_class("sequence-video");

        content_stack.add_named(&fixed, Some("canvas"));
        content_stack.add_named(&video_area, Some("video"));
        content_stack.set_visible_child_name("canvas");
        overlay.set_child(Some(&content_stack));

        // Wheel/touchpad scroll feeds the virtual scroll region.
        let scroll_controller = EventControllerScroll::new(EventControllerScrollFlags::VERTICAL);
        let view_weak = self.downgrade();
        scroll_controller.connect_scroll(move |_, _dx, dy| {
            if let Some(view) = view_weak.upgrade() {
                if let Some(ctrl) = view.imp().controller.borrow_mut().as_mut() {
                    ctrl.scroll_by(dy * SCROLL_UNIT_PX);
                }
            }
            glib::Propagation::Stop
        });
        overlay.add_controller(scroll_controller);

        // Animation-frame loop, alive for the widget's whole lifetime.
        let view_weak = self.downgrade();
        overlay.add_tick_callback(move |_widget, _clock| {
            if let Some(view) = view_weak.upgrade() {
                view.on_tick();
                glib::ControlFlow::Continue
            } else {
                glib::ControlFlow::Break
            }
        });

        *imp.overlay.borrow_mut() = Some(overlay);
        *imp.content_stack.borrow_mut() = Some(content_stack);
        *imp.fixed.borrow_mut() = Some(fixed);
        *imp.picture.borrow_mut() = Some(picture);
        *imp.video_area.borrow_mut() = Some(video_area);
    }

    /// Mount a product and start loading its sequence.
    pub fn show_product(&self, product: &'static Product) {
        let imp = self.imp();
        imp.texture_cache.borrow_mut().clear();
        imp.last_seek_us.set(-1);
        if let Some(picture) = imp.picture.borrow().as_ref() {
            picture.set_paintable(None::<&Texture>);
        }

        let constrained = {
            let mut ctrl = imp.controller.borrow_mut();
            let Some(ctrl) = ctrl.as_mut() else {
                return;
            };
            ctrl.switch_product(*product, Instant::now());
            ctrl.is_constrained()
        };

        if constrained {
            self.open_video(product);
        } else {
            self.close_video();
        }
    }

    /// Unmount the current product and stop loading.
    pub fn teardown(&self) {
        let imp = self.imp();
        if let Some(ctrl) = imp.controller.borrow_mut().as_mut() {
            ctrl.teardown();
        }
        imp.texture_cache.borrow_mut().clear();
        self.close_video();
        if let Some(picture) = imp.picture.borrow().as_ref() {
            picture.set_paintable(None::<&Texture>);
        }
    }

    /// Select the device profile; flips between the canvas and video paths.
    pub fn set_constrained(&self, constrained: bool) {
        let imp = self.imp();
        if let Some(ctrl) = imp.controller.borrow_mut().as_mut() {
            ctrl.set_constrained(constrained);
        }
        // Force a resize pass so the new policy replans at current size.
        imp.last_size.set((0, 0));
    }

    fn open_video(&self, product: &'static Product) {
        let imp = self.imp();
        let media = MediaFile::for_filename(product.video_path());

        let view_weak = self.downgrade();
        media.connect_prepared_notify(move |m| {
            if m.is_prepared() {
                if let Some(view) = view_weak.upgrade() {
                    if let Some(ctrl) = view.imp().controller.borrow_mut().as_mut() {
                        ctrl.video_gate_mut().on_prepared();
                    }
                }
            }
        });

        let view_weak = self.downgrade();
        media.connect_error_notify(move |m| {
            if m.error().is_some() {
                if let Some(view) = view_weak.upgrade() {
                    if let Some(ctrl) = view.imp().controller.borrow_mut().as_mut() {
                        ctrl.video_gate_mut().on_error();
                    }
                }
            }
        });

        if let Some(video) = imp.video_area.borrow().as_ref() {
            video.set_media_stream(Some(&media));
        }
        if let Some(stack) = imp.content_stack.borrow().as_ref() {
            stack.set_visible_child_name("video");
        }
        *imp.video_stream.borrow_mut() = Some(media);
    }

    fn close_video(&self) {
        let imp = self.imp();
        if let Some(video) = imp.video_area.borrow().as_ref() {
            video.set_media_stream(None::<&MediaStream>);
        }
        if let Some(stack) = imp.content_stack.borrow().as_ref() {
            stack.set_visible_child_name("canvas");
        }
        *imp.video_stream.borrow_mut() = None;
    }

    fn on_tick(&self) {
        let imp = self.imp();
        let Some(overlay) = imp.overlay.borrow().clone() else {
            return;
        };

        let now = Instant::now();
        let dt = imp
            .last_tick
            .get()
            .map(|last| now.duration_since(last).as_secs_f64())
            .unwrap_or(1.0 / 60.0);
        imp.last_tick.set(Some(now));

        let dpr = (overlay.scale_factor() as f64).min(DPR_CAP);
        let size = (overlay.width(), overlay.height());

        let (resize_op, tick_op, constrained) = {
            let mut ctrl = imp.controller.borrow_mut();
            let Some(ctrl) = ctrl.as_mut() else {
                return;
            };
            let mut resize_op = None;
            if size != imp.last_size.get() && size.0 > 0 && size.1 > 0 {
                imp.last_size.set(size);
                resize_op = ctrl.resize(size.0 as f64, size.1 as f64, dpr);
            }
            let tick_op = ctrl.tick(now, dt);
            (resize_op, tick_op, ctrl.is_constrained())
        };

        if let Some(op) = resize_op {
            self.apply_draw(op.frame_index, op.rect, dpr);
        }
        if let Some(op) = tick_op {
            self.apply_draw(op.frame_index, op.rect, dpr);
        }

        if constrained {
            self.sync_video_position();
        }

        let callback = imp.on_frame.borrow().clone();
        if let Some(callback) = callback {
            callback();
        }
    }

    /// Execute one planned draw: resolve the texture and place the picture.
    /// The rect arrives in surface pixels; the picture is positioned in
    /// logical coordinates.
    fn apply_draw(&self, frame_index: usize, rect: crate::render::DrawRect, dpr: f64) {
        let imp = self.imp();

        let texture = {
            let mut cache = imp.texture_cache.borrow_mut();
            match cache.get(frame_index) {
                Some(texture) => Some(texture),
                None => {
                    let ctrl = imp.controller.borrow();
                    let uploaded = ctrl
                        .as_ref()
                        .and_then(|c| c.session())
                        .and_then(|session| {
                            let frames = session.frames();
                            frames.image(frame_index).and_then(|frame| {
                                create_texture_from_rgba(frame)
                                    .map(|texture| (texture, frame.data.len()))
                            })
                        });
                    uploaded.map(|(texture, bytes)| {
                        cache.insert(frame_index, texture.clone(), bytes);
                        texture
                    })
                }
            }
        };

        let Some(texture) = texture else {
            return;
        };
        let picture = imp.picture.borrow().clone();
        let fixed = imp.fixed.borrow().clone();
        if let (Some(picture), Some(fixed)) = (picture, fixed) {
            picture.set_paintable(Some(&texture));
            picture.set_size_request(
                (rect.width / dpr).round() as i32,
                (rect.height / dpr).round() as i32,
            );
            fixed.move_(&picture, rect.x / dpr, rect.y / dpr);
        }
    }

    /// Scrub the constrained-path video to the smoothed scroll position.
    fn sync_video_position(&self) {
        let imp = self.imp();
        let (ready, progress) = {
            let ctrl = imp.controller.borrow();
            let Some(ctrl) = ctrl.as_ref() else {
                return;
            };
            (ctrl.is_ready(), ctrl.smoothed_progress())
        };
        if !ready {
            return;
        }
        let stream = imp.video_stream.borrow().clone();
        let Some(stream) = stream else {
            return;
        };
        let duration_us = stream.duration();
        if duration_us <= 0 {
            return;
        }
        let target =
            seek_position(progress, Duration::from_micros(duration_us as u64)).as_micros() as i64;
        if (target - imp.last_seek_us.get()).abs() >= VIDEO_SEEK_EPSILON_US {
            imp.last_seek_us.set(target);
            stream.seek(target);
        }
    }

    pub fn connect_frame<F: Fn() + 'static>(&self, f: F) {
        *self.imp().on_frame.borrow_mut() = Some(Rc::new(f));
    }

    pub fn phase(&self) -> Phase {
        self.imp()
            .controller
            .borrow()
            .as_ref()
            .map(|c| c.phase())
            .unwrap_or(Phase::Idle)
    }

    pub fn load_state(&self) -> LoadState {
        self.imp()
            .controller
            .borrow()
            .as_ref()
            .map(|c| c.load_state())
            .unwrap_or_default()
    }

    pub fn progress_percent(&self) -> u8 {
        self.imp()
            .controller
            .borrow()
            .as_ref()
            .map(|c| c.progress_percent())
            .unwrap_or(0)
    }

    pub fn is_ready(&self) -> bool {
        self.imp()
            .controller
            .borrow()
            .as_ref()
            .map(|c| c.is_ready())
            .unwrap_or(false)
    }

    pub fn sequence_unavailable(&self) -> bool {
        self.imp()
            .controller
            .borrow()
            .as_ref()
            .map(|c| c.sequence_unavailable())
            .unwrap_or(false)
    }

    pub fn raw_progress(&self) -> f64 {
        self.imp()
            .controller
            .borrow()
            .as_ref()
            .map(|c| c.raw_progress())
            .unwrap_or(0.0)
    }

    pub fn smoothed_progress(&self) -> f64 {
        self.imp()
            .controller
            .borrow()
            .as_ref()
            .map(|c| c.smoothed_progress())
            .unwrap_or(0.0)
    }
}
