use gtk4::prelude::*;
use gtk4::Application;

use tokio::runtime::Runtime;

use crate::ui::MainWindow;

const APP_ID: &str = "com.vitrine.Showcase";

pub struct VitrineApp {
    app: Application,
    // Owns the worker runtime for the lifetime of the process; loaders only
    // hold handles into it.
    _runtime: Runtime,
}

impl VitrineApp {
    pub fn new() -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        let app = Application::builder().application_id(APP_ID).build();

        let handle = runtime.handle().clone();
        app.connect_activate(move |app| {
            let window = MainWindow::new(app, handle.clone());
            window.present();
            // Keep the window alive by storing it on the Application.
            unsafe {
                app.set_data("main-window", window);
            }
        });

        Ok(Self {
            app,
            _runtime: runtime,
        })
    }

    pub fn run(&self) -> i32 {
        self.app.run().into()
    }
}
