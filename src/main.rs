mod app;
mod data;
mod loader;
mod models;
mod playback;
mod render;
mod scroll;
mod store;
mod ui;

use app::VitrineApp;

fn main() {
    // Prefer C numeric locale up-front; GTK may later adjust locale again.
    std::env::set_var("LC_NUMERIC", "C");
    unsafe {
        libc::setlocale(libc::LC_NUMERIC, b"C\0".as_ptr().cast());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vitrine=info".parse().unwrap()),
        )
        .init();

    match VitrineApp::new() {
        Ok(app) => std::process::exit(app.run()),
        Err(err) => {
            tracing::error!(error = ?err, "Failed to start");
            std::process::exit(1);
        }
    }
}
