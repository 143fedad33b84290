use rolegate_app::{DIST, FrameworkApp, main, services};

#[main]
async fn main() -> std::io::Result<()> {
    FrameworkApp::new(&DIST)
        .configure(services::configure)
        .run()
        .await
}
