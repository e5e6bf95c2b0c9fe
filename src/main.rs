use std::path::PathBuf;

use orbview::ViewerApp;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut app = ViewerApp::new()?;
    if let Some(model_path) = std::env::args().nth(1).map(PathBuf::from) {
        app.load_model(&model_path)?;
    } else {
        log::info!("no model path given, showing an empty scene");
    }

    app.run()
}
