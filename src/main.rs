use eframe::egui;
use env_logger::Env;
use imgcvt::ImgcvtApp;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("imgcvt=info")).init();
    log::info!("Starting imgcvt {}", env!("CARGO_PKG_VERSION"));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([720.0, 520.0])
            .with_drag_and_drop(true)
            .with_title("IMGCVT"),
        ..Default::default()
    };
    eframe::run_native(
        "IMGCVT",
        options,
        Box::new(|cc| Ok(Box::new(ImgcvtApp::new(cc)))),
    )
}
