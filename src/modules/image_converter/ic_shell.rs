use std::path::PathBuf;
use std::process::Command;
use super::ic_format::SUPPORTED_INPUT_EXTENSIONS;

pub fn open_folder(folder_path: &str) -> Result<(), String> {
    #[cfg(target_os = "windows")]
    let program = "explorer";
    #[cfg(target_os = "macos")]
    let program = "open";
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let program = "xdg-open";

    Command::new(program)
        .arg(folder_path)
        .spawn()
        .map(|_| ())
        .map_err(|e| format!("Failed to open folder: {}", e))
}

/// Fire-and-forget: failures are only logged.
pub fn open_output_folder(output_path: &str) {
    log::info!("Opening folder: {}", output_path);
    if output_path.is_empty() {
        log::warn!("Output path is empty");
        return;
    }
    if let Err(e) = open_folder(output_path) {
        log::error!("Failed to open output folder: {}", e);
    }
}

/// Native multi-file picker. An empty vector means the dialog was dismissed.
pub fn pick_images() -> Vec<String> {
    rfd::FileDialog::new()
        .add_filter("Images", SUPPORTED_INPUT_EXTENSIONS)
        .pick_files()
        .unwrap_or_default()
        .into_iter()
        .map(|p| p.to_string_lossy().to_string())
        .collect()
}

pub fn pick_folder(start: &str) -> Option<PathBuf> {
    let mut dialog = rfd::FileDialog::new();
    if !start.is_empty() {
        dialog = dialog.set_directory(start);
    }
    dialog.pick_folder()
}
