//! # imgcvt
//!
//! Desktop image converter. The selection registry, drop de-duplication and
//! the sequential conversion run live in [`modules::image_converter`]; the
//! egui shell in [`app`] only renders them.

pub mod app;
pub mod modules;
pub mod settings;
pub mod style;

pub use app::ImgcvtApp;
pub use settings::AppSettings;
