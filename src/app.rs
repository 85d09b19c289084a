use eframe::egui;
use crate::modules::image_converter::{ConflictResolution, ConvertPolicy, ImageConverter, ic_shell};
use crate::settings::{AppSettings, ThemePreference, default_output_path};
use crate::style::{self, ColorPalette, ThemeMode};

const LICENSES: &[(&str, &str, &str)] = &[
    ("eframe / egui", "MIT OR Apache-2.0", "https://github.com/emilk/egui"),
    ("image", "MIT OR Apache-2.0", "https://github.com/image-rs/image"),
    ("webp / libwebp", "MIT OR Apache-2.0 / BSD-3-Clause", "https://github.com/jaredforth/webp"),
    ("rfd", "MIT", "https://github.com/PolyMeilex/rfd"),
    ("serde / serde_json", "MIT OR Apache-2.0", "https://github.com/serde-rs/serde"),
    ("dirs", "MIT OR Apache-2.0", "https://github.com/dirs-dev/dirs-rs"),
    ("log / env_logger", "MIT OR Apache-2.0", "https://github.com/rust-cli/env_logger"),
    ("thiserror", "MIT OR Apache-2.0", "https://github.com/dtolnay/thiserror"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Home,
    Settings,
    Licenses,
}

pub struct ImgcvtApp {
    settings: AppSettings,
    theme_mode: ThemeMode,
    converter: ImageConverter,
    page: Page,
    sidebar_open: bool,
}

impl ImgcvtApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings = AppSettings::load();
        let theme_mode = resolve_theme(settings.theme, style::system_theme(&cc.egui_ctx));
        style::apply_theme(&cc.egui_ctx, theme_mode);

        log::info!("Output folder: {}", settings.output_path);

        Self {
            converter: ImageConverter::new(settings.default_quality),
            settings,
            theme_mode,
            page: Page::Home,
            sidebar_open: true,
        }
    }

    fn set_theme(&mut self, ctx: &egui::Context, preference: ThemePreference) {
        self.settings.theme = preference;
        self.theme_mode = resolve_theme(preference, style::system_theme(ctx));
        style::apply_theme(ctx, self.theme_mode);
    }

    fn top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                if ui.button(if self.sidebar_open { "<" } else { ">" }).clicked() {
                    self.sidebar_open = !self.sidebar_open;
                }
                ui.label(egui::RichText::new("IMGCVT").strong());
            });
            ui.add_space(4.0);
        });
    }

    fn sidebar(&mut self, ctx: &egui::Context) {
        if !self.sidebar_open { return; }

        egui::SidePanel::left("sidebar")
            .resizable(false)
            .default_width(200.0)
            .show(ctx, |ui| {
                ui.add_space(8.0);
                let theme = self.theme_mode;
                for (page, label) in [(Page::Home, "Home"), (Page::Settings, "Settings"), (Page::Licenses, "Licenses")] {
                    if style::sidebar_item(ui, label, self.page == page, theme).clicked() {
                        self.page = page;
                    }
                }
            });
    }

    fn settings_page(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let before = self.settings.clone();
        let muted = match self.theme_mode {
            ThemeMode::Dark => ColorPalette::ZINC_400,
            ThemeMode::Light => ColorPalette::GRAY_600,
        };

        ui.heading("Settings");
        ui.add_space(12.0);

        ui.label(egui::RichText::new("Theme").strong());
        ui.horizontal(|ui| {
            let mut preference = self.settings.theme;
            ui.selectable_value(&mut preference, ThemePreference::System, "System");
            ui.selectable_value(&mut preference, ThemePreference::Light, "Light");
            ui.selectable_value(&mut preference, ThemePreference::Dark, "Dark");
            if preference != self.settings.theme {
                self.set_theme(ctx, preference);
            }
        });
        ui.add_space(12.0);

        ui.label(egui::RichText::new("Output folder").strong());
        ui.horizontal(|ui| {
            let response = ui.add(egui::TextEdit::singleline(&mut self.settings.output_path).desired_width(320.0));
            if response.lost_focus() && self.settings.output_path.trim().is_empty() {
                self.settings.output_path = default_output_path();
            }
            if ui.button("Browse...").clicked() {
                if let Some(folder) = ic_shell::pick_folder(&self.settings.output_path) {
                    self.settings.output_path = folder.to_string_lossy().to_string();
                }
            }
            if ui.button("Reset").clicked() {
                self.settings.output_path = default_output_path();
            }
        });
        ui.add_space(12.0);

        ui.label(egui::RichText::new("File prefix").strong());
        ui.add(egui::TextEdit::singleline(&mut self.settings.file_prefix).hint_text("e.g. converted_"));
        ui.label(egui::RichText::new("Prepended to every converted file name.").size(11.0).color(muted));
        ui.add_space(12.0);

        ui.label(egui::RichText::new("When a file already exists").strong());
        for option in [ConflictResolution::Numbering, ConflictResolution::Overwrite] {
            ui.radio_value(&mut self.settings.conflict_resolution, option, option.label());
        }
        ui.add_space(12.0);

        ui.label(egui::RichText::new("Files already in the target format").strong());
        for option in [ConvertPolicy::Strict, ConvertPolicy::Permissive] {
            ui.radio_value(&mut self.settings.convert_policy, option, option.label());
        }
        ui.add_space(12.0);

        ui.label(egui::RichText::new("Default quality").strong());
        ui.add(egui::Slider::new(&mut self.settings.default_quality, 1..=100));

        if self.settings != before {
            self.settings.clone().normalized().save();
        }
    }

    fn licenses_page(&self, ui: &mut egui::Ui) {
        ui.heading("Licenses");
        ui.add_space(12.0);

        egui::Grid::new("licenses").num_columns(3).spacing([24.0, 8.0]).striped(true).show(ui, |ui| {
            for (name, license, url) in LICENSES {
                ui.label(*name);
                ui.label(*license);
                ui.hyperlink_to(*url, *url);
                ui.end_row();
            }
        });
    }
}

fn resolve_theme(preference: ThemePreference, system: ThemeMode) -> ThemeMode {
    match preference {
        ThemePreference::System => system,
        ThemePreference::Light => ThemeMode::Light,
        ThemePreference::Dark => ThemeMode::Dark,
    }
}

impl eframe::App for ImgcvtApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if matches!(self.settings.theme, ThemePreference::System) {
            let system_theme = style::system_theme(ctx);
            if self.theme_mode != system_theme {
                self.theme_mode = system_theme;
                style::apply_theme(ctx, self.theme_mode);
            }
        }

        if self.page == Page::Home {
            self.converter.handle_drag_drop(ctx);
        }

        self.top_bar(ctx);
        self.sidebar(ctx);

        egui::CentralPanel::default().show(ctx, |ui| match self.page {
            Page::Home => self.converter.ui(ui, ctx, &self.settings),
            Page::Settings => self.settings_page(ui, ctx),
            Page::Licenses => self.licenses_page(ui),
        });
    }
}
