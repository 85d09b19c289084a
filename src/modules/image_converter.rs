use eframe::egui;
use std::sync::Arc;
use crate::settings::AppSettings;
use crate::style::{self, ColorPalette, ThemeMode};

pub mod ic_backend;
pub mod ic_batch;
pub mod ic_drop;
pub mod ic_format;
pub mod ic_local;
pub mod ic_progress;
pub mod ic_registry;
pub mod ic_shell;

pub use ic_backend::{BackendError, ConversionBackend, ConversionResult, ConversionSettings, FileMetadata, MetadataProbe};
pub use ic_batch::{Batch, BatchJob, BatchState, Orchestrator};
pub use ic_drop::{DragDropEvent, DropFilter, DropZone};
pub use ic_format::{ConflictResolution, ConvertPolicy, QualitySettings, TargetFormat, clamp_quality};
pub use ic_local::LocalBackend;
pub use ic_progress::Progress;
pub use ic_registry::{FileStatus, SelectedFile};

pub struct ImageConverter {
    orchestrator: Orchestrator,
    probe: Box<dyn MetadataProbe>,
    drop_zone: DropZone,
    target_format: TargetFormat,
    policy: ConvertPolicy,
    quality: QualitySettings,
    synced_default_quality: u8,
}

impl ImageConverter {
    pub fn new(default_quality: u8) -> Self {
        Self::with_backend(Arc::new(LocalBackend::new()), Box::new(LocalBackend::new()), default_quality)
    }

    pub fn with_backend(backend: Arc<dyn ConversionBackend>, probe: Box<dyn MetadataProbe>, default_quality: u8) -> Self {
        Self {
            orchestrator: Orchestrator::new(backend),
            probe,
            drop_zone: DropZone::new(),
            target_format: TargetFormat::default(),
            policy: ConvertPolicy::default(),
            quality: QualitySettings::new(default_quality),
            synced_default_quality: default_quality,
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn policy(&self) -> ConvertPolicy {
        self.policy
    }

    /// Ignored while a run is in progress so the running batch and the
    /// progress bar keep counting the same files.
    pub fn set_policy(&mut self, policy: ConvertPolicy) {
        if policy != self.policy && !self.orchestrator.lock().is_converting() {
            self.policy = policy;
        }
    }

    pub fn target_format(&self) -> TargetFormat {
        self.target_format
    }

    pub fn quality(&self) -> QualitySettings {
        self.quality
    }

    pub fn set_target_format(&mut self, target: TargetFormat) {
        self.target_format = target;
        self.quality.apply_format(target);
    }

    /// Picks up a changed default quality from the settings page.
    pub fn sync_default_quality(&mut self, default_quality: u8) {
        if default_quality != self.synced_default_quality {
            self.synced_default_quality = default_quality;
            self.quality.set_quality(default_quality);
        }
    }

    pub fn add_paths(&mut self, paths: &[String]) -> usize {
        if paths.is_empty() {
            return 0;
        }
        let files = ic_backend::resolve_paths(self.probe.as_ref(), paths);
        let added = self.orchestrator.lock().add_files(files);
        log::info!("Added {} of {} selected files", added, paths.len());
        added
    }

    pub fn start_conversion(&mut self, settings: &AppSettings) -> bool {
        let job = BatchJob {
            target: self.target_format,
            policy: self.policy,
            settings: settings.conversion_settings(&self.quality),
        };
        self.orchestrator.start(job).is_some()
    }

    pub fn reset(&mut self) {
        self.orchestrator.reset();
    }

    pub fn handle_drag_drop(&mut self, ctx: &egui::Context) {
        let (hovering, dropped) = ctx.input(|i| {
            let dropped: Vec<String> = i
                .raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.as_ref())
                .map(|p| p.to_string_lossy().to_string())
                .collect();
            (!i.raw.hovered_files.is_empty(), dropped)
        });

        let Some(event) = self.drop_zone.event_from_input(hovering, dropped) else {
            return;
        };
        let disabled = self.orchestrator.lock().is_converting();
        if let Some(paths) = self.drop_zone.handle_event(event, disabled) {
            self.add_paths(&paths);
        }
    }

    pub fn ui(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, settings: &AppSettings) {
        let theme = if ui.visuals().dark_mode { ThemeMode::Dark } else { ThemeMode::Light };
        self.sync_default_quality(settings.default_quality);
        self.set_policy(settings.convert_policy);

        let (files, state) = {
            let batch = self.orchestrator.lock();
            (batch.files().to_vec(), batch.state())
        };
        let progress = Progress::compute(&files, self.target_format, self.policy);

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.add_space(8.0);
                self.render_header(ui, theme);

                ui.add_space(8.0);
                self.render_drop_zone(ui, theme, state == BatchState::Running, !files.is_empty());

                if !files.is_empty() {
                    ui.add_space(12.0);
                    self.render_file_list(ui, theme, &files, state);
                }

                ui.add_space(12.0);
                self.render_action_bar(ui, theme, settings, state, progress);
                ui.add_space(16.0);
            });

        if state == BatchState::Running {
            ctx.request_repaint();
        }
    }

    fn render_header(&self, ui: &mut egui::Ui, theme: ThemeMode) {
        let (title_color, subtitle_color) = match theme {
            ThemeMode::Dark => (ColorPalette::ZINC_100, ColorPalette::ZINC_400),
            ThemeMode::Light => (ColorPalette::ZINC_900, ColorPalette::ZINC_600),
        };

        ui.vertical_centered(|ui| {
            ui.label(egui::RichText::new("Convert your images").size(24.0).color(title_color));
            ui.add_space(4.0);
            ui.label(
                egui::RichText::new("Easy, fast and secure image conversion.")
                    .size(13.0)
                    .color(subtitle_color),
            );
        });
    }

    fn render_drop_zone(&mut self, ui: &mut egui::Ui, theme: ThemeMode, disabled: bool, has_files: bool) {
        let dragging = self.drop_zone.is_dragging() && !disabled;
        let (bg, border, text_color) = match (theme, dragging) {
            (_, true) => (
                if matches!(theme, ThemeMode::Dark) { ColorPalette::ZINC_700 } else { ColorPalette::GREEN_50 },
                ColorPalette::GREEN_500,
                ColorPalette::GREEN_600,
            ),
            (ThemeMode::Dark, false) => (ColorPalette::ZINC_900, ColorPalette::ZINC_600, ColorPalette::ZINC_400),
            (ThemeMode::Light, false) => (egui::Color32::WHITE, ColorPalette::GRAY_400, ColorPalette::ZINC_500),
        };

        let height = if has_files { 80.0 } else { 150.0 };
        let sense = if disabled { egui::Sense::hover() } else { egui::Sense::click() };
        let (rect, response) = ui.allocate_exact_size(egui::vec2(ui.available_width(), height), sense);

        ui.painter().rect_filled(rect, 6.0, bg);
        ui.painter().rect_stroke(rect, 6.0, egui::Stroke::new(2.0, border), egui::StrokeKind::Outside);
        ui.painter().text(
            rect.center() - egui::vec2(0.0, 9.0),
            egui::Align2::CENTER_CENTER,
            "Click to select images",
            egui::FontId::proportional(if has_files { 15.0 } else { 18.0 }),
            if disabled { ColorPalette::ZINC_500 } else { text_color },
        );
        ui.painter().text(
            rect.center() + egui::vec2(0.0, 12.0),
            egui::Align2::CENTER_CENTER,
            "or drop JPG, PNG, WEBP files here",
            egui::FontId::proportional(12.0),
            ColorPalette::ZINC_500,
        );

        if response.clicked() {
            let picked = ic_shell::pick_images();
            self.add_paths(&picked);
        }
    }

    fn render_file_list(&mut self, ui: &mut egui::Ui, theme: ThemeMode, files: &[SelectedFile], state: BatchState) {
        let (panel_bg, border_color, text_color, weak_color, item_bg) = match theme {
            ThemeMode::Dark => (
                ColorPalette::ZINC_800,
                ColorPalette::ZINC_700,
                ColorPalette::ZINC_200,
                ColorPalette::ZINC_500,
                ColorPalette::ZINC_900,
            ),
            ThemeMode::Light => (
                ColorPalette::GRAY_50,
                ColorPalette::GRAY_300,
                ColorPalette::GRAY_800,
                ColorPalette::ZINC_500,
                egui::Color32::WHITE,
            ),
        };
        let converting = state == BatchState::Running;
        let mut to_remove: Option<String> = None;

        egui::Frame::new()
            .fill(panel_bg)
            .stroke(egui::Stroke::new(1.0, border_color))
            .corner_radius(8.0)
            .inner_margin(16.0)
            .show(ui, |ui| {
                ui.label(
                    egui::RichText::new(format!("Selected Files ({})", files.len()))
                        .size(14.0)
                        .color(text_color),
                );
                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);

                egui::ScrollArea::vertical()
                    .id_salt("selected_files")
                    .max_height(320.0)
                    .show(ui, |ui| {
                        for file in files {
                            let same_format = !self.policy.can_convert(file, self.target_format);

                            egui::Frame::new()
                                .fill(item_bg)
                                .stroke(egui::Stroke::new(1.0, if same_format { ColorPalette::RED_300 } else { border_color }))
                                .corner_radius(6.0)
                                .inner_margin(12.0)
                                .show(ui, |ui| {
                                    ui.horizontal(|ui| {
                                        ui.vertical(|ui| {
                                            let mut name = egui::RichText::new(&file.name).size(13.0);
                                            name = if same_format {
                                                name.strikethrough().color(weak_color)
                                            } else {
                                                name.color(text_color)
                                            };
                                            ui.label(name);

                                            if same_format {
                                                ui.label(
                                                    egui::RichText::new("Same format as target")
                                                        .size(10.0)
                                                        .color(ColorPalette::RED_500),
                                                );
                                            }
                                            if let Some(message) = file.error() {
                                                ui.label(egui::RichText::new(message).size(11.0).color(ColorPalette::RED_500));
                                            }
                                        });

                                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                                            if ui.add_enabled(!converting, egui::Button::new("Remove")).clicked() {
                                                to_remove = Some(file.path.clone());
                                            }
                                            if let Some(status) = &file.status {
                                                let _ = style::status_badge(ui, status.label(), status_color(status));
                                            }
                                            if let Some(size) = file.size_label() {
                                                ui.label(egui::RichText::new(size).size(11.0).color(weak_color));
                                            }
                                        });
                                    });
                                });

                            ui.add_space(6.0);
                        }
                    });
            });

        if let Some(path) = to_remove {
            self.orchestrator.lock().remove_file(&path);
        }
    }

    fn render_action_bar(&mut self, ui: &mut egui::Ui, theme: ThemeMode, settings: &AppSettings, state: BatchState, progress: Progress) {
        let (panel_bg, border_color, text_color, label_color) = match theme {
            ThemeMode::Dark => (ColorPalette::ZINC_800, ColorPalette::ZINC_700, ColorPalette::ZINC_200, ColorPalette::ZINC_400),
            ThemeMode::Light => (ColorPalette::GRAY_50, ColorPalette::GRAY_300, ColorPalette::GRAY_800, ColorPalette::ZINC_600),
        };
        let converting = state == BatchState::Running;
        let complete = state == BatchState::Completed;
        let has_convertible = progress.convertible > 0;

        egui::Frame::new()
            .fill(panel_bg)
            .stroke(egui::Stroke::new(1.0, border_color))
            .corner_radius(8.0)
            .inner_margin(16.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.vertical(|ui| {
                        let (caption, headline) = if complete {
                            ("CONVERSION TASK", "Completed".to_string())
                        } else {
                            ("READY TO CONVERT", format!("{} files", progress.convertible))
                        };
                        ui.label(egui::RichText::new(caption).size(10.0).color(label_color));
                        ui.label(egui::RichText::new(headline).size(14.0).color(text_color));
                    });

                    if !complete {
                        ui.add_space(16.0);
                        self.render_format_picker(ui, converting);
                        ui.add_space(8.0);
                        self.render_quality_picker(ui, converting, settings.default_quality, label_color);
                    }
                });

                if converting && has_convertible {
                    ui.add_space(8.0);
                    ui.add(
                        egui::ProgressBar::new(progress.fraction())
                            .fill(ColorPalette::GREEN_500)
                            .text(progress.label()),
                    );
                }

                ui.add_space(12.0);
                ui.horizontal(|ui| {
                    let label = if converting {
                        "Converting..."
                    } else if complete {
                        "Done!"
                    } else {
                        "Start Conversion"
                    };
                    let enabled = !converting && (complete || has_convertible);

                    let clicked = ui
                        .add_enabled_ui(enabled, |ui| style::primary_button(ui, label, theme))
                        .inner
                        .clicked();
                    if clicked {
                        if complete {
                            self.reset();
                        } else {
                            self.start_conversion(settings);
                        }
                    }

                    if complete && style::secondary_button(ui, "Open output folder", theme).clicked() {
                        ic_shell::open_output_folder(&settings.output_path);
                    }
                });
            });
    }

    fn render_format_picker(&mut self, ui: &mut egui::Ui, disabled: bool) {
        let mut selected = self.target_format;
        ui.add_enabled_ui(!disabled, |ui| {
            egui::ComboBox::from_id_salt("target_format")
                .selected_text(format!("To {}", selected.as_str()))
                .show_ui(ui, |ui| {
                    for format in TargetFormat::all() {
                        ui.selectable_value(&mut selected, format, format.as_str());
                    }
                });
        });
        if selected != self.target_format {
            self.set_target_format(selected);
        }
    }

    fn render_quality_picker(&mut self, ui: &mut egui::Ui, disabled: bool, default_quality: u8, label_color: egui::Color32) {
        let target = self.target_format;
        let mut lossless = self.quality.lossless();
        let mut quality = self.quality.quality();

        ui.add_enabled_ui(!disabled, |ui| {
            ui.vertical(|ui| {
                ui.horizontal(|ui| {
                    ui.add_enabled(target.supports_lossless(), egui::Checkbox::new(&mut lossless, "Lossless"))
                        .on_disabled_hover_text("Lossless is not available for JPEG.");
                    ui.add_enabled(!lossless, egui::Slider::new(&mut quality, 1..=100).text("Quality"));
                });

                let hint = if lossless {
                    "Lossless conversion ignores the quality slider for this batch.".to_string()
                } else {
                    format!("Adjusting here applies only to this conversion batch. Default is {}.", default_quality)
                };
                ui.label(egui::RichText::new(hint).size(10.0).color(label_color));
            });
        });

        self.quality.set_lossless(lossless, target);
        self.quality.set_quality(quality);
    }
}

fn status_color(status: &FileStatus) -> egui::Color32 {
    match status {
        FileStatus::Idle => ColorPalette::ZINC_500,
        FileStatus::Converting => ColorPalette::AMBER_500,
        FileStatus::Success => ColorPalette::GREEN_500,
        FileStatus::Error(_) => ColorPalette::RED_500,
    }
}
