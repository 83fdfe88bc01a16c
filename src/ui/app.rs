// Main UI App - Metronome window

use crate::feedback::IndicatorState;
use crate::messaging::channels::NotificationConsumer;
use crate::messaging::notification::{Notification, NotificationCategory, NotificationLevel};
use crate::sequencer::click::Timbre;
use crate::sequencer::metronome::{Metronome, TapReport};
use crate::sequencer::scheduler::AccentLevel;
use crate::sequencer::tap_tempo::TapStability;
use crate::sequencer::timeline::{Subdivision, Tempo, TimeSignature};
use crate::theme::Theme;
use eframe::egui;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

const BEAT_DOT_SIZE: f32 = 90.0;

pub struct MetronomeApp {
    metronome: Metronome,
    indicator: IndicatorState,
    /// Origin of the wall clock handed to the metronome
    started_at: Instant,
    bpm_text: String,
    audio_unlocked: bool,
    applied_theme: Option<Theme>,
    last_tap: Option<TapReport>,
    show_advanced: bool,
    // Notification system
    notification_rx: NotificationConsumer,
    notification_queue: VecDeque<Notification>,
    max_notifications: usize,
}

impl MetronomeApp {
    pub fn new(
        metronome: Metronome,
        indicator: IndicatorState,
        notification_rx: NotificationConsumer,
    ) -> Self {
        let bpm_text = metronome.tempo().bpm().to_string();

        Self {
            metronome,
            indicator,
            started_at: Instant::now(),
            bpm_text,
            audio_unlocked: false,
            applied_theme: None,
            last_tap: None,
            show_advanced: false,
            notification_rx,
            notification_queue: VecDeque::new(),
            max_notifications: 10,
        }
    }

    fn now(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Read pending notifications from the ringbuffer into the queue
    fn update_notifications(&mut self) {
        while let Some(notification) =
            ringbuf::traits::Consumer::try_pop(&mut self.notification_rx)
        {
            self.push_notification(notification);
        }
    }

    fn push_notification(&mut self, notification: Notification) {
        self.notification_queue.push_back(notification);
        if self.notification_queue.len() > self.max_notifications {
            self.notification_queue.pop_front();
        }
    }

    /// Notifications younger than 5 seconds, newest first
    fn get_recent_notifications(&self) -> Vec<&Notification> {
        self.notification_queue
            .iter()
            .rev()
            .filter(|n| n.is_recent(5000))
            .take(3)
            .collect()
    }

    fn toggle_playback(&mut self) {
        let now = self.now();
        if let Err(e) = self.metronome.toggle(now) {
            log::error!("Cannot start metronome: {}", e);
            self.push_notification(Notification::error(
                NotificationCategory::Audio,
                format!("Audio unavailable: {}", e),
            ));
        }
    }

    fn set_tempo(&mut self, bpm: i64) {
        let tempo = self.metronome.set_tempo(bpm);
        self.bpm_text = tempo.bpm().to_string();
    }

    fn apply_theme(&mut self, ctx: &egui::Context) {
        let theme = self.metronome.theme();
        if self.applied_theme != Some(theme) {
            ctx.set_visuals(match theme {
                Theme::Dark => egui::Visuals::dark(),
                Theme::Light => egui::Visuals::light(),
            });
            self.applied_theme = Some(theme);
        }
    }

    fn handle_input(&mut self, ctx: &egui::Context) {
        let (any_press, space) = ctx.input(|i| {
            (
                i.pointer.any_pressed() || !i.keys_down.is_empty(),
                i.key_pressed(egui::Key::Space),
            )
        });

        // Audio output may only start after a user gesture
        if any_press && !self.audio_unlocked {
            self.metronome.unlock_audio();
            self.audio_unlocked = true;
        }

        if space && !ctx.wants_keyboard_input() {
            self.toggle_playback();
        }
    }

    fn draw_tempo(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("−").clicked() {
                self.set_tempo(self.metronome.tempo().bpm() as i64 - 1);
            }

            let response = ui.add(egui::TextEdit::singleline(&mut self.bpm_text).desired_width(50.0));
            if response.lost_focus() {
                let tempo = Tempo::parse_lossy(&self.bpm_text);
                self.set_tempo(tempo.bpm() as i64);
            }
            ui.label("BPM");

            if ui.button("+").clicked() {
                self.set_tempo(self.metronome.tempo().bpm() as i64 + 1);
            }
        });

        let mut bpm = self.metronome.tempo().bpm() as i64;
        let slider = egui::Slider::new(&mut bpm, Tempo::MIN_BPM as i64..=Tempo::MAX_BPM as i64)
            .show_value(false);
        if ui.add(slider).changed() {
            self.set_tempo(bpm);
        }
    }

    fn draw_beat_indicator(&self, ui: &mut egui::Ui) {
        let (rect, _) =
            ui.allocate_exact_size(egui::vec2(BEAT_DOT_SIZE, BEAT_DOT_SIZE), egui::Sense::hover());
        let painter = ui.painter();
        let base = BEAT_DOT_SIZE * 0.3;

        if self.indicator.beat_active() {
            let (radius, color) = match self.indicator.accent() {
                AccentLevel::Strong => (base * 1.4, egui::Color32::from_rgb(255, 90, 90)),
                AccentLevel::Medium => (base * 1.2, egui::Color32::from_rgb(255, 165, 0)),
                AccentLevel::None => (base, egui::Color32::from_rgb(100, 150, 255)),
            };
            painter.circle_filled(rect.center(), radius, color);
        } else {
            painter.circle_stroke(
                rect.center(),
                base,
                egui::Stroke::new(2.0, ui.visuals().weak_text_color()),
            );
        }
    }

    fn draw_transport(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let label = if self.metronome.is_playing() {
                "⏹ Stop"
            } else {
                "▶ Play"
            };
            if ui.add(egui::Button::new(label).min_size(egui::vec2(100.0, 40.0))).clicked() {
                self.toggle_playback();
            }

            self.draw_beat_indicator(ui);

            ui.vertical(|ui| {
                ui.label(format!("Measure {}", self.indicator.measure().max(1)));
                ui.label(self.metronome.measure_label());
            });
        });
    }

    fn draw_sound_and_feedback(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Sound:");
            let mut timbre = self.metronome.timbre();
            egui::ComboBox::from_id_salt("timbre_selector")
                .selected_text(timbre.to_string())
                .show_ui(ui, |ui| {
                    for option in Timbre::ALL {
                        ui.selectable_value(&mut timbre, option, option.to_string());
                    }
                });
            if timbre != self.metronome.timbre() {
                self.metronome.set_timbre(timbre);
            }
        });

        ui.horizontal(|ui| {
            let mut vibration = self.metronome.feedback_settings().vibration_enabled;
            if ui.checkbox(&mut vibration, "Vibration").changed() {
                self.metronome.set_vibration_enabled(vibration);
            }
            let mut flash = self.metronome.feedback_settings().flash_enabled;
            if ui.checkbox(&mut flash, "Flash").changed() {
                self.metronome.set_flash_enabled(flash);
            }
        });
    }

    fn draw_tap_tempo(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.add(egui::Button::new("Tap").min_size(egui::vec2(80.0, 30.0))).clicked() {
                let report = self.metronome.tap(self.now());
                if report.applied {
                    self.bpm_text = self.metronome.tempo().bpm().to_string();
                }
                self.last_tap = Some(report);
            }
            if ui.button("Reset").clicked() {
                self.metronome.reset_taps();
                self.last_tap = None;
            }
        });

        if self.metronome.tap_count() == 0 {
            self.last_tap = None;
            ui.label("Tap at least twice");
            return;
        }

        let history = self.metronome.tap_history();
        if !history.is_empty() {
            let values: Vec<String> = history.iter().map(|bpm| bpm.to_string()).collect();
            ui.label(format!("Taps: {}", values.join(" · ")));
        }
        if let Some(average) = self.metronome.tap_average() {
            ui.label(format!("Average: {} BPM", average));
        }

        if let Some(report) = self.last_tap {
            if let (Some(bpm), false) = (report.candidate_bpm, report.applied) {
                ui.colored_label(
                    egui::Color32::from_rgb(255, 165, 0),
                    format!("{} BPM is out of range", bpm),
                );
            }
            if let Some(stability) = report.stability {
                let (text, color) = match stability {
                    TapStability::Good => ("Steady", egui::Color32::GREEN),
                    TapStability::Medium => ("Fairly steady", egui::Color32::from_rgb(255, 165, 0)),
                    TapStability::Poor => ("Irregular", egui::Color32::RED),
                };
                ui.colored_label(color, text);
            }
        }
    }

    fn draw_presets(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Presets");
            if ui.button("Save").on_hover_text("Save current tempo").clicked() {
                self.metronome.save_preset();
            }
        });

        let values = self.metronome.presets().values().to_vec();
        if values.is_empty() {
            ui.label("No presets saved");
            return;
        }

        ui.horizontal_wrapped(|ui| {
            for bpm in values {
                let selected = self.metronome.tempo().bpm() == bpm;
                if ui.selectable_label(selected, bpm.to_string()).clicked() {
                    self.set_tempo(bpm as i64);
                }
                if ui.small_button("✖").on_hover_text("Delete preset").clicked() {
                    self.metronome.delete_preset(bpm);
                }
            }
        });
    }

    fn draw_advanced(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Time signature:");
            for option in TimeSignature::ALL {
                let selected = self.metronome.time_signature() == option;
                if ui.selectable_label(selected, option.to_string()).clicked() {
                    self.metronome.set_time_signature(option);
                }
            }
        });

        ui.horizontal(|ui| {
            ui.label("Subdivision:");
            for option in Subdivision::ALL {
                let selected = self.metronome.subdivision() == option;
                if ui.selectable_label(selected, subdivision_label(option)).clicked() {
                    self.metronome.set_subdivision(option);
                }
            }
        });
    }

    fn draw_status_bar(&self, ui: &mut egui::Ui) {
        ui.separator();
        ui.horizontal(|ui| {
            let recent_notifications = self.get_recent_notifications();

            if recent_notifications.is_empty() {
                ui.label("Ready");
                return;
            }
            for notification in recent_notifications {
                let (icon, color) = match notification.level {
                    NotificationLevel::Info => ("ℹ", egui::Color32::from_rgb(100, 150, 255)),
                    NotificationLevel::Warning => ("⚠", egui::Color32::from_rgb(255, 165, 0)),
                    NotificationLevel::Error => ("✖", egui::Color32::RED),
                };
                ui.colored_label(color, icon);
                ui.colored_label(color, &notification.message);
                ui.add_space(10.0);
            }
        });
    }
}

fn subdivision_label(subdivision: Subdivision) -> &'static str {
    match subdivision {
        Subdivision::None => "None",
        Subdivision::Eighth => "Eighths",
        Subdivision::Triplet => "Triplets",
        Subdivision::Sixteenth => "Sixteenths",
    }
}

impl eframe::App for MetronomeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_input(ctx);

        // Drive every pending timer of the metronome
        let now = self.now();
        self.metronome.poll(now);

        self.update_notifications();
        self.apply_theme(ctx);

        let mut frame = egui::Frame::central_panel(&ctx.style());
        if self.indicator.flash_active() {
            frame = frame.fill(ctx.style().visuals.selection.bg_fill);
        }

        egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("MyMusic Metronome");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let icon = match self.metronome.theme() {
                        Theme::Dark => "☀",
                        Theme::Light => "🌙",
                    };
                    if ui.button(icon).on_hover_text("Toggle theme").clicked() {
                        self.metronome.toggle_theme();
                    }
                });
            });
            ui.separator();

            self.draw_tempo(ui);
            ui.add_space(10.0);
            self.draw_transport(ui);
            ui.add_space(10.0);
            ui.separator();

            self.draw_sound_and_feedback(ui);
            ui.add_space(10.0);
            ui.separator();

            self.draw_tap_tempo(ui);
            ui.add_space(10.0);
            ui.separator();

            self.draw_presets(ui);
            ui.add_space(10.0);

            ui.checkbox(&mut self.show_advanced, "Advanced");
            if self.show_advanced {
                self.draw_advanced(ui);
            }

            ui.add_space(10.0);
            self.draw_status_bar(ui);
        });

        // Repaint in time for the next scheduler tick or feedback edge
        if let Some(due) = self.metronome.next_wakeup() {
            ctx.request_repaint_after(due.saturating_sub(self.now()));
        }
    }
}
