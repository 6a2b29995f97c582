use std::time::{Duration, Instant};

use anyhow::Result;
use crossbeam_channel::{Receiver, TryRecvError};
use eframe::egui::{
    self, Align, Color32, ComboBox, Layout, RichText, Slider, Stroke, TextEdit, TextStyle,
    TopBottomPanel, Ui,
};

use crate::controller::{ClockController, HEX_SLIDER_MAX, MINUTE_SLIDER_MAX};
use crate::florence::{annotate, encode_default};
use crate::time_provider::{SelectedTimeSource, TICK_INTERVAL};
use crate::zone::detect::LocalZoneHint;
use crate::zone::table::{LoadedTable, TableSource, TimezoneTable, spawn_table_load};

// Terracotta and parchment.
const INK: Color32 = Color32::from_rgb(58, 42, 32);
const PARCHMENT: Color32 = Color32::from_rgb(244, 235, 214);
const VELLUM: Color32 = Color32::from_rgb(252, 247, 235);
const SANDSTONE: Color32 = Color32::from_rgb(226, 208, 174);
const CLOCK_MAIN: Color32 = Color32::from_rgb(176, 72, 40);
const ACCENT: Color32 = Color32::from_rgb(62, 104, 86);
const MUTED: Color32 = Color32::from_rgb(126, 108, 90);
const WARN: Color32 = Color32::from_rgb(184, 104, 16);
const OK: Color32 = Color32::from_rgb(58, 122, 64);

pub fn run_gui(
    selected_source: SelectedTimeSource,
    table_source: TableSource,
    hint: LocalZoneHint,
) -> Result<()> {
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Florence Hexadecimal Mean Time")
            .with_inner_size([980.0, 640.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    let pending_table = spawn_table_load(table_source.clone());
    let app = FlorenceClockApp::new(selected_source, table_source, hint, pending_table)?;

    eframe::run_native(
        "Florence Clock",
        native_options,
        Box::new(move |cc| {
            configure_theme(&cc.egui_ctx);
            Ok(Box::new(app))
        }),
    )
    .map_err(|err| anyhow::anyhow!("failed to launch Florence clock window: {err}"))?;

    Ok(())
}

fn configure_theme(ctx: &egui::Context) {
    ctx.style_mut(|style| {
        let visuals = &mut style.visuals;
        *visuals = egui::Visuals::light();
        visuals.override_text_color = Some(INK);
        visuals.panel_fill = PARCHMENT;
        visuals.window_fill = VELLUM;
        visuals.extreme_bg_color = VELLUM;
        visuals.faint_bg_color = SANDSTONE;
        for (widget, fill) in [
            (&mut visuals.widgets.inactive, SANDSTONE),
            (&mut visuals.widgets.hovered, SANDSTONE.gamma_multiply(0.85)),
            (&mut visuals.widgets.active, CLOCK_MAIN.gamma_multiply(0.6)),
        ] {
            widget.bg_fill = fill;
            widget.weak_bg_fill = fill;
        }
        visuals.selection.bg_fill = CLOCK_MAIN.gamma_multiply(0.35);
        visuals.selection.stroke = Stroke::new(1.0, CLOCK_MAIN);
        visuals.hyperlink_color = CLOCK_MAIN;

        style.spacing.item_spacing = egui::vec2(10.0, 8.0);
        style.spacing.slider_rail_height = 6.0;
    });
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum EditedField {
    HexText,
    TimeText,
}

struct FlorenceClockApp {
    selected_source: SelectedTimeSource,
    table_source: TableSource,
    controller: ClockController,
    hint: LocalZoneHint,
    pending_table: Option<Receiver<LoadedTable>>,
    fallback_reason: Option<String>,
    clock_text: String,
    next_tick: Instant,
    hex_input: String,
    time_input: String,
    status_message: Option<(String, Instant)>,
}

impl FlorenceClockApp {
    fn new(
        selected_source: SelectedTimeSource,
        table_source: TableSource,
        hint: LocalZoneHint,
        pending_table: Receiver<LoadedTable>,
    ) -> Result<Self> {
        let sample = selected_source.source.now()?;
        // Until the table arrives everything is relative to UTC.
        let controller = ClockController::new(TimezoneTable::fallback(), 0);
        let snapshot = controller.snapshot();
        Ok(Self {
            selected_source,
            table_source,
            controller,
            hint,
            pending_table: Some(pending_table),
            fallback_reason: None,
            clock_text: encode_default(sample.day_fraction()),
            next_tick: Instant::now() + TICK_INTERVAL,
            hex_input: snapshot.hex_text,
            time_input: snapshot.time_text,
            status_message: None,
        })
    }

    fn set_status(&mut self, text: impl Into<String>, ttl: Duration) {
        self.status_message = Some((text.into(), Instant::now() + ttl));
    }

    fn tick(&mut self) -> Result<()> {
        let now = Instant::now();
        if now < self.next_tick {
            return Ok(());
        }
        let sample = self.selected_source.source.now()?;
        self.clock_text = encode_default(sample.day_fraction());
        while self.next_tick <= now {
            self.next_tick += TICK_INTERVAL;
        }
        Ok(())
    }

    fn poll_table(&mut self) {
        let received = match &self.pending_table {
            Some(receiver) => receiver.try_recv(),
            None => return,
        };
        match received {
            Ok(loaded) => {
                self.pending_table = None;
                let count = loaded.table.len();
                self.controller.install_table(loaded.table, &self.hint);
                self.sync_inputs(None);
                match loaded.fallback_reason {
                    Some(reason) => {
                        self.set_status(
                            "Timezone table unavailable, UTC only.",
                            Duration::from_secs(6),
                        );
                        self.fallback_reason = Some(reason);
                    }
                    None => self.set_status(
                        format!("Loaded {count} timezones."),
                        Duration::from_secs(3),
                    ),
                }
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                log::warn!("timezone loader exited without a table");
                self.pending_table = None;
            }
        }
    }

    /// Re-derives the text buffers from canonical state, leaving the field
    /// being typed into alone.
    fn sync_inputs(&mut self, editing: Option<EditedField>) {
        let snapshot = self.controller.snapshot();
        if editing != Some(EditedField::HexText) {
            self.hex_input = snapshot.hex_text;
        }
        if editing != Some(EditedField::TimeText) {
            self.time_input = snapshot.time_text;
        }
    }

    fn show_clock(&self, ui: &mut Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(12.0);
            ui.label(RichText::new("it is currently").size(22.0).color(MUTED));
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                let digits_width = self.clock_text.len() as f32 * 46.0;
                ui.add_space(((ui.available_width() - digits_width) / 2.0).max(0.0));
                for (ch, unit) in annotate(&self.clock_text) {
                    let response = ui.label(
                        RichText::new(ch.to_string())
                            .size(76.0)
                            .monospace()
                            .strong()
                            .color(CLOCK_MAIN),
                    );
                    if let Some(unit) = unit {
                        let detail = if unit.per_day > 1 {
                            format!(
                                "{}\n\n{}: {} per day, {:.3} SI seconds each",
                                unit.explanation,
                                unit.name,
                                unit.per_day,
                                unit.si_seconds()
                            )
                        } else {
                            unit.explanation.to_string()
                        };
                        response.on_hover_text(detail);
                    }
                }
            });
            ui.add_space(8.0);
            ui.label(
                RichText::new("Universal Florence Hexadecimal Mean Time")
                    .size(20.0)
                    .color(ACCENT),
            );
        });
    }

    fn show_about(&self, ui: &mut Ui) {
        for (heading, body) in [
            ("why hexadecimal time?", "good reasons to follow."),
            ("why universal time?", "i'll tell you later."),
            ("why Florence?", "arbitrary decisions need to be bold."),
        ] {
            ui.label(RichText::new(heading).size(18.0).strong().color(ACCENT));
            ui.label(body);
            ui.add_space(6.0);
        }
    }

    fn show_conversion(&mut self, ui: &mut Ui) {
        ui.heading(RichText::new("convert to/from your local time").color(ACCENT));
        ui.add_space(6.0);
        let snapshot = self.controller.snapshot();
        let track_width = ui.available_width();

        ui.horizontal(|ui| {
            let offset = track_width * (snapshot.hex_position_percent as f32 / 100.0) - 24.0;
            ui.add_space(offset.clamp(0.0, (track_width - 56.0).max(0.0)));
            let response = ui.add(
                TextEdit::singleline(&mut self.hex_input)
                    .char_limit(3)
                    .desired_width(48.0)
                    .font(TextStyle::Monospace),
            );
            if response.changed() {
                match self.controller.on_hex_text_edit(&self.hex_input) {
                    Ok(_) => self.sync_inputs(Some(EditedField::HexText)),
                    Err(err) => log::debug!("ignored hex edit: {err}"),
                }
            }
            if response.lost_focus() {
                self.sync_inputs(None);
            }
        });

        let mut hex_slider = snapshot.hex_slider;
        ui.spacing_mut().slider_width = track_width;
        if ui
            .add(Slider::new(&mut hex_slider, 0..=HEX_SLIDER_MAX).show_value(false))
            .changed()
        {
            match self.controller.on_hex_slider_drag(hex_slider) {
                Ok(_) => self.sync_inputs(None),
                Err(err) => log::debug!("ignored hex slider: {err}"),
            }
        }

        ui.vertical_centered(|ui| {
            ui.label(RichText::new("↕").size(24.0).color(MUTED));
        });

        let mut minute_slider = snapshot.minute_slider;
        if ui
            .add(Slider::new(&mut minute_slider, 0..=MINUTE_SLIDER_MAX).show_value(false))
            .changed()
        {
            match self.controller.on_minute_slider_drag(minute_slider) {
                Ok(_) => self.sync_inputs(None),
                Err(err) => log::debug!("ignored minute slider: {err}"),
            }
        }

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            ui.label(RichText::new("UTC").color(MUTED));
            let response = ui.add(
                TextEdit::singleline(&mut self.time_input)
                    .char_limit(5)
                    .desired_width(72.0)
                    .hint_text("HH:MM")
                    .font(TextStyle::Monospace),
            );
            if response.changed() {
                match self.controller.on_time_widget_edit(&self.time_input) {
                    Ok(_) => self.sync_inputs(Some(EditedField::TimeText)),
                    Err(err) => log::debug!("ignored time edit: {err}"),
                }
            }
            if response.lost_focus() {
                self.sync_inputs(None);
            }
        });

        ui.add_space(6.0);
        let mut selected = snapshot.timezone_index;
        ComboBox::from_id_salt("timezone_select")
            .width(track_width)
            .selected_text(snapshot.timezone_label.clone())
            .show_ui(ui, |ui| {
                for (index, entry) in self.controller.table().entries().iter().enumerate() {
                    ui.selectable_value(&mut selected, index, entry.label());
                }
            });
        if selected != snapshot.timezone_index {
            match self.controller.on_timezone_select(selected) {
                Ok(()) => self.sync_inputs(None),
                Err(err) => self.set_status(format!("{err}"), Duration::from_secs(3)),
            }
        }

        if self.pending_table.is_some() {
            ui.label(RichText::new("loading timezones…").color(MUTED));
        }
    }

    fn show_footer(&self, ui: &mut Ui) {
        ui.horizontal_wrapped(|ui| {
            ui.label(RichText::new("a service provided by the").color(MUTED));
            ui.hyperlink_to("Futile Software Corporation", "https://thiswasyouridea.com");
            ui.separator();
            ui.label(
                RichText::new(format!(
                    "Source: {} | Zones: {} | Local: {}",
                    self.selected_source.label,
                    self.table_source.describe(),
                    self.hint.describe()
                ))
                .color(MUTED),
            );
            if let Some(reason) = self.fallback_reason.as_deref() {
                ui.separator();
                ui.label(RichText::new(format!("Fallback: {reason}")).color(WARN));
            }
            if let Some((msg, _)) = &self.status_message {
                ui.separator();
                ui.label(RichText::new(msg).color(OK).strong());
            }
        });
    }
}

impl eframe::App for FlorenceClockApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self
            .status_message
            .as_ref()
            .is_some_and(|(_, expires)| Instant::now() >= *expires)
        {
            self.status_message = None;
        }

        self.poll_table();
        if let Err(err) = self.tick() {
            self.set_status(format!("Clock error: {err}"), Duration::from_secs(4));
        }

        TopBottomPanel::bottom("footer")
            .resizable(false)
            .show(ctx, |ui| self.show_footer(ui));

        egui::SidePanel::right("about_panel")
            .resizable(true)
            .min_width(220.0)
            .default_width(260.0)
            .show(ctx, |ui| self.show_about(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.with_layout(Layout::top_down(Align::Min), |ui| {
                self.show_clock(ui);
                ui.separator();
                ui.add_space(8.0);
                self.show_conversion(ui);
            });
        });

        let wait = self.next_tick.saturating_duration_since(Instant::now());
        let wait = if self.pending_table.is_some() {
            wait.min(Duration::from_millis(50))
        } else {
            wait
        };
        ctx.request_repaint_after(wait);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_uses_light_florence_palette() {
        let ctx = egui::Context::default();
        configure_theme(&ctx);
        let style = ctx.style();
        assert!(!style.visuals.dark_mode);
        assert_eq!(style.visuals.panel_fill, PARCHMENT);
        assert_eq!(style.visuals.override_text_color, Some(INK));
        assert_eq!(style.visuals.widgets.inactive.bg_fill, SANDSTONE);
        assert_eq!(style.visuals.hyperlink_color, CLOCK_MAIN);
    }
}
