use std::sync::Arc;
use std::time::Instant;

use chrono::{Datelike, Local, NaiveDate};
use eframe::{egui, App, CreationContext, Frame};
use egui::{Align, Align2, Color32, Layout, RichText, ScrollArea, TextEdit, Ui};
use egui_extras::{Column, DatePickerButton, TableBuilder};
use egui_plot::{Legend, Line, Plot, PlotPoints, Points};

use crate::api::{date_segment, Backend};
use crate::calendar::{month_grid, workout_count, WEEKDAYS};
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::models::Progression;
use crate::progression::{build_series, chart_data, day_label, table_rows, Metric};
use crate::refresh::{Dispatcher, Mutation};
use crate::render::{format_number, ExerciseBlock, TemplateView, WorkoutView, NO_EXERCISES};
use crate::session::Session;
use crate::state::{Followup, Loadable, ViewState};
use crate::templates::parse_exercise_list;
use crate::timer::{TimerController, ADJUST_STEP_SECS};

const SERIES_COLORS: [Color32; 4] = [
    Color32::BLUE,
    Color32::RED,
    Color32::GREEN,
    Color32::from_rgb(230, 150, 30),
];

pub fn configure_style(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();
    style.text_styles.insert(
        egui::TextStyle::Body,
        egui::FontId::new(20.0, egui::FontFamily::Proportional),
    );
    style.text_styles.insert(
        egui::TextStyle::Button,
        egui::FontId::new(20.0, egui::FontFamily::Proportional),
    );
    style.text_styles.insert(
        egui::TextStyle::Heading,
        egui::FontId::new(32.0, egui::FontFamily::Proportional),
    );
    ctx.set_style(style);
}

#[derive(PartialEq, Clone, Copy)]
enum DisplayMode {
    Log,
    Templates,
    Calendar,
    Progress,
    Timer,
}

pub struct WorkoutApp {
    state: ViewState,
    dispatcher: Dispatcher,
    timer: TimerController,
    presets: Vec<u32>,
    display_mode: DisplayMode,
}

impl WorkoutApp {
    pub fn new(
        cc: &CreationContext,
        config: &AppConfig,
        session: Session,
        backend: Arc<dyn Backend>,
    ) -> Self {
        let ctx = cc.egui_ctx.clone();
        let dispatcher = Dispatcher::new(backend).with_waker(move || ctx.request_repaint());
        let presets = config.presets();

        let mut app = WorkoutApp {
            state: ViewState::new(session, Local::now().date_naive()),
            dispatcher,
            timer: TimerController::new(presets[0]),
            presets,
            display_mode: DisplayMode::Log,
        };

        if app.state.session.is_authenticated() {
            app.load_main_view();
        }
        app
    }

    fn load_main_view(&mut self) {
        self.refresh_workouts();
        self.state.templates = TemplateView::Loading;
        self.dispatcher.load_templates();
    }

    fn refresh_workouts(&mut self) {
        self.state.workouts = WorkoutView::Loading;
        self.dispatcher.load_workouts(self.state.selected_date);
    }

    fn load_calendar(&mut self) {
        self.state.calendar = Loadable::Loading;
        let cursor = self.state.calendar_cursor;
        self.dispatcher.load_calendar(cursor.year(), cursor.month());
    }

    fn submit_credentials(&mut self, register: bool) {
        if let Some(credentials) = self.state.submit_credentials() {
            if register {
                self.dispatcher.register(credentials);
            } else {
                self.dispatcher.login(credentials);
            }
        }
    }

    fn mutate(&self, mutation: Option<Mutation>) {
        if let Some(mutation) = mutation {
            self.dispatcher.mutate(mutation);
        }
    }

    fn set_display_mode(&mut self, mode: DisplayMode) {
        self.display_mode = mode;
        if mode == DisplayMode::Calendar && matches!(self.state.calendar, Loadable::Idle) {
            self.load_calendar();
        }
    }
}

impl App for WorkoutApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        for outcome in self.dispatcher.drain() {
            if self.state.apply_outcome(outcome) == Followup::LoadMainView {
                self.load_main_view();
            }
        }

        let now = Instant::now();
        self.timer.poll(now);
        if let Some(wait) = self.timer.time_until_next_tick(now) {
            ctx.request_repaint_after(wait);
        }

        let enabled = self.state.alerts.is_empty();
        if !self.state.session.is_authenticated() {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.add_enabled_ui(enabled, |ui| self.show_login(ui));
            });
            self.show_alert_window(ctx);
            return;
        }

        egui::TopBottomPanel::top("mini-timer").show(ctx, |ui| {
            ui.add_enabled_ui(enabled, |ui| self.show_top_bar(ui));
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(enabled, |ui| {
                ui.horizontal(|ui| {
                    for (mode, label) in [
                        (DisplayMode::Log, "Workout Log"),
                        (DisplayMode::Templates, "Templates"),
                        (DisplayMode::Calendar, "Calendar"),
                        (DisplayMode::Progress, "Progress"),
                        (DisplayMode::Timer, "Timer"),
                    ] {
                        if ui.selectable_label(self.display_mode == mode, label).clicked() {
                            self.set_display_mode(mode);
                        }
                    }
                });

                ui.add_space(10.0);

                match self.display_mode {
                    DisplayMode::Log => self.show_log(ui),
                    DisplayMode::Templates => self.show_templates(ui),
                    DisplayMode::Calendar => self.show_calendar(ui),
                    DisplayMode::Progress => self.show_progress(ui),
                    DisplayMode::Timer => self.show_timer(ui),
                }
            });
        });

        self.show_alert_window(ctx);
    }
}

impl WorkoutApp {
    fn show_alert_window(&mut self, ctx: &egui::Context) {
        let Some(message) = self.state.alerts.front().cloned() else {
            return;
        };
        let mut dismissed = false;
        egui::Window::new("Notice")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message.as_str());
                ui.add_space(8.0);
                if ui.button("OK").clicked() || ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    dismissed = true;
                }
            });
        if dismissed {
            self.state.alerts.pop_front();
        }
    }

    fn show_login(&mut self, ui: &mut Ui) {
        ui.with_layout(Layout::top_down(Align::Center), |ui| {
            ui.add_space(80.0);
            ui.label(RichText::new("Workout Tracker").heading().size(40.0).strong());
            ui.add_space(20.0);
            ui.add(TextEdit::singleline(&mut self.state.login.username).hint_text("Username"));
            ui.add(
                TextEdit::singleline(&mut self.state.login.password)
                    .hint_text("Password")
                    .password(true),
            );
            ui.add_space(10.0);
            let ready = !self.state.login.pending;
            if ui.add_enabled(ready, egui::Button::new("Login")).clicked() {
                self.submit_credentials(false);
            }
            if ui.add_enabled(ready, egui::Button::new("Register")).clicked() {
                self.submit_credentials(true);
            }
            if self.state.login.pending {
                ui.spinner();
            }
            ui.add_space(10.0);
            ui.label(self.state.login.message.as_str());
        });
    }

    fn show_top_bar(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.label(RichText::new("Workout Tracker").size(24.0).strong());
            ui.add_space(20.0);
            ui.label(RichText::new(self.timer.mini().text.as_str()).monospace().size(24.0));
            if ui.button(self.timer.mini().button).clicked() {
                self.timer.toggle();
            }
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if ui.button("Logout").clicked() {
                    self.state.logout();
                }
            });
        });
    }

    fn show_log(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.label("Date:");
            if ui.add(DatePickerButton::new(&mut self.state.selected_date)).changed() {
                self.refresh_workouts();
            }
            if ui.button("View Workouts").clicked() {
                self.refresh_workouts();
            }
        });

        ui.horizontal(|ui| {
            ui.add(TextEdit::singleline(&mut self.state.new_exercise_name).hint_text("Exercise name"));
            if ui.button("Add Exercise").clicked() {
                let mutation = self.state.add_exercise();
                self.mutate(mutation);
            }
        });

        ui.horizontal(|ui| {
            let selected = self
                .state
                .selected_template
                .clone()
                .unwrap_or_else(|| "No templates".to_string());
            egui::ComboBox::from_label("Template")
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    for name in &self.state.template_names {
                        ui.selectable_value(&mut self.state.selected_template, Some(name.clone()), name.as_str());
                    }
                });
            if ui.button("Apply Template").clicked() {
                let mutation = self.state.apply_template();
                self.mutate(mutation);
            }
        });

        ui.separator();

        let date = self.state.workouts_date;
        let mut pending = Vec::new();
        let mut problem = None;
        ScrollArea::vertical().show(ui, |ui| {
            ui.label(RichText::new(format!("Workouts for {}", date_segment(date))).heading());
            match &mut self.state.workouts {
                WorkoutView::Loading => {
                    ui.spinner();
                }
                WorkoutView::Empty => {
                    ui.label(NO_EXERCISES);
                }
                WorkoutView::Error(message) => {
                    ui.label(RichText::new(message.as_str()).color(Color32::RED));
                }
                WorkoutView::Exercises(blocks) => {
                    for block in blocks.iter_mut() {
                        show_exercise_block(ui, block, date, &mut pending, &mut problem);
                        ui.add_space(10.0);
                    }
                }
            }
        });

        for mutation in pending {
            self.dispatcher.mutate(mutation);
        }
        if let Some(err) = problem {
            self.state.alert(err.to_string());
        }
    }

    fn show_templates(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Create Template").heading());
        ui.horizontal(|ui| {
            ui.add(TextEdit::singleline(&mut self.state.new_template.name).hint_text("Template name"));
            ui.add(
                TextEdit::singleline(&mut self.state.new_template.exercises)
                    .hint_text("Exercises, comma separated")
                    .desired_width(400.0),
            );
            if ui.button("Create Template").clicked() {
                let mutation = self.state.create_template();
                self.mutate(mutation);
            }
        });

        ui.separator();
        ui.label(RichText::new("Templates").heading());

        let mut pending = Vec::new();
        ScrollArea::vertical().show(ui, |ui| match &mut self.state.templates {
            TemplateView::Loading => {
                ui.spinner();
            }
            TemplateView::Error(message) => {
                ui.label(RichText::new(message.as_str()).color(Color32::RED));
            }
            TemplateView::Rows(rows) if rows.is_empty() => {
                ui.label("No templates yet.");
            }
            TemplateView::Rows(rows) => {
                for row in rows.iter_mut() {
                    egui::Frame::group(ui.style()).show(ui, |ui| {
                        ui.set_width(ui.available_width());
                        ui.label(RichText::new(row.name.as_str()).size(24.0).strong());
                        ui.horizontal(|ui| {
                            let width = ui.available_width() * 0.7;
                            ui.add(TextEdit::singleline(&mut row.exercises_input).desired_width(width));
                            if ui.button("Save").clicked() {
                                pending.push(Mutation::EditTemplate {
                                    name: row.name.clone(),
                                    exercises: parse_exercise_list(&row.exercises_input),
                                });
                            }
                            let delete = egui::Button::new(RichText::new("Delete").color(Color32::WHITE))
                                .fill(Color32::RED);
                            if ui.add(delete).clicked() {
                                pending.push(Mutation::DeleteTemplate {
                                    name: row.name.clone(),
                                });
                            }
                        });
                    });
                    ui.add_space(10.0);
                }
            }
        });

        for mutation in pending {
            self.dispatcher.mutate(mutation);
        }
    }

    fn show_calendar(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            if ui.button("<").clicked() {
                self.state.calendar_cursor = self.state.calendar_cursor.previous();
                self.load_calendar();
            }
            ui.label(RichText::new(self.state.calendar_cursor.title()).size(28.0).strong());
            if ui.button(">").clicked() {
                self.state.calendar_cursor = self.state.calendar_cursor.next();
                self.load_calendar();
            }
            if ui.button("Refresh").clicked() {
                self.load_calendar();
            }
        });
        ui.add_space(10.0);

        let mut picked = None;
        match &self.state.calendar {
            Loadable::Idle | Loadable::Loading => {
                ui.spinner();
            }
            Loadable::Failed(message) => {
                ui.label(RichText::new(message.as_str()).color(Color32::RED));
            }
            Loadable::Loaded(calendar) => {
                ui.label(format!("{} workout days this month", workout_count(&calendar.days)));
                let weeks = month_grid(self.state.calendar_cursor, &calendar.days);
                egui::Grid::new("calendar-grid")
                    .spacing([12.0, 12.0])
                    .show(ui, |ui| {
                        for weekday in WEEKDAYS {
                            ui.label(RichText::new(weekday).strong());
                        }
                        ui.end_row();
                        for week in &weeks {
                            for cell in week {
                                match cell {
                                    Some(cell) => {
                                        let mut text = RichText::new(cell.date.day().to_string());
                                        if cell.worked_out {
                                            text = text.color(Color32::GREEN).strong();
                                        }
                                        if cell.date == self.state.selected_date {
                                            text = text.underline();
                                        }
                                        if ui.button(text).clicked() {
                                            picked = Some(cell.date);
                                        }
                                    }
                                    None => {
                                        ui.label("");
                                    }
                                }
                            }
                            ui.end_row();
                        }
                    });
            }
        }

        if let Some(date) = picked {
            self.state.selected_date = date;
            self.display_mode = DisplayMode::Log;
            self.refresh_workouts();
        }
    }

    fn show_progress(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.add(TextEdit::singleline(&mut self.state.progression_input).hint_text("Exercise name"));
            if ui.button("Load").clicked() {
                if let Some(exercise) = self.state.progression_request() {
                    self.dispatcher.load_progression(exercise);
                }
            }
        });
        ui.horizontal(|ui| {
            for metric in Metric::ALL {
                ui.selectable_value(&mut self.state.progression_metric, metric, metric.label());
            }
        });
        ui.add_space(10.0);

        match &self.state.progression {
            Loadable::Idle => {
                ui.label("Enter an exercise to chart its progression.");
            }
            Loadable::Loading => {
                ui.spinner();
            }
            Loadable::Failed(message) => {
                ui.label(RichText::new(message.as_str()).color(Color32::RED));
            }
            Loadable::Loaded(progression) if progression.set_data.is_empty() => {
                ui.label(format!("No sets logged for {}.", progression.exercise_name));
            }
            Loadable::Loaded(progression) => {
                ui.label(RichText::new(progression.exercise_name.as_str()).heading());
                show_chart(ui, progression, self.state.progression_metric);
                ui.add_space(10.0);
                show_progress_table(ui, progression);
            }
        }
    }

    fn show_timer(&mut self, ui: &mut Ui) {
        ui.with_layout(Layout::top_down(Align::Center), |ui| {
            ui.add_space(40.0);
            ui.label(
                RichText::new(self.timer.primary().text.as_str())
                    .heading()
                    .size(100.0)
                    .strong(),
            );
            ui.add_space(20.0);
            ui.horizontal(|ui| {
                if ui.button(self.timer.primary().button).clicked() {
                    self.timer.toggle();
                }
                if ui.button("Reset").clicked() {
                    self.timer.reset();
                }
                if ui.button("-15s").clicked() {
                    self.timer.adjust(-ADJUST_STEP_SECS);
                }
                if ui.button("+15s").clicked() {
                    self.timer.adjust(ADJUST_STEP_SECS);
                }
            });
            ui.add_space(10.0);
            ui.horizontal(|ui| {
                for preset in &self.presets {
                    if ui.button(preset_label(*preset)).clicked() {
                        self.timer.set_preset(*preset);
                    }
                }
            });
        });
    }
}

fn show_exercise_block(
    ui: &mut Ui,
    block: &mut ExerciseBlock,
    date: NaiveDate,
    pending: &mut Vec<Mutation>,
    problem: &mut Option<ApiError>,
) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.horizontal(|ui| {
            ui.label(RichText::new(block.title.as_str()).size(28.0).strong());
            if ui.button("Delete Exercise").clicked() {
                pending.push(Mutation::DeleteExercise {
                    date,
                    exercise: block.title.clone(),
                });
            }
        });

        for (index, line) in block.set_lines.iter().enumerate() {
            ui.horizontal(|ui| {
                ui.label(line.as_str());
                if ui.button("Delete Set").clicked() {
                    pending.push(Mutation::DeleteSet {
                        date,
                        exercise: block.title.clone(),
                        index,
                    });
                }
            });
        }

        ui.horizontal(|ui| {
            ui.add(
                TextEdit::singleline(&mut block.weight_input)
                    .hint_text("Weight")
                    .desired_width(90.0),
            );
            ui.add(
                TextEdit::singleline(&mut block.reps_input)
                    .hint_text("Reps")
                    .desired_width(90.0),
            );
            if ui.button("Add Set").clicked() {
                match block.take_set_input() {
                    Ok(set) => pending.push(Mutation::AddSet {
                        date,
                        exercise: block.title.clone(),
                        set,
                    }),
                    Err(err) => *problem = Some(err),
                }
            }
        });
    });
}

fn show_chart(ui: &mut Ui, progression: &Progression, metric: Metric) {
    let Some(chart) = chart_data(&build_series(progression, metric)) else {
        return;
    };
    let origin = chart.origin;
    Plot::new("progression-chart")
        .height(280.0)
        .legend(Legend::default())
        .allow_scroll(false)
        .y_axis_label(metric.label())
        .x_axis_formatter(move |mark, _range| day_label(origin, mark.value))
        .label_formatter(move |name, value| {
            if name.is_empty() {
                return String::new();
            }
            format!("{}\n{}: {}", name, day_label(origin, value.x.round()), format_number(value.y))
        })
        .show(ui, |plot_ui| {
            for (i, line) in chart.lines.iter().enumerate() {
                let color = SERIES_COLORS[i % SERIES_COLORS.len()];
                plot_ui.line(
                    Line::new(PlotPoints::from(line.points.clone()))
                        .name(&line.label)
                        .color(color)
                        .width(2.0),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from(line.points.clone()))
                        .name(&line.label)
                        .color(color)
                        .radius(4.0),
                );
            }
        });
}

fn show_progress_table(ui: &mut Ui, progression: &Progression) {
    let rows = table_rows(progression);
    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto().at_least(120.0))
        .column(Column::auto().at_least(60.0))
        .column(Column::auto().at_least(90.0))
        .column(Column::auto().at_least(70.0))
        .column(Column::remainder())
        .header(26.0, |mut header| {
            for title in ["Date", "Set", "Weight", "Reps", "Volume"] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for row in &rows {
                body.row(24.0, |mut table_row| {
                    table_row.col(|ui| {
                        ui.label(row.point.date.as_str());
                    });
                    table_row.col(|ui| {
                        ui.label(row.set_number.to_string());
                    });
                    table_row.col(|ui| {
                        ui.label(format!("{} kg", format_number(row.point.weight)));
                    });
                    table_row.col(|ui| {
                        ui.label(format_number(row.point.reps));
                    });
                    table_row.col(|ui| {
                        ui.label(format_number(row.point.volume));
                    });
                });
            }
        });
}

fn preset_label(secs: u32) -> String {
    if secs % 60 == 0 {
        format!("{} min", secs / 60)
    } else {
        format!("{}s", secs)
    }
}
