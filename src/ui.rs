use std::error::Error;
use std::f64::consts::TAU;
use std::io;
use std::time::Duration;

use crossterm::event::{
	self, DisableMouseCapture, EnableMouseCapture, Event as CEvent, KeyCode, KeyEventKind, MouseButton,
	MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, ExecutableCommand};
use log::error;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Points};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal};

use crate::app::SpinApp;
use crate::domain::{format_clock, format_time_tracked, Task, PALETTE};
use crate::focus::FocusSession;
use crate::schedule::{FrameClock, SystemClock};
use crate::timer::Preset;
use crate::wheel::segment_width;

const IDLE_POLL: Duration = Duration::from_millis(250);
const PLACEHOLDER_SEGMENTS: usize = 8;
const WHEEL_INNER_RADIUS: f64 = 0.12;
const WHEEL_OUTER_RADIUS: f64 = 0.95;
const WHEEL_LABEL_RADIUS: f64 = 0.6;
const WHEEL_LABEL_CHARS: usize = 15;
const FOCUSED_PANEL_BORDER_COLOR: Color = Color::Yellow;
const HIGHLIGHT_BACKGROUND_COLOR: Color = Color::Rgb(42, 45, 52);
const MODAL_BACKGROUND_COLOR: Color = Color::Rgb(49, 46, 129);

pub fn run_dashboard(spin: &mut SpinApp, frame_interval: Duration) -> Result<(), Box<dyn Error>> {
	enable_raw_mode()?;
	let mut stdout = io::stdout();
	stdout.execute(EnterAlternateScreen)?;
	stdout.execute(EnableMouseCapture)?;
	let backend = CrosstermBackend::new(stdout);
	let mut terminal = Terminal::new(backend)?;

	let result = run_event_loop(&mut terminal, spin, frame_interval);
	if let Err(err) = &result {
		error!("event=dashboard status=failed error={err}");
	}

	disable_raw_mode()?;
	execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;
	terminal.show_cursor()?;

	result
}

fn run_event_loop(
	terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
	spin: &mut SpinApp,
	frame_interval: Duration,
) -> Result<(), Box<dyn Error>> {
	let mut dashboard = Dashboard::default();
	let mut frames = FrameClock::new(SystemClock::new());

	loop {
		spin.advance(frames.delta());
		dashboard.clamp_selection(spin);
		terminal.draw(|frame| draw_dashboard(frame, &mut dashboard, spin))?;

		let animating = spin.wheel().request_frame().is_some();
		let wait = if animating { frame_interval } else { IDLE_POLL };
		if !event::poll(wait)? {
			continue;
		}

		let should_quit = match event::read()? {
			CEvent::Key(key) if key.kind == KeyEventKind::Press => {
				if spin.focus().is_some() {
					handle_focus_key(spin, key.code);
					false
				} else {
					match &dashboard.mode {
						InputMode::Prompt(_) => handle_prompt_key(&mut dashboard, spin, key.code),
						InputMode::Normal => handle_normal_key(&mut dashboard, spin, key.code),
					}
				}
			}
			CEvent::Mouse(mouse) => {
				if mouse.kind == MouseEventKind::Down(MouseButton::Left) {
					handle_click(&dashboard, spin, Position::new(mouse.column, mouse.row));
				}
				false
			}
			_ => false,
		};

		if should_quit {
			break;
		}
	}

	Ok(())
}

fn draw_dashboard(frame: &mut Frame, dashboard: &mut Dashboard, spin: &SpinApp) {
	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Length(4), Constraint::Min(12), Constraint::Length(4)])
		.split(frame.area());

	let body = Layout::default()
		.direction(Direction::Horizontal)
		.constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
		.split(layout[1]);

	render_header(frame, layout[0]);
	render_task_panel(frame, body[0], dashboard, spin);
	render_wheel_panel(frame, body[1], spin);
	render_footer(frame, layout[2], dashboard, spin);

	dashboard.modal_area = None;
	if let Some(focus) = spin.focus() {
		dashboard.modal_area = Some(render_focus_modal(frame, focus));
	}
}

fn render_header(frame: &mut Frame, area: Rect) {
	let lines = vec![
		Line::from(Span::styled(
			"Spin to Focus",
			Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
		)),
		Line::from(Span::styled("Focus starts with a spin.", Style::default().fg(Color::Gray))),
	];
	let header = Paragraph::new(lines)
		.alignment(Alignment::Center)
		.block(Block::default().borders(Borders::ALL));
	frame.render_widget(header, area);
}

fn render_task_panel(frame: &mut Frame, area: Rect, dashboard: &Dashboard, spin: &SpinApp) {
	let tasks = spin.tasks().all();
	let items = if tasks.is_empty() {
		vec![ListItem::new("(no tasks yet, press 'a' to add one)")]
	} else {
		tasks.iter().map(|task| ListItem::new(render_task_line(task))).collect::<Vec<_>>()
	};

	let mut state = ListState::default();
	if !tasks.is_empty() {
		state.select(Some(dashboard.task_index.min(tasks.len() - 1)));
	}

	let title = format!(
		"Your Tasks | tracked {}",
		format_time_tracked(spin.tasks().total_tracked())
	);
	let list = List::new(items)
		.block(
			Block::default()
				.borders(Borders::ALL)
				.title(title)
				.border_style(Style::default().fg(FOCUSED_PANEL_BORDER_COLOR)),
		)
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR).add_modifier(Modifier::BOLD));

	frame.render_stateful_widget(list, area, &mut state);
}

fn render_task_line(task: &Task) -> Line<'static> {
	let text_style = if task.is_completed {
		Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
	} else {
		Style::default()
	};

	let mut spans = vec![
		Span::styled("● ", style_from_hex(&task.color)),
		Span::styled(task.text.clone(), text_style),
	];
	if task.time_tracked > 0 {
		spans.push(Span::styled(
			format!(" | {}", format_time_tracked(task.time_tracked)),
			Style::default().fg(Color::Gray),
		));
	}
	Line::from(spans)
}

fn render_wheel_panel(frame: &mut Frame, area: Rect, spin: &SpinApp) {
	let active = spin.tasks().active();
	let rotation = spin.wheel().rotation();
	let segments = build_wheel_segments(&active, rotation);

	let wheel = spin.wheel();
	let title = if let Some(plan) = wheel.spin_plan() {
		format!("Task Spinner | Spinning... {:.0}%", plan.progress() * 100.0)
	} else if wheel.is_idle_loop_running() {
		"Task Spinner | add tasks to spin".to_string()
	} else if let Some(index) = wheel.last_selected_index() {
		format!("Task Spinner | last pick #{}", index + 1)
	} else {
		"Task Spinner".to_string()
	};

	let canvas = Canvas::default()
		.block(Block::default().borders(Borders::ALL).title(title))
		.marker(Marker::Braille)
		.x_bounds([-1.1, 1.1])
		.y_bounds([-1.1, 1.1])
		.paint(|ctx| {
			for segment in &segments {
				ctx.draw(&Points {
					coords: &segment.points,
					color: segment.color,
				});
			}
			ctx.layer();
			for segment in &segments {
				if let Some((x, y, label)) = &segment.label {
					ctx.print(
						*x,
						*y,
						Span::styled(label.clone(), Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
					);
				}
			}
			ctx.print(
				0.0,
				1.02,
				Span::styled("▼", Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
			);
		});

	frame.render_widget(canvas, area);
}

struct WheelSegment {
	points: Vec<(f64, f64)>,
	color: Color,
	label: Option<(f64, f64, String)>,
}

/// Samples each pie slice into canvas points. Wheel angles run clockwise on
/// screen, the canvas y axis points up.
fn build_wheel_segments(tasks: &[&Task], rotation: f64) -> Vec<WheelSegment> {
	let count = if tasks.is_empty() { PLACEHOLDER_SEGMENTS } else { tasks.len() };
	let width = segment_width(count);

	(0..count)
		.map(|index| {
			let start = rotation + index as f64 * width;
			let (color, label) = match tasks.get(index) {
				Some(task) => (color_from_hex(&task.color).unwrap_or(Color::Gray), Some(task.short_text(WHEEL_LABEL_CHARS))),
				None => (color_from_hex(PALETTE[index % PALETTE.len()]).unwrap_or(Color::Gray), None),
			};

			let mut points = Vec::new();
			let mut radius = WHEEL_INNER_RADIUS;
			while radius <= WHEEL_OUTER_RADIUS {
				let steps = ((width * radius * 60.0).ceil() as usize).max(1);
				for step in 0..steps {
					let angle = start + width * (step as f64 + 0.5) / steps as f64;
					points.push(screen_to_canvas(radius, angle));
				}
				radius += 0.025;
			}

			let label = label.map(|text| {
				let mid = start + width / 2.0;
				let (x, y) = screen_to_canvas(WHEEL_LABEL_RADIUS, mid);
				let offset = text.chars().count() as f64 * 0.02;
				(x - offset, y, text)
			});

			WheelSegment { points, color, label }
		})
		.collect()
}

fn screen_to_canvas(radius: f64, angle: f64) -> (f64, f64) {
	let angle = angle.rem_euclid(TAU);
	(radius * angle.cos(), -radius * angle.sin())
}

fn render_footer(frame: &mut Frame, area: Rect, dashboard: &Dashboard, spin: &SpinApp) {
	let footer_lines = match &dashboard.mode {
		InputMode::Normal if spin.focus().is_some() => vec![
			Line::from("1 Pomodoro | 2 Short Break | 3 Long Break | space start/pause | r reset"),
			Line::from("s respin | Esc/c close (or click outside)"),
			Line::from(spin.status.clone()),
		],
		InputMode::Normal => vec![
			Line::from("a add task | d remove | x complete/reopen | s/space spin | arrows/jk move | q quit"),
			Line::from(spin.status.clone()),
		],
		InputMode::Prompt(prompt) => vec![
			Line::from(prompt.title.clone()),
			Line::from(format!("> {}", prompt.input)),
			Line::from("Enter submit | Esc cancel"),
		],
	};

	let footer = Paragraph::new(footer_lines).block(Block::default().borders(Borders::ALL).title("Shortcuts"));
	frame.render_widget(footer, area);
}

fn render_focus_modal(frame: &mut Frame, focus: &FocusSession) -> Rect {
	let area = centered_rect(60, 60, frame.area());
	frame.render_widget(Clear, area);

	let timer = focus.timer();
	let mut preset_spans = Vec::new();
	for (index, preset) in Preset::ALL.iter().enumerate() {
		let style = if *preset == timer.preset() {
			Style::default().fg(Color::Magenta).bg(Color::White).add_modifier(Modifier::BOLD)
		} else {
			Style::default().fg(Color::White)
		};
		preset_spans.push(Span::styled(format!(" {} {} ", index + 1, preset.label()), style));
		preset_spans.push(Span::raw(" "));
	}

	let reset_style = if timer.can_reset() {
		Style::default().fg(Color::White)
	} else {
		Style::default().fg(Color::DarkGray)
	};
	let toggle_label = if timer.is_counting() { "Pause" } else { "Start" };
	let tracking = if focus.is_tracking() {
		Span::styled("● tracking time", Style::default().fg(Color::LightGreen))
	} else {
		Span::styled("○ paused", Style::default().fg(Color::Gray))
	};

	let lines = vec![
		Line::from(Span::styled("Selected Task:", Style::default().fg(Color::Gray))),
		Line::from(Span::styled(
			focus.task().text.clone(),
			Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
		)),
		Line::from(""),
		Line::from(preset_spans),
		Line::from(""),
		Line::from(Span::styled(timer.preset().heading(), Style::default().fg(Color::Gray))),
		Line::from(Span::styled(
			format_clock(timer.remaining_secs()),
			Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
		)),
		Line::from(tracking),
		Line::from(""),
		Line::from(vec![
			Span::styled(format!("[space] {toggle_label}"), Style::default().fg(Color::LightBlue)),
			Span::raw("   "),
			Span::styled("[r] Reset", reset_style),
			Span::raw("   "),
			Span::styled("[s] Respin", Style::default().fg(Color::Cyan)),
		]),
	];

	let modal = Paragraph::new(lines).alignment(Alignment::Center).block(
		Block::default()
			.borders(Borders::ALL)
			.title("Focus [Esc to close]")
			.style(Style::default().bg(MODAL_BACKGROUND_COLOR)),
	);
	frame.render_widget(modal, area);
	area
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
	let popup_layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([
			Constraint::Percentage((100 - percent_y) / 2),
			Constraint::Percentage(percent_y),
			Constraint::Percentage((100 - percent_y) / 2),
		])
		.split(area);
	Layout::default()
		.direction(Direction::Horizontal)
		.constraints([
			Constraint::Percentage((100 - percent_x) / 2),
			Constraint::Percentage(percent_x),
			Constraint::Percentage((100 - percent_x) / 2),
		])
		.split(popup_layout[1])[1]
}

fn handle_normal_key(dashboard: &mut Dashboard, spin: &mut SpinApp, code: KeyCode) -> bool {
	match code {
		KeyCode::Char('q') | KeyCode::Esc => true,
		KeyCode::Up | KeyCode::Char('k') => {
			dashboard.move_selection(-1, spin);
			false
		}
		KeyCode::Down | KeyCode::Char('j') => {
			dashboard.move_selection(1, spin);
			false
		}
		KeyCode::Char('a') => {
			dashboard.mode = InputMode::Prompt(PromptState::new("Add your task"));
			false
		}
		KeyCode::Char('d') => {
			match dashboard.selected_task_id(spin) {
				Some(task_id) => {
					let label = task_label(spin, &task_id);
					if spin.remove_task(&task_id) {
						spin.status = format!("removed task: {label}");
					}
				}
				None => spin.status = "No task selected".to_string(),
			}
			false
		}
		KeyCode::Char('x') => {
			match dashboard.selected_task_id(spin) {
				Some(task_id) => {
					let label = task_label(spin, &task_id);
					spin.status = match spin.toggle_completed(&task_id) {
						Some(true) => format!("completed: {label}"),
						Some(false) => format!("reopened: {label}"),
						None => "Task not found".to_string(),
					};
				}
				None => spin.status = "No task selected".to_string(),
			}
			false
		}
		KeyCode::Char('s') | KeyCode::Char(' ') => {
			spin.spin();
			false
		}
		_ => false,
	}
}

fn handle_focus_key(spin: &mut SpinApp, code: KeyCode) {
	match code {
		KeyCode::Esc | KeyCode::Char('c') | KeyCode::Char('q') => spin.close_focus(),
		KeyCode::Char(' ') | KeyCode::Enter => {
			spin.toggle_timer();
		}
		KeyCode::Char('1') => spin.select_preset(Preset::Pomodoro),
		KeyCode::Char('2') => spin.select_preset(Preset::ShortBreak),
		KeyCode::Char('3') => spin.select_preset(Preset::LongBreak),
		KeyCode::Char('r') => {
			spin.reset_timer();
		}
		KeyCode::Char('s') => {
			spin.respin();
		}
		_ => {}
	}
}

fn handle_click(dashboard: &Dashboard, spin: &mut SpinApp, position: Position) {
	if let Some(area) = dashboard.modal_area {
		if !area.contains(position) {
			spin.close_focus();
		}
	}
}

fn handle_prompt_key(dashboard: &mut Dashboard, spin: &mut SpinApp, code: KeyCode) -> bool {
	match code {
		KeyCode::Esc => {
			dashboard.mode = InputMode::Normal;
			spin.status = "Input cancelled".to_string();
		}
		KeyCode::Backspace => {
			if let InputMode::Prompt(prompt) = &mut dashboard.mode {
				prompt.input.pop();
			}
		}
		KeyCode::Char(value) => {
			if let InputMode::Prompt(prompt) = &mut dashboard.mode {
				prompt.input.push(value);
			}
		}
		KeyCode::Enter => {
			let prompt = match std::mem::replace(&mut dashboard.mode, InputMode::Normal) {
				InputMode::Prompt(prompt) => prompt,
				InputMode::Normal => return false,
			};

			match spin.add_task(&prompt.input) {
				Ok(task_id) => {
					spin.status = format!("added task: {}", task_label(spin, &task_id));
					dashboard.task_index = spin.tasks().all().len().saturating_sub(1);
				}
				Err(err) => {
					dashboard.mode = InputMode::Prompt(prompt);
					spin.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}

	false
}

fn task_label(spin: &SpinApp, task_id: &str) -> String {
	spin.tasks()
		.get(task_id)
		.map(|task| task.short_text(40))
		.unwrap_or_else(|| "Unknown task".to_string())
}

fn style_from_hex(hex: &str) -> Style {
	color_from_hex(hex)
		.map(|color| Style::default().fg(color))
		.unwrap_or_default()
}

fn color_from_hex(hex: &str) -> Option<Color> {
	let digits = hex.strip_prefix('#')?;
	if digits.len() != 6 {
		return None;
	}
	let channel = |range: std::ops::Range<usize>| u8::from_str_radix(digits.get(range)?, 16).ok();
	Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

#[derive(Debug, Clone)]
struct PromptState {
	title: String,
	input: String,
}

impl PromptState {
	fn new(title: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			input: String::new(),
		}
	}
}

#[derive(Debug, Clone)]
enum InputMode {
	Normal,
	Prompt(PromptState),
}

#[derive(Debug, Clone)]
struct Dashboard {
	task_index: usize,
	mode: InputMode,
	modal_area: Option<Rect>,
}

impl Default for Dashboard {
	fn default() -> Self {
		Self {
			task_index: 0,
			mode: InputMode::Normal,
			modal_area: None,
		}
	}
}

impl Dashboard {
	fn clamp_selection(&mut self, spin: &SpinApp) {
		let len = spin.tasks().all().len();
		self.task_index = if len == 0 { 0 } else { self.task_index.min(len - 1) };
	}

	fn move_selection(&mut self, delta: i32, spin: &SpinApp) {
		let len = spin.tasks().all().len();
		if len == 0 {
			self.task_index = 0;
			return;
		}

		if delta > 0 {
			self.task_index = (self.task_index + delta as usize).min(len - 1);
		} else {
			self.task_index = self.task_index.saturating_sub(delta.unsigned_abs() as usize);
		}
	}

	fn selected_task_id(&self, spin: &SpinApp) -> Option<String> {
		spin.tasks().all().get(self.task_index).map(|task| task.id.clone())
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use crossterm::event::KeyCode;
	use ratatui::layout::{Position, Rect};
	use ratatui::style::Color;

	use crate::app::{AppSettings, SpinApp};
	use crate::domain::TaskList;
	use crate::wheel::{landing_angle, POINTER_ANGLE};

	use super::{build_wheel_segments, color_from_hex, handle_click, handle_focus_key, screen_to_canvas, Dashboard};

	fn focused_app() -> SpinApp {
		let mut spin = SpinApp::new(AppSettings {
			seed: Some(5),
			..AppSettings::default()
		});
		spin.add_task("Write report").expect("task should be created");
		assert!(spin.spin());
		for _ in 0..400 {
			spin.advance(Duration::from_millis(16));
			if !spin.wheel().is_spinning() {
				break;
			}
		}
		assert!(spin.focus().is_some(), "spin should open the focus modal");
		spin
	}

	fn dashboard_with_modal() -> Dashboard {
		Dashboard {
			modal_area: Some(Rect::new(10, 5, 40, 12)),
			..Dashboard::default()
		}
	}

	#[test]
	fn click_outside_modal_closes_it() {
		let mut spin = focused_app();
		let dashboard = dashboard_with_modal();
		handle_click(&dashboard, &mut spin, Position::new(2, 2));
		assert!(spin.focus().is_none());
	}

	#[test]
	fn click_inside_modal_keeps_it_open() {
		let mut spin = focused_app();
		let dashboard = dashboard_with_modal();
		handle_click(&dashboard, &mut spin, Position::new(20, 10));
		assert!(spin.focus().is_some());
	}

	#[test]
	fn escape_and_close_key_close_the_modal() {
		let mut spin = focused_app();
		handle_focus_key(&mut spin, KeyCode::Esc);
		assert!(spin.focus().is_none());

		let mut spin = focused_app();
		handle_focus_key(&mut spin, KeyCode::Char('c'));
		assert!(spin.focus().is_none());
	}

	#[test]
	fn respin_key_closes_modal_and_spins_again() {
		let mut spin = focused_app();
		handle_focus_key(&mut spin, KeyCode::Char(' '));
		assert!(spin.focus().is_some_and(|focus| focus.timer().is_running()));

		handle_focus_key(&mut spin, KeyCode::Char('s'));
		assert!(spin.focus().is_none());
		assert!(spin.wheel().is_spinning());
	}

	#[test]
	fn parses_palette_hex_tokens() {
		assert_eq!(color_from_hex("#FF6B6B"), Some(Color::Rgb(0xFF, 0x6B, 0x6B)));
		assert_eq!(color_from_hex("FF6B6B"), None);
		assert_eq!(color_from_hex("#FF6B"), None);
		assert_eq!(color_from_hex("#GG0000"), None);
	}

	#[test]
	fn pointer_angle_is_top_of_canvas() {
		let (x, y) = screen_to_canvas(1.0, POINTER_ANGLE);
		assert!(x.abs() < 1e-9);
		assert!((y - 1.0).abs() < 1e-9);
	}

	#[test]
	fn empty_list_draws_placeholder_segments() {
		let segments = build_wheel_segments(&[], 0.0);
		assert_eq!(segments.len(), 8);
		assert!(segments.iter().all(|segment| segment.label.is_none()));
	}

	#[test]
	fn landed_segment_label_sits_under_pointer() {
		let mut tasks = TaskList::new();
		for text in ["a", "b", "c", "d"] {
			tasks.add(text).expect("task should be created");
		}
		let active = tasks.active();
		let rotation = landing_angle(2, active.len());
		let segments = build_wheel_segments(&active, rotation);
		let (x, y, label) = segments[2].label.clone().expect("task segments are labelled");
		assert_eq!(label, "c");
		assert!(y > 0.5);
		assert!(x.abs() < 0.1);
	}
}
