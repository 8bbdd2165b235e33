mod app;
mod config;
mod domain;
mod focus;
mod logging;
mod schedule;
mod timer;
mod ui;
mod wheel;

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration as StdDuration;

use chrono::{Duration, Local};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;

use crate::app::{AppEvent, AppSettings, SessionSummary, SpinApp};
use crate::config::load_config;
use crate::domain::{Task, format_clock, format_duration};
use crate::logging::init_logging;
use crate::schedule::{FrameClock, ManualClock};
use crate::timer::Preset;
use crate::ui::run_dashboard;

#[derive(Debug, Parser)]
#[command(name = "spin-focus", about = "Spin a wheel to pick a task, then focus on it")]
struct Cli {
	#[arg(long)]
	config: Option<PathBuf>,
	/// Seed for the spin RNG, for reproducible picks.
	#[arg(long)]
	seed: Option<u64>,
	/// Task to start with. Repeat for several tasks.
	#[arg(long = "task")]
	tasks: Vec<String>,
	/// Print output as JSON: the session summary, or the picked task for `spin`.
	#[arg(long)]
	json: bool,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	Dashboard,
	/// Spin once without the dashboard and print the picked task.
	Spin,
	Presets,
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();

	if let Some(Command::Presets) = &cli.command {
		print_presets();
		return Ok(());
	}

	let config = load_config(cli.config)?;
	let _logger = match init_logging(&config.log_level, &config.log_dir()) {
		Ok(handle) => Some(handle),
		Err(err) => {
			eprintln!("warning: logging disabled: {err}");
			None
		}
	};

	let mut spin = SpinApp::new(AppSettings {
		idle_revolution: config.idle_revolution(),
		default_preset: config.default_preset,
		seed: cli.seed,
	});
	for text in &cli.tasks {
		spin.add_task(text)?;
	}

	match cli.command.unwrap_or(Command::Dashboard) {
		Command::Dashboard => {
			run_dashboard(&mut spin, config.frame_interval())?;
			let summary = spin.summary();
			info!(
				"event=session_end spins={} total_tracked={}",
				summary.spins_completed, summary.total_tracked
			);
			print_summary(&summary, cli.json)?;
		}
		Command::Spin => {
			let (index, task) = run_headless_spin(&mut spin, config.frame_interval())?;
			println!("{}", format_pick(index, &task, cli.json)?);
		}
		Command::Presets => {}
	}

	Ok(())
}

#[derive(Debug, Serialize)]
struct SpinPick<'a> {
	position: usize,
	task: &'a Task,
}

/// Spins on a simulated clock until the wheel lands. Returns the landed index and task.
fn run_headless_spin(spin: &mut SpinApp, frame_interval: StdDuration) -> Result<(usize, Task), Box<dyn Error>> {
	if !spin.spin() {
		return Err("nothing to spin: pass at least one --task".into());
	}

	let mut frames = FrameClock::new(ManualClock::new());
	frames.delta();
	while spin.wheel().is_spinning() {
		frames.clock().advance(frame_interval);
		for event in spin.advance(frames.delta()) {
			match event {
				AppEvent::SpinLanded { task_id, index } => {
					let task = spin
						.tasks()
						.get(&task_id)
						.cloned()
						.ok_or_else(|| format!("landed task {task_id} is gone"))?;
					return Ok((index, task));
				}
				AppEvent::SpinAborted => return Err("spin was aborted".into()),
				AppEvent::TimerCompleted { .. } => {}
			}
		}
	}

	Err("spin never landed".into())
}

fn format_pick(index: usize, task: &Task, json: bool) -> Result<String, serde_json::Error> {
	if json {
		return serde_json::to_string_pretty(&SpinPick {
			position: index + 1,
			task,
		});
	}
	Ok(format!("{}. {}", index + 1, task.text))
}

fn print_presets() {
	for preset in Preset::ALL {
		println!("{:<12} {}", preset.label(), format_clock(preset.duration_secs()));
	}
}

fn print_summary(summary: &SessionSummary, json: bool) -> Result<(), Box<dyn Error>> {
	if json {
		println!("{}", serde_json::to_string_pretty(summary)?);
		return Ok(());
	}

	println!(
		"session started {}",
		summary.started_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
	);
	println!("spins completed: {}", summary.spins_completed);
	if summary.tasks.is_empty() {
		println!("no tasks");
		return Ok(());
	}

	for task in &summary.tasks {
		println!(
			"{} | {} | {}",
			format_duration(seconds(task.time_tracked)),
			if task.is_completed { "done" } else { "open" },
			task.text
		);
	}
	println!("total {}", format_duration(seconds(summary.total_tracked)));

	Ok(())
}

fn seconds(value: u64) -> Duration {
	i64::try_from(value)
		.ok()
		.and_then(Duration::try_seconds)
		.unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use crate::app::{AppSettings, SpinApp};

	use super::{format_pick, run_headless_spin};

	fn app_with(tasks: &[&str]) -> SpinApp {
		let mut spin = SpinApp::new(AppSettings {
			seed: Some(11),
			..AppSettings::default()
		});
		for text in tasks {
			spin.add_task(text).expect("task should be created");
		}
		spin
	}

	#[test]
	fn headless_spin_returns_the_landed_task() {
		let mut spin = app_with(&["Write report"]);
		let (index, task) = run_headless_spin(&mut spin, Duration::from_millis(33)).expect("spin should land");
		assert_eq!(index, 0);
		assert_eq!(task.text, "Write report");
		assert_eq!(format_pick(index, &task, false).expect("plain output"), "1. Write report");
	}

	#[test]
	fn headless_spin_prints_json_pick() {
		let mut spin = app_with(&["a", "b", "c"]);
		let (index, task) = run_headless_spin(&mut spin, Duration::from_millis(33)).expect("spin should land");
		let raw = format_pick(index, &task, true).expect("json output");
		let value: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
		assert_eq!(value["position"], serde_json::json!(index + 1));
		assert_eq!(value["task"]["id"], serde_json::json!(task.id));
		assert_eq!(value["task"]["time_tracked"], serde_json::json!(0));
	}

	#[test]
	fn headless_spin_needs_a_task() {
		let mut spin = app_with(&[]);
		assert!(run_headless_spin(&mut spin, Duration::from_millis(33)).is_err());
	}
}
