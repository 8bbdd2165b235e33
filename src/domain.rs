use chrono::{DateTime, Duration, Utc};
use rand::{Rng, distributions::Alphanumeric, thread_rng};
use serde::{Deserialize, Serialize};

const ID_LEN: usize = 8;

/// Segment colors. A task keeps the color it was created with.
pub const PALETTE: [&str; 8] = [
    "#FF6B6B", // coral red
    "#FF9E7A", // peach
    "#FFCA80", // light orange
    "#FFE066", // yellow
    "#9EE09E", // light green
    "#67D5B5", // teal
    "#84D2F6", // light blue
    "#C792EA", // purple
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub text: String,
    pub is_completed: bool,
    pub time_tracked: u64,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn short_text(&self, max_chars: usize) -> String {
        if self.text.chars().count() <= max_chars {
            return self.text.clone();
        }
        let mut out = self.text.chars().take(max_chars).collect::<String>();
        out.push_str("...");
        out
    }
}

/// Owner of all task state. Everything else reads tasks and reports changes back here.
#[derive(Debug, Clone, Default)]
pub struct TaskList {
    tasks: Vec<Task>,
    created: usize,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, text: &str) -> Result<String, String> {
        let text = text.trim();
        if text.is_empty() {
            return Err("task text must not be empty".to_string());
        }

        let mut id = generate_id();
        while self.get(&id).is_some() {
            id = generate_id();
        }

        let color = PALETTE[self.created % PALETTE.len()].to_string();
        self.created += 1;
        self.tasks.push(Task {
            id: id.clone(),
            text: text.to_string(),
            is_completed: false,
            time_tracked: 0,
            color,
            created_at: Utc::now(),
        });

        Ok(id)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        self.tasks.len() != before
    }

    /// Flips the completion flag, returning the new value.
    pub fn toggle_completed(&mut self, id: &str) -> Option<bool> {
        let task = self.tasks.iter_mut().find(|task| task.id == id)?;
        task.is_completed = !task.is_completed;
        Some(task.is_completed)
    }

    pub fn add_time(&mut self, id: &str, seconds: u64) -> bool {
        match self.tasks.iter_mut().find(|task| task.id == id) {
            Some(task) => {
                task.time_tracked = task.time_tracked.saturating_add(seconds);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn all(&self) -> &[Task] {
        &self.tasks
    }

    /// Non-completed tasks in list order. These are the wheel's segments.
    pub fn active(&self) -> Vec<&Task> {
        self.tasks.iter().filter(|task| !task.is_completed).collect()
    }

    pub fn total_tracked(&self) -> u64 {
        self.tasks.iter().map(|task| task.time_tracked).sum()
    }
}

pub fn generate_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}

pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Countdown display, `MM:SS`.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

pub fn format_time_tracked(seconds: u64) -> String {
    if seconds < 60 {
        format!("{seconds} secs")
    } else if seconds < 3600 {
        format!("{} mins", seconds / 60)
    } else {
        format!("{}hr {} mins", seconds / 3600, (seconds % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::{PALETTE, TaskList, format_clock, format_duration, format_time_tracked};

    #[test]
    fn rejects_blank_text_and_trims_input() {
        let mut tasks = TaskList::new();
        assert!(tasks.add("   ").is_err());

        let id = tasks.add("  Write report  ").expect("task should be created");
        let task = tasks.get(&id).expect("task exists");
        assert_eq!(task.text, "Write report");
        assert_eq!(task.time_tracked, 0);
        assert!(!task.is_completed);
        assert_eq!(task.id.len(), 8);
    }

    #[test]
    fn colors_stay_frozen_when_siblings_are_removed() {
        let mut tasks = TaskList::new();
        let first = tasks.add("a").expect("task should be created");
        let second = tasks.add("b").expect("task should be created");
        let third = tasks.add("c").expect("task should be created");
        let third_color = tasks.get(&third).expect("task exists").color.clone();

        assert!(tasks.remove(&first));
        assert_eq!(tasks.get(&third).expect("task exists").color, third_color);
        assert_eq!(tasks.get(&second).expect("task exists").color, PALETTE[1]);

        let fourth = tasks.add("d").expect("task should be created");
        assert_eq!(tasks.get(&fourth).expect("task exists").color, PALETTE[3]);
    }

    #[test]
    fn palette_cycles_after_eight_tasks() {
        let mut tasks = TaskList::new();
        let ids = (0..9)
            .map(|index| tasks.add(&format!("task {index}")).expect("task should be created"))
            .collect::<Vec<_>>();
        assert_eq!(tasks.get(&ids[8]).expect("task exists").color, PALETTE[0]);
    }

    #[test]
    fn active_skips_completed_tasks_and_keeps_order() {
        let mut tasks = TaskList::new();
        let a = tasks.add("a").expect("task should be created");
        let b = tasks.add("b").expect("task should be created");
        let c = tasks.add("c").expect("task should be created");

        assert_eq!(tasks.toggle_completed(&b), Some(true));
        let active = tasks.active().iter().map(|task| task.id.clone()).collect::<Vec<_>>();
        assert_eq!(active, vec![a, c]);
        assert_eq!(tasks.toggle_completed(&b), Some(false));
        assert_eq!(tasks.toggle_completed("missing"), None);
    }

    #[test]
    fn time_is_only_added_to_known_tasks() {
        let mut tasks = TaskList::new();
        let id = tasks.add("focus").expect("task should be created");
        assert!(tasks.add_time(&id, 1));
        assert!(tasks.add_time(&id, 1));
        assert!(!tasks.add_time("missing", 1));
        assert_eq!(tasks.get(&id).expect("task exists").time_tracked, 2);
        assert_eq!(tasks.total_tracked(), 2);
    }

    #[test]
    fn formats_tracked_time_like_the_task_list() {
        assert_eq!(format_time_tracked(45), "45 secs");
        assert_eq!(format_time_tracked(125), "2 mins");
        assert_eq!(format_time_tracked(3 * 3600 + 7 * 60 + 5), "3hr 7 mins");
        assert_eq!(format_clock(1500), "25:00");
        assert_eq!(format_clock(59), "00:59");
        assert_eq!(format_duration(Duration::seconds(3661)), "01:01:01");
    }
}
