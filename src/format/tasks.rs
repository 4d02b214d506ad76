//! Task list view for the React Native client and TTS

use serde::Serialize;

use crate::format::style::{
    format_date_for_mobile, get_category_color, get_priority_color, get_priority_emoji,
};
use crate::upstream::types::Task;

const STATUS_PENDING: &str = "In sospeso";
const STATUS_COMPLETED: &str = "Completato";
const PRIORITY_HIGH: &str = "Alta";
const DEFAULT_CATEGORY: &str = "Generale";

/// Full `get_tasks` payload
#[derive(Debug, Clone, Serialize)]
pub struct TaskListView {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub version: &'static str,
    pub columns: Vec<Column>,
    pub tasks: Vec<TaskView>,
    pub summary: Summary,
    pub voice_summary: String,
    pub ui_hints: UiHints,
}

#[derive(Debug, Clone, Serialize)]
pub struct Column {
    pub id: &'static str,
    pub label: &'static str,
    pub sortable: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub end_time_formatted: String,
    pub category: String,
    pub category_color: &'static str,
    pub priority: String,
    pub priority_emoji: &'static str,
    pub priority_color: &'static str,
    pub status: String,
    pub actions: TaskActions,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskActions {
    pub complete: Action,
    pub edit: Action,
    pub delete: Action,
}

#[derive(Debug, Clone, Serialize)]
pub struct Action {
    pub label: &'static str,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    pub high_priority: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct UiHints {
    pub display_mode: &'static str,
    pub enable_swipe_actions: bool,
    pub enable_pull_to_refresh: bool,
    pub group_by: &'static str,
}

impl Default for UiHints {
    fn default() -> Self {
        Self {
            display_mode: "list",
            enable_swipe_actions: true,
            enable_pull_to_refresh: true,
            group_by: "category",
        }
    }
}

fn columns() -> Vec<Column> {
    [
        ("title", "Titolo"),
        ("endTimeFormatted", "Scadenza"),
        ("category", "Categoria"),
        ("priority", "Priorità"),
        ("status", "Stato"),
    ]
    .into_iter()
    .map(|(id, label)| Column {
        id,
        label,
        sortable: true,
    })
    .collect()
}

fn format_task(task: &Task) -> TaskView {
    let category = task
        .category
        .clone()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
    let priority = task.priority.clone().unwrap_or_default();
    let status = task.status.clone().unwrap_or_else(|| STATUS_PENDING.to_string());

    TaskView {
        id: task.task_id,
        title: task.title.clone(),
        description: task.description.clone().unwrap_or_default(),
        start_time: task.start_time.clone(),
        end_time: task.end_time.clone(),
        end_time_formatted: format_date_for_mobile(task.end_time.as_deref().unwrap_or("")),
        category_color: get_category_color(&category),
        priority_emoji: get_priority_emoji(&priority),
        priority_color: get_priority_color(&priority),
        actions: TaskActions {
            complete: Action {
                label: "[OK] Completa",
                enabled: status != STATUS_COMPLETED,
            },
            edit: Action {
                label: "✏️ Modifica",
                enabled: true,
            },
            delete: Action {
                label: "🗑️ Elimina",
                enabled: true,
            },
        },
        category,
        priority,
        status,
    }
}

fn summarize(tasks: &[Task]) -> Summary {
    tasks.iter().fold(Summary::default(), |mut summary, task| {
        summary.total += 1;
        match task.status.as_deref() {
            Some(STATUS_COMPLETED) => summary.completed += 1,
            Some(STATUS_PENDING) | None => summary.pending += 1,
            Some(_) => {}
        }
        if task.priority.as_deref() == Some(PRIORITY_HIGH) {
            summary.high_priority += 1;
        }
        summary
    })
}

/// Italian sentence read aloud by the voice assistant
pub fn voice_summary(summary: &Summary) -> String {
    if summary.total == 0 {
        return "Non hai nessun task.".to_string();
    }

    let mut text = format!("Hai {} task", summary.total);
    if summary.high_priority > 0 {
        text.push_str(&format!(", di cui {} ad alta priorità", summary.high_priority));
    }
    text.push_str(&format!(
        ". {} sono in sospeso e {} completati.",
        summary.pending, summary.completed
    ));
    text
}

/// Shape upstream tasks into the mobile task list
pub fn format_tasks_for_ui(tasks: &[Task]) -> TaskListView {
    let summary = summarize(tasks);

    TaskListView {
        kind: "task_list",
        version: "1.0",
        columns: columns(),
        tasks: tasks.iter().map(format_task).collect(),
        voice_summary: voice_summary(&summary),
        summary,
        ui_hints: UiHints::default(),
    }
}
