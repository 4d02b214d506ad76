//! Response formatting
//!
//! Pure transforms from MyTaskly API payloads to the shapes rendered by the
//! mobile UI and read by the text-to-speech pipeline.

pub mod style;
pub mod tasks;

pub use style::{format_date_for_mobile, get_category_color, get_priority_color, get_priority_emoji};
pub use tasks::{format_tasks_for_ui, TaskListView};
