//! Task list with status filtering and grouping.

/// A named task. The status is kept as entered for display; matching uses
/// the lowercase key computed once on creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub name: String,
    pub status: String,
    status_key: String,
}

impl Task {
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        let status = status.into();
        let status_key = status.to_lowercase();
        Self {
            name: name.into(),
            status,
            status_key,
        }
    }

    pub fn status_key(&self) -> &str {
        &self.status_key
    }

    pub fn group(&self) -> StatusGroup {
        StatusGroup::of(&self.status_key)
    }
}

/// Display buckets, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StatusGroup {
    Active,
    Completed,
    Other,
}

impl StatusGroup {
    fn of(key: &str) -> Self {
        match key {
            "active" => StatusGroup::Active,
            "completed" => StatusGroup::Completed,
            _ => StatusGroup::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Status(String),
}

impl StatusFilter {
    pub fn parse(value: &str) -> Self {
        let key = value.to_lowercase();
        if key == "all" {
            StatusFilter::All
        } else {
            StatusFilter::Status(key)
        }
    }

    fn matches(&self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Status(key) => task.status_key == *key,
        }
    }
}

/// Filter by status, then group active, completed and other, keeping the
/// original order inside each group.
pub fn group_tasks<'a>(tasks: &'a [Task], filter: &StatusFilter) -> Vec<&'a Task> {
    let mut grouped: Vec<&Task> = tasks.iter().filter(|task| filter.matches(task)).collect();
    // Stable sort keeps insertion order within a group.
    grouped.sort_by_key(|task| task.group());
    grouped
}

#[derive(Debug, Default, Clone)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, status: impl Into<String>) {
        self.tasks.push(Task::new(name, status));
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn view(&self, filter: &StatusFilter) -> Vec<&Task> {
        group_tasks(&self.tasks, filter)
    }
}
