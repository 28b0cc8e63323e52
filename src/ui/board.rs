//! Task board: entry form, status tabs and the grouped table.

use crate::tasks::{Task, TaskList};

use super::edit::TextField;
use super::panes::StatusTab;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormFocus {
    Name,
    Status,
}

impl FormFocus {
    pub fn toggle(self) -> Self {
        match self {
            FormFocus::Name => FormFocus::Status,
            FormFocus::Status => FormFocus::Name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskBoard {
    pub list: TaskList,
    pub name: TextField,
    pub status: TextField,
    pub focus: FormFocus,
    pub tab: StatusTab,
}

impl Default for TaskBoard {
    fn default() -> Self {
        Self {
            list: TaskList::new(),
            name: TextField::new("Name"),
            status: TextField::new("Status"),
            focus: FormFocus::Name,
            tab: StatusTab::All,
        }
    }
}

impl TaskBoard {
    pub fn focused_field_mut(&mut self) -> &mut TextField {
        match self.focus {
            FormFocus::Name => &mut self.name,
            FormFocus::Status => &mut self.status,
        }
    }

    /// Add the form's task to the list and clear the form.
    ///
    /// Both fields are required; on error the form is left untouched.
    pub fn submit(&mut self) -> Result<(), &'static str> {
        if self.name.value().trim().is_empty() {
            self.focus = FormFocus::Name;
            return Err("Name is required");
        }
        if self.status.value().trim().is_empty() {
            self.focus = FormFocus::Status;
            return Err("Status is required");
        }
        self.list.add(self.name.value(), self.status.value());
        tracing::debug!(tasks = self.list.len(), "task added");
        self.name.reset();
        self.status.reset();
        self.focus = FormFocus::Name;
        Ok(())
    }

    pub fn rows(&self) -> Vec<&Task> {
        self.list.view(&self.tab.filter())
    }
}
