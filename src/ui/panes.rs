use crate::tasks::StatusFilter;
use crate::view::ViewMode;

/// Status filter tabs on the task board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusTab {
    #[default]
    All,
    Active,
    Completed,
}

impl StatusTab {
    pub const ALL: [StatusTab; 3] = [StatusTab::All, StatusTab::Active, StatusTab::Completed];

    pub fn title(self) -> &'static str {
        match self {
            StatusTab::All => "All",
            StatusTab::Active => "Active",
            StatusTab::Completed => "Completed",
        }
    }

    pub fn index(self) -> usize {
        match self {
            StatusTab::All => 0,
            StatusTab::Active => 1,
            StatusTab::Completed => 2,
        }
    }

    pub fn filter(self) -> StatusFilter {
        StatusFilter::parse(self.title())
    }
}

/// Entries of the landing screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeEntry {
    Tasks,
    Contacts(ViewMode),
}

impl HomeEntry {
    pub const ALL: [HomeEntry; 3] = [
        HomeEntry::Tasks,
        HomeEntry::Contacts(ViewMode::All),
        HomeEntry::Contacts(ViewMode::Us),
    ];

    pub fn title(self) -> &'static str {
        match self {
            HomeEntry::Tasks => "Task List",
            HomeEntry::Contacts(mode) => mode.title(),
        }
    }

    pub fn route(self) -> String {
        match self {
            HomeEntry::Tasks => "/tasks".to_string(),
            HomeEntry::Contacts(mode) => format!("/contacts/{}", mode.segment()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_filters() {
        assert_eq!(StatusTab::All.filter(), StatusFilter::All);
        assert_eq!(
            StatusTab::Completed.filter(),
            StatusFilter::Status("completed".to_string())
        );
        assert_eq!(StatusTab::Active.index(), 1);
    }

    #[test]
    fn home_entries_route_to_view_modes() {
        assert_eq!(ViewMode::from_path(&HomeEntry::ALL[2].route()), ViewMode::Us);
        assert_eq!(ViewMode::from_path(&HomeEntry::ALL[1].route()), ViewMode::All);
    }
}
