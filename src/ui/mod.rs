pub mod app;
pub mod board;
pub mod browser;
pub mod draw;
pub mod edit;
pub mod panes;
