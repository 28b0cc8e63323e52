use anyhow::Result;
use ratatui::backend::Backend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::line::NORMAL as LINE;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, Tabs,
};
use ratatui::{Frame, Terminal};
// Use Popup from tui-widgets to render modals
use tui_widgets::popup::Popup;

use crate::config::{RgbColor, UiColors};
use crate::view::ViewMode;

use super::app::{App, Screen};
use super::board::FormFocus;
use super::browser::{BrowserFocus, ContactBrowser};
use super::edit::TextField;
use super::panes::{HomeEntry, StatusTab};

const HOME_HELP: &str = "j/k: move  Enter: open  1-3: jump  q: quit";
const TASKS_HELP: &str =
    "Tab: next field  Enter: add task  F2/F3/F4: All/Active/Completed  Esc: back";
const SEARCH_HELP: &str =
    "Type to search  Enter: search now  Tab: results  F2: only even  F3/F4: view  F5: refresh  Esc: close";
const RESULTS_HELP: &str =
    "j/k: move  Enter: details  /: search  F2: only even  F3/F4: view  F5: refresh  Esc: close";
const DETAIL_HELP: &str = "Enter/Esc/c: close";
const LOADING: &str = "Loading contacts...";

pub fn render<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    terminal.draw(|frame| draw_frame(frame, app))?;
    Ok(())
}

fn draw_frame(frame: &mut Frame<'_>, app: &mut App) {
    let size = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(size);

    draw_header(frame, layout[0], app);
    match app.screen {
        Screen::Home | Screen::Contacts => draw_home(frame, layout[1], app),
        Screen::Tasks => draw_tasks(frame, layout[1], app),
    }
    draw_footer(frame, layout[2], app);

    let colors = app.ui_colors();
    if let Some(browser) = app.browser.as_mut() {
        draw_contacts_modal(frame, layout[1], colors, browser);
        draw_detail_modal(frame, layout[1], colors, browser);
    }
}

fn draw_header(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let colors = app.ui_colors();
    let title = match app.screen {
        Screen::Home => "Home",
        Screen::Tasks => "Task List",
        Screen::Contacts => app
            .browser
            .as_ref()
            .map_or("Contacts", |browser| browser.mode.title()),
    };
    let spans = vec![
        Span::styled(
            " cbrowse ",
            Style::default()
                .fg(color(colors.selection_fg))
                .bg(color(colors.selection_bg))
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(title, header_text_style(colors)),
    ];
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_home(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let colors = app.ui_colors();
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Pages")
        .border_style(border_style(colors));

    let items: Vec<ListItem> = HomeEntry::ALL
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            ListItem::new(Line::from(format!(
                "{}. {}  ({})",
                idx + 1,
                entry.title(),
                entry.route()
            )))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(selection_style(colors));
    let mut state = ListState::default();
    state.select(Some(app.home_selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_tasks(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let colors = app.ui_colors();
    let board = &app.board;
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    let form = Block::default()
        .borders(Borders::ALL)
        .title("New Task")
        .border_style(border_style(colors));
    let inner = form.inner(layout[0]);
    frame.render_widget(form, layout[0]);

    let fields = [
        (&board.name, board.focus == FormFocus::Name),
        (&board.status, board.focus == FormFocus::Status),
    ];
    let label_width = fields
        .iter()
        .map(|(field, _)| field.label().len())
        .max()
        .unwrap_or(0)
        + 2;
    let lines: Vec<Line> = fields
        .iter()
        .map(|(field, focused)| field_line(field, label_width, *focused, colors))
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);

    if let Some((row, (field, _))) = fields.iter().enumerate().find(|(_, (_, focused))| *focused) {
        let x = inner.x + (label_width + field.visual_cursor()) as u16;
        frame.set_cursor_position((x.min(inner.right().saturating_sub(1)), inner.y + row as u16));
    }

    let titles: Vec<Line> = StatusTab::ALL
        .iter()
        .map(|tab| Line::from(format!(" {} ", tab.title())))
        .collect();
    let tabs = Tabs::new(titles)
        .select(board.tab.index())
        .highlight_style(selection_style(colors))
        .divider(LINE.vertical);
    frame.render_widget(tabs, layout[1]);

    let rows: Vec<Row> = board
        .rows()
        .into_iter()
        .map(|task| Row::new(vec![Cell::from(task.name.clone()), Cell::from(task.status.clone())]))
        .collect();
    let header = Row::new(vec![Cell::from("Name"), Cell::from("Status")])
        .style(header_text_style(colors).add_modifier(Modifier::BOLD));
    let table = Table::new(rows, [Constraint::Percentage(60), Constraint::Percentage(40)])
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style(colors)),
        );
    frame.render_widget(table, layout[2]);
}

fn draw_contacts_modal(
    frame: &mut Frame<'_>,
    area: Rect,
    colors: &UiColors,
    browser: &mut ContactBrowser,
) {
    let mut width = area.width.saturating_mul(2).saturating_div(3);
    let min_width = area.width.min(48);
    if width < min_width {
        width = min_width;
    }
    let height = area.height.saturating_sub(2).max(3);

    // Build popup body placeholder sized to content area (width/height exclude borders)
    let content_width = width.saturating_sub(2) as usize;
    let content_height = height.saturating_sub(2) as usize;
    let body_lines: Vec<Line> = (0..content_height)
        .map(|_| Line::from(" ".repeat(content_width)))
        .collect();

    let title_line = Line::from(Span::styled(browser.mode.title(), header_text_style(colors)));
    let popup = Popup::new(Text::from(body_lines))
        .title(title_line)
        .border_style(border_style(colors));
    frame.render_stateful_widget_ref(popup, area, &mut browser.popup);

    let Some(popup_area) = *browser.popup.area() else {
        return;
    };
    let inner = Block::default().borders(Borders::ALL).inner(popup_area);
    if inner.width == 0 || inner.height < 4 {
        browser.viewport_rows = 0;
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    frame.render_widget(Paragraph::new(controls_line(browser, colors)), layout[0]);

    let search_focused = browser.focus == BrowserFocus::Search && browser.detail.is_none();
    let label_width = browser.search.label().len() + 2;
    frame.render_widget(
        Paragraph::new(field_line(&browser.search, label_width, search_focused, colors)),
        layout[1],
    );
    if search_focused {
        let x = layout[1].x + (label_width + browser.search.visual_cursor()) as u16;
        frame.set_cursor_position((x.min(layout[1].right().saturating_sub(1)), layout[1].y));
    }

    let separator = LINE.horizontal.repeat(layout[2].width as usize);
    frame.render_widget(
        Paragraph::new(separator).style(border_style(colors)),
        layout[2],
    );

    let results_area = layout[3];
    if browser.cache.is_loading() {
        browser.viewport_rows = 0;
        frame.render_widget(
            Paragraph::new(LOADING)
                .alignment(Alignment::Center)
                .style(header_text_style(colors)),
            results_area,
        );
        return;
    }

    let rows: Vec<Row> = browser
        .visible()
        .into_iter()
        .map(|contact| {
            Row::new(vec![
                Cell::from(contact.id.to_string()),
                Cell::from(contact.phone.clone()),
                Cell::from(contact.country.name.clone()),
            ])
        })
        .collect();

    if rows.is_empty() && !browser.cache.in_flight() {
        browser.viewport_rows = results_area.height.saturating_sub(1) as usize;
        frame.render_widget(
            Paragraph::new("No contacts")
                .alignment(Alignment::Center)
                .style(header_text_style(colors)),
            results_area,
        );
        return;
    }

    let header = Row::new(vec![Cell::from("Id"), Cell::from("Phone"), Cell::from("Country")])
        .style(header_text_style(colors).add_modifier(Modifier::BOLD));
    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Percentage(45),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .highlight_style(selection_style(colors));

    browser.viewport_rows = results_area.height.saturating_sub(1) as usize;
    frame.render_stateful_widget(table, results_area, &mut browser.table);
}

fn controls_line(browser: &ContactBrowser, colors: &UiColors) -> Line<'static> {
    let checkbox = if browser.only_even { "[x]" } else { "[ ]" };
    let mut spans = vec![Span::raw(format!("{} Only even", checkbox)), Span::raw("   ")];
    for mode in [ViewMode::All, ViewMode::Us] {
        let style = if browser.mode == mode {
            selection_style(colors)
        } else {
            border_style(colors)
        };
        spans.push(Span::styled(format!(" {} ", mode.title()), style));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled(" Close ", border_style(colors)));
    Line::from(spans)
}

fn draw_detail_modal(
    frame: &mut Frame<'_>,
    area: Rect,
    colors: &UiColors,
    browser: &mut ContactBrowser,
) {
    let Some(contact) = browser.detail.as_ref() else {
        return;
    };

    let lines = vec![
        Line::from(format!("Phone: {}", contact.phone)),
        Line::from(format!("Country: {}", contact.country.name)),
        Line::from(""),
        Line::from(Span::styled(DETAIL_HELP, header_text_style(colors))),
    ];
    let title_line = Line::from(Span::styled(contact.phone.clone(), header_text_style(colors)));
    let popup = Popup::new(Text::from(lines))
        .title(title_line)
        .border_style(border_style(colors));
    frame.render_stateful_widget_ref(popup, area, &mut browser.detail_popup);
}

fn draw_footer(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let colors = app.ui_colors();
    let mut style = Style::default()
        .fg(color(colors.status_fg))
        .bg(color(colors.status_bg));

    let message = match app.browser.as_ref().filter(|_| app.screen == Screen::Contacts) {
        Some(browser) => {
            if let Some(err) = browser.cache.last_error() {
                style = style.fg(color(colors.error_fg));
                if browser.cache.is_stalled() {
                    format!("{}: {}  F5: retry", err.kind(), err)
                } else {
                    format!("{}: {}", err.kind(), err)
                }
            } else if browser.detail.is_some() {
                DETAIL_HELP.to_string()
            } else if browser.cache.in_flight() && !browser.cache.is_loading() {
                "Loading more...".to_string()
            } else {
                match browser.focus {
                    BrowserFocus::Search => SEARCH_HELP.to_string(),
                    BrowserFocus::Results => RESULTS_HELP.to_string(),
                }
            }
        }
        None => match (&app.status, app.screen) {
            (Some(status), _) => status.clone(),
            (None, Screen::Tasks) => TASKS_HELP.to_string(),
            (None, _) => HOME_HELP.to_string(),
        },
    };

    let background = Block::default().style(Style::default().bg(color(colors.status_bg)));
    frame.render_widget(background, area);

    frame.render_widget(Paragraph::new(message).style(style), area);
}

fn field_line(field: &TextField, label_width: usize, focused: bool, colors: &UiColors) -> Line<'static> {
    let label = format!("{:<width$}", format!("{}:", field.label()), width = label_width);
    let value_style = if focused {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::styled(label, header_text_style(colors)),
        Span::styled(field.value().to_string(), value_style),
    ])
}

fn selection_style(colors: &UiColors) -> Style {
    Style::default()
        .fg(color(colors.selection_fg))
        .bg(color(colors.selection_bg))
}

fn border_style(colors: &UiColors) -> Style {
    Style::default().fg(color(colors.border))
}

fn header_text_style(colors: &UiColors) -> Style {
    Style::default().fg(color(colors.border))
}

fn color(rgb: RgbColor) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}
