use anyhow::Result;
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::line::NORMAL as LINE;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
// Use Popup from tui-widgets to render modals
use tui_widgets::popup::Popup;

use crate::config::RgbColor;
use crate::contact::Contact;
use crate::listing::{ListEntry, ListMarkup};
use crate::location::Route;
use crate::navigation::LinkState;

use super::app::{App, Focus};
use super::edit::{ContactEditor, Field};

const SEARCH_HELP_INPUT: &str = "Type to filter  Esc: focus list  Enter: open";
const LIST_HELP: &str =
    "j/k: nav  Enter: open  /: search  n: new  [/]: back/forward  r: reload  q: quit";
const DETAIL_HELP: &str = "e: edit  f: favorite  d: delete  h/Esc: list  n: new  q: quit";
const EDITOR_HELP: &str = "Tab: next field  Enter: save  Esc: cancel";
const CONFIRM_HELP: &str = "Y/Enter: confirm  N/Esc: cancel";

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
    draw_body(frame, layout[1], app);
    draw_footer(frame, layout[2], app);
    draw_confirm_modal(frame, size, app);
}

fn draw_header(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let header_style = header_text_style(app);
    let history = app.session.history();
    let mut spans = vec![Span::styled(
        format!("ROLO://{}", app.session.location().href().trim_start_matches('/')),
        header_style,
    )];
    if let Some(pending) = app.session.pending() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("{} {}", app.spinner(), pending.href()),
            pending_style(app),
        ));
    }
    spans.push(Span::raw("   "));
    spans.push(Span::styled(
        format!(
            "{}{}/{}{}",
            if history.can_go_back() { "< " } else { "  " },
            history.index() + 1,
            history.len(),
            if history.can_go_forward() { " >" } else { "  " },
        ),
        header_style,
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_body(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(app.config().ui.sidebar_width),
            Constraint::Min(0),
        ])
        .split(area);
    draw_sidebar(frame, chunks[0], app);
    draw_detail(frame, chunks[1], app);
}

fn draw_sidebar(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)])
        .split(inner);

    draw_search_header(frame, layout[0], app, area.width);
    draw_contact_list(frame, layout[1], app);
}

fn draw_search_header(frame: &mut Frame<'_>, area: Rect, app: &App, outer_width: u16) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let active = app.focus == Focus::Search;
    let label = if app.session.status().searching() {
        format!("SEARCH {} ", app.spinner())
    } else {
        "SEARCH: ".to_string()
    };
    let value_style = if active {
        selection_style(app)
    } else {
        Style::default()
    };
    let cursor_column = active.then(|| Span::raw(label.as_str()).width() + app.search_input.visual_cursor());
    let line = Line::from(vec![
        Span::styled(label, header_text_style(app)),
        Span::styled(app.search_input.value().to_string(), value_style),
    ]);

    render_header_with_separator(frame, area, line, app, outer_width);

    if let Some(column) = cursor_column {
        let x = area.x.saturating_add(column as u16);
        frame.set_cursor_position((x, area.y));
    }
}

fn draw_contact_list(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let labels = &app.config().ui.labels;
    let markup = app.session.list();
    let items: Vec<ListItem> = match &markup {
        ListMarkup::Empty => vec![ListItem::new(Line::from(Span::styled(
            labels.empty.clone(),
            Style::default().add_modifier(Modifier::ITALIC),
        )))],
        ListMarkup::Entries(entries) => entries
            .iter()
            .map(|entry| build_list_item(entry, app))
            .collect(),
    };

    let mut state = ListState::default();
    if !markup.is_empty_marker() && matches!(app.focus, Focus::List | Focus::Search) {
        state.select(Some(app.selected));
    }

    let list = List::new(items)
        .highlight_style(selection_style(app))
        .highlight_symbol(" ")
        .repeat_highlight_symbol(false);

    frame.render_stateful_widget(list, area, &mut state);
}

fn build_list_item(entry: &ListEntry, app: &App) -> ListItem<'static> {
    let text = entry.text(&app.config().ui.labels);
    let style = match entry.link {
        LinkState::Active => active_style(app),
        LinkState::Pending => pending_style(app),
        LinkState::Idle => Style::default(),
    };
    ListItem::new(Line::from(text)).style(style)
}

fn draw_detail(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)])
        .split(inner);

    let route = app.session.route();
    let title = match (&route, app.session.detail()) {
        (Route::EditContact(_), _) => "EDIT CONTACT".to_string(),
        (_, Some(contact)) => contact
            .full_name()
            .unwrap_or_else(|| app.config().ui.labels.no_name.clone())
            .to_uppercase(),
        _ => "CONTACTS".to_string(),
    };
    let header = Line::from(Span::styled(title, header_text_style(app)));
    render_header_with_separator(frame, layout[0], header, app, area.width);

    // a detail load is in flight: dim what is on screen until it lands
    let body_style = if app.session.status().loading_detail_pane() {
        Style::default().add_modifier(Modifier::DIM)
    } else {
        Style::default()
    };

    match (route, app.session.detail(), app.editor.as_ref()) {
        (Route::EditContact(_), _, Some(editor)) => {
            draw_editor(frame, layout[1], app, editor, body_style)
        }
        (_, Some(contact), _) => {
            let lines = contact_lines(app, contact);
            frame.render_widget(
                Paragraph::new(lines)
                    .style(body_style)
                    .wrap(Wrap { trim: false }),
                layout[1],
            );
        }
        _ => {
            let lines = vec![
                Line::from("Pick a contact from the list, or press n to create one."),
                Line::from(""),
                Line::from(format!("{} contacts", app.session.contacts().len())),
            ];
            frame.render_widget(Paragraph::new(lines).style(body_style), layout[1]);
        }
    }
}

fn contact_lines(app: &App, contact: &Contact) -> Vec<Line<'static>> {
    let label_style = header_text_style(app);
    let mut lines = Vec::new();

    let mut field = |label: &str, value: Option<&str>| {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            lines.push(Line::from(vec![
                Span::styled(format!("{:<9}", format!("{}:", label)), label_style),
                Span::raw(value.to_string()),
            ]));
        }
    };
    field("Twitter", contact.twitter.as_deref());
    field("Avatar", contact.avatar.as_deref());
    field("Notes", contact.notes.as_deref());

    if contact.favorite {
        lines.push(Line::from(Span::styled(
            format!("{} favorite", app.config().ui.labels.favorite),
            active_style(app),
        )));
    }
    if lines.is_empty() {
        lines.push(Line::from("No data"));
    }
    lines
}

fn draw_editor(
    frame: &mut Frame<'_>,
    area: Rect,
    app: &App,
    editor: &ContactEditor,
    style: Style,
) {
    let label_width = Field::ALL
        .iter()
        .map(|f| f.label().len() + 2)
        .max()
        .unwrap_or(0);

    let mut lines = Vec::new();
    let mut cursor = None;
    for (index, field) in Field::ALL.iter().enumerate() {
        let active = *field == editor.active();
        let label = format!("{:<width$}", format!("{}:", field.label()), width = label_width);
        let value_style = if active {
            selection_style(app)
        } else {
            Style::default()
        };
        if active {
            cursor = Some((index, label_width + editor.visual_cursor()));
        }
        lines.push(Line::from(vec![
            Span::styled(label, header_text_style(app)),
            Span::styled(editor.value(*field).to_string(), value_style),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).style(style), area);

    if app.focus == Focus::Editor {
        if let Some((row, column)) = cursor {
            let x = area.x.saturating_add(column as u16);
            let y = area.y.saturating_add(row as u16);
            frame.set_cursor_position((x, y));
        }
    }
}

fn draw_footer(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let colors = app.ui_colors();
    let (message, fg) = if app.confirm_modal.is_some() {
        (CONFIRM_HELP.to_string(), colors.status_fg)
    } else if let Some(status) = &app.status {
        let fg = if app.session.error().is_some() {
            colors.error_fg
        } else {
            colors.status_fg
        };
        (status.clone(), fg)
    } else {
        let help = match app.focus {
            Focus::Search => SEARCH_HELP_INPUT,
            Focus::List => LIST_HELP,
            Focus::Detail => DETAIL_HELP,
            Focus::Editor => EDITOR_HELP,
        };
        (help.to_string(), colors.status_fg)
    };

    let style = Style::default().fg(color(fg)).bg(color(colors.status_bg));
    let background = Block::default().style(Style::default().bg(color(colors.status_bg)));
    frame.render_widget(background, area);
    frame.render_widget(Paragraph::new(message).style(style), area);
}

fn draw_confirm_modal(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    let Some(modal) = app.confirm_modal.as_ref() else {
        return;
    };

    let body_text = Text::from(vec![
        Line::from(modal.message.clone()),
        Line::from(""),
        Line::from(CONFIRM_HELP),
    ]);
    let title_line = Line::from(Span::styled(modal.title.clone(), header_text_style(app)));
    let popup = Popup::new(body_text)
        .title(title_line)
        .border_style(border_style(app));

    frame.render_stateful_widget_ref(popup, area, &mut app.modal_popup);
}

/// Render a header line with a connected separator below it.
/// `outer_width` is the full pane width including borders.
fn render_header_with_separator(
    frame: &mut Frame<'_>,
    area: Rect,
    content: Line<'_>,
    app: &App,
    outer_width: u16,
) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    if area.height == 1 {
        frame.render_widget(Paragraph::new(content), area);
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    frame.render_widget(Paragraph::new(content), layout[0]);

    // ├───┤
    let inner_width = outer_width.saturating_sub(2) as usize;
    let separator = format!(
        "{}{}{}",
        LINE.vertical_right,
        LINE.horizontal.repeat(inner_width),
        LINE.vertical_left
    );
    let separator_line = Line::from(Span::styled(separator, separator_style(app)));

    // shifted left by 1 to start at the border
    let separator_area = Rect {
        x: layout[1].x.saturating_sub(1),
        y: layout[1].y,
        width: outer_width,
        height: 1,
    };
    frame.render_widget(Paragraph::new(separator_line), separator_area);
}

fn selection_style(app: &App) -> Style {
    let colors = app.ui_colors();
    Style::default()
        .fg(color(colors.selection_fg))
        .bg(color(colors.selection_bg))
}

fn active_style(app: &App) -> Style {
    Style::default()
        .fg(color(app.ui_colors().active_fg))
        .add_modifier(Modifier::BOLD)
}

fn pending_style(app: &App) -> Style {
    Style::default()
        .fg(color(app.ui_colors().pending_fg))
        .add_modifier(Modifier::ITALIC)
}

fn border_style(app: &App) -> Style {
    Style::default().fg(color(app.ui_colors().border))
}

fn header_text_style(app: &App) -> Style {
    Style::default().fg(color(app.ui_colors().separator))
}

fn separator_style(app: &App) -> Style {
    Style::default().fg(color(app.ui_colors().separator))
}

fn color(rgb: RgbColor) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}
