//! UI rendering functions

use ratatui::prelude::*;
use ratatui::widgets::{
    Block, Borders, Cell, Paragraph, Row, Scrollbar, ScrollbarOrientation, ScrollbarState, Table,
    Wrap,
};

use crate::app::App;
use getrid::types::*;

const HELP_TEXT: &str = "\
Enter/Space/d  mark for removal (or click)
t              keep for now (this run only)
e              keep forever (remembered)
s              show/hide kept packages
Same key again clears the mark.

j/k, arrows, wheel  move
→/l                 refresh details
q                   done";

pub fn ui(frame: &mut Frame, app: &mut App) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(10),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let tallies = app.session.ledger().tallies();
    let title_text = if tallies.remove.count > 0 {
        format!(
            " getrid │ {} marked │ >={} reclaimable ",
            tallies.remove.count,
            human_size(app.session.ledger().reclaimable_size())
        )
    } else {
        " getrid │ Nothing marked for removal ".to_string()
    };
    let title = Paragraph::new(title_text)
        .style(Style::default().fg(Color::White).bg(Color::Blue).bold());
    frame.render_widget(title, main_chunks[0]);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(main_chunks[1]);

    render_package_table(frame, app, panes[0]);
    render_side_pane(frame, app, panes[1]);

    let status = Paragraph::new(app.status_message.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, main_chunks[2]);

    let help = Paragraph::new("Space:Remove │ t:Keep now │ e:Keep forever │ s:Show/hide │ q:Quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, main_chunks[3]);
}

fn render_package_table(frame: &mut Frame, app: &mut App, area: Rect) {
    app.table_area = area;

    let header = Row::new(
        ["", "Size", "Package"]
            .map(|h| Cell::from(h).style(Style::default().fg(Color::Cyan).bold())),
    )
    .height(1);

    let rows: Vec<Row> = app
        .rows
        .iter()
        .map(|(pkg, disposition)| {
            let style = match disposition {
                Disposition::None => Style::default(),
                _ => Style::default().fg(Color::White).bg(disposition.color()),
            };
            Row::new(vec![
                Cell::from(disposition.symbol()),
                Cell::from(pkg.size_str()),
                Cell::from(pkg.name.as_str()),
            ])
            .style(style)
        })
        .collect();

    let widths = [Constraint::Length(1), Constraint::Length(10), Constraint::Min(10)];

    let title = if app.session.view().is_hidden() {
        format!(" Packages ({} of {}) ", app.rows.len(), app.session.package_count())
    } else {
        format!(" Packages ({}) ", app.rows.len())
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("▶ ");

    frame.render_stateful_widget(table, area, &mut app.table_state);

    if !app.session.view().is_empty() {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"));

        let mut scrollbar_state = ScrollbarState::new(app.rows.len())
            .position(app.table_state.selected().unwrap_or(0));

        let scrollbar_area = Rect {
            x: area.x + area.width.saturating_sub(1),
            y: area.y + 1,
            width: 1,
            height: area.height.saturating_sub(2),
        };
        frame.render_stateful_widget(scrollbar, scrollbar_area, &mut scrollbar_state);
    }
}

fn render_side_pane(frame: &mut Frame, app: &App, area: Rect) {
    let help_height = HELP_TEXT.lines().count() as u16 + 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(help_height),
            Constraint::Length(7),
            Constraint::Min(3),
        ])
        .split(area);

    let help = Paragraph::new(HELP_TEXT).block(
        Block::default()
            .title(" Keys ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(help, chunks[0]);

    let legend_style = |d: Disposition| Style::default().fg(d.color()).bold();
    let summary_text = app.session.summary();
    let mut summary: Vec<Line> = summary_text.lines().map(Line::from).collect();
    // Colour the three disposition rows like the package list
    for (idx, disposition) in [
        (1, Disposition::MarkForRemoval),
        (2, Disposition::KeepForever),
        (3, Disposition::KeepForNow),
    ] {
        if let Some(line) = summary.get_mut(idx) {
            line.style = legend_style(disposition);
        }
    }
    let stats = Paragraph::new(summary).block(
        Block::default()
            .title(" Summary ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(stats, chunks[1]);

    let title = match app.session.selected_package() {
        Some(pkg) => format!(" {} ", pkg.name),
        None => " Package info ".to_string(),
    };
    let info = Paragraph::new(app.details.text.as_str())
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.details.scroll, 0));
    frame.render_widget(info, chunks[2]);
}

/// Width available to the details text for a terminal `width` columns wide
pub fn details_width(width: u16) -> u16 {
    (width - width / 2).saturating_sub(2).max(1)
}
