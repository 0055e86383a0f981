use brainstorm_core::{LoadState, Presence, RoomCategory, UiMessage, UiRole};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthChar;

use crate::app::{App, DirectoryRow, FocusPane, InputMode};

const NAV_WIDTH: u16 = 28;
const NAV_COLLAPSED_WIDTH: u16 = 5;
const SIDEBAR_WIDTH: u16 = 36;

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            chars.next();

            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            let mut bold_text = String::new();
            let mut found_close = false;
            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(bold_text, Style::default().add_modifier(Modifier::BOLD)));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    Line::from(spans)
}

fn role_color(role: Option<UiRole>) -> Color {
    match role {
        Some(UiRole::Expert) => Color::Blue,
        Some(UiRole::Moderator) => Color::Magenta,
        Some(UiRole::Companion) => Color::Green,
        None => Color::Yellow,
    }
}

fn focus_color(focused: bool) -> Color {
    if focused {
        Color::Cyan
    } else {
        Color::DarkGray
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    let nav_width = if app.nav_collapsed { NAV_COLLAPSED_WIDTH } else { NAV_WIDTH };
    let [nav_area, thread_area, sidebar_area] = Layout::horizontal([
        Constraint::Length(nav_width),
        Constraint::Min(30),
        Constraint::Length(SIDEBAR_WIDTH),
    ])
    .areas(body_area);

    // Store areas for mouse hit-testing
    app.rooms_area = Some(nav_area);
    app.thread_area = Some(thread_area);
    app.sidebar_area = Some(sidebar_area);

    render_rooms(app, frame, nav_area);
    render_thread(app, frame, thread_area);
    render_sidebar(app, frame, sidebar_area);

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let (humans, ai) = app.roster.counts();
    let sync_indicator = match app.sync.load_state() {
        LoadState::Loading => " syncing…",
        LoadState::Failed(_) => " offline",
        LoadState::Ready => " live",
        LoadState::Idle => " local",
    };

    let title = Line::from(vec![
        Span::styled(" Brainstorm ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("{} humans, {} AI", humans, ai),
            Style::default().fg(Color::White),
        ),
        Span::styled(sync_indicator, Style::default().fg(Color::DarkGray)),
        Span::raw(" "),
        Span::styled(
            format!("as {}", app.sync.user_id()),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " INSERT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let hint = |key: &'static str, label: &'static str| {
        [Span::styled(key, key_style), Span::styled(label, label_style)]
    };

    let mut hints: Vec<Span> = Vec::new();
    match app.input_mode {
        InputMode::Editing => {
            hints.extend(hint(" Enter ", " send "));
            hints.extend(hint(" Esc ", " stop typing "));
        }
        InputMode::Normal => {
            match app.focus {
                FocusPane::Rooms => {
                    hints.extend(hint(" j/k ", " rooms "));
                    hints.extend(hint(" Enter ", " join "));
                }
                FocusPane::Thread => {
                    hints.extend(hint(" j/k ", " message "));
                    hints.extend(hint(" p ", " pin "));
                    hints.extend(hint(" + ", " react "));
                    hints.extend(hint(" G ", " latest "));
                }
                FocusPane::Sidebar => {
                    hints.extend(hint(" j/k ", " agents "));
                    hints.extend(hint(" a ", " add to room "));
                }
                FocusPane::Input => {
                    hints.extend(hint(" i ", " write "));
                }
            }
            hints.extend(hint(" Tab ", " focus "));
            hints.extend(hint(" [ ", if app.nav_collapsed { " rooms " } else { " hide rooms " }));
            hints.extend(hint(" r ", " refresh "));
            hints.extend(hint(" q ", " quit "));
        }
    }

    if let Some(status) = &app.status {
        hints.push(Span::styled(
            format!("  {}", status),
            Style::default().bg(Color::Black).fg(Color::Yellow),
        ));
    }

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_rooms(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(focus_color(app.focus == FocusPane::Rooms)));

    let collapsed = app.nav_collapsed;
    let active_room = app.active_room.clone();
    let mut previous: Option<RoomCategory> = None;

    let items: Vec<ListItem> = app
        .rooms
        .iter()
        .map(|room| {
            let marker = if room.id == active_room { "#" } else { " " };
            let name_style = if room.id == active_room {
                Style::default().fg(Color::Cyan).bold()
            } else {
                Style::default()
            };

            if collapsed {
                let initial: String = room.name.chars().take(1).collect();
                return ListItem::new(Line::from(Span::styled(initial, name_style)));
            }

            let mut lines = Vec::new();
            if previous != Some(room.category) {
                if previous.is_some() {
                    lines.push(Line::default());
                }
                lines.push(Line::from(Span::styled(
                    room.category.title().to_uppercase(),
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
                )));
                previous = Some(room.category);
            }
            lines.push(Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::DarkGray)),
                Span::styled(format!(" {}", room.name), name_style),
            ]));
            ListItem::new(Text::from(lines))
        })
        .collect();

    let block = if collapsed { block } else { block.title(" Rooms ") };
    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(if collapsed { "" } else { "> " });

    frame.render_stateful_widget(list, area, &mut app.room_state);
}

fn message_lines(message: &UiMessage, selected: bool, animation_frame: u8) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let accent = role_color(message.role);

    let author_style = if message.is_current_user() {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(accent).add_modifier(Modifier::BOLD)
    };

    let mut heading = vec![
        Span::styled(
            if selected { "> " } else { "  " },
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(format!("[{}] ", message.avatar), Style::default().fg(accent)),
        Span::styled(message.author.clone(), author_style),
    ];
    if let Some(role) = message.role {
        heading.push(Span::raw(" "));
        heading.push(Span::styled(
            format!(" {} ", role.badge()),
            Style::default().bg(accent).fg(Color::Black),
        ));
    }
    heading.push(Span::styled(
        format!("  {}", message.timestamp),
        Style::default().fg(Color::DarkGray),
    ));
    lines.push(Line::from(heading));

    if message.is_typing {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat(animation_frame as usize + 1);
        lines.push(Line::from(Span::styled(
            format!("    thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    } else {
        for text in message.content.lines() {
            let mut line = parse_markdown_line(text);
            line.spans.insert(0, Span::raw("    "));
            lines.push(line);
        }
    }

    if !message.reactions.is_empty() {
        let reactions = message
            .reactions
            .iter()
            .map(|r| format!("{} {}", r.emoji, r.count))
            .collect::<Vec<_>>()
            .join("  ");
        lines.push(Line::from(Span::styled(
            format!("    {}", reactions),
            Style::default().fg(Color::DarkGray),
        )));
    }

    lines.push(Line::default());
    lines
}

/// Rows a set of lines occupies once wrapped to `width`.
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
    let width = width.max(1) as usize;
    lines
        .iter()
        .map(|line| line.width().max(1).div_ceil(width) as u16)
        .fold(0u16, |acc, rows| acc.saturating_add(rows))
}

fn render_thread(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    let room_name = app
        .active_room()
        .map(|room| room.name.clone())
        .unwrap_or_default();
    let mut title = format!(" {} • {} messages ", room_name, app.sync.messages().len());
    if let Some(discussion) = app.sync.discussion().filter(|d| !d.title.is_empty()) {
        title = format!("{}· {} ", title, discussion.title);
    }

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(focus_color(app.focus == FocusPane::Thread)))
        .title(title);

    let mut lines: Vec<Line> = Vec::new();
    if let Some(reason) = app.sync.error() {
        lines.push(Line::from(Span::styled(
            "Error loading messages",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            format!("{} (r to retry)", reason),
            Style::default().fg(Color::DarkGray),
        )));
        lines.push(Line::default());
    }

    if app.sync.messages().is_empty() {
        let placeholder = if app.sync.is_loading() {
            "Loading messages…"
        } else {
            "No messages yet. Start the conversation!"
        };
        if app.sync.error().is_none() {
            lines.push(Line::from(Span::styled(
                placeholder,
                Style::default().fg(Color::DarkGray),
            )));
        }
    } else {
        for (i, message) in app.sync.messages().iter().enumerate() {
            let selected = app.selected_message == Some(i);
            lines.extend(message_lines(message, selected, app.animation_frame));
        }
    }

    let inner_width = chat_area.width.saturating_sub(2);
    let inner_height = chat_area.height.saturating_sub(2);
    let max_scroll = wrapped_height(&lines, inner_width).saturating_sub(inner_height);
    if app.follow_tail || app.thread_scroll > max_scroll {
        app.thread_scroll = max_scroll;
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((app.thread_scroll, 0));
    frame.render_widget(chat, chat_area);

    render_input(app, frame, input_area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if app.focus == FocusPane::Input || editing {
        Color::Yellow
    } else {
        Color::DarkGray
    };

    let title = if app.sync.has_pending_reply() {
        " Message (waiting for a reply) "
    } else {
        " Message (i to write) "
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let (visible_text, cursor_x) =
        input_viewport(&app.input, app.input_cursor, area.width.saturating_sub(2) as usize);

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(input, area);

    if editing {
        frame.set_cursor_position((area.x + cursor_x as u16 + 1, area.y + 1));
    }
}

/// Slice of `input` that fits in `width` columns with the cursor (a char
/// index) in view, plus the cursor's column inside that slice. Columns are
/// display widths, so wide glyphs take two.
fn input_viewport(input: &str, cursor: usize, width: usize) -> (String, usize) {
    let widths: Vec<usize> = input
        .chars()
        .map(|c| UnicodeWidthChar::width(c).unwrap_or(0))
        .collect();
    let cursor = cursor.min(widths.len());

    // Leave one column for the cursor cell itself
    let mut start = 0;
    let mut cursor_x: usize = widths[..cursor].iter().sum();
    while start < cursor && cursor_x + 1 > width {
        cursor_x -= widths[start];
        start += 1;
    }

    let mut used = 0;
    let visible = input
        .chars()
        .zip(&widths)
        .skip(start)
        .take_while(|(_, w)| {
            used += **w;
            used <= width
        })
        .map(|(c, _)| c)
        .collect();

    (visible, cursor_x)
}

fn render_sidebar(app: &mut App, frame: &mut Frame, area: Rect) {
    let pinned_height = (app.pinned_ideas.len().min(4) * 2 + 2) as u16;
    let people_height = (app.roster.len().min(8) + 2) as u16;
    let sessions_height = (app.seed.sessions.len() * 2 + 2) as u16;

    let [pinned_area, people_area, directory_area, sessions_area] = Layout::vertical([
        Constraint::Length(pinned_height),
        Constraint::Length(people_height),
        Constraint::Min(4),
        Constraint::Length(sessions_height),
    ])
    .areas(area);

    let border = Style::default().fg(focus_color(app.focus == FocusPane::Sidebar));

    // Pinned ideas
    let pinned: Vec<Line> = app
        .pinned_ideas
        .iter()
        .take(4)
        .flat_map(|idea| {
            [
                Line::from(Span::raw(format!("📌 {}", idea.content))),
                Line::from(Span::styled(
                    format!("   {} · {} · ▲ {}", idea.author, idea.timestamp, idea.votes),
                    Style::default().fg(Color::DarkGray),
                )),
            ]
        })
        .collect();
    let pinned = Paragraph::new(pinned)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(format!(" Pinned Ideas ({}) ", app.pinned_ideas.len())),
        );
    frame.render_widget(pinned, pinned_area);

    // Participants
    let people: Vec<Line> = app
        .roster
        .participants()
        .iter()
        .map(|p| {
            let dot_color = match p.status {
                Presence::Active => Color::Green,
                Presence::Away => Color::Yellow,
            };
            let mut spans = vec![
                Span::styled("● ", Style::default().fg(dot_color)),
                Span::raw(p.name.clone()),
            ];
            if let Some(role) = p.role {
                spans.push(Span::styled(
                    format!(" {}", role.abbreviation()),
                    Style::default().fg(role_color(Some(role))),
                ));
            } else if p.status == Presence::Away {
                spans.push(Span::styled(
                    format!(" {}", p.status.label()),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            Line::from(spans)
        })
        .collect();
    let people = Paragraph::new(people).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(format!(" Participants ({}) ", app.roster.len())),
    );
    frame.render_widget(people, people_area);

    // Agent directory
    let loading = app.directory_task.is_some();
    let items: Vec<ListItem> = app
        .directory_rows
        .iter()
        .map(|row| match row {
            DirectoryRow::Tag(tag) => ListItem::new(Line::from(Span::styled(
                tag.clone(),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
            ))),
            DirectoryRow::Agent(agent) => {
                let role = UiRole::parse(&agent.role);
                let mut spans = vec![Span::raw(format!(" {}", agent.display_name))];
                if let Some(role) = role {
                    spans.push(Span::styled(
                        format!(" {}", role.abbreviation()),
                        Style::default().fg(role_color(Some(role))),
                    ));
                }
                if app.roster.contains(&agent.display_name) {
                    spans.push(Span::styled(" ✓", Style::default().fg(Color::Green)));
                }
                ListItem::new(Line::from(spans))
            }
        })
        .collect();
    let directory_title = if loading { " Agents (loading…) " } else { " Agents " };
    let directory = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(directory_title),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    frame.render_stateful_widget(directory, directory_area, &mut app.directory_state);

    // Upcoming sessions
    let sessions: Vec<Line> = app
        .seed
        .sessions
        .iter()
        .flat_map(|session| {
            [
                Line::from(Span::raw(session.title.clone())),
                Line::from(Span::styled(
                    format!("  {} · {} people", session.time, session.participants),
                    Style::default().fg(Color::DarkGray),
                )),
            ]
        })
        .collect();
    let sessions = Paragraph::new(sessions).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Upcoming "),
    );
    frame.render_widget(sessions, sessions_area);
}
