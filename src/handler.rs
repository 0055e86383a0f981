use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, FocusPane, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
            app.poll_directory().await;
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    app.status = None;

    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,

        // Focus
        KeyCode::Tab => app.focus = app.focus.next(),
        KeyCode::BackTab => app.focus = app.focus.prev(),
        KeyCode::Char('i') => {
            app.focus = FocusPane::Input;
            app.input_mode = InputMode::Editing;
        }

        // Navigation
        KeyCode::Char('j') | KeyCode::Down => match app.focus {
            FocusPane::Rooms => app.rooms_nav_down(),
            FocusPane::Thread => app.thread_nav_down(),
            FocusPane::Sidebar => app.directory_nav_down(),
            FocusPane::Input => {}
        },
        KeyCode::Char('k') | KeyCode::Up => match app.focus {
            FocusPane::Rooms => app.rooms_nav_up(),
            FocusPane::Thread => app.thread_nav_up(),
            FocusPane::Sidebar => app.directory_nav_up(),
            FocusPane::Input => {}
        },
        KeyCode::Char('G') => app.jump_to_latest(),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_thread_down(10);
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_thread_up(10);
        }

        // Enter/Select
        KeyCode::Enter => match app.focus {
            FocusPane::Rooms => app.enter_selected_room(),
            FocusPane::Sidebar => app.add_selected_agent(),
            FocusPane::Input => app.input_mode = InputMode::Editing,
            FocusPane::Thread => {}
        },

        // Panels
        KeyCode::Char('[') => app.toggle_nav(),

        // Thread actions
        KeyCode::Char('r') => app.sync.refetch(),
        KeyCode::Char('p') => app.pin_selected_message(),
        KeyCode::Char('+') if app.focus == FocusPane::Thread => app.react_to_selected("👍"),

        // Sidebar actions
        KeyCode::Char('a') => app.add_selected_agent(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            app.submit_input();
        }
        KeyCode::Backspace => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
                app.input_changed();
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.input_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
                app.input_changed();
            }
        }
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
            app.input.insert(byte_pos, c);
            app.input_cursor += 1;
            app.input_changed();
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    let in_rooms = app.rooms_area.is_some_and(|r| point_in_rect(x, y, r));
    let in_thread = app.thread_area.is_some_and(|r| point_in_rect(x, y, r));
    let in_sidebar = app.sidebar_area.is_some_and(|r| point_in_rect(x, y, r));

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            if in_thread {
                app.scroll_thread_down(3);
            } else if in_rooms {
                app.rooms_nav_down();
            } else if in_sidebar {
                app.directory_nav_down();
            }
        }
        MouseEventKind::ScrollUp => {
            if in_thread {
                app.scroll_thread_up(3);
            } else if in_rooms {
                app.rooms_nav_up();
            } else if in_sidebar {
                app.directory_nav_up();
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_to_byte_index_handles_multibyte() {
        let s = "héllo 🌟!";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 2), 3);
        assert_eq!(char_to_byte_index(s, 7), s.len() - 1);
        assert_eq!(char_to_byte_index(s, 99), s.len());
    }

    #[test]
    fn test_point_in_rect_edges() {
        let rect = Rect::new(2, 2, 4, 3);
        assert!(point_in_rect(2, 2, rect));
        assert!(point_in_rect(5, 4, rect));
        assert!(!point_in_rect(6, 4, rect));
        assert!(!point_in_rect(2, 5, rect));
    }
}
