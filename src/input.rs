use crate::model::Mode;
use crate::sim::Command;
use crossterm::event::KeyCode;

/// Per-mode key mapping; the caller has already filtered to key presses.
pub(crate) fn map_key(mode: Mode, key: KeyCode) -> Option<Command> {
    // Quit wins over everything, including the any-key restart.
    if matches!(key, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc) {
        return Some(Command::Quit);
    }

    match mode {
        Mode::Start => match key {
            KeyCode::Enter => Some(Command::Confirm),
            _ => None,
        },
        Mode::GameOver | Mode::Win => Some(Command::Restart),
        Mode::Playing => match key {
            KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => {
                Some(Command::Move { dcol: 0, drow: -1 })
            }
            KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => {
                Some(Command::Move { dcol: 0, drow: 1 })
            }
            KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => {
                Some(Command::Move { dcol: -1, drow: 0 })
            }
            KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => {
                Some(Command::Move { dcol: 1, drow: 0 })
            }
            KeyCode::Char('p') | KeyCode::Char('P') => Some(Command::TogglePause),
            _ => None,
        },
        Mode::Paused => match key {
            KeyCode::Char('p') | KeyCode::Char('P') => Some(Command::TogglePause),
            _ => None,
        },
    }
}
