//! Full-screen terminal output for the player.

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute, queue,
    style::Print,
    terminal::{self, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io::{self, BufWriter, Stdout, Write};
use std::time::Duration;

/// Owns the terminal while frames are shown. Dropping it restores the
/// cursor, the main screen and cooked mode, also on the error path.
pub struct Screen {
    out: BufWriter<Stdout>,
}

impl Screen {
    pub fn new() -> io::Result<Self> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            cursor::Hide,
            terminal::Clear(ClearType::All)
        )?;
        // From here on Drop undoes the setup, even if raw mode fails
        let screen = Self {
            out: BufWriter::new(stdout),
        };
        terminal::enable_raw_mode()?;
        Ok(screen)
    }

    /// Draw one frame from the top-left corner, one row per line.
    pub fn draw(&mut self, rows: &[String]) -> io::Result<()> {
        for (i, row) in rows.iter().enumerate() {
            let y = u16::try_from(i).unwrap_or(u16::MAX);
            queue!(self.out, cursor::MoveTo(0, y), Print(row))?;
        }
        self.out.flush()
    }

    /// Wait up to `timeout` for input. Returns true when the user asked to quit.
    pub fn wait_for_quit(&self, timeout: Duration) -> io::Result<bool> {
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                return Ok(is_quit_key(key));
            }
        }
        Ok(false)
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        let _ = self.out.flush();
        let _ = terminal::disable_raw_mode();
        let _ = execute!(io::stdout(), cursor::Show, LeaveAlternateScreen);
    }
}

/// Raw mode swallows Ctrl-C, so it is handled as a key.
pub fn is_quit_key(key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}
