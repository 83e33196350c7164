use super::render::{Frame, Line};
use crate::error::SoonlyResult;
use crossterm::cursor::{Hide, MoveTo, MoveToNextLine, Show};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use std::io::{self, Write};

/// Something that can show a rendered overlay
pub trait Presenter: Send {
    fn present(&mut self, frame: &Frame) -> SoonlyResult<()>;
}

/// Raw mode on the alternate screen, restored when dropped
pub struct TerminalSession;

impl TerminalSession {
    pub fn enter() -> SoonlyResult<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, Hide)?;
        Ok(Self)
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

/// Draws the overlay in a terminal
pub struct TerminalPresenter<W: Write + Send> {
    out: W,
    last: Option<Frame>,
}

impl TerminalPresenter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out, last: None }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn color(tone: &str) -> Color {
        match tone {
            "safe" => Color::Green,
            "warning" => Color::DarkYellow,
            "critical" | "active" | "stale" => Color::Red,
            "current" => Color::Yellow,
            "gap" | "muted" | "idle" => Color::DarkGrey,
            _ => Color::Reset,
        }
    }

    fn queue_line(&mut self, line: &Line) -> io::Result<()> {
        queue!(self.out, SetForegroundColor(Self::color(line.tone)))?;
        // Raw mode doesn't return the carriage on '\n'
        for part in line.text.split('\n') {
            queue!(self.out, Print(part), MoveToNextLine(1))?;
        }
        queue!(self.out, ResetColor)
    }
}

impl<W: Write + Send> Presenter for TerminalPresenter<W> {
    fn present(&mut self, frame: &Frame) -> SoonlyResult<()> {
        if self.last.as_ref() == Some(frame) {
            return Ok(());
        }

        queue!(self.out, MoveTo(0, 0), Clear(ClearType::All))?;
        if let Some(age) = &frame.cache_age {
            self.queue_line(age)?;
        }
        self.queue_line(&frame.countdown)?;
        queue!(self.out, MoveToNextLine(1))?;
        for row in &frame.rows {
            self.queue_line(row)?;
        }
        self.out.flush()?;

        self.last = Some(frame.clone());
        Ok(())
    }
}
