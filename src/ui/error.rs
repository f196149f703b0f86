//! Full-screen error display.
//!
//! Used when a failure ends the recording workflow, so the message is not lost
//! when the alternate screen closes.

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Paragraph, Wrap},
};
use std::io::{self, Stdout};
use std::time::Duration;

const BACKGROUND: Color = Color::Rgb(160, 20, 30);

pub struct ErrorScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    active: bool,
}

impl ErrorScreen {
    /// Enters the alternate screen in raw mode.
    ///
    /// # Errors
    /// If the terminal cannot be initialized.
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self {
            terminal,
            active: true,
        })
    }

    /// Shows `message` until a key is pressed.
    ///
    /// Each line of the message is centered; long lines wrap at 80% of the width.
    ///
    /// # Errors
    /// If drawing or reading input fails.
    pub fn show_error(&mut self, message: &str) -> anyhow::Result<()> {
        let lines: Vec<Line> = message.lines().map(Line::from).collect();
        let line_count = lines.len() as u16;
        let text = Text::from(lines).style(Style::default().fg(Color::White));

        loop {
            self.terminal.draw(|frame| {
                let area = frame.area();
                frame.render_widget(Block::default().style(Style::default().bg(BACKGROUND)), area);

                let width = area.width * 8 / 10;
                let top = area.y + area.height.saturating_sub(line_count) / 2;
                let body = Rect {
                    x: area.x + (area.width - width) / 2,
                    y: top,
                    width,
                    height: area.height.saturating_sub(top - area.y).saturating_sub(1),
                };
                frame.render_widget(
                    Paragraph::new(text.clone())
                        .alignment(Alignment::Center)
                        .wrap(Wrap { trim: true }),
                    body,
                );

                let hint = Rect {
                    x: area.x,
                    y: area.y + area.height.saturating_sub(1),
                    width: area.width,
                    height: 1,
                };
                frame.render_widget(
                    Paragraph::new("press any key")
                        .alignment(Alignment::Center)
                        .style(Style::default().fg(Color::Rgb(240, 190, 190))),
                    hint,
                );
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(_) = event::read()? {
                    return Ok(());
                }
            }
        }
    }

    /// Restores the terminal. Safe to call more than once.
    ///
    /// # Errors
    /// If the terminal mode cannot be restored.
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for ErrorScreen {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Shows `message` on an error screen and restores the terminal.
///
/// # Errors
/// If the error screen cannot be drawn.
pub fn report(message: &str) -> anyhow::Result<()> {
    let mut screen = ErrorScreen::new()?;
    screen.show_error(message)?;
    screen.cleanup()
}
