//! Terminal user interface for the recording session.
//!
//! Draws the preview status, the action control and a footer with the
//! recording timer, and turns key presses into [`UiCommand`]s.

use crate::session::{ActionControl, Icon, Preview, PreviewSource, RecordingSession, StateKind};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Paragraph},
};
use std::io::{stdout, Stdout};
use std::time::Duration;

const SPINNER: [&str; 4] = ["◐", "◓", "◑", "◒"];
const ACCENT: Color = Color::Rgb(185, 207, 212);

/// User input during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCommand {
    /// No relevant key pressed
    Continue,
    /// Space or Enter
    Activate,
    /// Escape, 'q' or Ctrl+C
    Quit,
}

/// Snapshot of what the screen shows.
///
/// Owns its data so the screen can keep animating while the session is busy.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub state: StateKind,
    pub control: ActionControl,
    pub preview: Preview,
    pub elapsed: Option<Duration>,
    pub transcode: bool,
    pub status: Option<String>,
}

impl SessionView {
    pub fn of<R, E, D>(session: &RecordingSession<R, E, D>, status: Option<&str>) -> Self
    where
        R: crate::capture::Recorder,
        E: crate::transcode::TranscodeEngine,
        D: crate::media::DownloadSink,
    {
        Self {
            state: session.state().kind(),
            control: session.control().clone(),
            preview: session.preview().clone(),
            elapsed: session.recording_elapsed(),
            transcode: session.transcode_enabled(),
            status: status.map(str::to_string),
        }
    }
}

pub struct RecorderTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    frame_count: usize,
    active: bool,
}

impl RecorderTui {
    /// Enters the alternate screen in raw mode.
    ///
    /// # Errors
    /// If the terminal cannot be initialized.
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self {
            terminal,
            frame_count: 0,
            active: true,
        })
    }

    /// Draws one frame.
    ///
    /// # Errors
    /// If terminal rendering fails.
    pub fn render(&mut self, view: &SessionView) -> anyhow::Result<()> {
        self.frame_count = self.frame_count.wrapping_add(1);
        let spinner = SPINNER[(self.frame_count / 4) % SPINNER.len()];

        let caption = preview_caption(&view.preview);
        let button = button_text(&view.control, spinner);
        let button_style = button_style(&view.control, view.state);
        let footer = footer_text(view);

        self.terminal.draw(|frame| {
            let area = frame.area();
            let [preview_area, button_area, footer_area] = Layout::vertical([
                Constraint::Min(3),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .areas(area);

            let preview_block = Block::default()
                .title(" preview ")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(ACCENT));
            let inner = preview_block.inner(preview_area);
            frame.render_widget(preview_block, preview_area);

            let caption_area = Rect {
                y: inner.y + inner.height.saturating_sub(1) / 2,
                height: 1.min(inner.height),
                ..inner
            };
            frame.render_widget(
                Paragraph::new(caption.as_str()).alignment(Alignment::Center),
                caption_area,
            );

            frame.render_widget(
                Paragraph::new(button.as_str())
                    .alignment(Alignment::Center)
                    .style(button_style)
                    .block(Block::default().borders(Borders::ALL).border_type(BorderType::Thick)),
                button_area,
            );

            frame.render_widget(
                Paragraph::new(footer.as_str()).style(Style::default().fg(ACCENT).bg(Color::Black)),
                footer_area,
            );
        })?;

        Ok(())
    }

    /// Waits briefly for a key press.
    ///
    /// # Errors
    /// If event polling fails.
    pub fn handle_input(&mut self) -> anyhow::Result<UiCommand> {
        if !event::poll(Duration::from_millis(50))? {
            return Ok(UiCommand::Continue);
        }
        let Event::Key(key) = event::read()? else {
            return Ok(UiCommand::Continue);
        };
        if key.kind != KeyEventKind::Press {
            return Ok(UiCommand::Continue);
        }

        Ok(match key.code {
            KeyCode::Char(' ') | KeyCode::Enter => {
                tracing::debug!("Activation key pressed");
                UiCommand::Activate
            }
            KeyCode::Char('q') | KeyCode::Esc => UiCommand::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => UiCommand::Quit,
            _ => UiCommand::Continue,
        })
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

impl Drop for RecorderTui {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

fn preview_caption(preview: &Preview) -> String {
    match preview.source() {
        PreviewSource::Detached => "no source".to_string(),
        PreviewSource::Live(label) => format!("● live  {label}"),
        PreviewSource::Artifact(url) => {
            let status = match (preview.is_playing(), preview.is_looped()) {
                (true, true) => "▶ looping",
                (true, false) => "▶ playing",
                (false, _) => "⏸ paused",
            };
            format!("{status}  {url}")
        }
    }
}

fn button_text(control: &ActionControl, spinner: &str) -> String {
    let icon = match control.icon() {
        Icon::Busy => spinner,
        icon => icon.symbol(),
    };
    format!("{icon}  {}", control.label())
}

fn button_style(control: &ActionControl, state: StateKind) -> Style {
    if !control.is_enabled() {
        Style::default().fg(Color::DarkGray)
    } else if state == StateKind::Recording {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    }
}

fn footer_text(view: &SessionView) -> String {
    let left = match (view.elapsed, view.status.as_deref()) {
        (Some(elapsed), _) => format!("● {}", format_elapsed(elapsed)),
        (None, Some(status)) => status.to_string(),
        (None, None) => view.state.to_string(),
    };
    let mode = if view.transcode { "mp4+jpg" } else { "webm" };
    format!(" {left} / {mode} / space: {} / q: quit", view.control.label().to_lowercase())
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}
