//! Terminal UI: a "Reverb Wet Level" slider and an oscilloscope.

use std::time::Duration;

use color_eyre::eyre::{eyre, Result as EyreResult};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, Gauge, GraphType, Paragraph},
    DefaultTerminal, Frame,
};

use super::app::AudioApp;

const SLIDER_LABEL: &str = "Reverb Wet Level";
const SLIDER_STEP: f32 = 0.01;
const INITIAL_WET_LEVEL: f32 = 0.3;
const WET_LEVEL: &str = "wetLevel";

/// Oscilloscope window in samples
const VIS_BUFFER_SIZE: usize = 1024;

pub struct SliderApp {
    audio: AudioApp,
    reverb_slot: usize,
    wet_level: f32,
    scope: Vec<f32>,
    should_quit: bool,
}

impl SliderApp {
    pub fn new(mut audio: AudioApp) -> EyreResult<Self> {
        let reverb_slot = audio
            .control
            .slot_of("reverb")
            .ok_or_else(|| eyre!("engine has no reverb"))?;
        let wet_level = audio
            .control
            .set_parameter(reverb_slot, WET_LEVEL, INITIAL_WET_LEVEL)?;

        Ok(Self {
            audio,
            reverb_slot,
            wet_level,
            scope: vec![0.0; VIS_BUFFER_SIZE],
            should_quit: false,
        })
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_scope();

            terminal.draw(|frame| self.render(frame))?;

            // ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code)?;
                    }
                }
            }
        }

        Ok(())
    }

    fn poll_scope(&mut self) {
        while let Ok(sample) = self.audio.scope.pop() {
            self.scope.push(sample);
        }
        if self.scope.len() > VIS_BUFFER_SIZE {
            let excess = self.scope.len() - VIS_BUFFER_SIZE;
            self.scope.drain(0..excess);
        }
    }

    fn handle_key(&mut self, key: KeyCode) -> EyreResult<()> {
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Right | KeyCode::Up => self.nudge_wet_level(SLIDER_STEP)?,
            KeyCode::Left | KeyCode::Down => self.nudge_wet_level(-SLIDER_STEP)?,
            KeyCode::Char(' ') => self.audio.toggle_note()?,
            _ => {}
        }
        Ok(())
    }

    fn nudge_wet_level(&mut self, delta: f32) -> EyreResult<()> {
        // Snap to the slider grid so repeated steps do not drift
        let target = ((self.wet_level + delta) / SLIDER_STEP).round() * SLIDER_STEP;
        self.wet_level = self.audio.control.set_parameter(
            self.reverb_slot,
            WET_LEVEL,
            target.clamp(0.0, 1.0),
        )?;
        tracing::debug!(wet_level = self.wet_level, "slider moved");
        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Status
                Constraint::Length(3), // Slider
                Constraint::Min(6),    // Scope
                Constraint::Length(1), // Help
            ])
            .split(frame.area());

        self.render_status(frame, chunks[0]);

        let slider = Gauge::default()
            .block(Block::default().title(format!(" {} ", SLIDER_LABEL)).borders(Borders::ALL))
            .gauge_style(Style::default().fg(Color::Cyan))
            .ratio(self.wet_level.clamp(0.0, 1.0) as f64)
            .label(format!("{:.2}", self.wet_level));
        frame.render_widget(slider, chunks[1]);

        self.render_scope(frame, chunks[2]);

        let help = Paragraph::new(" [←/→] Wet level  [Space] Note on/off  [Q] Quit")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[3]);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let (symbol, color) = if self.audio.note_held() {
            ("▶ C4", Color::Green)
        } else {
            ("⏸ released", Color::Yellow)
        };
        let line = Line::from(vec![
            Span::styled(format!(" {}  ", symbol), Style::default().fg(color)),
            Span::styled(
                format!("{:.1}kHz  ", self.audio.sample_rate as f32 / 1000.0),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(
                format!("{}ch", self.audio.channels),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        let status = Paragraph::new(line).block(Block::default().title(" squarewave ").borders(Borders::ALL));
        frame.render_widget(status, area);
    }

    fn render_scope(&self, frame: &mut Frame, area: Rect) {
        let data: Vec<(f64, f64)> = self
            .scope
            .iter()
            .enumerate()
            .map(|(i, &sample)| (i as f64 / self.scope.len() as f64, sample as f64))
            .collect();

        let dataset = Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&data);

        let chart = Chart::new(vec![dataset])
            .block(Block::default().title(" Output ").borders(Borders::ALL))
            .x_axis(Axis::default().bounds([0.0, 1.0]).style(Style::default().fg(Color::DarkGray)))
            .y_axis(Axis::default().bounds([-2.0, 2.0]).style(Style::default().fg(Color::DarkGray)));

        frame.render_widget(chart, area);
    }
}
