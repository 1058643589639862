/// Keyboard state tracker.
///
/// Terminals report key presses (and auto-repeats) but usually not
/// releases, so "held" is inferred: a key counts as held until
/// `HOLD_TIMEOUT` passes without another Press/Repeat. When keyboard
/// enhancement is active, real Release events end the hold immediately.
///
///   - movement: level-triggered (held key keeps walking)
///   - bomb, menu keys: edge-triggered (fires once per press)

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::{Direction, FrameInput};

const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
pub const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
pub const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
pub const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
pub const KEYS_BOMB: &[KeyCode] = &[KeyCode::Char(' '), KeyCode::Char('z'), KeyCode::Char('Z')];
pub const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter];
pub const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];

pub struct InputState {
    last_active: HashMap<KeyCode, Instant>,
    /// Keys that went from released to held during the last drain.
    fresh_presses: Vec<KeyCode>,
    ctrl_c: bool,
    /// Trust Release events (keyboard enhancement confirmed).
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            ctrl_c: false,
            honor_release: false,
        }
    }

    /// Drain pending terminal events without blocking. Once per frame.
    pub fn drain_events(&mut self) {
        self.begin_frame();
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key, Instant::now());
            }
        }
        self.expire(Instant::now());
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.fresh_presses.contains(c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.ctrl_c
    }

    /// Sample this frame's gameplay input.
    pub fn frame_input(&self) -> FrameInput {
        FrameInput {
            movement: self.movement_at(Instant::now()),
            place_bomb: self.any_pressed(KEYS_BOMB),
        }
    }

    // ── Internal ──

    fn begin_frame(&mut self) {
        self.fresh_presses.clear();
        self.ctrl_c = false;
    }

    fn record(&mut self, key: KeyEvent, now: Instant) {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            self.ctrl_c = true;
        }

        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {}
            _ => {
                if !self.is_held_at(key.code, now) {
                    self.fresh_presses.push(key.code);
                }
                self.last_active.insert(key.code, now);
            }
        }
    }

    fn expire(&mut self, now: Instant) {
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn is_held_at(&self, code: KeyCode, now: Instant) -> bool {
        self.last_active.get(&code).map_or(false, |t| now.duration_since(*t) < HOLD_TIMEOUT)
    }

    fn any_held_at(&self, codes: &[KeyCode], now: Instant) -> bool {
        codes.iter().any(|c| self.is_held_at(*c, now) || self.fresh_presses.contains(c))
    }

    /// Vertical wins over horizontal when both are held.
    fn movement_at(&self, now: Instant) -> Option<Direction> {
        [
            (KEYS_UP, Direction::Up),
            (KEYS_DOWN, Direction::Down),
            (KEYS_LEFT, Direction::Left),
            (KEYS_RIGHT, Direction::Right),
        ]
        .into_iter()
        .find(|(keys, _)| self.any_held_at(keys, now))
        .map(|(_, dir)| dir)
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}
