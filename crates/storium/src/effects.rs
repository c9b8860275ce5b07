//! custom cursor and click-wave effect
//!
//! independent of the connection state. the host forwards pointer events;
//! everything the effect puts on screen is owned by [`EffectsGuard`] and
//! removed when it is dropped.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

pub const CURSOR_CLASS: &str = "cursor";
pub const WAVE_CLASS: &str = "cursor-wave";
/// half the cursor element's size
pub const CURSOR_OFFSET: f32 = 10.0;
/// half the wave element's size
pub const WAVE_OFFSET: f32 = 20.0;
pub const WAVE_LIFETIME: Duration = Duration::from_millis(600);

/// drawing surface the effect places elements on (the document body)
pub trait Surface {
    type Element;

    fn create(&mut self, class: &str, x: f32, y: f32) -> Self::Element;
    fn move_to(&mut self, element: &Self::Element, x: f32, y: f32);
    fn remove(&mut self, element: Self::Element);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Move { x: f32, y: f32 },
    Click { x: f32, y: f32 },
}

/// live pointer effect; dropping it detaches every element it created
pub struct EffectsGuard<S: Surface> {
    surface: S,
    cursor: Option<S::Element>,
    waves: VecDeque<(S::Element, Instant)>,
}

pub fn attach<S: Surface>(mut surface: S) -> EffectsGuard<S> {
    let cursor = surface.create(CURSOR_CLASS, 0.0, 0.0);
    EffectsGuard {
        surface,
        cursor: Some(cursor),
        waves: VecDeque::new(),
    }
}

impl<S: Surface> EffectsGuard<S> {
    pub fn handle(&mut self, event: PointerEvent, now: Instant) {
        self.expire(now);
        match event {
            PointerEvent::Move { x, y } => {
                if let Some(cursor) = &self.cursor {
                    self.surface
                        .move_to(cursor, x - CURSOR_OFFSET, y - CURSOR_OFFSET);
                }
            }
            PointerEvent::Click { x, y } => {
                let wave = self.surface.create(WAVE_CLASS, x - WAVE_OFFSET, y - WAVE_OFFSET);
                self.waves.push_back((wave, now + WAVE_LIFETIME));
            }
        }
    }

    /// remove waves whose animation finished
    pub fn expire(&mut self, now: Instant) {
        while let Some((_, until)) = self.waves.front() {
            if *until > now {
                break;
            }
            if let Some((wave, _)) = self.waves.pop_front() {
                self.surface.remove(wave);
            }
        }
    }

    pub fn active_waves(&self) -> usize {
        self.waves.len()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}

impl<S: Surface> Drop for EffectsGuard<S> {
    fn drop(&mut self) {
        if let Some(cursor) = self.cursor.take() {
            self.surface.remove(cursor);
        }
        while let Some((wave, _)) = self.waves.pop_front() {
            self.surface.remove(wave);
        }
    }
}
