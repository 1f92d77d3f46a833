use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::palette::SeedColor;
use crate::Vec2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchEvent {
    pub position: Vec2,
    pub delta: Vec2,
    pub color: Option<SeedColor>,
}

impl TouchEvent {
    pub fn new(position: Vec2, delta: Vec2) -> Self {
        Self {
            position,
            delta,
            color: None,
        }
    }

    pub fn with_color(mut self, color: SeedColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.delta.is_finite()
    }
}

#[derive(Debug, Default)]
struct Shared {
    pending: Mutex<Vec<TouchEvent>>,
    reset_requested: AtomicBool,
}

// The simulation drains the queue once at the start of each frame; anything
// pushed after that waits for the following frame.
#[derive(Clone, Debug, Default)]
pub struct InputHandle {
    shared: Arc<Shared>,
}

impl InputHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: TouchEvent) {
        self.pending().push(event);
    }

    pub fn extend(&self, events: impl IntoIterator<Item = TouchEvent>) {
        self.pending().extend(events);
    }

    pub fn clear(&self) {
        self.pending().clear();
    }

    pub fn pending_len(&self) -> usize {
        self.pending().len()
    }

    pub fn request_reset(&self) {
        self.shared.reset_requested.store(true, Ordering::Release);
    }

    pub fn reset_pending(&self) -> bool {
        self.shared.reset_requested.load(Ordering::Acquire)
    }

    pub(crate) fn drain_into(&self, out: &mut Vec<TouchEvent>) {
        out.clear();
        let mut pending = self.pending();
        std::mem::swap(&mut *pending, out);
    }

    pub(crate) fn take_reset(&self) -> bool {
        self.shared.reset_requested.swap(false, Ordering::AcqRel)
    }

    fn pending(&self) -> MutexGuard<'_, Vec<TouchEvent>> {
        self.shared
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn drain_takes_everything_once() {
        let handle = InputHandle::new();
        handle.push(TouchEvent::new(Vec2::new(1.0, 1.0), Vec2::new(0.5, 0.0)));
        handle.extend([
            TouchEvent::new(Vec2::new(2.0, 2.0), Vec2::zero()).with_color(SeedColor::Teal),
        ]);
        let mut out = Vec::new();
        handle.drain_into(&mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].color, Some(SeedColor::Teal));
        handle.drain_into(&mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn reset_flag_is_consumed() {
        let handle = InputHandle::new();
        assert!(!handle.take_reset());
        handle.request_reset();
        assert!(handle.reset_pending());
        assert!(handle.take_reset());
        assert!(!handle.take_reset());
    }

    #[test]
    fn events_from_other_threads_are_queued() {
        let handle = InputHandle::new();
        let workers: Vec<_> = (0..4)
            .map(|i| {
                let handle = handle.clone();
                thread::spawn(move || {
                    for j in 0..25 {
                        handle.push(TouchEvent::new(
                            Vec2::new(i as f32, j as f32),
                            Vec2::new(1.0, 0.0),
                        ));
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(handle.pending_len(), 100);
    }

    #[test]
    fn non_finite_events_are_flagged() {
        let event = TouchEvent::new(Vec2::new(f32::NAN, 0.0), Vec2::zero());
        assert!(!event.is_finite());
    }
}
