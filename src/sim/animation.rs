/// Animation scheduler: at most one board animation at a time.
///
/// State machine: `Idle → Running → Idle`.
///
///   - `start()` while Running is refused (returns false, logged).
///   - `tick()` advances progress. On the frame the animation completes,
///     board transforms are applied to the grid and the finished request is
///     handed back so the session can react (floor changes).
///
/// The session swallows directional input while `is_running()`.

use crate::domain::grid::Level;
use crate::domain::transform::AnimationRequest;

/// Durations per animation family, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimationTiming {
    pub transform_ms: u64,
    pub stairs_ms: u64,
}

impl Default for AnimationTiming {
    fn default() -> Self {
        AnimationTiming { transform_ms: 600, stairs_ms: 400 }
    }
}

/// A running animation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Animation {
    pub request: AnimationRequest,
    elapsed_ms: u64,
    duration_ms: u64,
}

impl Animation {
    /// 0.0 (just started) → 1.0 (complete).
    pub fn progress(&self) -> f32 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        (self.elapsed_ms as f32 / self.duration_ms as f32).min(1.0)
    }

    fn is_complete(&self) -> bool {
        self.elapsed_ms >= self.duration_ms
    }
}

#[derive(Clone, Debug)]
pub struct AnimationScheduler {
    active: Option<Animation>,
    timing: AnimationTiming,
}

impl AnimationScheduler {
    pub fn new(timing: AnimationTiming) -> Self {
        AnimationScheduler { active: None, timing }
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    #[allow(dead_code)]
    pub fn is_finished(&self) -> bool {
        self.active.is_none()
    }

    pub fn active(&self) -> Option<&Animation> {
        self.active.as_ref()
    }

    /// Begin `request`. Refused while another animation runs.
    pub fn start(&mut self, request: AnimationRequest) -> bool {
        if let Some(running) = &self.active {
            log::debug!("refusing {:?}: {:?} still running", request.kind(), running.request.kind());
            return false;
        }
        let duration_ms = if request.is_floor_change() {
            self.timing.stairs_ms
        } else {
            self.timing.transform_ms
        };
        self.active = Some(Animation { request, elapsed_ms: 0, duration_ms });
        true
    }

    /// Advance the running animation. Returns the request on the frame it
    /// completes (after applying any board transform to `level`).
    pub fn tick(&mut self, elapsed_ms: u64, level: &mut Level) -> Option<AnimationRequest> {
        let anim = self.active.as_mut()?;
        anim.elapsed_ms = anim.elapsed_ms.saturating_add(elapsed_ms);
        if !anim.is_complete() {
            return None;
        }
        let request = anim.request;
        self.active = None;
        request.apply(level);
        Some(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::level_from_rows;

    fn timing() -> AnimationTiming {
        AnimationTiming { transform_ms: 300, stairs_ms: 200 }
    }

    #[test]
    fn second_start_is_refused_while_running() {
        let mut s = AnimationScheduler::new(timing());
        assert!(s.is_finished());
        assert!(s.start(AnimationRequest::Diagonal { floor: 0 }));
        assert!(s.is_running());
        assert!(!s.start(AnimationRequest::HorizontalMirror { floor: 0 }));
        assert_eq!(s.active().map(|a| a.request), Some(AnimationRequest::Diagonal { floor: 0 }));
    }

    #[test]
    fn transform_applies_on_completion_frame_only() {
        let mut level = level_from_rows(&[&["DH.", "..A"]]);
        let before = level.clone();
        let mut s = AnimationScheduler::new(timing());
        s.start(AnimationRequest::HorizontalMirror { floor: 0 });

        assert_eq!(s.tick(100, &mut level), None);
        assert_eq!(level, before);
        let progress = s.active().map(|a| a.progress()).unwrap_or_default();
        assert!((progress - 1.0 / 3.0).abs() < 0.01);

        assert_eq!(s.tick(200, &mut level), Some(AnimationRequest::HorizontalMirror { floor: 0 }));
        assert!(s.is_finished());
        let chars: String = level.to_characters().into_iter().collect();
        assert_eq!(chars, ".HDA..");
    }

    #[test]
    fn idle_tick_does_nothing() {
        let mut level = level_from_rows(&[&["D.", ".A"]]);
        let mut s = AnimationScheduler::new(timing());
        assert_eq!(s.tick(1000, &mut level), None);
    }

    #[test]
    fn stairs_use_stairs_duration_and_can_restart() {
        let mut level = level_from_rows(&[&["DS", ".."], &["..", ".A"]]);
        let mut s = AnimationScheduler::new(timing());
        let req = AnimationRequest::StairsUp { from: 0, to: 1 };
        s.start(req);
        assert_eq!(s.tick(199, &mut level), None);
        assert_eq!(s.tick(1, &mut level), Some(req));
        assert!(s.start(AnimationRequest::Diagonal { floor: 1 }));
    }

    #[test]
    fn zero_duration_finishes_on_first_tick() {
        let mut level = level_from_rows(&[&["D.", ".A"]]);
        let mut s = AnimationScheduler::new(AnimationTiming { transform_ms: 0, stairs_ms: 0 });
        s.start(AnimationRequest::VerticalMirror { floor: 0 });
        assert_eq!(s.active().map(|a| a.progress()), Some(1.0));
        assert!(s.tick(0, &mut level).is_some());
    }
}
