//! Frame-driven sequencer for eased ramps, holds and markers.
//!
//! The owner pushes steps and calls [`Timeline::advance`] once per frame; the returned events
//! stand in for per-tick and completion callbacks. Time left over after a step finishes carries
//! into the next queued step within the same frame.

use std::collections::VecDeque;

use crate::ease::EaseKind;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step<M> {
    /// Drive progress 0 → 1 over `duration` seconds along `ease`.
    Ramp { duration: f32, ease: EaseKind },
    Hold(f32),
    /// Fires as soon as every step before it has finished.
    Marker(M),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimelineEvent<M> {
    /// Eased progress of the running ramp.
    Progress(f32),
    RampComplete,
    Marker(M),
}

#[derive(Debug, Clone)]
pub struct Timeline<M> {
    steps: VecDeque<Step<M>>,
    elapsed: f32,
}

impl<M> Default for Timeline<M> {
    fn default() -> Self {
        Self { steps: VecDeque::new(), elapsed: 0.0 }
    }
}

impl<M: Copy> Timeline<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ramp(&mut self, duration: f32, ease: EaseKind) {
        self.steps.push_back(Step::Ramp { duration: duration.max(0.0), ease });
    }

    pub fn push_hold(&mut self, duration: f32) {
        self.steps.push_back(Step::Hold(duration.max(0.0)));
    }

    pub fn push_marker(&mut self, marker: M) {
        self.steps.push_back(Step::Marker(marker));
    }

    pub fn clear(&mut self) {
        self.steps.clear();
        self.elapsed = 0.0;
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Advance by `dt` seconds and return the events that fired, in order.
    pub fn advance(&mut self, dt: f32) -> Vec<TimelineEvent<M>> {
        let mut events = Vec::new();
        let mut budget = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        while let Some(step) = self.steps.front().copied() {
            match step {
                Step::Marker(marker) => {
                    self.steps.pop_front();
                    events.push(TimelineEvent::Marker(marker));
                }
                Step::Hold(duration) => {
                    let remaining = duration - self.elapsed;
                    if budget >= remaining {
                        budget -= remaining;
                        self.finish_step();
                    } else {
                        self.elapsed += budget;
                        break;
                    }
                }
                Step::Ramp { duration, ease } => {
                    let remaining = duration - self.elapsed;
                    if budget >= remaining {
                        budget -= remaining;
                        self.finish_step();
                        events.push(TimelineEvent::Progress(1.0));
                        events.push(TimelineEvent::RampComplete);
                    } else {
                        self.elapsed += budget;
                        events.push(TimelineEvent::Progress(ease.apply(self.elapsed / duration)));
                        break;
                    }
                }
            }
        }
        events
    }

    fn finish_step(&mut self) {
        self.steps.pop_front();
        self.elapsed = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_emits_eased_progress_then_completes() {
        let mut timeline: Timeline<()> = Timeline::new();
        timeline.push_ramp(1.0, EaseKind::InCubic);
        assert_eq!(timeline.advance(0.5), vec![TimelineEvent::Progress(0.125)]);
        assert_eq!(
            timeline.advance(0.5),
            vec![TimelineEvent::Progress(1.0), TimelineEvent::RampComplete]
        );
        assert!(timeline.is_empty());
        assert!(timeline.advance(1.0).is_empty());
    }

    #[test]
    fn leftover_time_flows_into_next_step() {
        let mut timeline = Timeline::new();
        timeline.push_hold(0.25);
        timeline.push_marker(7u8);
        timeline.push_ramp(1.0, EaseKind::InCubic);
        let events = timeline.advance(0.75);
        assert_eq!(events, vec![TimelineEvent::Marker(7), TimelineEvent::Progress(0.125)]);
        assert_eq!(timeline.len(), 1);
    }

    #[test]
    fn hold_blocks_markers_until_elapsed() {
        let mut timeline = Timeline::new();
        timeline.push_hold(1.0);
        timeline.push_marker("go");
        assert!(timeline.advance(0.4).is_empty());
        assert!(timeline.advance(0.4).is_empty());
        assert_eq!(timeline.advance(0.4), vec![TimelineEvent::Marker("go")]);
    }

    #[test]
    fn zero_length_ramp_completes_immediately() {
        let mut timeline: Timeline<()> = Timeline::new();
        timeline.push_ramp(0.0, EaseKind::InSine);
        assert_eq!(
            timeline.advance(0.0),
            vec![TimelineEvent::Progress(1.0), TimelineEvent::RampComplete]
        );
    }

    #[test]
    fn clear_drops_pending_steps() {
        let mut timeline = Timeline::new();
        timeline.push_ramp(2.0, EaseKind::InExpo);
        timeline.advance(1.0);
        timeline.clear();
        assert!(timeline.is_empty());
        timeline.push_marker(1u32);
        assert_eq!(timeline.advance(0.0), vec![TimelineEvent::Marker(1)]);
    }
}
