//! Per-unit playback state machine.
//!
//! The engine produces a fully-formed schedule ahead of time; the audio
//! transport owns the clock and reports note firings back. At most one
//! unit is audibly active at a time, and a rebuild always cancels the
//! previous schedule before installing the new one.

use crate::note::Note;
use crate::timeline::Timeline;
use crate::traversal::{at_end, zero_state, TraversalState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Scheduled,
    Playing,
    Paused,
}

/// A sounding synthesis voice, owned by the audio backend.
pub trait SynthVoice {
    /// Start a discrete note. A `None` pitch is a noise/percussive event.
    fn trigger(&mut self, note: &Note);
    /// Glide pitch/volume from the currently sounding note.
    fn ramp_to(&mut self, note: &Note);
    /// Stop whatever is sounding.
    fn release(&mut self);
}

/// Speech output for announcements, owned by the narration backend.
pub trait Narrator {
    fn speak(&mut self, text: &str);
    /// Cancel any pending or in-progress speech.
    fn cancel(&mut self);
}

pub struct Sonifier {
    unit_name: String,
    state: PlaybackState,
    timeline: Timeline,
    cursor: TraversalState,
    synth: Box<dyn SynthVoice>,
    narrator: Box<dyn Narrator>,
}

impl Sonifier {
    pub fn new(
        unit_name: impl Into<String>,
        synth: Box<dyn SynthVoice>,
        narrator: Box<dyn Narrator>,
    ) -> Self {
        Self {
            unit_name: unit_name.into(),
            state: PlaybackState::Idle,
            timeline: Timeline::default(),
            cursor: TraversalState::new(),
            synth,
            narrator,
        }
    }

    pub fn unit_name(&self) -> &str {
        &self.unit_name
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.state
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn cursor(&self) -> &TraversalState {
        &self.cursor
    }

    /// Install a rebuilt timeline.
    ///
    /// Returns `false` when the new timeline is structurally identical to
    /// the installed one and playback need not restart. Otherwise any
    /// previously scheduled output is cancelled first, the cursor is
    /// re-seated at the start, and the unit moves to `Scheduled`.
    pub fn schedule(&mut self, timeline: Timeline) -> bool {
        if self.state != PlaybackState::Idle && self.timeline == timeline {
            return false;
        }
        self.halt_output();
        self.cursor = zero_state(&timeline.dimensions);
        self.timeline = timeline;
        self.state = PlaybackState::Scheduled;
        true
    }

    /// Begin playing from the current traversal state.
    ///
    /// Returns the elapsed offset the transport should start at: the
    /// scheduled time of the note matching the stored cursor, not
    /// necessarily zero.
    pub fn play(&mut self) -> Option<f64> {
        match self.state {
            PlaybackState::Scheduled | PlaybackState::Paused => {
                let offset = self.timeline.offset_for(&self.cursor).unwrap_or(0.0);
                self.state = PlaybackState::Playing;
                Some(offset)
            }
            _ => None,
        }
    }

    /// Explicit pause, also used when the page loses visibility.
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.halt_output();
            self.state = PlaybackState::Paused;
        }
    }

    /// The transport reports that the scheduled note at `index` fired.
    pub fn on_note(&mut self, index: usize) {
        if self.state != PlaybackState::Playing {
            return;
        }
        let Some(note) = self.timeline.notes.get(index).cloned() else {
            return;
        };
        if note.ramp {
            self.synth.ramp_to(&note);
        } else {
            self.synth.trigger(&note);
        }
        if let Some(text) = &note.announce {
            self.narrator.speak(text);
        }
        self.cursor = note.state;
    }

    /// The transport reports the end of the schedule.
    ///
    /// The unit returns to `Idle`. The cursor resets to all zeros only
    /// when the traversal reached the end; an interrupted position is
    /// kept for resumption.
    pub fn finish(&mut self) {
        self.halt_output();
        if at_end(&self.cursor, &self.timeline.dimensions) {
            self.cursor = zero_state(&self.timeline.dimensions);
        }
        self.state = PlaybackState::Idle;
    }

    /// Jump to a traversal state, e.g. from keyboard navigation.
    ///
    /// Playback stops; callers rebuild and reschedule if their filter
    /// inputs changed. With `sound` set, the single note matching the new
    /// state sounds immediately.
    pub fn jump_to(&mut self, state: TraversalState, sound: bool) {
        if self.state == PlaybackState::Playing {
            self.halt_output();
            self.state = PlaybackState::Paused;
        }
        self.cursor = state;
        if sound {
            if let Some((_, note)) = self.timeline.note_matching(&self.cursor) {
                let note = note.clone();
                self.synth.trigger(&note);
            }
        }
    }

    /// Immediately halt all audible output for this unit. Called before a
    /// reschedule and when another unit becomes active.
    pub fn deactivate(&mut self) {
        self.halt_output();
        self.state = PlaybackState::Idle;
    }

    fn halt_output(&mut self) {
        self.synth.release();
        self.narrator.cancel();
    }
}

/// One sonifier per audio unit, with at most one audibly active at a time.
#[derive(Default)]
pub struct SonifierBank {
    sonifiers: Vec<Sonifier>,
    active: Option<usize>,
}

impl SonifierBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, sonifier: Sonifier) {
        self.sonifiers.push(sonifier);
    }

    pub fn active(&self) -> Option<&Sonifier> {
        self.active.map(|i| &self.sonifiers[i])
    }

    pub fn active_mut(&mut self) -> Option<&mut Sonifier> {
        self.active.map(|i| &mut self.sonifiers[i])
    }

    /// Make a unit the active one and install its timeline.
    ///
    /// The previously active unit is halted before the new one is touched,
    /// so two schedules never fire into the audio output together.
    pub fn activate(&mut self, unit_name: &str, timeline: Timeline) -> Option<&mut Sonifier> {
        let index = self
            .sonifiers
            .iter()
            .position(|s| s.unit_name() == unit_name)?;

        if let Some(previous) = self.active {
            if previous != index {
                self.sonifiers[previous].deactivate();
            }
        }
        self.active = Some(index);
        let sonifier = &mut self.sonifiers[index];
        sonifier.schedule(timeline);
        Some(sonifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Log {
        events: Vec<String>,
    }

    struct TestSynth(Rc<RefCell<Log>>);
    impl SynthVoice for TestSynth {
        fn trigger(&mut self, note: &Note) {
            self.0
                .borrow_mut()
                .events
                .push(format!("trigger {:?}", note.pitch));
        }
        fn ramp_to(&mut self, note: &Note) {
            self.0
                .borrow_mut()
                .events
                .push(format!("ramp {:?}", note.pitch));
        }
        fn release(&mut self) {
            self.0.borrow_mut().events.push("release".to_string());
        }
    }

    struct TestNarrator(Rc<RefCell<Log>>);
    impl Narrator for TestNarrator {
        fn speak(&mut self, text: &str) {
            self.0.borrow_mut().events.push(format!("speak {text}"));
        }
        fn cancel(&mut self) {
            self.0.borrow_mut().events.push("cancel".to_string());
        }
    }

    fn note(time: f64, state: &[(&str, usize)]) -> Note {
        Note {
            time,
            duration: 0.2,
            pitch: Some(60.0),
            volume: -15.0,
            state: state
                .iter()
                .map(|(n, i)| (n.to_string(), *i))
                .collect(),
            announce: None,
            pause_after: None,
            ramp: false,
        }
    }

    fn two_note_timeline() -> Timeline {
        Timeline {
            notes: vec![note(0.0, &[("m", 0)]), note(0.2, &[("m", 1)])],
            dimensions: vec![("m".to_string(), 2)],
            total_duration: 0.4,
        }
    }

    fn sonifier() -> (Sonifier, Rc<RefCell<Log>>) {
        let log = Rc::new(RefCell::new(Log::default()));
        let s = Sonifier::new(
            "voice",
            Box::new(TestSynth(log.clone())),
            Box::new(TestNarrator(log.clone())),
        );
        (s, log)
    }

    #[test]
    fn test_schedule_play_finish_cycle() {
        let (mut s, _log) = sonifier();
        assert_eq!(s.playback_state(), PlaybackState::Idle);

        assert!(s.schedule(two_note_timeline()));
        assert_eq!(s.playback_state(), PlaybackState::Scheduled);

        assert_eq!(s.play(), Some(0.0));
        assert_eq!(s.playback_state(), PlaybackState::Playing);

        s.on_note(0);
        s.on_note(1);
        assert_eq!(s.cursor()["m"], 1);

        s.finish();
        assert_eq!(s.playback_state(), PlaybackState::Idle);
        // Reached the end: cursor resets to zero.
        assert_eq!(s.cursor()["m"], 0);
    }

    #[test]
    fn test_identical_rebuild_does_not_restart() {
        let (mut s, _log) = sonifier();
        assert!(s.schedule(two_note_timeline()));
        assert!(!s.schedule(two_note_timeline()));

        let mut changed = two_note_timeline();
        changed.notes[1].pitch = Some(72.0);
        assert!(s.schedule(changed));
    }

    #[test]
    fn test_play_resumes_from_cursor_offset() {
        let (mut s, _log) = sonifier();
        s.schedule(two_note_timeline());
        s.play();
        s.on_note(0);
        s.pause();
        assert_eq!(s.playback_state(), PlaybackState::Paused);

        // Resumes at the note matching the stored cursor.
        assert_eq!(s.play(), Some(0.0));
        s.on_note(1);
        s.pause();
        assert_eq!(s.play(), Some(0.2));
    }

    #[test]
    fn test_interrupted_finish_keeps_cursor() {
        let (mut s, _log) = sonifier();
        let timeline = Timeline {
            notes: vec![
                note(0.0, &[("m", 0)]),
                note(0.2, &[("m", 1)]),
                note(0.4, &[("m", 2)]),
            ],
            dimensions: vec![("m".to_string(), 3)],
            total_duration: 0.6,
        };
        s.schedule(timeline);
        s.play();
        s.on_note(1);
        s.finish();
        // Not at the end: position is kept.
        assert_eq!(s.cursor()["m"], 1);
    }

    #[test]
    fn test_pause_halts_voice_and_speech() {
        let (mut s, log) = sonifier();
        s.schedule(two_note_timeline());
        s.play();
        s.on_note(0);
        s.pause();
        let events = &log.borrow().events;
        assert!(events.contains(&"release".to_string()));
        assert!(events.contains(&"cancel".to_string()));
    }

    #[test]
    fn test_switching_active_unit_halts_previous() {
        let log = Rc::new(RefCell::new(Log::default()));
        let mut bank = SonifierBank::new();
        bank.add(Sonifier::new(
            "a",
            Box::new(TestSynth(log.clone())),
            Box::new(TestNarrator(log.clone())),
        ));
        bank.add(Sonifier::new(
            "b",
            Box::new(TestSynth(log.clone())),
            Box::new(TestNarrator(log.clone())),
        ));

        bank.activate("a", two_note_timeline());
        bank.active_mut().unwrap().play();
        log.borrow_mut().events.clear();

        bank.activate("b", two_note_timeline());
        assert_eq!(bank.active().unwrap().unit_name(), "b");
        // Unit a was released before b was scheduled.
        assert!(log.borrow().events.contains(&"release".to_string()));
        assert!(log.borrow().events.contains(&"cancel".to_string()));
    }

    #[test]
    fn test_jump_sounds_single_note() {
        let (mut s, log) = sonifier();
        s.schedule(two_note_timeline());
        let state: TraversalState = [("m".to_string(), 1)].into_iter().collect();
        s.jump_to(state, true);
        assert!(log
            .borrow()
            .events
            .iter()
            .any(|e| e.starts_with("trigger")));
        assert_eq!(s.cursor()["m"], 1);
    }
}
