//! Hold / click / double-click sequencing over the extension tag stream.
//!
//! Per tracked class: `Idle -> Pending` when its tag arrives, `Pending -> Committed` when the
//! timer expires while the class is still the active one, back to `Idle` as soon as any other
//! tag arrives. Commit timers carry the class generation at scheduling time; a mismatch at
//! expiry means the attempt was cancelled in between.

use log::debug;

use crate::config::{ExtensionSettings, SequencerMode};
use crate::events::GestureEvent;
use crate::labels::{ExtensionTag, GestureClass};
use crate::timer::TimerQueue;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Pending,
    Committed,
}

#[derive(Debug, Clone, Copy)]
enum SeqTimer {
    Commit { class: GestureClass, generation: u64 },
    ClickReset { generation: u64 },
    DoubleClickWindow { generation: u64 },
}

#[derive(Debug)]
pub struct HoldClickSequencer {
    settings: ExtensionSettings,
    active: Option<GestureClass>,
    phases: [Phase; 3],
    generations: [u64; 3],
    held: Option<GestureClass>,
    clicked: Option<GestureClass>,
    click_gen: u64,
    // first click of a potential double-click
    pending_click: Option<GestureClass>,
    double_gen: u64,
    locked: bool,
    timers: TimerQueue<SeqTimer>,
}

impl HoldClickSequencer {
    pub fn new(settings: ExtensionSettings) -> Self {
        Self {
            settings,
            active: None,
            phases: [Phase::Idle; 3],
            generations: [0; 3],
            held: None,
            clicked: None,
            click_gen: 0,
            pending_click: None,
            double_gen: 0,
            locked: false,
            timers: TimerQueue::new(),
        }
    }

    /// New durations apply to attempts started after the call.
    pub fn set_settings(&mut self, settings: ExtensionSettings) {
        self.settings = settings;
    }

    pub fn phase(&self, class: GestureClass) -> Phase {
        self.phases[class.slot()]
    }

    pub fn active(&self) -> Option<GestureClass> {
        self.active
    }

    pub fn held(&self) -> Option<GestureClass> {
        self.held
    }

    pub fn clicked(&self) -> Option<GestureClass> {
        self.clicked
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    fn is_tracked(&self, class: GestureClass) -> bool {
        self.settings.tracked.contains(&class)
    }

    fn commit_delay(&self) -> u64 {
        match self.settings.mode {
            SequencerMode::Hold => self.settings.hold_ms,
            SequencerMode::Click => self.settings.click_ms,
        }
    }

    pub fn on_tag(&mut self, now_ms: u64, tag: ExtensionTag, out: &mut Vec<GestureEvent>) {
        self.advance(now_ms, out);

        match tag.class() {
            Some(c) if self.active == Some(c) => {}
            Some(c) => {
                self.deactivate();
                self.active = Some(c);
                if self.is_tracked(c) {
                    let slot = c.slot();
                    let delay = self.commit_delay();
                    self.generations[slot] += 1;
                    self.phases[slot] = Phase::Pending;
                    self.timers.schedule(
                        now_ms,
                        delay,
                        SeqTimer::Commit {
                            class: c,
                            generation: self.generations[slot],
                        },
                    );
                }
            }
            None => self.release(out),
        }
    }

    /// Swipes and other non-extension labels cancel like REST does.
    pub fn on_other(&mut self, now_ms: u64, out: &mut Vec<GestureEvent>) {
        self.advance(now_ms, out);
        self.release(out);
    }

    /// Earliest pending timer deadline.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_due()
    }

    /// Fire every timer due at `now_ms`. Each one acts at its own deadline, however late.
    pub fn advance(&mut self, now_ms: u64, out: &mut Vec<GestureEvent>) {
        while let Some((due_ms, timer)) = self.timers.pop_due(now_ms) {
            match timer {
                SeqTimer::Commit { class, generation } => {
                    let slot = class.slot();
                    if self.active == Some(class)
                        && self.generations[slot] == generation
                        && self.phases[slot] == Phase::Pending
                    {
                        self.commit(due_ms, class, out);
                    } else {
                        debug!("{class} attempt cancelled before commit");
                    }
                }
                SeqTimer::ClickReset { generation } if generation == self.click_gen => {
                    self.clicked = None;
                }
                SeqTimer::DoubleClickWindow { generation } if generation == self.double_gen => {
                    self.pending_click = None;
                }
                _ => {}
            }
        }
    }

    fn deactivate(&mut self) {
        if let Some(c) = self.active.take() {
            let slot = c.slot();
            self.generations[slot] += 1;
            self.phases[slot] = Phase::Idle;
        }
    }

    fn release(&mut self, out: &mut Vec<GestureEvent>) {
        self.deactivate();
        if let Some(c) = self.held.take() {
            out.push(GestureEvent::HoldReleased(c));
        }
        if self.clicked.take().is_some() {
            self.click_gen += 1;
        }
    }

    fn commit(&mut self, at_ms: u64, class: GestureClass, out: &mut Vec<GestureEvent>) {
        self.phases[class.slot()] = Phase::Committed;
        match self.settings.mode {
            SequencerMode::Hold => {
                if let Some(prev) = self.held.replace(class) {
                    if prev != class {
                        out.push(GestureEvent::HoldReleased(prev));
                    }
                }
                out.push(GestureEvent::Hold(class));
            }
            SequencerMode::Click => {
                self.clicked = Some(class);
                self.click_gen += 1;
                self.timers.schedule(
                    at_ms,
                    self.settings.click_reset_ms,
                    SeqTimer::ClickReset {
                        generation: self.click_gen,
                    },
                );

                self.double_gen += 1;
                if self.pending_click.take() == Some(class) {
                    self.phases[class.slot()] = Phase::Idle;
                    self.locked = !self.locked;
                    debug!("double click on {class}, lock={}", self.locked);
                    out.push(GestureEvent::DoubleClick);
                    out.push(GestureEvent::LockChanged(self.locked));
                } else {
                    self.pending_click = Some(class);
                    self.timers.schedule(
                        at_ms,
                        self.settings.double_click_ms,
                        SeqTimer::DoubleClickWindow {
                            generation: self.double_gen,
                        },
                    );
                    out.push(GestureEvent::Click(class));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::ExtensionTag::{Hand, Index, Rest, Thumb};

    fn hold_seq() -> HoldClickSequencer {
        HoldClickSequencer::new(ExtensionSettings::default())
    }

    fn click_seq() -> HoldClickSequencer {
        HoldClickSequencer::new(ExtensionSettings {
            mode: SequencerMode::Click,
            ..ExtensionSettings::default()
        })
    }

    fn run(s: &mut HoldClickSequencer, steps: &[(u64, Option<ExtensionTag>)]) -> Vec<GestureEvent> {
        let mut out = Vec::new();
        for &(t, tag) in steps {
            match tag {
                Some(tag) => s.on_tag(t, tag, &mut out),
                None => s.advance(t, &mut out),
            }
        }
        out
    }

    #[test]
    fn rest_before_hold_time_cancels() {
        let mut s = hold_seq();
        let ev = run(
            &mut s,
            &[(0, Some(Index)), (100, Some(Index)), (200, Some(Rest)), (1_000, None)],
        );
        assert!(ev.is_empty());
        assert_eq!(s.phase(GestureClass::Index), Phase::Idle);
    }

    #[test]
    fn sustained_tag_commits_one_hold() {
        let mut s = hold_seq();
        let mut steps: Vec<_> = (0..=20).map(|i| (i * 50, Some(Index))).collect();
        steps.push((2_000, None));
        let ev = run(&mut s, &steps);
        assert_eq!(ev, vec![GestureEvent::Hold(GestureClass::Index)]);
        assert_eq!(s.held(), Some(GestureClass::Index));
        assert_eq!(s.phase(GestureClass::Index), Phase::Committed);
    }

    #[test]
    fn single_push_commits_on_tick() {
        let mut s = hold_seq();
        assert!(run(&mut s, &[(0, Some(Hand)), (399, None)]).is_empty());
        assert_eq!(s.phase(GestureClass::Hand), Phase::Pending);
        assert_eq!(
            run(&mut s, &[(400, None)]),
            vec![GestureEvent::Hold(GestureClass::Hand)]
        );
    }

    #[test]
    fn stale_timer_from_cancelled_attempt_is_ignored() {
        let mut s = hold_seq();
        // first attempt's timer is due at 400, second at 700
        let ev = run(
            &mut s,
            &[(0, Some(Index)), (100, Some(Rest)), (300, Some(Index)), (450, None)],
        );
        assert!(ev.is_empty());
        assert_eq!(
            run(&mut s, &[(700, None)]),
            vec![GestureEvent::Hold(GestureClass::Index)]
        );
    }

    #[test]
    fn switching_class_cancels_the_other() {
        let mut s = hold_seq();
        let ev = run(&mut s, &[(0, Some(Index)), (100, Some(Thumb)), (450, None)]);
        assert!(ev.is_empty());
        assert_eq!(s.active(), Some(GestureClass::Thumb));
        assert_eq!(s.phase(GestureClass::Index), Phase::Idle);
        assert_eq!(
            run(&mut s, &[(500, None)]),
            vec![GestureEvent::Hold(GestureClass::Thumb)]
        );
    }

    #[test]
    fn untracked_class_cancels_without_committing() {
        let mut s = HoldClickSequencer::new(ExtensionSettings {
            tracked: vec![GestureClass::Index],
            ..ExtensionSettings::default()
        });
        let ev = run(&mut s, &[(0, Some(Index)), (100, Some(Hand)), (2_000, None)]);
        assert!(ev.is_empty());
        assert_eq!(s.phase(GestureClass::Hand), Phase::Idle);
    }

    #[test]
    fn hold_is_released_by_rest_or_replaced() {
        let mut s = hold_seq();
        let ev = run(
            &mut s,
            &[(0, Some(Index)), (400, None), (500, Some(Thumb)), (900, None)],
        );
        assert_eq!(
            ev,
            vec![
                GestureEvent::Hold(GestureClass::Index),
                GestureEvent::HoldReleased(GestureClass::Index),
                GestureEvent::Hold(GestureClass::Thumb),
            ]
        );
        assert_eq!(
            run(&mut s, &[(950, Some(Rest))]),
            vec![GestureEvent::HoldReleased(GestureClass::Thumb)]
        );
        assert_eq!(s.held(), None);
    }

    #[test]
    fn swipe_cancels_pending_attempt() {
        let mut s = hold_seq();
        let mut out = Vec::new();
        s.on_tag(0, Index, &mut out);
        s.on_other(100, &mut out);
        s.advance(1_000, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn click_then_double_click_then_fresh_click() {
        let mut s = click_seq();
        let hand = GestureClass::Hand;

        let ev = run(&mut s, &[(0, Some(Hand)), (400, None)]);
        assert_eq!(ev, vec![GestureEvent::Click(hand)]);

        // second commit lands at 820, 420 ms after the first
        let ev = run(&mut s, &[(410, Some(Rest)), (420, Some(Hand)), (820, None)]);
        assert_eq!(ev, vec![GestureEvent::DoubleClick, GestureEvent::LockChanged(true)]);
        assert!(s.is_locked());
        assert_eq!(s.phase(hand), Phase::Idle);

        // double click consumed the pending click: the next one starts over
        let ev = run(&mut s, &[(830, Some(Rest)), (840, Some(Hand)), (1_240, None)]);
        assert_eq!(ev, vec![GestureEvent::Click(hand)]);

        // outside the window: still a single click
        let ev = run(&mut s, &[(1_250, Some(Rest)), (2_000, Some(Hand)), (2_400, None)]);
        assert_eq!(ev, vec![GestureEvent::Click(hand)]);
        assert!(s.is_locked());
    }

    #[test]
    fn second_double_click_unlocks() {
        let mut s = click_seq();
        let mut steps = Vec::new();
        for base in [0u64, 2_000] {
            steps.extend([
                (base, Some(Index)),
                (base + 400, None),
                (base + 410, Some(Rest)),
                (base + 420, Some(Index)),
                (base + 820, None),
                (base + 830, Some(Rest)),
            ]);
        }
        let ev = run(&mut s, &steps);
        assert!(ev.contains(&GestureEvent::LockChanged(true)));
        assert!(ev.ends_with(&[GestureEvent::DoubleClick, GestureEvent::LockChanged(false)]));
        assert!(!s.is_locked());
    }

    #[test]
    fn late_commits_pair_by_deadline_not_processing_time() {
        let mut s = click_seq();
        let hand = GestureClass::Hand;
        // commits are due at 400 and 1410 but only processed on the following tag
        let ev = run(
            &mut s,
            &[(0, Some(Hand)), (1_000, Some(Rest)), (1_010, Some(Hand)), (1_420, Some(Rest))],
        );
        assert_eq!(ev, vec![GestureEvent::Click(hand), GestureEvent::Click(hand)]);
        assert!(!s.is_locked());
    }

    #[test]
    fn late_commit_still_pairs_inside_window() {
        let mut s = click_seq();
        let hand = GestureClass::Hand;
        // due at 400 and 820, first processed at 410, second at 900
        let ev = run(
            &mut s,
            &[(0, Some(Hand)), (410, Some(Rest)), (420, Some(Hand)), (900, Some(Rest))],
        );
        assert_eq!(
            ev,
            vec![
                GestureEvent::Click(hand),
                GestureEvent::DoubleClick,
                GestureEvent::LockChanged(true),
            ]
        );
    }

    #[test]
    fn clicks_on_different_classes_do_not_pair() {
        let mut s = click_seq();
        let ev = run(
            &mut s,
            &[(0, Some(Hand)), (400, None), (410, Some(Thumb)), (810, None)],
        );
        assert_eq!(
            ev,
            vec![
                GestureEvent::Click(GestureClass::Hand),
                GestureEvent::Click(GestureClass::Thumb),
            ]
        );
        assert!(!s.is_locked());
    }

    #[test]
    fn click_flag_resets_after_delay() {
        let mut s = click_seq();
        run(&mut s, &[(0, Some(Thumb)), (400, None)]);
        assert_eq!(s.clicked(), Some(GestureClass::Thumb));
        run(&mut s, &[(899, None)]);
        assert_eq!(s.clicked(), Some(GestureClass::Thumb));
        run(&mut s, &[(900, None)]);
        assert_eq!(s.clicked(), None);
    }

    #[test]
    fn click_cancelled_by_early_release() {
        let mut s = click_seq();
        let ev = run(&mut s, &[(0, Some(Index)), (200, Some(Rest)), (1_000, None)]);
        assert!(ev.is_empty());
        assert_eq!(s.clicked(), None);
    }
}
