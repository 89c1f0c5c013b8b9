//! The narrative progress tracker.
//!
//! One tracker instance exists per page load. It owns all discrete state
//! derived from continuous scroll input and is driven exclusively through
//! [`ProgressTracker::apply`], which makes it a deterministic function of
//! the inbound event sequence.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use storymode_core::clock::Clock;
use storymode_core::ids::{LevelId, SectionId};
use storymode_levels::LevelCatalog;
use tracing::{debug, info};

use crate::events::{Effect, TrackerEvent, VisitorEvent};

/// Minimum intersection ratio for a section to count as active. Strictly
/// exceeded, never met: a half-visible section stays inactive.
pub const VISIBILITY_THRESHOLD: f64 = 0.5;

/// Default curtain display duration.
const DEFAULT_OVERLAY_DURATION: Duration = Duration::from_millis(2000);

/// Default completion-toast display duration.
const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(3000);

/// Fixed display durations for the one-shot overlays.
#[derive(Debug, Clone, Copy)]
pub struct TrackerConfig {
    /// How long the level curtain stays up before content is revealed.
    pub overlay_duration: Duration,
    /// How long the level-complete toast stays up.
    pub toast_duration: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            overlay_duration: DEFAULT_OVERLAY_DURATION,
            toast_duration: DEFAULT_TOAST_DURATION,
        }
    }
}

/// Per-level curtain lifecycle. `Shown` is terminal for the page session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurtainPhase {
    /// The curtain has never fired for this level.
    NotShown,
    /// The curtain fired and its dismiss timer is pending.
    Showing,
    /// The curtain finished and the level's content is revealed.
    Shown,
}

/// Owns all narrative state for one page session.
#[derive(Debug)]
pub struct ProgressTracker {
    catalog: LevelCatalog,
    config: TrackerConfig,
    active_section: SectionId,
    completed: BTreeMap<LevelId, DateTime<Utc>>,
    curtain_shown: BTreeMap<LevelId, DateTime<Utc>>,
    content_revealed: BTreeMap<LevelId, DateTime<Utc>>,
    overlay_active: Option<LevelId>,
    toast_active: Option<LevelId>,
    scroll_fraction: f64,
    timeline_index: usize,
}

impl ProgressTracker {
    /// Creates a tracker at the initial page state: intro active, all
    /// monotonic collections empty, no overlay up.
    #[must_use]
    pub fn new(catalog: LevelCatalog, config: TrackerConfig) -> Self {
        Self {
            catalog,
            config,
            active_section: SectionId::Intro,
            completed: BTreeMap::new(),
            curtain_shown: BTreeMap::new(),
            content_revealed: BTreeMap::new(),
            overlay_active: None,
            toast_active: None,
            scroll_fraction: 0.0,
            timeline_index: 0,
        }
    }

    /// Applies one event and returns the timer effects to schedule.
    ///
    /// Every transition is a total function over the state: unknown ids,
    /// sub-threshold ratios, and stale timer firings are all inert.
    pub fn apply(&mut self, event: TrackerEvent, clock: &dyn Clock) -> Vec<Effect> {
        match event {
            TrackerEvent::Visitor(VisitorEvent::SectionVisible { section, ratio }) => {
                self.report_section_visible(section, ratio, clock)
            }
            TrackerEvent::Visitor(VisitorEvent::ScrollProgress { fraction }) => {
                self.report_scroll_progress(fraction);
                Vec::new()
            }
            TrackerEvent::Visitor(VisitorEvent::LevelCompleted { level }) => {
                self.mark_level_complete(level, clock)
            }
            TrackerEvent::OverlayElapsed { level } => {
                self.overlay_elapsed(&level, clock);
                Vec::new()
            }
            TrackerEvent::ToastElapsed { level } => {
                self.toast_elapsed(&level);
                Vec::new()
            }
        }
    }

    /// Handles a visibility report from the intersection source.
    ///
    /// Above the threshold the section becomes active; a completable level
    /// seen for the first time additionally starts its one-shot curtain
    /// sequence. Repeat reports for an already-shown section only re-assert
    /// activity.
    pub fn report_section_visible(
        &mut self,
        section: SectionId,
        ratio: f64,
        clock: &dyn Clock,
    ) -> Vec<Effect> {
        if !ratio.is_finite() || ratio <= VISIBILITY_THRESHOLD {
            return Vec::new();
        }

        let Some(level) = section.as_level().cloned() else {
            self.active_section = SectionId::Intro;
            return Vec::new();
        };

        if !self.catalog.contains(&level) {
            return Vec::new();
        }

        self.active_section = section;

        if !self.catalog.is_completable(&level) || self.curtain_shown.contains_key(&level) {
            return Vec::new();
        }

        // NotShown -> Showing. The matching Showing -> Shown transition
        // arrives later as OverlayElapsed.
        self.curtain_shown.insert(level.clone(), clock.now());
        self.overlay_active = Some(level.clone());
        info!(level = %level, "curtain raised");

        vec![Effect::DismissOverlay {
            level,
            after: self.config.overlay_duration,
        }]
    }

    /// Records an explicit level completion. Idempotent; unknown ids and the
    /// intro entry are ignored so the completed set stays within the catalog.
    pub fn mark_level_complete(&mut self, level: LevelId, clock: &dyn Clock) -> Vec<Effect> {
        if !self.catalog.is_completable(&level) || self.completed.contains_key(&level) {
            return Vec::new();
        }

        self.completed.insert(level.clone(), clock.now());
        self.toast_active = Some(level.clone());
        info!(level = %level, percent = self.progress_percent(), "level completed");

        vec![Effect::DismissToast {
            level,
            after: self.config.toast_duration,
        }]
    }

    /// Handles a scroll fraction from the pinned-scroll source.
    ///
    /// The fraction is clamped into [0, 1]; the derived timeline index only
    /// moves when the computed value actually changes, so redundant reports
    /// leave no observable trace.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn report_scroll_progress(&mut self, fraction: f64) {
        if !fraction.is_finite() {
            return;
        }

        self.scroll_fraction = fraction.clamp(0.0, 1.0);

        let count = self.catalog.len();
        let index = ((self.scroll_fraction * count as f64).floor() as usize).min(count - 1);
        if index != self.timeline_index {
            self.timeline_index = index;
            debug!(index, "timeline index advanced");
        }
    }

    /// Showing -> Shown for `level`: reveal its content and release the
    /// overlay slot if this level still owns it. A later level may have taken
    /// the slot in the meantime; its own timer is still pending.
    fn overlay_elapsed(&mut self, level: &LevelId, clock: &dyn Clock) {
        if !self.curtain_shown.contains_key(level) {
            return;
        }

        self.content_revealed
            .entry(level.clone())
            .or_insert_with(|| clock.now());

        if self.overlay_active.as_ref() == Some(level) {
            self.overlay_active = None;
            info!(level = %level, "curtain dropped");
        }
    }

    /// Dismisses the completion toast if `level` still owns it.
    fn toast_elapsed(&mut self, level: &LevelId) {
        if self.toast_active.as_ref() == Some(level) {
            self.toast_active = None;
        }
    }

    /// The catalog this tracker was built over.
    #[must_use]
    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    /// The section currently considered in view.
    #[must_use]
    pub fn active_section(&self) -> &SectionId {
        &self.active_section
    }

    /// The level whose curtain is currently up, if any.
    #[must_use]
    pub fn overlay_active(&self) -> Option<&LevelId> {
        self.overlay_active.as_ref()
    }

    /// The level whose completion toast is currently up, if any.
    #[must_use]
    pub fn toast_active(&self) -> Option<&LevelId> {
        self.toast_active.as_ref()
    }

    /// The timeline entry selected by the pinned-scroll variant.
    #[must_use]
    pub fn timeline_index(&self) -> usize {
        self.timeline_index
    }

    /// The clamped scroll fraction last reported.
    #[must_use]
    pub fn scroll_fraction(&self) -> f64 {
        self.scroll_fraction
    }

    /// Whether the visitor has completed `level`.
    #[must_use]
    pub fn is_completed(&self, level: &LevelId) -> bool {
        self.completed.contains_key(level)
    }

    /// Ids of all completed levels, in id order.
    pub fn completed_levels(&self) -> impl Iterator<Item = &LevelId> {
        self.completed.keys()
    }

    /// When `level` was completed, if it has been.
    #[must_use]
    pub fn completed_at(&self, level: &LevelId) -> Option<DateTime<Utc>> {
        self.completed.get(level).copied()
    }

    /// When the curtain first fired for `level`, if it has.
    #[must_use]
    pub fn curtain_shown_at(&self, level: &LevelId) -> Option<DateTime<Utc>> {
        self.curtain_shown.get(level).copied()
    }

    /// When `level`'s content was revealed, if it has been.
    #[must_use]
    pub fn content_revealed_at(&self, level: &LevelId) -> Option<DateTime<Utc>> {
        self.content_revealed.get(level).copied()
    }

    /// Whether `level`'s full content subtree may mount.
    #[must_use]
    pub fn is_content_revealed(&self, level: &LevelId) -> bool {
        self.content_revealed.contains_key(level)
    }

    /// Ids of all levels whose content is revealed, in id order.
    pub fn revealed_levels(&self) -> impl Iterator<Item = &LevelId> {
        self.content_revealed.keys()
    }

    /// Where `level` sits in its one-shot curtain lifecycle.
    #[must_use]
    pub fn curtain_phase(&self, level: &LevelId) -> CurtainPhase {
        if self.content_revealed.contains_key(level) {
            CurtainPhase::Shown
        } else if self.curtain_shown.contains_key(level) {
            CurtainPhase::Showing
        } else {
            CurtainPhase::NotShown
        }
    }

    /// Completion percentage over the completable levels, rounded to the
    /// nearest integer. A degenerate catalog reports zero rather than
    /// dividing by zero.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    #[must_use]
    pub fn progress_percent(&self) -> u8 {
        let completable = self.catalog.completable_len();
        if completable == 0 {
            return 0;
        }
        ((self.completed.len() as f64 / completable as f64) * 100.0).round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use storymode_test_support::{FixedClock, test_catalog};

    fn tracker() -> ProgressTracker {
        ProgressTracker::new(test_catalog(), TrackerConfig::default())
    }

    fn fixed_clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())
    }

    fn visible(id: &str, ratio: f64) -> TrackerEvent {
        TrackerEvent::Visitor(VisitorEvent::SectionVisible {
            section: SectionId::from_dom_id(id),
            ratio,
        })
    }

    #[test]
    fn test_initial_state_is_intro_with_nothing_shown() {
        let tracker = tracker();

        assert_eq!(tracker.active_section(), &SectionId::Intro);
        assert_eq!(tracker.overlay_active(), None);
        assert_eq!(tracker.progress_percent(), 0);
        assert_eq!(tracker.timeline_index(), 0);
        assert_eq!(
            tracker.curtain_phase(&LevelId::new("birth")),
            CurtainPhase::NotShown
        );
    }

    #[test]
    fn test_sub_threshold_ratio_does_not_activate_section() {
        let mut tracker = tracker();
        let clock = fixed_clock();

        let effects = tracker.apply(visible("cars", 0.4), &clock);

        assert!(effects.is_empty());
        assert_eq!(tracker.active_section(), &SectionId::Intro);
        assert_eq!(tracker.overlay_active(), None);
    }

    #[test]
    fn test_exact_threshold_ratio_does_not_activate_section() {
        let mut tracker = tracker();
        let clock = fixed_clock();

        tracker.apply(visible("cars", 0.5), &clock);

        assert_eq!(tracker.active_section(), &SectionId::Intro);
    }

    #[test]
    fn test_above_threshold_ratio_activates_section_and_raises_curtain() {
        let mut tracker = tracker();
        let clock = fixed_clock();

        let effects = tracker.apply(visible("cars", 0.51), &clock);

        assert_eq!(
            tracker.active_section(),
            &SectionId::Level(LevelId::new("cars"))
        );
        assert_eq!(tracker.overlay_active(), Some(&LevelId::new("cars")));
        assert_eq!(
            tracker.curtain_phase(&LevelId::new("cars")),
            CurtainPhase::Showing
        );
        assert_eq!(
            effects,
            vec![Effect::DismissOverlay {
                level: LevelId::new("cars"),
                after: Duration::from_millis(2000),
            }]
        );
    }

    #[test]
    fn test_curtain_fires_at_most_once_per_level() {
        let mut tracker = tracker();
        let clock = fixed_clock();

        let first = tracker.apply(visible("cars", 0.9), &clock);
        tracker.apply(
            TrackerEvent::OverlayElapsed {
                level: LevelId::new("cars"),
            },
            &clock,
        );
        let second = tracker.apply(visible("cars", 0.9), &clock);
        let third = tracker.apply(visible("cars", 0.6), &clock);

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert!(third.is_empty());
        assert_eq!(tracker.overlay_active(), None);
        assert_eq!(
            tracker.curtain_phase(&LevelId::new("cars")),
            CurtainPhase::Shown
        );
    }

    #[test]
    fn test_revisiting_an_earlier_section_reactivates_without_replay() {
        let mut tracker = tracker();
        let clock = fixed_clock();

        tracker.apply(visible("birth", 0.8), &clock);
        tracker.apply(
            TrackerEvent::OverlayElapsed {
                level: LevelId::new("birth"),
            },
            &clock,
        );
        tracker.apply(visible("cars", 0.8), &clock);
        let replay = tracker.apply(visible("birth", 0.8), &clock);

        assert!(replay.is_empty());
        assert_eq!(
            tracker.active_section(),
            &SectionId::Level(LevelId::new("birth"))
        );
        assert!(tracker.is_content_revealed(&LevelId::new("birth")));
    }

    #[test]
    fn test_intro_reports_reactivate_the_sentinel() {
        let mut tracker = tracker();
        let clock = fixed_clock();

        tracker.apply(visible("cars", 0.8), &clock);
        tracker.apply(visible("intro", 0.8), &clock);

        assert_eq!(tracker.active_section(), &SectionId::Intro);
        // The curtain state is untouched by going back to the intro.
        assert_eq!(
            tracker.curtain_phase(&LevelId::new("cars")),
            CurtainPhase::Showing
        );
    }

    #[test]
    fn test_unknown_section_ids_are_inert() {
        let mut tracker = tracker();
        let clock = fixed_clock();

        let effects = tracker.apply(visible("vaporware", 0.9), &clock);

        assert!(effects.is_empty());
        assert_eq!(tracker.active_section(), &SectionId::Intro);
        assert_eq!(tracker.overlay_active(), None);
    }

    #[test]
    fn test_overlay_elapsed_reveals_content_and_clears_overlay() {
        let mut tracker = tracker();
        let shown_at = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let elapsed_at = shown_at + chrono::Duration::milliseconds(2000);

        tracker.apply(visible("cars", 0.8), &FixedClock(shown_at));
        tracker.apply(
            TrackerEvent::OverlayElapsed {
                level: LevelId::new("cars"),
            },
            &FixedClock(elapsed_at),
        );

        let cars = LevelId::new("cars");
        assert_eq!(tracker.overlay_active(), None);
        assert!(tracker.is_content_revealed(&cars));
        assert_eq!(tracker.curtain_shown_at(&cars), Some(shown_at));
        assert_eq!(tracker.content_revealed_at(&cars), Some(elapsed_at));
        assert!(
            tracker.content_revealed_at(&cars).unwrap()
                >= tracker.curtain_shown_at(&cars).unwrap()
                    + chrono::Duration::milliseconds(2000)
        );
    }

    #[test]
    fn test_stale_overlay_timer_does_not_clear_a_newer_overlay() {
        let mut tracker = tracker();
        let clock = fixed_clock();

        tracker.apply(visible("birth", 0.8), &clock);
        // "cars" crosses the threshold while birth's curtain is still up.
        tracker.apply(visible("cars", 0.8), &clock);
        assert_eq!(tracker.overlay_active(), Some(&LevelId::new("cars")));

        tracker.apply(
            TrackerEvent::OverlayElapsed {
                level: LevelId::new("birth"),
            },
            &clock,
        );

        // Birth's content is revealed, but cars still owns the overlay slot.
        assert!(tracker.is_content_revealed(&LevelId::new("birth")));
        assert_eq!(tracker.overlay_active(), Some(&LevelId::new("cars")));

        tracker.apply(
            TrackerEvent::OverlayElapsed {
                level: LevelId::new("cars"),
            },
            &clock,
        );
        assert_eq!(tracker.overlay_active(), None);
    }

    #[test]
    fn test_overlay_timer_for_unshown_level_is_inert() {
        let mut tracker = tracker();
        let clock = fixed_clock();

        tracker.apply(
            TrackerEvent::OverlayElapsed {
                level: LevelId::new("cars"),
            },
            &clock,
        );

        assert!(!tracker.is_content_revealed(&LevelId::new("cars")));
    }

    #[test]
    fn test_mark_level_complete_is_idempotent() {
        let mut tracker = tracker();
        let clock = fixed_clock();

        let first = tracker.mark_level_complete(LevelId::new("birth"), &clock);
        let second = tracker.mark_level_complete(LevelId::new("birth"), &clock);

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert_eq!(tracker.completed_levels().count(), 1);
        assert_eq!(tracker.progress_percent(), 11);
    }

    #[test]
    fn test_progress_percent_matches_the_hud_formula() {
        let mut tracker = tracker();
        let clock = fixed_clock();

        tracker.mark_level_complete(LevelId::new("birth"), &clock);
        tracker.mark_level_complete(LevelId::new("cars"), &clock);

        // 2 of 9 completable levels, rounded.
        assert_eq!(tracker.progress_percent(), 22);
    }

    #[test]
    fn test_unknown_and_intro_completions_are_ignored() {
        let mut tracker = tracker();
        let clock = fixed_clock();

        let unknown = tracker.mark_level_complete(LevelId::new("vaporware"), &clock);
        let intro = tracker.mark_level_complete(LevelId::new("intro"), &clock);

        assert!(unknown.is_empty());
        assert!(intro.is_empty());
        assert_eq!(tracker.completed_levels().count(), 0);
        assert_eq!(tracker.progress_percent(), 0);
    }

    #[test]
    fn test_completion_raises_toast_until_its_timer_fires() {
        let mut tracker = tracker();
        let clock = fixed_clock();

        let effects = tracker.mark_level_complete(LevelId::new("birth"), &clock);

        assert_eq!(tracker.toast_active(), Some(&LevelId::new("birth")));
        assert_eq!(
            effects,
            vec![Effect::DismissToast {
                level: LevelId::new("birth"),
                after: Duration::from_millis(3000),
            }]
        );

        tracker.apply(
            TrackerEvent::ToastElapsed {
                level: LevelId::new("birth"),
            },
            &clock,
        );
        assert_eq!(tracker.toast_active(), None);
    }

    #[test]
    fn test_stale_toast_timer_does_not_clear_a_newer_toast() {
        let mut tracker = tracker();
        let clock = fixed_clock();

        tracker.mark_level_complete(LevelId::new("birth"), &clock);
        tracker.mark_level_complete(LevelId::new("cars"), &clock);

        tracker.apply(
            TrackerEvent::ToastElapsed {
                level: LevelId::new("birth"),
            },
            &clock,
        );

        assert_eq!(tracker.toast_active(), Some(&LevelId::new("cars")));
    }

    #[test]
    fn test_scroll_progress_clamps_out_of_range_input() {
        let mut tracker = tracker();

        tracker.report_scroll_progress(1.4);

        assert!((tracker.scroll_fraction() - 1.0).abs() < f64::EPSILON);
        assert_eq!(tracker.timeline_index(), 9);

        tracker.report_scroll_progress(-0.3);
        assert!(tracker.scroll_fraction().abs() < f64::EPSILON);
        assert_eq!(tracker.timeline_index(), 0);
    }

    #[test]
    fn test_scroll_progress_derives_the_timeline_index() {
        let mut tracker = tracker();

        tracker.report_scroll_progress(0.35);

        // floor(0.35 * 10) over the ten timeline entries.
        assert_eq!(tracker.timeline_index(), 3);
    }

    #[test]
    fn test_non_finite_scroll_progress_is_inert() {
        let mut tracker = tracker();

        tracker.report_scroll_progress(0.35);
        tracker.report_scroll_progress(f64::NAN);
        tracker.report_scroll_progress(f64::INFINITY);

        assert!((tracker.scroll_fraction() - 0.35).abs() < f64::EPSILON);
        assert_eq!(tracker.timeline_index(), 3);
    }

    #[test]
    fn test_monotonic_collections_never_shrink() {
        let mut tracker = tracker();
        let clock = fixed_clock();

        tracker.apply(visible("birth", 0.8), &clock);
        tracker.apply(
            TrackerEvent::OverlayElapsed {
                level: LevelId::new("birth"),
            },
            &clock,
        );
        tracker.mark_level_complete(LevelId::new("birth"), &clock);

        let completed_before = tracker.completed_levels().count();
        let revealed_before = tracker.revealed_levels().count();

        // Scroll away, revisit, re-report, re-complete: nothing may shrink.
        tracker.report_scroll_progress(0.9);
        tracker.apply(visible("intro", 0.9), &clock);
        tracker.apply(visible("birth", 0.9), &clock);
        tracker.mark_level_complete(LevelId::new("birth"), &clock);

        assert_eq!(tracker.completed_levels().count(), completed_before);
        assert_eq!(tracker.revealed_levels().count(), revealed_before);
        assert!(tracker.is_content_revealed(&LevelId::new("birth")));
    }
}
