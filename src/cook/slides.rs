use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One screen in the Cook Mode sequence. An explicit tagged union instead of
/// arithmetic on a raw index; transitions are handled exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "step", rename_all = "camelCase")]
pub enum Slide {
    Prep,
    Ingredients,
    Step(usize),
}

impl Slide {
    /// Position within the deck, for the "n / total" indicator.
    pub fn position(&self) -> usize {
        match self {
            Slide::Prep => 0,
            Slide::Ingredients => 1,
            Slide::Step(i) => 2 + i,
        }
    }
}

/// The slide sequencer: prep, ingredients, then one slide per step.
/// `go_next`/`go_prev` saturate at both ends. First entry into a step
/// records its wall-clock start time, write-once per step index.
#[derive(Debug, Clone)]
pub struct SlideDeck {
    current: Slide,
    step_count: usize,
    step_started_at: BTreeMap<usize, DateTime<Utc>>,
}

impl SlideDeck {
    pub fn new(step_count: usize) -> Self {
        Self {
            current: Slide::Prep,
            step_count,
            step_started_at: BTreeMap::new(),
        }
    }

    pub fn current(&self) -> Slide {
        self.current
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn total_slides(&self) -> usize {
        2 + self.step_count
    }

    /// Advance one slide, clamped at the last step. Returns the slide that
    /// is now current.
    pub fn go_next(&mut self, now: DateTime<Utc>) -> Slide {
        let next = match self.current {
            Slide::Prep => Slide::Ingredients,
            // With no steps the deck ends at the ingredients slide.
            Slide::Ingredients if self.step_count == 0 => Slide::Ingredients,
            Slide::Ingredients => Slide::Step(0),
            Slide::Step(i) => {
                if i + 1 < self.step_count {
                    Slide::Step(i + 1)
                } else {
                    Slide::Step(i)
                }
            }
        };
        self.enter(next, now)
    }

    /// Go back one slide, clamped at prep.
    pub fn go_prev(&mut self, now: DateTime<Utc>) -> Slide {
        let prev = match self.current {
            Slide::Prep => Slide::Prep,
            Slide::Ingredients => Slide::Prep,
            Slide::Step(0) => Slide::Ingredients,
            Slide::Step(i) => Slide::Step(i - 1),
        };
        self.enter(prev, now)
    }

    fn enter(&mut self, slide: Slide, now: DateTime<Utc>) -> Slide {
        if let Slide::Step(i) = slide {
            // Write-once: revisits never overwrite the first-entry timestamp.
            self.step_started_at.entry(i).or_insert(now);
        }
        self.current = slide;
        slide
    }

    pub fn step_started_at(&self, step_index: usize) -> Option<DateTime<Utc>> {
        self.step_started_at.get(&step_index).copied()
    }

    /// Seconds spent on each visited step, in step order: the gap between
    /// consecutive first-entry timestamps, the last one closed by `ended_at`.
    pub fn step_durations_seconds(&self, ended_at: DateTime<Utc>) -> Vec<u64> {
        let entries: Vec<(usize, DateTime<Utc>)> = self
            .step_started_at
            .iter()
            .map(|(&i, &at)| (i, at))
            .collect();

        entries
            .iter()
            .enumerate()
            .map(|(pos, &(_, started))| {
                let end = entries
                    .get(pos + 1)
                    .map(|&(_, next)| next)
                    .unwrap_or(ended_at);
                (end - started).num_seconds().max(0) as u64
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).unwrap() + chrono::Duration::seconds(secs as i64)
    }

    #[test]
    fn deck_walks_prep_ingredients_steps() {
        let mut deck = SlideDeck::new(2);
        assert_eq!(deck.current(), Slide::Prep);
        assert_eq!(deck.go_next(at(0)), Slide::Ingredients);
        assert_eq!(deck.go_next(at(1)), Slide::Step(0));
        assert_eq!(deck.go_next(at(2)), Slide::Step(1));
    }

    #[test]
    fn index_saturates_at_both_ends() {
        let mut deck = SlideDeck::new(1);
        assert_eq!(deck.go_prev(at(0)), Slide::Prep);
        assert_eq!(deck.go_prev(at(0)), Slide::Prep);

        deck.go_next(at(0));
        deck.go_next(at(1));
        assert_eq!(deck.current(), Slide::Step(0));
        assert_eq!(deck.go_next(at(2)), Slide::Step(0));
        assert_eq!(deck.go_next(at(3)), Slide::Step(0));
        assert_eq!(deck.current().position(), deck.total_slides() - 1);
    }

    #[test]
    fn position_stays_in_bounds_under_any_sequence() {
        let mut deck = SlideDeck::new(3);
        let moves = [true, true, true, true, true, true, false, false, true, false, false, false, false, true];
        for (tick, &forward) in moves.iter().enumerate() {
            let slide = if forward {
                deck.go_next(at(tick as u32))
            } else {
                deck.go_prev(at(tick as u32))
            };
            assert!(slide.position() < deck.total_slides());
        }
    }

    #[test]
    fn step_start_time_is_write_once() {
        let mut deck = SlideDeck::new(3);
        deck.go_next(at(0)); // ingredients
        deck.go_next(at(10)); // step 0
        deck.go_next(at(20)); // step 1
        deck.go_next(at(30)); // step 2
        deck.go_prev(at(40)); // back to step 1
        deck.go_next(at(50)); // step 2 again

        assert_eq!(deck.step_started_at(1), Some(at(20)));
        assert_eq!(deck.step_started_at(2), Some(at(30)));
    }

    #[test]
    fn empty_deck_never_reaches_a_step() {
        let mut deck = SlideDeck::new(0);
        deck.go_next(at(0));
        deck.go_next(at(1));
        assert_eq!(deck.current(), Slide::Ingredients);
        assert_eq!(deck.total_slides(), 2);
    }

    #[test]
    fn step_durations_close_with_end_timestamp() {
        let mut deck = SlideDeck::new(2);
        deck.go_next(at(0));
        deck.go_next(at(10)); // step 0 starts at +10
        deck.go_next(at(70)); // step 1 starts at +70
        let durations = deck.step_durations_seconds(at(100));
        assert_eq!(durations, vec![60, 30]);
    }
}
