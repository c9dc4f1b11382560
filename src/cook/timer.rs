use serde::Serialize;

/// Fallback duration when a step carries no `duration_minutes`.
pub const DEFAULT_TIMER_MINUTES: u32 = 10;
pub const MAX_TIMER_MINUTES: u32 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerPhase {
    Stopped,
    Running,
    Paused,
    /// Terminal until an explicit reset.
    Ended,
}

/// What a single one-second tick produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Not running; nothing happened.
    Idle,
    Running { seconds_remaining: u32 },
    /// The countdown just hit zero. Yielded exactly once per run; the caller
    /// rings the chime and fires the completion callback on this.
    Ended,
}

/// Per-step countdown, pure state machine. The one-second cadence and the
/// audio cue live with the caller so this is testable with virtual time.
#[derive(Debug, Clone)]
pub struct StepTimer {
    minutes: u32,
    seconds_remaining: u32,
    phase: TimerPhase,
}

impl StepTimer {
    pub fn new(default_minutes: u32) -> Self {
        let minutes = default_minutes.min(MAX_TIMER_MINUTES);
        Self {
            minutes,
            seconds_remaining: minutes * 60,
            phase: TimerPhase::Stopped,
        }
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    /// Start or resume. Resuming after a pause keeps the elapsed time; an
    /// ended timer stays ended until reset.
    pub fn start(&mut self) {
        match self.phase {
            TimerPhase::Stopped | TimerPhase::Paused => {
                if self.seconds_remaining > 0 {
                    self.phase = TimerPhase::Running;
                }
            }
            TimerPhase::Running | TimerPhase::Ended => {}
        }
    }

    pub fn pause(&mut self) {
        if self.phase == TimerPhase::Running {
            self.phase = TimerPhase::Paused;
        }
    }

    /// Back to stopped with the remaining time reinitialized from the
    /// configured duration.
    pub fn reset(&mut self) {
        self.phase = TimerPhase::Stopped;
        self.seconds_remaining = self.minutes * 60;
    }

    /// Change the configured duration, clamped to `[0, 999]` minutes. Takes
    /// effect on the remaining time immediately unless the timer is running
    /// or already ended.
    pub fn set_minutes(&mut self, minutes: u32) {
        self.minutes = minutes.min(MAX_TIMER_MINUTES);
        match self.phase {
            TimerPhase::Stopped | TimerPhase::Paused => {
                self.seconds_remaining = self.minutes * 60;
            }
            TimerPhase::Running | TimerPhase::Ended => {}
        }
    }

    /// One second of wall-clock time.
    pub fn tick(&mut self) -> Tick {
        if self.phase != TimerPhase::Running {
            return Tick::Idle;
        }
        if self.seconds_remaining <= 1 {
            self.seconds_remaining = 0;
            self.phase = TimerPhase::Ended;
            return Tick::Ended;
        }
        self.seconds_remaining -= 1;
        Tick::Running {
            seconds_remaining: self.seconds_remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_minute_countdown_ends_after_sixty_ticks() {
        let mut timer = StepTimer::new(1);
        timer.start();

        let mut completions = 0;
        for _ in 0..60 {
            if timer.tick() == Tick::Ended {
                completions += 1;
            }
        }
        assert_eq!(timer.phase(), TimerPhase::Ended);
        assert_eq!(timer.seconds_remaining(), 0);
        assert_eq!(completions, 1);

        // Further ticks are inert; completion never fires twice.
        for _ in 0..10 {
            assert_eq!(timer.tick(), Tick::Idle);
        }
    }

    #[test]
    fn pause_then_resume_keeps_elapsed_time() {
        let mut timer = StepTimer::new(2);
        timer.start();
        for _ in 0..30 {
            timer.tick();
        }
        assert_eq!(timer.seconds_remaining(), 90);

        timer.pause();
        assert_eq!(timer.tick(), Tick::Idle);
        assert_eq!(timer.seconds_remaining(), 90);

        timer.start();
        timer.tick();
        assert_eq!(timer.seconds_remaining(), 89);
    }

    #[test]
    fn reset_restores_full_duration() {
        let mut timer = StepTimer::new(3);
        timer.start();
        for _ in 0..45 {
            timer.tick();
        }
        timer.reset();
        assert_eq!(timer.phase(), TimerPhase::Stopped);
        assert_eq!(timer.seconds_remaining(), 180);
    }

    #[test]
    fn reset_clears_ended_state() {
        let mut timer = StepTimer::new(1);
        timer.start();
        for _ in 0..60 {
            timer.tick();
        }
        assert_eq!(timer.phase(), TimerPhase::Ended);

        timer.reset();
        timer.start();
        assert!(matches!(timer.tick(), Tick::Running { .. }));
    }

    #[test]
    fn editing_minutes_applies_only_while_not_running() {
        let mut timer = StepTimer::new(5);
        timer.set_minutes(2);
        assert_eq!(timer.seconds_remaining(), 120);

        timer.start();
        timer.tick();
        timer.set_minutes(8);
        // Running countdown is unaffected.
        assert_eq!(timer.seconds_remaining(), 119);

        timer.reset();
        assert_eq!(timer.seconds_remaining(), 480);
    }

    #[test]
    fn minutes_clamp_to_limit() {
        let mut timer = StepTimer::new(5000);
        assert_eq!(timer.minutes(), MAX_TIMER_MINUTES);
        timer.set_minutes(1_000_000);
        assert_eq!(timer.minutes(), MAX_TIMER_MINUTES);
    }

    #[test]
    fn zero_minute_timer_never_runs() {
        let mut timer = StepTimer::new(0);
        timer.start();
        assert_eq!(timer.phase(), TimerPhase::Stopped);
        assert_eq!(timer.tick(), Tick::Idle);
    }
}
