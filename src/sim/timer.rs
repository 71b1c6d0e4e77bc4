/// Timers driven by the frame loop's elapsed milliseconds.
///
/// Nothing here sleeps or reads a clock: the caller hands in elapsed time
/// and the timers turn it into whole seconds.

/// Whole-second countdown. Sub-second remainders are carried between calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
    carry_ms: u64,
}

impl Countdown {
    pub fn new(seconds: u32) -> Self {
        Countdown { remaining: seconds, carry_ms: 0 }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    pub fn reset(&mut self, seconds: u32) {
        self.remaining = seconds;
        self.carry_ms = 0;
    }

    /// Advance by `elapsed_ms`. Returns how many seconds ticked off.
    pub fn advance(&mut self, elapsed_ms: u64) -> u32 {
        if self.remaining == 0 {
            self.carry_ms = 0;
            return 0;
        }
        self.carry_ms += elapsed_ms;
        let whole = (self.carry_ms / 1000).min(self.remaining as u64) as u32;
        self.carry_ms %= 1000;
        self.remaining -= whole;
        if self.remaining == 0 {
            self.carry_ms = 0;
        }
        whole
    }
}

/// What the watching period did during one advance.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WatchingStep {
    Counting,
    /// The countdown for the previous floor ran out; now showing this floor.
    NextFloor(usize),
    /// The last playable floor has been shown.
    Finished,
}

/// Per-floor reveal countdown: floor 0 first, then each floor up to the
/// last playable one, `per_floor` seconds each.
#[derive(Clone, Debug)]
pub struct WatchingPeriodTimer {
    countdown: Countdown,
    floor: usize,
    last_floor: usize,
    per_floor: u32,
    finished: bool,
}

impl WatchingPeriodTimer {
    pub fn new(per_floor: u32, last_floor: usize) -> Self {
        WatchingPeriodTimer {
            countdown: Countdown::new(per_floor),
            floor: 0,
            last_floor,
            per_floor,
            finished: false,
        }
    }

    /// Floor currently on display.
    #[allow(dead_code)]
    pub fn floor(&self) -> usize {
        self.floor
    }

    pub fn remaining(&self) -> u32 {
        self.countdown.remaining()
    }

    #[allow(dead_code)]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn advance(&mut self, elapsed_ms: u64) -> WatchingStep {
        if self.finished {
            return WatchingStep::Finished;
        }
        self.countdown.advance(elapsed_ms);
        if !self.countdown.is_expired() {
            return WatchingStep::Counting;
        }
        if self.floor < self.last_floor {
            self.floor += 1;
            self.countdown.reset(self.per_floor);
            WatchingStep::NextFloor(self.floor)
        } else {
            self.finished = true;
            WatchingStep::Finished
        }
    }
}
