//! Instruction sequencing
//!
//! Maps elapsed session time to the current instruction index, and applies
//! the two explicit skip controls. The time-based skip and the index-based
//! step are deliberately independent mechanisms (carried over from the
//! source design): a 15-second skip moves only the clock, a next/previous
//! step moves only the index, and nothing reconciles one against the other.

/// Direction for skip and step commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipDirection {
    Forward,
    Back,
}

/// Seconds moved by one time-based skip command
pub const SKIP_STEP_SECONDS: u64 = 15;

/// Maps elapsed time and skip commands onto a fixed instruction list
#[derive(Debug, Clone)]
pub struct InstructionSequencer {
    duration_seconds: u64,
    instruction_count: usize,
}

impl InstructionSequencer {
    /// Create a sequencer for `instruction_count` instructions spread evenly
    /// over `duration_seconds`.
    ///
    /// `instruction_count` must be at least 1 (validated by
    /// `SessionConfig::validate` before the engine is built).
    pub fn new(duration_seconds: u64, instruction_count: usize) -> Self {
        debug_assert!(instruction_count >= 1);
        Self {
            duration_seconds,
            instruction_count,
        }
    }

    /// Seconds allotted to each instruction
    pub fn seconds_per_instruction(&self) -> f64 {
        self.duration_seconds as f64 / self.instruction_count as f64
    }

    /// Clock-driven index for an elapsed time.
    ///
    /// Advances one step each time `elapsed` crosses a multiple of
    /// `seconds_per_instruction`, and holds the final instruction until
    /// explicit completion (ticks alone never run past the end of the list).
    pub fn index_for_elapsed(&self, elapsed: u64) -> usize {
        let raw = (elapsed as f64 / self.seconds_per_instruction()).floor() as usize;
        raw.min(self.instruction_count - 1)
    }

    /// Time-based skip: move `elapsed` by [`SKIP_STEP_SECONDS`], clamped to
    /// `[0, duration]`. Does not touch the instruction index.
    pub fn skip_seconds(&self, elapsed: u64, direction: SkipDirection) -> u64 {
        match direction {
            SkipDirection::Forward => (elapsed + SKIP_STEP_SECONDS).min(self.duration_seconds),
            SkipDirection::Back => elapsed.saturating_sub(SKIP_STEP_SECONDS),
        }
    }

    /// Index-based step: move the instruction index by one, clamped to the
    /// valid range. Does not touch the elapsed time.
    pub fn step_index(&self, index: usize, direction: SkipDirection) -> usize {
        match direction {
            SkipDirection::Forward => (index + 1).min(self.instruction_count - 1),
            SkipDirection::Back => index.saturating_sub(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_advancement_five_minutes_nine_steps() {
        // 300s / 9 instructions ≈ 33.33s per instruction
        let seq = InstructionSequencer::new(300, 9);

        assert_eq!(seq.index_for_elapsed(0), 0);
        assert_eq!(seq.index_for_elapsed(33), 0);
        assert_eq!(seq.index_for_elapsed(34), 1);
        assert_eq!(seq.index_for_elapsed(40), 1);
        assert_eq!(seq.index_for_elapsed(67), 2);
        // Held at the last instruction through session end
        assert_eq!(seq.index_for_elapsed(299), 8);
        assert_eq!(seq.index_for_elapsed(300), 8);
    }

    #[test]
    fn test_index_non_decreasing_over_ticks() {
        let seq = InstructionSequencer::new(300, 9);
        let mut last = 0;
        for elapsed in 0..=300 {
            let idx = seq.index_for_elapsed(elapsed);
            assert!(idx >= last);
            assert!(idx < 9);
            last = idx;
        }
    }

    #[test]
    fn test_single_instruction_holds_index_zero() {
        let seq = InstructionSequencer::new(60, 1);
        for elapsed in [0, 30, 60] {
            assert_eq!(seq.index_for_elapsed(elapsed), 0);
        }
    }

    #[test]
    fn test_skip_forward_clamps_at_duration() {
        let seq = InstructionSequencer::new(300, 9);
        assert_eq!(seq.skip_seconds(100, SkipDirection::Forward), 115);
        // Skip 15s forward at duration-5 clamps to duration
        assert_eq!(seq.skip_seconds(295, SkipDirection::Forward), 300);
    }

    #[test]
    fn test_skip_back_clamps_at_zero() {
        let seq = InstructionSequencer::new(300, 9);
        assert_eq!(seq.skip_seconds(100, SkipDirection::Back), 85);
        assert_eq!(seq.skip_seconds(10, SkipDirection::Back), 0);
    }

    #[test]
    fn test_step_index_clamps_to_valid_range() {
        let seq = InstructionSequencer::new(300, 9);
        assert_eq!(seq.step_index(3, SkipDirection::Forward), 4);
        assert_eq!(seq.step_index(8, SkipDirection::Forward), 8);
        assert_eq!(seq.step_index(3, SkipDirection::Back), 2);
        assert_eq!(seq.step_index(0, SkipDirection::Back), 0);
    }
}
