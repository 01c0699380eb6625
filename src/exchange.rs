use crate::turns::{lock_unpoisoned, SharedTurns, Turn};

/// Fixed reply written at the target slot when an exchange fails.
pub const ERROR_REPLY: &str = "Error: Could not generate response";

/// Stream context for one in-flight exchange.
///
/// Captures the arena handle and target slot when the exchange begins and
/// writes through them for its whole life. The accumulated text is rewritten
/// wholesale after every chunk, so repeated writes converge on the final
/// reply without duplication, and a write that outlives its arena lands in
/// an orphaned copy.
#[derive(Debug)]
pub(crate) struct Exchange {
    turns: SharedTurns,
    target_index: usize,
    accumulated: String,
}

impl Exchange {
    pub(crate) fn new(turns: SharedTurns, target_index: usize) -> Self {
        Self {
            turns,
            target_index,
            accumulated: String::new(),
        }
    }

    /// Folds the next decoded chunk into the accumulator and overwrites the
    /// target slot with the full text so far.
    pub(crate) fn absorb(&mut self, chunk: &str) {
        self.accumulated.push_str(chunk);
        self.write(Turn::assistant(self.accumulated.clone()));
    }

    /// Moves the exchange into another arena, carrying accumulated text
    /// over. Used when the server reassigns the exchange to a different
    /// session mid-stream.
    pub(crate) fn retarget(&mut self, turns: SharedTurns, target_index: usize) {
        self.turns = turns;
        self.target_index = target_index;
        if !self.accumulated.is_empty() {
            self.write(Turn::assistant(self.accumulated.clone()));
        }
    }

    /// Writes the terminal error reply at the target slot.
    pub(crate) fn fail(&self) {
        self.write(Turn::assistant(ERROR_REPLY));
    }

    fn write(&self, turn: Turn) {
        lock_unpoisoned(&self.turns).replace_at(self.target_index, turn);
    }
}
