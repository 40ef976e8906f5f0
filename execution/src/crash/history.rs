use crate::fixed::Multiplier;
use liftoff_types::crash::HISTORY_LENGTH;
use std::collections::VecDeque;

/// One finished round as shown in the history trail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Cashout multiplier if the player cashed out, crash multiplier otherwise.
    pub multiplier: Multiplier,
    pub cashed_out: bool,
}

/// Bounded in-memory trail of recent rounds, newest first.
#[derive(Clone, Debug, Default)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
}

impl History {
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(HISTORY_LENGTH);
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(x100: u32, cashed_out: bool) -> HistoryEntry {
        HistoryEntry {
            multiplier: Multiplier::from_x100(x100),
            cashed_out,
        }
    }

    #[test]
    fn test_newest_first() {
        let mut history = History::default();
        history.push(entry(150, true));
        history.push(entry(320, false));

        assert_eq!(history.iter().count(), 2);
        assert_eq!(history.latest(), Some(&entry(320, false)));
        let multipliers: Vec<u32> = history.iter().map(|e| e.multiplier.x100()).collect();
        assert_eq!(multipliers, vec![320, 150]);
    }

    #[test]
    fn test_bounded() {
        let mut history = History::default();
        for i in 0..(HISTORY_LENGTH as u32 + 5) {
            history.push(entry(100 + i, false));
        }
        assert_eq!(history.iter().count(), HISTORY_LENGTH);
        // Oldest entries fall off the back.
        let oldest = history.iter().last().unwrap();
        assert_eq!(oldest.multiplier.x100(), 105);
    }
}
