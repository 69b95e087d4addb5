use super::config::SafetyNetConfig;

/// What the safety net decides about an absent scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Reel as usual.
    Proceed,
    /// Reel, but the next miss in a row ends the run.
    Warn,
    /// Kill the game client and stop watching.
    Abort,
}

impl SafetyNetConfig {
    /// `misses` is the successive-failure count including the current scan.
    pub fn judge(&self, misses: u32) -> Verdict {
        if !self.enabled {
            return Verdict::Proceed;
        }
        if misses >= self.abort_after {
            Verdict::Abort
        } else if misses == self.warn_after {
            Verdict::Warn
        } else {
            Verdict::Proceed
        }
    }
}
