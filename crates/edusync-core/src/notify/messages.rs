//! Fixed completion messages and the selector that picks one.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::record::Message;
use crate::timer::Mode;

/// `(english, arabic)` pairs.
type Pair = (&'static str, &'static str);

const FOCUS_DONE: &[Pair] = &[
    (
        "Great work! Time for a well-earned break.",
        "عمل رائع! حان وقت استراحة مستحقة.",
    ),
    (
        "Focus session complete. Stand up and stretch.",
        "انتهت جلسة التركيز. قف وتمدد قليلاً.",
    ),
    (
        "Your tree grew a little taller. Rest now.",
        "شجرتك كبرت قليلاً. استرح الآن.",
    ),
    (
        "Nicely done! Grab a glass of water.",
        "أحسنت! اشرب كوباً من الماء.",
    ),
];

const SHORT_BREAK_DONE: &[Pair] = &[
    ("Break is over. Back to focus!", "انتهت الاستراحة. عد إلى التركيز!"),
    ("Ready for another round?", "هل أنت مستعد لجولة أخرى؟"),
    (
        "Recharged? Let's get back to it.",
        "هل استعدت نشاطك؟ لنعد إلى العمل.",
    ),
];

const LONG_BREAK_DONE: &[Pair] = &[
    (
        "Long break finished. A new cycle begins!",
        "انتهت الاستراحة الطويلة. تبدأ دورة جديدة!",
    ),
    (
        "Fully rested? Time to plant a new session.",
        "هل ارتحت تماماً؟ حان وقت جلسة جديدة.",
    ),
];

/// The message set announcing that `completed` ended. Never empty.
pub fn messages_for(completed: Mode) -> &'static [Pair] {
    match completed {
        Mode::Focus => FOCUS_DONE,
        Mode::ShortBreak => SHORT_BREAK_DONE,
        Mode::LongBreak => LONG_BREAK_DONE,
    }
}

/// Picks an index into a message set.
pub trait MessageSelector: Send {
    /// Return a value in `0..len`. `len` is never zero.
    fn select(&mut self, len: usize) -> usize;
}

/// Uniform random choice.
#[derive(Debug)]
pub struct RandomSelector {
    rng: StdRng,
}

impl RandomSelector {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageSelector for RandomSelector {
    fn select(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

/// Always the same index (wrapped to the set size).
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedSelector(pub usize);

impl MessageSelector for FixedSelector {
    fn select(&mut self, len: usize) -> usize {
        self.0 % len
    }
}

/// Pick the message for a completed `mode`.
pub fn pick(selector: &mut dyn MessageSelector, completed: Mode) -> Message {
    let set = messages_for(completed);
    let index = selector.select(set.len()).min(set.len() - 1);
    let (primary, secondary) = set[index];
    Message {
        primary: primary.to_string(),
        secondary: secondary.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_mode_has_messages() {
        for mode in [Mode::Focus, Mode::ShortBreak, Mode::LongBreak] {
            let set = messages_for(mode);
            assert!(!set.is_empty());
            for (en, ar) in set {
                assert!(!en.is_empty());
                assert!(!ar.is_empty());
            }
        }
    }

    #[test]
    fn fixed_selector_picks_exact_message() {
        let mut sel = FixedSelector(1);
        let msg = pick(&mut sel, Mode::Focus);
        assert_eq!(msg.primary, FOCUS_DONE[1].0);
        assert_eq!(msg.secondary, FOCUS_DONE[1].1);

        let mut wrap = FixedSelector(7);
        assert_eq!(pick(&mut wrap, Mode::LongBreak).primary, LONG_BREAK_DONE[1].0);
    }

    #[test]
    fn random_selector_stays_in_range() {
        let mut sel = RandomSelector::seeded(42);
        for _ in 0..200 {
            assert!(sel.select(3) < 3);
        }
    }
}
