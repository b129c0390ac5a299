/*!
 * Identifier minting for tiers, annotations and time slots.
 *
 * New ids take the form `tier<n>`, `an<n>` and `ts<n>`. Each counter holds the
 * number the next minted id will carry.
 */

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

// @const: Numeric suffix of a minted id
static MINTED_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(tier|an|ts)(\d+)$").expect("static id pattern")
});

/// Which family of ids a counter mints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Tier,
    Annotation,
    TimeSlot,
}

impl IdKind {
    /// Prefix used for minted ids
    pub fn prefix(self) -> &'static str {
        match self {
            IdKind::Tier => "tier",
            IdKind::Annotation => "an",
            IdKind::TimeSlot => "ts",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "tier" => Some(IdKind::Tier),
            "an" => Some(IdKind::Annotation),
            "ts" => Some(IdKind::TimeSlot),
            _ => None,
        }
    }
}

/// Document-wide id counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdCounters {
    pub last_used_tier_id: u64,
    pub last_used_annotation_id: u64,
    pub last_used_time_slot_id: u64,
}

impl IdCounters {
    fn slot(&mut self, kind: IdKind) -> &mut u64 {
        match kind {
            IdKind::Tier => &mut self.last_used_tier_id,
            IdKind::Annotation => &mut self.last_used_annotation_id,
            IdKind::TimeSlot => &mut self.last_used_time_slot_id,
        }
    }

    /// Current value of one counter
    pub fn get(&self, kind: IdKind) -> u64 {
        match kind {
            IdKind::Tier => self.last_used_tier_id,
            IdKind::Annotation => self.last_used_annotation_id,
            IdKind::TimeSlot => self.last_used_time_slot_id,
        }
    }

    /// Mint the next id of `kind`, skipping any for which `taken` returns true.
    ///
    /// A counter that runs past `u64::MAX` restarts at zero and keeps
    /// skipping taken ids, so minted ids stay unique.
    pub fn mint(&mut self, kind: IdKind, taken: impl Fn(&str) -> bool) -> String {
        let counter = self.slot(kind);
        loop {
            let id = format!("{}{}", kind.prefix(), *counter);
            *counter = match counter.checked_add(1) {
                Some(next) => next,
                None => {
                    warn!("{} id counter exhausted, restarting at 0", kind.prefix());
                    0
                }
            };
            if !taken(&id) {
                return id;
            }
        }
    }

    /// Raise a counter to at least `value`. Counters never move backwards.
    pub fn raise(&mut self, kind: IdKind, value: u64) {
        let counter = self.slot(kind);
        if value > *counter {
            *counter = value;
        }
    }

    /// Bump the matching counter past `id` if it looks like a minted id.
    pub fn observe(&mut self, id: &str) {
        if let Some((kind, n)) = parse_minted_id(id) {
            self.raise(kind, n.saturating_add(1));
        }
    }
}

/// Split a minted-style id into its kind and numeric suffix.
pub fn parse_minted_id(id: &str) -> Option<(IdKind, u64)> {
    let caps = MINTED_ID_REGEX.captures(id)?;
    let kind = IdKind::from_prefix(caps.get(1)?.as_str())?;
    let n = caps.get(2)?.as_str().parse().ok()?;
    Some((kind, n))
}
