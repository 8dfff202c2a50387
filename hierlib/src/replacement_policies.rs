use std::collections::hash_map::Entry;
use std::collections::HashMap;
use crate::config::ReplacementPolicyConfig;
use crate::error::SimError;

/// A generic trait for implementing new replacement policies. Each cache level owns one instance,
/// which sees every block id that level touches.
pub trait ReplacementPolicy {
    /// Records that a block was just accessed, on hits and on fills alike
    ///
    /// # Arguments
    ///
    /// * `block_id`: The address of the block with its offset bits cleared
    ///
    /// returns: ()
    fn touch(&mut self, block_id: u64);

    /// Picks the block to evict out of the members of a full set, and forgets it
    ///
    /// # Arguments
    ///
    /// * `candidates`: The block ids currently resident in the set, never empty
    ///
    /// returns: Result<u64, SimError>, the victim, which is always one of `candidates`
    fn evict(&mut self, candidates: &[u64]) -> Result<u64, SimError>;

    /// Drops all state, as if nothing had ever been touched
    fn clear(&mut self);
}

/// Finds the candidate with the smallest key, ignoring candidates the policy has never seen.
/// Ties go to the earliest candidate. Falls back to the first candidate so eviction always makes
/// progress.
fn select_min(keys: &HashMap<u64, u64>, candidates: &[u64]) -> Result<u64, SimError> {
    let mut victim = *candidates.first().ok_or(SimError::EvictionOnEmptySet)?;
    let mut min_key = u64::MAX;
    let mut found = false;
    for candidate in candidates {
        if let Some(&key) = keys.get(candidate) {
            if !found || key < min_key {
                min_key = key;
                victim = *candidate;
                found = true;
            }
        }
    }
    Ok(victim)
}

/// True least recently used replacement
///
/// Rather than keeping an ordered list, this stamps each block with a logical clock which ticks on
/// every touch, so the least recently used block is the one with the smallest stamp
#[derive(Debug, Default)]
pub struct LeastRecentlyUsed {
    last_used_times: HashMap<u64, u64>,
    time: u64,
}

impl LeastRecentlyUsed {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReplacementPolicy for LeastRecentlyUsed {
    fn touch(&mut self, block_id: u64) {
        self.last_used_times.insert(block_id, self.time);
        self.time += 1;
    }

    fn evict(&mut self, candidates: &[u64]) -> Result<u64, SimError> {
        let victim = select_min(&self.last_used_times, candidates)?;
        self.last_used_times.remove(&victim);
        Ok(victim)
    }

    fn clear(&mut self) {
        self.last_used_times.clear();
        self.time = 0;
    }
}

/// Least frequently used replacement. Counts restart when a block is evicted.
///
/// Pairs well with byte-repeat expansion, where a wide reference touches its block once per byte.
/// Blocks which were never touched count as zero uses.
#[derive(Debug, Default)]
pub struct LeastFrequentlyUsed {
    usages: HashMap<u64, u64>,
}

impl LeastFrequentlyUsed {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReplacementPolicy for LeastFrequentlyUsed {
    fn touch(&mut self, block_id: u64) {
        *self.usages.entry(block_id).or_insert(0) += 1;
    }

    fn evict(&mut self, candidates: &[u64]) -> Result<u64, SimError> {
        if candidates.is_empty() {
            return Err(SimError::EvictionOnEmptySet);
        }
        let mut victim = candidates[0];
        let mut min_value = u64::MAX;
        for candidate in candidates {
            let usages = self.usages.get(candidate).copied().unwrap_or(0);
            if usages < min_value {
                min_value = usages;
                victim = *candidate;
            }
        }
        self.usages.remove(&victim);
        Ok(victim)
    }

    fn clear(&mut self) {
        self.usages.clear();
    }
}

/// Evicts blocks in the order they were brought in, regardless of later hits. Equivalent to a
/// per-set round robin pointer.
#[derive(Debug, Default)]
pub struct FirstInFirstOut {
    fill_times: HashMap<u64, u64>,
    time: u64,
}

impl FirstInFirstOut {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReplacementPolicy for FirstInFirstOut {
    fn touch(&mut self, block_id: u64) {
        let time = self.time;
        if let Entry::Vacant(entry) = self.fill_times.entry(block_id) {
            entry.insert(time);
            self.time += 1;
        }
    }

    fn evict(&mut self, candidates: &[u64]) -> Result<u64, SimError> {
        let victim = select_min(&self.fill_times, candidates)?;
        self.fill_times.remove(&victim);
        Ok(victim)
    }

    fn clear(&mut self) {
        self.fill_times.clear();
        self.time = 0;
    }
}

/// Enum over the provided replacement policies
///
/// Dispatches statically to the concrete policy, so no `dyn ReplacementPolicy` is involved
#[derive(Debug)]
pub enum Policy {
    LeastRecentlyUsed(LeastRecentlyUsed),
    LeastFrequentlyUsed(LeastFrequentlyUsed),
    FirstInFirstOut(FirstInFirstOut),
}

impl From<LeastRecentlyUsed> for Policy {
    fn from(value: LeastRecentlyUsed) -> Self {
        Self::LeastRecentlyUsed(value)
    }
}

impl From<LeastFrequentlyUsed> for Policy {
    fn from(value: LeastFrequentlyUsed) -> Self {
        Self::LeastFrequentlyUsed(value)
    }
}

impl From<FirstInFirstOut> for Policy {
    fn from(value: FirstInFirstOut) -> Self {
        Self::FirstInFirstOut(value)
    }
}

impl From<ReplacementPolicyConfig> for Policy {
    fn from(value: ReplacementPolicyConfig) -> Self {
        match value {
            ReplacementPolicyConfig::LeastRecentlyUsed => LeastRecentlyUsed::new().into(),
            ReplacementPolicyConfig::LeastFrequentlyUsed => LeastFrequentlyUsed::new().into(),
            ReplacementPolicyConfig::FirstInFirstOut => FirstInFirstOut::new().into(),
        }
    }
}

impl ReplacementPolicy for Policy {
    fn touch(&mut self, block_id: u64) {
        match self {
            Policy::LeastRecentlyUsed(p) => p.touch(block_id),
            Policy::LeastFrequentlyUsed(p) => p.touch(block_id),
            Policy::FirstInFirstOut(p) => p.touch(block_id),
        }
    }

    fn evict(&mut self, candidates: &[u64]) -> Result<u64, SimError> {
        match self {
            Policy::LeastRecentlyUsed(p) => p.evict(candidates),
            Policy::LeastFrequentlyUsed(p) => p.evict(candidates),
            Policy::FirstInFirstOut(p) => p.evict(candidates),
        }
    }

    fn clear(&mut self) {
        match self {
            Policy::LeastRecentlyUsed(p) => p.clear(),
            Policy::LeastFrequentlyUsed(p) => p.clear(),
            Policy::FirstInFirstOut(p) => p.clear(),
        }
    }
}
