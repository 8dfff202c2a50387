use std::collections::{HashMap, HashSet};
use log::debug;
use serde::{Deserialize, Serialize};
use crate::error::{ConfigError, SimError};
use crate::memory::MemoryPort;
use crate::replacement_policies::{Policy, ReplacementPolicy};

/// Where a cache level sends its misses and write-backs
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Parent {
    /// Straight to main memory
    Memory,
    /// Another level of the same hierarchy, by its position in the hierarchy
    Level(usize),
}

/// Counters kept by each cache level. Reset by [`CacheLevel::clear`].
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelStats {
    pub reads: u64,
    pub read_misses: u64,
    pub writes: u64,
    pub write_misses: u64,
    pub evictions: u64,
    pub write_backs: u64,
}

impl LevelStats {
    pub fn hits(&self) -> u64 {
        self.reads + self.writes - self.misses()
    }

    pub fn misses(&self) -> u64 {
        self.read_misses + self.write_misses
    }
}

/// Mask of `bits` ones shifted up by `shift`
fn field_mask(bits: u32, shift: u32) -> u64 {
    if bits == 0 {
        0
    } else if bits >= u64::BITS {
        u64::MAX
    } else {
        ((1u64 << bits) - 1) << shift
    }
}

/// A single set-associative, write-allocate, write-back cache
///
/// Addresses split into `tag | index | offset` from the most significant end. Blocks are
/// identified by their block id, the address with the offset bits cleared (`tag | index`), while
/// each set only stores tags. Addresses wider than `tag_bits + index_bits + offset_bits` are
/// truncated by the masks.
///
/// A level never owns its parent. Operations which need to go further down the hierarchy take the
/// parent as an argument, and [`Parent`] records which level of the owning hierarchy that is.
///
/// The replacement policy is a type parameter so custom policies can be plugged in without
/// touching the cache; [`Policy`] covers the provided ones.
pub struct CacheLevel<R: ReplacementPolicy = Policy> {
    name: String,
    associativity: usize,
    offset_bits: u32,
    tag_mask: u64,
    index_mask: u64,
    id_mask: u64,
    // Keyed by the index bits, left in place. Tags are in fill order.
    sets: HashMap<u64, Vec<u64>>,
    dirty: HashSet<u64>,
    policy: R,
    parent: Parent,
    stats: LevelStats,
}

impl<R: ReplacementPolicy> CacheLevel<R> {
    /// Creates an empty cache level which feeds main memory
    ///
    /// # Arguments
    ///
    /// * `name`: Used in log records and reports
    /// * `associativity`: The number of blocks per set
    /// * `tag_bits`, `index_bits`, `offset_bits`: The address split, most significant first
    /// * `policy`: The replacement policy
    ///
    /// returns: Result<CacheLevel<R>, ConfigError>
    pub fn new(
        name: impl Into<String>,
        associativity: usize,
        tag_bits: u32,
        index_bits: u32,
        offset_bits: u32,
        policy: R,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        if associativity == 0 {
            return Err(ConfigError::ZeroAssociativity(name));
        }
        let bits = tag_bits + index_bits + offset_bits;
        if bits > u64::BITS {
            return Err(ConfigError::AddressTooWide { name, bits });
        }
        let tag_mask = field_mask(tag_bits, offset_bits + index_bits);
        let index_mask = field_mask(index_bits, offset_bits);
        Ok(Self {
            name,
            associativity,
            offset_bits,
            tag_mask,
            index_mask,
            id_mask: tag_mask | index_mask,
            sets: HashMap::new(),
            dirty: HashSet::new(),
            policy,
            parent: Parent::Memory,
            stats: LevelStats::default(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn associativity(&self) -> usize {
        self.associativity
    }

    pub fn offset_bits(&self) -> u32 {
        self.offset_bits
    }

    pub fn parent(&self) -> Parent {
        self.parent
    }

    // Only the hierarchy rewires levels, once, while it is being built
    pub(crate) fn set_parent(&mut self, parent: Parent) {
        self.parent = parent;
    }

    pub fn stats(&self) -> &LevelStats {
        &self.stats
    }

    /// Splits an address into its index and tag. Both are left in place rather than shifted down.
    pub fn address_to_index_and_tag(&self, address: u64) -> (u64, u64) {
        (address & self.index_mask, address & self.tag_mask)
    }

    /// The address with its offset bits, and any bits above the tag, cleared
    pub fn block_id(&self, address: u64) -> u64 {
        address & self.id_mask
    }

    pub fn contains(&self, address: u64) -> bool {
        let (index, tag) = self.address_to_index_and_tag(address);
        self.is_resident(index, tag)
    }

    pub fn is_dirty(&self, address: u64) -> bool {
        self.dirty.contains(&self.block_id(address))
    }

    /// The number of blocks resident in the set `address` maps to
    pub fn set_occupancy(&self, address: u64) -> usize {
        let (index, _) = self.address_to_index_and_tag(address);
        self.sets.get(&index).map_or(0, Vec::len)
    }

    /// The number of blocks resident in the whole level
    pub fn resident_block_count(&self) -> usize {
        self.sets.values().map(Vec::len).sum()
    }

    pub fn dirty_block_count(&self) -> usize {
        self.dirty.len()
    }

    fn is_resident(&self, index: u64, tag: u64) -> bool {
        self.sets.get(&index).map_or(false, |set| set.contains(&tag))
    }

    /// Reads the block holding `address`, bringing it in from `parent` on a miss
    ///
    /// A miss in a full set first evicts the policy's victim. A dirty victim is written back to
    /// `parent` before the new block is read from it.
    pub fn read<P: MemoryPort>(&mut self, address: u64, parent: &mut P) -> Result<(), SimError> {
        let (index, tag) = self.address_to_index_and_tag(address);
        let block_id = tag | index;
        self.stats.reads += 1;
        if self.is_resident(index, tag) {
            debug!("{}: read hit on {block_id:#010x} in index {:#x}", self.name, index >> self.offset_bits);
        } else {
            self.stats.read_misses += 1;
            debug!("{}: read miss on {block_id:#010x} in index {:#x}", self.name, index >> self.offset_bits);
            self.fill(index, tag, parent)?;
        }
        self.policy.touch(block_id);
        Ok(())
    }

    /// Writes to the block holding `address` and marks it dirty
    ///
    /// Writes allocate: a missing block is brought in exactly as a read miss would, so nothing is
    /// written to `parent` until the block is eventually evicted.
    pub fn write<P: MemoryPort>(&mut self, address: u64, parent: &mut P) -> Result<(), SimError> {
        let (index, tag) = self.address_to_index_and_tag(address);
        let block_id = tag | index;
        self.stats.writes += 1;
        if self.is_resident(index, tag) {
            debug!("{}: write hit on {block_id:#010x} in index {:#x}", self.name, index >> self.offset_bits);
        } else {
            self.stats.write_misses += 1;
            debug!("{}: write miss on {block_id:#010x} in index {:#x} -- allocating", self.name, index >> self.offset_bits);
            self.fill(index, tag, parent)?;
            self.policy.touch(block_id);
        }
        self.policy.touch(block_id);
        self.dirty.insert(block_id);
        Ok(())
    }

    /// Sends a modified block down to `parent`. Doesn't change this level's state.
    pub fn write_back<P: MemoryPort>(&mut self, block_id: u64, parent: &mut P) -> Result<(), SimError> {
        self.stats.write_backs += 1;
        parent.write(block_id)
    }

    /// Forgets every block, dirty or not, along with policy state and statistics. Nothing is
    /// written back.
    pub fn clear(&mut self) {
        self.sets.clear();
        self.dirty.clear();
        self.policy.clear();
        self.stats = LevelStats::default();
    }

    // Brings a missing block in, making room first if its set is full
    fn fill<P: MemoryPort>(&mut self, index: u64, tag: u64, parent: &mut P) -> Result<(), SimError> {
        let set = self.sets.entry(index).or_default();
        if set.len() >= self.associativity {
            let candidates: Vec<u64> = set.iter().map(|t| t | index).collect();
            let evicted = self.policy.evict(&candidates)?;
            let position = set.iter()
                .position(|t| *t == evicted & self.tag_mask)
                .ok_or(SimError::UnknownVictim(evicted))?;
            set.remove(position);
            self.stats.evictions += 1;
            if self.dirty.remove(&evicted) {
                debug!("{}:   capacity conflict -- evicted {evicted:#010x} (dirty) -- writing back", self.name);
                self.write_back(evicted, parent)?;
            } else {
                debug!("{}:   capacity conflict -- evicted {evicted:#010x} (clean)", self.name);
            }
        }
        debug!("{}:   reading from parent", self.name);
        parent.read(tag | index)?;
        self.sets.entry(index).or_default().push(tag);
        Ok(())
    }
}
