use serde::{Deserialize, Serialize};
use crate::error::ConfigError;

/// A cache hierarchy: its levels, how they're wired together, and which levels the different
/// kinds of access enter through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyConfig {
    pub caches: Vec<CacheConfig>,
    /// The level instruction fetches go to. Defaults to the data cache, for a unified top level.
    #[serde(default)]
    pub instruction_cache: Option<String>,
    /// The level loads and stores go to
    pub data_cache: String,
    /// log2 of the granularity references are split at. Defaults to the data cache's offset bits.
    #[serde(default)]
    pub block_offset_bits: Option<u32>,
    /// Produce one access per byte instead of one per block
    #[serde(default)]
    pub repeat_accesses: bool,
}

/// A configuration for a single cache level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub name: String,
    pub associativity: usize,
    pub tag_bits: u32,
    pub index_bits: u32,
    pub offset_bits: u32,
    #[serde(default)]
    pub replacement_policy: ReplacementPolicyConfig,
    /// The name of the level below this one, or main memory if absent
    #[serde(default)]
    pub parent: Option<String>,
}

/// The replacement policy - lru, lfu, or fifo. Defaults to lru.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplacementPolicyConfig {
    #[default]
    #[serde(alias = "lru")]
    LeastRecentlyUsed,
    #[serde(alias = "lfu")]
    LeastFrequentlyUsed,
    #[serde(alias = "fifo", alias = "rr")]
    FirstInFirstOut,
}

impl CacheConfig {
    pub fn new(name: impl Into<String>, associativity: usize, tag_bits: u32, index_bits: u32, offset_bits: u32) -> Self {
        Self {
            name: name.into(),
            associativity,
            tag_bits,
            index_bits,
            offset_bits,
            replacement_policy: ReplacementPolicyConfig::default(),
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_policy(mut self, policy: ReplacementPolicyConfig) -> Self {
        self.replacement_policy = policy;
        self
    }
}

impl HierarchyConfig {
    /// A hierarchy made of a single level sitting directly on main memory, taking every access
    pub fn single(mut cache: CacheConfig) -> Self {
        cache.parent = None;
        Self {
            data_cache: cache.name.clone(),
            caches: vec![cache],
            instruction_cache: None,
            block_offset_bits: None,
            repeat_accesses: false,
        }
    }

    /// Intel Nehalem: 64 byte blocks and 32 bit addresses
    ///
    /// | level | ways | tag | index | offset |
    /// |-------|------|-----|-------|--------|
    /// | L1I   | 4    | 19  | 7     | 6      |
    /// | L1D   | 8    | 20  | 6     | 6      |
    /// | L2    | 8    | 14  | 12    | 6      |
    /// | L3    | 16   | 9   | 17    | 6      |
    ///
    /// Both L1s feed L2, which feeds L3. Intel doesn't document the L3 replacement policy, LRU is
    /// used throughout.
    pub fn nehalem() -> Self {
        const ADDRESS_BITS: u32 = 32;
        const OFFSET_BITS: u32 = 6;
        let level = |name: &str, associativity: usize, index_bits: u32| {
            CacheConfig::new(name, associativity, ADDRESS_BITS - index_bits - OFFSET_BITS, index_bits, OFFSET_BITS)
        };
        Self {
            caches: vec![
                level("L1I", 4, 7).with_parent("L2"),
                level("L1D", 8, 6).with_parent("L2"),
                level("L2", 8, 12).with_parent("L3"),
                level("L3", 16, 17),
            ],
            instruction_cache: Some("L1I".to_string()),
            data_cache: "L1D".to_string(),
            block_offset_bits: Some(OFFSET_BITS),
            repeat_accesses: false,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The level instruction fetches enter through
    pub fn instruction_route(&self) -> &str {
        self.instruction_cache.as_deref().unwrap_or(&self.data_cache)
    }

    pub fn find(&self, name: &str) -> Option<&CacheConfig> {
        self.caches.iter().find(|c| c.name == name)
    }
}
