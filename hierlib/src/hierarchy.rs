use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use crate::access::{block_accesses, AccessKind, BlockAccess};
use crate::cache::{CacheLevel, Parent};
use crate::config::HierarchyConfig;
use crate::error::{ConfigError, SimError};
use crate::memory::MemoryPort;
use crate::reference::Reference;
use crate::replacement_policies::Policy;

/// Accesses which fell through every level to main memory
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub reads: u64,
    pub writes: u64,
}

/// A tree of cache levels rooted at main memory
///
/// The hierarchy owns every level and the memory sink. Levels are stored so that a parent always
/// sits after all of its children, which lets an access borrow the level it hits and, separately,
/// everything below it.
pub struct Hierarchy<M: MemoryPort> {
    levels: Vec<CacheLevel>,
    // Storage position of each level, in configured order
    configured: Vec<usize>,
    ram: M,
    memory_stats: MemoryStats,
    instruction_route: usize,
    data_route: usize,
    offset_bits: u32,
    repeat: bool,
}

/// The part of a hierarchy below one level, seen as that level's parent
struct Downstream<'a, M: MemoryPort> {
    target: Parent,
    // Every level after the one this is the parent of
    levels: &'a mut [CacheLevel],
    base: usize,
    ram: &'a mut M,
    memory_stats: &'a mut MemoryStats,
}

impl<'a, M: MemoryPort> Downstream<'a, M> {
    fn forward(&mut self, address: u64, write: bool) -> Result<(), SimError> {
        match self.target {
            Parent::Memory => {
                if write {
                    self.memory_stats.writes += 1;
                    self.ram.write(address)
                } else {
                    self.memory_stats.reads += 1;
                    self.ram.read(address)
                }
            }
            Parent::Level(position) => {
                let (head, rest) = self.levels.split_at_mut(position - self.base + 1);
                let level = &mut head[position - self.base];
                let mut next = Downstream {
                    target: level.parent(),
                    levels: rest,
                    base: position + 1,
                    ram: &mut *self.ram,
                    memory_stats: &mut *self.memory_stats,
                };
                if write {
                    level.write(address, &mut next)
                } else {
                    level.read(address, &mut next)
                }
            }
        }
    }
}

impl<'a, M: MemoryPort> MemoryPort for Downstream<'a, M> {
    fn read(&mut self, address: u64) -> Result<(), SimError> {
        self.forward(address, false)
    }

    fn write(&mut self, address: u64) -> Result<(), SimError> {
        self.forward(address, true)
    }
}

impl<M: MemoryPort> Hierarchy<M> {
    /// Builds and wires every level of a configuration on top of a memory sink
    ///
    /// Fails if names are repeated, a parent or routed level doesn't exist, the parents form a
    /// cycle, or any single level is invalid.
    pub fn new(config: &HierarchyConfig, ram: M) -> Result<Self, ConfigError> {
        let count = config.caches.len();
        let mut by_name: HashMap<&str, usize> = HashMap::with_capacity(count);
        for (i, cache) in config.caches.iter().enumerate() {
            if by_name.insert(cache.name.as_str(), i).is_some() {
                return Err(ConfigError::DuplicateName(cache.name.clone()));
            }
        }
        let parents = config.caches.iter()
            .map(|cache| match &cache.parent {
                None => Ok(None),
                Some(parent) => by_name.get(parent.as_str())
                    .map(|&i| Some(i))
                    .ok_or_else(|| ConfigError::UnknownParent { child: cache.name.clone(), parent: parent.clone() }),
            })
            .collect::<Result<Vec<Option<usize>>, ConfigError>>()?;

        // Distance from main memory. A chain longer than the number of levels has to loop.
        let mut depths = Vec::with_capacity(count);
        for (i, cache) in config.caches.iter().enumerate() {
            let mut depth = 0;
            let mut current = parents[i];
            while let Some(parent) = current {
                depth += 1;
                if depth > count {
                    return Err(ConfigError::Cycle(cache.name.clone()));
                }
                current = parents[parent];
            }
            depths.push(depth);
        }

        // Deepest first, so parents end up after their children. The sort is stable, so siblings
        // keep their configured order.
        let mut order: Vec<usize> = (0..count).collect();
        order.sort_by(|a, b| depths[*b].cmp(&depths[*a]));
        let mut positions = vec![0; count];
        for (position, &i) in order.iter().enumerate() {
            positions[i] = position;
        }

        let levels = order.iter()
            .map(|&i| -> Result<CacheLevel, ConfigError> {
                let cache = &config.caches[i];
                let mut level = CacheLevel::new(
                    cache.name.clone(),
                    cache.associativity,
                    cache.tag_bits,
                    cache.index_bits,
                    cache.offset_bits,
                    Policy::from(cache.replacement_policy),
                )?;
                level.set_parent(match parents[i] {
                    None => Parent::Memory,
                    Some(parent) => Parent::Level(positions[parent]),
                });
                Ok(level)
            })
            .collect::<Result<Vec<CacheLevel>, ConfigError>>()?;

        let route = |name: &str| by_name.get(name)
            .map(|&i| positions[i])
            .ok_or_else(|| ConfigError::UnknownRoute(name.to_string()));
        let data_route = route(config.data_cache.as_str())?;
        let instruction_route = route(config.instruction_route())?;
        let offset_bits = config.block_offset_bits.unwrap_or_else(|| levels[data_route].offset_bits());

        Ok(Self {
            levels,
            configured: positions,
            ram,
            memory_stats: MemoryStats::default(),
            instruction_route,
            data_route,
            offset_bits,
            repeat: config.repeat_accesses,
        })
    }

    /// Replays one reference: splits it into block accesses and sends each, in address order, to
    /// the level its kind enters through. Everything a reference causes, all the way down to
    /// main memory, has happened by the time this returns.
    pub fn access(&mut self, reference: &Reference) -> Result<(), SimError> {
        for access in block_accesses(reference, self.offset_bits, self.repeat) {
            self.dispatch(access)?;
        }
        Ok(())
    }

    /// Sends a single block access to the top level matching its kind
    pub fn dispatch(&mut self, access: BlockAccess) -> Result<(), SimError> {
        match access.kind {
            AccessKind::InstructionFetch => self.read_from(self.instruction_route, access.address),
            AccessKind::DataRead => self.read_from(self.data_route, access.address),
            AccessKind::DataWrite => self.write_to(self.data_route, access.address),
        }
    }

    fn read_from(&mut self, position: usize, address: u64) -> Result<(), SimError> {
        let (level, mut parent) = self.split(position);
        level.read(address, &mut parent)
    }

    fn write_to(&mut self, position: usize, address: u64) -> Result<(), SimError> {
        let (level, mut parent) = self.split(position);
        level.write(address, &mut parent)
    }

    fn split(&mut self, position: usize) -> (&mut CacheLevel, Downstream<'_, M>) {
        let (head, rest) = self.levels.split_at_mut(position + 1);
        let level = &mut head[position];
        let parent = Downstream {
            target: level.parent(),
            levels: rest,
            base: position + 1,
            ram: &mut self.ram,
            memory_stats: &mut self.memory_stats,
        };
        (level, parent)
    }

    /// Empties every level and resets the memory counters. The memory sink itself is left alone.
    pub fn clear(&mut self) {
        for level in &mut self.levels {
            level.clear();
        }
        self.memory_stats = MemoryStats::default();
    }

    /// The levels, children before their parents
    pub fn levels(&self) -> &[CacheLevel] {
        &self.levels
    }

    /// The levels in the order the configuration lists them
    pub fn configured_levels(&self) -> impl Iterator<Item = &CacheLevel> + '_ {
        self.configured.iter().map(|&position| &self.levels[position])
    }

    pub fn level(&self, name: &str) -> Option<&CacheLevel> {
        self.levels.iter().find(|level| level.name() == name)
    }

    pub fn instruction_cache(&self) -> &CacheLevel {
        &self.levels[self.instruction_route]
    }

    pub fn data_cache(&self) -> &CacheLevel {
        &self.levels[self.data_route]
    }

    pub fn offset_bits(&self) -> u32 {
        self.offset_bits
    }

    pub fn repeats_accesses(&self) -> bool {
        self.repeat
    }

    pub fn memory_stats(&self) -> MemoryStats {
        self.memory_stats
    }

    pub fn ram(&self) -> &M {
        &self.ram
    }

    pub fn ram_mut(&mut self) -> &mut M {
        &mut self.ram
    }

    pub fn into_ram(self) -> M {
        self.ram
    }
}
