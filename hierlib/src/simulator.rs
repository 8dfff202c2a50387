use std::io::BufRead;
use std::time::{Duration, Instant};
use log::warn;
use serde::{Deserialize, Serialize};
use crate::cache::LevelStats;
use crate::config::HierarchyConfig;
use crate::error::{ConfigError, SimError};
use crate::hierarchy::Hierarchy;
use crate::memory::MemoryPort;
use crate::reference::TraceReader;

/// The simulator streams a trace through a hierarchy, skipping lines it can't parse, and collects
/// results.
///
/// It supports calling simulate multiple times; cache state carries over between calls, and the
/// time taken and the results accumulate
pub struct Simulator<M: MemoryPort> {
    hierarchy: Hierarchy<M>,
    references: u64,
    skipped_lines: u64,
    simulation_time: Duration,
}

/// The result of a simulation. Serialises to the JSON report format.
#[derive(Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct SimulationReport {
    pub references: u64,
    pub skipped_lines: u64,
    pub main_memory_reads: u64,
    pub main_memory_writes: u64,
    pub caches: Vec<CacheResult>,
}

/// The result for an individual cache level
#[derive(Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct CacheResult {
    pub name: String,
    pub hits: u64,
    pub misses: u64,
    #[serde(flatten)]
    pub stats: LevelStats,
}

impl<M: MemoryPort> Simulator<M> {
    /// Creates a new simulator for a given configuration
    ///
    /// # Arguments
    ///
    /// * `config`: A hierarchy configuration, usually resulting from parsing JSON
    /// * `ram`: Where accesses falling through the whole hierarchy end up
    ///
    /// returns: Result<Simulator<M>, ConfigError>
    pub fn new(config: &HierarchyConfig, ram: M) -> Result<Self, ConfigError> {
        Ok(Self::from_hierarchy(Hierarchy::new(config, ram)?))
    }

    pub fn from_hierarchy(hierarchy: Hierarchy<M>) -> Self {
        Self {
            hierarchy,
            references: 0,
            skipped_lines: 0,
            simulation_time: Duration::new(0, 0),
        }
    }

    /// Simulates a trace, one reference at a time and strictly in order
    ///
    /// Lines which can't be parsed are logged as warnings and skipped. Failing to read the trace,
    /// failing to emit a memory event, or corrupt cache state aborts the simulation.
    ///
    /// # Arguments
    ///
    /// * `reader`: The trace, one reference per line
    ///
    /// returns: Result<SimulationReport, SimError>
    pub fn simulate<R: BufRead>(&mut self, reader: R) -> Result<SimulationReport, SimError> {
        let start = Instant::now();
        let result = self.replay(reader);
        self.simulation_time += start.elapsed();
        result?;
        Ok(self.report())
    }

    fn replay<R: BufRead>(&mut self, reader: R) -> Result<(), SimError> {
        for item in TraceReader::new(reader) {
            match item {
                Ok(reference) => {
                    self.hierarchy.access(&reference)?;
                    self.references += 1;
                }
                Err(e) if e.is_recoverable() => {
                    warn!("skipping {e}");
                    self.skipped_lines += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Builds a report from the current counters, listing caches in configured order
    pub fn report(&self) -> SimulationReport {
        let memory = self.hierarchy.memory_stats();
        SimulationReport {
            references: self.references,
            skipped_lines: self.skipped_lines,
            main_memory_reads: memory.reads,
            main_memory_writes: memory.writes,
            caches: self.hierarchy.configured_levels().map(|level| CacheResult {
                name: level.name().to_string(),
                hits: level.stats().hits(),
                misses: level.stats().misses(),
                stats: level.stats().clone(),
            }).collect(),
        }
    }

    /// Gets the wall-clock time spent simulating
    pub fn get_execution_time(&self) -> &Duration {
        &self.simulation_time
    }

    pub fn hierarchy(&self) -> &Hierarchy<M> {
        &self.hierarchy
    }

    pub fn hierarchy_mut(&mut self) -> &mut Hierarchy<M> {
        &mut self.hierarchy
    }

    pub fn into_hierarchy(self) -> Hierarchy<M> {
        self.hierarchy
    }
}
