use crate::cache::Parent;
use crate::config::{CacheConfig, HierarchyConfig, ReplacementPolicyConfig};
use crate::error::ConfigError;
use crate::hierarchy::Hierarchy;
use crate::memory::{MemoryEvent, NullRam, RecordingRam};
use crate::reference::{Reference, ReferenceKind};

fn two_level() -> HierarchyConfig {
    HierarchyConfig {
        caches: vec![
            CacheConfig::new("L1", 1, 8, 0, 0).with_parent("L2"),
            CacheConfig::new("L2", 2, 8, 0, 0),
        ],
        instruction_cache: None,
        data_cache: "L1".to_string(),
        block_offset_bits: None,
        repeat_accesses: false,
    }
}

#[test]
fn nehalem_routes_by_access_kind() {
    let mut hierarchy = Hierarchy::new(&HierarchyConfig::nehalem(), RecordingRam::new()).unwrap();
    hierarchy.access(&Reference::new(ReferenceKind::Instruction, 0x1234, 4)).unwrap();
    assert_eq!(hierarchy.ram().events(), &[MemoryEvent::read(0x1200)]);
    assert_eq!(hierarchy.level("L1I").unwrap().stats().read_misses, 1);
    assert_eq!(hierarchy.level("L1D").unwrap().stats().reads, 0);

    // L2 and L3 already hold the block, so a data read of it stays inside the hierarchy
    hierarchy.access(&Reference::new(ReferenceKind::Read, 0x1230, 8)).unwrap();
    assert_eq!(hierarchy.ram().events().len(), 1);
    assert_eq!(hierarchy.level("L1D").unwrap().stats().read_misses, 1);
    assert_eq!(hierarchy.level("L2").unwrap().stats().hits(), 1);

    hierarchy.access(&Reference::new(ReferenceKind::ReadModifyWrite, 0x1238, 8)).unwrap();
    assert!(hierarchy.data_cache().is_dirty(0x1238));
    assert!(!hierarchy.instruction_cache().is_dirty(0x1238));
    assert_eq!(hierarchy.memory_stats().reads, 1);
}

#[test]
fn nehalem_splits_references_at_block_boundaries() {
    let mut hierarchy = Hierarchy::new(&HierarchyConfig::nehalem(), RecordingRam::new()).unwrap();
    hierarchy.access(&Reference::new(ReferenceKind::Read, 0x13c, 8)).unwrap();
    assert_eq!(hierarchy.ram().events(), &[MemoryEvent::read(0x100), MemoryEvent::read(0x140)]);
}

#[test]
fn dirty_blocks_propagate_level_by_level() {
    let mut hierarchy = Hierarchy::new(&two_level(), RecordingRam::new()).unwrap();
    for reference in [
        Reference::new(ReferenceKind::Write, 0x01, 1),
        // Evicts 0x01 from L1, writing it back into L2 where it is still resident
        Reference::new(ReferenceKind::Read, 0x02, 1),
        // L2 is full, its least recently used block is the dirty 0x01
        Reference::new(ReferenceKind::Read, 0x03, 1),
    ] {
        hierarchy.access(&reference).unwrap();
    }
    assert_eq!(hierarchy.ram().events(), &[
        MemoryEvent::read(0x01),
        MemoryEvent::read(0x02),
        MemoryEvent::write(0x01),
        MemoryEvent::read(0x03),
    ]);
    let l2 = hierarchy.level("L2").unwrap();
    assert_eq!(l2.stats().writes, 1);
    assert_eq!(l2.stats().write_misses, 0);
    assert_eq!(l2.stats().write_backs, 1);
    assert_eq!(hierarchy.memory_stats().writes, 1);
}

#[test]
fn parents_are_placed_after_children() {
    let mut config = HierarchyConfig::nehalem();
    config.caches.reverse();
    let hierarchy = Hierarchy::new(&config, NullRam).unwrap();
    let names: Vec<&str> = hierarchy.levels().iter().map(|l| l.name()).collect();
    assert_eq!(names, vec!["L1D", "L1I", "L2", "L3"]);
    assert_eq!(hierarchy.levels()[0].parent(), Parent::Level(2));
    assert_eq!(hierarchy.levels()[1].parent(), Parent::Level(2));
    assert_eq!(hierarchy.levels()[2].parent(), Parent::Level(3));
    assert_eq!(hierarchy.levels()[3].parent(), Parent::Memory);
    assert_eq!(hierarchy.instruction_cache().name(), "L1I");
}

#[test]
fn single_level_takes_every_kind() {
    let config = HierarchyConfig::single(CacheConfig::new("only", 2, 20, 4, 8));
    let mut hierarchy = Hierarchy::new(&config, RecordingRam::new()).unwrap();
    assert_eq!(hierarchy.offset_bits(), 8);
    hierarchy.access(&Reference::new(ReferenceKind::Instruction, 0x100, 1)).unwrap();
    hierarchy.access(&Reference::new(ReferenceKind::Read, 0x180, 1)).unwrap();
    hierarchy.access(&Reference::new(ReferenceKind::Write, 0x200, 1)).unwrap();
    assert_eq!(hierarchy.ram().events(), &[MemoryEvent::read(0x100), MemoryEvent::read(0x200)]);
    assert_eq!(hierarchy.data_cache().stats().hits(), 1);
}

#[test]
fn clear_keeps_the_sink() {
    let mut hierarchy = Hierarchy::new(&two_level(), RecordingRam::new()).unwrap();
    hierarchy.access(&Reference::new(ReferenceKind::Write, 0x01, 1)).unwrap();
    hierarchy.clear();
    assert!(hierarchy.levels().iter().all(|l| l.resident_block_count() == 0));
    assert_eq!(hierarchy.memory_stats().reads, 0);
    assert_eq!(hierarchy.ram().events().len(), 1);
    hierarchy.access(&Reference::new(ReferenceKind::Read, 0x01, 1)).unwrap();
    assert_eq!(hierarchy.ram().events().len(), 2);
}

#[test]
fn rejects_broken_configurations() {
    let mut duplicate = two_level();
    duplicate.caches[1].name = "L1".to_string();
    assert!(matches!(Hierarchy::new(&duplicate, NullRam), Err(ConfigError::DuplicateName(_))));

    let mut orphan = two_level();
    orphan.caches[0].parent = Some("L9".to_string());
    assert!(matches!(Hierarchy::new(&orphan, NullRam), Err(ConfigError::UnknownParent { .. })));

    let mut cycle = two_level();
    cycle.caches[1].parent = Some("L1".to_string());
    assert!(matches!(Hierarchy::new(&cycle, NullRam), Err(ConfigError::Cycle(_))));

    let mut own_parent = two_level();
    own_parent.caches[1].parent = Some("L2".to_string());
    assert!(matches!(Hierarchy::new(&own_parent, NullRam), Err(ConfigError::Cycle(_))));

    let mut unrouted = two_level();
    unrouted.instruction_cache = Some("L0".to_string());
    assert!(matches!(Hierarchy::new(&unrouted, NullRam), Err(ConfigError::UnknownRoute(name)) if name == "L0"));

    let mut zero = two_level();
    zero.caches[1].associativity = 0;
    assert!(matches!(Hierarchy::new(&zero, NullRam), Err(ConfigError::ZeroAssociativity(_))));
}

#[test]
fn parses_json_configuration() {
    let json = r#"{
        "data_cache": "L1",
        "repeat_accesses": true,
        "caches": [
            {"name": "L1", "associativity": 4, "tag_bits": 20, "index_bits": 6, "offset_bits": 6, "parent": "L2", "replacement_policy": "fifo"},
            {"name": "L2", "associativity": 8, "tag_bits": 14, "index_bits": 12, "offset_bits": 6}
        ]
    }"#;
    let config = HierarchyConfig::from_json(json).unwrap();
    assert_eq!(config.instruction_route(), "L1");
    assert_eq!(config.find("L1").unwrap().replacement_policy, ReplacementPolicyConfig::FirstInFirstOut);
    assert_eq!(config.find("L2").unwrap().replacement_policy, ReplacementPolicyConfig::LeastRecentlyUsed);
    let hierarchy = Hierarchy::new(&config, NullRam).unwrap();
    assert!(hierarchy.repeats_accesses());
    assert_eq!(hierarchy.offset_bits(), 6);

    assert!(matches!(HierarchyConfig::from_json("{\"caches\": []}"), Err(ConfigError::Json(_))));
}
