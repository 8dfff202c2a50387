use crate::access::{block_accesses, AccessKind, BlockAccess};
use crate::reference::{Reference, ReferenceKind};

fn addresses(reference: &Reference, offset_bits: u32, repeat: bool) -> Vec<u64> {
    block_accesses(reference, offset_bits, repeat).map(|a| a.address).collect()
}

#[test]
fn maps_reference_kinds() {
    let kind = |kind| block_accesses(&Reference::new(kind, 0, 1), 6, false).next().unwrap().kind;
    assert_eq!(kind(ReferenceKind::Instruction), AccessKind::InstructionFetch);
    assert_eq!(kind(ReferenceKind::Read), AccessKind::DataRead);
    assert_eq!(kind(ReferenceKind::Write), AccessKind::DataWrite);
    assert_eq!(kind(ReferenceKind::ReadModifyWrite), AccessKind::DataWrite);
}

#[test]
fn coalesces_within_a_block() {
    assert_eq!(addresses(&Reference::new(ReferenceKind::Read, 0x40, 64), 6, false), vec![0x40]);
    assert_eq!(addresses(&Reference::new(ReferenceKind::Read, 0x7f, 2), 6, false), vec![0x7f, 0x80]);
    assert_eq!(addresses(&Reference::new(ReferenceKind::Read, 0x41, 200), 6, false), vec![0x41, 0x80, 0xc0, 0x100]);
}

#[test]
fn repeats_one_access_per_byte() {
    assert_eq!(addresses(&Reference::new(ReferenceKind::Read, 0x3e, 4), 6, true), vec![0x3e, 0x3f, 0x40, 0x41]);
}

#[test]
fn zero_offset_bits_is_per_byte() {
    let expected: Vec<u64> = (0..17).collect();
    assert_eq!(addresses(&Reference::new(ReferenceKind::Read, 0, 17), 0, false), expected);
}

#[test]
fn stops_at_the_top_of_the_address_space() {
    assert_eq!(addresses(&Reference::new(ReferenceKind::Read, u64::MAX, 8), 6, false), vec![u64::MAX]);
    assert_eq!(addresses(&Reference::new(ReferenceKind::Read, u64::MAX - 1, 8), 0, true), vec![u64::MAX - 1, u64::MAX]);
}

#[test]
fn keeps_access_kind_on_every_block() {
    let accesses: Vec<BlockAccess> = block_accesses(&Reference::new(ReferenceKind::ReadModifyWrite, 0x30, 0x20), 4, false).collect();
    assert_eq!(accesses, vec![
        BlockAccess { kind: AccessKind::DataWrite, address: 0x30 },
        BlockAccess { kind: AccessKind::DataWrite, address: 0x40 },
    ]);
}
