use crate::reference::{Reference, ReferenceKind};

/// What a single block access does to the top of the hierarchy
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AccessKind {
    InstructionFetch,
    DataRead,
    DataWrite,
}

impl From<ReferenceKind> for AccessKind {
    fn from(kind: ReferenceKind) -> Self {
        match kind {
            ReferenceKind::Instruction => AccessKind::InstructionFetch,
            ReferenceKind::Write | ReferenceKind::ReadModifyWrite => AccessKind::DataWrite,
            ReferenceKind::Read => AccessKind::DataRead,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BlockAccess {
    pub kind: AccessKind,
    pub address: u64,
}

/// Iterator over the block accesses covering `[address, address + length)`, in ascending address
/// order
///
/// In the default coalesced mode the cursor jumps to the next block boundary after every step, so
/// each block touched is yielded once. The first access keeps the reference's own (possibly
/// unaligned) address, caches discard the offset bits anyway.
///
/// In repeat mode every byte yields an access, so touch counts accumulate within a block.
pub struct BlockAccesses {
    kind: AccessKind,
    // None once the cursor has run off the top of the address space
    cursor: Option<u64>,
    // u128 so a reference ending at the top of the address space doesn't wrap
    end: u128,
    block_mask: u64,
    repeat: bool,
}

impl Iterator for BlockAccesses {
    type Item = BlockAccess;

    fn next(&mut self) -> Option<Self::Item> {
        let address = self.cursor?;
        if address as u128 >= self.end {
            return None;
        }
        let next = if self.repeat { address } else { address | self.block_mask };
        self.cursor = next.checked_add(1);
        Some(BlockAccess { kind: self.kind, address })
    }
}

/// Expands a reference into the accesses needed at a given block granularity
///
/// # Arguments
///
/// * `reference`: The reference to expand
/// * `offset_bits`: log2 of the block size
/// * `repeat`: Whether to yield one access per byte instead of one per block
///
/// returns: BlockAccesses
///
/// # Examples
///
/// ```
/// use hierlib::access::{block_accesses, AccessKind};
/// use hierlib::reference::{Reference, ReferenceKind};
/// let store = Reference::new(ReferenceKind::Write, 0x3c, 8);
/// let addresses: Vec<u64> = block_accesses(&store, 6, false).map(|a| a.address).collect();
/// assert_eq!(addresses, vec![0x3c, 0x40]);
/// assert!(block_accesses(&store, 6, false).all(|a| a.kind == AccessKind::DataWrite));
/// ```
pub fn block_accesses(reference: &Reference, offset_bits: u32, repeat: bool) -> BlockAccesses {
    let block_mask = if offset_bits >= u64::BITS { u64::MAX } else { (1u64 << offset_bits) - 1 };
    BlockAccesses {
        kind: reference.kind.into(),
        cursor: Some(reference.address),
        end: reference.address as u128 + reference.length as u128,
        block_mask,
        repeat,
    }
}
