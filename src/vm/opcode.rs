/*!
VM instruction set (spec.md §4.G). Each instruction is a `(opcode: u8, arg: u8)` pair;
`arg`'s interpretation is opcode-specific (a sign/zero-extended literal, a constant-table
index, a jump displacement, an attribute/network-source selector, or unused).
*/
use num_enum::{IntoPrimitive, TryFromPrimitive};

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Opcode {
    Nop = 0,
    Load = 1,
    Loadu = 2,
    Loadn = 3,
    Loadk = 4,
    Call = 5,
    Blk = 6,
    Endblk = 7,
    Tag = 8,
    Not = 9,
    Cfail = 10,
    Cpass = 11,
    Jz = 12,
    Jnz = 13,
    Chkt = 14,
    Chka = 15,
    Exct = 16,
    Subn = 17,
    Supn = 18,
    Relt = 19,
    Asmtch = 20,
    /// Reserved: referenced but never implemented by the source this was distilled from.
    /// Decoding this opcode always yields `IllegalInstruction` (spec.md §9 open question).
    Fasmtc = 21,
    Comtch = 22,
    Acomtc = 23,
    End = 24,
}

/// Network-op source selector, the `arg` of `EXCT`/`SUBN`/`SUPN`/`RELT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum NetSource {
    Nlri = 0,
    MpReach = 1,
    AllNlri = 2,
    Withdrawn = 3,
    MpUnreach = 4,
    AllWithdrawn = 5,
}

/// Attribute-presence selector, the `arg` of `CHKA`. Mirrors the attribute offset cache's
/// 12 well-known codes (component F), narrowed to the fields the decoded [crate::models::BgpElem]
/// actually surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum AttrSelector {
    Origin = 0,
    AsPath = 1,
    NextHop = 2,
    MultiExitDisc = 3,
    LocalPref = 4,
    AtomicAggregate = 5,
    Aggregator = 6,
    Community = 7,
    OnlyToCustomer = 8,
}
