//! The filtering virtual machine (spec.md §4.G and its supporting components B, H, I, J,
//! K, L). A stack-based bytecode interpreter over a decoded [crate::models::BgpElem],
//! with prefix-trie membership (component B), AS-path NFA regex matching (component H),
//! sorted/bitset community-set matching (component I), a bump-allocated bidirectional
//! arena heap (component L), a match-record trail (component J), and a pluggable error
//! plane (component K).
//!
//! This is an additive, lower-level sibling to [crate::parser::filter::Filter]: the
//! string-keyed filters stay the crate's ergonomic surface; the VM is for callers who
//! compile a program once and run it over many elems, trading ergonomics for the
//! trie/NFA/bitset performance the string filters don't expose. See `DESIGN.md`.

pub mod arena;
pub mod community_matcher;
pub mod error_plane;
pub mod interpreter;
pub mod match_record;
pub mod nfa;
pub mod opcode;
pub mod program;
pub mod trie;

pub use arena::Arena;
pub use community_matcher::{CommunityIndex, CommunityRule, MatchIntent};
pub use error_plane::{set_error_handler, ErrLoc, ErrorHandler, VmErrorCode};
pub use interpreter::Vm;
pub use match_record::{MatchRecord, MatchTrail};
pub use nfa::{compile_pattern, NfaCompileError, NfaProgram};
pub use opcode::{AttrSelector, NetSource, Opcode};
pub use program::{Constant, Program, VmFunc, MAX_CONSTANTS, MAX_FUNCS};
pub use trie::PatriciaTrie;
