/*!
The VM itself (spec.md §4.G, component G): fetch/decode/dispatch loop over a [Program],
bump-allocated [Arena] heap, and the match-record trail.

The VM operates over a single decoded [BgpElem] per `exec` call rather than the raw
message-plus-attribute-offset-cache surface spec.md's component F describes; §9's own
design note endorses trading the atomic offset cache for plain decoded accessors in a
systems-language rewrite, and a `BgpElem` already collapses one NLRI/MP_REACH/withdrawn
entry to a single typed view, so the network-op source selector (`NetSource`) and
attribute selector (`AttrSelector`) operate on that view directly -- see `DESIGN.md`.
*/
use super::arena::Arena;
use super::error_plane::{set_err_stat, VmErrorCode};
use super::match_record::MatchTrail;
use super::nfa;
use super::opcode::{AttrSelector, NetSource, Opcode};
use super::program::{Constant, Program, VmFunc};
use super::trie::PatriciaTrie;
use crate::here;
use crate::models::bgp::community::MetaCommunity;
use crate::models::{AsPathSegment, Asn, BgpElem, ElemType, NetworkPrefix};
use std::net::IpAddr;
use std::rc::Rc;

/// Flatten an AS path's segments into a plain ASN sequence for regex matching. AS_SET
/// members are emitted in their stored (unordered-in-the-wire) order; spec.md's "AS_SET
/// contributes 1" rule is specific to the real-as-path *length* computation in component D
/// and does not apply to the matching sequence consumed here.
fn flatten_as_path(path: &crate::models::AsPath) -> Vec<Asn> {
    let mut out = Vec::new();
    for seg in &path.segments {
        match seg {
            AsPathSegment::AsSequence(s) | AsPathSegment::AsSet(s) => out.extend(s.iter().copied()),
            AsPathSegment::ConfedSequence(_) | AsPathSegment::ConfedSet(_) => {}
        }
    }
    out
}

fn prefix_family_key(p: &NetworkPrefix) -> (bool, u8, u128) {
    let width = p.prefix.prefix_len();
    match p.prefix.addr() {
        IpAddr::V4(a) => (true, width, u32::from(a) as u128),
        IpAddr::V6(a) => (false, width, u128::from_be_bytes(a.octets())),
    }
}

/// The VM's running state plus its immutable [Program]. `setup_failed` latches once any
/// permanent allocation or emit call fails, per spec.md §3's `Vm.setupFailed`.
pub struct Vm {
    prog: Program,
    heap: Arena,
    pc: usize,
    si: usize,
    stack_base: usize,
    nblk: u32,
    match_trail: MatchTrail,
    cur_match: Option<usize>,
    setup_failed: bool,
    running: bool,
}

const SLOT_SIZE: usize = 8;

impl Vm {
    /// `heap_bytes` is the combined stack+heap budget; spec.md requires >= 8 KiB (enforced
    /// by [Arena::new]).
    pub fn new(heap_bytes: usize) -> Self {
        Vm {
            prog: Program::new(),
            heap: Arena::new(heap_bytes),
            pc: 0,
            si: 0,
            stack_base: 0,
            nblk: 0,
            match_trail: MatchTrail::new(),
            cur_match: None,
            setup_failed: false,
            running: false,
        }
    }

    pub fn setup_failed(&self) -> bool {
        self.setup_failed
    }

    /// `Bgp_VmEmit`: append one instruction. Only legal when not running.
    pub fn emit(&mut self, opcode: Opcode, arg: u8) -> Result<(), VmErrorCode> {
        if self.running {
            self.setup_failed = true;
            return set_err_stat(VmErrorCode::BadVmState, here!());
        }
        self.prog.push(opcode, arg);
        Ok(())
    }

    /// `Bgp_VmPermAlloc` equivalent for the constant table.
    pub fn add_constant(&mut self, c: Constant) -> Result<u8, VmErrorCode> {
        match self.prog.add_constant(c) {
            Some(idx) => Ok(idx),
            None => {
                self.setup_failed = true;
                set_err_stat(VmErrorCode::BadIndex, here!())?;
                unreachable!()
            }
        }
    }

    pub fn add_func(&mut self, f: VmFunc) -> Result<u8, VmErrorCode> {
        match self.prog.add_func(f) {
            Some(idx) => Ok(idx),
            None => {
                self.setup_failed = true;
                set_err_stat(VmErrorCode::BadIndex, here!())?;
                unreachable!()
            }
        }
    }

    /// `Bgp_ResetVm`: clears instructions, constants, and matches but keeps the heap memory.
    pub fn reset(&mut self) {
        self.prog = Program::new();
        self.match_trail.clear();
        self.setup_failed = false;
        self.pc = 0;
        self.si = 0;
        self.nblk = 0;
        self.cur_match = None;
    }

    /// `Bgp_ClearVm`: releases all memory.
    pub fn clear(&mut self) {
        self.reset();
        self.heap.clear();
    }

    pub fn match_trail(&self) -> &MatchTrail {
        &self.match_trail
    }

    fn stack_push(&mut self, v: i64) -> Result<(), VmErrorCode> {
        if self.heap.stack_overflow_check(self.si * SLOT_SIZE, SLOT_SIZE) {
            return set_err_stat(VmErrorCode::StackOverflow, here!());
        }
        let off = self.stack_base + self.si * SLOT_SIZE;
        self.heap.write_at(off, &v.to_le_bytes());
        self.si += 1;
        Ok(())
    }

    fn stack_pop(&mut self) -> Result<i64, VmErrorCode> {
        if self.si == 0 {
            return set_err_stat(VmErrorCode::StackUnderflow, here!());
        }
        self.si -= 1;
        let off = self.stack_base + self.si * SLOT_SIZE;
        let bytes = self.heap.read_at(off, SLOT_SIZE);
        Ok(i64::from_le_bytes(bytes.try_into().unwrap()))
    }

    fn push_constant(&mut self, idx: u8) -> Result<(), VmErrorCode> {
        let idx = idx as usize;
        if idx >= self.prog.k.len() {
            return set_err_stat(VmErrorCode::BadIndex, here!());
        }
        // Non-integer constants (tries, NFA programs, community indexes) are addressed
        // indirectly: the "pointer" pushed is just their slot index.
        let to_push = match &self.prog.k[idx] {
            Constant::Int(v) => *v,
            _ => idx as i64,
        };
        self.stack_push(to_push)
    }

    fn constant_at(&self, idx: i64) -> Result<&Constant, VmErrorCode> {
        match usize::try_from(idx).ok().and_then(|i| self.prog.k.get(i)) {
            Some(c) => Ok(c),
            None => {
                set_err_stat(VmErrorCode::BadIndex, here!())?;
                unreachable!()
            }
        }
    }

    /// Emit a match record for a predicate that just evaluated `result`, making it `cur_match`.
    fn emit_match(&mut self, pc: usize, result: bool, base: usize, lim: usize, pos: usize) {
        let idx = self.match_trail.push(pc, result, result, 0, base, lim, pos);
        self.cur_match = Some(idx);
    }

    fn skip_to_endblk(&mut self) -> Result<usize, VmErrorCode> {
        let mut depth = 0u32;
        let mut p = self.pc + 1;
        loop {
            if p >= self.prog.len() {
                return set_err_stat(VmErrorCode::UnmatchedEndblk, here!()).map(|_| 0);
            }
            let (op, _) = self.prog.fetch(p).unwrap();
            match Opcode::try_from(op) {
                Ok(Opcode::Blk) => depth += 1,
                Ok(Opcode::Endblk) => {
                    if depth == 0 {
                        return Ok(p);
                    }
                    depth -= 1;
                }
                _ => {}
            }
            p += 1;
        }
    }

    /// Run the program against one decoded element. Returns `Ok(true)` (PASS) or
    /// `Ok(false)` (FAIL); `Err` on a VM error (the error plane is also latched).
    pub fn exec(&mut self, elem: &BgpElem) -> Result<bool, VmErrorCode> {
        if self.setup_failed {
            return set_err_stat(VmErrorCode::BadVmState, here!());
        }
        if self.prog.is_empty() {
            return set_err_stat(VmErrorCode::EmptyProgram, here!());
        }

        self.heap.begin_exec();
        self.running = true;
        self.stack_base = self.heap.low_mark();
        self.pc = 0;
        self.si = 0;
        self.nblk = 0;
        self.match_trail.clear();
        self.cur_match = None;

        let result = self.run_loop(elem);
        self.heap.end_exec();
        self.running = false;
        result
    }

    fn run_loop(&mut self, elem: &BgpElem) -> Result<bool, VmErrorCode> {
        loop {
            if self.pc >= self.prog.len() {
                return self.finish_with_curmatch();
            }
            let (op_byte, arg) = self.prog.fetch(self.pc).unwrap();
            let opcode = match Opcode::try_from(op_byte) {
                Ok(op) => op,
                Err(_) => return set_err_stat(VmErrorCode::IllegalInstruction, here!()).map(|_| false),
            };

            match opcode {
                Opcode::Nop => self.pc += 1,
                Opcode::Load => {
                    self.stack_push(arg as i8 as i64)?;
                    self.pc += 1;
                }
                Opcode::Loadu => {
                    self.stack_push(arg as i64)?;
                    self.pc += 1;
                }
                Opcode::Loadn => {
                    self.stack_push(0)?;
                    self.pc += 1;
                }
                Opcode::Loadk => {
                    self.push_constant(arg)?;
                    self.pc += 1;
                }
                Opcode::Call => {
                    let idx = arg as usize;
                    if idx >= self.prog.funcs.len() {
                        return set_err_stat(VmErrorCode::BadIndex, here!()).map(|_| false);
                    }
                    let f: Rc<_> = self.prog.funcs[idx].clone();
                    f(self)?;
                    self.pc += 1;
                }
                Opcode::Blk => {
                    self.nblk += 1;
                    self.pc += 1;
                }
                Opcode::Endblk => {
                    if self.nblk == 0 {
                        return set_err_stat(VmErrorCode::UnmatchedEndblk, here!()).map(|_| false);
                    }
                    self.nblk -= 1;
                    self.pc += 1;
                }
                Opcode::Tag => {
                    if let Some(idx) = self.cur_match {
                        self.match_trail.set_tag(idx, arg as i8 as i64);
                    }
                    self.pc += 1;
                }
                Opcode::Not => {
                    let v = self.stack_pop()?;
                    self.stack_push(if v == 0 { 1 } else { 0 })?;
                    self.pc += 1;
                }
                Opcode::Cfail => {
                    let v = self.stack_pop()?;
                    if v != 0 {
                        self.mark_discard_tag();
                        if self.nblk == 0 {
                            return self.finish_unconditional(false);
                        }
                        let endblk = self.skip_to_endblk()?;
                        self.nblk -= 1;
                        self.pc = endblk + 1;
                    } else {
                        self.pc += 1;
                    }
                }
                Opcode::Cpass => {
                    let v = self.stack_pop()?;
                    if v != 0 {
                        self.mark_pass_tag();
                        if self.nblk == 0 {
                            return self.finish_unconditional(true);
                        }
                        let endblk = self.skip_to_endblk()?;
                        self.nblk -= 1;
                        self.pc = endblk + 1;
                    } else {
                        self.pc += 1;
                    }
                }
                Opcode::Jz | Opcode::Jnz => {
                    let v = self.stack_pop()?;
                    let branch = if opcode == Opcode::Jz { v == 0 } else { v != 0 };
                    if branch {
                        let new_pc = self.pc + 1 + arg as usize;
                        if new_pc > self.prog.len() {
                            return set_err_stat(VmErrorCode::BadJump, here!()).map(|_| false);
                        }
                        self.pc = new_pc;
                    } else {
                        self.pc += 1;
                    }
                }
                Opcode::Chkt => {
                    let want = arg != 0; // arg != 0 means ANNOUNCE, 0 means WITHDRAW
                    let got = matches!(elem.elem_type, ElemType::ANNOUNCE);
                    let result = got == want;
                    self.stack_push(result as i64)?;
                    self.emit_match(self.pc, result, 0, 0, 0);
                    self.pc += 1;
                }
                Opcode::Chka => {
                    let sel = match AttrSelector::try_from(arg) {
                        Ok(s) => s,
                        Err(_) => return set_err_stat(VmErrorCode::BadOperand, here!()).map(|_| false),
                    };
                    let result = attr_present(elem, sel);
                    self.stack_push(result as i64)?;
                    self.emit_match(self.pc, result, 0, 0, 0);
                    self.pc += 1;
                }
                Opcode::Exct | Opcode::Subn | Opcode::Supn | Opcode::Relt => {
                    let trie4_idx = self.stack_pop()?;
                    let trie6_idx = self.stack_pop()?;
                    let source = NetSource::try_from(arg)
                        .map_err(|_| VmErrorCode::BadOperand)
                        .or_else(|e| {
                            let _ = set_err_stat(e, here!());
                            Err(e)
                        })?;
                    let result = match source.prefix_for(elem) {
                        None => false,
                        Some(prefix) => {
                            let (is_v4, width, key) = prefix_family_key(prefix);
                            let trie_const = if is_v4 {
                                self.constant_at(trie4_idx)?
                            } else {
                                self.constant_at(trie6_idx)?
                            };
                            let trie: &PatriciaTrie<()> = match trie_const {
                                Constant::Trie4(t) if is_v4 => t,
                                Constant::Trie6(t) if !is_v4 => t,
                                _ => return set_err_stat(VmErrorCode::BadOperand, here!()).map(|_| false),
                            };
                            match opcode {
                                Opcode::Exct => trie.exact_match(width, key).is_some(),
                                Opcode::Subn => trie.is_subnet_of(width, key),
                                Opcode::Supn => trie.is_supernet_of(width, key),
                                Opcode::Relt => trie.is_related_of(width, key),
                                _ => unreachable!(),
                            }
                        }
                    };
                    self.stack_push(result as i64)?;
                    self.emit_match(self.pc, result, 0, 0, 0);
                    self.pc += 1;
                }
                Opcode::Asmtch => {
                    let nfa_idx = self.stack_pop()?;
                    let prog = match self.constant_at(nfa_idx)? {
                        Constant::Nfa(p) => p.clone(),
                        _ => return set_err_stat(VmErrorCode::BadOperand, here!()).map(|_| false),
                    };
                    let path = elem.as_path.as_ref().map(flatten_as_path).unwrap_or_default();
                    let m = nfa::simulate(&prog, &path);
                    let result = m.is_some();
                    let (base, lim) = m
                        .as_ref()
                        .and_then(|mm| mm.captures.first().copied().flatten())
                        .unwrap_or((0, 0));
                    self.stack_push(result as i64)?;
                    self.emit_match(self.pc, result, base, lim, lim);
                    self.pc += 1;
                }
                Opcode::Fasmtc => {
                    return set_err_stat(VmErrorCode::IllegalInstruction, here!()).map(|_| false);
                }
                Opcode::Comtch | Opcode::Acomtc => {
                    let idx = self.stack_pop()?;
                    let communities: &[MetaCommunity] = elem.communities.as_deref().unwrap_or(&[]);
                    let result = match self.constant_at(idx)? {
                        Constant::Communities(ci) => {
                            if opcode == Opcode::Comtch {
                                ci.matches_any(communities)
                            } else {
                                ci.matches_all(communities)
                            }
                        }
                        _ => return set_err_stat(VmErrorCode::BadOperand, here!()).map(|_| false),
                    };
                    self.stack_push(result as i64)?;
                    self.emit_match(self.pc, result, 0, 0, 0);
                    self.pc += 1;
                }
                Opcode::End => return self.finish_with_curmatch(),
            }
        }
    }

    fn mark_discard_tag(&mut self) {
        if let Some(idx) = self.cur_match {
            self.match_trail.mark_failing(idx);
        }
    }

    fn mark_pass_tag(&mut self) {
        if let Some(idx) = self.cur_match {
            self.match_trail.mark_passing(idx);
        }
    }

    /// Natural end-of-program (implicit `END`, or an explicit `END` opcode): PASS unless
    /// `cur_match`'s `is_passing` is false. `cur_match` defaults to a discard sentinel
    /// (`None`) whose `is_passing` is always false, per component J's discard-sentinel
    /// convention.
    fn finish_with_curmatch(&mut self) -> Result<bool, VmErrorCode> {
        self.pc = self.prog.len() + 1;
        let pass = match self.cur_match {
            Some(idx) => self.match_trail.get(idx).is_some_and(|rec| rec.is_passing),
            None => false,
        };
        Ok(pass)
    }

    /// `CFAIL`/`CPASS` firing with no open `BLK`: terminates unconditionally, regardless of
    /// `cur_match`.
    fn finish_unconditional(&mut self, pass: bool) -> Result<bool, VmErrorCode> {
        self.pc = self.prog.len() + 1;
        Ok(pass)
    }
}

fn attr_present(elem: &BgpElem, sel: AttrSelector) -> bool {
    match sel {
        AttrSelector::Origin => elem.origin.is_some(),
        AttrSelector::AsPath => elem.as_path.is_some(),
        AttrSelector::NextHop => elem.next_hop.is_some(),
        AttrSelector::MultiExitDisc => elem.med.is_some(),
        AttrSelector::LocalPref => elem.local_pref.is_some(),
        AttrSelector::AtomicAggregate => elem.atomic,
        AttrSelector::Aggregator => elem.aggr_asn.is_some(),
        AttrSelector::Community => elem.communities.as_ref().is_some_and(|c| !c.is_empty()),
        AttrSelector::OnlyToCustomer => elem.only_to_customer.is_some(),
    }
}

impl NetSource {
    fn prefix_for<'a>(&self, elem: &'a BgpElem) -> Option<&'a NetworkPrefix> {
        use ElemType::*;
        use NetSource::*;
        match (self, elem.elem_type) {
            (Nlri | MpReach | AllNlri, ANNOUNCE) => Some(&elem.prefix),
            (Withdrawn | MpUnreach | AllWithdrawn, WITHDRAW) => Some(&elem.prefix),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::opcode::Opcode::*;
    use std::net::Ipv4Addr;
    use std::str::FromStr;

    fn minimal_elem() -> BgpElem {
        BgpElem {
            timestamp: 0.0,
            elem_type: ElemType::ANNOUNCE,
            peer_ip: IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)),
            peer_asn: Asn::from(65000u32),
            prefix: NetworkPrefix::from_str("10.0.0.0/24").unwrap(),
            next_hop: None,
            as_path: None,
            origin_asns: None,
            origin: None,
            local_pref: None,
            med: None,
            communities: None,
            atomic: false,
            aggr_asn: None,
            aggr_ip: None,
            only_to_customer: None,
            route_distinguisher: None,
            unknown: None,
            deprecated: None,
        }
    }

    #[test]
    fn scenario_5_loadu_not_cpass_end() {
        // LOADU 1; NOT; CPASS; END -- result FALSE, final pc = progLen+1, si = 0.
        let mut vm = Vm::new(8192);
        vm.emit(Loadu, 1).unwrap();
        vm.emit(Not, 0).unwrap();
        vm.emit(Cpass, 0).unwrap();
        vm.emit(End, 0).unwrap();
        let elem = minimal_elem();
        let result = vm.exec(&elem).unwrap();
        assert!(!result);
        assert_eq!(vm.pc, vm.prog.len() + 1);
        assert_eq!(vm.si, 0);
    }

    #[test]
    fn cfail_breaks_to_matching_endblk() {
        // BLK; LOADU 1; CFAIL; LOADU 1; CPASS; ENDBLK; LOADU 1; NOT; CPASS; END
        // The inner "LOADU 1; CPASS" (which would otherwise terminate PASS immediately)
        // must be skipped by CFAIL's break-to-ENDBLK; the program then falls through to a
        // forced-FALSE tail with no real match, landing on the discard-sentinel FAIL.
        let mut vm = Vm::new(8192);
        vm.emit(Blk, 0).unwrap();
        vm.emit(Loadu, 1).unwrap();
        vm.emit(Cfail, 0).unwrap();
        vm.emit(Loadu, 1).unwrap();
        vm.emit(Cpass, 0).unwrap();
        vm.emit(Endblk, 0).unwrap();
        vm.emit(Loadu, 1).unwrap();
        vm.emit(Not, 0).unwrap();
        vm.emit(Cpass, 0).unwrap();
        vm.emit(End, 0).unwrap();
        let elem = minimal_elem();
        let result = vm.exec(&elem).unwrap();
        assert!(!result);
    }

    #[test]
    fn cfail_with_no_open_blk_terminates_false() {
        let mut vm = Vm::new(8192);
        vm.emit(Loadu, 1).unwrap();
        vm.emit(Cfail, 0).unwrap();
        vm.emit(Loadu, 1).unwrap();
        vm.emit(Cpass, 0).unwrap();
        vm.emit(End, 0).unwrap();
        let elem = minimal_elem();
        assert!(!vm.exec(&elem).unwrap());
    }

    #[test]
    fn unmatched_endblk_errors() {
        let mut vm = Vm::new(8192);
        vm.emit(Endblk, 0).unwrap();
        vm.emit(End, 0).unwrap();
        let elem = minimal_elem();
        assert_eq!(vm.exec(&elem), Err(VmErrorCode::UnmatchedEndblk));
    }

    #[test]
    fn chkt_matches_announce() {
        let mut vm = Vm::new(8192);
        vm.emit(Chkt, 1).unwrap();
        vm.emit(Cpass, 0).unwrap();
        vm.emit(End, 0).unwrap();
        let elem = minimal_elem();
        assert!(vm.exec(&elem).unwrap());
    }

    #[test]
    fn empty_program_errors() {
        let mut vm = Vm::new(8192);
        let elem = minimal_elem();
        assert_eq!(vm.exec(&elem), Err(VmErrorCode::EmptyProgram));
    }

    #[test]
    fn exct_against_trie4_constant() {
        let mut trie = PatriciaTrie::<()>::new(32);
        trie.insert(24, u32::from(Ipv4Addr::new(10, 0, 0, 0)) as u128, ());
        let mut vm = Vm::new(8192);
        let trie4 = vm.add_constant(Constant::Trie4(Rc::new(trie))).unwrap();
        let trie6 = vm
            .add_constant(Constant::Trie6(Rc::new(PatriciaTrie::<()>::new(128))))
            .unwrap();
        vm.emit(Loadk, trie6).unwrap();
        vm.emit(Loadk, trie4).unwrap();
        vm.emit(Exct, NetSource::Nlri.into()).unwrap();
        vm.emit(Cpass, 0).unwrap();
        vm.emit(End, 0).unwrap();
        let elem = minimal_elem();
        assert!(vm.exec(&elem).unwrap());
    }
}
