//! End-to-end tests driving the filtering VM (src/vm) from outside its own module, building
//! real [Program]/[Vm] instances via the builder API and running them against a decoded
//! [BgpElem] -- spec.md's component G/H/I/J/K/L, exercised together.

use std::net::Ipv4Addr;
use std::rc::Rc;
use std::str::FromStr;

use bgpkit_parser::models::{
    Asn, AsPath, BgpElem, Community, ElemType, MetaCommunity, NetworkPrefix,
};
use bgpkit_parser::vm::{
    CommunityIndex, CommunityRule, Constant, MatchIntent, NetSource, Opcode, PatriciaTrie, Vm,
};

fn minimal_elem() -> BgpElem {
    BgpElem {
        timestamp: 0.0,
        elem_type: ElemType::ANNOUNCE,
        peer_ip: std::net::IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)),
        peer_asn: Asn::from(65000u32),
        prefix: NetworkPrefix::from_str("10.1.0.0/16").unwrap(),
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

/// Scenario 5: `LOADU 1; NOT; CPASS; END` -- NOT of 1 is 0, so CPASS pops without breaking;
/// the implicit end falls through to the discard sentinel, so the final result is FALSE.
#[test]
fn scenario_5_vm_program() {
    let mut vm = Vm::new(8192);
    vm.emit(Opcode::Loadu, 1).unwrap();
    vm.emit(Opcode::Not, 0).unwrap();
    vm.emit(Opcode::Cpass, 0).unwrap();
    vm.emit(Opcode::End, 0).unwrap();

    let elem = minimal_elem();
    let result = vm.exec(&elem).unwrap();
    assert!(!result);
}

/// Scenario 6: AS-path regex `^ 65001 .* 65010 $` against path `[65001, 65002, 65010]`,
/// matched through a real VM program (`LOADK <nfa>; ASMTCH; END`) rather than calling the
/// NFA simulator directly.
#[test]
fn scenario_6_as_path_regex_through_vm() {
    let nfa_program = bgpkit_parser::vm::compile_pattern("^ 65001 .* 65010 $").unwrap();

    let mut vm = Vm::new(8192);
    let nfa_const = vm.add_constant(Constant::Nfa(Rc::new(nfa_program))).unwrap();
    vm.emit(Opcode::Loadk, nfa_const).unwrap();
    vm.emit(Opcode::Asmtch, 0).unwrap();
    vm.emit(Opcode::End, 0).unwrap();

    let mut elem = minimal_elem();
    elem.as_path = Some(AsPath::from_sequence([65001u32, 65002, 65010]));
    assert!(vm.exec(&elem).unwrap());

    // A path that doesn't end in 65010 must not match the same compiled program.
    let mut non_matching = minimal_elem();
    non_matching.as_path = Some(AsPath::from_sequence([65001u32, 65002, 65099]));
    assert!(!vm.exec(&non_matching).unwrap());
}

/// Scenario 7: ACOMTC over rules `{1:2, 3:*}` and message communities `{1:2, 3:9, 4:5}`:
/// rule 1:2 is matched by community 1:2, rule 3:* is matched by 3:9, so every rule has some
/// matching community and the overall result is TRUE.
#[test]
fn scenario_7_community_acomtc_through_vm() {
    let rules = vec![CommunityRule::full(1, 2), CommunityRule::hi_only(3)];
    let index = CommunityIndex::build(&rules, MatchIntent::All);

    let mut vm = Vm::new(8192);
    let communities_const = vm
        .add_constant(Constant::Communities(Rc::new(index)))
        .unwrap();
    vm.emit(Opcode::Loadk, communities_const).unwrap();
    vm.emit(Opcode::Acomtc, 0).unwrap();
    vm.emit(Opcode::End, 0).unwrap();

    let mut elem = minimal_elem();
    elem.communities = Some(vec![
        MetaCommunity::Plain(Community::Custom(Asn::from(1u32), 2)),
        MetaCommunity::Plain(Community::Custom(Asn::from(3u32), 9)),
        MetaCommunity::Plain(Community::Custom(Asn::from(4u32), 5)),
    ]);
    assert!(vm.exec(&elem).unwrap());

    // Drop community 3:9 so rule 3:* has no matching community left; ACOMTC must fail.
    let mut incomplete = minimal_elem();
    incomplete.communities = Some(vec![MetaCommunity::Plain(Community::Custom(
        Asn::from(1u32),
        2,
    ))]);
    assert!(!vm.exec(&incomplete).unwrap());
}

/// Scenario 8: trie `{10.0.0.0/8}`, query `SubnetOf(10.1.0.0/16)` is TRUE (the queried
/// prefix is a subnet of the stored one) and `SupernetOf(10.1.0.0/16)` is FALSE (the stored
/// prefix is not contained within the queried one), run as two separate VM programs against
/// the same elem.
#[test]
fn scenario_8_patricia_supernet_through_vm() {
    let mut trie4 = PatriciaTrie::<()>::new(32);
    trie4.insert(8, u32::from(Ipv4Addr::new(10, 0, 0, 0)) as u128, ());
    let trie4 = Rc::new(trie4);
    let trie6 = Rc::new(PatriciaTrie::<()>::new(128));

    let elem = minimal_elem(); // prefix 10.1.0.0/16

    let mut subnet_vm = Vm::new(8192);
    let subnet_trie6 = subnet_vm
        .add_constant(Constant::Trie6(trie6.clone()))
        .unwrap();
    let subnet_trie4 = subnet_vm
        .add_constant(Constant::Trie4(trie4.clone()))
        .unwrap();
    subnet_vm.emit(Opcode::Loadk, subnet_trie6).unwrap();
    subnet_vm.emit(Opcode::Loadk, subnet_trie4).unwrap();
    subnet_vm
        .emit(Opcode::Subn, NetSource::Nlri.into())
        .unwrap();
    subnet_vm.emit(Opcode::Cpass, 0).unwrap();
    subnet_vm.emit(Opcode::End, 0).unwrap();
    assert!(subnet_vm.exec(&elem).unwrap());

    let mut supernet_vm = Vm::new(8192);
    let supernet_trie6 = supernet_vm.add_constant(Constant::Trie6(trie6)).unwrap();
    let supernet_trie4 = supernet_vm.add_constant(Constant::Trie4(trie4)).unwrap();
    supernet_vm.emit(Opcode::Loadk, supernet_trie6).unwrap();
    supernet_vm.emit(Opcode::Loadk, supernet_trie4).unwrap();
    supernet_vm
        .emit(Opcode::Supn, NetSource::Nlri.into())
        .unwrap();
    supernet_vm.emit(Opcode::Cpass, 0).unwrap();
    supernet_vm.emit(Opcode::End, 0).unwrap();
    assert!(!supernet_vm.exec(&elem).unwrap());
}

/// A `BLK`/`CFAIL`/`ENDBLK` sequence combined with an AS-path match: when the AS-path
/// doesn't match, CFAIL breaks out of the block and the tail (which would otherwise pass)
/// is skipped, so the whole program discards instead of passing.
#[test]
fn blk_cfail_skips_tail_on_as_path_mismatch() {
    let nfa_program = bgpkit_parser::vm::compile_pattern("^ 65001 $").unwrap();

    let mut vm = Vm::new(8192);
    let nfa_const = vm.add_constant(Constant::Nfa(Rc::new(nfa_program))).unwrap();
    vm.emit(Opcode::Blk, 0).unwrap();
    vm.emit(Opcode::Loadk, nfa_const).unwrap();
    vm.emit(Opcode::Asmtch, 0).unwrap();
    vm.emit(Opcode::Not, 0).unwrap();
    vm.emit(Opcode::Cfail, 0).unwrap();
    vm.emit(Opcode::Loadu, 1).unwrap();
    vm.emit(Opcode::Cpass, 0).unwrap();
    vm.emit(Opcode::Endblk, 0).unwrap();
    vm.emit(Opcode::End, 0).unwrap();

    let mut elem = minimal_elem();
    elem.as_path = Some(AsPath::from_sequence([65002u32]));
    assert!(!vm.exec(&elem).unwrap());

    let mut matching = minimal_elem();
    matching.as_path = Some(AsPath::from_sequence([65001u32]));
    assert!(vm.exec(&matching).unwrap());
}

/// The VM's `match_trail` (component J) records one entry per branching instruction
/// executed, independent of which eventual branch of the program the run takes.
#[test]
fn match_trail_records_each_test_instruction() {
    let mut vm = Vm::new(8192);
    vm.emit(Opcode::Chkt, 1).unwrap();
    vm.emit(Opcode::Cpass, 0).unwrap();
    vm.emit(Opcode::End, 0).unwrap();

    let elem = minimal_elem();
    assert!(vm.exec(&elem).unwrap());
    assert_eq!(vm.match_trail().len(), 1);
}
