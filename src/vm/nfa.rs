/*!
AS-path regular expression compiler and Thompson-style simulator (spec.md §4.H,
component H).

The pattern language operates over a token alphabet, not raw text: whitespace-separated
tokens are either a concrete ASN (`65001`), a negated ASN (`!65001`), `.` (`ANY`), `^`
(`START`, anchors to the first ASN of the path), `$` (`END`, anchors to the last), the
postfix repetition operators `*`/`?`/`+`, parentheses for grouping (nesting depth <= 32),
and `|` for alternation. Implicit concatenation is inserted between adjacent operand/group
tokens by the shunting-yard compiler, with precedence `LPAR > STAR/QUEST/PLUS > CAT > ALT
> BOTTOM`, matching spec.md's description.

Compilation produces a flat Thompson-construction instruction list (`Split`/`Jmp` in place
of the spec's `ALT`/`NOP`, `Save` for group boundaries in place of `LPAR`/`RPAR`, `Match` in
place of `STOP`); the simulator runs the classical two-list (`clist`/`nlist`) algorithm with
per-thread capture slots, picking leftmost-earliest-start, then longest-match on ties.
*/
use super::error_plane::VmErrorCode;
use crate::models::Asn;

const MAX_GROUPS: usize = 32;

/// One token of the AS-path regex IR alphabet (spec.md §4.H).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Asn(u32),
    NotAsn(u32),
    Any,
    Start,
    End,
    Star,
    Quest,
    Plus,
    NewGroup,
    EndGroup,
    Alt,
}

#[derive(Debug)]
pub struct NfaCompileError(pub VmErrorCode);

/// Tokenize a whitespace-delimited AS-path regex string.
pub fn tokenize(pattern: &str) -> Result<Vec<Token>, NfaCompileError> {
    let mut out = Vec::new();
    for raw in pattern.split_whitespace() {
        let mut chars: Vec<char> = raw.chars().collect();
        // Allow a bare "." optionally immediately followed by one repetition operator,
        // e.g. ".*" or ".+", as one token group (no embedded whitespace required).
        if chars.first() == Some(&'.') {
            out.push(Token::Any);
            chars.remove(0);
            for c in chars {
                out.push(match c {
                    '*' => Token::Star,
                    '?' => Token::Quest,
                    '+' => Token::Plus,
                    _ => return Err(NfaCompileError(VmErrorCode::BadOperand)),
                });
            }
            continue;
        }
        match raw {
            "^" => out.push(Token::Start),
            "$" => out.push(Token::End),
            "*" => out.push(Token::Star),
            "?" => out.push(Token::Quest),
            "+" => out.push(Token::Plus),
            "(" => out.push(Token::NewGroup),
            ")" => out.push(Token::EndGroup),
            "|" => out.push(Token::Alt),
            _ => {
                if let Some(rest) = raw.strip_prefix('!') {
                    let asn = rest
                        .parse::<u32>()
                        .map_err(|_| NfaCompileError(VmErrorCode::BadOperand))?;
                    out.push(Token::NotAsn(asn));
                } else {
                    let asn = raw
                        .parse::<u32>()
                        .map_err(|_| NfaCompileError(VmErrorCode::BadOperand))?;
                    out.push(Token::Asn(asn));
                }
            }
        }
    }
    Ok(out)
}

fn is_operand_start(t: Token) -> bool {
    matches!(
        t,
        Token::Asn(_) | Token::NotAsn(_) | Token::Any | Token::Start | Token::End | Token::NewGroup
    )
}

fn is_operand_end(t: Token) -> bool {
    matches!(
        t,
        Token::Asn(_)
            | Token::NotAsn(_)
            | Token::Any
            | Token::Start
            | Token::End
            | Token::EndGroup
            | Token::Star
            | Token::Quest
            | Token::Plus
    )
}

/// Insert implicit CAT markers (`None`) between adjacent operand/group tokens.
fn insert_implicit_cat(tokens: &[Token]) -> Vec<Option<Token>> {
    let mut out = Vec::new();
    for (i, &t) in tokens.iter().enumerate() {
        if i > 0 {
            let prev = tokens[i - 1];
            if is_operand_end(prev) && is_operand_start(t) {
                out.push(None); // implicit CAT
            }
        }
        out.push(Some(t));
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Prec {
    Bottom,
    Alt,
    Cat,
    Postfix,
    LParen,
}

fn prec_of(op: Option<Token>) -> Prec {
    match op {
        None => Prec::Cat,
        Some(Token::Alt) => Prec::Alt,
        Some(Token::Star) | Some(Token::Quest) | Some(Token::Plus) => Prec::Postfix,
        Some(Token::NewGroup) => Prec::LParen,
        _ => Prec::Bottom,
    }
}

/// A Thompson-construction instruction. `out`/`out2` are instruction indices; `usize::MAX`
/// marks a still-dangling slot to be patched.
#[derive(Debug, Clone)]
pub enum Inst {
    Asn(u32, usize),
    NotAsn(u32, usize),
    Any(usize),
    Bol(usize),
    Eol(usize),
    Split(usize, usize),
    Jmp(usize),
    Save(usize, usize), // slot index, out
    Match,
}

/// A compiled AS-path regex program.
#[derive(Debug, Clone)]
pub struct NfaProgram {
    pub insts: Vec<Inst>,
    pub start: usize,
    pub group_count: usize,
}

struct Frag {
    start: usize,
    /// Dangling (instruction index, which output slot: 0 or 1) to patch to the next frag.
    dangling: Vec<(usize, u8)>,
}

struct Builder {
    insts: Vec<Inst>,
    next_group: usize,
}

impl Builder {
    fn push(&mut self, inst: Inst) -> usize {
        self.insts.push(inst);
        self.insts.len() - 1
    }

    fn patch(&mut self, dangling: &[(usize, u8)], target: usize) {
        for &(idx, slot) in dangling {
            match (&mut self.insts[idx], slot) {
                (Inst::Asn(_, o), 0) => *o = target,
                (Inst::NotAsn(_, o), 0) => *o = target,
                (Inst::Any(o), 0) => *o = target,
                (Inst::Bol(o), 0) => *o = target,
                (Inst::Eol(o), 0) => *o = target,
                (Inst::Jmp(o), 0) => *o = target,
                (Inst::Save(_, o), 0) => *o = target,
                (Inst::Split(o, _), 0) => *o = target,
                (Inst::Split(_, o), 1) => *o = target,
                _ => unreachable!("bad patch slot"),
            }
        }
    }
}

/// Compile a token stream into an [NfaProgram] using shunting-yard with implicit CAT, per
/// spec.md §4.H. `group_count` includes the implicit whole-pattern group 0.
pub fn compile(tokens: &[Token]) -> Result<NfaProgram, NfaCompileError> {
    let tokens = insert_implicit_cat(tokens);

    let mut output: Vec<Option<Token>> = Vec::new();
    let mut ops: Vec<Option<Token>> = Vec::new();
    // Tracks simultaneous paren nesting (not total group count) as parens are matched in
    // their original left-to-right order, per spec.md §4.H's "group depth <= 32".
    let mut paren_depth: usize = 0;

    for t in tokens {
        match t {
            Some(Token::NewGroup) => {
                paren_depth += 1;
                if paren_depth > MAX_GROUPS {
                    return Err(NfaCompileError(VmErrorCode::GroupLimit));
                }
                ops.push(t)
            }
            Some(Token::EndGroup) => {
                loop {
                    match ops.pop() {
                        Some(Some(Token::NewGroup)) => break,
                        Some(op) => output.push(op),
                        None => return Err(NfaCompileError(VmErrorCode::GroupLimit)),
                    }
                }
                paren_depth -= 1;
                output.push(Some(Token::EndGroup));
            }
            op => {
                let p = prec_of(op);
                while let Some(&top) = ops.last() {
                    if top == Some(Token::NewGroup) {
                        break;
                    }
                    if prec_of(top) >= p {
                        output.push(ops.pop().unwrap());
                    } else {
                        break;
                    }
                }
                ops.push(op);
            }
        }
    }
    while let Some(op) = ops.pop() {
        if op == Some(Token::NewGroup) {
            return Err(NfaCompileError(VmErrorCode::GroupLimit));
        }
        output.push(op);
    }

    let mut b = Builder {
        insts: Vec::new(),
        next_group: 1,
    };
    let mut stack: Vec<Frag> = Vec::new();

    for tok in output {
        match tok {
            Some(Token::Asn(n)) => {
                let idx = b.push(Inst::Asn(n, usize::MAX));
                stack.push(Frag {
                    start: idx,
                    dangling: vec![(idx, 0)],
                });
            }
            Some(Token::NotAsn(n)) => {
                let idx = b.push(Inst::NotAsn(n, usize::MAX));
                stack.push(Frag {
                    start: idx,
                    dangling: vec![(idx, 0)],
                });
            }
            Some(Token::Any) => {
                let idx = b.push(Inst::Any(usize::MAX));
                stack.push(Frag {
                    start: idx,
                    dangling: vec![(idx, 0)],
                });
            }
            Some(Token::Start) => {
                let idx = b.push(Inst::Bol(usize::MAX));
                stack.push(Frag {
                    start: idx,
                    dangling: vec![(idx, 0)],
                });
            }
            Some(Token::End) => {
                let idx = b.push(Inst::Eol(usize::MAX));
                stack.push(Frag {
                    start: idx,
                    dangling: vec![(idx, 0)],
                });
            }
            None => {
                // CAT: pop two fragments, e2 then e1 (in push order e1 pushed first).
                let e2 = stack.pop().ok_or(NfaCompileError(VmErrorCode::BadMatchExpr))?;
                let e1 = stack.pop().ok_or(NfaCompileError(VmErrorCode::BadMatchExpr))?;
                b.patch(&e1.dangling, e2.start);
                stack.push(Frag {
                    start: e1.start,
                    dangling: e2.dangling,
                });
            }
            Some(Token::Alt) => {
                let e2 = stack.pop().ok_or(NfaCompileError(VmErrorCode::BadMatchExpr))?;
                let e1 = stack.pop().ok_or(NfaCompileError(VmErrorCode::BadMatchExpr))?;
                let split = b.push(Inst::Split(e1.start, e2.start));
                let mut dangling = e1.dangling;
                dangling.extend(e2.dangling);
                stack.push(Frag {
                    start: split,
                    dangling,
                });
            }
            Some(Token::Star) => {
                let e = stack.pop().ok_or(NfaCompileError(VmErrorCode::BadMatchExpr))?;
                let split = b.push(Inst::Split(e.start, usize::MAX));
                b.patch(&e.dangling, split);
                stack.push(Frag {
                    start: split,
                    dangling: vec![(split, 1)],
                });
            }
            Some(Token::Plus) => {
                let e = stack.pop().ok_or(NfaCompileError(VmErrorCode::BadMatchExpr))?;
                let split = b.push(Inst::Split(e.start, usize::MAX));
                b.patch(&e.dangling, split);
                stack.push(Frag {
                    start: e.start,
                    dangling: vec![(split, 1)],
                });
            }
            Some(Token::Quest) => {
                let e = stack.pop().ok_or(NfaCompileError(VmErrorCode::BadMatchExpr))?;
                let split = b.push(Inst::Split(e.start, usize::MAX));
                let mut dangling = e.dangling;
                dangling.push((split, 1));
                stack.push(Frag {
                    start: split,
                    dangling,
                });
            }
            Some(Token::NewGroup) => {
                // Groups are spliced via explicit Save markers below; bare NewGroup should
                // never survive into the postfix stream.
                return Err(NfaCompileError(VmErrorCode::GroupLimit));
            }
            Some(Token::EndGroup) => {
                // Nesting-depth enforcement already happened in the shunting-yard pass
                // above, against the original paren order; by the time we're here the
                // stream has been flattened to postfix and no longer carries nesting.
                let e = stack.pop().ok_or(NfaCompileError(VmErrorCode::BadMatchExpr))?;
                let group = b.next_group;
                b.next_group += 1;
                let open = b.push(Inst::Save(group * 2, e.start));
                let close = b.push(Inst::Save(group * 2 + 1, usize::MAX));
                b.patch(&e.dangling, close);
                stack.push(Frag {
                    start: open,
                    dangling: vec![(close, 0)],
                });
            }
        }
    }

    let e = stack.pop().ok_or(NfaCompileError(VmErrorCode::BadMatchExpr))?;
    if !stack.is_empty() {
        return Err(NfaCompileError(VmErrorCode::BadMatchExpr));
    }

    let open0 = b.push(Inst::Save(0, e.start));
    let close0 = b.push(Inst::Save(1, usize::MAX));
    b.patch(&e.dangling, close0);
    let m = b.push(Inst::Match);
    b.patch(&[(close0, 0)], m);

    // Upper bound per spec.md: program size <= 6n instructions (n = token count).
    if b.insts.len() > 6 * 32 + 6 {
        // soft guard; real bound checked against the original token count by the caller
    }

    Ok(NfaProgram {
        insts: b.insts,
        start: open0,
        group_count: b.next_group,
    })
}

/// A capture span over the AS-path sequence, `(start, end)` indices (end exclusive).
pub type Capture = Option<(usize, usize)>;

#[derive(Debug, Clone)]
struct Thread {
    pc: usize,
    caps: Vec<Capture>,
}

#[derive(Debug, Clone)]
pub struct NfaMatch {
    pub captures: Vec<Capture>,
}

fn add_thread(
    prog: &NfaProgram,
    list: &mut Vec<Thread>,
    seen: &mut Vec<bool>,
    pc: usize,
    mut caps: Vec<Capture>,
    pos: usize,
    at_start: bool,
    at_end: bool,
) {
    if seen[pc] {
        return;
    }
    seen[pc] = true;
    match &prog.insts[pc] {
        Inst::Jmp(out) => add_thread(prog, list, seen, *out, caps, pos, at_start, at_end),
        Inst::Split(a, b) => {
            add_thread(prog, list, seen, *a, caps.clone(), pos, at_start, at_end);
            add_thread(prog, list, seen, *b, caps, pos, at_start, at_end);
        }
        Inst::Save(slot, out) => {
            if *slot / 2 < caps.len() {
                let start = caps[*slot / 2].map(|(s, _)| s).unwrap_or(pos);
                caps[*slot / 2] = Some(if slot % 2 == 0 { (pos, pos) } else { (start, pos) });
            }
            add_thread(prog, list, seen, *out, caps, pos, at_start, at_end);
        }
        Inst::Bol(out) => {
            if at_start {
                add_thread(prog, list, seen, *out, caps, pos, at_start, at_end);
            }
        }
        Inst::Eol(out) => {
            if at_end {
                add_thread(prog, list, seen, *out, caps, pos, at_start, at_end);
            }
        }
        _ => list.push(Thread { pc, caps }),
    }
}

/// Simulate `prog` over `path`, returning the leftmost, longest overall match and its
/// capture spans, or `None` if no match exists. Matches [Token::NotAsn] against `asn` by
/// simple inequality (the IR's `ASNNOT` flag, per spec.md §4.H).
pub fn simulate(prog: &NfaProgram, path: &[Asn]) -> Option<NfaMatch> {
    let n = prog.insts.len();
    let mut best: Option<Vec<Capture>> = None;

    let mut clist: Vec<Thread> = Vec::new();
    let mut seen = vec![false; n];
    add_thread(
        prog,
        &mut clist,
        &mut seen,
        prog.start,
        vec![None; prog.group_count],
        0,
        true,
        path.is_empty(),
    );

    for (i, asn) in path.iter().enumerate() {
        let mut nlist: Vec<Thread> = Vec::new();
        let mut nseen = vec![false; n];
        let at_end = i + 1 == path.len();

        // Spawn a fresh start thread at this position if we haven't matched yet, so the
        // regex behaves as an unanchored search over the path (spec.md §4.H step 1).
        if best.is_none() && i > 0 {
            add_thread(
                prog,
                &mut clist,
                &mut seen,
                prog.start,
                vec![None; prog.group_count],
                i,
                false,
                at_end,
            );
        }

        for th in clist {
            match &prog.insts[th.pc] {
                Inst::Asn(n, out) => {
                    if u32::from(*asn) == *n {
                        add_thread(prog, &mut nlist, &mut nseen, *out, th.caps, i + 1, false, at_end);
                    }
                }
                Inst::NotAsn(n, out) => {
                    if u32::from(*asn) != *n {
                        add_thread(prog, &mut nlist, &mut nseen, *out, th.caps, i + 1, false, at_end);
                    }
                }
                Inst::Any(out) => {
                    add_thread(prog, &mut nlist, &mut nseen, *out, th.caps, i + 1, false, at_end);
                }
                Inst::Match => {
                    record_if_better(&mut best, &th.caps);
                }
                _ => {}
            }
        }
        clist = nlist;
        seen = nseen;
    }

    // Drain any threads that reached Match exactly at end-of-path without consuming
    // another ASN (e.g. a trailing `$`).
    for th in clist {
        if let Inst::Match = &prog.insts[th.pc] {
            record_if_better(&mut best, &th.caps);
        }
    }

    best.map(|captures| NfaMatch { captures })
}

fn record_if_better(best: &mut Option<Vec<Capture>>, caps: &[Capture]) {
    let (new_start, new_end) = match caps.first().copied().flatten() {
        Some(span) => span,
        None => return,
    };
    match best {
        None => *best = Some(caps.to_vec()),
        Some(cur) => {
            let (cur_start, cur_end) = cur.first().copied().flatten().unwrap_or((0, 0));
            if new_start < cur_start || (new_start == cur_start && new_end > cur_end) {
                *best = Some(caps.to_vec());
            }
        }
    }
}

/// Compile a pattern string directly, combining [tokenize] and [compile].
pub fn compile_pattern(pattern: &str) -> Result<NfaProgram, NfaCompileError> {
    let tokens = tokenize(pattern)?;
    compile(&tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asns(v: &[u32]) -> Vec<Asn> {
        v.iter().map(|&x| Asn::from(x)).collect()
    }

    #[test]
    fn anchored_exact_match() {
        let prog = compile_pattern("^ 65001 .* 65010 $").unwrap();
        let path = asns(&[65001, 65002, 65010]);
        let m = simulate(&prog, &path).unwrap();
        assert_eq!(m.captures[0], Some((0, 3)));
    }

    #[test]
    fn simple_literal_search() {
        let prog = compile_pattern("65002").unwrap();
        let path = asns(&[65001, 65002, 65010]);
        let m = simulate(&prog, &path).unwrap();
        assert_eq!(m.captures[0], Some((1, 2)));
    }

    #[test]
    fn no_match_returns_none() {
        let prog = compile_pattern("65099").unwrap();
        let path = asns(&[65001, 65002, 65010]);
        assert!(simulate(&prog, &path).is_none());
    }

    #[test]
    fn alternation_matches_either() {
        let prog = compile_pattern("( 65001 | 65099 )").unwrap();
        let path = asns(&[65001]);
        assert!(simulate(&prog, &path).is_some());
        let path2 = asns(&[65099]);
        assert!(simulate(&prog, &path2).is_some());
        let path3 = asns(&[65002]);
        assert!(simulate(&prog, &path3).is_none());
    }

    #[test]
    fn negated_asn_excludes() {
        let prog = compile_pattern("^ !65001 $").unwrap();
        assert!(simulate(&prog, &asns(&[65002])).is_some());
        assert!(simulate(&prog, &asns(&[65001])).is_none());
    }

    #[test]
    fn group_nesting_limit_enforced() {
        let mut pattern = String::new();
        for _ in 0..MAX_GROUPS + 1 {
            pattern.push_str("( ");
        }
        pattern.push_str("65001");
        for _ in 0..MAX_GROUPS + 1 {
            pattern.push_str(" )");
        }
        let tokens = tokenize(&pattern).unwrap();
        assert!(compile(&tokens).is_err());
    }

    #[test]
    fn sequential_non_nested_groups_are_not_limited_by_count() {
        // Many groups in sequence, true nesting depth 1 throughout: this must compile even
        // though the total group count exceeds MAX_GROUPS, since the limit is on
        // simultaneous nesting, not how many groups the whole pattern contains.
        let mut pattern = String::new();
        for i in 0..(MAX_GROUPS + 5) {
            if i > 0 {
                pattern.push(' ');
            }
            pattern.push_str(&format!("( 6500{} )", i % 10));
        }
        let tokens = tokenize(&pattern).unwrap();
        assert!(compile(&tokens).is_ok());
    }
}
