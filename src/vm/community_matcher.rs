/*!
Community-set matcher (spec.md §4.I, component I).

A rule is `(hi, lo, mask_hi, mask_lo)`: at most one mask flag may be set. Rules with both
flags clear are full 32-bit matches; `mask_hi` means "any hi, lo must match" (so the rule
is indexed by `lo` alone); `mask_lo` means "hi must match, any lo" (indexed by `hi` alone).
Index construction partitions rules into three sorted, deduplicated arrays and supports two
evaluation modes: "any community matches" (COMTCH) and "every rule has some matching
community" (ACOMTC).
*/
use crate::models::bgp::community::{Community, MetaCommunity};
use crate::models::Asn;

/// One community-matching rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommunityRule {
    pub hi: u16,
    pub lo: u16,
    pub mask_hi: bool,
    pub mask_lo: bool,
}

impl CommunityRule {
    pub fn full(hi: u16, lo: u16) -> Self {
        CommunityRule {
            hi,
            lo,
            mask_hi: false,
            mask_lo: false,
        }
    }

    /// `hi:*` -- any lo, hi is fixed (the "mask_lo" case: "hi must match, any lo").
    pub fn hi_only(hi: u16) -> Self {
        CommunityRule {
            hi,
            lo: 0,
            mask_hi: false,
            mask_lo: true,
        }
    }

    /// `*:lo` -- any hi, lo is fixed.
    pub fn lo_only(lo: u16) -> Self {
        CommunityRule {
            hi: 0,
            lo,
            mask_hi: true,
            mask_lo: false,
        }
    }

    fn full_code(&self) -> u32 {
        ((self.hi as u32) << 16) | self.lo as u32
    }
}

fn radix_sort_dedup_u32(mut v: Vec<u32>) -> Vec<u32> {
    // LSB-first 8-bit radix passes, per spec.md §4.I.
    let mut buf = vec![0u32; v.len()];
    for pass in 0..4 {
        let shift = pass * 8;
        let mut counts = [0usize; 257];
        for &x in &v {
            let b = ((x >> shift) & 0xff) as usize;
            counts[b + 1] += 1;
        }
        for i in 0..256 {
            counts[i + 1] += counts[i];
        }
        for &x in &v {
            let b = ((x >> shift) & 0xff) as usize;
            buf[counts[b]] = x;
            counts[b] += 1;
        }
        std::mem::swap(&mut v, &mut buf);
    }
    v.dedup();
    v
}

fn radix_sort_dedup_u16(mut v: Vec<u16>) -> Vec<u16> {
    let mut buf = vec![0u16; v.len()];
    for pass in 0..2 {
        let shift = pass * 8;
        let mut counts = [0usize; 257];
        for &x in &v {
            let b = ((x >> shift) & 0xff) as usize;
            counts[b + 1] += 1;
        }
        for i in 0..256 {
            counts[i + 1] += counts[i];
        }
        for &x in &v {
            let b = ((x >> shift) & 0xff) as usize;
            buf[counts[b]] = x;
            counts[b] += 1;
        }
        std::mem::swap(&mut v, &mut buf);
    }
    v.dedup();
    v
}

/// Compiled, queryable index over a set of [CommunityRule]s.
#[derive(Debug, Clone, Default)]
pub struct CommunityIndex {
    full: Vec<u32>,
    hi_only: Vec<u16>,
    lo_only: Vec<u16>,
    /// Total number of (deduplicated, post-optimization) rules; bitset width for ACOMTC.
    bitset_len: usize,
}

/// Which evaluation the index was (or will be) optimized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchIntent {
    /// COMTCH: "does any community in the message match any rule?"
    Any,
    /// ACOMTC: "does every rule have at least one matching community?"
    All,
}

impl CommunityIndex {
    pub fn build(rules: &[CommunityRule], intent: MatchIntent) -> Self {
        let mut full = Vec::new();
        let mut hi_only = Vec::new();
        let mut lo_only = Vec::new();
        for r in rules {
            assert!(
                !(r.mask_hi && r.mask_lo),
                "at most one mask flag may be set"
            );
            if r.mask_lo {
                hi_only.push(r.hi);
            } else if r.mask_hi {
                lo_only.push(r.lo);
            } else {
                full.push(r.full_code());
            }
        }
        let full = radix_sort_dedup_u32(full);
        let mut hi_only = radix_sort_dedup_u16(hi_only);
        let mut lo_only = radix_sort_dedup_u16(lo_only);

        match intent {
            MatchIntent::Any => {
                // COMTCH optimization: drop any full rule subsumed by a partial rule.
                let hi_set = hi_only.clone();
                let lo_set = lo_only.clone();
                let full: Vec<u32> = full
                    .into_iter()
                    .filter(|&code| {
                        let hi = (code >> 16) as u16;
                        let lo = (code & 0xffff) as u16;
                        hi_set.binary_search(&hi).is_err() && lo_set.binary_search(&lo).is_err()
                    })
                    .collect();
                let bitset_len = full.len() + hi_only.len() + lo_only.len();
                CommunityIndex {
                    full,
                    hi_only,
                    lo_only,
                    bitset_len,
                }
            }
            MatchIntent::All => {
                // ACOMTC optimization: drop a partial rule if every full rule that could
                // satisfy it is already separately present (i.e. the partial adds nothing
                // a full-rule sweep wouldn't already cover bit-for-bit). We only drop a
                // hi_only/lo_only rule when `full` already contains an entry with the same
                // fixed half AND no other distinguishing role -- conservatively, we keep
                // partial rules unless literally duplicated by full coverage of *all*
                // values of the free half, which full rules alone cannot express. So no
                // partial rule is ever redundant here; we only dedup within each array.
                hi_only.dedup();
                lo_only.dedup();
                let bitset_len = full.len() + hi_only.len() + lo_only.len();
                CommunityIndex {
                    full,
                    hi_only,
                    lo_only,
                    bitset_len,
                }
            }
        }
    }

    fn code_of(c: &MetaCommunity) -> Option<u32> {
        match c {
            MetaCommunity::Plain(Community::Custom(asn, lo)) => {
                Some((u32::from(*asn) << 16) | *lo as u32)
            }
            MetaCommunity::Plain(Community::NoExport) => Some(0xFFFF_FF01),
            MetaCommunity::Plain(Community::NoAdvertise) => Some(0xFFFF_FF02),
            MetaCommunity::Plain(Community::NoExportSubConfed) => Some(0xFFFF_FF03),
            _ => None,
        }
    }

    /// COMTCH: true iff some community's hi, lo, or full code appears in the respective
    /// sorted array.
    pub fn matches_any<'a, I: IntoIterator<Item = &'a MetaCommunity>>(&self, communities: I) -> bool {
        for c in communities {
            if let Some(code) = Self::code_of(c) {
                let hi = (code >> 16) as u16;
                let lo = (code & 0xffff) as u16;
                if self.full.binary_search(&code).is_ok()
                    || self.hi_only.binary_search(&hi).is_ok()
                    || self.lo_only.binary_search(&lo).is_ok()
                {
                    return true;
                }
            }
        }
        false
    }

    /// ACOMTC: true iff every rule in the index has at least one matching community.
    pub fn matches_all<'a, I: IntoIterator<Item = &'a MetaCommunity>>(&self, communities: I) -> bool {
        if self.bitset_len == 0 {
            return true;
        }
        let mut bitset = vec![false; self.bitset_len];
        let communities: Vec<&MetaCommunity> = communities.into_iter().collect();
        for c in &communities {
            if let Some(code) = Self::code_of(c) {
                let hi = (code >> 16) as u16;
                let lo = (code & 0xffff) as u16;
                if let Ok(i) = self.full.binary_search(&code) {
                    bitset[i] = true;
                }
                if let Ok(i) = self.hi_only.binary_search(&hi) {
                    bitset[self.full.len() + i] = true;
                }
                if let Ok(i) = self.lo_only.binary_search(&lo) {
                    bitset[self.full.len() + self.hi_only.len() + i] = true;
                }
            }
        }
        bitset.iter().all(|&b| b)
    }

    pub fn rule_count(&self) -> usize {
        self.bitset_len
    }
}
