//! Sub-block candidate generation.
//!
//! Claimed space under a parent is flattened into an [`Occupancy`]: disjoint,
//! ascending intervals. The free part of the parent is then a list of gaps,
//! and the candidates of a given prefix length are the aligned blocks that fit
//! entirely inside a gap. Walking gaps in address order and each gap's aligned
//! blocks in address order yields exactly the ascending sequence of all
//! sub-blocks of the parent that overlap nothing claimed, without visiting the
//! claimed ones.

use subnetter_primitives::{AddrRange, CarveStrategy, Cidr, IpFamily};

/// Disjoint, ascending occupied intervals within one address family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occupancy {
    family: IpFamily,
    intervals: Vec<(u128, u128)>,
}

impl Occupancy {
    /// Merge `ranges` of `family` into disjoint intervals.
    ///
    /// Ranges of the other family are ignored. Overlapping and adjacent
    /// ranges are coalesced.
    pub fn new(family: IpFamily, ranges: impl IntoIterator<Item = AddrRange>) -> Self {
        let mut spans: Vec<(u128, u128)> = ranges
            .into_iter()
            .filter(|r| r.family() == family)
            .map(|r| (r.start(), r.end()))
            .collect();
        spans.sort_unstable();

        let mut intervals: Vec<(u128, u128)> = Vec::with_capacity(spans.len());
        for (start, end) in spans {
            match intervals.last_mut() {
                Some(last) if start <= last.1.saturating_add(1) => last.1 = last.1.max(end),
                _ => intervals.push((start, end)),
            }
        }
        Self { family, intervals }
    }

    /// Maximal free intervals of `within`, in ascending order.
    pub fn gaps(&self, within: &AddrRange) -> Vec<AddrRange> {
        if within.family() != self.family {
            return vec![*within];
        }

        let mut gaps = Vec::new();
        let mut cursor = Some(within.start());
        for &(start, end) in &self.intervals {
            let Some(pos) = cursor else { break };
            if end < pos {
                continue;
            }
            if start > within.end() {
                break;
            }
            if start > pos {
                gaps.push(AddrRange::new(self.family, pos, start - 1));
            }
            cursor = end.checked_add(1);
        }
        if let Some(pos) = cursor.filter(|&pos| pos <= within.end()) {
            gaps.push(AddrRange::new(self.family, pos, within.end()));
        }
        gaps
    }
}

/// Aligned blocks of one prefix length lying entirely inside a gap.
#[derive(Debug, Clone)]
pub struct Aligned {
    family: IpFamily,
    prefix_len: u8,
    host_mask: u128,
    next: Option<u128>,
    last: u128,
}

impl Aligned {
    pub fn new(gap: &AddrRange, prefix_len: u8) -> Self {
        let family = gap.family();
        let host_mask = family.host_mask(prefix_len);
        Self {
            family,
            prefix_len,
            host_mask,
            next: align_up(gap.start(), host_mask),
            last: gap.end(),
        }
    }
}

impl Iterator for Aligned {
    type Item = Cidr;

    fn next(&mut self) -> Option<Cidr> {
        let start = self.next?;
        let end = start | self.host_mask;
        if end > self.last {
            self.next = None;
            return None;
        }
        self.next = end.checked_add(1);
        Cidr::from_start(self.family, start, self.prefix_len)
    }
}

/// Round `value` up to the next multiple of `host_mask + 1`.
fn align_up(value: u128, host_mask: u128) -> Option<u128> {
    if value & host_mask == 0 {
        Some(value)
    } else {
        (value | host_mask).checked_add(1)
    }
}

/// Every sub-block of `prefix_len` inside `parent` that overlaps nothing in
/// `occupied`, in ascending address order.
///
/// `prefix_len` must lie between the parent's prefix length and the family
/// width.
pub fn free_blocks(
    parent: &Cidr,
    prefix_len: u8,
    occupied: &Occupancy,
) -> impl Iterator<Item = Cidr> + use<> {
    occupied
        .gaps(&parent.range())
        .into_iter()
        .flat_map(move |gap| Aligned::new(&gap, prefix_len))
}

/// Pick up to `count` free sub-blocks of `prefix_len` inside `parent`.
///
/// - [`CarveStrategy::FirstFit`] takes the lowest-addressed candidates.
/// - [`CarveStrategy::Dense`] fills the smallest free gaps first (ties by
///   lower address), leaving large runs of free space intact.
///
/// The result is in ascending address order for both strategies and is
/// fully determined by `occupied`.
pub fn select(
    parent: &Cidr,
    prefix_len: u8,
    occupied: &Occupancy,
    count: usize,
    strategy: CarveStrategy,
) -> Vec<Cidr> {
    let mut gaps = occupied.gaps(&parent.range());
    match strategy {
        CarveStrategy::FirstFit => {}
        CarveStrategy::Dense => gaps.sort_by_key(|gap| (gap.span(), gap.start())),
    }

    let mut picked: Vec<Cidr> = gaps
        .iter()
        .flat_map(|gap| Aligned::new(gap, prefix_len))
        .take(count)
        .collect();
    picked.sort_by_key(|cidr| cidr.range().start());
    picked
}
