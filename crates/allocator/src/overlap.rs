//! Overlap rules between blocks of one VRF.
//!
//! Active and reserved blocks claim their range exclusively. Containers only
//! organize space: a container may enclose claimed space, but it may not cut
//! through a claimed block.

use std::collections::{HashSet, VecDeque};

use subnetter_primitives::{Block, BlockId, BlockStatus, Cidr};
use subnetter_storage::{BlockFilter, StoreRead};

use crate::{
    error::{Conflict, IpamResult},
    space::Occupancy,
};

/// Whether a candidate with `status` may not coexist with `existing`.
pub(crate) fn conflicts_with(candidate: &Cidr, status: BlockStatus, existing: &Block) -> bool {
    if !existing.is_claiming() || !candidate.overlaps(&existing.cidr) {
        return false;
    }
    match status {
        BlockStatus::Active | BlockStatus::Reserved => true,
        BlockStatus::Container => !candidate.contains(&existing.cidr),
    }
}

/// First block in `existing` the candidate conflicts with, skipping `skip`.
///
/// `existing` is scanned in order, so the reported block is deterministic
/// for a given listing.
pub(crate) fn first_conflict<'a>(
    candidate: &Cidr,
    status: BlockStatus,
    existing: &'a [Block],
    skip: &[BlockId],
) -> Option<&'a Block> {
    existing
        .iter()
        .filter(|block| !skip.contains(&block.id))
        .find(|block| conflicts_with(candidate, status, block))
}

pub(crate) fn ensure_no_conflict(
    candidate: &Cidr,
    status: BlockStatus,
    existing: &[Block],
    skip: &[BlockId],
) -> IpamResult<()> {
    match first_conflict(candidate, status, existing, skip) {
        Some(block) => Err(Conflict::Overlap {
            candidate: *candidate,
            existing: block.cidr,
            existing_id: block.id,
        }
        .into()),
        None => Ok(()),
    }
}

/// `block` followed by its ancestors, nearest first.
///
/// Stops at a missing parent or a repeated id.
pub(crate) fn lineage<V: StoreRead + ?Sized>(view: &V, block: &Block) -> IpamResult<Vec<BlockId>> {
    let mut ids = vec![block.id];
    let mut seen = HashSet::from([block.id]);
    let mut next = block.parent_id;
    while let Some(id) = next {
        if !seen.insert(id) {
            break;
        }
        ids.push(id);
        next = view.block(id)?.and_then(|parent| parent.parent_id);
    }
    Ok(ids)
}

/// Every block below `block` in the hierarchy, breadth first.
pub(crate) fn descendants<V: StoreRead + ?Sized>(view: &V, block: &Block) -> IpamResult<Vec<BlockId>> {
    let mut ids = Vec::new();
    let mut seen = HashSet::from([block.id]);
    let mut queue = VecDeque::from([block.id]);
    while let Some(id) = queue.pop_front() {
        for child in view.blocks(&BlockFilter::children_of(id))? {
            if seen.insert(child.id) {
                ids.push(child.id);
                queue.push_back(child.id);
            }
        }
    }
    Ok(ids)
}

/// Space under `parent` that a new child must avoid.
///
/// Every existing child of the parent counts, whatever its status or size,
/// and so does every claiming block of the VRF outside the parent's own
/// lineage.
pub(crate) fn occupied_under<V: StoreRead + ?Sized>(view: &V, parent: &Block) -> IpamResult<Occupancy> {
    let skip = lineage(view, parent)?;
    let children = view.blocks(&BlockFilter::children_of(parent.id))?;
    let claiming = view
        .blocks(&BlockFilter::in_vrf(parent.vrf_id))?
        .into_iter()
        .filter(|block| block.is_claiming() && !skip.contains(&block.id));

    let ranges = children
        .into_iter()
        .chain(claiming)
        .filter(|block| block.cidr.overlaps(&parent.cidr))
        .map(|block| block.range());
    Ok(Occupancy::new(parent.family(), ranges))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use subnetter_primitives::VrfId;
    use subnetter_storage::{HierarchyStore, MemoryStore, StoreWrite};

    use super::*;

    fn block(vrf: VrfId, cidr: &str, status: BlockStatus) -> Block {
        Block {
            id: BlockId::random(),
            vrf_id: vrf,
            cidr: Cidr::parse(cidr).unwrap(),
            status,
            description: String::new(),
            parent_id: None,
            created_at: Utc::now(),
        }
    }

    fn cidr(s: &str) -> Cidr {
        Cidr::parse(s).unwrap()
    }

    #[test]
    fn test_claiming_blocks_are_exclusive() {
        let vrf = VrfId::random();
        let active = block(vrf, "10.0.0.0/24", BlockStatus::Active);
        assert!(conflicts_with(&cidr("10.0.0.128/25"), BlockStatus::Active, &active));
        assert!(conflicts_with(&cidr("10.0.0.0/16"), BlockStatus::Reserved, &active));
        assert!(!conflicts_with(&cidr("10.0.1.0/24"), BlockStatus::Active, &active));
    }

    #[test]
    fn test_containers_claim_nothing() {
        let vrf = VrfId::random();
        let container = block(vrf, "10.0.0.0/16", BlockStatus::Container);
        assert!(!conflicts_with(&cidr("10.0.1.0/24"), BlockStatus::Active, &container));
        assert!(!conflicts_with(&cidr("10.0.0.0/8"), BlockStatus::Container, &container));
    }

    #[test]
    fn test_container_may_enclose_but_not_cut() {
        let vrf = VrfId::random();
        let active = block(vrf, "10.0.0.0/24", BlockStatus::Active);
        assert!(!conflicts_with(&cidr("10.0.0.0/16"), BlockStatus::Container, &active));
        assert!(conflicts_with(&cidr("10.0.0.0/25"), BlockStatus::Container, &active));
    }

    #[test]
    fn test_first_conflict_honors_skip_and_order() {
        let vrf = VrfId::random();
        let outer = block(vrf, "10.0.0.0/16", BlockStatus::Active);
        let inner = block(vrf, "10.0.0.0/24", BlockStatus::Reserved);
        let existing = vec![outer.clone(), inner.clone()];

        let hit = first_conflict(&cidr("10.0.0.0/26"), BlockStatus::Active, &existing, &[]);
        assert_eq!(hit.map(|b| b.id), Some(outer.id));

        let hit = first_conflict(&cidr("10.0.0.0/26"), BlockStatus::Active, &existing, &[outer.id]);
        assert_eq!(hit.map(|b| b.id), Some(inner.id));

        let hit = first_conflict(
            &cidr("10.0.0.0/26"),
            BlockStatus::Active,
            &existing,
            &[outer.id, inner.id],
        );
        assert!(hit.is_none());
    }

    #[test]
    fn test_lineage_and_occupied_space() {
        let vrf = VrfId::random();
        let store = MemoryStore::new();
        let root = block(vrf, "10.0.0.0/16", BlockStatus::Active);
        let mut parent = block(vrf, "10.0.0.0/24", BlockStatus::Active);
        parent.parent_id = Some(root.id);
        let mut child = block(vrf, "10.0.0.16/28", BlockStatus::Container);
        child.parent_id = Some(parent.id);
        let stray = block(vrf, "10.0.0.128/25", BlockStatus::Reserved);
        // Same range in another VRF claims nothing here.
        let foreign = block(VrfId::random(), "10.0.0.0/28", BlockStatus::Active);

        store
            .write(|txn: &mut dyn StoreWrite| -> IpamResult<()> {
                for b in [&root, &parent, &child, &stray, &foreign] {
                    txn.insert_block(b)?;
                }
                Ok(())
            })
            .unwrap();

        store
            .read(|view| -> IpamResult<()> {
                assert_eq!(lineage(view, &child)?, vec![child.id, parent.id, root.id]);
                assert_eq!(descendants(view, &root)?, vec![parent.id, child.id]);
                assert!(descendants(view, &child)?.is_empty());

                let occupied = occupied_under(view, &parent)?;
                let gaps: Vec<_> = occupied
                    .gaps(&parent.range())
                    .iter()
                    .map(|g| (g.first_addr().to_string(), g.last_addr().to_string()))
                    .collect();
                assert_eq!(
                    gaps,
                    [
                        ("10.0.0.0".to_string(), "10.0.0.15".to_string()),
                        ("10.0.0.32".to_string(), "10.0.0.127".to_string()),
                    ]
                );
                Ok(())
            })
            .unwrap();
    }
}
