//! Block registration, carving and free space.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use subnetter_primitives::{Block, BlockId, BlockStatus, CarveStrategy, Cidr, RecordKind, VrfId};
use subnetter_storage::{AddressFilter, BlockFilter, HierarchyStore};
use tracing::{debug, info, instrument};

use super::{Ipam, require_block, require_vrf};
use crate::{
    error::{Conflict, IpamResult},
    metrics, overlap,
    page::{Page, Paged},
    space, validate,
};

/// Request to register a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBlock {
    pub vrf_id: VrfId,
    /// CIDR text; canonicalised on registration.
    pub cidr: String,
    #[serde(default)]
    pub status: BlockStatus,
    #[serde(default)]
    pub description: Option<String>,
    /// Register as a child of this block.
    #[serde(default)]
    pub parent_id: Option<BlockId>,
}

impl NewBlock {
    pub fn new(vrf_id: VrfId, cidr: impl Into<String>, status: BlockStatus) -> Self {
        Self {
            vrf_id,
            cidr: cidr.into(),
            status,
            description: None,
            parent_id: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn under(mut self, parent_id: BlockId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// Fields of a block that may change. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockUpdate {
    pub status: Option<BlockStatus>,
    pub description: Option<String>,
}

/// Request to carve child blocks out of a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarveRequest {
    /// Prefix length of every child.
    pub prefix_len: u8,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default)]
    pub strategy: CarveStrategy,
}

const fn default_count() -> u32 {
    1
}

impl CarveRequest {
    pub const fn first_fit(prefix_len: u8, count: u32) -> Self {
        Self {
            prefix_len,
            count,
            strategy: CarveStrategy::FirstFit,
        }
    }

    pub const fn dense(prefix_len: u8, count: u32) -> Self {
        Self {
            prefix_len,
            count,
            strategy: CarveStrategy::Dense,
        }
    }
}

/// Block listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockQuery {
    pub vrf: Option<VrfId>,
    pub parent: Option<BlockId>,
    pub status: Option<BlockStatus>,
    pub prefix_len: Option<u8>,
    /// CIDR text; keeps blocks contained in this range.
    pub within: Option<String>,
}

impl<S: HierarchyStore> Ipam<S> {
    /// Register a block, rejecting it if it conflicts with space already
    /// claimed in its VRF.
    ///
    /// With a parent, the block must lie within the parent and must not
    /// overlap any sibling. The parent and its ancestors never count as
    /// conflicts.
    #[instrument(skip(self, request), fields(vrf = %request.vrf_id, cidr = %request.cidr, status = %request.status))]
    pub fn register_block(&self, request: &NewBlock, idempotency_key: Option<&str>) -> IpamResult<Block> {
        let cidr = Cidr::parse(&request.cidr)?;
        let description = validate::text("description", request.description.as_deref())?;

        let block = self.transact("register_block", |txn| {
            require_vrf(&*txn, request.vrf_id)?;

            let mut skip = Vec::new();
            if let Some(parent_id) = request.parent_id {
                let parent = require_block(&*txn, parent_id)?;
                validate::child_of(&parent, request.vrf_id, &cidr)?;
                let siblings = txn.blocks(&BlockFilter::children_of(parent_id))?;
                if let Some(sibling) = siblings.iter().find(|s| s.cidr.overlaps(&cidr)) {
                    return Err(Conflict::Overlap {
                        candidate: cidr,
                        existing: sibling.cidr,
                        existing_id: sibling.id,
                    }
                    .into());
                }
                skip = overlap::lineage(&*txn, &parent)?;
            }

            let existing = txn.blocks(&BlockFilter::in_vrf(request.vrf_id))?;
            overlap::ensure_no_conflict(&cidr, request.status, &existing, &skip)?;

            let block = Block {
                id: BlockId::random(),
                vrf_id: request.vrf_id,
                cidr,
                status: request.status,
                description: description.clone(),
                parent_id: request.parent_id,
                created_at: Utc::now(),
            };
            txn.insert_block(&block)?;
            Ok(block)
        })?;

        metrics::block_registered();
        info!(block = %block.id, cidr = %block.cidr, "registered block");
        Ok(block)
    }

    pub fn get_block(&self, id: BlockId) -> IpamResult<Block> {
        self.view(|view| require_block(view, id))
    }

    pub fn list_blocks(&self, query: &BlockQuery, page: Page) -> IpamResult<Paged<Block>> {
        let within = query.within.as_deref().map(Cidr::parse).transpose()?;
        let filter = BlockFilter {
            vrf: query.vrf,
            parent: query.parent,
            status: query.status,
            prefix_len: query.prefix_len,
        };
        let blocks = self.view(|view| Ok(view.blocks(&filter)?))?;
        let matching = blocks
            .into_iter()
            .filter(|b| within.is_none_or(|range| range.contains(&b.cidr)))
            .collect();
        page.apply(matching, self.config.max_page_limit)
    }

    /// Change a block's status or description.
    ///
    /// Moving a container to a claiming status re-checks it against every
    /// claiming block of the VRF outside its own lineage and subtree, so a
    /// container over carved children may be promoted.
    #[instrument(skip(self, update))]
    pub fn update_block(&self, id: BlockId, update: &BlockUpdate) -> IpamResult<Block> {
        let description = update
            .description
            .as_deref()
            .map(|d| validate::text("description", Some(d)))
            .transpose()?;

        self.transact("update_block", |txn| {
            let mut block = require_block(&*txn, id)?;
            if let Some(status) = update.status {
                if status.is_claiming() && !block.is_claiming() {
                    let mut skip = overlap::lineage(&*txn, &block)?;
                    skip.extend(overlap::descendants(&*txn, &block)?);
                    let existing = txn.blocks(&BlockFilter::in_vrf(block.vrf_id))?;
                    overlap::ensure_no_conflict(&block.cidr, status, &existing, &skip)?;
                }
                block.status = status;
            }
            if let Some(description) = &description {
                block.description.clone_from(description);
            }
            txn.update_block(&block)?;
            Ok(block)
        })
    }

    /// Delete a block with no children and no addresses. Deleting a missing
    /// block is a no-op.
    #[instrument(skip(self))]
    pub fn delete_block(&self, id: BlockId) -> IpamResult<()> {
        self.transact("delete_block", |txn| {
            if txn.block(id)?.is_none() {
                debug!("block already absent");
                return Ok(());
            }
            let dependents = if !txn.blocks(&BlockFilter::children_of(id))?.is_empty() {
                Some("child blocks")
            } else if !txn.addresses(&AddressFilter::in_block(id))?.is_empty() {
                Some("addresses")
            } else {
                None
            };
            if let Some(dependents) = dependents {
                return Err(Conflict::HasDependents {
                    kind: RecordKind::Block,
                    id: id.to_string(),
                    dependents,
                }
                .into());
            }
            txn.delete_block(id)?;
            Ok(())
        })
    }

    /// Carve `request.count` active children of `request.prefix_len` out of
    /// a parent.
    ///
    /// Returns fewer children than requested when the parent runs out of
    /// space, and [`Conflict::NoFreeBlocks`] when not even one fits. The
    /// children come back in ascending address order.
    #[instrument(
        skip(self, request),
        fields(prefix_len = request.prefix_len, count = request.count, strategy = %request.strategy)
    )]
    pub fn carve(
        &self,
        parent_id: BlockId,
        request: &CarveRequest,
        idempotency_key: Option<&str>,
    ) -> IpamResult<Vec<Block>> {
        validate::count("count", request.count, self.config.max_carve_count)?;

        let children = self.transact("carve", |txn| {
            let parent = require_block(&*txn, parent_id)?;
            validate::prefix_len(&parent.cidr, request.prefix_len)?;

            let occupied = overlap::occupied_under(&*txn, &parent)?;
            let picked = space::select(
                &parent.cidr,
                request.prefix_len,
                &occupied,
                request.count as usize,
                request.strategy,
            );
            if picked.is_empty() {
                return Err(Conflict::NoFreeBlocks {
                    parent: parent.cidr,
                    prefix_len: request.prefix_len,
                }
                .into());
            }

            let created_at = Utc::now();
            let mut children = Vec::with_capacity(picked.len());
            for cidr in picked {
                let child = Block {
                    id: BlockId::random(),
                    vrf_id: parent.vrf_id,
                    cidr,
                    status: BlockStatus::Active,
                    description: String::new(),
                    parent_id: Some(parent.id),
                    created_at,
                };
                txn.insert_block(&child)?;
                children.push(child);
            }
            Ok(children)
        })?;

        metrics::blocks_carved(children.len());
        info!(carved = children.len(), "carved child blocks");
        Ok(children)
    }

    /// The lowest sub-blocks of `prefix_len` under a parent that a carve
    /// could hand out right now, in ascending address order.
    ///
    /// At most `limit` blocks are returned, defaulting to
    /// [`AllocatorConfig::max_free_blocks`](crate::AllocatorConfig). Candidates
    /// are produced lazily, so the cost is bounded by the limit rather than by
    /// the size of the parent.
    pub fn free_space(
        &self,
        parent_id: BlockId,
        prefix_len: u8,
        limit: Option<u32>,
    ) -> IpamResult<Vec<Cidr>> {
        let max = self.config.max_free_blocks;
        let limit = limit.unwrap_or(max);
        validate::count("limit", limit, max)?;

        self.view(|view| {
            let parent = require_block(view, parent_id)?;
            validate::prefix_len(&parent.cidr, prefix_len)?;
            let occupied = overlap::occupied_under(view, &parent)?;
            Ok(space::free_blocks(&parent.cidr, prefix_len, &occupied)
                .take(limit as usize)
                .collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use subnetter_storage::MemoryStore;

    use super::*;
    use crate::{engine::NewVrf, error::IpamError};

    fn setup() -> (Ipam<MemoryStore>, VrfId) {
        let ipam = Ipam::new(MemoryStore::new());
        let tenant = ipam.create_tenant("t").unwrap();
        let vrf = ipam.create_vrf(&NewVrf::new(tenant.id, "v")).unwrap();
        (ipam, vrf.id)
    }

    fn cidrs(blocks: &[Block]) -> Vec<String> {
        blocks.iter().map(|b| b.cidr.to_string()).collect()
    }

    #[test]
    fn test_register_canonicalises_and_rejects_host_bits() {
        let (ipam, vrf) = setup();
        let block = ipam
            .register_block(&NewBlock::new(vrf, " 10.000.0.0/24 ", BlockStatus::Container), None)
            .unwrap();
        assert_eq!(block.cidr.to_string(), "10.0.0.0/24");

        assert_matches!(
            ipam.register_block(&NewBlock::new(vrf, "10.0.0.1/24", BlockStatus::Active), None),
            Err(IpamError::InvalidAddress(_))
        );
    }

    #[test]
    fn test_register_in_unknown_vrf() {
        let (ipam, _) = setup();
        assert_matches!(
            ipam.register_block(&NewBlock::new(VrfId::random(), "10.0.0.0/24", BlockStatus::Active), None),
            Err(IpamError::NotFound { kind: RecordKind::Vrf, .. })
        );
    }

    #[test]
    fn test_register_under_parent() {
        let (ipam, vrf) = setup();
        let parent = ipam
            .register_block(&NewBlock::new(vrf, "10.0.0.0/24", BlockStatus::Active), None)
            .unwrap();
        let child = ipam
            .register_block(
                &NewBlock::new(vrf, "10.0.0.0/26", BlockStatus::Active).under(parent.id),
                Some("req-1"),
            )
            .unwrap();
        assert_eq!(child.parent_id, Some(parent.id));

        assert_matches!(
            ipam.register_block(
                &NewBlock::new(vrf, "10.0.0.0/27", BlockStatus::Container).under(parent.id),
                None
            ),
            Err(IpamError::Conflict(Conflict::Overlap { existing_id, .. })) if existing_id == child.id
        );
        assert_matches!(
            ipam.register_block(
                &NewBlock::new(vrf, "10.0.1.0/26", BlockStatus::Active).under(parent.id),
                None
            ),
            Err(IpamError::Validation(_))
        );
        assert_matches!(
            ipam.register_block(
                &NewBlock::new(vrf, "10.0.0.64/26", BlockStatus::Active).under(BlockId::random()),
                None
            ),
            Err(IpamError::NotFound { kind: RecordKind::Block, .. })
        );
    }

    #[test]
    fn test_container_to_active_rechecks_overlap() {
        let (ipam, vrf) = setup();
        let container = ipam
            .register_block(&NewBlock::new(vrf, "10.0.0.0/16", BlockStatus::Container), None)
            .unwrap();
        ipam.register_block(&NewBlock::new(vrf, "10.0.5.0/24", BlockStatus::Reserved), None)
            .unwrap();

        let update = BlockUpdate {
            status: Some(BlockStatus::Active),
            description: None,
        };
        assert_matches!(
            ipam.update_block(container.id, &update),
            Err(IpamError::Conflict(Conflict::Overlap { .. }))
        );
        assert_eq!(ipam.get_block(container.id).unwrap().status, BlockStatus::Container);

        let described = ipam
            .update_block(
                container.id,
                &BlockUpdate {
                    description: Some("campus".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(described.description, "campus");
    }

    #[test]
    fn test_container_over_carved_children_can_be_promoted() {
        let (ipam, vrf) = setup();
        let container = ipam
            .register_block(&NewBlock::new(vrf, "10.0.0.0/24", BlockStatus::Container), None)
            .unwrap();
        let children = ipam
            .carve(container.id, &CarveRequest::first_fit(26, 2), None)
            .unwrap();
        ipam.carve(children[0].id, &CarveRequest::first_fit(28, 1), None)
            .unwrap();

        let update = BlockUpdate {
            status: Some(BlockStatus::Active),
            description: None,
        };
        let promoted = ipam.update_block(container.id, &update).unwrap();
        assert_eq!(promoted.status, BlockStatus::Active);

        // The promoted parent carves around its existing children.
        let more = ipam
            .carve(container.id, &CarveRequest::first_fit(26, 1), None)
            .unwrap();
        assert_eq!(cidrs(&more), ["10.0.0.128/26"]);
    }

    #[test]
    fn test_carve_rejects_bad_requests() {
        let (ipam, vrf) = setup();
        let parent = ipam
            .register_block(&NewBlock::new(vrf, "10.0.0.0/24", BlockStatus::Container), None)
            .unwrap();

        assert_matches!(
            ipam.carve(parent.id, &CarveRequest::first_fit(23, 1), None),
            Err(IpamError::Validation(_))
        );
        assert_matches!(
            ipam.carve(parent.id, &CarveRequest::first_fit(33, 1), None),
            Err(IpamError::Validation(_))
        );
        assert_matches!(
            ipam.carve(parent.id, &CarveRequest::first_fit(26, 0), None),
            Err(IpamError::Validation(_))
        );
        assert_matches!(
            ipam.carve(parent.id, &CarveRequest::first_fit(26, 4097), None),
            Err(IpamError::Validation(_))
        );
        assert_matches!(
            ipam.carve(BlockId::random(), &CarveRequest::first_fit(26, 1), None),
            Err(IpamError::NotFound { .. })
        );
    }

    #[test]
    fn test_carve_partial_then_exhausted() {
        let (ipam, vrf) = setup();
        let parent = ipam
            .register_block(&NewBlock::new(vrf, "10.0.0.0/24", BlockStatus::Container), None)
            .unwrap();

        let children = ipam
            .carve(parent.id, &CarveRequest::first_fit(25, 3), None)
            .unwrap();
        assert_eq!(cidrs(&children), ["10.0.0.0/25", "10.0.0.128/25"]);
        assert!(children.iter().all(|c| c.status == BlockStatus::Active));

        assert_matches!(
            ipam.carve(parent.id, &CarveRequest::first_fit(25, 1), None),
            Err(IpamError::Conflict(Conflict::NoFreeBlocks { prefix_len: 25, .. }))
        );
        assert!(ipam.free_space(parent.id, 26, None).unwrap().is_empty());
    }

    #[test]
    fn test_free_space_is_bounded_on_large_parents() {
        let (ipam, vrf) = setup();
        let parent = ipam
            .register_block(&NewBlock::new(vrf, "2001:db8::/64", BlockStatus::Container), None)
            .unwrap();
        ipam.carve(parent.id, &CarveRequest::first_fit(128, 2), None)
            .unwrap();

        let free = ipam.free_space(parent.id, 128, Some(3)).unwrap();
        assert_eq!(
            free.iter().map(ToString::to_string).collect::<Vec<_>>(),
            ["2001:db8::2/128", "2001:db8::3/128", "2001:db8::4/128"]
        );

        let free = ipam.free_space(parent.id, 128, None).unwrap();
        assert_eq!(free.len(), 4096);
        assert_eq!(free.last().unwrap().to_string(), "2001:db8::1001/128");

        assert_matches!(
            ipam.free_space(parent.id, 128, Some(0)),
            Err(IpamError::Validation(_))
        );
        assert_matches!(
            ipam.free_space(parent.id, 128, Some(4097)),
            Err(IpamError::Validation(_))
        );
    }

    #[test]
    fn test_carve_avoids_claimed_blocks_outside_children() {
        let (ipam, vrf) = setup();
        let parent = ipam
            .register_block(&NewBlock::new(vrf, "10.0.0.0/24", BlockStatus::Container), None)
            .unwrap();
        // Claimed in the same VRF but not registered as a child.
        ipam.register_block(&NewBlock::new(vrf, "10.0.0.0/25", BlockStatus::Reserved), None)
            .unwrap();

        let children = ipam
            .carve(parent.id, &CarveRequest::first_fit(26, 1), None)
            .unwrap();
        assert_eq!(cidrs(&children), ["10.0.0.128/26"]);
    }

    #[test]
    fn test_delete_block_rules() {
        let (ipam, vrf) = setup();
        let parent = ipam
            .register_block(&NewBlock::new(vrf, "10.0.0.0/24", BlockStatus::Container), None)
            .unwrap();
        let children = ipam
            .carve(parent.id, &CarveRequest::first_fit(25, 1), None)
            .unwrap();

        assert_matches!(
            ipam.delete_block(parent.id),
            Err(IpamError::Conflict(Conflict::HasDependents { dependents: "child blocks", .. }))
        );
        for child in &children {
            ipam.delete_block(child.id).unwrap();
        }
        ipam.delete_block(parent.id).unwrap();
        ipam.delete_block(parent.id).unwrap();
        assert_matches!(ipam.get_block(parent.id), Err(IpamError::NotFound { .. }));
    }

    #[test]
    fn test_list_blocks_filters() {
        let (ipam, vrf) = setup();
        let parent = ipam
            .register_block(&NewBlock::new(vrf, "10.0.0.0/16", BlockStatus::Container), None)
            .unwrap();
        ipam.carve(parent.id, &CarveRequest::first_fit(24, 4), None)
            .unwrap();
        ipam.register_block(&NewBlock::new(vrf, "192.168.0.0/24", BlockStatus::Reserved), None)
            .unwrap();

        let within = ipam
            .list_blocks(
                &BlockQuery {
                    within: Some("10.0.0.0/23".into()),
                    ..Default::default()
                },
                Page::default(),
            )
            .unwrap();
        assert_eq!(within.total, 2);

        let children = ipam
            .list_blocks(
                &BlockQuery {
                    parent: Some(parent.id),
                    ..Default::default()
                },
                Page::new(3, 0),
            )
            .unwrap();
        assert_eq!(children.total, 4);
        assert_eq!(children.items.len(), 3);

        let reserved = ipam
            .list_blocks(
                &BlockQuery {
                    status: Some(BlockStatus::Reserved),
                    ..Default::default()
                },
                Page::default(),
            )
            .unwrap();
        assert_eq!(cidrs(&reserved.items), ["192.168.0.0/24"]);

        // Newest first.
        let all = ipam
            .list_blocks(&BlockQuery::default(), Page::new(1, 0))
            .unwrap();
        assert_eq!(cidrs(&all.items), ["192.168.0.0/24"]);
    }
}
