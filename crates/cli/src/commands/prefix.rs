//! `prefix` commands.

use eyre::Result;
use subnetter_allocator::{BlockQuery, BlockUpdate, CarveRequest, NewBlock};
use subnetter_storage::HierarchyStore;

use super::Context;
use crate::cli::PrefixCommand;

pub(super) fn run<S: HierarchyStore>(ctx: &Context<'_, S>, command: PrefixCommand) -> Result<()> {
    match command {
        PrefixCommand::Create {
            vrf,
            cidr,
            status,
            description,
            parent,
        } => {
            let request = NewBlock {
                vrf_id: vrf,
                cidr,
                status,
                description,
                parent_id: parent,
            };
            ctx.out.one(&ctx.ipam.register_block(&request, ctx.idempotency_key)?)
        }
        PrefixCommand::Get { id } => ctx.out.one(&ctx.ipam.get_block(id)?),
        PrefixCommand::List {
            vrf,
            parent,
            status,
            mask,
            within,
            page,
        } => {
            let query = BlockQuery {
                vrf,
                parent,
                status,
                prefix_len: mask,
                within,
            };
            ctx.out.page(&ctx.ipam.list_blocks(&query, page.into())?)
        }
        PrefixCommand::Update {
            id,
            status,
            description,
        } => {
            let update = BlockUpdate {
                status,
                description,
            };
            ctx.out.one(&ctx.ipam.update_block(id, &update)?)
        }
        PrefixCommand::Delete { id } => {
            ctx.ipam.delete_block(id)?;
            ctx.out.message(&format!("Deleted prefix {id}"))
        }
        PrefixCommand::Carve {
            id,
            mask,
            count,
            strategy,
        } => {
            let allocator = &ctx.config.allocator;
            let request = CarveRequest {
                prefix_len: mask.unwrap_or_else(|| allocator.carve_mask()),
                count: count.unwrap_or_else(|| allocator.carve_count()),
                strategy,
            };
            let children = ctx.ipam.carve(id, &request, ctx.idempotency_key)?;
            if !ctx.out.is_json() {
                println!("Carved {} children under {id}:", children.len());
            }
            ctx.out.many(&children)
        }
        PrefixCommand::Free { id, mask, limit } => {
            let free = ctx.ipam.free_space(id, mask, limit)?;
            ctx.out.many(&free)
        }
    }
}
