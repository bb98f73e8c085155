//! `ip` commands.

use eyre::Result;
use subnetter_allocator::{AddressQuery, AddressUpdate, NewAddress};
use subnetter_storage::HierarchyStore;

use super::Context;
use crate::cli::IpCommand;

pub(super) fn run<S: HierarchyStore>(ctx: &Context<'_, S>, command: IpCommand) -> Result<()> {
    match command {
        IpCommand::Next { prefix } => {
            ctx.out.one(&ctx.ipam.next_address(prefix, ctx.idempotency_key)?)
        }
        IpCommand::Create {
            vrf,
            prefix,
            address,
            status,
            note,
        } => {
            let request = NewAddress {
                vrf_id: vrf,
                block_id: prefix,
                address,
                status,
                note,
            };
            ctx.out.one(&ctx.ipam.register_address(&request)?)
        }
        IpCommand::Get { id } => ctx.out.one(&ctx.ipam.get_address(id)?),
        IpCommand::List {
            vrf,
            prefix,
            status,
            address,
            page,
        } => {
            let query = AddressQuery {
                vrf,
                block: prefix,
                status,
                address: address.map(|a| a.to_string()),
            };
            ctx.out.page(&ctx.ipam.list_addresses(&query, page.into())?)
        }
        IpCommand::Update { id, status, note } => {
            ctx.out.one(&ctx.ipam.update_address(id, &AddressUpdate { status, note })?)
        }
        IpCommand::Delete { id } => {
            ctx.ipam.delete_address(id)?;
            ctx.out.message(&format!("Released address {id}"))
        }
    }
}
