//! `tenant` and `vrf` commands.

use eyre::Result;
use subnetter_allocator::{NewVrf, TenantQuery, VrfQuery, VrfUpdate};
use subnetter_storage::HierarchyStore;

use super::Context;
use crate::cli::{TenantCommand, VrfCommand};

pub(super) fn tenant<S: HierarchyStore>(ctx: &Context<'_, S>, command: TenantCommand) -> Result<()> {
    match command {
        TenantCommand::Create { name } => ctx.out.one(&ctx.ipam.create_tenant(&name)?),
        TenantCommand::Get { id } => ctx.out.one(&ctx.ipam.get_tenant(id)?),
        TenantCommand::List {
            name_contains,
            page,
        } => {
            let query = TenantQuery { name_contains };
            ctx.out.page(&ctx.ipam.list_tenants(&query, page.into())?)
        }
        TenantCommand::Update { id, name } => {
            ctx.out.one(&ctx.ipam.update_tenant(id, name.as_deref())?)
        }
        TenantCommand::Delete { id } => {
            ctx.ipam.delete_tenant(id)?;
            ctx.out.message(&format!("Deleted tenant {id}"))
        }
    }
}

pub(super) fn vrf<S: HierarchyStore>(ctx: &Context<'_, S>, command: VrfCommand) -> Result<()> {
    match command {
        VrfCommand::Create { tenant, name, rd } => {
            let request = NewVrf {
                tenant_id: tenant,
                name,
                rd,
            };
            ctx.out.one(&ctx.ipam.create_vrf(&request)?)
        }
        VrfCommand::Get { id } => ctx.out.one(&ctx.ipam.get_vrf(id)?),
        VrfCommand::List {
            tenant,
            name_contains,
            page,
        } => {
            let query = VrfQuery {
                tenant,
                name_contains,
            };
            ctx.out.page(&ctx.ipam.list_vrfs(&query, page.into())?)
        }
        VrfCommand::Update { id, name, rd } => {
            ctx.out.one(&ctx.ipam.update_vrf(id, &VrfUpdate { name, rd })?)
        }
        VrfCommand::Delete { id } => {
            ctx.ipam.delete_vrf(id)?;
            ctx.out.message(&format!("Deleted vrf {id}"))
        }
    }
}
