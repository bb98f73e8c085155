//! `seed` command: a small demo hierarchy.

use eyre::{Result, WrapErr};
use serde::Serialize;
use subnetter_allocator::{CarveRequest, NewBlock, NewVrf};
use subnetter_primitives::{Address, Block, Tenant, Vrf};
use subnetter_storage::HierarchyStore;
use tracing::info;

use super::Context;
use crate::{cli::SeedArgs, output::Line};

/// Everything `seed` created.
#[derive(Debug, Serialize)]
pub(crate) struct Seeded {
    pub(crate) tenant: Tenant,
    pub(crate) vrf: Vrf,
    pub(crate) prefix: Block,
    pub(crate) children: Vec<Block>,
    pub(crate) address: Address,
}

impl Line for Seeded {
    fn line(&self) -> String {
        let mut lines = vec![self.tenant.line(), self.vrf.line(), self.prefix.line()];
        lines.push(format!("Carved {} children", self.children.len()));
        lines.extend(self.children.iter().map(|c| format!("  - {}", c.line())));
        lines.push(format!(
            "Allocated IP {} in prefix={}",
            self.address.address, self.address.block_id
        ));
        lines.join("\n")
    }
}

pub(super) fn run<S: HierarchyStore>(ctx: &Context<'_, S>, args: SeedArgs) -> Result<()> {
    let seeded = seed(ctx, &args)?;
    info!(tenant = %seeded.tenant.id, prefix = %seeded.prefix.cidr, "seeded demo hierarchy");
    ctx.out.one(&seeded)
}

pub(crate) fn seed<S: HierarchyStore>(ctx: &Context<'_, S>, args: &SeedArgs) -> Result<Seeded> {
    let ipam = ctx.ipam;

    let tenant = ipam.create_tenant(&args.tenant).wrap_err("create tenant")?;

    let mut request = NewVrf::new(tenant.id, &args.vrf);
    if !args.rd.is_empty() {
        request = request.with_rd(&args.rd);
    }
    let vrf = ipam.create_vrf(&request).wrap_err("create vrf")?;

    let prefix = ipam
        .register_block(
            &NewBlock::new(vrf.id, &args.cidr, args.status).with_description("seed root"),
            ctx.idempotency_key,
        )
        .wrap_err("create prefix")?;

    let mask = args.mask.unwrap_or_else(|| ctx.config.allocator.carve_mask());
    let children = ipam
        .carve(prefix.id, &CarveRequest::first_fit(mask, args.count), ctx.idempotency_key)
        .wrap_err("carve children")?;

    let target = children.first().map_or(prefix.id, |child| child.id);
    let address = ipam
        .next_address(target, ctx.idempotency_key)
        .wrap_err("next ip")?;

    Ok(Seeded {
        tenant,
        vrf,
        prefix,
        children,
        address,
    })
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use subnetter_allocator::Ipam;
    use subnetter_storage::MemoryStore;

    use super::*;
    use crate::{
        cli::{Cli, Commands},
        config::SubnetterConfig,
        output::Output,
    };

    fn seed_args(argv: &[&str]) -> SeedArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Seed(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_seed_defaults() {
        let ipam = Ipam::new(MemoryStore::new());
        let config = SubnetterConfig::default();
        let ctx = Context {
            ipam: &ipam,
            config: &config,
            out: Output::new(false),
            idempotency_key: None,
        };

        let seeded = seed(&ctx, &seed_args(&["subnetter", "seed"])).unwrap();
        assert_eq!(seeded.tenant.name, "DemoTenant");
        assert_eq!(seeded.vrf.rd.as_deref(), Some("65000:1"));
        assert_eq!(seeded.prefix.cidr.to_string(), "10.0.0.0/24");
        let children: Vec<String> = seeded.children.iter().map(|c| c.cidr.to_string()).collect();
        assert_eq!(children, ["10.0.0.0/28", "10.0.0.16/28"]);
        assert_eq!(seeded.address.address.to_string(), "10.0.0.1");
        assert_eq!(seeded.address.block_id, seeded.children[0].id);
    }

    #[test]
    fn test_seed_is_repeatable() {
        let ipam = Ipam::new(MemoryStore::new());
        let config = SubnetterConfig::default();
        let ctx = Context {
            ipam: &ipam,
            config: &config,
            out: Output::new(true),
            idempotency_key: Some("seed"),
        };
        let args = seed_args(&["subnetter", "seed", "--rd", "", "--mask", "26", "--count", "1"]);
        let first = seed(&ctx, &args).unwrap();
        assert_eq!(first.vrf.rd, None);
        assert_eq!(first.children.len(), 1);

        // A second run creates a fresh tenant and VRF, so the prefix does
        // not collide.
        assert!(seed(&ctx, &args).is_ok());
    }
}
