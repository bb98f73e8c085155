//! Tenants and VRFs.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use subnetter_primitives::{RecordKind, Tenant, TenantId, Vrf, VrfId};
use subnetter_storage::{AddressFilter, BlockFilter, HierarchyStore, VrfFilter};
use tracing::{debug, info, instrument};

use super::{Ipam, require_tenant, require_vrf};
use crate::{
    error::{Conflict, IpamError, IpamResult},
    page::{Page, Paged},
    validate::{self, MAX_NAME_LEN},
};

/// Tenant listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantQuery {
    /// Case-insensitive substring of the name.
    pub name_contains: Option<String>,
}

/// Request to create a VRF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVrf {
    pub tenant_id: TenantId,
    pub name: String,
    #[serde(default)]
    pub rd: Option<String>,
}

impl NewVrf {
    pub fn new(tenant_id: TenantId, name: impl Into<String>) -> Self {
        Self {
            tenant_id,
            name: name.into(),
            rd: None,
        }
    }

    pub fn with_rd(mut self, rd: impl Into<String>) -> Self {
        self.rd = Some(rd.into());
        self
    }
}

/// Fields of a VRF that may change. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VrfUpdate {
    pub name: Option<String>,
    pub rd: Option<String>,
}

/// VRF listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VrfQuery {
    pub tenant: Option<TenantId>,
    /// Case-insensitive substring of the name.
    pub name_contains: Option<String>,
}

fn name_matches(name: &str, needle: Option<&str>) -> bool {
    needle.is_none_or(|needle| name.to_lowercase().contains(&needle.to_lowercase()))
}

impl<S: HierarchyStore> Ipam<S> {
    #[instrument(skip(self))]
    pub fn create_tenant(&self, name: &str) -> IpamResult<Tenant> {
        let name = validate::name("name", name)?;
        let tenant = self.transact("create_tenant", |txn| {
            let tenant = Tenant {
                id: TenantId::random(),
                name: name.clone(),
                created_at: Utc::now(),
            };
            txn.insert_tenant(&tenant)?;
            Ok(tenant)
        })?;
        info!(tenant = %tenant.id, name = %tenant.name, "created tenant");
        Ok(tenant)
    }

    pub fn get_tenant(&self, id: TenantId) -> IpamResult<Tenant> {
        self.view(|view| require_tenant(view, id))
    }

    pub fn list_tenants(&self, query: &TenantQuery, page: Page) -> IpamResult<Paged<Tenant>> {
        let tenants = self.view(|view| Ok(view.tenants()?))?;
        let matching = tenants
            .into_iter()
            .filter(|t| name_matches(&t.name, query.name_contains.as_deref()))
            .collect();
        page.apply(matching, self.config.max_page_limit)
    }

    #[instrument(skip(self))]
    pub fn update_tenant(&self, id: TenantId, name: Option<&str>) -> IpamResult<Tenant> {
        let name = name.map(|n| validate::name("name", n)).transpose()?;
        self.transact("update_tenant", |txn| {
            let mut tenant = require_tenant(&*txn, id)?;
            if let Some(name) = &name {
                tenant.name.clone_from(name);
            }
            txn.update_tenant(&tenant)?;
            Ok(tenant)
        })
    }

    /// Delete a tenant that owns no VRFs. Deleting a missing tenant is a
    /// no-op.
    #[instrument(skip(self))]
    pub fn delete_tenant(&self, id: TenantId) -> IpamResult<()> {
        self.transact("delete_tenant", |txn| {
            if txn.tenant(id)?.is_none() {
                debug!("tenant already absent");
                return Ok(());
            }
            if !txn.vrfs(&VrfFilter::of_tenant(id))?.is_empty() {
                return Err(Conflict::HasDependents {
                    kind: RecordKind::Tenant,
                    id: id.to_string(),
                    dependents: "vrfs",
                }
                .into());
            }
            txn.delete_tenant(id)?;
            Ok(())
        })
    }

    #[instrument(skip(self, request), fields(tenant = %request.tenant_id, name = %request.name))]
    pub fn create_vrf(&self, request: &NewVrf) -> IpamResult<Vrf> {
        let name = validate::name("name", &request.name)?;
        let rd = request
            .rd
            .as_deref()
            .map(|rd| validate::bounded("rd", rd, MAX_NAME_LEN))
            .transpose()?;

        let vrf = self.transact("create_vrf", |txn| {
            if txn.tenant(request.tenant_id)?.is_none() {
                return Err(IpamError::validation(format!(
                    "tenant {} does not exist",
                    request.tenant_id
                )));
            }
            let vrf = Vrf {
                id: VrfId::random(),
                tenant_id: request.tenant_id,
                name: name.clone(),
                rd: rd.clone(),
                created_at: Utc::now(),
            };
            txn.insert_vrf(&vrf)?;
            Ok(vrf)
        })?;
        info!(vrf = %vrf.id, "created vrf");
        Ok(vrf)
    }

    pub fn get_vrf(&self, id: VrfId) -> IpamResult<Vrf> {
        self.view(|view| require_vrf(view, id))
    }

    pub fn list_vrfs(&self, query: &VrfQuery, page: Page) -> IpamResult<Paged<Vrf>> {
        let filter = VrfFilter {
            tenant: query.tenant,
        };
        let vrfs = self.view(|view| Ok(view.vrfs(&filter)?))?;
        let matching = vrfs
            .into_iter()
            .filter(|v| name_matches(&v.name, query.name_contains.as_deref()))
            .collect();
        page.apply(matching, self.config.max_page_limit)
    }

    #[instrument(skip(self, update))]
    pub fn update_vrf(&self, id: VrfId, update: &VrfUpdate) -> IpamResult<Vrf> {
        let name = update
            .name
            .as_deref()
            .map(|n| validate::name("name", n))
            .transpose()?;
        let rd = update
            .rd
            .as_deref()
            .map(|rd| validate::bounded("rd", rd, MAX_NAME_LEN))
            .transpose()?;

        self.transact("update_vrf", |txn| {
            let mut vrf = require_vrf(&*txn, id)?;
            if let Some(name) = &name {
                vrf.name.clone_from(name);
            }
            if let Some(rd) = &rd {
                vrf.rd = Some(rd.clone());
            }
            txn.update_vrf(&vrf)?;
            Ok(vrf)
        })
    }

    /// Delete a VRF that holds no blocks or addresses. Deleting a missing
    /// VRF is a no-op.
    #[instrument(skip(self))]
    pub fn delete_vrf(&self, id: VrfId) -> IpamResult<()> {
        self.transact("delete_vrf", |txn| {
            if txn.vrf(id)?.is_none() {
                debug!("vrf already absent");
                return Ok(());
            }
            let dependents = if !txn.blocks(&BlockFilter::in_vrf(id))?.is_empty() {
                Some("blocks")
            } else if !txn.addresses(&AddressFilter::in_vrf(id))?.is_empty() {
                Some("addresses")
            } else {
                None
            };
            if let Some(dependents) = dependents {
                return Err(Conflict::HasDependents {
                    kind: RecordKind::Vrf,
                    id: id.to_string(),
                    dependents,
                }
                .into());
            }
            txn.delete_vrf(id)?;
            Ok(())
        })
    }
}
