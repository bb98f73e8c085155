//! Human and JSON rendering of command results.

use eyre::{Result, WrapErr};
use serde::Serialize;
use subnetter_allocator::Paged;
use subnetter_primitives::{Address, Block, Cidr, Tenant, Vrf};

/// One-line human summary of a record.
pub(crate) trait Line {
    fn line(&self) -> String;
}

impl Line for Tenant {
    fn line(&self) -> String {
        format!("Tenant: {}  id={}", self.name, self.id)
    }
}

impl Line for Vrf {
    fn line(&self) -> String {
        format!(
            "VRF: {}  id={}  tenant={}  rd={}",
            self.name,
            self.id,
            self.tenant_id,
            self.rd.as_deref().unwrap_or("-")
        )
    }
}

impl Line for Block {
    fn line(&self) -> String {
        let mut line = format!("Prefix: {}  id={}  status={}", self.cidr, self.id, self.status);
        if let Some(parent) = self.parent_id {
            line.push_str(&format!("  parent={parent}"));
        }
        if !self.description.is_empty() {
            line.push_str(&format!("  description={:?}", self.description));
        }
        line
    }
}

impl Line for Address {
    fn line(&self) -> String {
        let mut line = format!(
            "IP: {}  id={}  status={}  prefix={}",
            self.address, self.id, self.status, self.block_id
        );
        if !self.note.is_empty() {
            line.push_str(&format!("  note={:?}", self.note));
        }
        line
    }
}

impl Line for Cidr {
    fn line(&self) -> String {
        self.to_string()
    }
}

/// Where command results go.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Output {
    json: bool,
}

impl Output {
    pub(crate) fn new(json: bool) -> Self {
        Self { json }
    }

    pub(crate) fn is_json(&self) -> bool {
        self.json
    }

    pub(crate) fn one<T: Serialize + Line>(&self, item: &T) -> Result<()> {
        if self.json {
            return self.emit_json(item);
        }
        println!("{}", item.line());
        Ok(())
    }

    pub(crate) fn many<T: Serialize + Line>(&self, items: &[T]) -> Result<()> {
        if self.json {
            return self.emit_json(&items);
        }
        for item in items {
            println!("{}", item.line());
        }
        Ok(())
    }

    pub(crate) fn page<T: Serialize + Line>(&self, page: &Paged<T>) -> Result<()> {
        if self.json {
            return self.emit_json(page);
        }
        for item in &page.items {
            println!("{}", item.line());
        }
        println!(
            "({} of {} shown, offset {})",
            page.items.len(),
            page.total,
            page.offset
        );
        Ok(())
    }

    /// A plain status message; JSON mode prints `{"message": ...}`.
    pub(crate) fn message(&self, message: &str) -> Result<()> {
        if self.json {
            return self.emit_json(&serde_json::json!({ "message": message }));
        }
        println!("{message}");
        Ok(())
    }

    fn emit_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let text = serde_json::to_string_pretty(value).wrap_err("Failed to encode JSON output")?;
        println!("{text}");
        Ok(())
    }
}
