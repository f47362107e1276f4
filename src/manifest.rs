//! Desired-state manifest.
//!
//! ```toml
//! [dns_record.www]
//! name = "www"
//! zone_name = "example.com"
//! type = "CNAME"
//! values = ["target.example.com"]
//!
//! [nameservers]
//! ns_records = ["ns-1.example.net", "ns-2.example.net"]
//! ```
//!
//! Kinds with an identifier hold named instances; singleton kinds are a
//! single table. Strings become scalar values and string arrays become sets.

use anyhow::{Context, Result, anyhow, bail};
use reconcile::{AttributeRecord, ResourceKind, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Addresses
// ============================================================================

/// Address of one instance: `kind` for singletons, `kind.name` otherwise
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    pub kind: ResourceKind,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("{0}")]
    UnknownKind(String),

    #[error("{0} instances are addressed as {0}.<name>")]
    MissingName(ResourceKind),

    #[error("{0} is a singleton and is addressed as just '{0}'")]
    UnexpectedName(ResourceKind),

    #[error("invalid instance name '{0}'")]
    InvalidName(String),
}

impl Address {
    pub fn new(kind: ResourceKind, name: Option<&str>) -> Result<Self, AddressError> {
        match (kind.policy().is_singleton(), name) {
            (true, None) => Ok(Self { kind, name: None }),
            (true, Some(_)) => Err(AddressError::UnexpectedName(kind)),
            (false, None) => Err(AddressError::MissingName(kind)),
            (false, Some(name)) => {
                if name.is_empty() || name.contains('.') || name.contains(char::is_whitespace) {
                    return Err(AddressError::InvalidName(name.to_string()));
                }
                Ok(Self {
                    kind,
                    name: Some(name.to_string()),
                })
            }
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}.{name}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, name) = match s.split_once('.') {
            Some((kind, name)) => (kind, Some(name)),
            None => (s, None),
        };
        let kind = ResourceKind::from_str(kind).map_err(AddressError::UnknownKind)?;
        Self::new(kind, name)
    }
}

// ============================================================================
// Manifest
// ============================================================================

/// One declared instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredResource {
    pub address: Address,
    pub record: AttributeRecord,
}

/// Every declared instance, keyed by address
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    resources: BTreeMap<String, DesiredResource>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read manifest {}", path.display()))?;
        let manifest = Self::parse(&content)
            .with_context(|| format!("Invalid manifest {}", path.display()))?;
        log::debug!(
            "Loaded {} resources from {}",
            manifest.len(),
            path.display()
        );
        Ok(manifest)
    }

    /// Load the manifest if it exists; used by commands that only consult it
    pub fn load_optional(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(content)?;
        let mut manifest = Self::default();

        for (kind_name, value) in table {
            let kind = ResourceKind::from_str(&kind_name).map_err(|e| anyhow!(e))?;
            if kind.policy().read_only {
                bail!("{kind} is read-only and cannot be declared");
            }
            let toml::Value::Table(body) = value else {
                bail!("[{kind_name}] must be a table");
            };

            if kind.policy().is_singleton() {
                manifest.add(Address::new(kind, None)?, &body)?;
            } else {
                for (name, instance) in body {
                    let address = Address::new(kind, Some(&name))?;
                    let toml::Value::Table(fields) = instance else {
                        bail!("[{address}] must be a table");
                    };
                    manifest.add(address, &fields)?;
                }
            }
        }

        Ok(manifest)
    }

    fn add(&mut self, address: Address, fields: &toml::Table) -> Result<()> {
        let record = record_from_table(&address, fields)?;
        self.resources
            .insert(address.to_string(), DesiredResource { address, record });
        Ok(())
    }

    pub fn get(&self, address: &str) -> Option<&DesiredResource> {
        self.resources.get(address)
    }

    pub fn contains(&self, address: &str) -> bool {
        self.resources.contains_key(address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DesiredResource> {
        self.resources.values()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

fn record_from_table(address: &Address, fields: &toml::Table) -> Result<AttributeRecord> {
    let policy = address.kind.policy();
    let mut record = AttributeRecord::new();

    for (field, value) in fields {
        if Some(field.as_str()) == policy.identifier_field {
            bail!("[{address}] '{field}' is assigned by the service; use `deploymeta import` to adopt an existing resource");
        }
        let value = match value {
            toml::Value::String(s) => Value::String(s.clone()),
            toml::Value::Array(items) => Value::Set(
                items
                    .iter()
                    .map(|item| {
                        item.as_str().map(str::to_string).ok_or_else(|| {
                            anyhow!("[{address}] '{field}' must only contain strings")
                        })
                    })
                    .collect::<Result<_>>()?,
            ),
            other => bail!(
                "[{address}] '{field}' must be a string or an array of strings, found {}",
                other.type_str()
            ),
        };
        record.insert(field.clone(), value);
    }

    policy
        .validate_desired(&record)
        .map_err(|e| anyhow!("[{address}] {e}"))?;
    Ok(record)
}
