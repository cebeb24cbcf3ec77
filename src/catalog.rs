use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DiotError, Result};
use crate::vendor::normalize_name;

pub const DEFAULT_THIRD_PARTY_TYPE: &str = "04";
pub const DEFAULT_OPERATION_TYPE: &str = "85";

pub const THIRD_PARTY_TYPES: &[(&str, &str)] = &[
    ("04", "Proveedor nacional"),
    ("05", "Proveedor extranjero"),
    ("15", "Globales"),
];

pub const OPERATION_TYPES: &[(&str, &str)] = &[
    ("85", "Otros"),
    ("03", "Prestacion de servicios"),
    ("06", "Uso o goce temporal de bienes"),
];

/// Display label for a classification code. Unlisted codes are still valid.
pub fn code_label(codes: &[(&str, &'static str)], code: &str) -> Option<&'static str> {
    codes.iter().find(|(c, _)| *c == code).map(|(_, label)| *label)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub rfc: String,
    #[serde(rename = "nombre_legal")]
    pub legal_name: String,
    /// Normalized name variants seen in source data.
    pub aliases: BTreeSet<String>,
    #[serde(rename = "tipoTercero")]
    pub third_party_type: String,
    #[serde(rename = "tipoOperacion")]
    pub operation_type: String,
}

// On-disk shape, tolerant of missing and null fields.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoredEntry {
    rfc: Option<String>,
    nombre_legal: Option<String>,
    aliases: Option<Vec<Option<String>>>,
    #[serde(rename = "tipoTercero")]
    tipo_tercero: Option<String>,
    #[serde(rename = "tipoOperacion")]
    tipo_operacion: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl From<StoredEntry> for CatalogEntry {
    fn from(stored: StoredEntry) -> Self {
        let aliases = stored
            .aliases
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .map(|a| normalize_name(&a))
            .filter(|a| !a.is_empty())
            .collect();
        Self {
            rfc: stored.rfc.unwrap_or_default().trim().to_uppercase(),
            legal_name: stored.nombre_legal.unwrap_or_default(),
            aliases,
            third_party_type: non_blank(stored.tipo_tercero.as_deref())
                .unwrap_or(DEFAULT_THIRD_PARTY_TYPE)
                .to_string(),
            operation_type: non_blank(stored.tipo_operacion.as_deref())
                .unwrap_or(DEFAULT_OPERATION_TYPE)
                .to_string(),
        }
    }
}

/// Fields for [`Catalog::upsert`]. `None` and blank values leave the entry as is.
#[derive(Debug, Clone, Default)]
pub struct CatalogUpdate<'a> {
    pub rfc: &'a str,
    pub legal_name: Option<&'a str>,
    pub alias: Option<&'a str>,
    pub third_party_type: Option<&'a str>,
    pub operation_type: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Updated,
}

/// Vendor identities keyed by RFC, with a second index over normalized aliases.
/// Both indexes point into `entries` and are maintained by every mutation.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    by_rfc: HashMap<String, usize>,
    by_alias: HashMap<String, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a catalog file. A missing, empty or unreadable file is an empty
    /// catalog, never an error.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                if path.exists() {
                    tracing::warn!("could not read catalog {}: {e}", path.display());
                }
                return Self::new();
            }
        };
        if content.trim().is_empty() {
            return Self::new();
        }
        Self::from_json(&content).unwrap_or_else(|e| {
            tracing::warn!("ignoring malformed catalog {}: {e}", path.display());
            Self::new()
        })
    }

    /// Read a catalog file that is about to be rewritten. A missing or blank
    /// file is an empty catalog; anything unreadable or malformed is an error,
    /// so saving never replaces entries that failed to parse.
    pub fn load_for_update(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::new());
        }
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let stored: Vec<StoredEntry> = serde_json::from_str(json)?;
        Ok(Self::from_entries(stored.into_iter().map(CatalogEntry::from)))
    }

    /// Build from entries, merging repeated RFCs into the first occurrence and
    /// dropping entries without an RFC.
    pub fn from_entries<I: IntoIterator<Item = CatalogEntry>>(entries: I) -> Self {
        let mut catalog = Self::new();
        for entry in entries {
            if entry.rfc.is_empty() {
                tracing::warn!(name = %entry.legal_name, "dropping catalog entry without RFC");
                continue;
            }
            match catalog.by_rfc.get(&entry.rfc).copied() {
                Some(idx) => {
                    tracing::warn!(rfc = %entry.rfc, "merging duplicate catalog entry");
                    if catalog.entries[idx].legal_name.trim().is_empty() {
                        catalog.entries[idx].legal_name = entry.legal_name;
                    }
                    for alias in entry.aliases {
                        catalog.add_alias(idx, alias);
                    }
                }
                None => catalog.push(entry),
            }
        }
        catalog
    }

    fn push(&mut self, entry: CatalogEntry) {
        let idx = self.entries.len();
        self.by_rfc.insert(entry.rfc.clone(), idx);
        for alias in &entry.aliases {
            self.by_alias.entry(alias.clone()).or_insert(idx);
        }
        self.entries.push(entry);
    }

    fn add_alias(&mut self, idx: usize, alias: String) {
        if alias.is_empty() {
            return;
        }
        self.by_alias.entry(alias.clone()).or_insert(idx);
        self.entries[idx].aliases.insert(alias);
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, format!("{}\n", self.to_json()?))?;
        Ok(())
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up by RFC first (case-insensitive), then by normalized name alias.
    pub fn find(&self, name: &str, rfc: &str) -> Option<&CatalogEntry> {
        let rfc = rfc.trim().to_uppercase();
        if !rfc.is_empty() {
            if let Some(&idx) = self.by_rfc.get(&rfc) {
                return Some(&self.entries[idx]);
            }
        }
        let alias = normalize_name(name);
        if alias.is_empty() {
            return None;
        }
        self.by_alias.get(&alias).map(|&idx| &self.entries[idx])
    }

    /// Create or enrich the entry for `update.rfc`. Existing entries only gain
    /// aliases, get a blank legal name filled and codes replaced; nothing is
    /// ever removed or blanked.
    pub fn upsert(&mut self, update: CatalogUpdate<'_>) -> Result<Upsert> {
        let rfc = update.rfc.trim().to_uppercase();
        if rfc.is_empty() {
            return Err(DiotError::InvalidIdentifier("RFC cannot be empty".into()));
        }
        let legal_name = non_blank(update.legal_name);
        let third_party = non_blank(update.third_party_type);
        let operation = non_blank(update.operation_type);

        if let Some(&idx) = self.by_rfc.get(&rfc) {
            if let Some(alias) = non_blank(update.alias) {
                self.add_alias(idx, normalize_name(alias));
            }
            let entry = &mut self.entries[idx];
            if let Some(name) = legal_name {
                if entry.legal_name.trim().is_empty() {
                    entry.legal_name = name.to_string();
                }
            }
            if let Some(code) = third_party {
                entry.third_party_type = code.to_string();
            }
            if let Some(code) = operation {
                entry.operation_type = code.to_string();
            }
            return Ok(Upsert::Updated);
        }

        let mut aliases = BTreeSet::new();
        if let Some(source) = non_blank(update.alias).or(legal_name) {
            let alias = normalize_name(source);
            if !alias.is_empty() {
                aliases.insert(alias);
            }
        }
        self.push(CatalogEntry {
            rfc,
            legal_name: legal_name.unwrap_or_default().to_string(),
            aliases,
            third_party_type: third_party.unwrap_or(DEFAULT_THIRD_PARTY_TYPE).to_string(),
            operation_type: operation.unwrap_or(DEFAULT_OPERATION_TYPE).to_string(),
        });
        Ok(Upsert::Created)
    }
}
