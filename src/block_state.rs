use crate::error::{Result, SchematicError};
use quartz_nbt::{NbtCompound, NbtTag};
use smol_str::SmolStr;
use std::fmt;
use std::hash::{Hash, Hasher};

/// An immutable `identifier` + sorted-unique `properties` value
/// identifying one block variant. Two `BlockState`s are equal iff their
/// identifiers match and their property sets match, regardless of
/// insertion order. Mutators (`with_id`, `with_property`, ...) return
/// new instances rather than mutating in place.
#[derive(Debug, Clone, Eq, serde::Serialize, serde::Deserialize)]
pub struct BlockState {
    identifier: SmolStr,
    properties: Vec<(SmolStr, SmolStr)>,
}

impl PartialEq for BlockState {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
            && self.properties.len() == other.properties.len()
            && self
                .properties
                .iter()
                .all(|(k, v)| other.get_property(k).map(|ov| ov == v).unwrap_or(false))
    }
}

impl Hash for BlockState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier.hash(state);
        let mut sorted = self.properties.clone();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        for (k, v) in &sorted {
            k.hash(state);
            v.hash(state);
        }
    }
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier)?;
        if !self.properties.is_empty() {
            write!(f, "[")?;
            let mut sorted = self.properties.clone();
            sorted.sort_by(|a, b| a.0.cmp(&b.0));
            for (i, (k, v)) in sorted.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}={}", k, v)?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

/// The reserved block state that always occupies palette index 0.
pub const AIR_IDENTIFIER: &str = "minecraft:air";

/// True iff `id` is a well-formed `namespace:path` identifier: both
/// parts non-empty, lowercase ascii letters/digits plus `_`, `-`, `.`,
/// `/` in the path.
pub fn is_valid_identifier(id: &str) -> bool {
    let Some((ns, path)) = id.split_once(':') else {
        return false;
    };
    if ns.is_empty() || path.is_empty() {
        return false;
    }
    let ns_ok = ns
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '.' || c == '-');
    let path_ok = path.chars().all(|c| {
        c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '.' || c == '-' || c == '/'
    });
    ns_ok && path_ok
}

impl BlockState {
    /// Creates a block state with no properties, without validating the
    /// identifier. Use [`BlockState::try_new`] for untrusted input.
    pub fn new(identifier: impl Into<SmolStr>) -> Self {
        BlockState {
            identifier: identifier.into(),
            properties: Vec::new(),
        }
    }

    /// Creates a block state after validating the identifier syntax.
    pub fn try_new(identifier: impl Into<SmolStr>) -> Result<Self> {
        let identifier = identifier.into();
        if !is_valid_identifier(&identifier) {
            return Err(SchematicError::InvalidIdentifier(identifier.to_string()));
        }
        Ok(BlockState {
            identifier,
            properties: Vec::new(),
        })
    }

    pub fn air() -> Self {
        BlockState::new(AIR_IDENTIFIER)
    }

    pub fn is_air(&self) -> bool {
        self.identifier == AIR_IDENTIFIER
    }

    pub fn identifier(&self) -> &str {
        self.identifier.as_str()
    }

    /// Deprecated alias retained for call-site familiarity.
    pub fn get_name(&self) -> &str {
        self.identifier()
    }

    pub fn properties(&self) -> &[(SmolStr, SmolStr)] {
        &self.properties
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get_property(key).is_some()
    }

    pub fn get_property(&self, key: &str) -> Option<&SmolStr> {
        self.properties.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn with_id(&self, identifier: impl Into<SmolStr>) -> Self {
        BlockState {
            identifier: identifier.into(),
            properties: self.properties.clone(),
        }
    }

    /// Returns a new state with `key` set to `Some(value)` or removed
    /// when `value` is `None`.
    pub fn with_property(&self, key: impl Into<SmolStr>, value: Option<impl Into<SmolStr>>) -> Self {
        let key = key.into();
        let mut properties: Vec<(SmolStr, SmolStr)> =
            self.properties.iter().filter(|(k, _)| *k != key).cloned().collect();
        if let Some(value) = value {
            properties.push((key, value.into()));
        }
        BlockState {
            identifier: self.identifier.clone(),
            properties,
        }
    }

    /// Bulk variant of [`BlockState::with_property`]: a `None` value
    /// removes the key, `Some` sets it.
    pub fn with_properties(&self, changes: impl IntoIterator<Item = (SmolStr, Option<SmolStr>)>) -> Self {
        let mut state = self.clone();
        for (key, value) in changes {
            state = state.with_property(key, value);
        }
        state
    }

    pub fn to_block_state_identifier(&self) -> String {
        self.to_string()
    }

    pub fn to_nbt(&self) -> NbtTag {
        let mut compound = NbtCompound::new();
        compound.insert("Name", self.identifier.to_string());
        if !self.properties.is_empty() {
            let mut sorted = self.properties.clone();
            sorted.sort_by(|a, b| a.0.cmp(&b.0));
            let mut properties = NbtCompound::new();
            for (k, v) in &sorted {
                properties.insert(k.to_string(), v.to_string());
            }
            compound.insert("Properties", properties);
        }
        NbtTag::Compound(compound)
    }

    pub fn from_nbt(compound: &NbtCompound) -> Result<Self> {
        let name: SmolStr = compound
            .get::<_, &String>("Name")
            .map_err(|_| SchematicError::RequiredKeyMissing("Name".to_string()))?
            .into();

        let mut properties = Vec::new();
        if let Ok(props) = compound.get::<_, &NbtCompound>("Properties") {
            for (key, value) in props.inner() {
                if let NbtTag::String(value_str) = value {
                    properties.push((key.into(), value_str.into()));
                }
            }
        }

        Ok(BlockState {
            identifier: name,
            properties,
        })
    }
}
