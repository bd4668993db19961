use std::collections::HashMap;

/// Built-in aliases for the field names used by cluster job and node records
pub const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("name", "Name"),
    ("user", "User"),
    ("state", "State"),
    ("status", "State"),
    ("partition", "Partition"),
    ("node", "NodeList"),
    ("nodes", "NodeList"),
    ("time", "TimeUsed"),
    ("timelimit", "TimeLimit"),
    ("cpu", "CPUs"),
    ("cpus", "CPUs"),
    ("mem", "Memory"),
    ("memory", "Memory"),
    ("account", "Account"),
    ("qos", "QoS"),
    ("priority", "Priority"),
];

/// Maps user-typed field names onto canonical record keys
///
/// Lookup is case-insensitive. Names missing from the table are
/// lower-cased with the first character upper-cased, so `reason` becomes
/// `Reason` but `nodecount` becomes `Nodecount`, not `NodeCount`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAliases {
    aliases: HashMap<String, String>,
}

impl Default for FieldAliases {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_ALIASES.iter().copied())
    }
}

impl FieldAliases {
    /// An alias table with no entries; every field goes through the fallback
    pub fn empty() -> Self {
        Self {
            aliases: HashMap::new(),
        }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut table = Self::empty();
        table.extend(pairs);
        table
    }

    /// Add or replace aliases; keys are stored lower-cased
    pub fn extend<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>)
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        for (alias, canonical) in pairs {
            self.aliases
                .insert(alias.as_ref().to_lowercase(), canonical.into());
        }
    }

    /// Look up an alias without applying the fallback
    pub fn get(&self, alias: &str) -> Option<&str> {
        self.aliases.get(&alias.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Resolve a field name to the record key it refers to
    pub fn normalize(&self, field: &str) -> String {
        let lower = field.to_lowercase();
        if let Some(canonical) = self.aliases.get(&lower) {
            return canonical.clone();
        }
        capitalize(&lower)
    }
}

fn capitalize(lower: &str) -> String {
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
