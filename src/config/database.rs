//! Database sources: one connection target expanding to one or more databases.

use std::fmt;

/// Name token that selects every database on a host.
pub const ALL_DATABASES_TOKEN: &str = "*";

const DEFAULT_PORT: u16 = 3306;

/// A configured connection target.
///
/// Either `name`, `names` or both may be set. The resolved list is `names`
/// followed by `name`; duplicates are kept.
#[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("name", &self.name)
            .field("names", &self.names)
            .finish()
    }
}

impl DatabaseConfig {
    /// Expands `names` and `name` into one normalized list.
    ///
    /// An empty `name` counts as unset.
    pub fn resolved_names(&self) -> Vec<DatabaseName> {
        self.names
            .iter()
            .map(String::as_str)
            .chain(self.name.as_deref().filter(|name| !name.is_empty()))
            .map(DatabaseName::from)
            .collect()
    }
}

/// A single resolved database of a [DatabaseConfig].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DatabaseName {
    /// Every database on the host (`*` in the config).
    All,
    /// One named database.
    Named(String),
}

impl DatabaseName {
    /// Part of the dump file name identifying the database.
    pub fn file_suffix(&self) -> &str {
        match self {
            Self::All => "all-databases",
            Self::Named(name) => name,
        }
    }

    /// Positional argument selecting the database for the dump tool.
    pub fn dump_arg(&self) -> &str {
        match self {
            Self::All => "--all-databases",
            Self::Named(name) => name,
        }
    }
}

impl From<&str> for DatabaseName {
    fn from(name: &str) -> Self {
        if name == ALL_DATABASES_TOKEN {
            Self::All
        } else {
            Self::Named(name.to_string())
        }
    }
}

impl fmt::Display for DatabaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all databases"),
            Self::Named(name) => f.write_str(name),
        }
    }
}
