use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The two databases under comparison.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    Mongo,
    Cassandra,
}

impl DatabaseKind {
    pub const ALL: [DatabaseKind; 2] = [DatabaseKind::Mongo, DatabaseKind::Cassandra];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseKind::Mongo => "mongo",
            DatabaseKind::Cassandra => "cassandra",
        }
    }

    /// Parses a request parameter. Accepts `mongo`/`mongodb` and `cassandra`,
    /// ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Some(DatabaseKind::Mongo),
            "cassandra" => Some(DatabaseKind::Cassandra),
            _ => None,
        }
    }

    /// Name used in comparison tables.
    pub fn display_name(&self) -> &'static str {
        match self {
            DatabaseKind::Mongo => "MongoDB",
            DatabaseKind::Cassandra => "Cassandra",
        }
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One process instance belonging to a database cluster
/// (a replica-set member or a ring peer).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub database: DatabaseKind,
}

/// The set of member names the injector is allowed to disrupt.
///
/// Requests naming anything outside this registry are rejected before the
/// process controller is touched.
#[derive(Debug, Default)]
pub struct MemberRegistry {
    members: DashMap<String, Member>,
}

impl MemberRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn from_names(mongo: &[String], cassandra: &[String]) -> Arc<Self> {
        let registry = Self::default();
        for name in mongo {
            registry.register(name, DatabaseKind::Mongo);
        }
        for name in cassandra {
            registry.register(name, DatabaseKind::Cassandra);
        }
        Arc::new(registry)
    }

    pub fn register(&self, name: &str, database: DatabaseKind) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        self.members.insert(
            name.to_string(),
            Member {
                name: name.to_string(),
                database,
            },
        );
        tracing::debug!("Registered {} member {}", database, name);
    }

    pub fn get(&self, name: &str) -> Option<Member> {
        self.members.get(name).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    /// All member names, sorted for stable output.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.members.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn members_of(&self, database: DatabaseKind) -> Vec<Member> {
        let mut members: Vec<Member> = self
            .members
            .iter()
            .filter(|e| e.value().database == database)
            .map(|e| e.value().clone())
            .collect();
        members.sort_by(|a, b| a.name.cmp(&b.name));
        members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Uptime of a single container as reported by the process controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MemberUptime {
    Known {
        seconds: u64,
        hours: f64,
        status: String,
    },
    Error {
        error: String,
    },
}
