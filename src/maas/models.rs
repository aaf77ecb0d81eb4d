/// MAAS API data models
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Clusters keyed by `cluster_name`
pub type ClusterMap = BTreeMap<String, Cluster>;

/// MAAS cluster (nodegroup) record.
///
/// Only `cluster_name` is typed; every other field is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub cluster_name: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Cluster {
    pub fn uuid(&self) -> Option<String> {
        self.text("uuid")
    }

    pub fn id(&self) -> Option<String> {
        self.text("id")
    }

    #[cfg(test)]
    fn domain(&self) -> Option<String> {
        self.text("name")
    }

    /// Identifier used in `nodegroups/{id}/` paths
    pub fn remote_id(&self) -> Option<String> {
        self.uuid().or_else(|| self.id())
    }

    /// Wrap into the `{cluster_name: record}` shape
    pub fn keyed(self) -> ClusterMap {
        let mut map = ClusterMap::new();
        map.insert(self.cluster_name.clone(), self);
        map
    }

    /// Flatten back into a plain JSON object
    pub fn into_record(self) -> Map<String, Value> {
        let mut record = self.fields;
        record.insert("cluster_name".to_string(), Value::String(self.cluster_name));
        record
    }

    fn text(&self, key: &str) -> Option<String> {
        self.fields.get(key).and_then(scalar_text)
    }
}

/// Project grouping that owns clusters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Value,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Project {
    pub fn id_text(&self) -> Option<String> {
        scalar_text(&self.id)
    }
}

/// Cluster attachment listed under a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectCluster {
    pub id: Value,
    #[serde(default)]
    pub url: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ProjectCluster {
    pub fn id_text(&self) -> Option<String> {
        scalar_text(&self.id)
    }
}

/// How a project is selected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectRef {
    Name(String),
    Id(String),
}

impl ProjectRef {
    pub fn matches(&self, project: &Project) -> bool {
        match self {
            ProjectRef::Name(name) => &project.name == name,
            ProjectRef::Id(id) => project.id_text().as_deref() == Some(id.as_str()),
        }
    }
}

impl std::fmt::Display for ProjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectRef::Name(name) => write!(f, "name {}", name),
            ProjectRef::Id(id) => write!(f, "id {}", id),
        }
    }
}

/// Result record returned to the calling agent.
///
/// `Error` serializes as `{"Error": message}`; `Done` serializes as its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Done(T),
    Error(String),
}

impl<T> Outcome<T> {
    pub fn error(message: impl Into<String>) -> Self {
        Outcome::Error(message.into())
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Done(value) => Outcome::Done(f(value)),
            Outcome::Error(message) => Outcome::Error(message),
        }
    }

    #[cfg(test)]
    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error(_))
    }
}

impl<T: Serialize> Serialize for Outcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Outcome::Done(value) => value.serialize(serializer),
            Outcome::Error(message) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Error", message)?;
                map.end()
            }
        }
    }
}

/// `{"Status": true}` returned by updates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRecord {
    #[serde(rename = "Status")]
    pub status: bool,
}

/// `{"Deleted": id}` returned by deletes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletedRecord {
    #[serde(rename = "Deleted")]
    pub id: String,
}

/// Fields to change on a cluster. Unset or empty fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterUpdate {
    pub cluster_name: Option<String>,
    pub domain: Option<String>,
    pub status: Option<String>,
}

impl ClusterUpdate {
    pub fn apply(&self, record: &mut Map<String, Value>) {
        let changes = [
            ("cluster_name", &self.cluster_name),
            ("name", &self.domain),
            ("status", &self.status),
        ];
        for (key, value) in changes {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                record.insert(key.to_string(), Value::String(value.to_string()));
            }
        }
    }
}

/// Scalar JSON values as form/path text. Objects, arrays and nulls have none.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
