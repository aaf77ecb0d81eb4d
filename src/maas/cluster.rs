/// Cluster (nodegroup) operations for MAAS
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::client::MaasClient;
use super::error::Result;
use super::models::{
    scalar_text, Cluster, ClusterMap, ClusterUpdate, DeletedRecord, Outcome, Project,
    ProjectCluster, ProjectRef, StatusRecord,
};

const CLUSTER_NOT_FOUND: &str = "Could not find specified cluster";
const PROJECT_NOT_RESOLVED: &str = "Unable to resolve project";

/// Cluster manager for MAAS nodegroups
pub struct ClusterManager {
    client: MaasClient,
}

impl ClusterManager {
    /// Create a new cluster manager
    pub fn new(client: MaasClient) -> Self {
        Self { client }
    }

    async fn fetch_clusters(&self) -> Result<Vec<Cluster>> {
        self.client.get("nodegroups/", Some("list")).await
    }

    /// List all clusters keyed by `cluster_name`
    pub async fn list_clusters(&self) -> Result<ClusterMap> {
        let clusters = self.fetch_clusters().await?;
        debug!("Clusters in MAAS: {}", clusters.len());

        Ok(clusters
            .into_iter()
            .map(|cluster| (cluster.cluster_name.clone(), cluster))
            .collect())
    }

    /// Get the first cluster named `cluster_name`
    pub async fn get_cluster(&self, cluster_name: &str) -> Result<Outcome<Cluster>> {
        let clusters = self.fetch_clusters().await?;

        Ok(clusters
            .into_iter()
            .find(|c| c.cluster_name == cluster_name)
            .map(Outcome::Done)
            .unwrap_or_else(|| Outcome::error(CLUSTER_NOT_FOUND)))
    }

    /// Create a cluster under a project unless one with the same URL already exists,
    /// then return it as listed by MAAS
    pub async fn create_cluster(
        &self,
        cluster_name: &str,
        cluster_url: &str,
        project: &ProjectRef,
    ) -> Result<Outcome<Cluster>> {
        let Some((project_id, project)) = self.resolve_project(project).await? else {
            return Ok(Outcome::error(PROJECT_NOT_RESOLVED));
        };

        let existing = self.project_clusters(&project_id).await?;
        if let Some(cluster) = existing.iter().find(|c| c.url == cluster_url) {
            info!(
                "Cluster with url {} already exists in project {} (ID: {:?})",
                cluster_url,
                project.name,
                cluster.id_text()
            );
        } else {
            info!(
                "Creating cluster {} ({}) in project {}",
                cluster_name, cluster_url, project.name
            );
            let form = vec![
                ("cluster_name".to_string(), cluster_name.to_string()),
                ("url".to_string(), cluster_url.to_string()),
            ];
            self.client
                .post_form(&format!("projects/{}/clusters/", project_id), &form)
                .await?;
        }

        self.get_cluster(cluster_name).await
    }

    /// Delete the project cluster whose URL matches `cluster_url`
    pub async fn delete_cluster(
        &self,
        cluster_url: &str,
        project: &ProjectRef,
    ) -> Result<Outcome<DeletedRecord>> {
        let Some((project_id, project)) = self.resolve_project(project).await? else {
            return Ok(Outcome::error(PROJECT_NOT_RESOLVED));
        };

        let clusters = self.project_clusters(&project_id).await?;
        let Some(cluster) = clusters.into_iter().find(|c| c.url == cluster_url) else {
            info!("No cluster with url {} in project {}", cluster_url, project.name);
            return Ok(Outcome::error("Could not find cluster"));
        };
        let Some(cluster_id) = cluster.id_text() else {
            return Ok(Outcome::error("Cluster has no id"));
        };

        info!("Deleting cluster {} (ID: {})", cluster_url, cluster_id);
        self.client
            .delete(&format!("projects/{}/clusters/{}/", project_id, cluster_id))
            .await?;

        Ok(Outcome::Done(DeletedRecord { id: cluster_id }))
    }

    /// Update a cluster, addressed by id or by its current name.
    ///
    /// Only the fields set in `update` change. The PUT response is not checked
    /// beyond a successful status.
    pub async fn update_cluster(
        &self,
        cluster_id: Option<&str>,
        old_cluster_name: Option<&str>,
        update: &ClusterUpdate,
    ) -> Result<Outcome<StatusRecord>> {
        let cluster_id = cluster_id.filter(|id| !id.trim().is_empty());
        let old_cluster_name = old_cluster_name.filter(|name| !name.trim().is_empty());

        let (cluster_id, mut record) = match (cluster_id, old_cluster_name) {
            (Some(id), _) => (id.to_string(), Map::new()),
            (None, Some(name)) => match self.get_cluster(name).await? {
                Outcome::Error(message) => return Ok(Outcome::Error(message)),
                Outcome::Done(cluster) => match cluster.remote_id() {
                    Some(id) => (id, cluster.into_record()),
                    None => return Ok(Outcome::error("Cluster has no uuid")),
                },
            },
            (None, None) => return Ok(Outcome::error("No cluster id or name specified")),
        };

        update.apply(&mut record);
        debug!("Cluster id: {}", cluster_id);
        debug!("New cluster info: {:?}", record);

        info!("Updating cluster {}", cluster_id);
        self.client
            .put_form(&format!("nodegroups/{}/", cluster_id), &form_fields(&record))
            .await?;

        Ok(Outcome::Done(StatusRecord { status: true }))
    }

    /// Find a project by name or id, along with its id as path text
    async fn resolve_project(&self, project: &ProjectRef) -> Result<Option<(String, Project)>> {
        let projects: Vec<Project> = self.client.get("projects/", Some("list")).await?;
        let found = projects
            .into_iter()
            .find(|p| project.matches(p))
            .and_then(|p| p.id_text().map(|id| (id, p)));
        if found.is_none() {
            debug!("No project with {}", project);
        }
        Ok(found)
    }

    async fn project_clusters(&self, project_id: &str) -> Result<Vec<ProjectCluster>> {
        self.client
            .get(&format!("projects/{}/clusters/", project_id), None)
            .await
    }
}

/// Scalar fields of a record as form pairs; nested values cannot be form-encoded
fn form_fields(record: &Map<String, Value>) -> Vec<(String, String)> {
    record
        .iter()
        .filter_map(|(key, value)| match scalar_text(value) {
            Some(text) => Some((key.clone(), text)),
            None => {
                debug!("Skipping non-scalar field {}", key);
                None
            }
        })
        .collect()
}
