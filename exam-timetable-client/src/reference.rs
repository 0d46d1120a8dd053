use tracing::{debug, warn};

use crate::model::{NamePayload, NamedRecord, ResourceKind};

#[derive(thiserror::Error, Debug)]
pub enum ReferenceDataError {
    #[error("Failed to fetch {kind}")]
    Fetch {
        kind: ResourceKind,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to save {}", .kind.singular())]
    Save {
        kind: ResourceKind,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to delete {}", .kind.singular())]
    Delete {
        kind: ResourceKind,
        #[source]
        source: reqwest::Error,
    },
    #[error("name must not be empty")]
    EmptyName,
}

/// Trims `name` and refuses names that are blank afterwards.
pub fn normalize_name(name: &str) -> Result<&str, ReferenceDataError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ReferenceDataError::EmptyName);
    }
    Ok(name)
}

/// CRUD access to the invigilator and venue lists owned by the backend.
///
/// There is no local cache: callers re-list after every mutation so what they
/// display is always what the backend holds.
#[derive(Clone, Debug)]
pub struct ReferenceDataClient {
    client: reqwest::Client,
    root: String,
}

impl ReferenceDataClient {
    pub fn new(root: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), root)
    }

    pub fn with_client(client: reqwest::Client, root: impl Into<String>) -> Self {
        Self {
            client,
            root: root.into(),
        }
    }

    #[must_use]
    pub fn collection_url(&self, kind: ResourceKind) -> String {
        format!("{}/api/{}/", self.root.trim_end_matches('/'), kind.path())
    }

    #[must_use]
    pub fn record_url(&self, kind: ResourceKind, id: i64) -> String {
        format!("{}/api/{}/{id}", self.root.trim_end_matches('/'), kind.path())
    }

    pub async fn list(&self, kind: ResourceKind) -> Result<Vec<NamedRecord>, ReferenceDataError> {
        let fetch = |source| ReferenceDataError::Fetch { kind, source };
        let records = self
            .client
            .get(self.collection_url(kind))
            .send()
            .await
            .map_err(fetch)?
            .error_for_status()
            .map_err(fetch)?
            .json::<Vec<NamedRecord>>()
            .await
            .map_err(|source| {
                warn!(%kind, error = %source, "reference data list is not a record list");
                fetch(source)
            })?;
        debug!(%kind, count = records.len(), "listed reference data");
        Ok(records)
    }

    pub async fn find(
        &self,
        kind: ResourceKind,
        id: i64,
    ) -> Result<Option<NamedRecord>, ReferenceDataError> {
        Ok(self
            .list(kind)
            .await?
            .into_iter()
            .find(|record| record.id == id))
    }

    pub async fn create(&self, kind: ResourceKind, name: &str) -> Result<(), ReferenceDataError> {
        let name = normalize_name(name)?;
        let save = |source| ReferenceDataError::Save { kind, source };
        self.client
            .post(self.collection_url(kind))
            .json(&NamePayload { name })
            .send()
            .await
            .map_err(save)?
            .error_for_status()
            .map_err(save)?;
        debug!(%kind, name, "created reference record");
        Ok(())
    }

    pub async fn update(
        &self,
        kind: ResourceKind,
        id: i64,
        name: &str,
    ) -> Result<(), ReferenceDataError> {
        let name = normalize_name(name)?;
        let save = |source| ReferenceDataError::Save { kind, source };
        self.client
            .put(self.record_url(kind, id))
            .json(&NamePayload { name })
            .send()
            .await
            .map_err(save)?
            .error_for_status()
            .map_err(save)?;
        debug!(%kind, id, name, "updated reference record");
        Ok(())
    }

    /// Callers must have obtained an explicit confirmation from the user.
    pub async fn delete(&self, kind: ResourceKind, id: i64) -> Result<(), ReferenceDataError> {
        let delete = |source| ReferenceDataError::Delete { kind, source };
        self.client
            .delete(self.record_url(kind, id))
            .send()
            .await
            .map_err(delete)?
            .error_for_status()
            .map_err(delete)?;
        debug!(%kind, id, "deleted reference record");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_follow_backend_layout() {
        let client = ReferenceDataClient::new("http://localhost:9000/");
        assert_eq!(
            client.collection_url(ResourceKind::Invigilators),
            "http://localhost:9000/api/invigilators/"
        );
        assert_eq!(
            client.record_url(ResourceKind::Venues, 7),
            "http://localhost:9000/api/venues/7"
        );
    }

    #[test]
    fn names_are_trimmed_and_must_not_be_blank() {
        assert_eq!(normalize_name("  Dr. X  ").unwrap(), "Dr. X");
        assert!(matches!(
            normalize_name(" \t "),
            Err(ReferenceDataError::EmptyName)
        ));
    }

    #[tokio::test]
    async fn blank_names_never_reach_the_network() {
        // nothing listens on this port, so any request would fail with Save
        let client = ReferenceDataClient::new("http://127.0.0.1:9");
        assert!(matches!(
            client.create(ResourceKind::Venues, "   ").await,
            Err(ReferenceDataError::EmptyName)
        ));
        assert!(matches!(
            client.update(ResourceKind::Invigilators, 1, "").await,
            Err(ReferenceDataError::EmptyName)
        ));
    }

    #[tokio::test]
    async fn unreachable_backend_reports_kind_specific_messages() {
        let client = ReferenceDataClient::new("http://127.0.0.1:9");
        let error = client.list(ResourceKind::Venues).await.unwrap_err();
        assert_eq!(error.to_string(), "Failed to fetch venues");
        let error = client.delete(ResourceKind::Venues, 3).await.unwrap_err();
        assert_eq!(error.to_string(), "Failed to delete venue");
        let error = client.create(ResourceKind::Invigilators, "A").await.unwrap_err();
        assert_eq!(error.to_string(), "Failed to save invigilator");
    }
}
