//! Process-wide analysis cache (§4.8, §6): the only state this crate keeps
//! across calls. A finished analysis is inserted once; any number of readers
//! (a `graph`/`matrix`/`clusters` view, or a later CLI invocation re-reading
//! a persisted copy) may look it up by id concurrently. Never persisted to
//! disk by this crate — §6 keeps that out of scope for the core engine.

use crate::orchestrator::AnalysisResponse;
use common::FileFingerprint;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct AnalysisCache {
    responses: RwLock<HashMap<Uuid, Arc<AnalysisResponse>>>,
    fingerprints: RwLock<HashMap<Uuid, Arc<HashMap<String, FileFingerprint>>>>,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(
        &self,
        response: AnalysisResponse,
        fingerprints: HashMap<String, FileFingerprint>,
    ) -> Uuid {
        let id = response.analysis_id;
        self.responses.write().await.insert(id, Arc::new(response));
        self.fingerprints
            .write()
            .await
            .insert(id, Arc::new(fingerprints));
        id
    }

    pub async fn get_response(&self, id: Uuid) -> Option<Arc<AnalysisResponse>> {
        self.responses.read().await.get(&id).cloned()
    }

    pub async fn get_fingerprints(&self, id: Uuid) -> Option<Arc<HashMap<String, FileFingerprint>>> {
        self.fingerprints.read().await.get(&id).cloned()
    }
}
