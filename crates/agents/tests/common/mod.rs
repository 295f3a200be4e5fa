//! Common test utilities

use async_trait::async_trait;
use graphrag_agents::{ChatModel, LlmError};
use graphrag_store::KnowledgeBase;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

/// Services, a team, a process and the chunks documenting them
pub const FIXTURE: &str = r#"{
  "entities": [
    {"id": "svc-checkout", "name": "Checkout Service", "type": "service"},
    {"id": "svc-payments", "name": "Payments Service", "type": "service"},
    {"id": "db-ledger", "name": "Ledger Database", "type": "database"},
    {"id": "team-payments", "name": "Payments Team", "type": "team"},
    {"id": "proc-refund", "name": "Refund Process", "type": "process"}
  ],
  "relations": [
    {"id": "r1", "sourceEntityId": "svc-checkout", "targetEntityId": "svc-payments",
     "relationType": "depends_on", "evidenceChunkIds": ["chunk-arch"]},
    {"id": "r2", "sourceEntityId": "svc-payments", "targetEntityId": "db-ledger",
     "relationType": "writes_to", "evidenceChunkIds": ["chunk-storage"]},
    {"id": "r3", "sourceEntityId": "team-payments", "targetEntityId": "svc-payments",
     "relationType": "owns", "evidenceChunkIds": ["chunk-ownership"]},
    {"id": "r4", "sourceEntityId": "proc-refund", "targetEntityId": "svc-payments",
     "relationType": "uses", "evidenceChunkIds": ["chunk-refunds"]}
  ],
  "chunks": [
    {"id": "chunk-arch", "title": "Checkout architecture", "url": "https://wiki/arch",
     "content": "The checkout service calls the payments service to authorize every order.",
     "entityIds": ["svc-checkout", "svc-payments"]},
    {"id": "chunk-storage", "title": "Payments storage", "url": "https://wiki/storage",
     "content": "Payments writes every captured transaction to the ledger database.",
     "entityIds": ["svc-payments", "db-ledger"]},
    {"id": "chunk-ownership", "title": "Service ownership", "url": "https://wiki/ownership",
     "content": "The payments team owns the payments service and is paged for checkout failures.",
     "entityIds": ["team-payments", "svc-payments"]},
    {"id": "chunk-refunds", "title": "Refund runbook", "url": "https://wiki/refunds",
     "content": "Refunds are issued through the payments service and reconciled nightly.",
     "entityIds": ["proc-refund", "svc-payments"]},
    {"id": "chunk-onboarding", "title": "Onboarding guide", "url": "https://wiki/onboarding",
     "content": "New engineers should request wiki access during their first week.",
     "entityIds": []}
  ]
}"#;

/// Write the fixture to a temporary directory
pub fn write_fixture() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("knowledge.json");
    std::fs::write(&path, FIXTURE).expect("Failed to write fixture");
    (dir, path)
}

/// Load the fixture through the same path the CLI uses
pub async fn load_knowledge() -> KnowledgeBase {
    let (_dir, path) = write_fixture();
    KnowledgeBase::load(&path)
        .await
        .expect("Failed to load fixture")
}

/// Chat model returning a fixed answer and recording every prompt
pub struct CannedModel {
    answer: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl CannedModel {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            answer: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModel for CannedModel {
    async fn complete_chat(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(user_prompt.to_string());
        self.answer.clone().ok_or(LlmError::Status {
            status: 503,
            body: "model overloaded".into(),
        })
    }
}
