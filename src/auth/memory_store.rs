use async_trait::async_trait;
use axum_login::tower_sessions::{
    ExpiredDeletion, SessionStore,
    cookie::time::OffsetDateTime,
    session::{Id, Record},
    session_store::Error as SSError,
};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

/// Sessions kept in process memory. A restart logs everybody out.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    records: Arc<RwLock<HashMap<Id, Record>>>,
}

fn is_live(record: &Record) -> bool {
    record.expiry_date > OffsetDateTime::now_utc()
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, session_record: &mut Record) -> Result<(), SSError> {
        let mut records = self.records.write().await;
        while records.contains_key(&session_record.id) {
            session_record.id = Id::default();
        }
        records.insert(session_record.id, session_record.clone());
        Ok(())
    }

    async fn save(&self, session_record: &Record) -> Result<(), SSError> {
        self.records
            .write()
            .await
            .insert(session_record.id, session_record.clone());
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> Result<Option<Record>, SSError> {
        Ok(self
            .records
            .read()
            .await
            .get(session_id)
            .filter(|record| is_live(record))
            .cloned())
    }

    async fn delete(&self, session_id: &Id) -> Result<(), SSError> {
        self.records.write().await.remove(session_id);
        Ok(())
    }
}

#[async_trait]
impl ExpiredDeletion for MemorySessionStore {
    async fn delete_expired(&self) -> Result<(), SSError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| is_live(record));
        let removed = before - records.len();
        if removed > 0 {
            debug!(removed, "cleared expired sessions");
        }
        Ok(())
    }
}
