//! Resource Service - REST operations for one catalog entry
//!
//! One generic service covers worlds and every entity kind. Paths come from
//! the [`ResourceSpec`]: list and create hit the endpoint, update and delete
//! hit `{endpoint}/{id}`.

use std::marker::PhantomData;

use serde_json::{Map, Value};
use url::form_urlencoded;

use worldloom_domain::{Resource, ResourceSpec, Scope};

use crate::application::{Api, ServiceError};

/// REST service for records described by a [`ResourceSpec`]
pub struct ResourceService<R: Resource> {
    api: Api,
    spec: &'static ResourceSpec,
    _record: PhantomData<fn() -> R>,
}

impl<R: Resource> Clone for ResourceService<R> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            spec: self.spec,
            _record: PhantomData,
        }
    }
}

impl<R: Resource> ResourceService<R> {
    pub fn new(api: Api, spec: &'static ResourceSpec) -> Self {
        Self {
            api,
            spec,
            _record: PhantomData,
        }
    }

    pub fn spec(&self) -> &'static ResourceSpec {
        self.spec
    }

    /// List records under `scope`.
    ///
    /// World-scoped resources need a world in scope. Items that fail to decode
    /// are skipped with a warning so one bad row doesn't hide the rest.
    pub async fn list(&self, scope: &Scope) -> Result<Vec<R>, ServiceError> {
        if !scope.satisfies(self.spec.scope) {
            return Err(ServiceError::NoWorldSelected);
        }

        let path = self.list_path(scope);
        let items = self.api.get_list(&path).await?;
        let total = items.len();

        let records: Vec<R> = items
            .into_iter()
            .filter_map(|item| match R::from_wire(item, scope) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(resource = self.spec.key, error = %e, "Skipping undecodable record");
                    None
                }
            })
            .collect();

        tracing::debug!(
            resource = self.spec.key,
            total,
            decoded = records.len(),
            "Listed records"
        );
        Ok(records)
    }

    /// Create a record from a storage-named payload
    pub async fn create(&self, payload: &Map<String, Value>) -> Result<Value, ServiceError> {
        self.api.post(self.spec.endpoint, payload).await
    }

    /// Replace a record's fields with a storage-named payload
    pub async fn update(
        &self,
        id: &R::Id,
        payload: &Map<String, Value>,
    ) -> Result<Value, ServiceError> {
        self.api.put(&self.item_path(id), payload).await
    }

    pub async fn delete(&self, id: &R::Id) -> Result<(), ServiceError> {
        self.api.delete(&self.item_path(id)).await
    }

    fn list_path(&self, scope: &Scope) -> String {
        let pairs = scope.query_pairs(self.spec.scope);
        if pairs.is_empty() {
            return self.spec.endpoint.to_string();
        }

        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())))
            .finish();
        format!("{}?{}", self.spec.endpoint, query)
    }

    fn item_path(&self, id: &R::Id) -> String {
        let encoded: String = form_urlencoded::byte_serialize(id.to_string().as_bytes()).collect();
        self.spec.item_path(&encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use serde_json::json;
    use std::sync::Arc;
    use worldloom_domain::catalog::{CHARACTER_SPEC, WORLD_SPEC};
    use worldloom_domain::{EntityId, EntityRecord, ProjectId, World, WorldId};
    use worldloom_ports::outbound::MockRawApiPort;

    fn service<R: Resource>(raw: MockRawApiPort, spec: &'static ResourceSpec) -> ResourceService<R> {
        ResourceService::new(Api::new(Arc::new(raw)), spec)
    }

    #[tokio::test]
    async fn world_list_is_unscoped() {
        let mut raw = MockRawApiPort::new();
        raw.expect_get_json()
            .with(eq("/api/worlds"))
            .times(1)
            .returning(|_| Ok(json!([{"id": 1, "name": "Aeloria"}])));

        let worlds = service::<World>(raw, &WORLD_SPEC)
            .list(&Scope::none())
            .await
            .unwrap();
        assert_eq!(worlds.len(), 1);
        assert_eq!(worlds[0].name, "Aeloria");
    }

    #[tokio::test]
    async fn entity_list_sends_world_and_project() {
        let mut raw = MockRawApiPort::new();
        raw.expect_get_json()
            .with(eq("/api/characters?world_id=1&project_id=p+1"))
            .times(1)
            .returning(|_| Ok(json!({"data": [{"id": 5, "name": "Mira"}]})));

        let scope = Scope::world(WorldId::from(1)).with_project(Some(ProjectId::parse("p 1").unwrap()));
        let records = service::<EntityRecord>(raw, &CHARACTER_SPEC)
            .list(&scope)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].world_id, WorldId::from(1));
    }

    #[tokio::test]
    async fn entity_list_without_world_is_refused_without_a_request() {
        let raw = MockRawApiPort::new();
        let err = service::<EntityRecord>(raw, &CHARACTER_SPEC)
            .list(&Scope::none())
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::NoWorldSelected);
    }

    #[tokio::test]
    async fn undecodable_items_are_skipped() {
        let mut raw = MockRawApiPort::new();
        raw.expect_get_json()
            .returning(|_| Ok(json!([{"name": "no id"}, {"id": 2, "name": "ok"}, 17])));

        let records = service::<EntityRecord>(raw, &CHARACTER_SPEC)
            .list(&Scope::world(WorldId::from(1)))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, EntityId::from(2));
    }

    #[tokio::test]
    async fn update_and_delete_target_the_item_path() {
        let mut raw = MockRawApiPort::new();
        raw.expect_put_json()
            .with(eq("/api/characters/5"), eq(json!({"name": "Mira"})))
            .times(1)
            .returning(|_, body| Ok(body.clone()));
        raw.expect_delete()
            .with(eq("/api/characters/5"))
            .times(1)
            .returning(|_| Ok(Value::Null));

        let service = service::<EntityRecord>(raw, &CHARACTER_SPEC);
        let mut payload = Map::new();
        payload.insert("name".into(), json!("Mira"));

        service.update(&EntityId::from(5), &payload).await.unwrap();
        service.delete(&EntityId::from(5)).await.unwrap();
    }
}
