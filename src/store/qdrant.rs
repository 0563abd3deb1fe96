//! Qdrant vector database backend
//!
//! Each docqa collection maps to one Qdrant collection with cosine distance.
//! Chunk text and source live in the point payload.

use super::{SearchHit, StoredChunk, VectorBackend};
use crate::error::{Error, Result};
use async_trait::async_trait;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance, GetCollectionInfoResponse,
    GetPointsBuilder, PointId, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::{json, Value};
use std::collections::HashSet;
use tracing::{debug, info};

/// Qdrant store handle
pub struct QdrantStore {
    client: Qdrant,
}

impl QdrantStore {
    /// Build a client for the server at `url`. No request is made until the
    /// first collection operation.
    pub fn new(url: &str) -> Result<Self> {
        debug!("Connecting to Qdrant at {}", url);

        let client = Qdrant::from_url(url)
            .skip_compatibility_check()
            .build()
            .map_err(|e| Error::Setup(format!("Failed to build Qdrant client: {}", e)))?;

        Ok(Self { client })
    }

    async fn collection_vector_size(&self, name: &str) -> Result<Option<u64>> {
        let info = self.client.collection_info(name).await?;
        Ok(extract_vector_size(&info))
    }
}

#[async_trait]
impl VectorBackend for QdrantStore {
    async fn ensure_collection(&self, name: &str, dimension: usize, model: &str) -> Result<()> {
        if self.client.collection_exists(name).await? {
            debug!("Collection {} already exists", name);

            if let Some(size) = self.collection_vector_size(name).await? {
                if size as usize != dimension {
                    return Err(Error::Store(format!(
                        "Collection '{}' has vector size {}, but model '{}' produces {}",
                        name, size, model, dimension
                    )));
                }
            }
            return Ok(());
        }

        info!("Creating collection {} with dimension {}", name, dimension);

        self.client
            .create_collection(
                CreateCollectionBuilder::new(name)
                    .vectors_config(VectorParamsBuilder::new(dimension as u64, Distance::Cosine)),
            )
            .await?;
        Ok(())
    }

    async fn insert(&self, collection: &str, records: Vec<StoredChunk>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut seen = HashSet::with_capacity(records.len());
        if let Some(dup) = records.iter().find(|r| !seen.insert(r.id.as_str())) {
            return Err(Error::Store(format!(
                "Duplicate chunk id {} in batch for collection '{}'",
                dup.id, collection
            )));
        }

        // Upsert would silently overwrite, so reject ids already stored
        let ids: Vec<PointId> = records.iter().map(|r| PointId::from(r.id.clone())).collect();
        let existing = self
            .client
            .get_points(
                GetPointsBuilder::new(collection, ids)
                    .with_payload(false)
                    .with_vectors(false),
            )
            .await?;
        if let Some(point) = existing.result.first() {
            return Err(Error::Store(format!(
                "Duplicate chunk id {} in collection '{}'",
                point_id_to_string(point.id.clone()),
                collection
            )));
        }

        let count = records.len();
        let points = records
            .into_iter()
            .map(|r| {
                let payload = Payload::try_from(json!({ "text": r.text, "source": r.source }))?;
                Ok(PointStruct::new(r.id, r.vector, payload))
            })
            .collect::<Result<Vec<_>>>()?;

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await?;

        debug!("Upserted {} points to collection {}", count, collection);
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        debug!("Searching collection {} with limit {}", collection, limit);

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(collection, vector.to_vec(), limit as u64)
                    .with_payload(true),
            )
            .await?;

        let hits = response
            .result
            .into_iter()
            .map(|p| {
                let mut payload: serde_json::Map<String, Value> = p
                    .payload
                    .into_iter()
                    .map(|(k, v)| (k, json_from_qdrant_value(v)))
                    .collect();

                SearchHit {
                    id: point_id_to_string(p.id),
                    text: take_string(&mut payload, "text"),
                    source: take_string(&mut payload, "source"),
                    score: p.score,
                }
            })
            .collect();

        Ok(hits)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        if !self.client.collection_exists(collection).await? {
            return Ok(0);
        }
        let response = self
            .client
            .count(CountPointsBuilder::new(collection).exact(true))
            .await?;
        Ok(response.result.map(|r| r.count).unwrap_or(0) as usize)
    }

    fn kind(&self) -> &'static str {
        "qdrant"
    }
}

fn extract_vector_size(info: &GetCollectionInfoResponse) -> Option<u64> {
    let result = info.result.as_ref()?;
    let config = result.config.as_ref()?;
    let params = config.params.as_ref()?;
    let vectors_config = params.vectors_config.as_ref()?;

    match vectors_config.config.as_ref()? {
        qdrant_client::qdrant::vectors_config::Config::Params(params) => Some(params.size),
        // Named vectors are never created by docqa
        qdrant_client::qdrant::vectors_config::Config::ParamsMap(_) => None,
    }
}

fn take_string(payload: &mut serde_json::Map<String, Value>, key: &str) -> String {
    match payload.remove(key) {
        Some(Value::String(s)) => s,
        _ => String::new(),
    }
}

/// Convert PointId to string
fn point_id_to_string(id: Option<PointId>) -> String {
    match id {
        Some(PointId {
            point_id_options: Some(qdrant_client::qdrant::point_id::PointIdOptions::Uuid(uuid)),
        }) => uuid,
        Some(PointId {
            point_id_options: Some(qdrant_client::qdrant::point_id::PointIdOptions::Num(num)),
        }) => num.to_string(),
        _ => String::new(),
    }
}

/// Convert Qdrant value to serde_json Value
fn json_from_qdrant_value(v: qdrant_client::qdrant::Value) -> Value {
    match v.kind {
        Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::IntegerValue(i)) => Value::Number(i.into()),
        Some(Kind::DoubleValue(d)) => serde_json::Number::from_f64(d)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::ListValue(list)) => Value::Array(
            list.values
                .into_iter()
                .map(json_from_qdrant_value)
                .collect(),
        ),
        Some(Kind::StructValue(s)) => Value::Object(
            s.fields
                .into_iter()
                .map(|(k, v)| (k, json_from_qdrant_value(v)))
                .collect(),
        ),
        None => Value::Null,
    }
}
