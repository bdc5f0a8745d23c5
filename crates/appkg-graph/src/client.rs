//! Bolt connection client.

use std::collections::BTreeMap;

use neo4rs::{ConfigBuilder, Graph, Query};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::backend::BackendKind;
use crate::error::StoreError;

/// Configuration for connecting to the graph store.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub backend: BackendKind,
    pub max_connections: usize,
    pub fetch_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://127.0.0.1:7687".to_string(),
            user: "neo4j".to_string(),
            password: String::new(),
            database: "neo4j".to_string(),
            backend: BackendKind::Neo4j,
            max_connections: 4,
            fetch_size: 200,
        }
    }
}

/// Client for graph store operations.
///
/// Owns the connection pool for a whole run; the pool is released when the
/// client is dropped.
pub struct GraphClient {
    graph: Graph,
    uri: String,
}

impl GraphClient {
    /// Create a new GraphClient from config.
    ///
    /// neo4rs creates its pool lazily, so a `RETURN 1` ping runs immediately
    /// to surface unreachable stores and bad credentials before any write.
    pub async fn connect(config: &GraphConfig) -> Result<Self, StoreError> {
        let neo4j_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .db(config.database.as_str())
            .max_connections(config.max_connections)
            .fetch_size(config.fetch_size)
            .build()?;

        let graph = Graph::connect(neo4j_config).await?;

        graph.run(Query::new("RETURN 1".to_string())).await?;

        info!(uri = %config.uri, database = %config.database, "Connected to graph store");
        Ok(Self {
            graph,
            uri: config.uri.clone(),
        })
    }

    /// Execute a Cypher statement that returns no results.
    pub async fn execute(&self, query: Query) -> Result<(), StoreError> {
        self.graph.run(query).await?;
        Ok(())
    }

    /// Execute a Cypher query and return results as rows.
    pub async fn query(&self, query: Query) -> Result<Vec<neo4rs::Row>, StoreError> {
        let mut result = self.graph.execute(query).await?;

        let mut rows = Vec::new();
        while let Some(row) = result.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Execute a Cypher query and return a single scalar value.
    pub async fn query_scalar<T: DeserializeOwned>(&self, query: Query, field: &str) -> Result<Option<T>, StoreError> {
        let rows = self.query(query).await?;
        match rows.into_iter().next() {
            Some(row) => row
                .get(field)
                .map(Some)
                .map_err(|e| StoreError::Rejected(format!("Failed to get field '{}': {:?}", field, e))),
            None => Ok(None),
        }
    }

    /// Run an arbitrary read query and return every row's values as text.
    pub async fn query_values(&self, cypher: &str) -> Result<Vec<Vec<String>>, StoreError> {
        let rows = self.query(Query::new(cypher.to_string())).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let keys: Vec<String> = row.keys().into_iter().map(|k| k.value).collect();
                match row.to::<BTreeMap<String, serde_json::Value>>() {
                    Ok(fields) => ordered_values(&keys, fields),
                    Err(_) => vec![format!("{:?}", row)],
                }
            })
            .collect())
    }

    /// Get node and relationship counts for status display.
    pub async fn get_counts(&self) -> Result<GraphCounts, StoreError> {
        let node_query = Query::new("MATCH (n) RETURN count(n) as count".to_string());
        let rel_query = Query::new("MATCH ()-[r]->() RETURN count(r) as count".to_string());

        let node_count: i64 = self.query_scalar(node_query, "count").await?.unwrap_or(0);
        let rel_count: i64 = self.query_scalar(rel_query, "count").await?.unwrap_or(0);

        Ok(GraphCounts {
            nodes: node_count as usize,
            relationships: rel_count as usize,
        })
    }

    /// URI this client is connected to.
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

impl Drop for GraphClient {
    fn drop(&mut self) {
        debug!(uri = %self.uri, "Releasing graph store connection");
    }
}

/// Row values in RETURN order.
fn ordered_values(keys: &[String], mut fields: BTreeMap<String, serde_json::Value>) -> Vec<String> {
    keys.iter()
        .filter_map(|key| fields.remove(key))
        .map(value_text)
        .collect()
}

fn value_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Node and relationship counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphCounts {
    pub nodes: usize,
    pub relationships: usize,
}
