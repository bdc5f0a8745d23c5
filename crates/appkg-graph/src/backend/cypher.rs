//! Bolt/Cypher backends.
//!
//! Neo4j and TuGraph share the Bolt client and the MERGE statement; they differ
//! in schema calls and in whether the store takes a batch per call.

use async_trait::async_trait;
use neo4rs::Query;
use tracing::debug;

use appkg_core::AppRecord;

use super::{GraphBackend, WriteMode};
use crate::client::{GraphClient, GraphCounts};
use crate::error::StoreError;
use crate::schema::{self, SchemaDeclaration};
use crate::statements;

/// Schema and write conventions of a Cypher store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Uniqueness constraints, bulk `UNWIND` writes.
    Neo4j,
    /// `db.createVertexLabel` / `db.createEdgeLabel`, one write per row.
    TuGraph,
}

impl Dialect {
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Neo4j => "neo4j",
            Dialect::TuGraph => "tugraph",
        }
    }

    pub fn write_mode(&self) -> WriteMode {
        match self {
            Dialect::Neo4j => WriteMode::Bulk,
            Dialect::TuGraph => WriteMode::PerRow,
        }
    }

    pub fn schema_declarations(&self) -> Vec<SchemaDeclaration> {
        match self {
            Dialect::Neo4j => schema::constraint_declarations(),
            Dialect::TuGraph => schema::label_declarations(),
        }
    }
}

/// A Cypher store reached through a [`GraphClient`].
pub struct CypherBackend {
    client: GraphClient,
    dialect: Dialect,
}

impl CypherBackend {
    pub fn new(client: GraphClient, dialect: Dialect) -> Self {
        Self { client, dialect }
    }
}

#[async_trait]
impl GraphBackend for CypherBackend {
    fn name(&self) -> &'static str {
        self.dialect.name()
    }

    fn write_mode(&self) -> WriteMode {
        self.dialect.write_mode()
    }

    fn schema_declarations(&self) -> Vec<SchemaDeclaration> {
        self.dialect.schema_declarations()
    }

    async fn declare(&self, declaration: &SchemaDeclaration) -> Result<(), StoreError> {
        let statement = declaration.statement();
        debug!(%statement, "Declaring schema object");
        self.client.execute(Query::new(statement)).await
    }

    async fn upsert_batch(&self, rows: &[AppRecord]) -> Result<(), StoreError> {
        self.client.execute(statements::upsert_batch_query(rows)).await
    }

    async fn upsert_row(&self, row: &AppRecord) -> Result<(), StoreError> {
        self.client.execute(statements::upsert_row_query(row)).await
    }

    async fn counts(&self) -> Result<GraphCounts, StoreError> {
        self.client.get_counts().await
    }
}
