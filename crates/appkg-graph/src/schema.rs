//! Schema provisioning (constraints and labels).
//!
//! Declarations are applied before any write. "Already exists" counts as
//! success; other failures are logged and the next declaration is tried,
//! except that an edge label whose endpoint vertex label is not in place
//! stops provisioning.

use std::collections::HashSet;

use tracing::{debug, error, info, warn};

use appkg_core::app::{Dimension, APP_KEY, APP_LABEL};

use crate::backend::GraphBackend;
use crate::error::{ProvisionError, StoreError};

/// Property types understood by label-schema stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    String,
    Double,
    Int64,
    Bool,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::String => "STRING",
            PropertyType::Double => "DOUBLE",
            PropertyType::Int64 => "INT64",
            PropertyType::Bool => "BOOL",
        }
    }
}

/// One schema object to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaDeclaration {
    /// Uniqueness constraint on a node label's key.
    Constraint { label: &'static str, key: &'static str },

    /// Vertex label with a primary key and optional properties.
    VertexLabel {
        label: &'static str,
        key: &'static str,
        properties: Vec<(&'static str, PropertyType)>,
    },

    /// Edge label between two vertex labels.
    EdgeLabel {
        relationship: &'static str,
        from: &'static str,
        to: &'static str,
    },
}

impl SchemaDeclaration {
    /// Name used in logs and reports.
    pub fn name(&self) -> String {
        match self {
            Self::Constraint { label, key } => format!("{}_{}", label.to_lowercase(), key),
            Self::VertexLabel { label, .. } => label.to_string(),
            Self::EdgeLabel { relationship, .. } => relationship.to_string(),
        }
    }

    /// The vertex label this declaration makes available, if any.
    pub fn provides(&self) -> Option<&'static str> {
        match self {
            Self::Constraint { label, .. } | Self::VertexLabel { label, .. } => Some(*label),
            Self::EdgeLabel { .. } => None,
        }
    }

    /// Vertex labels that must exist before this declaration.
    pub fn requires(&self) -> Vec<&'static str> {
        match self {
            Self::EdgeLabel { from, to, .. } => vec![*from, *to],
            _ => Vec::new(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Constraint { .. } | Self::VertexLabel { .. } => 0,
            Self::EdgeLabel { .. } => 1,
        }
    }

    /// The statement that creates this object.
    pub fn statement(&self) -> String {
        match self {
            Self::Constraint { label, key } => format!(
                "CREATE CONSTRAINT {} IF NOT EXISTS FOR (n:{}) REQUIRE n.{} IS UNIQUE",
                self.name(),
                label,
                key
            ),
            Self::VertexLabel { label, key, properties } => {
                let mut args = vec![
                    format!("'{}'", label),
                    format!("'{}'", key),
                    format!("'{}'", key),
                    "'STRING'".to_string(),
                    "false".to_string(),
                ];
                for (prop, ty) in properties {
                    args.push(format!("'{}'", prop));
                    args.push(format!("'{}'", ty.as_str()));
                    args.push("true".to_string());
                }
                format!("CALL db.createVertexLabel({})", args.join(", "))
            }
            Self::EdgeLabel { relationship, from, to } => format!(
                "CALL db.createEdgeLabel('{}', '[[\"{}\",\"{}\"]]')",
                relationship, from, to
            ),
        }
    }
}

/// Uniqueness constraints for every node label.
pub fn constraint_declarations() -> Vec<SchemaDeclaration> {
    std::iter::once(SchemaDeclaration::Constraint {
        label: APP_LABEL,
        key: APP_KEY,
    })
    .chain(Dimension::ALL.into_iter().map(|dim| SchemaDeclaration::Constraint {
        label: dim.label(),
        key: dim.key(),
    }))
    .collect()
}

/// Vertex labels with typed properties, then one edge label per relationship.
pub fn label_declarations() -> Vec<SchemaDeclaration> {
    let mut decls = vec![SchemaDeclaration::VertexLabel {
        label: APP_LABEL,
        key: APP_KEY,
        properties: vec![
            ("name", PropertyType::String),
            ("rating", PropertyType::Double),
            ("reviews", PropertyType::Int64),
            ("version", PropertyType::String),
            ("url", PropertyType::String),
            ("price", PropertyType::Double),
            ("free", PropertyType::Bool),
        ],
    }];

    for dim in Dimension::ALL {
        let properties = if dim == Dimension::Developer {
            vec![("id", PropertyType::String), ("url", PropertyType::String)]
        } else {
            Vec::new()
        };
        decls.push(SchemaDeclaration::VertexLabel {
            label: dim.label(),
            key: dim.key(),
            properties,
        });
    }

    for dim in Dimension::ALL {
        decls.push(SchemaDeclaration::EdgeLabel {
            relationship: dim.relationship(),
            from: APP_LABEL,
            to: dim.label(),
        });
    }

    decls
}

/// Outcome of a provisioning pass.
#[derive(Debug, Clone, Default)]
pub struct ProvisionReport {
    pub created: usize,
    pub existing: usize,
    pub failed: Vec<(String, StoreError)>,
}

/// Applies a backend's schema declarations.
pub struct SchemaProvisioner<'a, B: GraphBackend + ?Sized> {
    backend: &'a B,
}

impl<'a, B: GraphBackend + ?Sized> SchemaProvisioner<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Ensure every declaration exists. Safe to run repeatedly.
    pub async fn provision(&self) -> Result<ProvisionReport, ProvisionError> {
        let mut decls = self.backend.schema_declarations();
        decls.sort_by_key(SchemaDeclaration::rank);

        info!(backend = self.backend.name(), declarations = decls.len(), "Provisioning schema");

        let mut report = ProvisionReport::default();
        let mut ready: HashSet<&'static str> = HashSet::new();

        for decl in &decls {
            let name = decl.name();

            if let Some(missing) = decl.requires().into_iter().find(|label| !ready.contains(label)) {
                error!(edge = %name, label = missing, "Edge label references an undeclared vertex label");
                return Err(ProvisionError::MissingVertexLabel {
                    edge: name,
                    label: missing.to_string(),
                });
            }

            match self.backend.declare(decl).await {
                Ok(()) => {
                    debug!(declaration = %name, "Created");
                    report.created += 1;
                }
                Err(StoreError::AlreadyExists(_)) => {
                    debug!(declaration = %name, "Already exists");
                    report.existing += 1;
                }
                Err(StoreError::MissingLabel(msg)) if !decl.requires().is_empty() => {
                    error!(edge = %name, error = %msg, "Store rejected edge label");
                    return Err(ProvisionError::MissingVertexLabel { edge: name, label: msg });
                }
                Err(e) if e.is_fatal() => {
                    error!(declaration = %name, error = %e, "Store lost during provisioning");
                    return Err(ProvisionError::Store(e));
                }
                Err(e) => {
                    warn!(declaration = %name, error = %e, "Schema declaration failed, continuing");
                    report.failed.push((name, e));
                    continue;
                }
            }

            if let Some(label) = decl.provides() {
                ready.insert(label);
            }
        }

        info!(
            created = report.created,
            existing = report.existing,
            failed = report.failed.len(),
            "Schema ready"
        );
        Ok(report)
    }
}
