use crate::types::{ProjectId, SymbolId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The full set of edge kinds the resolver and parsers can emit.
macro_rules! edge_kind {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum EdgeKind {
            $($variant),+
        }

        impl EdgeKind {
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }

            pub fn parse(s: &str) -> Option<Self> {
                match s {
                    $($name => Some(Self::$variant)),+,
                    _ => None,
                }
            }
        }
    };
}

edge_kind! {
    Calls => "calls",
    CallsApi => "calls_api",
    ReadsFrom => "reads_from",
    WritesTo => "writes_to",
    UsesTable => "uses_table",
    UsesColumn => "uses_column",
    Inherits => "inherits",
    Implements => "implements",
    Imports => "imports",
    RoutesTo => "routes_to",
    Transforms => "transforms",
    Joins => "joins",
    DependsOn => "depends_on",
    References => "references",
    BindsTo => "binds_to",
    Overrides => "overrides",
    Instantiates => "instantiates",
    Returns => "returns",
    AcceptsParameter => "accepts_parameter",
    Throws => "throws",
    Annotates => "annotates",
    Includes => "includes",
    ExecutesProcedure => "executes_procedure",
    InvokesTrigger => "invokes_trigger",
    DeclaresConstraint => "declares_constraint",
    IndexesColumn => "indexes_column",
    DefaultsTo => "defaults_to",
    Aliases => "aliases",
    Contains => "contains",
    Emits => "emits",
}

/// Uniqueness key is (source, target, edge_type); duplicate inserts are
/// silently dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolEdge {
    pub project_id: ProjectId,
    pub source_id: SymbolId,
    pub target_id: SymbolId,
    pub kind: EdgeKind,
    pub metadata: Value,
}

impl SymbolEdge {
    pub fn new(project_id: ProjectId, source_id: SymbolId, target_id: SymbolId, kind: EdgeKind) -> Self {
        Self {
            project_id,
            source_id,
            target_id,
            kind,
            metadata: Value::Object(Default::default()),
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        if let Value::Object(map) = &mut self.metadata {
            map.insert("confidence".to_string(), serde_json::json!(confidence));
        }
        self
    }

    pub fn confidence(&self) -> Option<f64> {
        self.metadata.get("confidence").and_then(|v| v.as_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_at_least_twenty_five_kinds() {
        let all = [
            EdgeKind::Calls,
            EdgeKind::CallsApi,
            EdgeKind::ReadsFrom,
            EdgeKind::WritesTo,
            EdgeKind::UsesTable,
            EdgeKind::UsesColumn,
            EdgeKind::Inherits,
            EdgeKind::Implements,
            EdgeKind::Imports,
            EdgeKind::RoutesTo,
            EdgeKind::Transforms,
            EdgeKind::Joins,
            EdgeKind::DependsOn,
            EdgeKind::References,
            EdgeKind::BindsTo,
            EdgeKind::Overrides,
            EdgeKind::Instantiates,
            EdgeKind::Returns,
            EdgeKind::AcceptsParameter,
            EdgeKind::Throws,
            EdgeKind::Annotates,
            EdgeKind::Includes,
            EdgeKind::ExecutesProcedure,
            EdgeKind::InvokesTrigger,
            EdgeKind::DeclaresConstraint,
            EdgeKind::IndexesColumn,
            EdgeKind::DefaultsTo,
            EdgeKind::Aliases,
            EdgeKind::Contains,
            EdgeKind::Emits,
        ];
        assert!(all.len() >= 25);
    }

    #[test]
    fn confidence_roundtrip() {
        let edge = SymbolEdge::new(ProjectId::new(1), SymbolId::new(1), SymbolId::new(2), EdgeKind::Calls)
            .with_confidence(0.85);
        assert_eq!(edge.confidence(), Some(0.85));
    }
}
