use crate::types::{FileId, ProjectId, SymbolId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Spans both SQL schema objects and general-purpose-language constructs —
/// table, view, column, procedure, and dozens more. Listed alphabetically
/// within each rough family.
macro_rules! symbol_kind {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum SymbolKind {
            $($variant),+
        }

        impl SymbolKind {
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

symbol_kind! {
    // SQL / schema objects
    Table => "table",
    View => "view",
    MaterializedView => "materialized_view",
    Column => "column",
    Index => "index",
    PrimaryKey => "primary_key",
    ForeignKey => "foreign_key",
    Constraint => "constraint",
    Procedure => "procedure",
    Function => "function",
    Trigger => "trigger",
    Sequence => "sequence",
    Schema => "schema",
    Synonym => "synonym",
    UserDefinedType => "user_defined_type",
    TableValuedFunction => "table_valued_function",
    Cursor => "cursor",
    Job => "job",

    // Object-oriented / general-purpose language constructs
    Class => "class",
    Interface => "interface",
    AbstractClass => "abstract_class",
    Struct => "struct",
    Enum => "enum",
    EnumMember => "enum_member",
    Method => "method",
    Constructor => "constructor",
    Property => "property",
    Field => "field",
    StaticField => "static_field",
    Parameter => "parameter",
    LocalVariable => "local_variable",
    Module => "module",
    Namespace => "namespace",
    Package => "package",
    TypeAlias => "type_alias",
    GenericTypeParameter => "generic_type_parameter",
    Delegate => "delegate",
    Event => "event",
    Macro => "macro",
    Annotation => "annotation",
    Decorator => "decorator",

    // Web / service surface
    ApiEndpoint => "api_endpoint",
    Controller => "controller",
    Middleware => "middleware",
    RouteGroup => "route_group",

    // ORM / data-access constructs
    OrmMapping => "orm_mapping",
    OrmRepository => "orm_repository",
    OrmMigration => "orm_migration",

    // Classic ASP / templating constructs
    Include => "include",
    ServerPage => "server_page",
    TemplateBlock => "template_block",

    // Delphi / VCL constructs
    Unit => "unit",
    Form => "form",
    DataModule => "data_module",

    // Front-end constructs
    Component => "component",
    Hook => "hook",
    Store => "store",

    // Generic fallbacks
    Variable => "variable",
    Constant => "constant",
    Script => "script",
    ConfigEntry => "config_entry",
    Unknown => "unknown",
}

/// A symbol, or a child of one (table column, class member, ...) via
/// `parent_id`. Rewritten wholesale whenever its file is re-parsed
///.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub project_id: ProjectId,
    pub file_id: FileId,
    pub parent_id: Option<SymbolId>,
    pub kind: SymbolKind,
    pub name: String,
    pub qualified_name: String,
    pub language: String,
    pub start_line: u32,
    pub end_line: u32,
    pub start_col: Option<u16>,
    pub end_col: Option<u16>,
    pub signature: Option<String>,
    pub doc_comment: Option<String>,
    pub metadata: Value,
}

impl Symbol {
    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, SymbolKind::Unknown)
    }
}
