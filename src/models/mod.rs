pub mod attribute_type;
pub mod audit_log;
pub mod bronze_row;
pub mod enums;
pub mod load;
pub mod mapping;
pub mod mapping_rule;
pub mod mapping_version;
pub mod matcher_invocation;
pub mod node;
pub mod node_attribute;
pub mod node_type;
pub mod production_mapping;
pub mod taxonomy;
pub mod version;

pub use attribute_type::AttributeType;
pub use audit_log::AuditLog;
pub use bronze_row::BronzeRow;
pub use load::Load;
pub use mapping::Mapping;
pub use mapping_rule::{MappingRule, MappingRuleAssignment};
pub use mapping_version::MappingVersion;
pub use matcher_invocation::MatcherInvocation;
pub use node::Node;
pub use node_attribute::NodeAttribute;
pub use node_type::NodeType;
pub use production_mapping::ProductionMapping;
pub use taxonomy::Taxonomy;
pub use version::TaxonomyVersion;
