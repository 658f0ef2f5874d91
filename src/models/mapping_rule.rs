use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{mapping_rule_assignments, mapping_rules};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttributeFilter {
    pub attribute_type_id: i32,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleFlags {
    pub case_sensitive: Option<bool>,
    pub fuzzy_similarity_threshold: Option<f64>,
    pub semantic_candidate_limit: Option<usize>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = mapping_rules)]
pub struct MappingRule {
    pub id: Uuid,
    pub name: String,
    pub command: String,
    pub pattern: Option<String>,
    pub attribute_filters: serde_json::Value,
    pub flags: serde_json::Value,
    pub ai_flag: bool,
    pub human_flag: bool,
    pub enabled: bool,
}

impl MappingRule {
    pub fn flags(&self) -> RuleFlags {
        serde_json::from_value(self.flags.clone()).unwrap_or_default()
    }

    pub fn attribute_filters(&self) -> Vec<AttributeFilter> {
        serde_json::from_value(self.attribute_filters.clone()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = mapping_rules)]
pub struct NewMappingRule {
    pub id: Uuid,
    pub name: String,
    pub command: String,
    pub pattern: Option<String>,
    pub attribute_filters: serde_json::Value,
    pub flags: serde_json::Value,
    pub ai_flag: bool,
    pub human_flag: bool,
    pub enabled: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = mapping_rule_assignments)]
pub struct MappingRuleAssignment {
    pub id: Uuid,
    pub rule_id: Uuid,
    pub master_node_type_id: i32,
    pub child_node_type_id: i32,
    pub priority: i32,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = mapping_rule_assignments)]
pub struct NewMappingRuleAssignment {
    pub id: Uuid,
    pub rule_id: Uuid,
    pub master_node_type_id: i32,
    pub child_node_type_id: i32,
    pub priority: i32,
}
