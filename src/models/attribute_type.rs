use diesel::prelude::*;

use crate::schema::attribute_types;

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = attribute_types)]
pub struct AttributeType {
    pub id: i32,
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = attribute_types)]
pub struct NewAttributeType {
    pub name: String,
    pub status: String,
}

impl NewAttributeType {
    pub fn create(name: impl Into<String>) -> NewAttributeType {
        NewAttributeType {
            name: name.into(),
            status: crate::models::enums::Status::Active.as_str().to_string(),
        }
    }
}
