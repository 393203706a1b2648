//! Diesel row structs for the raw and modeled stores.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

use crate::schema;

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::raw_rows)]
pub struct NewRawRow<'a> {
    pub database_name: &'a str,
    pub table_name: &'a str,
    pub row_key: &'a str,
    pub payload: Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = schema::nodes)]
pub struct NodeRow {
    pub space: String,
    pub external_id: String,
    pub view_space: String,
    pub view_external_id: String,
    pub view_version: String,
    pub properties: Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::nodes)]
pub struct NewNode<'a> {
    pub space: &'a str,
    pub external_id: &'a str,
    pub view_space: &'a str,
    pub view_external_id: &'a str,
    pub view_version: &'a str,
    pub properties: Value,
    pub updated_at: DateTime<Utc>,
}

/// One named, typed link from a node to another node.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = schema::node_relations)]
pub struct NodeRelationRow {
    pub space: String,
    pub source_external_id: String,
    pub relation: String,
    pub target_space: String,
    pub target_external_id: String,
}
