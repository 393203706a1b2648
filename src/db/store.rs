//! PostgreSQL-backed raw and modeled sinks.

use std::collections::BTreeMap;

use chrono::Utc;
use diesel::PgConnection;
use diesel::prelude::*;
use diesel::upsert::excluded;
use log::debug;
use serde_json::Value;

use crate::db::models::{NewNode, NewRawRow, NodeRelationRow, NodeRow};
use crate::schema;
use crate::sink::{ModeledSink, Node, NodeApply, NodeRef, RawRow, RawSink, ViewId, WriteError};

pub struct PgStore {
    conn: PgConnection,
}

impl PgStore {
    pub fn new(conn: PgConnection) -> Self {
        PgStore { conn }
    }

    fn attach_relations(&mut self, rows: Vec<NodeRow>) -> Result<Vec<Node>, WriteError> {
        use schema::node_relations::dsl as R;

        let mut ids_by_space: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for row in &rows {
            ids_by_space.entry(&row.space).or_default().push(&row.external_id);
        }
        let mut relations: BTreeMap<(String, String), BTreeMap<String, NodeRef>> = BTreeMap::new();
        for (space, ids) in ids_by_space {
            let links: Vec<NodeRelationRow> = R::node_relations
                .filter(R::space.eq(space))
                .filter(R::source_external_id.eq_any(ids))
                .select(NodeRelationRow::as_select())
                .load(&mut self.conn)?;
            for link in links {
                relations
                    .entry((link.space, link.source_external_id))
                    .or_default()
                    .insert(link.relation, NodeRef::new(&link.target_space, link.target_external_id));
            }
        }

        rows.into_iter()
            .map(|row| {
                let properties = match row.properties {
                    Value::Object(map) => map,
                    other => {
                        return Err(WriteError::Malformed(format!(
                            "node {}/{} has non-object properties: {}",
                            row.space, row.external_id, other
                        )));
                    }
                };
                let relations = relations
                    .remove(&(row.space.clone(), row.external_id.clone()))
                    .unwrap_or_default();
                Ok(Node {
                    view: ViewId::new(&row.view_space, &row.view_external_id, &row.view_version),
                    space: row.space,
                    external_id: row.external_id,
                    properties,
                    relations,
                    updated_at: row.updated_at,
                })
            })
            .collect()
    }
}

/// Keep the last occurrence per key; one upsert statement cannot touch a row twice.
fn last_per_key<'a, K: Ord, T>(items: &'a [T], key: impl Fn(&'a T) -> K) -> Vec<&'a T> {
    let mut latest: BTreeMap<K, &'a T> = BTreeMap::new();
    for item in items {
        latest.insert(key(item), item);
    }
    latest.into_values().collect()
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

impl RawSink for PgStore {
    fn insert_rows(&mut self, database: &str, table: &str, rows: &[RawRow]) -> Result<usize, WriteError> {
        if rows.is_empty() {
            return Ok(0);
        }

        use schema::raw_rows::dsl as R;

        let now = Utc::now();
        let values: Vec<NewRawRow> = last_per_key(rows, |r| r.key.as_str())
            .into_iter()
            .map(|r| NewRawRow {
                database_name: database,
                table_name: table,
                row_key: &r.key,
                payload: Value::Object(r.columns.clone()),
                updated_at: now,
            })
            .collect();

        let written = diesel::insert_into(R::raw_rows)
            .values(&values)
            .on_conflict((R::database_name, R::table_name, R::row_key))
            .do_update()
            .set((R::payload.eq(excluded(R::payload)), R::updated_at.eq(excluded(R::updated_at))))
            .execute(&mut self.conn)?;
        debug!("raw_rows: upserted {} row(s) into {}.{}", written, database, table);
        Ok(written)
    }
}

impl ModeledSink for PgStore {
    fn apply_nodes(&mut self, nodes: &[NodeApply]) -> Result<usize, WriteError> {
        if nodes.is_empty() {
            return Ok(0);
        }

        use schema::node_relations::dsl as R;
        use schema::nodes::dsl as N;

        let now = Utc::now();
        let latest = last_per_key(nodes, |n| (n.space.as_str(), n.external_id.as_str()));
        let rows: Vec<NewNode> = latest
            .iter()
            .map(|n| NewNode {
                space: &n.space,
                external_id: &n.external_id,
                view_space: &n.view.space,
                view_external_id: &n.view.external_id,
                view_version: &n.view.version,
                properties: Value::Object(n.properties.clone()),
                updated_at: now,
            })
            .collect();
        let links: Vec<NodeRelationRow> = latest
            .iter()
            .flat_map(|n| {
                n.relations.iter().map(move |(name, target)| NodeRelationRow {
                    space: n.space.clone(),
                    source_external_id: n.external_id.clone(),
                    relation: name.clone(),
                    target_space: target.space.clone(),
                    target_external_id: target.external_id.clone(),
                })
            })
            .collect();
        let mut ids_by_space: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for n in &latest {
            ids_by_space.entry(&n.space).or_default().push(&n.external_id);
        }

        let written = self.conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let written = diesel::insert_into(N::nodes)
                .values(&rows)
                .on_conflict((N::space, N::external_id))
                .do_update()
                .set((
                    N::view_space.eq(excluded(N::view_space)),
                    N::view_external_id.eq(excluded(N::view_external_id)),
                    N::view_version.eq(excluded(N::view_version)),
                    N::properties.eq(excluded(N::properties)),
                    N::updated_at.eq(excluded(N::updated_at)),
                ))
                .execute(conn)?;

            // Relations are replaced wholesale for every applied node.
            for (space, ids) in &ids_by_space {
                diesel::delete(
                    R::node_relations
                        .filter(R::space.eq(*space))
                        .filter(R::source_external_id.eq_any(ids.iter().copied())),
                )
                .execute(conn)?;
            }
            if !links.is_empty() {
                diesel::insert_into(R::node_relations).values(&links).execute(conn)?;
            }
            Ok(written)
        })?;
        debug!("nodes: applied {} node(s), {} relation(s)", written, links.len());
        Ok(written)
    }

    fn list_nodes(&mut self, view: &ViewId, limit: usize) -> Result<Vec<Node>, WriteError> {
        use schema::nodes::dsl as N;

        let rows: Vec<NodeRow> = N::nodes
            .filter(N::view_space.eq(&view.space))
            .filter(N::view_external_id.eq(&view.external_id))
            .filter(N::view_version.eq(&view.version))
            .order((N::space.asc(), N::external_id.asc()))
            .limit(sql_limit(limit))
            .select(NodeRow::as_select())
            .load(&mut self.conn)?;
        self.attach_relations(rows)
    }

    fn list_linked(
        &mut self,
        view: &ViewId,
        relation: &str,
        target: &NodeRef,
        limit: usize,
    ) -> Result<Vec<Node>, WriteError> {
        use schema::node_relations::dsl as R;
        use schema::nodes::dsl as N;

        let rows: Vec<NodeRow> = N::nodes
            .inner_join(
                R::node_relations.on(R::space
                    .eq(N::space)
                    .and(R::source_external_id.eq(N::external_id))),
            )
            .filter(N::view_space.eq(&view.space))
            .filter(N::view_external_id.eq(&view.external_id))
            .filter(N::view_version.eq(&view.version))
            .filter(R::relation.eq(relation))
            .filter(R::target_space.eq(&target.space))
            .filter(R::target_external_id.eq(&target.external_id))
            .order((N::space.asc(), N::external_id.asc()))
            .limit(sql_limit(limit))
            .select(NodeRow::as_select())
            .load(&mut self.conn)?;
        self.attach_relations(rows)
    }
}
