//! Mock table storage.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use jiff::Timestamp;
use stratus_core::{CancelHook, Completion, ContinuationToken, Error, ErrorKind, Result};
use stratus_table::{
    ChangeResult, DynamicTableEntity, EntityProperty, MAX_TAKE, SaveChangesResponse, TableClient,
    TableEntity, TableQuery, TableQuerySegment, TableServiceContext, TableServiceQuery,
};

use super::{MockStats, MockStorageConfig, dispatch, lock, segment};

type EntityKey = (String, String);

#[derive(Debug, Default)]
struct TableState {
    exists: bool,
    entities: BTreeMap<EntityKey, DynamicTableEntity>,
    next_version: u64,
}

impl TableState {
    fn require_exists(&self, table: &str) -> Result<()> {
        if self.exists {
            Ok(())
        } else {
            Err(Error::not_found(format!("table `{table}` does not exist")))
        }
    }

    fn store(&mut self, mut entity: DynamicTableEntity) -> String {
        self.next_version += 1;
        let etag = format!("W/\"{}\"", self.next_version);

        entity.timestamp = Some(Timestamp::now());
        entity.etag = Some(etag.clone());
        self.entities
            .insert((entity.partition_key.clone(), entity.row_key.clone()), entity);

        etag
    }

    fn select(&self, query: &TableQuery) -> Result<Vec<DynamicTableEntity>> {
        let conditions = match &query.filter {
            Some(filter) => parse_filter(filter)?,
            None => Vec::new(),
        };

        let mut selected = Vec::new();
        for entity in self.entities.values() {
            if !conditions.iter().all(|condition| condition.matches(entity)) {
                continue;
            }

            let mut entity = entity.clone();
            if let Some(columns) = &query.select {
                entity.properties.retain(|name, _| columns.contains(name));
            }
            selected.push(entity);
        }

        Ok(selected)
    }
}

#[derive(Debug)]
struct Shared {
    name: String,
    config: MockStorageConfig,
    stats: Arc<MockStats>,
    state: Mutex<TableState>,
}

impl Shared {
    fn query(
        &self,
        query: &TableQuery,
        continuation: Option<&ContinuationToken>,
    ) -> Result<TableQuerySegment<DynamicTableEntity>> {
        if let Some(error) = self.stats.record_segment() {
            return Err(error);
        }

        let state = lock(&self.state);
        state.require_exists(&self.name)?;

        let entities = state.select(query)?;
        let size = self.config.segment_size(query.take.unwrap_or(MAX_TAKE));
        let (results, next) = segment(&entities, continuation, size)?;

        Ok(TableQuerySegment::new(results, next))
    }
}

/// In-memory table.
///
/// Clones share the same entities.
#[derive(Debug, Clone)]
pub struct MockTable {
    shared: Arc<Shared>,
}

impl MockTable {
    /// Creates a table that does not exist yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, MockStorageConfig::default())
    }

    /// Creates a table that does not exist yet, using `config`.
    pub fn with_config(name: impl Into<String>, config: MockStorageConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                name: name.into(),
                config,
                stats: Arc::default(),
                state: Mutex::default(),
            }),
        }
    }

    /// Stores an entity directly, creating the table if needed.
    pub fn insert_entity(&self, entity: DynamicTableEntity) {
        let mut state = lock(&self.shared.state);
        state.exists = true;
        state.store(entity);
    }

    /// Returns true once the table has been created.
    pub fn exists(&self) -> bool {
        lock(&self.shared.state).exists
    }

    /// Returns the stored entity with the given keys.
    pub fn get(&self, partition_key: &str, row_key: &str) -> Option<DynamicTableEntity> {
        let key = (partition_key.to_owned(), row_key.to_owned());
        lock(&self.shared.state).entities.get(&key).cloned()
    }

    /// Number of stored entities.
    pub fn len(&self) -> usize {
        lock(&self.shared.state).entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a context whose changes apply to this table.
    pub fn context(&self) -> MockTableServiceContext {
        MockTableServiceContext {
            shared: Arc::clone(&self.shared),
            pending: Arc::default(),
        }
    }

    /// Binds `query` to this table, reading results as `T`.
    pub fn service_query<T>(&self, query: TableQuery) -> MockTableServiceQuery<T> {
        MockTableServiceQuery {
            shared: Arc::clone(&self.shared),
            query,
            _marker: PhantomData,
        }
    }

    /// Counters shared by the table and every handle derived from it.
    pub fn stats(&self) -> &MockStats {
        &self.shared.stats
    }
}

impl TableClient for MockTable {
    fn name(&self) -> &str {
        &self.shared.name
    }

    fn begin_create(&self, done: Completion<()>) -> CancelHook {
        self.shared.stats.record();
        let result = {
            let mut state = lock(&self.shared.state);
            if state.exists {
                Err(Error::new(ErrorKind::Conflict)
                    .with_message(format!("table `{}` already exists", self.shared.name)))
            } else {
                state.exists = true;
                Ok(())
            }
        };

        dispatch(&self.shared.config, &self.shared.stats, done, result)
    }

    fn begin_create_if_not_exists(&self, done: Completion<bool>) -> CancelHook {
        self.shared.stats.record();
        let created = {
            let mut state = lock(&self.shared.state);
            !std::mem::replace(&mut state.exists, true)
        };

        dispatch(&self.shared.config, &self.shared.stats, done, Ok(created))
    }

    fn begin_execute_query_segmented(
        &self,
        query: &TableQuery,
        continuation: Option<ContinuationToken>,
        done: Completion<TableQuerySegment<DynamicTableEntity>>,
    ) -> CancelHook {
        let result = self.shared.query(query, continuation.as_ref());
        dispatch(&self.shared.config, &self.shared.stats, done, result)
    }
}

#[derive(Debug, Clone)]
enum Change {
    Insert(DynamicTableEntity),
    Upsert(DynamicTableEntity),
    Delete(EntityKey),
}

/// Change-tracking context over a [`MockTable`].
#[derive(Debug, Clone)]
pub struct MockTableServiceContext {
    shared: Arc<Shared>,
    pending: Arc<Mutex<Vec<Change>>>,
}

impl MockTableServiceContext {
    /// Tracks an insert; saving fails that operation with 409 if the entity exists.
    pub fn insert(&self, entity: DynamicTableEntity) {
        lock(&self.pending).push(Change::Insert(entity));
    }

    /// Tracks an insert-or-replace.
    pub fn upsert(&self, entity: DynamicTableEntity) {
        lock(&self.pending).push(Change::Upsert(entity));
    }

    /// Tracks a delete; saving fails that operation with 404 if the entity is missing.
    pub fn delete(&self, partition_key: impl Into<String>, row_key: impl Into<String>) {
        lock(&self.pending).push(Change::Delete((partition_key.into(), row_key.into())));
    }
}

impl TableServiceContext for MockTableServiceContext {
    fn pending_changes(&self) -> usize {
        lock(&self.pending).len()
    }

    fn begin_save_changes(&self, done: Completion<SaveChangesResponse>) -> CancelHook {
        self.shared.stats.record();
        let result = {
            let mut state = lock(&self.shared.state);
            state.require_exists(&self.shared.name).map(|()| {
                let changes = std::mem::take(&mut *lock(&self.pending));
                let results = changes
                    .into_iter()
                    .map(|change| apply(&mut state, change))
                    .collect();
                SaveChangesResponse::new(results)
            })
        };

        dispatch(&self.shared.config, &self.shared.stats, done, result)
    }
}

fn apply(state: &mut TableState, change: Change) -> ChangeResult {
    match change {
        Change::Insert(entity) => {
            let key = (entity.partition_key.clone(), entity.row_key.clone());
            if state.entities.contains_key(&key) {
                ChangeResult::new(409, None)
            } else {
                ChangeResult::new(201, Some(state.store(entity)))
            }
        }
        Change::Upsert(entity) => ChangeResult::new(204, Some(state.store(entity))),
        Change::Delete(key) => match state.entities.remove(&key) {
            Some(_) => ChangeResult::new(204, None),
            None => ChangeResult::new(404, None),
        },
    }
}

/// Typed query over a [`MockTable`].
pub struct MockTableServiceQuery<T> {
    shared: Arc<Shared>,
    query: TableQuery,
    _marker: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for MockTableServiceQuery<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTableServiceQuery")
            .field("table", &self.shared.name)
            .field("query", &self.query)
            .finish()
    }
}

impl<T: TableEntity + Send + 'static> TableServiceQuery<T> for MockTableServiceQuery<T> {
    fn begin_execute_segmented(
        &self,
        continuation: Option<ContinuationToken>,
        done: Completion<TableQuerySegment<T>>,
    ) -> CancelHook {
        let result = self
            .shared
            .query(&self.query, continuation.as_ref())
            .and_then(|segment| {
                let results = segment
                    .results
                    .into_iter()
                    .map(T::read_entity)
                    .collect::<Result<_>>()?;
                Ok(TableQuerySegment::new(results, segment.continuation))
            });

        dispatch(&self.shared.config, &self.shared.stats, done, result)
    }
}

/// A single `Property op 'literal'` comparison.
#[derive(Debug, Clone, PartialEq)]
struct Condition {
    property: String,
    operator: String,
    literal: EntityProperty,
}

impl Condition {
    fn matches(&self, entity: &DynamicTableEntity) -> bool {
        let Some(value) = entity.field(&self.property) else {
            return false;
        };

        let ordering = match (&value, &self.literal) {
            (EntityProperty::String(left), EntityProperty::String(right)) => left.cmp(right),
            _ => match (value.as_i64(), self.literal.as_i64()) {
                (Some(left), Some(right)) => left.cmp(&right),
                _ => return false,
            },
        };

        match self.operator.as_str() {
            "eq" => ordering == Ordering::Equal,
            "ne" => ordering != Ordering::Equal,
            "gt" => ordering == Ordering::Greater,
            "ge" => ordering != Ordering::Less,
            "lt" => ordering == Ordering::Less,
            "le" => ordering != Ordering::Greater,
            _ => false,
        }
    }
}

/// Parses conditions joined by `and`.
///
/// Only string and integer literals are understood, and string literals must
/// not contain ` and `.
fn parse_filter(filter: &str) -> Result<Vec<Condition>> {
    filter.split(" and ").map(parse_condition).collect()
}

fn parse_condition(text: &str) -> Result<Condition> {
    let text = text.trim().trim_start_matches('(').trim_end_matches(')').trim();
    let unsupported = || Error::invalid_input(format!("unsupported filter condition `{text}`"));

    let (property, rest) = text.split_once(' ').ok_or_else(unsupported)?;
    let (operator, literal) = rest.trim().split_once(' ').ok_or_else(unsupported)?;
    if !matches!(operator, "eq" | "ne" | "gt" | "ge" | "lt" | "le") {
        return Err(unsupported());
    }

    let literal = literal.trim();
    let literal = match literal.strip_prefix('\'').and_then(|l| l.strip_suffix('\'')) {
        Some(quoted) => EntityProperty::String(quoted.replace("''", "'")),
        None => EntityProperty::Int64(
            literal
                .trim_end_matches('L')
                .parse()
                .map_err(|_| unsupported())?,
        ),
    };

    Ok(Condition {
        property: property.to_owned(),
        operator: operator.to_owned(),
        literal,
    })
}
