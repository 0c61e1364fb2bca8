use std::path::Path;
use std::sync::Mutex;

use airflight_core::{RemoteStore, StoreError, StorePath, StoreResult};
use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::info;

/// In-process stand-in for the realtime database, holding the whole tree as one JSON value.
pub struct MemoryStore {
    root: RwLock<Value>,
    push_ids: Mutex<PushIdGenerator>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_data(Value::Object(Map::new()))
    }

    pub fn with_data(root: Value) -> Self {
        Self {
            root: RwLock::new(root),
            push_ids: Mutex::new(PushIdGenerator::default()),
        }
    }

    pub async fn from_seed_file(path: &Path) -> StoreResult<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::Unavailable(format!("{}: {}", path.display(), e)))?;
        let root: Value = serde_json::from_str(&raw)
            .map_err(|e| StoreError::Malformed(format!("{}: {}", path.display(), e)))?;
        info!("Loaded memory store seed from {}", path.display());
        Ok(Self::with_data(root))
    }

    fn next_push_id(&self) -> String {
        let mut ids = self
            .push_ids
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        ids.next(Utc::now().timestamp_millis())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn read(&self, path: &StorePath) -> StoreResult<Value> {
        check_path(path)?;
        let root = self.root.read().await;
        Ok(lookup(&root, path.segments()).cloned().unwrap_or(Value::Null))
    }

    async fn push(&self, path: &StorePath, record: Value) -> StoreResult<String> {
        check_path(path)?;
        let key = self.next_push_id();
        let mut root = self.root.write().await;
        write(&mut root, path.child(key.clone()).segments(), record);
        Ok(key)
    }

    async fn create(&self, path: &StorePath, record: Value) -> StoreResult<bool> {
        check_path(path)?;
        let mut root = self.root.write().await;
        if lookup(&root, path.segments()).is_some_and(|v| !v.is_null()) {
            return Ok(false);
        }
        write(&mut root, path.segments(), record);
        Ok(true)
    }

    async fn remove(&self, path: &StorePath) -> StoreResult<()> {
        check_path(path)?;
        let mut root = self.root.write().await;
        delete(&mut root, path.segments());
        Ok(())
    }
}

fn check_path(path: &StorePath) -> StoreResult<()> {
    match path.invalid_segment() {
        Some(bad) => Err(StoreError::InvalidPath(bad.to_string())),
        None => Ok(()),
    }
}

fn lookup<'a>(node: &'a Value, segments: &[String]) -> Option<&'a Value> {
    segments.iter().try_fold(node, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Turn an array node into an index-keyed object so it can take arbitrary keys.
fn as_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        let map = match node.take() {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .filter(|(_, v)| !v.is_null())
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
            _ => Map::new(),
        };
        *node = Value::Object(map);
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}

fn write(node: &mut Value, segments: &[String], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        *node = value;
        return;
    };
    let child = as_object(node)
        .entry(first.clone())
        .or_insert(Value::Null);
    write(child, rest, value);
}

/// Delete the location and prune parents left empty, as the database does.
fn delete(node: &mut Value, segments: &[String]) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        return true;
    };
    if node.is_array() {
        as_object(node);
    }
    let Value::Object(map) = node else {
        return false;
    };
    let remove_child = match map.get_mut(first) {
        Some(child) => delete(child, rest) || is_empty_node(child),
        None => false,
    };
    if remove_child {
        map.remove(first);
    }
    map.is_empty()
}

fn is_empty_node(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

/// Time-ordered 20-character keys in the database's push-id format:
/// 8 characters of millisecond timestamp followed by 12 random characters,
/// where ids minted in the same millisecond increment the random part.
#[derive(Default)]
struct PushIdGenerator {
    last_millis: i64,
    last_random: [u8; 12],
}

impl PushIdGenerator {
    fn next(&mut self, now_millis: i64) -> String {
        if now_millis == self.last_millis {
            for slot in self.last_random.iter_mut().rev() {
                if *slot == 63 {
                    *slot = 0;
                } else {
                    *slot += 1;
                    break;
                }
            }
        } else {
            self.last_millis = now_millis;
            let mut rng = rand::thread_rng();
            for slot in self.last_random.iter_mut() {
                *slot = rng.gen_range(0..64);
            }
        }

        let mut stamp = [0u8; 8];
        let mut ts = now_millis.max(0);
        for slot in stamp.iter_mut().rev() {
            *slot = PUSH_CHARS[(ts % 64) as usize];
            ts /= 64;
        }

        let mut id = String::with_capacity(20);
        id.extend(stamp.iter().map(|&c| c as char));
        id.extend(self.last_random.iter().map(|&i| PUSH_CHARS[i as usize] as char));
        id
    }
}
