//! Abstract realtime key-value store, the boundary the sync bridge talks to.
//!
//! Paths are slash-separated object keys ("session/students"). Subscribing
//! fires the callback with the current value at the path immediately and
//! again after every write that touches the path or anything under it.
//! Delivery is synchronous on the writer's thread; the whole crate runs
//! single-threaded.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use anyhow::{anyhow, Context};
use serde_json::Value;

pub trait RemoteStore {
    fn subscribe(&self, path: &str, callback: Box<dyn FnMut(&Value)>) -> Subscription;

    /// Replaces the value at `path` wholesale.
    fn overwrite(&self, path: &str, value: Value) -> anyhow::Result<()>;

    /// Merges the top-level keys of `partial` into the object at `path`.
    fn patch(&self, path: &str, partial: Value) -> anyhow::Result<()>;
}

/// Active subscription handle; dropping it unsubscribes.
pub struct Subscription {
    hub: Weak<RefCell<Hub>>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.borrow_mut().subs.retain(|s| s.id != self.id);
        }
    }
}

struct Sub {
    id: u64,
    path: String,
    callback: Rc<RefCell<dyn FnMut(&Value)>>,
}

struct Hub {
    root: Value,
    subs: Vec<Sub>,
    next_id: u64,
}

impl Hub {
    fn new(root: Value) -> Hub {
        Hub {
            root,
            subs: Vec::new(),
            next_id: 1,
        }
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

static NULL: Value = Value::Null;

fn value_at<'a>(root: &'a Value, path: &str) -> &'a Value {
    let mut cur = root;
    for seg in segments(path) {
        match cur.get(seg) {
            Some(v) => cur = v,
            None => return &NULL,
        }
    }
    cur
}

fn slot_at<'a>(root: &'a mut Value, path: &str) -> &'a mut Value {
    let mut cur = root;
    for seg in segments(path) {
        if !cur.is_object() {
            *cur = Value::Object(serde_json::Map::new());
        }
        cur = cur
            .as_object_mut()
            .expect("slot_at parent is an object")
            .entry(seg.to_string())
            .or_insert(Value::Null);
    }
    cur
}

fn apply_overwrite(root: &mut Value, path: &str, value: Value) {
    *slot_at(root, path) = value;
}

fn apply_patch(root: &mut Value, path: &str, partial: &Value) -> anyhow::Result<()> {
    let Some(fields) = partial.as_object() else {
        return Err(anyhow!("patch value must be an object"));
    };
    let slot = slot_at(root, path);
    if !slot.is_object() {
        *slot = Value::Object(serde_json::Map::new());
    }
    let obj = slot.as_object_mut().expect("patch target is an object");
    for (k, v) in fields {
        obj.insert(k.clone(), v.clone());
    }
    Ok(())
}

/// True when one path is the other's ancestor (or they are equal); a write
/// at either then changes what the other observes.
fn paths_overlap(a: &str, b: &str) -> bool {
    let a = segments(a);
    let b = segments(b);
    let shared = a.len().min(b.len());
    a[..shared] == b[..shared]
}

type Delivery = (Rc<RefCell<dyn FnMut(&Value)>>, Value);

fn affected(hub: &Hub, write_path: &str) -> Vec<Delivery> {
    hub.subs
        .iter()
        .filter(|s| paths_overlap(&s.path, write_path))
        .map(|s| (s.callback.clone(), value_at(&hub.root, &s.path).clone()))
        .collect()
}

#[derive(Default)]
struct DeliveryQueue {
    items: VecDeque<Delivery>,
    running: bool,
}

// Callbacks may write back into the store (the bridge's bootstrap does).
// A write issued from inside a callback only enqueues its notifications;
// the outermost dispatch drains them once the current callback returns, so
// a callback is never re-entered.
fn dispatch(queue: &Rc<RefCell<DeliveryQueue>>, new: Vec<Delivery>) {
    {
        let mut q = queue.borrow_mut();
        q.items.extend(new);
        if q.running {
            return;
        }
        q.running = true;
    }
    loop {
        let next = queue.borrow_mut().items.pop_front();
        match next {
            Some((callback, value)) => (callback.borrow_mut())(&value),
            None => {
                queue.borrow_mut().running = false;
                return;
            }
        }
    }
}

fn hub_subscribe(
    hub: &Rc<RefCell<Hub>>,
    queue: &Rc<RefCell<DeliveryQueue>>,
    path: &str,
    callback: Box<dyn FnMut(&Value)>,
) -> Subscription {
    let callback: Rc<RefCell<dyn FnMut(&Value)>> = Rc::new(RefCell::new(callback));
    let (id, initial) = {
        let mut hub_mut = hub.borrow_mut();
        let id = hub_mut.next_id;
        hub_mut.next_id += 1;
        hub_mut.subs.push(Sub {
            id,
            path: path.to_string(),
            callback: callback.clone(),
        });
        (id, value_at(&hub_mut.root, path).clone())
    };
    dispatch(queue, vec![(callback, initial)]);
    Subscription {
        hub: Rc::downgrade(hub),
        id,
    }
}

/// Shared in-memory store. Clones share one value tree, so two bridges on
/// clones of the same store see each other's writes, like two browser tabs
/// on one realtime database.
#[derive(Clone)]
pub struct MemoryStore {
    hub: Rc<RefCell<Hub>>,
    queue: Rc<RefCell<DeliveryQueue>>,
    fail_writes: Rc<RefCell<bool>>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore {
            hub: Rc::new(RefCell::new(Hub::new(Value::Object(serde_json::Map::new())))),
            queue: Rc::new(RefCell::new(DeliveryQueue::default())),
            fail_writes: Rc::new(RefCell::new(false)),
        }
    }

    /// Failure injection: while set, overwrite/patch fail without applying
    /// or notifying.
    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.borrow_mut() = fail;
    }

    pub fn value_at(&self, path: &str) -> Value {
        value_at(&self.hub.borrow().root, path).clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

impl RemoteStore for MemoryStore {
    fn subscribe(&self, path: &str, callback: Box<dyn FnMut(&Value)>) -> Subscription {
        hub_subscribe(&self.hub, &self.queue, path, callback)
    }

    fn overwrite(&self, path: &str, value: Value) -> anyhow::Result<()> {
        if *self.fail_writes.borrow() {
            return Err(anyhow!("injected write failure at {}", path));
        }
        let deliveries = {
            let mut hub = self.hub.borrow_mut();
            apply_overwrite(&mut hub.root, path, value);
            affected(&hub, path)
        };
        dispatch(&self.queue, deliveries);
        Ok(())
    }

    fn patch(&self, path: &str, partial: Value) -> anyhow::Result<()> {
        if *self.fail_writes.borrow() {
            return Err(anyhow!("injected write failure at {}", path));
        }
        let deliveries = {
            let mut hub = self.hub.borrow_mut();
            apply_patch(&mut hub.root, path, &partial)?;
            affected(&hub, path)
        };
        dispatch(&self.queue, deliveries);
        Ok(())
    }
}

/// Store backed by a JSON document on disk, used for standalone daemon runs
/// where no realtime backend is wired up. Cross-process change watching is
/// out of scope; within the process it behaves like [`MemoryStore`].
pub struct FileStore {
    hub: Rc<RefCell<Hub>>,
    queue: Rc<RefCell<DeliveryQueue>>,
    doc_path: PathBuf,
}

impl FileStore {
    pub fn open(doc_path: &Path) -> FileStore {
        let root = match fs::read_to_string(doc_path) {
            Ok(text) => match serde_json::from_str::<Value>(&text) {
                Ok(v) if v.is_object() => v,
                Ok(_) | Err(_) => {
                    tracing::warn!(path = %doc_path.display(), "unreadable store document, starting empty");
                    Value::Object(serde_json::Map::new())
                }
            },
            Err(_) => Value::Object(serde_json::Map::new()),
        };
        FileStore {
            hub: Rc::new(RefCell::new(Hub::new(root))),
            queue: Rc::new(RefCell::new(DeliveryQueue::default())),
            doc_path: doc_path.to_path_buf(),
        }
    }

    fn persist(&self, root: &Value) -> anyhow::Result<()> {
        let text = serde_json::to_string_pretty(root)?;
        fs::write(&self.doc_path, text)
            .with_context(|| format!("write store document {}", self.doc_path.display()))
    }

    // The document on disk is updated before the in-memory tree commits, so
    // a persist failure leaves both sides on the old value.
    fn write_with<F>(&self, path: &str, apply: F) -> anyhow::Result<()>
    where
        F: FnOnce(&mut Value) -> anyhow::Result<()>,
    {
        let deliveries = {
            let mut hub = self.hub.borrow_mut();
            let mut next = hub.root.clone();
            apply(&mut next)?;
            self.persist(&next)?;
            hub.root = next;
            affected(&hub, path)
        };
        dispatch(&self.queue, deliveries);
        Ok(())
    }
}

impl RemoteStore for FileStore {
    fn subscribe(&self, path: &str, callback: Box<dyn FnMut(&Value)>) -> Subscription {
        hub_subscribe(&self.hub, &self.queue, path, callback)
    }

    fn overwrite(&self, path: &str, value: Value) -> anyhow::Result<()> {
        self.write_with(path, |root| {
            apply_overwrite(root, path, value);
            Ok(())
        })
    }

    fn patch(&self, path: &str, partial: Value) -> anyhow::Result<()> {
        self.write_with(path, |root| apply_patch(root, path, &partial))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn subscribe_fires_immediately_with_null_when_absent() {
        let store = MemoryStore::new();
        let seen: Rc<RefCell<Vec<Value>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let _sub = store.subscribe(
            "session",
            Box::new(move |v| sink.borrow_mut().push(v.clone())),
        );
        assert_eq!(seen.borrow().as_slice(), &[Value::Null]);
    }

    #[test]
    fn overwrite_under_subscribed_path_notifies_with_parent_value() {
        let store = MemoryStore::new();
        let seen: Rc<RefCell<Vec<Value>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let _sub = store.subscribe(
            "session",
            Box::new(move |v| sink.borrow_mut().push(v.clone())),
        );

        store
            .overwrite("session/students", json!([{"id": 1}]))
            .expect("overwrite");

        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(seen.borrow()[1], json!({"students": [{"id": 1}]}));
    }

    #[test]
    fn patch_merges_top_level_keys() {
        let store = MemoryStore::new();
        store
            .overwrite("session", json!({"note": "a", "rules": "b"}))
            .expect("overwrite");
        store
            .patch("session", json!({"note": "c"}))
            .expect("patch");
        assert_eq!(
            store.value_at("session"),
            json!({"note": "c", "rules": "b"})
        );
    }

    #[test]
    fn dropped_subscription_stops_receiving() {
        let store = MemoryStore::new();
        let seen: Rc<RefCell<Vec<Value>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let sub = store.subscribe(
            "session",
            Box::new(move |v| sink.borrow_mut().push(v.clone())),
        );
        drop(sub);
        store.overwrite("session", json!({"x": 1})).expect("overwrite");
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn injected_failure_does_not_apply_or_notify() {
        let store = MemoryStore::new();
        let seen: Rc<RefCell<Vec<Value>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let _sub = store.subscribe(
            "session",
            Box::new(move |v| sink.borrow_mut().push(v.clone())),
        );

        store.set_fail_writes(true);
        assert!(store.overwrite("session", json!({"x": 1})).is_err());
        assert_eq!(store.value_at("session"), Value::Null);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn file_store_round_trips_document() {
        let dir = std::env::temp_dir().join(format!(
            "conductd-filestore-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let doc = dir.join("remote.json");

        {
            let store = FileStore::open(&doc);
            store
                .overwrite("session/students", json!([{"id": 1}]))
                .expect("overwrite");
        }
        let reopened = FileStore::open(&doc);
        assert_eq!(
            value_at(&reopened.hub.borrow().root, "session/students"),
            &json!([{"id": 1}])
        );
        let _ = std::fs::remove_dir_all(dir);
    }
}
