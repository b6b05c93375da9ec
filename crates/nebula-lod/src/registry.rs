//! Registry of the resources a scheduler computes LOD requirements for.
//!
//! One entry per provider [`Uuid`]. Each entry owns the subscription to its
//! provider's change stream, so unregistering a resource also disconnects it.

use std::collections::hash_map::Entry as MapEntry;
use std::rc::Rc;

use nebula_scene::{Provider, Subscription};
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::lod_info::LodInfo;

/// Scheduler-side state of one tracked resource.
///
/// The provider is shared with the scene graph and the loaders; the scheduler
/// only references it.
#[derive(Clone, Debug)]
pub struct ResourceInfo {
    data: Rc<Provider>,
    lod_requirement_is_invalid: bool,
    lod_info: LodInfo,
}

impl ResourceInfo {
    fn new(data: Rc<Provider>) -> Self {
        Self {
            data,
            lod_requirement_is_invalid: true,
            lod_info: LodInfo::default(),
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.data.uuid()
    }

    /// The resource's shared property store.
    pub fn data(&self) -> &Rc<Provider> {
        &self.data
    }

    /// Last computed requirement.
    pub fn lod_info(&self) -> LodInfo {
        self.lod_info
    }

    /// Whether the requirement will be recomputed on the next update.
    pub fn lod_requirement_is_invalid(&self) -> bool {
        self.lod_requirement_is_invalid
    }

    /// Force a recomputation on the next update.
    pub fn invalidate_lod_requirement(&mut self) {
        self.lod_requirement_is_invalid = true;
    }

    pub(crate) fn with_lod_info(&self, lod_info: LodInfo) -> Self {
        Self {
            lod_info,
            ..self.clone()
        }
    }
}

struct Entry {
    info: ResourceInfo,
    _property_changed: Subscription,
}

#[derive(Default)]
pub(crate) struct ResourceRegistry {
    entries: FxHashMap<Uuid, Entry>,
}

impl ResourceRegistry {
    /// Register `data`, subscribing with `subscribe` only if it is new.
    ///
    /// Registering an identifier that is already present returns the existing
    /// entry untouched. The boolean is `true` when an entry was created.
    pub(crate) fn register(
        &mut self,
        data: &Rc<Provider>,
        subscribe: impl FnOnce(&Rc<Provider>) -> Subscription,
    ) -> (&mut ResourceInfo, bool) {
        match self.entries.entry(data.uuid()) {
            MapEntry::Occupied(entry) => (&mut entry.into_mut().info, false),
            MapEntry::Vacant(entry) => {
                let subscription = subscribe(data);
                let entry = entry.insert(Entry {
                    info: ResourceInfo::new(Rc::clone(data)),
                    _property_changed: subscription,
                });
                (&mut entry.info, true)
            }
        }
    }

    /// Remove an entry and its subscription. Absent identifiers are ignored.
    pub(crate) fn unregister(&mut self, uuid: &Uuid) -> Option<ResourceInfo> {
        self.entries.remove(uuid).map(|entry| entry.info)
    }

    pub(crate) fn get(&self, uuid: &Uuid) -> Option<&ResourceInfo> {
        self.entries.get(uuid).map(|entry| &entry.info)
    }

    pub(crate) fn get_mut(&mut self, uuid: &Uuid) -> Option<&mut ResourceInfo> {
        self.entries.get_mut(uuid).map(|entry| &mut entry.info)
    }

    pub(crate) fn contains(&self, uuid: &Uuid) -> bool {
        self.entries.contains_key(uuid)
    }

    pub(crate) fn invalidate(&mut self, uuid: &Uuid) -> bool {
        match self.get_mut(uuid) {
            Some(info) => {
                info.invalidate_lod_requirement();
                true
            }
            None => false,
        }
    }

    pub(crate) fn invalidate_all(&mut self) {
        for entry in self.entries.values_mut() {
            entry.info.invalidate_lod_requirement();
        }
    }

    /// Clear every dirty flag and return snapshots of the entries that had one.
    pub(crate) fn take_invalid(&mut self) -> Vec<ResourceInfo> {
        self.entries
            .values_mut()
            .filter(|entry| entry.info.lod_requirement_is_invalid)
            .map(|entry| {
                entry.info.lod_requirement_is_invalid = false;
                entry.info.clone()
            })
            .collect()
    }

    /// Store a newly computed requirement. Returns `false` if the resource
    /// was unregistered in the meantime.
    pub(crate) fn store_lod_info(&mut self, uuid: &Uuid, lod_info: LodInfo) -> bool {
        match self.get_mut(uuid) {
            Some(info) => {
                info.lod_info = lod_info;
                true
            }
            None => false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn uuids(&self) -> Vec<Uuid> {
        self.entries.keys().copied().collect()
    }
}
