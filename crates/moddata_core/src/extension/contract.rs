//! Scope contracts implemented by participating mods.
//!
//! # Responsibility
//! - Define the raw per-scope contract the registry drives (`ScopeData`).
//! - Provide the typed cell mods use to own their data (`DataSlot<T>`).
//! - Define the capability query answered at discovery time (`DataMod`).
//!
//! # Invariants
//! - `write_data` is only called after `has_data` returned `true`.
//! - `read_data(None)` resets in-memory state to "no data".
//! - A failed `read_data(Some(..))` leaves state unchanged; the caller resets.
//! - The registry only ever sees `dyn ScopeData`, never the mod's type.

use crate::model::scope::DataScope;
use crate::storage::codec::{self, CodecResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{Debug, Formatter};
use std::io::{Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Raw persistence contract for one scope of one mod.
///
/// Implement this directly only when full control over the byte format is
/// needed; `DataSlot<T>` covers typical JSON data.
pub trait ScopeData: Send + Sync {
    /// `true` when there is an in-memory value worth persisting.
    fn has_data(&self) -> bool;

    /// Serializes the current value.
    fn write_data(&self, out: &mut dyn Write) -> CodecResult<()>;

    /// Replaces the current value; `None` means no fragment exists.
    fn read_data(&self, input: Option<&mut dyn Read>) -> CodecResult<()>;

    /// Diagnostic name of the stored type, used in logs.
    fn data_type(&self) -> &'static str {
        "raw"
    }
}

/// Shared, typed in-memory value for one scope.
///
/// Mods keep an `Arc<DataSlot<T>>` and hand a clone to the registry through
/// `DataMod`; both sides observe the same value.
pub struct DataSlot<T> {
    value: Mutex<Option<T>>,
}

impl<T> DataSlot<T> {
    pub fn new() -> Self {
        Self {
            value: Mutex::new(None),
        }
    }

    pub fn with_value(value: T) -> Self {
        Self {
            value: Mutex::new(Some(value)),
        }
    }

    /// Convenience constructor for the common `Arc` case.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn set(&self, value: T) {
        *self.lock() = Some(value);
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }

    pub fn take(&self) -> Option<T> {
        self.lock().take()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_none()
    }

    /// Runs `f` against the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        f(self.lock().as_ref())
    }

    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        // A panic inside `with` must not make the data unreachable.
        self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> DataSlot<T> {
    pub fn get(&self) -> Option<T> {
        self.lock().clone()
    }
}

impl<T> Default for DataSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Debug> Debug for DataSlot<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSlot")
            .field("value", &*self.lock())
            .finish()
    }
}

impl<T> ScopeData for DataSlot<T>
where
    T: Serialize + DeserializeOwned + Send,
{
    fn has_data(&self) -> bool {
        !self.is_empty()
    }

    fn write_data(&self, out: &mut dyn Write) -> CodecResult<()> {
        match self.lock().as_ref() {
            Some(value) => codec::encode(out, value),
            None => Ok(()),
        }
    }

    fn read_data(&self, input: Option<&mut dyn Read>) -> CodecResult<()> {
        let decoded = codec::decode::<T, _>(input)?;
        *self.lock() = decoded;
        Ok(())
    }

    fn data_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Capability query answered by every discovered mod instance.
///
/// Each scope is optional and independent of the others. The required marker
/// is `None` when the mod does not declare it at all.
pub trait DataMod: Send + Sync {
    fn profile_data(&self) -> Option<Arc<dyn ScopeData>> {
        None
    }

    fn global_data(&self) -> Option<Arc<dyn ScopeData>> {
        None
    }

    fn save_data(&self) -> Option<Arc<dyn ScopeData>> {
        None
    }

    fn once_save_data(&self) -> Option<Arc<dyn ScopeData>> {
        None
    }

    /// `Some(true)` marks saves that reference this mod as unloadable
    /// without it.
    fn required(&self) -> Option<bool> {
        None
    }

    /// Dispatches to the per-scope accessor.
    fn scope_data(&self, scope: DataScope) -> Option<Arc<dyn ScopeData>> {
        match scope {
            DataScope::Profile => self.profile_data(),
            DataScope::Global => self.global_data(),
            DataScope::Save => self.save_data(),
            DataScope::OnceSave => self.once_save_data(),
        }
    }
}

/// Plain `DataMod` built from explicit handles.
#[derive(Clone, Default)]
pub struct ModScopes {
    pub profile: Option<Arc<dyn ScopeData>>,
    pub global: Option<Arc<dyn ScopeData>>,
    pub save: Option<Arc<dyn ScopeData>>,
    pub once_save: Option<Arc<dyn ScopeData>>,
    pub required: Option<bool>,
}

impl ModScopes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, data: Arc<dyn ScopeData>) -> Self {
        self.profile = Some(data);
        self
    }

    pub fn with_global(mut self, data: Arc<dyn ScopeData>) -> Self {
        self.global = Some(data);
        self
    }

    pub fn with_save(mut self, data: Arc<dyn ScopeData>) -> Self {
        self.save = Some(data);
        self
    }

    pub fn with_once_save(mut self, data: Arc<dyn ScopeData>) -> Self {
        self.once_save = Some(data);
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }
}

impl DataMod for ModScopes {
    fn profile_data(&self) -> Option<Arc<dyn ScopeData>> {
        self.profile.clone()
    }

    fn global_data(&self) -> Option<Arc<dyn ScopeData>> {
        self.global.clone()
    }

    fn save_data(&self) -> Option<Arc<dyn ScopeData>> {
        self.save.clone()
    }

    fn once_save_data(&self) -> Option<Arc<dyn ScopeData>> {
        self.once_save.clone()
    }

    fn required(&self) -> Option<bool> {
        self.required
    }
}

#[cfg(test)]
mod tests {
    use super::{DataMod, DataSlot, ModScopes, ScopeData};
    use crate::model::scope::DataScope;
    use serde::{Deserialize, Serialize};
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Settings {
        volume: u8,
    }

    #[test]
    fn has_data_tracks_slot_contents() {
        let slot = DataSlot::<Settings>::new();
        assert!(!slot.has_data());
        slot.set(Settings { volume: 3 });
        assert!(slot.has_data());
        assert_eq!(slot.take(), Some(Settings { volume: 3 }));
        assert!(!slot.has_data());
    }

    #[test]
    fn read_absent_resets_value() {
        let slot = DataSlot::with_value(Settings { volume: 7 });
        slot.read_data(None).expect("absent read");
        assert!(slot.is_empty());
    }

    #[test]
    fn failed_read_leaves_value_unchanged() {
        let slot = DataSlot::with_value(Settings { volume: 7 });
        let mut raw: &[u8] = b"[1, 2";
        slot.read_data(Some(&mut raw)).expect_err("malformed read");
        assert_eq!(slot.get(), Some(Settings { volume: 7 }));
    }

    #[test]
    fn write_then_read_through_raw_contract() {
        let source = DataSlot::with_value(Settings { volume: 11 });
        let mut buffer = Vec::new();
        source.write_data(&mut buffer).expect("write");

        let target = DataSlot::<Settings>::new();
        let mut input = buffer.as_slice();
        target.read_data(Some(&mut input)).expect("read");
        assert_eq!(target.get(), Some(Settings { volume: 11 }));
        assert!(target.data_type().ends_with("Settings"));
    }

    #[test]
    fn mod_scopes_dispatch_by_scope() {
        let save: Arc<DataSlot<Settings>> = DataSlot::shared();
        let scopes = ModScopes::new().with_save(save.clone()).with_required(true);

        assert!(scopes.scope_data(DataScope::Save).is_some());
        assert!(scopes.scope_data(DataScope::Profile).is_none());
        assert!(scopes.scope_data(DataScope::Global).is_none());
        assert!(scopes.scope_data(DataScope::OnceSave).is_none());
        assert_eq!(scopes.required(), Some(true));

        save.set(Settings { volume: 1 });
        let handle = scopes.scope_data(DataScope::Save).expect("save handle");
        assert!(handle.has_data());
    }
}
