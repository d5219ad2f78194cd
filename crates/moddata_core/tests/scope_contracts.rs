use moddata_core::storage::CodecResult;
use moddata_core::{
    DataPaths, DataSlot, LoadOutcome, ManagedMod, ModScopes, SaveOutcome, ScopeData, SlotIndex,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{Read, Write};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
enum Unlock {
    Charm { name: String, notches: u8 },
    Spell { name: String, level: u8 },
    Map,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Journal {
    unlocks: Vec<Unlock>,
    counters: BTreeMap<String, i64>,
    title: Option<String>,
}

fn journal() -> Journal {
    Journal {
        unlocks: vec![
            Unlock::Charm {
                name: "quick focus".to_string(),
                notches: 3,
            },
            Unlock::Spell {
                name: "shade soul".to_string(),
                level: 2,
            },
            Unlock::Map,
        ],
        counters: BTreeMap::from([("deaths".to_string(), 41), ("geo".to_string(), -2)]),
        title: None,
    }
}

fn paths(dir: &tempfile::TempDir) -> DataPaths {
    DataPaths::new(dir.path().join("Modded"), dir.path().join("profile"))
}

/// Line-oriented format implemented on the raw contract.
#[derive(Default)]
struct RawLines {
    lines: Mutex<Option<Vec<String>>>,
}

impl ScopeData for RawLines {
    fn has_data(&self) -> bool {
        self.lines.lock().unwrap().is_some()
    }

    fn write_data(&self, out: &mut dyn Write) -> CodecResult<()> {
        if let Some(lines) = self.lines.lock().unwrap().as_ref() {
            out.write_all(lines.join("\n").as_bytes())?;
        }
        Ok(())
    }

    fn read_data(&self, input: Option<&mut dyn Read>) -> CodecResult<()> {
        let value = match input {
            Some(reader) => {
                let mut raw = String::new();
                reader.read_to_string(&mut raw)?;
                Some(raw.lines().map(str::to_string).collect())
            }
            None => None,
        };
        *self.lines.lock().unwrap() = value;
        Ok(())
    }
}

#[test]
fn polymorphic_values_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let paths = paths(&dir);
    let slot = SlotIndex::new(1).unwrap();

    let writer: Arc<DataSlot<Journal>> = Arc::new(DataSlot::with_value(journal()));
    let managed = ManagedMod::try_create("org.journal", &ModScopes::new().with_save(writer))
        .expect("create");
    assert_eq!(managed.save_save_data(&paths, slot), SaveOutcome::Saved);

    let reader: Arc<DataSlot<Journal>> = DataSlot::shared();
    let scopes = ModScopes::new().with_save(reader.clone());
    let managed = ManagedMod::try_create("org.journal", &scopes).expect("create");
    assert_eq!(managed.load_save_data(&paths, slot), LoadOutcome::Loaded);
    assert_eq!(reader.get(), Some(journal()));

    let raw = fs::read_to_string(paths.save_data_dir(slot).join("org.journal.json.dat")).unwrap();
    assert!(raw.contains("\"kind\": \"Charm\""));
}

#[test]
fn raw_contract_controls_its_own_format() {
    let dir = tempfile::tempdir().unwrap();
    let paths = paths(&dir);
    let data = Arc::new(RawLines::default());
    *data.lines.lock().unwrap() = Some(vec!["one".to_string(), "two".to_string()]);

    let scopes = ModScopes::new().with_profile(data.clone());
    let mut managed = ManagedMod::try_create("org.raw", &scopes).expect("create");
    assert_eq!(managed.save_profile_data(&paths), SaveOutcome::Saved);
    assert_eq!(
        fs::read_to_string(dir.path().join("profile/org.raw.json")).unwrap(),
        "one\ntwo"
    );

    *data.lines.lock().unwrap() = None;
    assert_eq!(managed.load_profile_data(&paths), LoadOutcome::Loaded);
    assert_eq!(
        data.lines.lock().unwrap().clone(),
        Some(vec!["one".to_string(), "two".to_string()])
    );
    assert_eq!(managed.load_profile_data(&paths), LoadOutcome::AlreadyLoaded);
}

#[test]
fn scopes_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    let paths = paths(&dir);
    let slot = SlotIndex::new(2).unwrap();
    let global: Arc<DataSlot<u32>> = Arc::new(DataSlot::with_value(1));
    let save: Arc<DataSlot<u32>> = Arc::new(DataSlot::with_value(2));

    let mut managed = ManagedMod::try_create(
        "org.split",
        &ModScopes::new().with_global(global.clone()).with_save(save.clone()),
    )
    .expect("create");
    assert_eq!(managed.save_profile_data(&paths), SaveOutcome::Unsupported);
    assert_eq!(managed.save_once_save_data(&paths, slot), SaveOutcome::Unsupported);
    assert_eq!(managed.save_global_data(&paths), SaveOutcome::Saved);
    assert_eq!(managed.save_save_data(&paths, slot), SaveOutcome::Saved);

    assert!(paths.global_data_dir().join("org.split.json.dat").is_file());
    assert!(paths.save_data_dir(slot).join("org.split.json.dat").is_file());
    assert!(!paths.once_save_data_dir(slot).exists());

    global.clear();
    assert_eq!(managed.load_global_data(&paths), LoadOutcome::Loaded);
    assert_eq!(global.get(), Some(1));
    assert_eq!(managed.load_profile_data(&paths), LoadOutcome::Unsupported);
}
