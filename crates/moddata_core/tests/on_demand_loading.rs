use moddata_core::{
    DataManager, DataSlot, DiscoveredMod, ManagerConfig, ManagerError, ModScopes, RegistryError,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;

fn config(root: &Path) -> ManagerConfig {
    ManagerConfig::new(root.join("Modded"), root.join("profile"))
}

fn write_global(root: &Path, id: &str, body: &str) {
    let global = root.join("Modded/Global");
    fs::create_dir_all(&global).unwrap();
    fs::write(global.join(format!("{id}.json.dat")), body).unwrap();
}

#[test]
fn ensure_before_startup_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = DataManager::new(config(dir.path())).unwrap();
    let scopes = ModScopes::new().with_profile(Arc::new(DataSlot::<u32>::new()));

    let err = manager
        .ensure_data_loaded("org.early", &scopes)
        .expect_err("must fail before startup");
    assert!(matches!(err, ManagerError::NotInitialized));
    assert!(!manager.registry().contains("org.early"));
}

#[test]
fn ensure_registers_and_loads_late_mods() {
    let dir = tempfile::tempdir().unwrap();
    let profile_dir = dir.path().join("profile");
    fs::create_dir_all(&profile_dir).unwrap();
    fs::write(profile_dir.join("org.late.json"), "\"dark\"").unwrap();
    write_global(dir.path(), "org.late", "12");

    let mut manager = DataManager::new(config(dir.path())).unwrap();
    manager.on_startup(Vec::<DiscoveredMod>::new());

    let profile: Arc<DataSlot<String>> = DataSlot::shared();
    let global: Arc<DataSlot<u32>> = DataSlot::shared();
    let scopes = ModScopes::new()
        .with_profile(profile.clone())
        .with_global(global.clone());
    manager
        .ensure_data_loaded("org.late", &scopes)
        .expect("late load");

    assert_eq!(profile.get().as_deref(), Some("dark"));
    assert_eq!(global.get(), Some(12));
    let managed = manager.registry().get("org.late").expect("registered");
    assert!(managed.has_loaded_profile_data());
    assert!(managed.has_loaded_global_data());

    // Loaded-once: later edits on disk are not picked up again.
    write_global(dir.path(), "org.late", "99");
    manager.ensure_data_loaded("org.late", &scopes).unwrap();
    assert_eq!(global.get(), Some(12));
}

#[test]
fn ensure_reports_unmanageable_instances() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = DataManager::new(config(dir.path())).unwrap();
    manager.on_startup(Vec::<DiscoveredMod>::new());

    let err = manager
        .ensure_data_loaded("org.bare", &ModScopes::new())
        .expect_err("bare instance cannot be managed");
    assert!(matches!(
        err,
        ManagerError::Registry(RegistryError::NoCapabilities(_))
    ));

    let err = manager
        .ensure_data_loaded("bad/id", &ModScopes::new().with_required(true))
        .expect_err("invalid id");
    assert!(matches!(
        err,
        ManagerError::Registry(RegistryError::InvalidModId(_))
    ));
}

#[test]
fn global_load_waits_for_storage() {
    let dir = tempfile::tempdir().unwrap();
    write_global(dir.path(), "org.cloud", "5");

    let global: Arc<DataSlot<u32>> = DataSlot::shared();
    let scopes = ModScopes::new().with_global(global.clone());
    let mut manager = DataManager::new(config(dir.path()).with_storage_ready(false)).unwrap();
    manager.on_startup([DiscoveredMod::new("org.cloud", Arc::new(scopes))]);
    assert!(global.is_empty());
    assert!(!manager
        .registry()
        .get("org.cloud")
        .unwrap()
        .has_loaded_global_data());

    let summary = manager.set_storage_ready(true);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(global.get(), Some(5));

    let summary = manager.set_storage_ready(true);
    assert_eq!(summary.succeeded, 0);
}

#[test]
fn ensure_leaves_global_pending_until_storage_is_ready() {
    let dir = tempfile::tempdir().unwrap();
    write_global(dir.path(), "org.cloud", "8");

    let global: Arc<DataSlot<u32>> = DataSlot::shared();
    let scopes = ModScopes::new().with_global(global.clone());
    let mut manager = DataManager::new(config(dir.path()).with_storage_ready(false)).unwrap();
    manager.on_startup(Vec::<DiscoveredMod>::new());

    manager.ensure_data_loaded("org.cloud", &scopes).unwrap();
    assert!(global.is_empty());
    assert!(!manager.is_storage_ready());

    manager.set_storage_ready(true);
    assert_eq!(global.get(), Some(8));
    manager.ensure_data_loaded("org.cloud", &scopes).unwrap();
    assert_eq!(global.get(), Some(8));
}

#[test]
fn storage_ready_before_startup_loads_during_startup() {
    let dir = tempfile::tempdir().unwrap();
    write_global(dir.path(), "org.cloud", "4");

    let global: Arc<DataSlot<u32>> = DataSlot::shared();
    let scopes = ModScopes::new().with_global(global.clone());
    let mut manager = DataManager::new(config(dir.path()).with_storage_ready(false)).unwrap();
    let summary = manager.set_storage_ready(true);
    assert_eq!(summary.succeeded, 0);

    manager.on_startup([DiscoveredMod::new("org.cloud", Arc::new(scopes))]);
    assert_eq!(global.get(), Some(4));
}

#[test]
fn quit_skips_global_save_while_storage_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let global: Arc<DataSlot<u32>> = DataSlot::shared();
    let scopes = ModScopes::new().with_global(global.clone());
    let mut manager = DataManager::new(config(dir.path()).with_storage_ready(false)).unwrap();
    manager.on_startup([DiscoveredMod::new("org.cloud", Arc::new(scopes))]);

    global.set(3);
    manager.on_quit();
    assert!(!dir.path().join("Modded/Global/org.cloud.json.dat").exists());
}
