use hunt_overlay::aspect::RectRatio;
use hunt_overlay::catalog::{Category, MapName};
use hunt_overlay::hotkey::{KeybindAction, Keybinding, VK_DELETE};
use hunt_overlay::settings::{self, ConfigStore, TypeState, CONFIG_VERSION, DEFAULT_HIDDEN_POSSIBLE_XP};
use hunt_overlay::style::{Palette, Rgb};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use tempfile::tempdir;

fn read_json(path: &std::path::Path) -> Value {
    let text = std::fs::read_to_string(path).expect("read config");
    serde_json::from_str(&text).expect("parse config")
}

#[test]
fn missing_file_is_created_with_defaults() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("HuntOverlay").join("config.json");
    let store = ConfigStore::new(&path, Palette::default());

    let config = store.load();
    assert_eq!(config, store.defaults());
    assert!(path.exists());

    let saved = read_json(&path);
    assert_eq!(saved["version"], CONFIG_VERSION);
    assert_eq!(saved["settings"]["selected_map"], "Stillwater Bayou");
    assert_eq!(saved["settings"]["keybinds"]["hide_hovered"]["vk"], VK_DELETE);
    for id in DEFAULT_HIDDEN_POSSIBLE_XP {
        assert!(saved["settings"]["hidden"]["possible_xp"]
            .as_array()
            .expect("hidden list")
            .contains(&json!(id)));
    }
    assert!(!dir.path().join("HuntOverlay").join("config.json.tmp").exists());
}

#[test]
fn version_mismatch_and_garbage_are_replaced() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("config.json");
    let store = ConfigStore::new(&path, Palette::default());

    std::fs::write(&path, r#"{"version": "0.9", "settings": {"master_on": false}}"#).expect("write");
    let config = store.load();
    assert!(config.settings.master_on);
    assert_eq!(read_json(&path)["version"], CONFIG_VERSION);

    std::fs::write(&path, "not json at all").expect("write");
    assert_eq!(store.load(), store.defaults());
    assert_eq!(read_json(&path)["version"], CONFIG_VERSION);
}

#[test]
fn replacing_a_stale_version_is_deterministic() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("config.json");
    let store = ConfigStore::new(&path, Palette::default());
    let stale = r#"{"version": "0.1", "settings": {"global_scale": 3.0}}"#;

    std::fs::write(&path, stale).expect("write");
    let first_config = store.load();
    let first = std::fs::read(&path).expect("read first");

    std::fs::write(&path, stale).expect("write");
    let second_config = store.load();
    let second = std::fs::read(&path).expect("read second");

    assert_eq!(first, second);
    assert_eq!(first_config, second_config);
    assert_eq!(first_config, store.defaults());
}

#[test]
fn modified_document_round_trips() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("config.json");
    let store = ConfigStore::new(&path, Palette::default());

    let mut modified = store.load();
    modified.extra.insert("note".into(), json!("kept"));
    modified.settings.selected_map = MapName::MammonsGulch;
    modified.settings.enable_num_switch = false;
    modified.settings.minimize_to_tray = true;
    modified.settings.global_scale = 2.5;
    modified
        .settings
        .keybinds
        .insert(KeybindAction::ToggleOverlay, Keybinding::key(0x70));
    modified.settings.types.insert(
        Category::Beetles,
        TypeState {
            enabled: false,
            color: Rgb::new(1, 2, 3),
        },
    );
    modified
        .settings
        .hidden
        .insert(Category::Spawns, BTreeSet::from(["3:4".to_owned()]));
    modified
        .profiles
        .get_mut("DeSalle")
        .expect("desalle profile")
        .rect_ratio_by_aspect
        .insert(
            "16:9".into(),
            RectRatio {
                rx: 0.125,
                ry: 0.2,
                rw: 0.5,
                rh: 0.7,
            },
        );

    store.save(&modified);
    assert_eq!(store.load(), modified);
}

#[test]
fn unknown_keys_survive_a_save() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("config.json");
    let doc = json!({
        "version": CONFIG_VERSION,
        "note": "kept",
        "profiles": {
            "DeSalle": {
                "rect_ratio_by_aspect": {"16:9": {"rx": 0.1, "ry": 0.1, "rw": 0.5, "rh": 0.8}},
                "comment": "mine"
            }
        },
        "settings": {
            "selected_map": "DeSalle",
            "theme": "dark",
            "keybinds": {"toggle_master": {"vk": "112"}, "future_action": {"vk": 5}},
            "types": {"beetles": {"enabled": false, "color": [1, 2, 3]}},
            "hidden": {"spawns": ["1:2"]}
        }
    });
    std::fs::write(&path, doc.to_string()).expect("write");
    let store = ConfigStore::new(&path, Palette::default());

    let config = store.load();
    assert_eq!(config.settings.selected_map, MapName::DeSalle);
    assert_eq!(config.settings.keybinding(KeybindAction::ToggleMaster).vk, 112);
    assert!(!config.settings.types.get(Category::Beetles).expect("beetles").enabled);
    let ratio = config.rect_ratio(MapName::DeSalle, "16:9").expect("stored ratio");
    assert_eq!(ratio.rw, 0.5);

    store.save(&config);
    let saved = read_json(&path);
    assert_eq!(saved["note"], "kept");
    assert_eq!(saved["settings"]["theme"], "dark");
    assert_eq!(saved["settings"]["keybinds"]["future_action"]["vk"], 5);
    assert_eq!(saved["profiles"]["DeSalle"]["comment"], "mine");
    assert_eq!(saved["settings"]["hidden"]["spawns"], json!(["1:2"]));
    assert_eq!(saved["settings"]["types"]["beetles"]["color"], json!([1, 2, 3]));
}

#[test]
fn reset_overwrites_with_defaults() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("config.json");
    let store = ConfigStore::new(&path, Palette::default());

    let mut config = store.load();
    config.settings.global_scale = 3.0;
    config.settings.enable_num_switch = false;
    store.save(&config);
    assert_eq!(store.load().settings.global_scale, 3.0);

    let reset = store.reset_to_defaults();
    assert_eq!(reset, store.defaults());
    assert_eq!(read_json(&path)["settings"]["global_scale"], 1.0);
}

#[test]
fn debug_flag_can_be_peeked_without_loading() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("config.json");
    assert!(!settings::peek_debug_logging(&path));

    std::fs::write(&path, r#"{"settings": {"debug_logging": true}}"#).expect("write");
    assert!(settings::peek_debug_logging(&path));

    std::fs::write(&path, "{").expect("write");
    assert!(!settings::peek_debug_logging(&path));
}
