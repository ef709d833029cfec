use super::*;
use crate::library::{Track, TrackId};
use crate::store::{KvStore, StoreError, keys};
use serde_json::{Value, json};

fn t(id: &str, title: &str, artist: &str) -> Track {
    Track {
        id: TrackId::from(id),
        title: title.into(),
        artist: artist.into(),
        cover: None,
        source: format!("/music/{id}.mp3").into(),
    }
}

fn catalog() -> Vec<Track> {
    vec![t("a", "Alpha", "X"), t("b", "Beta", "Y"), t("c", "Gamma", "Z")]
}

#[test]
fn bare_identifiers_resolve_to_catalog_tracks_and_unknown_ones_are_dropped() {
    let entries = vec![
        TrackRef::ById("c".into()),
        TrackRef::ById("missing".into()),
        TrackRef::ById("a".into()),
    ];
    let resolved = resolve_entries(&entries, &catalog());
    assert_eq!(resolved, vec![catalog()[2].clone(), catalog()[0].clone()]);
}

#[test]
fn embedded_snapshots_prefer_catalog_by_id_then_title_and_artist() {
    let stale_by_id = t("b", "Old Beta Title", "Y");
    let renamed = t("renamed-c", "Gamma", "Z");
    let unknown = t("u", "Unknown", "Nobody");
    let entries = vec![
        TrackRef::Embedded(stale_by_id),
        TrackRef::Embedded(renamed),
        TrackRef::Embedded(unknown.clone()),
    ];

    let resolved = resolve_entries(&entries, &catalog());
    assert_eq!(resolved[0], catalog()[1]);
    assert_eq!(resolved[1], catalog()[2]);
    assert_eq!(resolved[2], unknown);
}

#[test]
fn mixed_stored_shapes_deserialize() {
    let json = r#"[
        "a",
        17,
        {"id": "b", "title": "Beta", "artist": "Y", "source": "/music/b.mp3"}
    ]"#;
    let entries: Vec<TrackRef> = serde_json::from_str(json).unwrap();
    assert_eq!(entries[0], TrackRef::ById("a".into()));
    assert_eq!(entries[1], TrackRef::ById("17".into()));
    assert!(matches!(&entries[2], TrackRef::Embedded(track) if track.title == "Beta"));
}

#[test]
fn save_list_load_and_delete_round_trip() {
    let mut kv = KvStore::in_memory();
    let mut playlists = PlaylistStore::new(&mut kv, None);
    assert_eq!(playlists.default_name(), "My Playlist 1");

    let saved = playlists.save("  Road trip ", &catalog()[..2]).unwrap();
    assert_eq!(saved.name, "Road trip");
    assert_eq!(playlists.list().len(), 1);
    assert_eq!(playlists.default_name(), "My Playlist 2");

    let loaded = playlists.load(saved.id, &catalog()).unwrap();
    assert_eq!(loaded, catalog()[..2].to_vec());

    assert!(playlists.delete(saved.id).unwrap());
    assert!(!playlists.delete(saved.id).unwrap());
    assert!(playlists.list().is_empty());
    assert!(matches!(
        playlists.load(saved.id, &catalog()),
        Err(PlaylistError::NotFound(_))
    ));
}

#[test]
fn playlist_ids_stay_unique_for_rapid_saves() {
    let mut kv = KvStore::in_memory();
    let mut playlists = PlaylistStore::new(&mut kv, None);
    let a = playlists.save("a", &catalog()).unwrap();
    let b = playlists.save("b", &catalog()).unwrap();
    assert!(b.id > a.id);
}

#[test]
fn saving_an_empty_queue_or_name_is_refused() {
    let mut kv = KvStore::in_memory();
    let mut playlists = PlaylistStore::new(&mut kv, None);
    assert!(matches!(
        playlists.save("x", &[]),
        Err(PlaylistError::EmptyQueue)
    ));
    assert!(matches!(
        playlists.save("   ", &catalog()),
        Err(PlaylistError::EmptyName)
    ));
    assert!(playlists.list().is_empty());
}

#[test]
fn capacity_requires_explicit_replacement() {
    let mut kv = KvStore::in_memory();
    let mut playlists = PlaylistStore::new(&mut kv, Some(2));
    let first = playlists.save("one", &catalog()).unwrap();
    playlists.save("two", &catalog()).unwrap();
    assert!(playlists.is_full());

    assert!(matches!(
        playlists.save("three", &catalog()),
        Err(PlaylistError::Full { limit: 2 })
    ));
    assert_eq!(playlists.list().len(), 2);

    playlists.save_replacing_oldest("three", &catalog()).unwrap();
    let names: Vec<String> = playlists.list().into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["two".to_string(), "three".to_string()]);
    assert!(playlists.get(first.id).is_none());
}

#[test]
fn favorites_add_remove_and_normalize() {
    let mut kv = KvStore::in_memory();
    kv.set(
        keys::FAVORITES,
        &vec![
            TrackRef::ById("gone".into()),
            TrackRef::Embedded(t("c", "Gamma", "Z")),
        ],
    )
    .unwrap();

    let mut favorites = FavoritesStore::new(&mut kv);
    assert!(favorites.add(TrackRef::ById("a".into())).unwrap());
    assert!(!favorites.add(TrackRef::Embedded(catalog()[0].clone())).unwrap());
    assert!(favorites.contains(&TrackId::from("a")));

    let listed = favorites.list(&catalog());
    assert_eq!(listed, vec![catalog()[2].clone(), catalog()[0].clone()]);

    assert!(favorites.remove(&TrackId::from("c")).unwrap());
    assert!(!favorites.remove(&TrackId::from("c")).unwrap());
    assert_eq!(favorites.list(&catalog()), vec![catalog()[0].clone()]);
}

fn names(playlists: &PlaylistStore) -> Vec<String> {
    playlists.list().into_iter().map(|p| p.name).collect()
}

#[test]
fn undecodable_playlists_are_skipped_and_kept_through_writes() {
    let mut kv = KvStore::in_memory();
    kv.set(
        keys::PLAYLISTS,
        &json!([
            {
                "id": 1,
                "name": "Keep me",
                "tracks": ["a", "b"],
                "created_at": "2024-05-01T10:00:00Z"
            },
            {"id": 2, "name": "Broken"}
        ]),
    )
    .unwrap();

    let mut playlists = PlaylistStore::new(&mut kv, None);
    assert_eq!(names(&playlists), vec!["Keep me"]);

    playlists.save("New", &catalog()[..1]).unwrap();
    assert_eq!(names(&playlists), vec!["Keep me", "New"]);
    assert!(playlists.delete(1).unwrap());
    assert_eq!(names(&playlists), vec!["New"]);

    let raw: Vec<Value> = kv.get(keys::PLAYLISTS, Vec::new());
    assert_eq!(raw.len(), 2);
    assert!(raw.iter().any(|v| v["name"] == "Broken"));
}

#[test]
fn bad_track_entries_do_not_hide_their_playlist() {
    let mut kv = KvStore::in_memory();
    kv.set(
        keys::PLAYLISTS,
        &json!([{
            "id": 5,
            "name": "Mixed",
            "tracks": ["a", {"title": "no id"}, "missing", "c"],
            "created_at": "2024-05-01T10:00:00Z"
        }]),
    )
    .unwrap();

    let playlists = PlaylistStore::new(&mut kv, None);
    let loaded = playlists.load(5, &catalog()).unwrap();
    assert_eq!(loaded, vec![catalog()[0].clone(), catalog()[2].clone()]);
}

#[test]
fn camel_case_playlists_with_legacy_tracks_load() {
    let mut kv = KvStore::in_memory();
    kv.set(
        keys::PLAYLISTS,
        &json!([{
            "id": 1714557600000_u64,
            "name": "Road",
            "createdAt": "2024-05-01T10:00:00.000Z",
            "tracks": [
                {
                    "id": 3,
                    "title": "Gamma",
                    "artist": "Z",
                    "audioUrl": "/songs/gamma.mp3",
                    "cover": "/covers/g.jpg"
                },
                {"id": 9, "title": "Elsewhere", "artist": "W", "audioUrl": "/songs/w.mp3"}
            ]
        }]),
    )
    .unwrap();

    let playlists = PlaylistStore::new(&mut kv, None);
    let listed = playlists.list();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].created_at.to_rfc3339(), "2024-05-01T10:00:00+00:00");

    let loaded = playlists.load(1714557600000, &catalog()).unwrap();
    assert_eq!(loaded[0], catalog()[2]);
    assert_eq!(loaded[1].title, "Elsewhere");
    assert_eq!(loaded[1].source, std::path::PathBuf::from("/songs/w.mp3"));
}

#[test]
fn undecodable_favorites_are_skipped_and_kept_through_writes() {
    let mut kv = KvStore::in_memory();
    kv.set(keys::FAVORITES, &json!(["a", {"id": "zz", "title": "Z"}]))
        .unwrap();

    let mut favorites = FavoritesStore::new(&mut kv);
    assert_eq!(favorites.list(&catalog()), vec![catalog()[0].clone()]);

    assert!(favorites.add(TrackRef::ById("b".into())).unwrap());
    assert!(favorites.remove(&TrackId::from("a")).unwrap());
    assert_eq!(favorites.list(&catalog()), vec![catalog()[1].clone()]);

    let raw: Vec<Value> = kv.get(keys::FAVORITES, Vec::new());
    assert_eq!(raw, vec![json!({"id": "zz", "title": "Z"}), json!("b")]);
}

#[test]
fn a_stored_value_that_is_not_a_list_is_never_overwritten() {
    let mut kv = KvStore::in_memory();
    kv.set(keys::FAVORITES, &json!({"a": true})).unwrap();

    let mut favorites = FavoritesStore::new(&mut kv);
    assert!(favorites.entries().is_empty());
    assert!(matches!(
        favorites.add(TrackRef::ById("a".into())),
        Err(PlaylistError::Store(StoreError::NotAList { .. }))
    ));

    assert_eq!(kv.get(keys::FAVORITES, Value::Null), json!({"a": true}));
}
