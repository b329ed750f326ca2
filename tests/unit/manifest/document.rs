use super::*;

use crate::catalog::source::{META_FILE_NAME, SourceObject};
use serde_json::json;

fn object(sog: &Path, name: &str, meta: Option<&str>) -> SourceObject {
    let dir = sog.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    let meta_path = dir.join(META_FILE_NAME);
    if let Some(text) = meta {
        std::fs::write(&meta_path, text).unwrap();
    }
    SourceObject {
        original: format!("{name}.ply"),
        name: name.to_string(),
        dir,
        meta_path,
    }
}

#[test]
fn entries_follow_catalog_order_with_frames_and_null_meta() {
    let tmp = tempfile::tempdir().unwrap();
    let sog = tmp.path().join("sog");
    let catalog = SourceCatalog::from_objects(vec![
        object(&sog, "b", Some(r#"{"means":{"files":["means_l.webp"]}}"#)),
        object(&sog, "a", Some(r#"{"means":{"files":["means_l.webp"]}}"#)),
        object(&sog, "c", None),
    ]);

    let manifest = Manifest::assemble(
        &catalog,
        &[Some(FrameIndex(0)), Some(FrameIndex(1)), None],
        "mp4",
    )
    .unwrap();

    let originals: Vec<_> = manifest.splats.iter().map(|e| e.original.as_str()).collect();
    assert_eq!(originals, vec!["a.ply", "b.ply", "c.ply"]);
    assert_eq!(manifest.splats[1].frame, Some(FrameIndex(1)));
    assert_eq!(
        manifest.splats[0].meta,
        Some(json!({"means": {"files": ["means_l.mp4"]}}))
    );
    assert_eq!(manifest.splats[2].frame, None);
    assert_eq!(manifest.splats[2].meta, None);
}

#[test]
fn serialises_frame_and_meta_as_null() {
    let manifest = Manifest {
        splats: vec![ManifestEntry {
            original: "x".to_string(),
            frame: None,
            meta: None,
        }],
    };
    let v: Value = serde_json::from_str(&manifest.to_json_pretty().unwrap()).unwrap();
    assert_eq!(
        v,
        json!({"splats": [{"original": "x", "frame": null, "meta": null}]})
    );
}

#[test]
fn invalid_meta_names_the_object() {
    let tmp = tempfile::tempdir().unwrap();
    let catalog = SourceCatalog::from_objects(vec![object(tmp.path(), "broken", Some("{ nope"))]);
    let err = Manifest::assemble(&catalog, &[Some(FrameIndex(0))], "mp4").unwrap_err();
    assert!(matches!(err, SplatSeqError::Manifest(_)));
    assert!(err.to_string().contains("broken.ply"));
}

#[test]
fn frame_list_must_match_catalog() {
    let tmp = tempfile::tempdir().unwrap();
    let catalog = SourceCatalog::from_objects(vec![object(tmp.path(), "a", None)]);
    assert!(Manifest::assemble(&catalog, &[], "mp4").is_err());
}

#[test]
fn missing_videos_reports_unencoded_attributes() {
    let tmp = tempfile::tempdir().unwrap();
    let videos = tmp.path().join("videos");
    std::fs::create_dir_all(&videos).unwrap();
    std::fs::write(videos.join("means_l.mp4"), b"").unwrap();

    let manifest = Manifest {
        splats: vec![ManifestEntry {
            original: "a".to_string(),
            frame: Some(FrameIndex(0)),
            meta: Some(json!({
                "means": {"files": ["means_l.mp4", "sub/means_u.mp4"]},
                "other": "ignored.mp4"
            })),
        }],
    };
    assert_eq!(
        manifest.missing_videos(&videos, "mp4"),
        vec![videos.join("means_u.mp4")]
    );
}

#[test]
fn write_atomic_leaves_only_the_final_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("videos/manifest.json");
    let manifest = Manifest::default();
    manifest.write_atomic(&path).unwrap();

    let back: Manifest =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(back, manifest);
    let names: Vec<_> = std::fs::read_dir(tmp.path().join("videos"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["manifest.json"]);
}
