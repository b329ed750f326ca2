use super::*;

fn frames(dir: &Path, names: &[&str]) {
    std::fs::create_dir_all(dir).unwrap();
    for n in names {
        std::fs::write(dir.join(n), b"x").unwrap();
    }
}

#[test]
fn contiguous_sequence_scans_in_index_order() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("means");
    frames(
        &dir,
        &["frame_00002.webp", "frame_00000.webp", "frame_00001.webp", "notes.txt"],
    );

    let seq = AttributeSequence::scan("means", &dir).unwrap().unwrap();
    assert_eq!(seq.len(), 3);
    assert_eq!(seq.ext, "webp");
    assert!(seq.frames[0].ends_with("frame_00000.webp"));
    assert!(seq.frames[2].ends_with("frame_00002.webp"));
    assert_eq!(seq.pattern(), dir.join("frame_%05d.webp"));
}

#[test]
fn empty_directory_is_skipped_not_failed() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("shN");
    frames(&dir, &[]);
    assert_eq!(AttributeSequence::scan("shN", &dir).unwrap(), None);
}

#[test]
fn gap_is_a_hard_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("quats");
    frames(&dir, &["frame_00000.png", "frame_00001.png", "frame_00003.png"]);
    let err = AttributeSequence::scan("quats", &dir).unwrap_err();
    assert!(err.to_string().contains("missing frame 2"), "{err}");
}

#[test]
fn sequence_must_start_at_zero() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("quats");
    frames(&dir, &["frame_00001.png"]);
    assert!(AttributeSequence::scan("quats", &dir).is_err());
}

#[test]
fn mixed_formats_are_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("sh0");
    frames(&dir, &["frame_00000.png", "frame_00001.webp"]);
    let err = AttributeSequence::scan("sh0", &dir).unwrap_err();
    assert!(err.to_string().contains("mixes frame formats"));
}

#[test]
fn list_sequence_dirs_is_sorted_and_skips_hidden() {
    let tmp = tempfile::tempdir().unwrap();
    for d in ["shN", "means", ".cache"] {
        std::fs::create_dir_all(tmp.path().join(d)).unwrap();
    }
    std::fs::write(tmp.path().join("README"), b"").unwrap();

    let dirs = list_sequence_dirs(tmp.path()).unwrap();
    let names: Vec<_> = dirs.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["means", "shN"]);
    assert!(list_sequence_dirs(&tmp.path().join("missing")).unwrap().is_empty());
}
