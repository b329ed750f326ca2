use super::*;

fn touch(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, b"x").unwrap();
}

#[test]
fn walk_finds_nested_images_in_name_order() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    touch(&root.join("meta.json"));
    touch(&root.join("sh0.webp"));
    touch(&root.join("means_l.webp"));
    touch(&root.join("deep/a/b/shN_labels.PNG"));
    touch(&root.join("notes.txt"));

    let walk = StillImageWalk::new(root);
    let images = walk.collect_images().unwrap();
    let attrs: Vec<_> = images.iter().map(|i| i.attribute.as_str()).collect();
    // Depth-first, file-name order per directory: "deep" sorts before "means_l.webp".
    assert_eq!(attrs, vec!["shN_labels", "means_l", "sh0"]);
    assert_eq!(images[0].ext, "png");
    assert!(images[0].path.ends_with("deep/a/b/shN_labels.PNG"));
}

#[test]
fn walk_is_restartable() {
    let tmp = tempfile::tempdir().unwrap();
    touch(&tmp.path().join("quats.webp"));

    let walk = StillImageWalk::new(tmp.path());
    let first: Vec<_> = walk.iter().map(|r| r.unwrap()).collect();
    let second: Vec<_> = walk.iter().map(|r| r.unwrap()).collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
}

#[test]
fn walk_of_missing_root_reports_error() {
    let tmp = tempfile::tempdir().unwrap();
    let walk = StillImageWalk::new(tmp.path().join("missing"));
    assert!(walk.collect_images().is_err());
}

#[test]
fn find_inputs_filters_by_extension_and_sorts_by_relative_id() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    touch(&root.join("b.ply"));
    touch(&root.join("a/z.PLY"));
    touch(&root.join("a/readme.md"));
    touch(&root.join("c.spz"));

    let exts = vec!["ply".to_string()];
    let found = find_inputs(root, &exts).unwrap();
    let ids: Vec<_> = found.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["a/z.PLY", "b.ply"]);
}

#[test]
fn find_inputs_accepts_single_file() {
    let tmp = tempfile::tempdir().unwrap();
    let file = tmp.path().join("only.ply");
    touch(&file);
    let found = find_inputs(&file, &["ply".to_string()]).unwrap();
    assert_eq!(found, vec![("only.ply".to_string(), file)]);
}
