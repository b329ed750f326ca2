use std::sync::Mutex;

use super::*;

/// Writes `meta.json` plus one image per attribute; fails for identifiers in `fail`.
struct FakeConverter {
    attributes: Vec<&'static str>,
    fail: Vec<&'static str>,
    calls: Mutex<Vec<String>>,
}

impl FakeConverter {
    fn new(attributes: Vec<&'static str>) -> Self {
        Self {
            attributes,
            fail: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl Converter for FakeConverter {
    fn convert(&self, object: &str, _input: &Path, meta_out: &Path) -> SplatSeqResult<()> {
        self.calls.lock().unwrap().push(object.to_string());
        if self.fail.iter().any(|f| *f == object) {
            return Err(SplatSeqError::conversion(object, "exit status: 1"));
        }
        let dir = meta_out.parent().unwrap();
        std::fs::write(meta_out, b"{}").unwrap();
        for attr in &self.attributes {
            std::fs::write(dir.join(format!("{attr}.webp")), b"x").unwrap();
        }
        Ok(())
    }
}

fn pool() -> rayon::ThreadPool {
    rayon::ThreadPoolBuilder::new()
        .num_threads(2)
        .build()
        .unwrap()
}

fn inputs(dir: &Path, names: &[&str]) {
    for n in names {
        let p = dir.join(n);
        std::fs::create_dir_all(p.parent().unwrap()).unwrap();
        std::fs::write(p, b"ply").unwrap();
    }
}

#[test]
fn convert_orders_objects_by_identifier() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("in");
    inputs(&input, &["c.ply", "a.ply", "b.ply"]);
    let cfg = PipelineConfig::new(tmp.path().join("out")).with_input(&input);

    let conv = FakeConverter::new(vec!["means", "shN"]);
    let catalog = SourceCatalog::convert(&cfg, &conv, &pool()).unwrap();

    let ids: Vec<_> = catalog.objects().iter().map(|o| o.original.as_str()).collect();
    assert_eq!(ids, vec!["a.ply", "b.ply", "c.ply"]);
    for obj in catalog.objects() {
        assert!(obj.has_meta());
        assert_eq!(obj.images().collect_images().unwrap().len(), 2);
    }
    assert_eq!(conv.calls.lock().unwrap().len(), 3);
}

#[test]
fn same_stem_collisions_get_numeric_suffixes() {
    let tmp = tempfile::tempdir().unwrap();
    let sog = tmp.path().join("sog");
    std::fs::create_dir_all(sog.join("scan")).unwrap();

    let list = vec![
        ("a/scan.ply".to_string(), PathBuf::from("a/scan.ply")),
        ("b/scan.ply".to_string(), PathBuf::from("b/scan.ply")),
    ];
    let reserved = reserve_object_dirs(&sog, &list, false).unwrap();
    let names: Vec<_> = reserved.iter().map(|(o, _)| o.name.as_str()).collect();
    assert_eq!(names, vec!["scan_1", "scan_2"]);
    // The pre-existing directory is left alone.
    assert!(sog.join("scan").is_dir());
}

#[test]
fn overwrite_clears_existing_output_but_still_suffixes_in_run_collisions() {
    let tmp = tempfile::tempdir().unwrap();
    let sog = tmp.path().join("sog");
    std::fs::create_dir_all(sog.join("scan")).unwrap();
    std::fs::write(sog.join("scan/stale.webp"), b"old").unwrap();

    let list = vec![
        ("a/scan.ply".to_string(), PathBuf::from("a/scan.ply")),
        ("b/scan.ply".to_string(), PathBuf::from("b/scan.ply")),
    ];
    let reserved = reserve_object_dirs(&sog, &list, true).unwrap();
    let names: Vec<_> = reserved.iter().map(|(o, _)| o.name.as_str()).collect();
    assert_eq!(names, vec!["scan", "scan_1"]);
    assert!(!sog.join("scan/stale.webp").exists());
}

#[test]
fn abort_policy_reports_failing_identifier() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("in");
    inputs(&input, &["a.ply", "b.ply"]);
    let cfg = PipelineConfig::new(tmp.path().join("out")).with_input(&input);

    let mut conv = FakeConverter::new(vec!["means"]);
    conv.fail = vec!["b.ply"];
    let err = SourceCatalog::convert(&cfg, &conv, &pool()).unwrap_err();
    assert!(err.to_string().contains("b.ply"));
}

#[test]
fn skip_policy_drops_failed_inputs() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("in");
    inputs(&input, &["a.ply", "b.ply"]);
    let mut cfg = PipelineConfig::new(tmp.path().join("out")).with_input(&input);
    cfg.converter.on_failure = ConvertFailurePolicy::Skip;

    let mut conv = FakeConverter::new(vec!["means"]);
    conv.fail = vec!["a.ply"];
    let catalog = SourceCatalog::convert(&cfg, &conv, &pool()).unwrap();
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.objects()[0].original, "b.ply");
    assert!(!tmp.path().join("out/sog/a").exists());
}

#[test]
fn no_inputs_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("in");
    inputs(&input, &["notes.txt"]);
    let cfg = PipelineConfig::new(tmp.path().join("out")).with_input(&input);
    let err = SourceCatalog::convert(&cfg, &FakeConverter::new(vec![]), &pool()).unwrap_err();
    assert!(matches!(err, SplatSeqError::Validation(_)));
}

#[test]
fn from_existing_orders_directories_lexicographically() {
    let tmp = tempfile::tempdir().unwrap();
    let sog = tmp.path().join("sog");
    for name in ["objectB", "objectA"] {
        std::fs::create_dir_all(sog.join(name)).unwrap();
    }
    std::fs::write(sog.join("stray.txt"), b"").unwrap();
    std::fs::write(sog.join("objectA/meta.json"), b"{}").unwrap();

    let catalog = SourceCatalog::from_existing(&sog).unwrap();
    let names: Vec<_> = catalog.objects().iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["objectA", "objectB"]);
    assert!(catalog.objects()[0].has_meta());
    assert!(!catalog.objects()[1].has_meta());
}

#[test]
fn from_existing_requires_object_directories() {
    let tmp = tempfile::tempdir().unwrap();
    assert!(SourceCatalog::from_existing(&tmp.path().join("sog")).is_err());
    std::fs::create_dir_all(tmp.path().join("sog")).unwrap();
    assert!(SourceCatalog::from_existing(&tmp.path().join("sog")).is_err());
}
