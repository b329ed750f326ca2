use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use rayon::prelude::*;

use crate::catalog::convert::Converter;
use crate::catalog::walk::{StillImageWalk, find_inputs};
use crate::config::{ConvertFailurePolicy, PipelineConfig};
use crate::foundation::error::{SplatSeqError, SplatSeqResult};
use crate::foundation::fs::remove_dir_if_exists;

/// Name of the metadata file the converter writes into each object directory.
pub const META_FILE_NAME: &str = "meta.json";

/// One processed input and where its converter output lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceObject {
    /// Stable identifier: input path relative to the input root, or the directory name when
    /// rebuilding from existing output.
    pub original: String,
    /// Directory name below `<root>/sog`.
    pub name: String,
    /// Converter output directory.
    pub dir: PathBuf,
    /// `<dir>/meta.json`.
    pub meta_path: PathBuf,
}

impl SourceObject {
    fn in_dir(original: String, name: String, sog_dir: &Path) -> Self {
        let dir = sog_dir.join(&name);
        let meta_path = dir.join(META_FILE_NAME);
        Self {
            original,
            name,
            dir,
            meta_path,
        }
    }

    /// `true` when the converter wrote metadata for this object.
    pub fn has_meta(&self) -> bool {
        self.meta_path.is_file()
    }

    /// Walk over the attribute still images this object produced.
    pub fn images(&self) -> StillImageWalk {
        StillImageWalk::new(&self.dir)
    }
}

/// Source objects in catalog order (lexicographic by identifier).
#[derive(Clone, Debug, Default)]
pub struct SourceCatalog {
    objects: Vec<SourceObject>,
}

impl SourceCatalog {
    /// Catalog of `objects`, sorted by identifier.
    pub fn from_objects(mut objects: Vec<SourceObject>) -> Self {
        objects.sort_by(|a, b| a.original.cmp(&b.original));
        Self { objects }
    }

    /// Objects in catalog order.
    pub fn objects(&self) -> &[SourceObject] {
        &self.objects
    }

    /// Number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// `true` when no object was cataloged.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Catalog the object directories already present below `sog_dir`, ordered by name.
    #[tracing::instrument]
    pub fn from_existing(sog_dir: &Path) -> SplatSeqResult<Self> {
        if !sog_dir.is_dir() {
            return Err(SplatSeqError::validation(format!(
                "nothing to rebuild: '{}' is not a directory",
                sog_dir.display()
            )));
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(sog_dir)
            .with_context(|| format!("failed to list '{}'", sog_dir.display()))?
        {
            let entry = entry.with_context(|| format!("failed to list '{}'", sog_dir.display()))?;
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        if names.is_empty() {
            return Err(SplatSeqError::validation(format!(
                "nothing to rebuild: no object directories below '{}'",
                sog_dir.display()
            )));
        }

        let objects = names
            .into_iter()
            .map(|name| SourceObject::in_dir(name.clone(), name, sog_dir))
            .collect();
        let catalog = Self::from_objects(objects);
        tracing::info!(objects = catalog.len(), "catalogued existing converter output");
        Ok(catalog)
    }

    /// Discover inputs, reserve one output directory each and run the converter on `pool`.
    ///
    /// Results are collected back into catalog order before the failure policy is applied, so
    /// the first reported failure is deterministic.
    #[tracing::instrument(skip_all)]
    pub fn convert(
        cfg: &PipelineConfig,
        converter: &dyn Converter,
        pool: &rayon::ThreadPool,
    ) -> SplatSeqResult<Self> {
        let input_root = cfg
            .input
            .as_deref()
            .ok_or_else(|| SplatSeqError::validation("input path is required for conversion"))?;
        let inputs = find_inputs(input_root, &cfg.converter.input_exts)?;
        if inputs.is_empty() {
            return Err(SplatSeqError::validation(format!(
                "no inputs with extensions [{}] found under '{}'",
                cfg.converter.input_exts.join(", "),
                input_root.display()
            )));
        }

        let sog_dir = cfg.layout().sog_dir();
        let reserved = reserve_object_dirs(&sog_dir, &inputs, cfg.overwrite)?;
        tracing::info!(inputs = reserved.len(), "converting inputs");

        let results = pool.install(|| {
            reserved
                .par_iter()
                .map(|(obj, input)| converter.convert(&obj.original, input, &obj.meta_path))
                .collect::<Vec<_>>()
        });

        let mut objects = Vec::with_capacity(reserved.len());
        for ((obj, _), result) in reserved.into_iter().zip(results) {
            match (result, cfg.converter.on_failure) {
                (Ok(()), _) => objects.push(obj),
                (Err(e), ConvertFailurePolicy::Abort) => return Err(e),
                (Err(e), ConvertFailurePolicy::Skip) => {
                    tracing::warn!(object = %obj.original, error = %e, "skipping failed input");
                    remove_dir_if_exists(&obj.dir)?;
                }
            }
        }
        if objects.is_empty() {
            return Err(SplatSeqError::validation("every input failed to convert"));
        }
        Ok(Self::from_objects(objects))
    }
}

/// Pick and create a fresh output directory per input.
///
/// Collisions inside the run always get a numeric suffix. A pre-existing directory is deleted
/// when `overwrite` is set, otherwise the name is suffixed as well.
pub(crate) fn reserve_object_dirs(
    sog_dir: &Path,
    inputs: &[(String, PathBuf)],
    overwrite: bool,
) -> SplatSeqResult<Vec<(SourceObject, PathBuf)>> {
    std::fs::create_dir_all(sog_dir)
        .with_context(|| format!("failed to create '{}'", sog_dir.display()))?;

    let mut used = HashSet::<String>::new();
    let mut out = Vec::with_capacity(inputs.len());
    for (original, input) in inputs {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "object".to_string());

        let taken = |name: &str, used: &HashSet<String>| {
            used.contains(name) || (!overwrite && sog_dir.join(name).exists())
        };
        let mut name = stem.clone();
        let mut n = 1u32;
        while taken(&name, &used) {
            name = format!("{stem}_{n}");
            n += 1;
        }

        let obj = SourceObject::in_dir(original.clone(), name.clone(), sog_dir);
        if overwrite {
            remove_dir_if_exists(&obj.dir)?;
        }
        std::fs::create_dir_all(&obj.dir)
            .with_context(|| format!("failed to create '{}'", obj.dir.display()))?;
        used.insert(name);
        out.push((obj, input.clone()));
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/catalog/source.rs"]
mod tests;
