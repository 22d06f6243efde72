//! Host for the override refactoring: loads C++ files, indexes them with
//! the tree-sitter frontend, resolves selections and runs registered tweaks.

mod config;
mod error;

pub use config::{Config, CONFIG_FILE_NAME};
pub use error::{DriverError, Result};

use indexmap::IndexMap;
use overrider_common::{is_cpp_path, Diagnostic, SourceFile, SourceId, SourceMap};
use overrider_frontend_cpp::LoweredFile;
use overrider_model::SemanticModel;
use overrider_tweak::{OverridePureVirtuals, Selection, TweakRegistry};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What a selection points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A class by (qualified or simple) name.
    Class(String),
    /// A byte offset, resolved to the class whose header contains it.
    Offset(u32),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Class(name) => write!(f, "class `{name}`"),
            Target::Offset(offset) => write!(f, "offset {offset}"),
        }
    }
}

/// Availability of the override tweak on one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassReport {
    pub class: String,
    pub available: bool,
    /// Pure virtual methods still to be overridden.
    pub remaining: usize,
}

/// One pure virtual method the selected class still has to override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Obligation {
    /// Qualified name of the class that declares the method.
    pub owner: String,
    pub name: String,
    pub signature: String,
}

impl fmt::Display for Obligation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}  {}", self.owner, self.name, self.signature)
    }
}

/// Refactoring driver that owns the loaded files and the tweak registry.
pub struct Driver {
    source_map: SourceMap,
    lowered: IndexMap<SourceId, LoweredFile>,
    registry: TweakRegistry,
    overrides: OverridePureVirtuals,
}

impl Driver {
    pub fn new(config: Config) -> Self {
        let overrides = OverridePureVirtuals::new(config.emit);
        let mut registry = TweakRegistry::new();
        registry.register(Box::new(overrides.clone()));
        Self {
            source_map: SourceMap::new(),
            lowered: IndexMap::new(),
            registry,
            overrides,
        }
    }

    /// Read a file from disk and index it.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<SourceId> {
        let path = path.as_ref();
        if !is_cpp_path(path) {
            return Err(DriverError::NotCpp(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| DriverError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_source(path, content)
    }

    /// Index `content` under `path`. Loading a path again replaces the
    /// previous snapshot.
    pub fn load_source(&mut self, path: impl AsRef<Path>, content: String) -> Result<SourceId> {
        let path = path.as_ref();
        let id = self
            .source_map
            .add_file(path, content)
            .map_err(|_| DriverError::NotCpp(path.to_path_buf()))?;
        let source = self.source(id)?;
        let lowered = overrider_frontend_cpp::parse_file(source).map_err(|report| DriverError::Index {
            path: path.to_path_buf(),
            message: report.to_string(),
        })?;
        debug!(
            file = %path.display(),
            classes = lowered.graph.len(),
            diagnostics = lowered.diagnostics.len(),
            "indexed"
        );
        self.lowered.insert(id, lowered);
        Ok(id)
    }

    pub fn source(&self, id: SourceId) -> Result<&SourceFile> {
        self.source_map
            .get(id)
            .ok_or(DriverError::UnknownSource(id.as_u32()))
    }

    fn lowered(&self, id: SourceId) -> Result<&LoweredFile> {
        self.lowered
            .get(&id)
            .ok_or(DriverError::UnknownSource(id.as_u32()))
    }

    /// Loaded sources in load order.
    pub fn sources(&self) -> impl Iterator<Item = SourceId> + '_ {
        self.lowered.keys().copied()
    }

    /// Non-fatal problems the frontend found in a file.
    pub fn diagnostics(&self, id: SourceId) -> Result<&[Diagnostic]> {
        Ok(&self.lowered(id)?.diagnostics)
    }

    pub fn registry(&self) -> &TweakRegistry {
        &self.registry
    }

    /// Resolve `target` to a selection in the file's model.
    pub fn select(&self, id: SourceId, target: &Target) -> Result<Selection<'_>> {
        let source = self.source(id)?;
        let graph = &self.lowered(id)?.graph;
        match target {
            Target::Class(name) => {
                let ty = graph.type_by_name(name).ok_or_else(|| DriverError::UnknownClass {
                    class: name.clone(),
                    path: source.path.clone(),
                })?;
                Ok(Selection::of_type(graph, ty.id))
            }
            Target::Offset(offset) => {
                if *offset > source.len() {
                    return Err(DriverError::OffsetOutOfRange {
                        offset: *offset,
                        len: source.len(),
                    });
                }
                Ok(Selection::at_offset(graph, *offset))
            }
        }
    }

    /// Report override availability for every class in the file.
    pub fn check(&self, id: SourceId) -> Result<Vec<ClassReport>> {
        let graph = &self.lowered(id)?.graph;
        let reports = graph
            .types()
            .map(|ty| {
                let selection = Selection::of_type(graph, ty.id);
                let remaining = self
                    .overrides
                    .residual(&selection)
                    .map(|(_, residual)| residual.len())
                    .unwrap_or(0);
                ClassReport {
                    class: ty.qualified_name.to_string(),
                    available: remaining > 0,
                    remaining,
                }
            })
            .collect();
        Ok(reports)
    }

    /// The obligations the override tweak would emit, in emission order.
    /// Empty when the tweak does not apply.
    pub fn obligations(&self, id: SourceId, target: &Target) -> Result<Vec<Obligation>> {
        let selection = self.select(id, target)?;
        let Some((_, residual)) = self.overrides.residual(&selection) else {
            return Ok(Vec::new());
        };
        let obligations = residual
            .iter()
            .map(|method| Obligation {
                owner: selection
                    .model
                    .type_node(method.owner)
                    .map(|t| t.qualified_name.to_string())
                    .unwrap_or_default(),
                name: method.name.to_string(),
                signature: method.display_signature(),
            })
            .collect();
        Ok(obligations)
    }

    /// Run a registered tweak and return the edited text of the file.
    pub fn apply(&self, id: SourceId, tweak_id: &str, target: &Target) -> Result<String> {
        let tweak = self
            .registry
            .get(tweak_id)
            .ok_or_else(|| DriverError::UnknownTweak(tweak_id.to_string()))?;
        let selection = self.select(id, target)?;
        let not_applicable = || DriverError::NotApplicable {
            tweak: tweak.title(),
            target: target.to_string(),
        };
        if !tweak.is_available(&selection) {
            return Err(not_applicable());
        }
        let effect = tweak.apply(&selection).ok_or_else(not_applicable)?;

        let source = self.source(id)?;
        info!(
            tweak = tweak_id,
            file = %source.path.display(),
            edits = effect.edits.len(),
            "applying tweak"
        );
        Ok(effect.apply_to(&source.content))
    }

    /// [`apply`](Self::apply), then write the result back to disk and
    /// re-index the file.
    pub fn apply_in_place(&mut self, id: SourceId, tweak_id: &str, target: &Target) -> Result<PathBuf> {
        let edited = self.apply(id, tweak_id, target)?;
        let path = self.source(id)?.path.clone();
        std::fs::write(&path, &edited).map_err(|source| DriverError::Io {
            path: path.clone(),
            source,
        })?;
        self.load_source(&path, edited)?;
        Ok(path)
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
