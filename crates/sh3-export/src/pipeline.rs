//! Export pipeline
//!
//! One run exports every collection of a saved scene file:
//! 1. collections hidden from render or without renderable objects are skipped
//! 2. each remaining collection becomes a [`Scene`] plus a payload entry
//! 3. postprocess actions run and the scene description is built
//! 4. the conversion tool is invoked on the collected payload
//! 5. the scene descriptions are written
//!
//! Any error aborts the run before a scene description reaches the disk.

use std::path::{Path, PathBuf};

use sh3_core::{Error, ExportConfig, Result, StringId};
use sh3_source::{Collection, ObjectKind, SceneObject, SceneSource};
use sh3_vfs::{
    render_chunk_name, scene_json_name, scene_virtual_name, PathInfo, PathVirtualizer,
};

use crate::geometry::{mesh_info, MeshInfo};
use crate::json::{SceneDocument, SceneJsonWriter};
use crate::logging::{instrument_export, log_progress, progress_span};
use crate::material::{MaterialIssue, MaterialResolver};
use crate::payload::{
    MeshPayload, ObjectPayload, RenderChunkPayload, ScenePayload, ScenesPayload, TransformPayload,
};
use crate::postprocess::PostprocessRegistry;
use crate::scene::{PreparedObject, RenderMeshComponent, Scene, TransformComponent};
use crate::tool::{Invocation, ToolInvoker, ToolKind};

/// What to do with a mesh whose material cannot be exported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaterialPolicy {
    /// Abort the run
    #[default]
    Fail,
    /// Leave the object out of the export and keep going
    SkipObject,
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub tool: ToolKind,
    /// Forwarded to the scene tool
    pub use_compression: bool,
    /// Keep payload files after the tool ran
    pub keep_data: bool,
    pub material_policy: MaterialPolicy,
    /// Invoke the conversion tool at the end of the run
    pub run_tool: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            tool: ToolKind::SceneTool,
            use_compression: false,
            keep_data: false,
            material_policy: MaterialPolicy::Fail,
            run_tool: true,
        }
    }
}

/// Export phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPhase {
    Collections,
    InvokingTool,
    Complete,
}

/// Progress reported between collections
#[derive(Debug, Clone)]
pub struct ExportProgress {
    pub phase: ExportPhase,
    pub collections_done: usize,
    pub collections_total: usize,
    /// Collection being processed
    pub current: Option<String>,
}

impl ExportProgress {
    /// Fraction of collections done (0.0 - 1.0)
    pub fn percentage(&self) -> f32 {
        if self.collections_total == 0 {
            1.0
        } else {
            self.collections_done as f32 / self.collections_total as f32
        }
    }
}

/// Progress callback for an export run
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send + Sync>;

/// Output locations derived for one collection
#[derive(Debug, Clone, PartialEq)]
pub struct ScenePaths {
    /// Extension-free scene path joined with the collection name
    pub virtual_name: String,
    /// Game-data relative render chunk path
    pub render_chunk: String,
    /// Absolute path of the scene description
    pub scene_json: PathBuf,
}

impl ScenePaths {
    pub fn new(config: &ExportConfig, scene_file: &PathInfo, collection: &str) -> Self {
        let virtual_name = scene_virtual_name(&scene_file.relative, collection);
        Self {
            render_chunk: render_chunk_name(&virtual_name),
            scene_json: config.game_data_path(&scene_json_name(&virtual_name)),
            virtual_name,
        }
    }

    pub fn render_chunk_id(&self) -> StringId {
        StringId::new(&self.render_chunk)
    }
}

/// What a run produced
#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    /// Scene descriptions written
    pub scenes_written: Vec<PathBuf>,
    /// Render chunk names, one per exported collection
    pub chunks: Vec<String>,
    pub skipped_collections: Vec<String>,
    /// Objects left out because of their material
    pub skipped_objects: Vec<String>,
    /// Payload files kept on disk
    pub payload_paths: Vec<PathBuf>,
}

struct CollectionExport {
    paths: ScenePaths,
    document: SceneDocument,
    scene: ScenePayload,
    chunk: RenderChunkPayload,
}

pub struct Exporter<'a> {
    config: &'a ExportConfig,
    options: ExportOptions,
    postprocess: PostprocessRegistry,
    writer: SceneJsonWriter,
}

impl<'a> Exporter<'a> {
    pub fn new(config: &'a ExportConfig, options: ExportOptions, postprocess: PostprocessRegistry) -> Self {
        Self {
            config,
            options,
            postprocess,
            writer: SceneJsonWriter::new(),
        }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Export every collection of `source`
    pub fn run(
        &self,
        source: &dyn SceneSource,
        progress: Option<ProgressCallback>,
    ) -> Result<ExportSummary> {
        let file_path = source.file_path().ok_or(Error::SceneNotSaved)?;
        let virtualizer = PathVirtualizer::new(self.config.resources_root());
        let scene_file = virtualizer.virtualize(file_path)?;
        let resolver = MaterialResolver::new(
            virtualizer,
            file_path.parent().map(Path::to_path_buf),
        );

        let collections = source.collections();
        let total = collections.len();
        let report = |phase: ExportPhase, done: usize, current: Option<&str>| {
            if let Some(callback) = &progress {
                callback(ExportProgress {
                    phase,
                    collections_done: done,
                    collections_total: total,
                    current: current.map(str::to_string),
                });
            }
        };

        let span = progress_span("export", total);
        let _guard = span.enter();
        tracing::info!(scene = %scene_file.relative, collections = total, "Export started");

        let mut summary = ExportSummary::default();
        let mut scenes = ScenesPayload {
            scenes: Vec::new(),
            use_compression: self.options.use_compression,
        };
        let mut chunks = Vec::new();
        let mut documents = Vec::new();

        for (index, collection) in collections.iter().enumerate() {
            report(ExportPhase::Collections, index, Some(&collection.name));

            match self.export_collection(source, collection, &scene_file, &resolver, &mut summary)? {
                Some(export) => {
                    summary.chunks.push(export.paths.render_chunk);
                    documents.push((export.paths.scene_json, export.document));
                    scenes.scenes.push(export.scene);
                    chunks.push(export.chunk);
                }
                None => summary.skipped_collections.push(collection.name.clone()),
            }

            log_progress(index + 1, total);
        }

        if self.options.run_tool {
            report(ExportPhase::InvokingTool, total, None);
            let invocations =
                instrument_export("invoke_tool", || self.invoke_tool(scenes, chunks))?;
            for invocation in invocations {
                summary.payload_paths.extend(invocation.kept_payload);
            }
        }

        for (path, document) in documents {
            self.writer.write(&document, &path)?;
            summary.scenes_written.push(path);
        }

        report(ExportPhase::Complete, total, None);
        tracing::info!(
            scenes = summary.scenes_written.len(),
            skipped = summary.skipped_collections.len(),
            "Export finished"
        );
        Ok(summary)
    }

    fn export_collection(
        &self,
        source: &dyn SceneSource,
        collection: &Collection,
        scene_file: &PathInfo,
        resolver: &MaterialResolver,
        summary: &mut ExportSummary,
    ) -> Result<Option<CollectionExport>> {
        if collection.hide_render {
            tracing::info!(collection = %collection.name, "Skip collection: hidden from render");
            return Ok(None);
        }

        let objects = renderable_objects(collection);
        if objects.is_empty() {
            tracing::warn!(collection = %collection.name, "Skip collection: no objects");
            return Ok(None);
        }

        let paths = ScenePaths::new(self.config, scene_file, &collection.name);
        tracing::info!(scene = %paths.virtual_name, objects = objects.len(), "Exporting scene");

        let mut scene = Scene::new(paths.virtual_name.clone());
        let mut payload = ScenePayload {
            name: paths.virtual_name.clone(),
            objects: Vec::with_capacity(objects.len()),
        };
        let mut chunk = RenderChunkPayload::new(PathInfo {
            base: scene_file.base.clone(),
            full: scene_file.full.clone(),
            relative: paths.virtual_name.clone(),
        });

        for object in objects {
            let mesh = if object.kind == ObjectKind::Mesh {
                match self.object_mesh(source, object, resolver)? {
                    Some(mesh) => Some(mesh),
                    None => {
                        summary.skipped_objects.push(object.name.clone());
                        continue;
                    }
                }
            } else {
                None
            };

            let prepared = PreparedObject::prepare(object);
            let transform = TransformPayload::from(&prepared.transform);
            let entity = scene.add_source_entity(prepared);
            entity.add_component(&TransformComponent)?;

            if let Some(mesh) = &mesh {
                entity.add_component(&RenderMeshComponent::new(&object.name, mesh))?;
                if self.options.tool == ToolKind::MeshTool {
                    chunk.push_mesh(&object.name, mesh)?;
                }
            }

            payload.objects.push(ObjectPayload {
                name: object.name.clone(),
                kind: object.kind.as_str().to_string(),
                transform,
                mesh: mesh.map(MeshPayload::from),
            });
        }

        self.postprocess.apply(&mut scene)?;

        let document = SceneDocument::from_scene(&scene, vec![paths.render_chunk_id()]);

        Ok(Some(CollectionExport {
            paths,
            document,
            scene: payload,
            chunk,
        }))
    }

    /// Mesh data of a mesh object; `None` when the object is skipped
    fn object_mesh(
        &self,
        source: &dyn SceneSource,
        object: &SceneObject,
        resolver: &MaterialResolver,
    ) -> Result<Option<MeshInfo>> {
        let material = object
            .active_material
            .as_deref()
            .and_then(|name| source.material(name));

        let material = match resolver.try_resolve(material) {
            Ok(material) => material,
            Err(MaterialIssue::TexturePath { material: name, source: err }) => {
                return Err(err.with_context(format!("texture of material {name}")));
            }
            Err(issue) => match self.options.material_policy {
                MaterialPolicy::Fail => {
                    return Err(Error::BadMaterial {
                        object: object.name.clone(),
                        reason: issue.to_string(),
                    });
                }
                MaterialPolicy::SkipObject => {
                    tracing::warn!(
                        object = %object.name,
                        code = issue.code(),
                        "Skip object: {issue}"
                    );
                    return Ok(None);
                }
            },
        };

        mesh_info(object, material).map(Some)
    }

    fn invoke_tool(
        &self,
        scenes: ScenesPayload,
        chunks: Vec<RenderChunkPayload>,
    ) -> Result<Vec<Invocation>> {
        if scenes.scenes.is_empty() {
            tracing::warn!("Nothing exported, conversion tool not run");
            return Ok(Vec::new());
        }

        let invoker = ToolInvoker::new(self.options.tool.path(self.config), self.options.keep_data);
        match self.options.tool {
            ToolKind::SceneTool => Ok(vec![invoker.invoke(&scenes)?]),
            ToolKind::MeshTool => chunks.iter().map(|chunk| invoker.invoke(chunk)).collect(),
        }
    }
}

/// Renderable objects of a collection, logging the ones hidden from render
fn renderable_objects(collection: &Collection) -> Vec<&SceneObject> {
    collection
        .objects
        .iter()
        .filter(|object| object.kind.is_renderable())
        .filter(|object| {
            if object.hide_render {
                tracing::info!(object = %object.name, "Skip object: hidden from render");
            }
            !object.hide_render
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_paths() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = ExportConfig::new(dir.path(), "/game/data", "/project").unwrap();
        let scene_file = PathInfo {
            base: "/res".into(),
            full: "/res/maps/mall-real/mall-real-split.blend".into(),
            relative: "maps/mall-real/mall-real-split.blend".into(),
        };

        let paths = ScenePaths::new(&config, &scene_file, "mref");
        assert_eq!(paths.virtual_name, "maps/mall-real/mall-real-split/mref");
        assert_eq!(paths.render_chunk, "maps/mall-real/mall-real-split/mref.chunk");
        assert_eq!(
            paths.scene_json,
            PathBuf::from("/game/data/maps/mall-real/mall-real-split/mref.scene.json")
        );
        assert_eq!(
            paths.render_chunk_id(),
            StringId::new("maps/mall-real/mall-real-split/mref.chunk")
        );
    }

    #[test]
    fn test_progress_percentage() {
        let progress = ExportProgress {
            phase: ExportPhase::Collections,
            collections_done: 1,
            collections_total: 4,
            current: None,
        };
        assert_eq!(progress.percentage(), 0.25);

        let empty = ExportProgress {
            collections_total: 0,
            ..progress
        };
        assert_eq!(empty.percentage(), 1.0);
    }

    #[test]
    fn test_renderable_objects_skip_hidden_and_lights() {
        let mut collection = Collection::new("c");
        collection.objects.push(SceneObject::new("light", ObjectKind::Light));
        let mut hidden = SceneObject::new("hidden", ObjectKind::Mesh);
        hidden.hide_render = true;
        collection.objects.push(hidden);
        collection.objects.push(SceneObject::new("cam", ObjectKind::Camera));

        let objects = renderable_objects(&collection);
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].name, "cam");
    }
}
