//! Entities and components
//!
//! An entity is created per exported object (or by hand from a postprocess
//! action) and collects components produced by [`ComponentBuilder`]s. Source
//! objects are prepared once up front; builders only read them.

use serde::Serialize;
use sh3_core::{Error, Quat, Result, StringId, Transform, Vec3};
use sh3_source::{ObjectKind, SceneObject};

use crate::geometry::MeshInfo;

/// Component types the engine understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Transform,
    RenderMesh,
    FreeFlyCamera,
}

impl ComponentKind {
    /// Engine-side type name
    pub fn type_name(self) -> &'static str {
        match self {
            ComponentKind::Transform => "TransformComponent",
            ComponentKind::RenderMesh => "RenderMeshComponent",
            ComponentKind::FreeFlyCamera => "FreeFlyCameraComponent",
        }
    }

    pub fn type_id(self) -> StringId {
        StringId::new(self.type_name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ComponentData {
    Transform {
        position: Vec3,
        rotation: Quat,
        scale: Vec3,
    },
    RenderMesh {
        mesh: StringId,
        #[serde(rename = "textureDiffuse")]
        texture_diffuse: StringId,
    },
    FreeFlyCamera {
        position: Vec3,
        right: Vec3,
        forward: Vec3,
    },
}

impl ComponentData {
    pub fn kind(&self) -> ComponentKind {
        match self {
            ComponentData::Transform { .. } => ComponentKind::Transform,
            ComponentData::RenderMesh { .. } => ComponentKind::RenderMesh,
            ComponentData::FreeFlyCamera { .. } => ComponentKind::FreeFlyCamera,
        }
    }
}

/// Component as written to the scene file: `{ "type": <id>, "data": {..} }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Component {
    #[serde(rename = "type")]
    type_id: StringId,
    data: ComponentData,
}

impl Component {
    /// The type id always follows the data variant
    pub fn new(data: ComponentData) -> Self {
        Self {
            type_id: data.kind().type_id(),
            data,
        }
    }

    pub fn type_id(&self) -> StringId {
        self.type_id
    }

    pub fn data(&self) -> &ComponentData {
        &self.data
    }
}

/// Source object with its rotation already normalized to a quaternion
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedObject {
    pub name: String,
    pub kind: ObjectKind,
    pub transform: Transform,
}

impl PreparedObject {
    pub fn prepare(object: &SceneObject) -> Self {
        Self {
            name: object.name.clone(),
            kind: object.kind,
            transform: object.local_transform(),
        }
    }
}

/// Produces one component for an entity
pub trait ComponentBuilder {
    fn build(&self, entity: &Entity) -> Result<Component>;
}

#[derive(Debug)]
pub struct Entity {
    name: String,
    id: StringId,
    source: Option<PreparedObject>,
    components: Vec<Component>,
}

impl Entity {
    fn new(name: String, source: Option<PreparedObject>) -> Self {
        Self {
            id: StringId::new(&name),
            name,
            source,
            components: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> StringId {
        self.id
    }

    pub fn source(&self) -> Option<&PreparedObject> {
        self.source.as_ref()
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Build a component and append it; returns `self` for chaining
    pub fn add_component(&mut self, builder: &dyn ComponentBuilder) -> Result<&mut Self> {
        let component = builder.build(self)?;
        tracing::trace!(
            entity = %self.name,
            component = component.data.kind().type_name(),
            "Added component"
        );
        self.components.push(component);
        Ok(self)
    }

    pub fn has_component(&self, type_id: StringId) -> bool {
        self.components.iter().any(|c| c.type_id == type_id)
    }

    pub fn get_component(&self, type_id: StringId) -> Result<&Component> {
        self.components
            .iter()
            .find(|c| c.type_id == type_id)
            .ok_or_else(|| Error::ComponentNotFound {
                entity: self.name.clone(),
                type_id: type_id.value(),
            })
    }

    fn require_source(&self, component: &'static str) -> Result<&PreparedObject> {
        self.source.as_ref().ok_or_else(|| Error::MissingSourceObject {
            entity: self.name.clone(),
            component,
        })
    }

    pub fn serialize(&self) -> ObjectDocument {
        ObjectDocument {
            id: self.id,
            components: self.components.clone(),
        }
    }
}

/// Serialized entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectDocument {
    pub id: StringId,
    pub components: Vec<Component>,
}

/// Entities of one exported collection
#[derive(Debug)]
pub struct Scene {
    virtual_path: String,
    entities: Vec<Entity>,
}

impl Scene {
    pub fn new(virtual_path: impl Into<String>) -> Self {
        Self {
            virtual_path: virtual_path.into(),
            entities: Vec::new(),
        }
    }

    pub fn virtual_path(&self) -> &str {
        &self.virtual_path
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn add_source_entity(&mut self, object: PreparedObject) -> &mut Entity {
        let entity = Entity::new(object.name.clone(), Some(object));
        self.push(entity)
    }

    pub fn add_custom_entity(&mut self, name: impl Into<String>) -> &mut Entity {
        let entity = Entity::new(name.into(), None);
        self.push(entity)
    }

    fn push(&mut self, entity: Entity) -> &mut Entity {
        let index = self.entities.len();
        self.entities.push(entity);
        &mut self.entities[index]
    }

    /// Entity by name
    pub fn get_entity_mut(&mut self, name: &str) -> Result<&mut Entity> {
        let scene = &self.virtual_path;
        self.entities
            .iter_mut()
            .find(|e| e.name == name)
            .ok_or_else(|| Error::EntityNotFound {
                scene: scene.clone(),
                name: name.to_string(),
            })
    }

    pub fn any_has_component(&self, kind: ComponentKind) -> bool {
        let type_id = kind.type_id();
        self.entities.iter().any(|e| e.has_component(type_id))
    }

    pub fn serialize(&self) -> Vec<ObjectDocument> {
        self.entities.iter().map(Entity::serialize).collect()
    }
}

/// Position, rotation and scale of the source object
#[derive(Debug, Default, Clone, Copy)]
pub struct TransformComponent;

impl ComponentBuilder for TransformComponent {
    fn build(&self, entity: &Entity) -> Result<Component> {
        let transform = entity.require_source("TransformComponent")?.transform;
        Ok(Component::new(ComponentData::Transform {
            position: transform.position,
            rotation: transform.rotation,
            scale: transform.scale,
        }))
    }
}

/// Links an entity to its exported mesh and diffuse texture
#[derive(Debug, Clone)]
pub struct RenderMeshComponent {
    mesh: StringId,
    texture_diffuse: StringId,
}

impl RenderMeshComponent {
    pub fn new(mesh_name: &str, mesh: &MeshInfo) -> Self {
        Self {
            mesh: StringId::new(mesh_name),
            texture_diffuse: StringId::new(&mesh.material.diffuse.id_path()),
        }
    }
}

impl ComponentBuilder for RenderMeshComponent {
    fn build(&self, entity: &Entity) -> Result<Component> {
        entity.require_source("RenderMeshComponent")?;
        Ok(Component::new(ComponentData::RenderMesh {
            mesh: self.mesh,
            texture_diffuse: self.texture_diffuse,
        }))
    }
}

/// Camera placed at an empty; local X is right, local Y is forward
#[derive(Debug, Default, Clone, Copy)]
pub struct FreeFlyCameraComponent;

impl ComponentBuilder for FreeFlyCameraComponent {
    fn build(&self, entity: &Entity) -> Result<Component> {
        let source = entity.require_source("FreeFlyCameraComponent")?;
        if source.kind != ObjectKind::Empty {
            return Err(Error::UnexpectedObjectKind {
                entity: entity.name.clone(),
                component: "FreeFlyCameraComponent",
                expected: "EMPTY",
                found: source.kind.to_string(),
            });
        }

        let basis = glam::Mat3::from_quat(source.transform.rotation.into());
        Ok(Component::new(ComponentData::FreeFlyCamera {
            position: source.transform.position,
            right: basis.x_axis.into(),
            forward: basis.y_axis.into(),
        }))
    }
}

/// Camera at the origin looking down +Y
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFreeFlyCameraComponent;

impl ComponentBuilder for DefaultFreeFlyCameraComponent {
    fn build(&self, _entity: &Entity) -> Result<Component> {
        Ok(Component::new(ComponentData::FreeFlyCamera {
            position: Vec3::ZERO,
            right: Vec3::RIGHT,
            forward: Vec3::FORWARD,
        }))
    }
}
