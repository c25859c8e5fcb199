use sh3_core::Result;

use crate::postprocess::PostprocessRegistry;
use crate::scene::{FreeFlyCameraComponent, Scene};

pub const MREF_SCENE: &str = "maps/mall-real/mall-real-split/mref";
pub const MREF_CAMERA: &str = "mref-camera";

fn mref(scene: &mut Scene) -> Result<()> {
    scene
        .get_entity_mut(MREF_CAMERA)?
        .add_component(&FreeFlyCameraComponent)?;
    Ok(())
}

pub fn register(registry: &mut PostprocessRegistry) {
    registry.register(MREF_SCENE, mref);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ComponentKind, PreparedObject};
    use sh3_core::Error;
    use sh3_source::{ObjectKind, SceneObject};

    #[test]
    fn test_mref_camera() {
        let registry = PostprocessRegistry::builtin();
        let mut scene = Scene::new(MREF_SCENE);
        scene.add_source_entity(PreparedObject::prepare(&SceneObject::new(
            MREF_CAMERA,
            ObjectKind::Empty,
        )));

        registry.apply(&mut scene).unwrap();

        assert_eq!(scene.entities().len(), 1);
        assert!(scene.entities()[0].has_component(ComponentKind::FreeFlyCamera.type_id()));
    }

    #[test]
    fn test_mref_without_camera_object_fails() {
        let mut scene = Scene::new(MREF_SCENE);
        let err = mref(&mut scene).unwrap_err();
        assert!(matches!(err, Error::EntityNotFound { .. }));
    }
}
