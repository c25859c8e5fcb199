use sh3_core::Result;

use crate::postprocess::{PostprocessRegistry, DEFAULT_KEY};
use crate::scene::{ComponentKind, DefaultFreeFlyCameraComponent, Scene};

/// Name of the entity injected when a scene has no camera
pub const DEBUG_CAMERA_ENTITY: &str = "debug-free-fly";

/// Give camera-less scenes a free-fly camera at the origin
pub fn ensure_camera(scene: &mut Scene) -> Result<()> {
    if scene.any_has_component(ComponentKind::FreeFlyCamera) {
        return Ok(());
    }

    tracing::debug!(scene = %scene.virtual_path(), "Adding default free-fly camera");
    scene
        .add_custom_entity(DEBUG_CAMERA_ENTITY)
        .add_component(&DefaultFreeFlyCameraComponent)?;
    Ok(())
}

pub fn register(registry: &mut PostprocessRegistry) {
    registry.register(DEFAULT_KEY, ensure_camera);
}
