//! Built-in postprocess actions, one module per map

use super::PostprocessRegistry;

pub mod default;
pub mod mall_real;

/// Register every built-in action
pub fn register_all(registry: &mut PostprocessRegistry) {
    mall_real::register(registry);
    default::register(registry);
}
