mod registry;

pub use registry::{Fallback, ModelRegistry, ModelSpec, NoCapableModel, Resolved};

pub const CAPABILITY_TEXT: &str = "text";
pub const CAPABILITY_VISION: &str = "vision";
pub const CAPABILITY_IMAGE: &str = "image";
pub const CAPABILITY_EDIT: &str = "edit";
