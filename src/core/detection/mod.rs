// ─── Game detection ───
// validator  : marker-file check for a candidate directory
// registry   : narrow platform interface (Steam root, uninstall entries)
// strategies : the ordered detection heuristics
// locator    : runs the strategies, first hit wins

pub mod locator;
pub mod registry;
pub mod strategies;
pub mod validator;

pub use locator::{DetectionMethod, InstallationLocator, InstallationTarget};
pub use registry::{platform_registry, PlatformRegistry, UninstallEntry};
pub use strategies::{Detector, Strategy};
pub use validator::PathValidator;
