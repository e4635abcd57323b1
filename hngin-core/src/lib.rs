/// hngin core library - CPU-only 3D projection and painter's rendering
///
/// This library provides the window-independent parts of the renderer:
/// OBJ loading, meshes and motions, the camera and perspective projector,
/// depth-ordered scene rendering, live settings and the per-frame driver.

pub mod camera;
pub mod color;
pub mod frame;
pub mod geometry;
pub mod input;
pub mod obj;
pub mod projection;
pub mod raster;
pub mod render;
pub mod scene;
pub mod settings;
pub mod transform;

// Re-export commonly used types
pub use camera::{AngleCache, Camera};
pub use color::Rgb;
pub use frame::{FrameDriver, FrameStats};
pub use geometry::{Edge, Face, FaceColoring, Mesh, MeshStyle, PointExt, Vertex};
pub use input::{InputState, Key};
pub use obj::{load_obj, parse_obj, parse_obj_report, ObjError, ObjIssue, ObjReport, RawMesh};
pub use projection::{Projector, ScreenPoint, Viewport};
pub use raster::{DrawCommand, FrameBuffer, RecordingBuffer};
pub use render::{DepthPolicy, RenderOptions, RenderStats};
pub use scene::{Animation, Model, Scene, SceneConfig, SceneError};
pub use settings::{FixedSettings, InvalidSettingError, RawSettings, Settings, SettingsProvider, SettingsTracker};
pub use transform::{apply, Axis, Motion};
