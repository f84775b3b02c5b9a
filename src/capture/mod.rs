mod camera;
mod mock;
mod service;

pub use camera::{CommandCamera, StillCamera};
pub use mock::{MockCamera, ShotOutcome};
pub use service::{artifact_file_name, CaptureService};
