mod inference_device;
mod model_config;
mod model_version;
mod ped_box;
mod ped_detection;
mod ped_image;

pub use inference_device::*;
pub use model_config::*;
pub use model_version::*;
pub use ped_box::*;
pub use ped_detection::*;
pub use ped_image::*;
