pub mod bounds;
pub mod resample;
pub mod centroid;
pub mod deskew;

pub use bounds::*;
pub use resample::{crop_and_scale, resize_nearest, scaled_dimensions};
pub use centroid::{Centroid, Placement, centroid, composite_centered, paste_offset};
pub use deskew::*;
