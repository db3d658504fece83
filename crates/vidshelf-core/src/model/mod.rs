pub mod video;

pub use video::{Episode, Season, VideoRecord};
