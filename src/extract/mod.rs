mod options;
mod traits;
mod video_id;
mod ytdlp;

pub use options::*;
pub use traits::*;
pub use video_id::*;
pub use ytdlp::*;
