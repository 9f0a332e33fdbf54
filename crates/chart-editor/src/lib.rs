pub mod save_load;
pub mod session;

pub use session::{ClipInfo, EditorSession};
