pub mod storage;
pub mod types;

pub use storage::{
    get_session_path, load_session_state, open_session, save_session_state, SessionError,
};
pub use types::{Session, SessionEntry, SessionState};
