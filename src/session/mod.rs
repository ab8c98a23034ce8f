mod tmux;

pub use tmux::{PaneInfo, TmuxClient};
