mod environment_list;
mod path_input;
mod signal_display;

pub use environment_list::EnvironmentList;
pub use path_input::PathInput;
pub use signal_display::{PaneSignal, SignalDisplay};
