pub mod inspect;
pub mod run;

pub use inspect::{InspectArgs, run as run_inspect};
pub use run::{RunArgs, run as run_run};
