pub mod config;
pub mod controller;
pub mod results;
pub mod service;
pub mod view;

pub use config::{load_settings, ClientSettings};
pub use controller::{
    BootstrapOutcome, ControllerEvent, Navigation, RestoreOutcome, SaveOutcome, SessionController,
    SessionError, SessionPhase, SubmitOutcome, DEFAULT_AUTO_ADVANCE_DELAY,
};
pub use results::ResultSummary;
pub use service::{HttpSessionService, RemoteSessionService};
pub use view::{QuestionView, SessionView};
