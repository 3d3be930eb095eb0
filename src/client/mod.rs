//! Learner-side session state and the gateway transport it talks through.

pub mod goals;
pub mod locale;
pub mod session;
pub mod transport;

pub use goals::LearningGoal;
pub use locale::Locale;
pub use session::{SendOutcome, SendState, SessionConfig, TutorSession};
pub use transport::{ClientError, GatewayTransport, HttpGateway};
