pub mod session;

pub use session::{AuthStage, OtpState, Session};
