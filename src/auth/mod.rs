// Authentication module
// Registration, login, session tokens, and email-OTP verification

pub mod error;
pub mod handlers;
pub mod mailer;
pub mod memory;
pub mod middleware;
pub mod models;
pub mod otp;
pub mod password;
pub mod repository;
pub mod service;
pub mod store;
pub mod token;

// Re-export commonly used types
pub use error::AuthError;
pub use handlers::{
    login_handler, me_handler, register_handler, resend_otp_handler, verify_otp_handler,
};
pub use mailer::{Mailer, SmtpMailer};
pub use middleware::AuthenticatedUser;
pub use models::{LoginRequest, RegisterRequest, Role, User, VerifyOtpRequest};
pub use otp::OtpDispatcher;
pub use repository::{PostgresOtpStore, PostgresUserStore};
pub use service::AuthService;
pub use store::{OtpStore, UserStore};
pub use token::TokenService;
