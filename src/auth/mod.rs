//! The pages and endpoints for signing in, registering, and managing the
//! password and email of an account.

mod forgot_password;
mod log_in;
mod log_out;
mod register;
mod reset_password;
mod verify_email;

pub use forgot_password::{get_forgot_password_page, post_forgot_password};
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use register::{get_register_page, register_user};
pub use reset_password::{get_reset_password_page, post_reset_password};
pub use verify_email::{get_verify_email_page, resend_verification_email};

/// The minimum number of characters the password should have to be considered
/// valid on the client side (server-side validation is done on top of this).
const PASSWORD_INPUT_MIN_LENGTH: u8 = 8;
