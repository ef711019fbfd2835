//! The API endpoints URIs.

/// The root route which redirects to the dashboard or log in page.
pub const ROOT: &str = "/";
/// The landing page for logged in users.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The fragment of the dashboard that changes when a transaction is added.
pub const DASHBOARD_SUMMARY: &str = "/dashboard/summary";
/// The page for viewing and editing the user's profile.
pub const PROFILE_VIEW: &str = "/profile";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page for requesting a password reset email.
pub const FORGOT_PASSWORD_VIEW: &str = "/forgot_password";
/// The page linked from password reset emails.
pub const RESET_PASSWORD_VIEW: &str = "/reset_password";
/// The page linked from verification emails.
pub const VERIFY_EMAIL_VIEW: &str = "/verify_email";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to register new users.
pub const USERS: &str = "/api/users";
/// The route to request a password reset email.
pub const FORGOT_PASSWORD_API: &str = "/api/forgot_password";
/// The route to set a new password with a reset code.
pub const RESET_PASSWORD_API: &str = "/api/reset_password";
/// The route to resend the verification email.
pub const VERIFY_EMAIL_API: &str = "/api/verify_email";
/// The route to update the user's profile.
pub const PROFILE_API: &str = "/api/profile";
/// The route to create transactions.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route for the category options of a transaction type.
pub const TRANSACTION_CATEGORIES: &str = "/api/transactions/categories";
/// The route for the formatted preview of an amount.
pub const TRANSACTION_PREVIEW: &str = "/api/transactions/preview";
