//! Bearer token validation. Tokens are issued elsewhere; this service only
//! checks the signature, the expiry and the subject.

mod validator;

pub mod model;

pub use validator::{Claims, JwtValidator};
