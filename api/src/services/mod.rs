pub mod attendance;
pub mod qr_token;
