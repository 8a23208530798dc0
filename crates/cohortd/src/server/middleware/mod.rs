pub mod batch_auth;
