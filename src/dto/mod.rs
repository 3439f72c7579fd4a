pub mod host;
pub mod intent;
pub mod surface;
