pub mod attendance;
pub mod liveness;
pub mod suspicious;
