pub mod context;
pub mod device;
pub mod disable;
pub mod enable;
pub mod status;
