pub mod nms;
pub mod post;
