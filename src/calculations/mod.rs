pub mod forward_pass;
pub mod resolver;
pub mod slack;
