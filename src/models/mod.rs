mod shortened_url;
pub mod timestamp;

pub use shortened_url::*;
