pub mod block;
pub mod channel;
pub mod rand_aes;
pub mod threading;

pub use crate::{block::Block, rand_aes::AesRng};

pub use channel::*;
