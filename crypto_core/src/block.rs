//! Defines a 128-bit value type `Block`, the unit of key material produced
//! by the OT protocols.

use std::fmt;
use std::ops::{BitXor, BitXorAssign};

use rand::distributions::{Distribution, Standard};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A fixed 16-byte value.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block([u8; 16]);

impl Block {
    /// Size of a block in bytes.
    pub const LEN: usize = 16;

    /// New block from an array of bytes.
    #[inline(always)]
    pub fn new(bytes: [u8; 16]) -> Self {
        Block(bytes)
    }

    /// Return the bytes of the block.
    #[inline(always)]
    pub fn to_bytes(self) -> [u8; 16] {
        self.0
    }

    /// New block from a slice, which must hold exactly 16 bytes.
    pub fn try_from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::LEN {
            return None;
        }
        let mut res = [0u8; 16];
        res.copy_from_slice(bytes);
        Some(Block(res))
    }
}

impl From<[u8; 16]> for Block {
    #[inline(always)]
    fn from(bytes: [u8; 16]) -> Self {
        Block(bytes)
    }
}

impl From<Block> for [u8; 16] {
    #[inline(always)]
    fn from(blk: Block) -> Self {
        blk.0
    }
}

impl AsRef<[u8]> for Block {
    #[inline(always)]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl AsMut<[u8]> for Block {
    #[inline(always)]
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

impl BitXor for Block {
    type Output = Block;

    #[inline(always)]
    fn bitxor(self, rhs: Self) -> Self::Output {
        let mut res = self.0;
        for (x, y) in res.iter_mut().zip(rhs.0.iter()) {
            *x ^= y;
        }
        Block(res)
    }
}

impl BitXorAssign for Block {
    #[inline(always)]
    fn bitxor_assign(&mut self, rhs: Self) {
        for (x, y) in self.0.iter_mut().zip(rhs.0.iter()) {
            *x ^= y;
        }
    }
}

impl Distribution<Block> for Standard {
    #[inline(always)]
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Block {
        Block(rng.gen::<[u8; 16]>())
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for byte in self.0.iter() {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
