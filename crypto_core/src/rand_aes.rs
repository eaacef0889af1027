//! Implements a random number generator based on AES-128 in counter mode.

use aes::Aes128;
use cipher::generic_array::GenericArray;
use cipher::{BlockEncrypt, KeyInit};
use rand::Rng;
use rand_core::block::{BlockRng, BlockRngCore};
use rand_core::{CryptoRng, Error, RngCore, SeedableRng};

use crate::Block;

/// A random number generator producing the AES-128 encryptions of a counter
/// under a key derived from the seed.
#[derive(Clone)]
pub struct AesRng(BlockRng<AesRngCore>);

impl AesRng {
    /// New rng with a seed drawn from system entropy.
    pub fn new() -> Self {
        AesRng::from_seed(rand::random::<Block>())
    }

    /// Generate a random block.
    #[inline(always)]
    pub fn gen_block(&mut self) -> Block {
        self.gen()
    }

    /// Generate `num` random blocks.
    pub fn gen_blocks(&mut self, num: usize) -> Vec<Block> {
        (0..num).map(|_| self.gen()).collect()
    }
}

impl Default for AesRng {
    fn default() -> Self {
        AesRng::new()
    }
}

impl RngCore for AesRng {
    #[inline(always)]
    fn next_u32(&mut self) -> u32 {
        self.0.next_u32()
    }

    #[inline(always)]
    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }

    #[inline(always)]
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest)
    }

    #[inline(always)]
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.0.try_fill_bytes(dest)
    }
}

impl SeedableRng for AesRng {
    type Seed = Block;

    fn from_seed(seed: Self::Seed) -> Self {
        AesRng(BlockRng::new(AesRngCore::from_seed(seed)))
    }
}

impl CryptoRng for AesRng {}

/// Counter-mode core of [`AesRng`].
#[derive(Clone)]
pub struct AesRngCore {
    cipher: Aes128,
    counter: u64,
}

impl BlockRngCore for AesRngCore {
    type Item = u32;
    type Results = [u32; 4];

    fn generate(&mut self, results: &mut Self::Results) {
        let mut block = [0u8; 16];
        block[..8].copy_from_slice(&self.counter.to_le_bytes());
        self.counter = self.counter.wrapping_add(1);
        let mut block = GenericArray::from(block);
        self.cipher.encrypt_block(&mut block);
        for (res, chunk) in results.iter_mut().zip(block.chunks_exact(4)) {
            *res = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
    }
}

impl SeedableRng for AesRngCore {
    type Seed = Block;

    fn from_seed(seed: Self::Seed) -> Self {
        AesRngCore {
            cipher: Aes128::new(GenericArray::from_slice(seed.as_ref())),
            counter: 0,
        }
    }
}

impl CryptoRng for AesRngCore {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_from_seed() {
        let seed = Block::new([7u8; 16]);
        let mut rng1 = AesRng::from_seed(seed);
        let mut rng2 = AesRng::from_seed(seed);
        assert_eq!(rng1.gen_blocks(32), rng2.gen_blocks(32));
    }

    #[test]
    fn test_seeds_differ() {
        let mut rng1 = AesRng::from_seed(Block::new([0u8; 16]));
        let mut rng2 = AesRng::from_seed(Block::new([1u8; 16]));
        assert_ne!(rng1.gen_block(), rng2.gen_block());
    }

    #[test]
    fn test_fill_odd_lengths() {
        let mut rng = AesRng::new();
        for len in [1usize, 3, 15, 16, 17, 100] {
            let mut buf = vec![0u8; len];
            rng.fill_bytes(&mut buf);
        }
    }
}
