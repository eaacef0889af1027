//! Provides traits for 1-out-of-2 random oblivious transfer protocols,
//! together with the group-element decoding and hashing shared by the
//! engines.

pub mod co15;
pub mod errors;
pub mod hl17;

pub use co15::{Co15Receiver, Co15Sender};
pub use errors::{OtReceiverError, OtSenderError};
pub use hl17::{Hl17Receiver, Hl17Sender};

use blake2::digest::consts::{U16, U32};
use blake2::{Blake2b, Digest};
use crypto_core::{Block, Connection};
use curve25519_dalek::constants::RISTRETTO_BASEPOINT_TABLE;
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use rand::{CryptoRng, Rng};
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

/// Byte length of an encoded group element.
pub const POINT_BYTES: usize = 32;

type Blake2b128 = Blake2b<U16>;
type Blake2b256 = Blake2b<U32>;

/// Sender side of a random OT.
pub trait RandomOtSender {
    /// Run a single OT, returning the two fresh keys.
    fn send<C: Connection, R: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        rng: &mut R,
    ) -> Result<(Block, Block), OtSenderError>;

    /// Run `number_ots` independent OTs, exchanging one bulk message per
    /// protocol round.
    fn send_batch<C: Connection, R: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        number_ots: usize,
        rng: &mut R,
    ) -> Result<Vec<(Block, Block)>, OtSenderError>;

    /// Like [`RandomOtSender::send_batch`], with the per-instance
    /// computation fanned out over `pool`.
    fn send_batch_parallel_in<C: Connection, R: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        number_ots: usize,
        number_threads: usize,
        pool: &ThreadPool,
        rng: &mut R,
    ) -> Result<Vec<(Block, Block)>, OtSenderError>;

    /// Like [`RandomOtSender::send_batch_parallel_in`], with a freshly
    /// built pool of `number_threads` workers.
    fn send_batch_parallel<C: Connection, R: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        number_ots: usize,
        number_threads: usize,
        rng: &mut R,
    ) -> Result<Vec<(Block, Block)>, OtSenderError> {
        let pool = new_pool(number_threads)?;
        self.send_batch_parallel_in(channel, number_ots, number_threads, &pool, rng)
    }
}

/// Receiver side of a random OT.
pub trait RandomOtReceiver {
    /// Run a single OT, returning the key selected by `choice`.
    fn receive<C: Connection, R: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        choice: bool,
        rng: &mut R,
    ) -> Result<Block, OtReceiverError>;

    /// Run one OT per choice bit, exchanging one bulk message per protocol
    /// round.
    fn receive_batch<C: Connection, R: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        choices: &[bool],
        rng: &mut R,
    ) -> Result<Vec<Block>, OtReceiverError>;

    /// Like [`RandomOtReceiver::receive_batch`], with the per-instance
    /// computation fanned out over `pool`.
    fn receive_batch_parallel_in<C: Connection, R: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        choices: &[bool],
        number_threads: usize,
        pool: &ThreadPool,
        rng: &mut R,
    ) -> Result<Vec<Block>, OtReceiverError>;

    /// Like [`RandomOtReceiver::receive_batch_parallel_in`], with a freshly
    /// built pool of `number_threads` workers.
    fn receive_batch_parallel<C: Connection, R: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        choices: &[bool],
        number_threads: usize,
        rng: &mut R,
    ) -> Result<Vec<Block>, OtReceiverError> {
        let pool = new_pool(number_threads)?;
        self.receive_batch_parallel_in(channel, choices, number_threads, &pool, rng)
    }
}

pub(crate) fn new_pool(number_threads: usize) -> Result<ThreadPool, ThreadPoolBuildError> {
    ThreadPoolBuilder::new().num_threads(number_threads).build()
}

/// Decode a canonical 32-byte group element, rejecting anything that is not
/// a valid encoding.
pub(crate) fn decode_point(bytes: &[u8]) -> Option<(CompressedRistretto, RistrettoPoint)> {
    if bytes.len() != POINT_BYTES {
        return None;
    }
    let mut encoded = [0u8; POINT_BYTES];
    encoded.copy_from_slice(bytes);
    let compressed = CompressedRistretto(encoded);
    let point = compressed.decompress()?;
    Some((compressed, point))
}

/// Map a group element to another group element by hashing its encoding to
/// a scalar and exponentiating the generator.
pub(crate) fn hash_to_point(point: &CompressedRistretto) -> RistrettoPoint {
    let digest = Blake2b256::digest(point.as_bytes());
    let mut wide = [0u8; 64];
    wide[..32].copy_from_slice(&digest);
    let exponent = Scalar::from_bytes_mod_order_wide(&wide);
    &exponent * &RISTRETTO_BASEPOINT_TABLE
}

/// Pack point encodings contiguously for one bulk transfer.
pub(crate) fn pack_points<'a, I: Iterator<Item = &'a CompressedRistretto>>(
    points: I,
    len: usize,
) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(len * POINT_BYTES);
    for point in points {
        buffer.extend_from_slice(point.as_bytes());
    }
    buffer
}

/// Derive an output key from the transcript `(S, R, shared)` of one
/// instance.
pub(crate) fn transcript_key(
    s: &CompressedRistretto,
    r: &CompressedRistretto,
    shared: &RistrettoPoint,
) -> Block {
    let mut hasher = Blake2b128::new();
    hasher.update(s.as_bytes());
    hasher.update(r.as_bytes());
    hasher.update(shared.compress().as_bytes());
    Block::new(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crypto_core::AesRng;

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_point(&[0xffu8; 32]).is_none());
        assert!(decode_point(&[0u8; 31]).is_none());
        assert!(decode_point(&[0u8; 33]).is_none());
    }

    #[test]
    fn test_decode_round_trip() {
        let mut rng = AesRng::new();
        let point = &Scalar::random(&mut rng) * &RISTRETTO_BASEPOINT_TABLE;
        let encoded = point.compress();
        let (compressed, decoded) = decode_point(encoded.as_bytes()).unwrap();
        assert_eq!(compressed, encoded);
        assert_eq!(decoded, point);
    }

    #[test]
    fn test_hash_to_point_deterministic() {
        let mut rng = AesRng::new();
        let point = (&Scalar::random(&mut rng) * &RISTRETTO_BASEPOINT_TABLE).compress();
        let other = (&Scalar::random(&mut rng) * &RISTRETTO_BASEPOINT_TABLE).compress();
        assert_eq!(hash_to_point(&point), hash_to_point(&point));
        assert_ne!(hash_to_point(&point), hash_to_point(&other));
    }

    #[test]
    fn test_transcript_key_depends_on_all_inputs() {
        let mut rng = AesRng::new();
        let a = &Scalar::random(&mut rng) * &RISTRETTO_BASEPOINT_TABLE;
        let b = &Scalar::random(&mut rng) * &RISTRETTO_BASEPOINT_TABLE;
        let c = &Scalar::random(&mut rng) * &RISTRETTO_BASEPOINT_TABLE;
        let key = transcript_key(&a.compress(), &b.compress(), &c);
        assert_eq!(key, transcript_key(&a.compress(), &b.compress(), &c));
        assert_ne!(key, transcript_key(&b.compress(), &a.compress(), &c));
        assert_ne!(key, transcript_key(&a.compress(), &c.compress(), &b));
    }
}
