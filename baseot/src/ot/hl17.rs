//! Random OT from the Diffie-Hellman-style protocol of Hauck and Loss
//! (cf. <https://eprint.iacr.org/2017/1011>), in which every instance
//! carries its own key pair.
//!
//! Per instance the sender samples `y` and announces `S = y*G`; both
//! parties derive the tweak point `T` by hashing `S` back into the group.
//! The receiver answers with `R = x*G`, shifted by `T` when its choice bit
//! is set. The sender's keys are `H(S, R, y*R)` and `H(S, R, y*(R - T))`;
//! the receiver's `H(S, R, x*S)` equals the one indexed by its choice.

use crypto_core::threading::compute;
use crypto_core::{Block, Connection};
use curve25519_dalek::constants::RISTRETTO_BASEPOINT_TABLE;
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use rand::{CryptoRng, Rng};
use rayon::ThreadPool;

use super::errors::{OtReceiverError, OtSenderError};
use super::{
    decode_point, hash_to_point, pack_points, transcript_key, RandomOtReceiver, RandomOtSender,
    POINT_BYTES,
};

/// Sender of the per-instance-keyed protocol.
#[derive(Debug, Default, Clone, Copy)]
pub struct Hl17Sender;

/// Receiver of the per-instance-keyed protocol.
#[derive(Debug, Default, Clone, Copy)]
pub struct Hl17Receiver;

#[derive(Clone, Copy)]
struct SenderSetup {
    y: Scalar,
    s: CompressedRistretto,
}

fn sender_setup<R: CryptoRng + Rng>(rng: &mut R) -> SenderSetup {
    let y = Scalar::random(rng);
    let s = (&y * &RISTRETTO_BASEPOINT_TABLE).compress();
    SenderSetup { y, s }
}

#[derive(Clone, Copy)]
struct SenderReady {
    y: Scalar,
    s: CompressedRistretto,
    t: RistrettoPoint,
}

/// Derive the tweak point; done after the announcement is on the wire so
/// the hashing overlaps the transfer.
fn sender_tweak(setup: &SenderSetup) -> SenderReady {
    SenderReady {
        y: setup.y,
        s: setup.s,
        t: hash_to_point(&setup.s),
    }
}

fn sender_keys(state: &SenderReady, response: &[u8]) -> Result<(Block, Block), OtSenderError> {
    let (r_encoded, r) = decode_point(response).ok_or(OtSenderError::InvalidPoint)?;
    let key_zero = transcript_key(&state.s, &r_encoded, &(state.y * r));
    let key_one = transcript_key(&state.s, &r_encoded, &(state.y * (r - state.t)));
    Ok((key_zero, key_one))
}

#[derive(Clone, Copy)]
struct ReceiverSetup {
    choice: bool,
    x: Scalar,
}

fn receiver_setup<R: CryptoRng + Rng>(choice: bool, rng: &mut R) -> ReceiverSetup {
    ReceiverSetup {
        choice,
        x: Scalar::random(rng),
    }
}

#[derive(Clone, Copy)]
struct ReceiverReady {
    x: Scalar,
    s: CompressedRistretto,
    s_point: RistrettoPoint,
    r: CompressedRistretto,
}

/// Decode the announcement and compute the response point.
fn receiver_respond(
    setup: &ReceiverSetup,
    announcement: &[u8],
) -> Result<ReceiverReady, OtReceiverError> {
    let (s, s_point) = decode_point(announcement).ok_or(OtReceiverError::InvalidPoint)?;
    let mut r = &setup.x * &RISTRETTO_BASEPOINT_TABLE;
    if setup.choice {
        r += hash_to_point(&s);
    }
    Ok(ReceiverReady {
        x: setup.x,
        s,
        s_point,
        r: r.compress(),
    })
}

fn receiver_key(state: &ReceiverReady) -> Block {
    transcript_key(&state.s, &state.r, &(state.x * state.s_point))
}

impl Hl17Sender {
    /// Batch send overlapping the two bulk transfers with the tweak and
    /// key derivations.
    pub fn send_batch_async<C: Connection, R: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        number_ots: usize,
        rng: &mut R,
    ) -> Result<Vec<(Block, Block)>, OtSenderError> {
        let setups: Vec<SenderSetup> = (0..number_ots).map(|_| sender_setup(rng)).collect();
        let announcements = pack_points(setups.iter().map(|setup| &setup.s), number_ots);

        let sending = channel.async_send(announcements)?;
        let receiving = channel.async_recv(number_ots * POINT_BYTES)?;

        let states: Vec<SenderReady> = setups.iter().map(sender_tweak).collect();

        let responses = receiving.wait()?;
        let output = states
            .iter()
            .zip(responses.chunks_exact(POINT_BYTES))
            .map(|(state, response)| sender_keys(state, response))
            .collect::<Result<Vec<_>, _>>()?;

        sending.wait()?;
        Ok(output)
    }
}

impl Hl17Receiver {
    /// Batch receive overlapping the two bulk transfers with the response
    /// and key derivations.
    pub fn receive_batch_async<C: Connection, R: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        choices: &[bool],
        rng: &mut R,
    ) -> Result<Vec<Block>, OtReceiverError> {
        let number_ots = choices.len();
        let receiving = channel.async_recv(number_ots * POINT_BYTES)?;

        let setups: Vec<ReceiverSetup> = choices
            .iter()
            .map(|&choice| receiver_setup(choice, rng))
            .collect();

        let announcements = receiving.wait()?;
        let states = setups
            .iter()
            .zip(announcements.chunks_exact(POINT_BYTES))
            .map(|(setup, announcement)| receiver_respond(setup, announcement))
            .collect::<Result<Vec<_>, _>>()?;

        let responses = pack_points(states.iter().map(|state| &state.r), number_ots);
        let sending = channel.async_send(responses)?;

        let output = states.iter().map(receiver_key).collect();
        sending.wait()?;
        Ok(output)
    }
}

impl RandomOtSender for Hl17Sender {
    fn send<C: Connection, R: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        rng: &mut R,
    ) -> Result<(Block, Block), OtSenderError> {
        let setup = sender_setup(rng);
        channel.send_message(setup.s.as_bytes())?;
        let state = sender_tweak(&setup);
        let response = channel.recv_message()?;
        sender_keys(&state, &response)
    }

    fn send_batch<C: Connection, R: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        number_ots: usize,
        rng: &mut R,
    ) -> Result<Vec<(Block, Block)>, OtSenderError> {
        let setups: Vec<SenderSetup> = (0..number_ots).map(|_| sender_setup(rng)).collect();
        let announcements = pack_points(setups.iter().map(|setup| &setup.s), number_ots);
        channel.send(&announcements)?;
        channel.flush()?;

        let states: Vec<SenderReady> = setups.iter().map(sender_tweak).collect();

        let mut responses = vec![0u8; number_ots * POINT_BYTES];
        channel.recv(&mut responses)?;
        states
            .iter()
            .zip(responses.chunks_exact(POINT_BYTES))
            .map(|(state, response)| sender_keys(state, response))
            .collect()
    }

    fn send_batch_parallel_in<C: Connection, R: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        number_ots: usize,
        number_threads: usize,
        pool: &ThreadPool,
        rng: &mut R,
    ) -> Result<Vec<(Block, Block)>, OtSenderError> {
        if number_threads == 0 {
            return Err(OtSenderError::NoThreads);
        }
        let setups: Vec<SenderSetup> = (0..number_ots).map(|_| sender_setup(rng)).collect();
        let announcements = pack_points(setups.iter().map(|setup| &setup.s), number_ots);

        let sending = channel.async_send(announcements)?;
        let receiving = channel.async_recv(number_ots * POINT_BYTES)?;

        let states = compute(pool, number_ots, number_threads, |i| {
            sender_tweak(&setups[i])
        });

        let responses = receiving.wait()?;
        let output = compute(pool, number_ots, number_threads, |i| {
            sender_keys(
                &states[i],
                &responses[i * POINT_BYTES..(i + 1) * POINT_BYTES],
            )
        })
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

        sending.wait()?;
        Ok(output)
    }
}

impl RandomOtReceiver for Hl17Receiver {
    fn receive<C: Connection, R: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        choice: bool,
        rng: &mut R,
    ) -> Result<Block, OtReceiverError> {
        let setup = receiver_setup(choice, rng);
        let announcement = channel.recv_message()?;
        let state = receiver_respond(&setup, &announcement)?;
        channel.send_message(state.r.as_bytes())?;
        Ok(receiver_key(&state))
    }

    fn receive_batch<C: Connection, R: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        choices: &[bool],
        rng: &mut R,
    ) -> Result<Vec<Block>, OtReceiverError> {
        let number_ots = choices.len();
        let setups: Vec<ReceiverSetup> = choices
            .iter()
            .map(|&choice| receiver_setup(choice, rng))
            .collect();

        let mut announcements = vec![0u8; number_ots * POINT_BYTES];
        channel.recv(&mut announcements)?;

        let states = setups
            .iter()
            .zip(announcements.chunks_exact(POINT_BYTES))
            .map(|(setup, announcement)| receiver_respond(setup, announcement))
            .collect::<Result<Vec<_>, _>>()?;

        let responses = pack_points(states.iter().map(|state| &state.r), number_ots);
        channel.send(&responses)?;
        channel.flush()?;

        Ok(states.iter().map(receiver_key).collect())
    }

    fn receive_batch_parallel_in<C: Connection, R: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        choices: &[bool],
        number_threads: usize,
        pool: &ThreadPool,
        rng: &mut R,
    ) -> Result<Vec<Block>, OtReceiverError> {
        if number_threads == 0 {
            return Err(OtReceiverError::NoThreads);
        }
        let number_ots = choices.len();
        let receiving = channel.async_recv(number_ots * POINT_BYTES)?;

        let setups: Vec<ReceiverSetup> = choices
            .iter()
            .map(|&choice| receiver_setup(choice, rng))
            .collect();

        let announcements = receiving.wait()?;
        let states = compute(pool, number_ots, number_threads, |i| {
            receiver_respond(
                &setups[i],
                &announcements[i * POINT_BYTES..(i + 1) * POINT_BYTES],
            )
        })
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

        let responses = pack_points(states.iter().map(|state| &state.r), number_ots);
        let sending = channel.async_send(responses)?;

        let output = compute(pool, number_ots, number_threads, |i| {
            receiver_key(&states[i])
        });
        sending.wait()?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use crypto_core::{local_connection_pair, AesRng, Block};
    use rand_core::SeedableRng;

    use super::*;

    #[test]
    fn test_phases_agree() {
        let mut rng = AesRng::new();
        for _ in 0..10 {
            for &choice in &[false, true] {
                let setup_s = sender_setup(&mut rng);
                let setup_r = receiver_setup(choice, &mut rng);

                let state_s = sender_tweak(&setup_s);
                let state_r = receiver_respond(&setup_r, setup_s.s.as_bytes()).unwrap();

                let (key_zero, key_one) = sender_keys(&state_s, state_r.r.as_bytes()).unwrap();
                let key = receiver_key(&state_r);

                assert_ne!(key_zero, key_one);
                assert_eq!(key, if choice { key_one } else { key_zero });
            }
        }
    }

    #[test]
    fn test_single_over_connection() {
        for &choice in &[false, true] {
            let (mut left, mut right) = local_connection_pair().unwrap();

            let handle = thread::spawn(move || {
                let mut ot = Hl17Sender;
                let mut rng = AesRng::new();
                ot.send(&mut left, &mut rng).unwrap()
            });

            let mut ot = Hl17Receiver;
            let mut rng = AesRng::new();
            let key = ot.receive(&mut right, choice, &mut rng).unwrap();
            let pair = handle.join().unwrap();
            assert_eq!(key, if choice { pair.1 } else { pair.0 });
        }
    }

    fn check_outputs(choices: &[bool], pairs: &[(Block, Block)], keys: &[Block]) {
        assert_eq!(pairs.len(), choices.len());
        assert_eq!(keys.len(), choices.len());
        for ((&choice, pair), key) in choices.iter().zip(pairs.iter()).zip(keys.iter()) {
            assert_ne!(pair.0, pair.1);
            assert_eq!(*key, if choice { pair.1 } else { pair.0 });
        }
    }

    #[test]
    fn test_batch() {
        let choices = [false, true, true, false, false, true, false, true];
        let (mut left, mut right) = local_connection_pair().unwrap();

        let handle = thread::spawn(move || {
            let mut ot = Hl17Sender;
            let mut rng = AesRng::new();
            ot.send_batch(&mut left, 8, &mut rng).unwrap()
        });

        let mut ot = Hl17Receiver;
        let mut rng = AesRng::new();
        let keys = ot.receive_batch(&mut right, &choices, &mut rng).unwrap();
        let pairs = handle.join().unwrap();
        check_outputs(&choices, &pairs, &keys);
    }

    #[test]
    fn test_batch_async() {
        let mut rng = AesRng::new();
        let choices: Vec<bool> = (0..128).map(|_| rng.gen::<bool>()).collect();
        let (mut left, mut right) = local_connection_pair().unwrap();

        let handle = thread::spawn(move || {
            let mut ot = Hl17Sender;
            let mut rng = AesRng::new();
            ot.send_batch_async(&mut left, 128, &mut rng).unwrap()
        });

        let mut ot = Hl17Receiver;
        let keys = ot
            .receive_batch_async(&mut right, &choices, &mut rng)
            .unwrap();
        let pairs = handle.join().unwrap();
        check_outputs(&choices, &pairs, &keys);
    }

    #[test]
    fn test_empty_batch() {
        let (mut left, mut right) = local_connection_pair().unwrap();

        let handle = thread::spawn(move || {
            let mut ot = Hl17Sender;
            let mut rng = AesRng::new();
            ot.send_batch(&mut left, 0, &mut rng).unwrap()
        });

        let mut ot = Hl17Receiver;
        let mut rng = AesRng::new();
        let keys = ot.receive_batch(&mut right, &[], &mut rng).unwrap();
        assert!(keys.is_empty());
        assert!(handle.join().unwrap().is_empty());
    }

    fn run_batch(
        choices: &[bool],
        threads: Option<usize>,
        sender_seed: Block,
        receiver_seed: Block,
    ) -> (Vec<(Block, Block)>, Vec<Block>) {
        let number_ots = choices.len();
        let choices = choices.to_vec();
        let (mut left, mut right) = local_connection_pair().unwrap();

        let handle = thread::spawn(move || {
            let mut ot = Hl17Sender;
            let mut rng = AesRng::from_seed(sender_seed);
            match threads {
                Some(t) => ot
                    .send_batch_parallel(&mut left, number_ots, t, &mut rng)
                    .unwrap(),
                None => ot.send_batch(&mut left, number_ots, &mut rng).unwrap(),
            }
        });

        let mut ot = Hl17Receiver;
        let mut rng = AesRng::from_seed(receiver_seed);
        let keys = match threads {
            Some(t) => ot
                .receive_batch_parallel(&mut right, &choices, t, &mut rng)
                .unwrap(),
            None => ot.receive_batch(&mut right, &choices, &mut rng).unwrap(),
        };
        (handle.join().unwrap(), keys)
    }

    #[test]
    fn test_parallel_matches_batch() {
        let choices = [false, true, true, false, false, true, false, true];
        let sender_seed = Block::new([3u8; 16]);
        let receiver_seed = Block::new([4u8; 16]);

        let (pairs, keys) = run_batch(&choices, None, sender_seed, receiver_seed);
        check_outputs(&choices, &pairs, &keys);

        for threads in [1, 2, 4, 8] {
            let (par_pairs, par_keys) =
                run_batch(&choices, Some(threads), sender_seed, receiver_seed);
            assert_eq!(par_pairs, pairs);
            assert_eq!(par_keys, keys);
        }
    }

    #[test]
    fn test_sender_rejects_invalid_response() {
        let (mut left, mut right) = local_connection_pair().unwrap();

        let handle = thread::spawn(move || {
            let mut ot = Hl17Sender;
            let mut rng = AesRng::new();
            ot.send(&mut left, &mut rng)
        });

        let _announcement = right.recv_message().unwrap();
        right.send_message(&[0xffu8; 32]).unwrap();
        assert!(matches!(
            handle.join().unwrap(),
            Err(OtSenderError::InvalidPoint)
        ));
    }

    #[test]
    fn test_receiver_rejects_invalid_announcement() {
        let (mut left, mut right) = local_connection_pair().unwrap();

        let handle = thread::spawn(move || {
            left.send_message(&[0xffu8; 32]).unwrap();
        });

        let mut ot = Hl17Receiver;
        let mut rng = AesRng::new();
        assert!(matches!(
            ot.receive(&mut right, false, &mut rng),
            Err(OtReceiverError::InvalidPoint)
        ));
        handle.join().unwrap();
    }
}
