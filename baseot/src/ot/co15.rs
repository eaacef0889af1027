//! Random OT from the SimpleOT protocol of Chou and Orlandi
//! (cf. <https://eprint.iacr.org/2015/267>), in which one key pair is
//! shared by every instance of a batch.
//!
//! The sender samples a single `y` per batch and announces `S = y*G` once;
//! each instance's receiver answers with `R = x*G`, shifted by `S` itself
//! when the choice bit is set. The sender's keys are `H(S, R, y*R)` and
//! `H(S, R, y*R - y*S)`; the receiver's `H(S, R, x*S)` equals the one
//! indexed by its choice. Unlike the per-instance-keyed engine there is no
//! hashed tweak point: `S` plays that role directly.

use crypto_core::threading::compute;
use crypto_core::{Block, Connection};
use curve25519_dalek::constants::RISTRETTO_BASEPOINT_TABLE;
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoBasepointTable, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use rand::{CryptoRng, Rng};
use rayon::ThreadPool;

use super::errors::{OtReceiverError, OtSenderError};
use super::{
    decode_point, pack_points, transcript_key, RandomOtReceiver, RandomOtSender, POINT_BYTES,
};

/// Sender of the batch-shared-key protocol.
#[derive(Debug, Default, Clone, Copy)]
pub struct Co15Sender;

/// Receiver of the batch-shared-key protocol.
#[derive(Debug, Default, Clone, Copy)]
pub struct Co15Receiver;

/// Sender state shared by every instance of a batch.
struct SenderShared {
    y: Scalar,
    s: CompressedRistretto,
    // y*S, subtracted from y*R for the choice-1 branch
    ys: RistrettoPoint,
}

fn sender_shared<R: CryptoRng + Rng>(rng: &mut R) -> SenderShared {
    let y = Scalar::random(rng);
    let s_point = &y * &RISTRETTO_BASEPOINT_TABLE;
    SenderShared {
        y,
        s: s_point.compress(),
        ys: y * s_point,
    }
}

fn sender_keys(shared: &SenderShared, response: &[u8]) -> Result<(Block, Block), OtSenderError> {
    let (r_encoded, r) = decode_point(response).ok_or(OtSenderError::InvalidPoint)?;
    let yr = shared.y * r;
    let key_zero = transcript_key(&shared.s, &r_encoded, &yr);
    let key_one = transcript_key(&shared.s, &r_encoded, &(yr - shared.ys));
    Ok((key_zero, key_one))
}

/// Receiver state shared by every instance of a batch. The basepoint table
/// for `S` amortizes the per-instance `x*S` multiplications.
struct ReceiverShared {
    s: CompressedRistretto,
    s_point: RistrettoPoint,
    s_table: RistrettoBasepointTable,
}

fn receiver_shared(announcement: &[u8]) -> Result<ReceiverShared, OtReceiverError> {
    let (s, s_point) = decode_point(announcement).ok_or(OtReceiverError::InvalidPoint)?;
    Ok(ReceiverShared {
        s,
        s_point,
        s_table: RistrettoBasepointTable::create(&s_point),
    })
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
    r: CompressedRistretto,
}

fn receiver_respond(setup: &ReceiverSetup, shared: &ReceiverShared) -> ReceiverReady {
    let mut r = &setup.x * &RISTRETTO_BASEPOINT_TABLE;
    if setup.choice {
        r += shared.s_point;
    }
    ReceiverReady {
        x: setup.x,
        r: r.compress(),
    }
}

fn receiver_key(state: &ReceiverReady, shared: &ReceiverShared) -> Block {
    transcript_key(&shared.s, &state.r, &(&state.x * &shared.s_table))
}

impl RandomOtSender for Co15Sender {
    fn send<C: Connection, R: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        rng: &mut R,
    ) -> Result<(Block, Block), OtSenderError> {
        let shared = sender_shared(rng);
        channel.send(shared.s.as_bytes())?;
        channel.flush()?;
        let mut response = [0u8; POINT_BYTES];
        channel.recv(&mut response)?;
        sender_keys(&shared, &response)
    }

    fn send_batch<C: Connection, R: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        number_ots: usize,
        rng: &mut R,
    ) -> Result<Vec<(Block, Block)>, OtSenderError> {
        let shared = sender_shared(rng);

        let sending = channel.async_send(shared.s.as_bytes().to_vec())?;
        let receiving = channel.async_recv(number_ots * POINT_BYTES)?;

        let responses = receiving.wait()?;
        let output = responses
            .chunks_exact(POINT_BYTES)
            .map(|response| sender_keys(&shared, response))
            .collect::<Result<Vec<_>, _>>()?;

        sending.wait()?;
        Ok(output)
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
        let shared = sender_shared(rng);

        let sending = channel.async_send(shared.s.as_bytes().to_vec())?;
        let receiving = channel.async_recv(number_ots * POINT_BYTES)?;

        let responses = receiving.wait()?;
        let output = compute(pool, number_ots, number_threads, |i| {
            sender_keys(&shared, &responses[i * POINT_BYTES..(i + 1) * POINT_BYTES])
        })
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

        sending.wait()?;
        Ok(output)
    }
}

impl RandomOtReceiver for Co15Receiver {
    fn receive<C: Connection, R: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        choice: bool,
        rng: &mut R,
    ) -> Result<Block, OtReceiverError> {
        let setup = receiver_setup(choice, rng);
        let mut announcement = [0u8; POINT_BYTES];
        channel.recv(&mut announcement)?;
        let shared = receiver_shared(&announcement)?;
        let state = receiver_respond(&setup, &shared);
        channel.send(state.r.as_bytes())?;
        channel.flush()?;
        Ok(receiver_key(&state, &shared))
    }

    fn receive_batch<C: Connection, R: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        choices: &[bool],
        rng: &mut R,
    ) -> Result<Vec<Block>, OtReceiverError> {
        let number_ots = choices.len();
        let receiving = channel.async_recv(POINT_BYTES)?;

        let setups: Vec<ReceiverSetup> = choices
            .iter()
            .map(|&choice| receiver_setup(choice, rng))
            .collect();

        let announcement = receiving.wait()?;
        let shared = receiver_shared(&announcement)?;

        let states: Vec<ReceiverReady> = setups
            .iter()
            .map(|setup| receiver_respond(setup, &shared))
            .collect();

        let responses = pack_points(states.iter().map(|state| &state.r), number_ots);
        let sending = channel.async_send(responses)?;

        let output = states
            .iter()
            .map(|state| receiver_key(state, &shared))
            .collect();

        sending.wait()?;
        Ok(output)
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
        let receiving = channel.async_recv(POINT_BYTES)?;

        let setups: Vec<ReceiverSetup> = choices
            .iter()
            .map(|&choice| receiver_setup(choice, rng))
            .collect();

        let announcement = receiving.wait()?;
        let shared = receiver_shared(&announcement)?;

        let states = compute(pool, number_ots, number_threads, |i| {
            receiver_respond(&setups[i], &shared)
        });

        let responses = pack_points(states.iter().map(|state| &state.r), number_ots);
        let sending = channel.async_send(responses)?;

        let output = compute(pool, number_ots, number_threads, |i| {
            receiver_key(&states[i], &shared)
        });

        sending.wait()?;
        Ok(output)
    }
}
