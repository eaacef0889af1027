use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use baseot::{
    Co15Receiver, Co15Sender, Hl17Receiver, Hl17Sender, RandomOtReceiver, RandomOtSender,
};
use crypto_core::{AesRng, Block, Connection, Role, TcpConnection};
use rand::Rng;
use structopt::StructOpt;

#[derive(Debug, Clone, Copy)]
enum Party {
    Sender,
    Receiver,
}

impl FromStr for Party {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sender" | "0" => Ok(Party::Sender),
            "receiver" | "1" => Ok(Party::Receiver),
            other => Err(format!("unknown party: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Protocol {
    Hl17,
    Co15,
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hl17" => Ok(Protocol::Hl17),
            "co15" => Ok(Protocol::Co15),
            other => Err(format!("unknown protocol: {}", other)),
        }
    }
}

#[derive(StructOpt, Debug)]
#[structopt(name = "baseot", about = "Run batched random OT between two parties.")]
struct Options {
    /// Party to play: sender or receiver
    #[structopt(short, long)]
    role: Party,
    /// IP address of the sender
    #[structopt(short, long, default_value = "127.0.0.1")]
    address: String,
    /// Port the sender listens on
    #[structopt(short, long, default_value = "7766")]
    port: u16,
    /// Number of OT instances
    #[structopt(short, long, default_value = "128")]
    number: usize,
    /// Number of worker threads; 1 keeps everything on the calling thread
    #[structopt(short, long, default_value = "1")]
    threads: usize,
    /// Protocol to run: hl17 or co15
    #[structopt(long, default_value = "hl17")]
    protocol: Protocol,
    /// Receiver choice bits, one '0' or '1' character each; random if omitted
    #[structopt(short, long)]
    input: Option<PathBuf>,
    /// File receiving the derived keys as hex lines; stdout if omitted
    #[structopt(short, long)]
    output: Option<PathBuf>,
}

fn read_choices(options: &Options, rng: &mut AesRng) -> Result<Vec<bool>, Box<dyn Error>> {
    match &options.input {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            let choices: Vec<bool> = text
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| match c {
                    '0' => Ok(false),
                    '1' => Ok(true),
                    other => Err(format!("invalid choice bit: {:?}", other)),
                })
                .collect::<Result<_, _>>()?;
            if choices.len() != options.number {
                return Err(format!(
                    "expected {} choice bits, found {}",
                    options.number,
                    choices.len()
                )
                .into());
            }
            Ok(choices)
        }
        None => Ok((0..options.number).map(|_| rng.gen::<bool>()).collect()),
    }
}

fn write_lines(path: &Option<PathBuf>, lines: Vec<String>) -> Result<(), Box<dyn Error>> {
    let text = lines.join("\n") + "\n";
    match path {
        Some(path) => fs::write(path, text)?,
        None => print!("{}", text),
    }
    Ok(())
}

fn run_sender<S, C>(
    mut ot: S,
    channel: &mut C,
    options: &Options,
    rng: &mut AesRng,
) -> Result<Vec<(Block, Block)>, Box<dyn Error>>
where
    S: RandomOtSender,
    C: Connection,
{
    let pairs = if options.threads > 1 {
        ot.send_batch_parallel(channel, options.number, options.threads, rng)?
    } else {
        ot.send_batch(channel, options.number, rng)?
    };
    Ok(pairs)
}

fn run_receiver<R, C>(
    mut ot: R,
    channel: &mut C,
    choices: &[bool],
    options: &Options,
    rng: &mut AesRng,
) -> Result<Vec<Block>, Box<dyn Error>>
where
    R: RandomOtReceiver,
    C: Connection,
{
    let keys = if options.threads > 1 {
        ot.receive_batch_parallel(channel, choices, options.threads, rng)?
    } else {
        ot.receive_batch(channel, choices, rng)?
    };
    Ok(keys)
}

fn main() -> Result<(), Box<dyn Error>> {
    let options = Options::from_args();
    let mut rng = AesRng::new();

    let role = match options.role {
        Party::Sender => Role::Server,
        Party::Receiver => Role::Client,
    };
    let mut channel = TcpConnection::from_role(role, (options.address.as_str(), options.port))?;

    match options.role {
        Party::Sender => {
            let pairs = match options.protocol {
                Protocol::Hl17 => run_sender(Hl17Sender, &mut channel, &options, &mut rng)?,
                Protocol::Co15 => run_sender(Co15Sender, &mut channel, &options, &mut rng)?,
            };
            let lines = pairs
                .iter()
                .map(|(k0, k1)| format!("{} {}", k0, k1))
                .collect();
            write_lines(&options.output, lines)?;
        }
        Party::Receiver => {
            let choices = read_choices(&options, &mut rng)?;
            let keys = match options.protocol {
                Protocol::Hl17 => {
                    run_receiver(Hl17Receiver, &mut channel, &choices, &options, &mut rng)?
                }
                Protocol::Co15 => {
                    run_receiver(Co15Receiver, &mut channel, &choices, &options, &mut rng)?
                }
            };
            let lines = keys.iter().map(|key| format!("{}", key)).collect();
            write_lines(&options.output, lines)?;
        }
    }
    Ok(())
}
