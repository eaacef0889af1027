use crypto_core::{Connection, Role, TcpConnection};
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
struct Options {
    /// server or client
    #[structopt(short, long)]
    role: Role,
    #[structopt(short, long, default_value = "127.0.0.1:12345")]
    address: String,
}

fn net_channel_test(netio: &mut TcpConnection, role: Role) -> std::io::Result<()> {
    match role {
        Role::Server => {
            netio.send_message(b"a framed message")?;
            netio.send(&[7u8; 32])?;
            netio.flush()?;

            let sending = netio.async_send(vec![1u8; 1 << 20])?;
            let receiving = netio.async_recv(1 << 20)?;
            let received = receiving.wait()?;
            sending.wait()?;
            println!("bulk ok: {}", received.iter().all(|&x| x == 2));
        }
        Role::Client => {
            let message = netio.recv_message()?;
            println!("framed: {}", String::from_utf8_lossy(&message));

            let mut raw = [0u8; 32];
            netio.recv(&mut raw)?;
            println!("raw ok: {}", raw.iter().all(|&x| x == 7));

            let sending = netio.async_send(vec![2u8; 1 << 20])?;
            let receiving = netio.async_recv(1 << 20)?;
            let received = receiving.wait()?;
            sending.wait()?;
            println!("bulk ok: {}", received.iter().all(|&x| x == 1));
        }
    }
    println!(
        "read {} bytes, wrote {} bytes",
        netio.read_bytes(),
        netio.write_bytes()
    );
    Ok(())
}

// run the main function in two terminals
// cargo run --example netio -- --role server
// cargo run --example netio -- --role client
pub fn main() -> std::io::Result<()> {
    let options = Options::from_args();
    let mut netio = TcpConnection::from_role(options.role, options.address.as_str())?;
    println!("connected");
    net_channel_test(&mut netio, options.role)
}
