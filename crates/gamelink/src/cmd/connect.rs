use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use gamelink_frame::{Channel, Packet};
use gamelink_session::{DisconnectReason, Session};
use tracing::{info, warn};

use crate::cmd::{parse_duration, parse_hex, session_config, ChannelFilter, ConnectArgs};
use crate::exit::{disconnect_error, session_error, CliError, CliResult, SUCCESS};
use crate::output::{print_packet, print_stats, OutputFormat};

pub fn run(args: ConnectArgs, format: OutputFormat) -> CliResult<i32> {
    let mut config = session_config(args.catalog.as_deref(), &args.timeout)?;
    if let Some(capacity) = args.game_queue_capacity {
        config.game_queue_capacity = capacity;
    }
    if let Some(capacity) = args.system_queue_capacity {
        config.system_queue_capacity = capacity;
    }
    let outgoing = args
        .send_hex
        .iter()
        .map(|hex| parse_hex(hex))
        .collect::<CliResult<Vec<_>>>()?;
    let poll_interval = parse_duration(&args.poll_interval)?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut session = Session::new();
    session
        .initialize(config, &args.address)
        .map_err(|err| session_error("connect failed", err))?;

    for bytes in &outgoing {
        session
            .send(bytes)
            .map_err(|err| session_error("send failed", err))?;
    }

    let mut printed = 0usize;
    let outcome = loop {
        if args.count.is_some_and(|count| printed >= count) {
            break Ok(SUCCESS);
        }
        if !running.load(Ordering::SeqCst) {
            info!("interrupted");
            break Ok(SUCCESS);
        }

        // Sample the state first: once the session is down, every packet it
        // received is already queued.
        let connected = session.is_connected();
        match next_packet(&session, args.channel) {
            Some((packet, channel)) => {
                print_packet(&packet, channel, &args.address, format);
                printed = printed.saturating_add(1);
            }
            None if !connected => break finished(&session, args.count.is_some()),
            None => thread::sleep(poll_interval),
        }
    };

    if args.stats {
        print_stats(
            &args.address,
            session.state().as_str(),
            session.disconnect_reason().map(|r| r.to_string()),
            session.stats(),
            format,
        );
    }
    session.release();
    outcome
}

fn next_packet(session: &Session, filter: ChannelFilter) -> Option<(Packet, Channel)> {
    let system = || {
        session
            .recv_system_packet()
            .map(|packet| (packet, Channel::System))
    };
    let game = || session.recv_game_packet().map(|packet| (packet, Channel::Game));

    match filter {
        ChannelFilter::System => system(),
        ChannelFilter::Game => game(),
        ChannelFilter::All => system().or_else(game),
    }
}

fn finished(session: &Session, expected_more: bool) -> CliResult<i32> {
    match session.disconnect_reason() {
        Some(DisconnectReason::PeerClosed) if !expected_more => {
            info!("server closed the connection");
            Ok(SUCCESS)
        }
        Some(reason) => {
            warn!(%reason, "connection ended");
            Err(disconnect_error(&reason))
        }
        None => Ok(SUCCESS),
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
