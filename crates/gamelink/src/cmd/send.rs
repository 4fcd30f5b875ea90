use gamelink_session::Session;
use tracing::info;

use crate::cmd::{parse_hex, session_config, SendArgs};
use crate::exit::{session_error, CliError, CliResult, SUCCESS};

enum Outgoing {
    Raw(Vec<u8>),
    Framed { type_id: u8, payload: Vec<u8> },
}

pub fn run(args: SendArgs) -> CliResult<i32> {
    let outgoing = resolve_outgoing(&args)?;
    let config = session_config(args.catalog.as_deref(), &args.timeout)?;

    let mut session = Session::new();
    session
        .initialize(config, &args.address)
        .map_err(|err| session_error("connect failed", err))?;

    let sent = match &outgoing {
        Outgoing::Raw(bytes) => session.send(bytes),
        Outgoing::Framed { type_id, payload } => session.send_packet(*type_id, payload),
    }
    .map_err(|err| session_error("send failed", err));

    session.release();
    let sent = sent?;
    info!(server = %args.address, bytes = sent, "packet sent");
    Ok(SUCCESS)
}

fn resolve_outgoing(args: &SendArgs) -> CliResult<Outgoing> {
    if let Some(hex) = &args.hex {
        return Ok(Outgoing::Raw(parse_hex(hex)?));
    }
    if let Some(type_id) = args.type_id {
        let payload = args.data.clone().unwrap_or_default().into_bytes();
        return Ok(Outgoing::Framed { type_id, payload });
    }
    Err(CliError::usage("one of --hex or --type is required"))
}
