use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("gamelink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: gamelink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("GAMELINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "build_profile: {}",
        option_env!("GAMELINK_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "default_max_packet: {}",
        gamelink_frame::DEFAULT_MAX_PACKET
    );
    println!(
        "default_queues: game={} system={}",
        gamelink_session::DEFAULT_GAME_QUEUE_CAPACITY,
        gamelink_session::DEFAULT_SYSTEM_QUEUE_CAPACITY
    );
    println!("features: session=true, cli=true");

    Ok(SUCCESS)
}
