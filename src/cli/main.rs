//-
// Copyright (c) 2020, the Mockimap authors
//
// This file is part of Mockimap.
//
// Mockimap is free software: you can  redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Mockimap is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or
// FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for
// more details.
//
// You should have received a copy of the GNU General Public License along
// with Mockimap. If not, see <http://www.gnu.org/licenses/>.

use std::path::{Path, PathBuf};

use structopt::StructOpt;

use crate::support::password;
use crate::support::sysexits::*;
use crate::support::system_config::SystemConfig;

#[derive(StructOpt)]
#[structopt(max_term_width = 80)]
enum Command {
    /// Run a mock IMAP server.
    ///
    /// All mail lives in memory and is lost when the process exits. Users
    /// listed in the configuration are created on startup, each with an
    /// empty INBOX and any extra mailboxes listed for them.
    ///
    /// Connections are unencrypted. Do not expose this to untrusted
    /// networks.
    Serve(ServeSubcommand),
    /// Print a random password, suitable for a test user.
    GenPassword(GenPasswordSubcommand),
}

#[derive(StructOpt)]
pub(super) struct ServeSubcommand {
    /// The TOML configuration file. Without one, the defaults are used and
    /// no users exist until they are auto-created or configured.
    #[structopt(long, parse(from_os_str))]
    pub(super) config: Option<PathBuf>,

    /// The address to listen on, overriding the configuration file.
    #[structopt(long)]
    pub(super) listen: Option<String>,
}

#[derive(StructOpt)]
struct GenPasswordSubcommand {
    /// The length of the password [default: random, 5 to 7]
    #[structopt(long)]
    length: Option<usize>,
}

pub fn main() {
    // Clap exits with status 1 instead of EX_USAGE if we use the more concise
    // API
    let cmd = Command::from_clap(&match Command::clap().get_matches_safe() {
        Ok(matches) => matches,
        Err(
            e @ clap::Error {
                kind: clap::ErrorKind::HelpDisplayed,
                ..
            },
        )
        | Err(
            e @ clap::Error {
                kind: clap::ErrorKind::VersionDisplayed,
                ..
            },
        ) => {
            println!("{}", e.message);
            return;
        }
        Err(e) => {
            eprintln!("{}", e.message);
            EX_USAGE.exit()
        }
    });

    match cmd {
        Command::Serve(cmd) => serve(cmd),
        Command::GenPassword(cmd) => {
            println!(
                "{}",
                password::generate(&mut rand::rngs::OsRng, cmd.length)
            );
        }
    }
}

fn serve(cmd: ServeSubcommand) {
    let mut system_config = match cmd.config {
        Some(ref path) => match SystemConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error in config file at '{}': {}", path.display(), e);
                EX_CONFIG.exit()
            }
        },
        None => SystemConfig::default(),
    };

    if let Some(listen) = cmd.listen {
        system_config.imap.listen = listen;
    }

    init_logging(cmd.config.as_deref());
    super::serve::imap(system_config);
}

fn init_logging(config_path: Option<&Path>) {
    if Ok(true) == nix::unistd::isatty(2) {
        // Running interactively; ignore logging configuration and just write
        // to stderr.
        crate::init_simple_log();
        return;
    }

    let log_config_file = config_path
        .and_then(Path::parent)
        .map(|dir| dir.join("logging.toml"));
    match log_config_file {
        Some(ref file) if file.is_file() => match load_log_config(file) {
            Ok(config) => {
                if let Err(e) = log4rs::init_config(config) {
                    eprintln!("Failed to initialise logging: {}", e);
                    EX_SOFTWARE.exit();
                }
            }
            Err(e) => {
                eprintln!("Error in '{}': {}", file.display(), e);
                EX_CONFIG.exit();
            }
        },

        _ => {
            let formatter = syslog::Formatter3164 {
                facility: syslog::Facility::LOG_MAIL,
                hostname: None,
                process: env!("CARGO_PKG_NAME").to_owned(),
                pid: nix::unistd::getpid().as_raw(),
            };

            let logger = match syslog::unix(formatter) {
                Ok(logger) => logger,
                Err(e) => {
                    eprintln!("Failed to connect to syslog: {}", e);
                    EX_UNAVAILABLE.exit()
                }
            };
            if let Err(e) =
                log::set_boxed_logger(Box::new(syslog::BasicLogger::new(logger)))
                    .map(|_| log::set_max_level(log::LevelFilter::Info))
            {
                eprintln!("Failed to initialise logging: {}", e);
                EX_SOFTWARE.exit();
            }
        }
    }
}

fn load_log_config(file: &Path) -> Result<log4rs::config::Config, String> {
    log4rs::load_config_file(file, log4rs::file::Deserializers::default())
        .map_err(|e| e.to_string())
}
