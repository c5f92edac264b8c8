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

use std::io;
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::Arc;

use log::{error, info, warn};

use crate::imap::server::Server;
use crate::store::mail_store::MailStore;
use crate::support::log_prefix::LogPrefix;
use crate::support::system_config::SystemConfig;

// Need to use a this and not die! so that errors go to syslog/etc
macro_rules! fatal {
    ($ex:ident, $($stuff:tt)*) => {{
        error!($($stuff)*);
        crate::support::sysexits::$ex.exit()
    }}
}

pub fn imap(system_config: SystemConfig) {
    let store = Arc::new(MailStore::new());
    for user in &system_config.users {
        if let Err(e) = store.provision(user) {
            fatal!(EX_CONFIG, "Unable to set up user '{}': {}", user.name, e);
        }
    }

    let listener = match TcpListener::bind(&system_config.imap.listen) {
        Ok(l) => l,
        Err(e) => fatal!(
            EX_OSERR,
            "Unable to listen on {}: {}",
            system_config.imap.listen,
            e
        ),
    };

    info!(
        "Listening on {} with {} user(s)",
        system_config.imap.listen,
        system_config.users.len()
    );

    let system_config = Arc::new(system_config);
    loop {
        let (stream, origin) = match listener.accept() {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("Failed to accept connection: {}", e);
                continue;
            }
        };

        if let Err(e) =
            serve_connection(stream, origin.to_string(), &system_config, &store)
        {
            warn!("{} Unable to start session: {}", origin, e);
        }
    }
}

fn serve_connection(
    stream: TcpStream,
    origin: String,
    system_config: &Arc<SystemConfig>,
    store: &Arc<MailStore>,
) -> io::Result<()> {
    let stream_out = stream.try_clone()?;
    let shutdown_handle = stream.try_clone()?;

    let mut server = Server::new(
        io::BufReader::new(stream),
        io::BufWriter::new(stream_out),
        LogPrefix::new(origin.clone()),
        Arc::clone(system_config),
        Arc::clone(store),
        Box::new(move || {
            let _ = shutdown_handle.shutdown(Shutdown::Both);
        }),
    );

    std::thread::spawn(move || {
        info!("{} Accepted connection", origin);

        match server.run() {
            Ok(_) => info!("{} Connection closed normally", origin),
            Err(e) => warn!("{} Connection error: {}", origin, e),
        }
    });

    Ok(())
}
