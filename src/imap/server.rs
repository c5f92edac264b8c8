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

use std::borrow::Cow;
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::{info, warn};

use super::command_processor::CommandProcessor;
use super::lex::LexWriter;
use super::request_reader::{RequestReader, SharedWriter};
use super::response as s;
use super::session_view::Terminator;
use crate::store::mail_store::MailStore;
use crate::support::error::Error;
use crate::support::log_prefix::LogPrefix;
use crate::support::system_config::SystemConfig;

/// Lets other sessions end this connection from the outside.
///
/// The only thing that does so is the deletion of the mailbox this session
/// has selected. The connection is told why, then `shutdown` is called to
/// unblock the thread reading from it.
pub struct ConnectionControl {
    terminated: AtomicBool,
    write: SharedWriter,
    shutdown: Box<dyn Fn() + Send + Sync>,
}

impl ConnectionControl {
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    /// Send `* BYE` for the deletion of `mailbox` and shut the connection
    /// down. Only the first call has any effect.
    ///
    /// This is called with the mailbox lock held, so it must not take any
    /// lock other than the writer's.
    pub fn terminate(&self, mailbox: &str) {
        if self.terminated.swap(true, Ordering::SeqCst) {
            return;
        }

        {
            let mut w = self.write.lock().unwrap();
            let mut lex = LexWriter::new(&mut *w);
            let _ = s::ResponseLine {
                tag: None,
                response: s::Response::Cond(s::CondResponse {
                    cond: s::RespCondType::Bye,
                    code: None,
                    quip: Some(Cow::Owned(format!(
                        "Mailbox {} has been deleted",
                        mailbox
                    ))),
                }),
            }
            .write_to(&mut lex);
            let _ = lex.verbatim_bytes(b"\r\n");
            let _ = lex.flush();
        }

        (self.shutdown)();
    }
}

pub struct Server {
    reader: RequestReader,
    write: SharedWriter,
    /// The first error writing an untagged response of the current command.
    untagged_error: Mutex<Option<io::Error>>,
    processor: CommandProcessor,
    control: Arc<ConnectionControl>,
}

impl Server {
    /// Set up a session on one connection.
    ///
    /// `shutdown` must cause any blocked read on `read` to return, typically
    /// by shutting the underlying socket down.
    pub fn new<R: BufRead + Send + 'static, W: Write + Send + 'static>(
        read: R,
        write: W,
        log_prefix: LogPrefix,
        system_config: Arc<SystemConfig>,
        store: Arc<MailStore>,
        shutdown: Box<dyn Fn() + Send + Sync>,
    ) -> Self {
        let write: SharedWriter = Arc::new(Mutex::new(Box::new(write)));
        let control = Arc::new(ConnectionControl {
            terminated: AtomicBool::new(false),
            write: Arc::clone(&write),
            shutdown,
        });

        let terminator: Terminator = {
            let control = Arc::clone(&control);
            Arc::new(move |mailbox: &str| control.terminate(mailbox))
        };

        let mut reader = RequestReader::new(Box::new(read), Arc::clone(&write));
        reader.set_max_literal(system_config.imap.max_literal as usize);

        let processor = CommandProcessor::new(
            log_prefix,
            system_config,
            store,
            Some(terminator),
        );

        Server {
            reader,
            write,
            untagged_error: Mutex::new(None),
            processor,
            control,
        }
    }

    /// Run the server.
    ///
    /// Blocks until the client logs out, the session is terminated from
    /// outside, or a fatal error occurs. An error caused by the connection
    /// being torn down after termination is not reported.
    pub fn run(&mut self) -> Result<(), Error> {
        self.send_response(self.processor.greet())?;

        while !self.control.is_terminated() && !self.processor.logged_out() {
            match self.run_one() {
                Ok(()) => (),
                Err(_) if self.control.is_terminated() => break,
                Err(e) => return Err(e),
            }
        }

        if self.control.is_terminated() {
            info!(
                "{} Session terminated by mailbox deletion",
                self.processor.log_prefix()
            );
        }

        Ok(())
    }

    fn run_one(&mut self) -> Result<(), Error> {
        let tag = match self.reader.tag() {
            Ok(tag) => tag,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                self.send_response(s::ResponseLine {
                    tag: None,
                    response: s::Response::Cond(s::CondResponse {
                        cond: s::RespCondType::Bad,
                        code: Some(s::RespTextCode::Parse),
                        quip: Some(Cow::Owned(e.to_string())),
                    }),
                })?;
                return self.discard_line();
            }
        };

        let result = match self.reader.atom() {
            Ok(name) => {
                let sender =
                    response_sender(&self.write, &self.untagged_error);
                self.processor
                    .handle_command(&name, &mut self.reader, &sender)
            }
            Err(e) => Err(e),
        };

        if let Some(e) = self.untagged_error.lock().unwrap().take() {
            return Err(e.into());
        }

        match result {
            Ok(response) => self.send_response(s::ResponseLine {
                tag: Some(Cow::Owned(tag)),
                response,
            }),

            Err(e) if e.is_fatal() => Err(e),

            Err(e) => {
                if !e.is_syntax() {
                    warn!(
                        "{} Unexpected error reading command: {}",
                        self.processor.log_prefix(),
                        e
                    );
                }

                self.send_response(s::ResponseLine {
                    tag: Some(Cow::Owned(tag)),
                    response: s::Response::Cond(s::CondResponse {
                        cond: s::RespCondType::Bad,
                        code: if matches!(e, Error::BadSyntax(..)) {
                            Some(s::RespTextCode::Parse)
                        } else {
                            None
                        },
                        quip: Some(Cow::Owned(e.to_string())),
                    }),
                })?;
                self.discard_line()
            }
        }
    }

    /// Skip the rest of a command that failed to parse.
    ///
    /// If a line ends with a non-synchronising literal, the client sends the
    /// payload regardless, so it is skipped too, along with whatever follows
    /// it. A synchronising literal was never prompted for and is not skipped.
    fn discard_line(&mut self) -> Result<(), Error> {
        if self.reader.at_line_start() {
            return Ok(());
        }

        while let Some(len) = self.reader.consume_line()? {
            self.reader.skip_exact(len)?;
        }
        Ok(())
    }

    fn send_response(&mut self, r: s::ResponseLine<'_>) -> Result<(), Error> {
        let mut w = self.write.lock().unwrap();
        let mut lex = LexWriter::new(&mut *w);
        r.write_to(&mut lex)?;
        lex.verbatim_bytes(b"\r\n")?;
        lex.flush()?;
        Ok(())
    }
}

/// Build the callback handlers use for untagged responses.
///
/// Once a write fails, the error is latched in `failed` and later responses
/// are dropped; the caller returns the error after the handler finishes.
fn response_sender<'a>(
    w: &'a SharedWriter,
    failed: &'a Mutex<Option<io::Error>>,
) -> impl Fn(s::Response<'_>) + Send + Sync + 'a {
    move |r| {
        let mut failed = failed.lock().unwrap();
        if failed.is_some() {
            return;
        }

        let mut w = w.lock().unwrap();
        let mut lex = LexWriter::new(&mut *w);
        let result = s::ResponseLine {
            tag: None,
            response: r,
        }
        .write_to(&mut lex)
        .and_then(|()| lex.verbatim_bytes(b"\r\n"));

        if let Err(e) = result {
            *failed = Some(e);
        }
    }
}
