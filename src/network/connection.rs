//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::TcpStream;
use std::time::Duration;

use crate::catalog::DataService;
use crate::error::{BarkeepError, Result};
use crate::protocol::{read_command, write_response, Command, Response, Status};

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Catalog operations
    service: DataService,

    /// Largest accepted request payload
    max_request_size: usize,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    pub fn new(stream: TcpStream, service: DataService, max_request_size: usize) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;
        // Accepted sockets may inherit non-blocking mode from the listener
        stream.set_nonblocking(false)?;

        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            service,
            max_request_size,
            peer_addr,
        })
    }

    /// Configure connection timeouts (0 disables)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.reader
                .get_ref()
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.writer
                .get_ref()
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }
        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// A request whose payload cannot be parsed gets a BAD_REQUEST and the
    /// connection stays open; a framing error ends the connection.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            let response = match read_command(&mut self.reader, self.max_request_size) {
                Ok(command) => {
                    tracing::trace!("Received command from {}: {:?}", self.peer_addr, command);
                    execute(&self.service, command)
                }
                Err(BarkeepError::Io(ref e)) if is_disconnect(e.kind()) => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Err(BarkeepError::Io(ref e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    tracing::debug!("Read timeout for client {}", self.peer_addr);
                    return Ok(());
                }
                Err(e @ BarkeepError::Decode(_)) => {
                    tracing::debug!("Bad request from {}: {}", self.peer_addr, e);
                    Response::bad_request(&e)
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    let _ = self.send_response(&Response::from_error(&e, "can't read request"));
                    return Err(e);
                }
            };

            if let Err(e) = self.send_response(&response) {
                if let BarkeepError::Io(ref io_err) = e {
                    if is_disconnect(io_err.kind()) || io_err.kind() == ErrorKind::BrokenPipe {
                        tracing::debug!(
                            "Client {} disconnected before response could be sent: {}",
                            self.peer_addr,
                            e
                        );
                        return Ok(());
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    fn send_response(&mut self, response: &Response) -> Result<()> {
        write_response(&mut self.writer, response)
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UnexpectedEof | ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted
    )
}

/// Run one command against the service and build its response
pub fn execute(service: &DataService, command: Command) -> Response {
    match command {
        Command::Ping => Response::ok(Some(b"\"pong\"".to_vec())),

        // =====================================================================
        // Ingredients
        // =====================================================================
        Command::CreateIngredient(ingredient) => {
            if let Err(e) = service.validate_ingredient(&ingredient) {
                return Response::from_error(&e, "invalid ingredient");
            }
            let id = match service.create_ingredient(&ingredient) {
                Ok(id) => id,
                Err(e) => return logged(&e, "can't save ingredient"),
            };
            match service.get_ingredient(&id) {
                Ok(created) => {
                    tracing::debug!("created ingredient {:?}", created);
                    Response::json(Status::Created, &created)
                }
                Err(e) => logged(&e, "can't load created ingredient"),
            }
        }
        Command::UpdateIngredient(ingredient) => {
            if let Err(e) = service.validate_ingredient(&ingredient) {
                return Response::from_error(&e, "invalid ingredient");
            }
            if let Err(e) = service.update_ingredient(&ingredient) {
                return logged(&e, "can't update ingredient");
            }
            match service.get_ingredient(&ingredient.id) {
                Ok(updated) => Response::json(Status::Ok, &updated),
                Err(e) => logged(&e, "can't load updated ingredient"),
            }
        }
        Command::GetIngredient { id } => match service.get_ingredient(&id) {
            Ok(ingredient) => Response::json(Status::Ok, &ingredient),
            Err(e) => logged(&e, "can't get ingredient"),
        },
        Command::ListIngredients => match service.list_ingredients() {
            Ok(ingredients) => Response::json(Status::Ok, &ingredients),
            Err(e) => logged(&e, "can't list ingredients"),
        },
        Command::FindIngredients { query } => match service.find_ingredients(&query) {
            Ok(ingredients) => Response::json(Status::Ok, &ingredients),
            Err(e) => logged(&e, "can't find ingredients"),
        },

        // =====================================================================
        // Cocktails
        // =====================================================================
        Command::CreateCocktail(cocktail) => {
            if let Err(e) = service.validate_cocktail(&cocktail) {
                return Response::from_error(&e, "invalid cocktail");
            }
            let id = match service.create_cocktail(&cocktail) {
                Ok(id) => id,
                Err(e) => return logged(&e, "can't save cocktail"),
            };
            match service.get_cocktail(&id) {
                Ok(created) => {
                    tracing::debug!("created cocktail {:?}", created);
                    Response::json(Status::Created, &created)
                }
                Err(e) => logged(&e, "can't load created cocktail"),
            }
        }
        Command::UpdateCocktail(cocktail) => {
            if let Err(e) = service.validate_cocktail(&cocktail) {
                return Response::from_error(&e, "invalid cocktail");
            }
            if let Err(e) = service.update_cocktail(&cocktail) {
                return logged(&e, "can't update cocktail");
            }
            match service.get_cocktail(&cocktail.id) {
                Ok(updated) => Response::json(Status::Ok, &updated),
                Err(e) => logged(&e, "can't load updated cocktail"),
            }
        }
        Command::GetCocktail { id } => match service.get_cocktail(&id) {
            Ok(cocktail) => Response::json(Status::Ok, &cocktail),
            Err(e) => logged(&e, "can't get cocktail"),
        },
        Command::ListCocktails => match service.list_cocktails() {
            Ok(cocktails) => Response::json(Status::Ok, &cocktails),
            Err(e) => logged(&e, "can't list cocktails"),
        },
        Command::FindCocktails { query } => match service.find_cocktails(&query) {
            Ok(cocktails) => Response::json(Status::Ok, &cocktails),
            Err(e) => logged(&e, "can't find cocktails"),
        },

        Command::Search { query } => match service.search(&query) {
            Ok(result) => Response::json(Status::Ok, &result),
            Err(e) => logged(&e, "can't search"),
        },
    }
}

/// Error response; server-side failures are logged with full detail
fn logged(error: &BarkeepError, details: &str) -> Response {
    if !error.is_client_error() {
        tracing::warn!("{}: {}", details, error);
    }
    Response::from_error(error, details)
}
