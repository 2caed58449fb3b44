use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::{debug, trace};
use lottery_common::crypto::Hash;
use thiserror::Error;

pub const DEFAULT_TICKETS_PATH: &str = "tickets/";

#[derive(Error, Debug)]
pub enum TicketLedgerError {
    #[error("Error while accessing ticket file {}: {}", path.display(), source)]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Ticket file {} is not a JSON array of strings: {}", path.display(), source)]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid ticket id '{}' in {}", value, path.display())]
    InvalidTicketId { path: PathBuf, value: String },
}

/// Ticket IDs bought by one identity on one contract
///
/// The contract never reveals who owns a ticket, so this file is the only
/// place linking a ticket to its buyer. It lives at
/// `<dir>/<identity>/<contract>.json` and is rewritten after every
/// confirmed purchase as a JSON array of decimal strings.
#[derive(Debug)]
pub struct TicketLedger {
    path: PathBuf,
    tickets: Vec<u64>,
}

impl TicketLedger {
    // A missing file is an empty ledger
    pub fn open<P: AsRef<Path>>(
        dir: P,
        identity: &Hash,
        contract: &Hash,
    ) -> Result<Self, TicketLedgerError> {
        let path = ledger_path(dir.as_ref(), identity, contract);
        let tickets = match fs::read_to_string(&path) {
            Ok(content) => parse_tickets(&path, &content)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No ticket file at {}, starting empty", path.display());
                Vec::new()
            }
            Err(source) => return Err(TicketLedgerError::Io { path, source }),
        };

        Ok(Self { path, tickets })
    }

    pub fn get_path(&self) -> &Path {
        &self.path
    }

    pub fn tickets(&self) -> &[u64] {
        &self.tickets
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    // Only call once the purchase is confirmed on chain
    pub fn record_purchase(&mut self, ticket_id: u64) -> Result<(), TicketLedgerError> {
        if self.tickets.contains(&ticket_id) {
            debug!("Ticket {} already recorded", ticket_id);
            return Ok(());
        }

        self.tickets.push(ticket_id);
        if let Err(e) = self.save() {
            self.tickets.pop();
            return Err(e);
        }

        if log::log_enabled!(log::Level::Debug) {
            debug!("Recorded ticket {} in {}", ticket_id, self.path.display());
        }
        Ok(())
    }

    pub fn find_winning_ticket(&self, winning_ticket: u64) -> Option<u64> {
        self.tickets
            .iter()
            .copied()
            .find(|ticket| *ticket == winning_ticket)
    }

    fn save(&self) -> Result<(), TicketLedgerError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| TicketLedgerError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let values: Vec<String> = self.tickets.iter().map(u64::to_string).collect();
        let json = serde_json::to_string_pretty(&values).map_err(|source| TicketLedgerError::Json {
            path: self.path.clone(),
            source,
        })?;
        trace!("writing {} ticket(s) to {}", values.len(), self.path.display());
        fs::write(&self.path, json).map_err(|source| TicketLedgerError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

fn ledger_path(dir: &Path, identity: &Hash, contract: &Hash) -> PathBuf {
    dir.join(identity.to_hex()).join(format!("{}.json", contract.to_hex()))
}

fn parse_tickets(path: &Path, content: &str) -> Result<Vec<u64>, TicketLedgerError> {
    let values: Vec<String> =
        serde_json::from_str(content).map_err(|source| TicketLedgerError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    values
        .into_iter()
        .map(|value| match value.parse::<u64>() {
            Ok(id) if id > 0 => Ok(id),
            _ => Err(TicketLedgerError::InvalidTicketId {
                path: path.to_path_buf(),
                value,
            }),
        })
        .collect()
}
