//! Wire types, codec and error taxonomy shared by the relay and its clients

pub mod codec;
pub mod error;
pub mod lines;

pub use codec::{
    decode, decode_relay, decode_relay_batch, encode, encode_relay, frame, unframe,
};
pub use error::{MalformedRecord, TransportError};
pub use lines::{read_line_bounded, LineRead, MAX_LINE_LEN};

use std::fmt;

pub const DEFAULT_PORT: u16 = 8080;
/// Separates the fields of a single record
pub const FIELD_SEPARATOR: char = ',';
/// Separates records packed into one line; accepted by clients, never sent by the relay
pub const BATCH_SEPARATOR: char = ';';
/// Terminates every message on the wire
pub const LINE_TERMINATOR: char = '\n';
/// Second field of a relay line announcing that a participant left
pub const LEAVE_TAG: &str = "leave";
/// Identity marking a client's own echo; never stored in a remote cache
pub const SELF_ECHO_SENTINEL: &str = "local";

/// Direction a participant is facing, with its wire code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Facing {
    #[default]
    Up,
    Left,
    Down,
    Right,
}

impl Facing {
    pub fn code(self) -> u8 {
        match self {
            Facing::Up => 0,
            Facing::Left => 1,
            Facing::Down => 2,
            Facing::Right => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Facing::Up),
            1 => Some(Facing::Left),
            2 => Some(Facing::Down),
            3 => Some(Facing::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Last-known pose of one participant
///
/// Always replaced as a whole; there are no partial updates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParticipantState {
    pub position: Position,
    pub facing: Facing,
    pub is_moving: bool,
}

impl ParticipantState {
    pub fn new(x: f64, y: f64, facing: Facing, is_moving: bool) -> Self {
        Self {
            position: Position::new(x, y),
            facing,
            is_moving,
        }
    }
}

/// Identity the relay assigns to a connection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Builds the identity for the `n`-th registration of a relay process
    pub fn numbered(n: u64) -> Self {
        Self(format!("id-{}", n))
    }

    /// Validates an identity received on the wire
    pub fn parse(value: &str) -> Result<Self, MalformedRecord> {
        let reserved = [FIELD_SEPARATOR, BATCH_SEPARATOR, LINE_TERMINATOR, '\r'];
        if value.is_empty() || value.contains(reserved) {
            return Err(MalformedRecord::Identity {
                value: value.to_string(),
            });
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_self_echo(&self) -> bool {
        self.0 == SELF_ECHO_SENTINEL
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message the relay sends to its clients
#[derive(Debug, Clone, PartialEq)]
pub enum RelayMessage {
    State {
        identity: ParticipantId,
        state: ParticipantState,
    },
    Leave {
        identity: ParticipantId,
    },
}

impl RelayMessage {
    pub fn identity(&self) -> &ParticipantId {
        match self {
            RelayMessage::State { identity, .. } | RelayMessage::Leave { identity } => identity,
        }
    }
}
