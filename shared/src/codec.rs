//! Line-oriented text codec for participant state
//!
//! Client to relay: `x,y,facing,isMoving`
//! Relay to client: `identity,x,y,facing,isMoving` or `identity,leave`
//!
//! Coordinates carry two fractional digits, so a round trip is lossy beyond
//! the hundredths.

use crate::{
    Facing, MalformedRecord, ParticipantId, ParticipantState, Position, RelayMessage,
    BATCH_SEPARATOR, FIELD_SEPARATOR, LEAVE_TAG, LINE_TERMINATOR,
};

const STATE_FIELDS: usize = 4;
const RELAY_STATE_FIELDS: usize = STATE_FIELDS + 1;
const RELAY_LEAVE_FIELDS: usize = 2;

/// Encodes a state as a single record without the line terminator
pub fn encode(state: &ParticipantState) -> String {
    format!(
        "{:.2}{sep}{:.2}{sep}{}{sep}{}",
        state.position.x,
        state.position.y,
        state.facing.code(),
        state.is_moving,
        sep = FIELD_SEPARATOR
    )
}

/// Decodes a single `x,y,facing,isMoving` record
pub fn decode(record: &str) -> Result<ParticipantState, MalformedRecord> {
    let fields: Vec<&str> = record.split(FIELD_SEPARATOR).collect();
    if fields.len() != STATE_FIELDS {
        return Err(MalformedRecord::FieldCount {
            expected: STATE_FIELDS,
            found: fields.len(),
            record: record.to_string(),
        });
    }
    decode_fields(&fields)
}

fn decode_fields(fields: &[&str]) -> Result<ParticipantState, MalformedRecord> {
    let x = parse_coordinate(fields[0])?;
    let y = parse_coordinate(fields[1])?;
    let facing = fields[2]
        .parse::<u8>()
        .ok()
        .and_then(Facing::from_code)
        .ok_or_else(|| MalformedRecord::Facing {
            value: fields[2].to_string(),
        })?;
    let is_moving = match fields[3] {
        "true" => true,
        "false" => false,
        other => {
            return Err(MalformedRecord::Movement {
                value: other.to_string(),
            })
        }
    };

    Ok(ParticipantState {
        position: Position::new(x, y),
        facing,
        is_moving,
    })
}

fn parse_coordinate(field: &str) -> Result<f64, MalformedRecord> {
    // `f64::from_str` accepts "NaN" and "inf", neither of which is a position
    match field.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(MalformedRecord::Position {
            value: field.to_string(),
        }),
    }
}

/// Encodes a relay message without the line terminator
pub fn encode_relay(message: &RelayMessage) -> String {
    match message {
        RelayMessage::State { identity, state } => {
            format!("{}{}{}", identity, FIELD_SEPARATOR, encode(state))
        }
        RelayMessage::Leave { identity } => {
            format!("{}{}{}", identity, FIELD_SEPARATOR, LEAVE_TAG)
        }
    }
}

/// Decodes one relay message
pub fn decode_relay(record: &str) -> Result<RelayMessage, MalformedRecord> {
    let fields: Vec<&str> = record.split(FIELD_SEPARATOR).collect();
    match fields.len() {
        RELAY_STATE_FIELDS => {
            let identity = ParticipantId::parse(fields[0])?;
            let state = decode_fields(&fields[1..])?;
            Ok(RelayMessage::State { identity, state })
        }
        RELAY_LEAVE_FIELDS if fields[1] == LEAVE_TAG => {
            let identity = ParticipantId::parse(fields[0])?;
            Ok(RelayMessage::Leave { identity })
        }
        found => Err(MalformedRecord::FieldCount {
            expected: RELAY_STATE_FIELDS,
            found,
            record: record.to_string(),
        }),
    }
}

/// Decodes every `;`-separated record of a line independently
///
/// Empty parts are skipped. A bad part does not affect its neighbours.
pub fn decode_relay_batch(line: &str) -> Vec<Result<RelayMessage, MalformedRecord>> {
    line.split(BATCH_SEPARATOR)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(decode_relay)
        .collect()
}

/// Appends the line terminator
pub fn frame(record: &str) -> String {
    let mut line = String::with_capacity(record.len() + 1);
    line.push_str(record);
    line.push(LINE_TERMINATOR);
    line
}

/// Strips one trailing `\n` or `\r\n`
pub fn unframe(line: &str) -> &str {
    let line = line.strip_suffix(LINE_TERMINATOR).unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_encode_uses_two_fraction_digits() {
        let state = ParticipantState::new(100.0, 200.0, Facing::Down, true);
        assert_eq!(encode(&state), "100.00,200.00,2,true");

        let state = ParticipantState::new(-3.14159, 0.006, Facing::Right, false);
        assert_eq!(encode(&state), "-3.14,0.01,3,false");
    }

    #[test]
    fn test_decode_valid_record() {
        let state = decode("12.50,-7.25,1,false").unwrap();
        assert_eq!(state.position.x, 12.5);
        assert_eq!(state.position.y, -7.25);
        assert_eq!(state.facing, Facing::Left);
        assert!(!state.is_moving);
    }

    #[test]
    fn test_round_trip_within_precision() {
        let samples = [
            ParticipantState::new(400.0, 300.0, Facing::Up, false),
            ParticipantState::new(401.666_666, 299.123, Facing::Left, true),
            ParticipantState::new(-0.004, 1e6 + 0.333, Facing::Right, true),
        ];

        for original in samples {
            let decoded = decode(&encode(&original)).unwrap();
            assert_approx_eq!(decoded.position.x, original.position.x, 0.005);
            assert_approx_eq!(decoded.position.y, original.position.y, 0.005);
            assert_eq!(decoded.facing, original.facing);
            assert_eq!(decoded.is_moving, original.is_moving);
        }
    }

    #[test]
    fn test_decode_wrong_field_count() {
        for record in ["", "1.00,2.00,0", "1.00,2.00,0,true,extra"] {
            assert!(
                matches!(decode(record), Err(MalformedRecord::FieldCount { .. })),
                "accepted {:?}",
                record
            );
        }
    }

    #[test]
    fn test_decode_non_numeric_position() {
        assert_eq!(
            decode("abc,2.00,0,true"),
            Err(MalformedRecord::Position {
                value: "abc".to_string()
            })
        );
        assert!(matches!(
            decode("1.00,NaN,0,true"),
            Err(MalformedRecord::Position { .. })
        ));
        assert!(matches!(
            decode("inf,1.00,0,true"),
            Err(MalformedRecord::Position { .. })
        ));
    }

    #[test]
    fn test_decode_out_of_range_facing() {
        for facing in ["4", "-1", "up", ""] {
            let record = format!("1.00,2.00,{},true", facing);
            assert!(
                matches!(decode(&record), Err(MalformedRecord::Facing { .. })),
                "accepted facing {:?}",
                facing
            );
        }
    }

    #[test]
    fn test_decode_non_boolean_movement() {
        for flag in ["1", "yes", "True", "true\n", ""] {
            let record = format!("1.00,2.00,0,{}", flag);
            assert!(
                matches!(decode(&record), Err(MalformedRecord::Movement { .. })),
                "accepted flag {:?}",
                flag
            );
        }
    }

    #[test]
    fn test_relay_state_line() {
        let message = RelayMessage::State {
            identity: ParticipantId::numbered(1),
            state: ParticipantState::new(100.0, 200.0, Facing::Down, true),
        };
        let line = encode_relay(&message);
        assert_eq!(line, "id-1,100.00,200.00,2,true");
        assert_eq!(decode_relay(&line).unwrap(), message);
    }

    #[test]
    fn test_relay_leave_line() {
        let message = RelayMessage::Leave {
            identity: ParticipantId::numbered(3),
        };
        assert_eq!(encode_relay(&message), "id-3,leave");
        assert_eq!(decode_relay("id-3,leave").unwrap(), message);
    }

    #[test]
    fn test_decode_relay_rejects_garbage() {
        assert!(matches!(
            decode_relay("id-1,stay"),
            Err(MalformedRecord::FieldCount { found: 2, .. })
        ));
        assert!(matches!(
            decode_relay(",1.00,2.00,0,true"),
            Err(MalformedRecord::Identity { .. })
        ));
        assert!(matches!(
            decode_relay("id-1,1.00,2.00,9,true"),
            Err(MalformedRecord::Facing { .. })
        ));
    }

    #[test]
    fn test_decode_relay_batch_isolates_bad_parts() {
        let results = decode_relay_batch("id-1,1.00,2.00,0,true;garbage;;id-2,leave");
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert_eq!(
            results[2].as_ref().unwrap(),
            &RelayMessage::Leave {
                identity: ParticipantId::numbered(2)
            }
        );
    }

    #[test]
    fn test_frame_and_unframe() {
        assert_eq!(frame("1.00,2.00,0,true"), "1.00,2.00,0,true\n");
        assert_eq!(unframe("abc\n"), "abc");
        assert_eq!(unframe("abc\r\n"), "abc");
        assert_eq!(unframe("abc"), "abc");
    }
}
