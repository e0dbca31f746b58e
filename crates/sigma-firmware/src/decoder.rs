//! Action stream decoder
//!
//! Walks the payload front to back, yielding one [`ActionRecord`] per step.
//! The iterator is fused: after an `End` record or the first error it
//! returns `None` forever, so bytes past `End` are never looked at.

use crate::action::ActionRecord;
use crate::error::{FormatError, Result};
use crate::header::ValidatedFirmware;
use crate::Opcode;
use sigma_chip::format::{action_len, ACTION_HEADER_LEN};

/// Lazy, single-pass decoder over an action stream.
#[derive(Debug, Clone)]
pub struct Actions<'a> {
    data: &'a [u8],
    pos: usize,
    index: usize,
    done: bool,
}

impl<'a> Actions<'a> {
    /// Decode the raw action stream (the bytes after the header).
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            index: 0,
            done: false,
        }
    }

    /// Byte offset of the next record.
    pub const fn position(&self) -> usize {
        self.pos
    }

    fn fail(&mut self, err: FormatError) -> Option<Result<ActionRecord<'a>>> {
        self.done = true;
        Some(Err(err))
    }

    fn decode_next(&mut self) -> Option<Result<ActionRecord<'a>>> {
        let offset = self.pos;
        let index = self.index;
        let data = self.data;
        let rest = &data[offset..];

        if rest.is_empty() {
            return self.fail(FormatError::MissingEnd { actions: index });
        }

        if rest.len() < ACTION_HEADER_LEN {
            return self.fail(FormatError::TruncatedAction {
                index,
                offset,
                needed: ACTION_HEADER_LEN,
                remaining: rest.len(),
                opcode: None,
                address: None,
            });
        }

        let length = action_len(rest[1], u16::from_le_bytes([rest[2], rest[3]]));
        let address = u16::from_be_bytes([rest[4], rest[5]]);

        let Some(opcode) = Opcode::from_byte(rest[0]) else {
            return self.fail(FormatError::UnknownOpcode {
                index,
                offset,
                byte: rest[0],
                address,
            });
        };

        let payload: &'a [u8] = if opcode.carries_payload() {
            let body = &data[offset + ACTION_HEADER_LEN..];
            let len = usize::try_from(length).unwrap_or(usize::MAX);
            if len > body.len() {
                return self.fail(FormatError::TruncatedAction {
                    index,
                    offset,
                    needed: ACTION_HEADER_LEN.saturating_add(len),
                    remaining: rest.len(),
                    opcode: Some(opcode),
                    address: Some(address),
                });
            }
            if len == 0 {
                return self.fail(FormatError::EmptyPayload {
                    index,
                    offset,
                    address,
                });
            }
            &body[..len]
        } else {
            &[]
        };

        self.pos = offset + ACTION_HEADER_LEN + payload.len();
        self.index += 1;
        if opcode == Opcode::End {
            self.done = true;
        }

        tracing::trace!(
            "Decoded action {}: {} addr={:#06x} len={}",
            index,
            opcode,
            address,
            length
        );

        Some(Ok(ActionRecord {
            index,
            offset,
            opcode,
            length,
            address,
            payload,
        }))
    }
}

impl<'a> Iterator for Actions<'a> {
    type Item = Result<ActionRecord<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.decode_next()
    }
}

impl std::iter::FusedIterator for Actions<'_> {}

/// Decode-only statistics over a whole program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramSummary {
    /// Records before `End`
    pub actions: usize,

    /// Per-opcode record counts, indexed by wire value (`End` included)
    pub by_opcode: [usize; 7],

    /// Total payload bytes carried by write instructions
    pub payload_bytes: usize,

    /// Sum of all `Delay` length fields, in the firmware's own unit
    pub delay_ticks: u64,

    /// Bytes after the `End` record
    pub trailing_bytes: usize,
}

impl ProgramSummary {
    /// Number of records with the given opcode.
    pub fn count(&self, opcode: Opcode) -> usize {
        self.by_opcode[usize::from(opcode.as_byte())]
    }
}

impl ValidatedFirmware<'_> {
    /// Decode the whole stream without executing it.
    ///
    /// # Errors
    ///
    /// Returns the first decode error, exactly as execution would see it.
    pub fn summarize(&self) -> Result<ProgramSummary> {
        let mut summary = ProgramSummary::default();
        let mut actions = self.actions();

        for action in actions.by_ref() {
            let action = action?;
            summary.by_opcode[usize::from(action.opcode.as_byte())] += 1;
            match action.opcode {
                Opcode::End => break,
                Opcode::Delay => summary.delay_ticks += u64::from(action.length),
                _ => summary.payload_bytes += action.payload.len(),
            }
            summary.actions += 1;
        }

        summary.trailing_bytes = self.payload().len() - actions.position();
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FirmwareBuilder;
    use sigma_chip::format::instr;

    fn record(op: u8, len: u32, addr: u16, payload: &[u8]) -> Vec<u8> {
        let (hi, lo) = sigma_chip::format::split_action_len(len);
        let mut v = vec![op, hi];
        v.extend_from_slice(&lo.to_le_bytes());
        v.extend_from_slice(&addr.to_be_bytes());
        v.extend_from_slice(payload);
        v
    }

    #[test]
    fn test_decodes_fields() {
        let data = record(instr::WRITEXBYTES, 3, 0x0400, &[0xAA, 0xBB, 0xCC]);
        let data = [data, record(instr::END, 0, 0, &[])].concat();

        let actions: Vec<_> = Actions::new(&data).collect::<Result<_>>().unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].opcode, Opcode::WriteXBytes);
        assert_eq!(actions[0].address, 0x0400);
        assert_eq!(actions[0].payload, &[0xAA, 0xBB, 0xCC]);
        assert_eq!(actions[1].opcode, Opcode::End);
        assert_eq!(actions[1].offset, 9);
    }

    #[test]
    fn test_length_uses_high_byte() {
        let data = record(instr::DELAY, 0x01_0002, 0, &[]);
        let action = Actions::new(&data).next().unwrap().unwrap();
        assert_eq!(action.length, 0x1_0002);
        assert_eq!(action.delay_ticks(), Some(0x1_0002));
    }

    #[test]
    fn test_address_is_big_endian() {
        let data = [instr::PLLWAIT, 0, 0, 0, 0x40, 0x02];
        let action = Actions::new(&data).next().unwrap().unwrap();
        assert_eq!(action.poll_target(), Some(0x4002));
    }

    #[test]
    fn test_stops_after_end() {
        let mut data = record(instr::END, 0, 0, &[]);
        data.extend_from_slice(&[0xFF; 10]);
        let mut it = Actions::new(&data);
        assert_eq!(it.next().unwrap().unwrap().opcode, Opcode::End);
        assert!(it.next().is_none());
        assert!(it.next().is_none());
    }

    #[test]
    fn test_truncated_payload() {
        let data = record(instr::WRITESINGLE, 8, 0x10, &[1, 2, 3]);
        let mut it = Actions::new(&data);
        assert_eq!(
            it.next().unwrap().unwrap_err(),
            FormatError::TruncatedAction {
                index: 0,
                offset: 0,
                needed: 14,
                remaining: 9,
                opcode: Some(Opcode::WriteSingle),
                address: Some(0x10),
            }
        );
        assert!(it.next().is_none());
    }

    #[test]
    fn test_truncated_record_header() {
        let data = [record(instr::NOOP, 0, 0, &[]), vec![instr::END, 0]].concat();
        let results: Vec<_> = Actions::new(&data).collect();
        assert_eq!(results.len(), 2);
        assert!(matches!(
            results[1],
            Err(FormatError::TruncatedAction {
                index: 1,
                offset: 6,
                needed: 6,
                remaining: 2,
                opcode: None,
                address: None,
            })
        ));
    }

    #[test]
    fn test_unknown_opcode() {
        let data = record(0x07, 0, 0x1234, &[]);
        assert_eq!(
            Actions::new(&data).next().unwrap().unwrap_err(),
            FormatError::UnknownOpcode {
                index: 0,
                offset: 0,
                byte: 0x07,
                address: 0x1234,
            }
        );
    }

    #[test]
    fn test_empty_write_payload() {
        let data = record(instr::WRITEXBYTES, 0, 0x20, &[]);
        assert!(matches!(
            Actions::new(&data).next().unwrap(),
            Err(FormatError::EmptyPayload { address: 0x20, .. })
        ));
    }

    #[test]
    fn test_missing_end() {
        let data = record(instr::NOOP, 0, 0, &[]);
        let results: Vec<_> = Actions::new(&data).collect();
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[1].clone().unwrap_err(),
            FormatError::MissingEnd { actions: 1 }
        );
    }

    #[test]
    fn test_summary() {
        let blob = FirmwareBuilder::new()
            .write_bytes(0x0400, &[0; 10])
            .write_single(0x0002, &[0x7F])
            .delay(100)
            .delay(50)
            .noop()
            .end()
            .trailing(&[0xEE; 4])
            .build();
        let fw = crate::validate(&blob).unwrap();
        let summary = fw.summarize().unwrap();

        assert_eq!(summary.actions, 5);
        assert_eq!(summary.count(Opcode::Delay), 2);
        assert_eq!(summary.count(Opcode::End), 1);
        assert_eq!(summary.payload_bytes, 11);
        assert_eq!(summary.delay_ticks, 150);
        assert_eq!(summary.trailing_bytes, 4);
    }
}
