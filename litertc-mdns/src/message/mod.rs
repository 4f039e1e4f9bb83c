//! mDNS wire format.
//!
//! A message starts with a 12-byte header of six big-endian 16-bit
//! fields. Questions and resource records carry a length-prefixed
//! label sequence terminated by a zero-length label; a name may also
//! be a 2-byte compression pointer whose top two bits are set and
//! whose low 14 bits are an offset from the start of the message.


use std::net::Ipv4Addr;

use shared::error::{Error, Result};

pub(crate) const HEADER_LEN: usize = 12;

pub(crate) const TYPE_A: u16 = 1;
pub(crate) const TYPE_AAAA: u16 = 28;
pub(crate) const QTYPE_ANY: u16 = 255;

pub(crate) const CLASS_INTERNET: u16 = 1;
pub(crate) const CACHE_FLUSH: u16 = 1 << 15;
/// In a question's class field the top bit requests a unicast response.
pub(crate) const CLASS_UNICAST_RESPONSE: u16 = 1 << 15;

pub(crate) const FLAG_RESPONSE: u16 = 1 << 15;
pub(crate) const FLAG_AUTHORITATIVE: u16 = 1 << 10;

/// Longest label permitted by DNS.
const MAX_LABEL_LEN: usize = 63;

const LOCAL_LABEL: &[u8] = b"local";

/// Answer preamble past the name: type, class, ttl, rdlength.
const ANSWER_PREAMBLE_LEN: usize = 10;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header {
    pub(crate) id: u16,
    pub(crate) flags: u16,
    pub(crate) questions: u16,
    pub(crate) answers: u16,
    pub(crate) authorities: u16,
    pub(crate) additionals: u16,
}

impl Header {
    pub(crate) fn pack(&self, out: &mut Vec<u8>) {
        pack_u16(out, self.id);
        pack_u16(out, self.flags);
        pack_u16(out, self.questions);
        pack_u16(out, self.answers);
        pack_u16(out, self.authorities);
        pack_u16(out, self.additionals);
    }

    pub(crate) fn unpack(msg: &[u8]) -> Result<Header> {
        if msg.len() < HEADER_LEN {
            return Err(Error::ErrMalformed);
        }
        Ok(Header {
            id: u16::from_be_bytes([msg[0], msg[1]]),
            flags: u16::from_be_bytes([msg[2], msg[3]]),
            questions: u16::from_be_bytes([msg[4], msg[5]]),
            answers: u16::from_be_bytes([msg[6], msg[7]]),
            authorities: u16::from_be_bytes([msg[8], msg[9]]),
            additionals: u16::from_be_bytes([msg[10], msg[11]]),
        })
    }
}

/// Which record types a validated query asked for.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryMatch {
    pub a: bool,
    pub aaaa: bool,
}

impl QueryMatch {
    pub fn any(&self) -> bool {
        self.a || self.aaaa
    }
}

/// Validates whether an mDNS packet is a query for the given hostname
/// (sans `.local` suffix) and reports the record types asked for.
///
/// Only standard, non-truncated, non-recursive queries with a zero
/// transaction id are accepted. Question names may be compression
/// pointers; an offset beyond the datagram is malformed. The function
/// never reads past `packet`.
pub fn validate_query(packet: &[u8], hostname: &str) -> Result<QueryMatch> {
    let hdr = Header::unpack(packet)?;

    // transaction id must be zero
    if hdr.id != 0 {
        return Err(Error::ErrMalformed);
    }
    // only standard, non-truncated, non-recursive queries
    if hdr.flags != 0 {
        return Err(Error::ErrNotImplemented);
    }

    let mut found = QueryMatch::default();
    let mut off = HEADER_LEN;

    for _ in 0..hdr.questions {
        let matched = if off + 2 <= packet.len() && packet[off] & 0xC0 == 0xC0 {
            let target =
                (usize::from(packet[off] & 0x3F) << 8) | usize::from(packet[off + 1]);
            if target >= packet.len() {
                return Err(Error::ErrMalformed);
            }
            off += 2;
            match_name(packet, target, hostname)?.0
        } else {
            let (matched, consumed) = match_name(packet, off, hostname)?;
            off += consumed;
            matched
        };

        let (qtype, next) = unpack_u16(packet, off)?;
        off = next;
        if matched {
            match qtype {
                TYPE_A => found.a = true,
                TYPE_AAAA => found.aaaa = true,
                _ => {}
            }
        }

        // qclass, read and discarded
        let (_, next) = unpack_u16(packet, off)?;
        off = next;
    }

    Ok(found)
}

/// Builds the single-answer response advertising `hostname.local.` at
/// the given address: authoritative response flags, cache-flush
/// internet class, and an `A` record with a 4-byte rdata.
pub(crate) fn answer_packet(hostname: &str, ip: Ipv4Addr, ttl: u32) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(HEADER_LEN + hostname.len() + 8 + ANSWER_PREAMBLE_LEN + 4);

    Header {
        flags: FLAG_RESPONSE | FLAG_AUTHORITATIVE,
        answers: 1,
        ..Default::default()
    }
    .pack(&mut out);

    pack_local_name(&mut out, hostname)?;
    pack_u16(&mut out, TYPE_A);
    pack_u16(&mut out, CACHE_FLUSH | CLASS_INTERNET);
    pack_u32(&mut out, ttl);
    pack_u16(&mut out, 4);
    out.extend_from_slice(&ip.octets());

    Ok(out)
}

/// Builds a query for `hostname.local.`: zero transaction id, one
/// question of qtype ANY, internet class with the unicast-response bit.
pub(crate) fn query_packet(hostname: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(HEADER_LEN + hostname.len() + 8 + 4);

    Header {
        questions: 1,
        ..Default::default()
    }
    .pack(&mut out);

    pack_local_name(&mut out, hostname)?;
    pack_u16(&mut out, QTYPE_ANY);
    pack_u16(&mut out, CLASS_UNICAST_RESPONSE | CLASS_INTERNET);

    Ok(out)
}

/// Validates the shape of an mDNS response: response flag set, exactly
/// one question, and every answer record within bounds. Never reads
/// past `packet`.
pub fn parse_response(packet: &[u8]) -> Result<()> {
    walk_response(packet).map(|_| ())
}

/// An `A` answer record found in a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AnswerA {
    /// Offset of the record's (pointer-resolved) name labels.
    pub(crate) name_off: usize,
    pub(crate) addr: Ipv4Addr,
}

/// Walks a response and collects its `A` records.
pub(crate) fn answer_a_records(packet: &[u8]) -> Result<Vec<AnswerA>> {
    walk_response(packet)
}

fn walk_response(packet: &[u8]) -> Result<Vec<AnswerA>> {
    let hdr = Header::unpack(packet)?;

    if hdr.id != 0 {
        return Err(Error::ErrMalformed);
    }
    if hdr.flags & FLAG_RESPONSE == 0 {
        return Err(Error::ErrMalformed);
    }
    // one question was sent, one echoed question is expected back
    if hdr.questions != 1 {
        return Err(Error::ErrMalformed);
    }

    let mut off = HEADER_LEN;
    off = skip_labels(packet, off)?;
    // qtype and qclass, ignored
    let (_, next) = unpack_u16(packet, off)?;
    let (_, next) = unpack_u16(packet, next)?;
    off = next;

    let mut records = Vec::new();
    for _ in 0..hdr.answers {
        if off >= packet.len() {
            return Err(Error::ErrMalformed);
        }

        let name_off;
        if packet[off] & 0xC0 == 0xC0 {
            if off + 2 > packet.len() {
                return Err(Error::ErrMalformed);
            }
            let target =
                (usize::from(packet[off] & 0x3F) << 8) | usize::from(packet[off + 1]);
            if target >= packet.len() {
                return Err(Error::ErrMalformed);
            }
            name_off = target;
            off += 2;
        } else {
            name_off = off;
            off = skip_labels(packet, off)?;
        }

        let (typ, next) = unpack_u16(packet, off)?;
        let (_class, next) = unpack_u16(packet, next)?;
        let (_ttl, next) = unpack_u32(packet, next)?;
        let (rdlength, next) = unpack_u16(packet, next)?;
        off = next;

        let rdlength = usize::from(rdlength);
        if off + rdlength > packet.len() {
            return Err(Error::ErrMalformed);
        }
        if typ == TYPE_A && rdlength == 4 {
            records.push(AnswerA {
                name_off,
                addr: Ipv4Addr::new(
                    packet[off],
                    packet[off + 1],
                    packet[off + 2],
                    packet[off + 3],
                ),
            });
        }
        off += rdlength;
    }

    Ok(records)
}

/// Checks whether the label sequence at `off` is exactly
/// `<hostname> local <root>`, following a single leading compression
/// pointer if present.
pub(crate) fn name_matches(packet: &[u8], mut off: usize, hostname: &str) -> bool {
    if off + 2 <= packet.len() && packet[off] & 0xC0 == 0xC0 {
        let target = (usize::from(packet[off] & 0x3F) << 8) | usize::from(packet[off + 1]);
        if target >= packet.len() {
            return false;
        }
        off = target;
    }
    match match_name(packet, off, hostname) {
        Ok((matched, _)) => matched,
        Err(_) => false,
    }
}

/// Matches the label sequence at `off` against
/// `<hostname> local <root>`, in order, with no additional records.
///
/// Returns the match outcome and the number of bytes consumed.
fn match_name(packet: &[u8], mut off: usize, hostname: &str) -> Result<(bool, usize)> {
    let host = hostname.as_bytes();
    let start = off;
    let mut matches = true;
    let mut index = 0usize;

    loop {
        if off >= packet.len() {
            return Err(Error::ErrMalformed);
        }
        let size = usize::from(packet[off]);
        if off + 1 + size > packet.len() {
            return Err(Error::ErrMalformed);
        }
        let label = &packet[off + 1..off + 1 + size];

        match index {
            0 => {
                if label != host {
                    matches = false;
                }
            }
            1 => {
                if label != LOCAL_LABEL {
                    matches = false;
                }
            }
            2 => {
                if size != 0 {
                    matches = false;
                }
            }
            _ => matches = false,
        }

        off += 1 + size;
        index += 1;
        if size == 0 {
            break;
        }
    }

    Ok((matches, off - start))
}

fn skip_labels(packet: &[u8], mut off: usize) -> Result<usize> {
    loop {
        if off >= packet.len() {
            return Err(Error::ErrMalformed);
        }
        let size = usize::from(packet[off]);
        if off + 1 + size > packet.len() {
            return Err(Error::ErrMalformed);
        }
        off += 1 + size;
        if size == 0 {
            return Ok(off);
        }
    }
}

fn pack_local_name(out: &mut Vec<u8>, hostname: &str) -> Result<()> {
    if hostname.is_empty() {
        return Err(Error::ErrBadArgument);
    }
    for label in hostname.split('.').chain(std::iter::once("local")) {
        if label.is_empty() || label.len() > MAX_LABEL_LEN {
            return Err(Error::ErrBadArgument);
        }
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
    Ok(())
}

fn pack_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn pack_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn unpack_u16(msg: &[u8], off: usize) -> Result<(u16, usize)> {
    if off + 2 > msg.len() {
        return Err(Error::ErrMalformed);
    }
    Ok((u16::from_be_bytes([msg[off], msg[off + 1]]), off + 2))
}

fn unpack_u32(msg: &[u8], off: usize) -> Result<(u32, usize)> {
    if off + 4 > msg.len() {
        return Err(Error::ErrMalformed);
    }
    Ok((
        u32::from_be_bytes([msg[off], msg[off + 1], msg[off + 2], msg[off + 3]]),
        off + 4,
    ))
}
