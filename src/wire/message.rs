//! Query construction and response parsing, RFC 1035 §4.1: the 12-byte header,
//! the question section, and the answer/authority/additional RR sections.
//!
//! Header fields are serialized one 16-bit big-endian value at a time instead
//! of transmuting a packed struct over the wire (see DESIGN NOTES / §9 of
//! SPEC_FULL.md) — the contract is the bit layout, not a memory image.
use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use log::debug;
use rand::Rng;

use crate::error::{DNSError, DNSResult};
use crate::util::pretty_cursor;
use crate::wire::name::{decode_name, encode_name, skip_rr};
use crate::wire::types::{QClass, QType, ResponseCode};

const HEADER_LEN: usize = 12;
const FLAGS_RD: u16 = 0x0100;

/// A single decoded answer RR, already reduced to the string form callers want.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerRecord {
    pub rtype: QType,
    pub ttl: u32,
    pub value: String,
}

/// Everything the iterative resolver needs out of one response packet.
#[derive(Debug, Clone, Default)]
pub struct ParsedResponse {
    pub rcode: Option<ResponseCode>,
    pub answers: Vec<AnswerRecord>,
    /// NS target names found in the authority section, in wire order
    pub authority_ns: Vec<String>,
    /// lower-cased NS name -> glue address string, from the additional section
    pub glue: HashMap<String, String>,
}

impl ParsedResponse {
    pub fn is_nxdomain(&self) -> bool {
        matches!(self.rcode, Some(ResponseCode::NxDomain))
    }

    /// Minimum TTL across the accepted answers, or 0 if there are none
    /// (§4.1: "0 if none present").
    pub fn min_ttl(&self) -> u32 {
        self.answers.iter().map(|a| a.ttl).min().unwrap_or(0)
    }

    /// Legacy, no-TTL accessor: the plain answer strings.
    pub fn answer_strings(&self) -> Vec<String> {
        self.answers.iter().map(|a| a.value.clone()).collect()
    }

    pub fn is_referral(&self) -> bool {
        self.answers.is_empty() && !self.authority_ns.is_empty()
    }
}

fn write_u16(buf: &mut Vec<u8>, v: u16) {
    buf.write_u16::<BigEndian>(v).expect("Vec<u8> writes never fail");
}

/// Build a standard iterative query: random id, RD=1, one question, QCLASS=IN.
/// The transaction id is drawn from `rand::thread_rng()`, a process-wide,
/// non-reseeded source suitable for spoofing resistance (§9).
pub fn build_query(domain: &str, qtype: QType) -> DNSResult<Vec<u8>> {
    let id: u16 = rand::thread_rng().gen();
    build_query_with_id(domain, qtype, id)
}

/// Exposed separately so tests can pin the transaction id (§8 property 2).
pub fn build_query_with_id(domain: &str, qtype: QType, id: u16) -> DNSResult<Vec<u8>> {
    let name = encode_name(domain)?;

    let mut packet = Vec::with_capacity(HEADER_LEN + name.len() + 4);
    write_u16(&mut packet, id);
    write_u16(&mut packet, FLAGS_RD);
    write_u16(&mut packet, 1); // QDCOUNT
    write_u16(&mut packet, 0); // ANCOUNT
    write_u16(&mut packet, 0); // NSCOUNT
    write_u16(&mut packet, 0); // ARCOUNT

    packet.extend_from_slice(&name);
    write_u16(&mut packet, qtype.code());
    write_u16(&mut packet, QClass::IN.code());

    Ok(packet)
}

struct Header {
    id: u16,
    flags: u16,
    qdcount: u16,
    ancount: u16,
    nscount: u16,
    arcount: u16,
}

fn read_header(buf: &[u8]) -> DNSResult<Header> {
    if buf.len() < HEADER_LEN {
        if log::log_enabled!(log::Level::Debug) {
            debug!("packet too short for a header, dumping what arrived:");
            pretty_cursor(&std::io::Cursor::new(buf));
        }
        return Err(DNSError::malformed("packet shorter than a DNS header"));
    }
    let mut cursor = std::io::Cursor::new(buf);
    Ok(Header {
        id: cursor.read_u16::<BigEndian>().unwrap(),
        flags: cursor.read_u16::<BigEndian>().unwrap(),
        qdcount: cursor.read_u16::<BigEndian>().unwrap(),
        ancount: cursor.read_u16::<BigEndian>().unwrap(),
        nscount: cursor.read_u16::<BigEndian>().unwrap(),
        arcount: cursor.read_u16::<BigEndian>().unwrap(),
    })
}

fn read_u16_at(buf: &[u8], off: usize) -> DNSResult<u16> {
    buf.get(off..off + 2)
        .map(|s| u16::from_be_bytes([s[0], s[1]]))
        .ok_or_else(|| DNSError::malformed("truncated u16 field"))
}

fn read_u32_at(buf: &[u8], off: usize) -> DNSResult<u32> {
    buf.get(off..off + 4)
        .map(|s| u32::from_be_bytes([s[0], s[1], s[2], s[3]]))
        .ok_or_else(|| DNSError::malformed("truncated u32 field"))
}

/// Format RDATA for a recognized answer type, or `None` to skip it (the
/// "other: skipped" row of the §4.1 type table).
fn format_rdata(rtype: QType, buf: &[u8], rdata_off: usize, rdlength: usize) -> Option<String> {
    match rtype {
        QType::A if rdlength == 4 => {
            let b = buf.get(rdata_off..rdata_off + 4)?;
            Some(Ipv4Addr::new(b[0], b[1], b[2], b[3]).to_string())
        }
        QType::AAAA if rdlength == 16 => {
            let b = buf.get(rdata_off..rdata_off + 16)?;
            let octets: [u8; 16] = b.try_into().ok()?;
            Some(Ipv6Addr::from(octets).to_string())
        }
        QType::CNAME | QType::NS => decode_name(buf, rdata_off).ok().map(|(n, _)| n),
        QType::MX if rdlength >= 3 => {
            let (name, _) = decode_name(buf, rdata_off + 2).ok()?;
            Some(name)
        }
        _ => None,
    }
}

/// Parse a response packet. Truncated or malformed records stop parsing at
/// that point and return whatever was extracted so far (§4.1: "never throw on
/// truncation inside answers"); only a too-short header is a hard error, since
/// there is nothing safe to extract from it at all.
pub fn parse_response(buf: &[u8], expected_qtype: QType) -> DNSResult<ParsedResponse> {
    let header = read_header(buf)?;
    let rcode = ResponseCode::from_code((header.flags & 0x000F) as u8);

    let mut result = ParsedResponse {
        rcode: Some(rcode),
        ..Default::default()
    };

    if rcode == ResponseCode::NxDomain {
        return Ok(result);
    }

    let mut off = HEADER_LEN;

    // skip questions
    for _ in 0..header.qdcount {
        let (_, name_end) = match decode_name(buf, off) {
            Ok(v) => v,
            Err(_) => return Ok(result),
        };
        off = name_end + 4; // QTYPE + QCLASS
        if off > buf.len() {
            return Ok(result);
        }
    }

    // answers
    for _ in 0..header.ancount {
        let (_, rr_off) = match decode_name(buf, off) {
            Ok(v) => v,
            Err(_) => return Ok(result),
        };
        let (rtype_code, class_code, ttl, rdlength, rdata_off) =
            match read_rr_fixed_fields(buf, rr_off) {
                Ok(v) => v,
                Err(_) => return Ok(result),
            };

        let rtype = QType::from_code(rtype_code);
        let class = QClass::from_code(class_code);
        off = rdata_off + rdlength;
        if off > buf.len() {
            return Ok(result);
        }

        if class == QClass::IN && rtype.matches(expected_qtype) {
            if let Some(value) = format_rdata(rtype, buf, rdata_off, rdlength) {
                result.answers.push(AnswerRecord { rtype, ttl, value });
            }
        }
    }

    if !result.answers.is_empty() {
        return Ok(result);
    }

    // authority: collect NS target names (decoded from within NS RDATA only,
    // never from a mid-record offset — see §9 on the source's authority bug)
    for _ in 0..header.nscount {
        let (_, rr_off) = match decode_name(buf, off) {
            Ok(v) => v,
            Err(_) => return Ok(result),
        };
        let (rtype_code, _class_code, _ttl, rdlength, rdata_off) =
            match read_rr_fixed_fields(buf, rr_off) {
                Ok(v) => v,
                Err(_) => return Ok(result),
            };
        off = rdata_off + rdlength;
        if off > buf.len() {
            return Ok(result);
        }
        if QType::from_code(rtype_code) == QType::NS {
            if let Ok((nsdname, _)) = decode_name(buf, rdata_off) {
                result.authority_ns.push(nsdname);
            }
        }
    }

    // additional: build the glue map from A/AAAA records only
    for _ in 0..header.arcount {
        let (owner, rr_off) = match decode_name(buf, off) {
            Ok(v) => v,
            Err(_) => return Ok(result),
        };
        let (rtype_code, _class_code, _ttl, rdlength, rdata_off) =
            match read_rr_fixed_fields(buf, rr_off) {
                Ok(v) => v,
                Err(_) => return Ok(result),
            };
        off = rdata_off + rdlength;
        if off > buf.len() {
            return Ok(result);
        }

        let rtype = QType::from_code(rtype_code);
        let expected_len = match rtype {
            QType::A => 4,
            QType::AAAA => 16,
            _ => continue,
        };
        if rdlength != expected_len {
            continue;
        }
        if let Some(addr) = format_rdata(rtype, buf, rdata_off, rdlength) {
            result.glue.insert(owner.to_ascii_lowercase(), addr);
        }
    }

    Ok(result)
}

/// Read TYPE, CLASS, TTL, RDLENGTH starting at `off` (the position right
/// after an owner name), returning those plus the offset of RDATA itself.
fn read_rr_fixed_fields(buf: &[u8], off: usize) -> DNSResult<(u16, u16, u32, usize, usize)> {
    let rtype = read_u16_at(buf, off)?;
    let class = read_u16_at(buf, off + 2)?;
    let ttl = read_u32_at(buf, off + 4)?;
    let rdlength = read_u16_at(buf, off + 8)? as usize;
    Ok((rtype, class, ttl, rdlength, off + 10))
}

/// Advance past `count` resource records starting at `off`; used by
/// `skip_rr`-style callers that only need to walk past a section.
pub fn skip_records(buf: &[u8], mut off: usize, count: u16) -> DNSResult<usize> {
    for _ in 0..count {
        off = skip_rr(buf, off)?;
    }
    Ok(off)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_name(buf: &mut Vec<u8>, name: &str) {
        buf.extend(encode_name(name).unwrap());
    }

    fn push_rr_header(buf: &mut Vec<u8>, rtype: u16, ttl: u32, rdata: &[u8]) {
        write_u16(buf, rtype);
        write_u16(buf, 1); // IN
        buf.extend_from_slice(&ttl.to_be_bytes());
        write_u16(buf, rdata.len() as u16);
        buf.extend_from_slice(rdata);
    }

    fn response_header(ancount: u16, nscount: u16, arcount: u16, rcode: u8) -> Vec<u8> {
        let mut buf = Vec::new();
        write_u16(&mut buf, 0x1234); // id
        write_u16(&mut buf, 0x8180 | rcode as u16); // QR=1, RD=1, RA=1
        write_u16(&mut buf, 1); // QDCOUNT
        write_u16(&mut buf, ancount);
        write_u16(&mut buf, nscount);
        write_u16(&mut buf, arcount);
        buf
    }

    #[test]
    fn build_query_has_expected_header_and_question() {
        let packet = build_query_with_id("example.com", QType::A, 0xBEEF).unwrap();
        assert_eq!(&packet[0..2], &0xBEEFu16.to_be_bytes());
        assert_eq!(&packet[2..4], &FLAGS_RD.to_be_bytes());
        assert_eq!(&packet[4..6], &1u16.to_be_bytes()); // QDCOUNT
        assert_eq!(&packet[6..8], &0u16.to_be_bytes());
        assert_eq!(&packet[8..10], &0u16.to_be_bytes());
        assert_eq!(&packet[10..12], &0u16.to_be_bytes());

        let (name, offset) = decode_name(&packet, HEADER_LEN).unwrap();
        assert_eq!(name, "example.com");
        assert_eq!(read_u16_at(&packet, offset).unwrap(), QType::A.code());
        assert_eq!(read_u16_at(&packet, offset + 2).unwrap(), QClass::IN.code());
        assert_eq!(packet.len(), offset + 4);
    }

    #[test]
    fn parse_a_record_answer() {
        let mut buf = response_header(1, 0, 0, 0);
        push_name(&mut buf, "example.com");
        write_u16(&mut buf, QType::A.code());
        write_u16(&mut buf, QClass::IN.code());
        push_name(&mut buf, "example.com");
        push_rr_header(&mut buf, QType::A.code(), 7200, &[93, 184, 216, 34]);

        let parsed = parse_response(&buf, QType::A).unwrap();
        assert_eq!(parsed.answers.len(), 1);
        assert_eq!(parsed.answers[0].value, "93.184.216.34");
        assert_eq!(parsed.answers[0].ttl, 7200);
        assert_eq!(parsed.min_ttl(), 7200);
        assert!(!parsed.is_nxdomain());
    }

    #[test]
    fn parse_aaaa_record_answer() {
        let mut buf = response_header(1, 0, 0, 0);
        push_name(&mut buf, "example.com");
        write_u16(&mut buf, QType::AAAA.code());
        write_u16(&mut buf, QClass::IN.code());
        push_name(&mut buf, "example.com");
        let addr: Ipv6Addr = "2606:2800:220:1:248:1893:25c8:1946".parse().unwrap();
        push_rr_header(&mut buf, QType::AAAA.code(), 300, &addr.octets());

        let parsed = parse_response(&buf, QType::AAAA).unwrap();
        assert_eq!(parsed.answers.len(), 1);
        assert_eq!(parsed.answers[0].value, addr.to_string());
        assert_eq!(parsed.min_ttl(), 300);
    }

    #[test]
    fn parse_nxdomain_short_circuits() {
        let buf = response_header(0, 0, 0, 3);
        let parsed = parse_response(&buf, QType::A).unwrap();
        assert!(parsed.is_nxdomain());
        assert!(parsed.answers.is_empty());
    }

    #[test]
    fn parse_referral_with_glue() {
        let mut buf = response_header(0, 1, 1, 0);
        push_name(&mut buf, "com");
        write_u16(&mut buf, QType::NS.code());
        write_u16(&mut buf, QClass::IN.code());

        // authority: one NS record
        push_name(&mut buf, "com");
        let ns_name = encode_name("a.gtld-servers.net").unwrap();
        push_rr_header(&mut buf, QType::NS.code(), 3600, &ns_name);

        // additional: glue for that NS
        push_name(&mut buf, "a.gtld-servers.net");
        push_rr_header(&mut buf, QType::A.code(), 3600, &[192, 5, 6, 30]);

        let parsed = parse_response(&buf, QType::A).unwrap();
        assert!(parsed.is_referral());
        assert_eq!(parsed.authority_ns, vec!["a.gtld-servers.net".to_string()]);
        assert_eq!(
            parsed.glue.get("a.gtld-servers.net"),
            Some(&"192.5.6.30".to_string())
        );
    }

    #[test]
    fn parse_truncated_answer_returns_partial() {
        let mut buf = response_header(2, 0, 0, 0);
        push_name(&mut buf, "example.com");
        write_u16(&mut buf, QType::A.code());
        write_u16(&mut buf, QClass::IN.code());

        // first answer: complete
        push_name(&mut buf, "example.com");
        push_rr_header(&mut buf, QType::A.code(), 300, &[1, 2, 3, 4]);

        // second answer: header declares a 4-byte RDATA but only 2 bytes follow
        push_name(&mut buf, "example.com");
        write_u16(&mut buf, QType::A.code());
        write_u16(&mut buf, QClass::IN.code());
        buf.extend_from_slice(&60u32.to_be_bytes());
        write_u16(&mut buf, 4);
        buf.extend_from_slice(&[9, 9]);

        let parsed = parse_response(&buf, QType::A).unwrap();
        assert_eq!(parsed.answers.len(), 1);
        assert_eq!(parsed.answers[0].value, "1.2.3.4");
    }

    #[test]
    fn too_short_header_is_an_error() {
        assert!(parse_response(&[0u8; 4], QType::A).is_err());
    }

    #[test]
    fn owner_name_compression_points_back_into_question() {
        let mut buf = response_header(1, 0, 0, 0);
        let question_name_off = buf.len();
        push_name(&mut buf, "example.com");
        write_u16(&mut buf, QType::A.code());
        write_u16(&mut buf, QClass::IN.code());

        // owner is a pointer back to the question's QNAME
        buf.push(0xC0);
        buf.push(question_name_off as u8);
        push_rr_header(&mut buf, QType::A.code(), 60, &[10, 0, 0, 1]);

        let parsed = parse_response(&buf, QType::A).unwrap();
        assert_eq!(parsed.answers.len(), 1);
        assert_eq!(parsed.answers[0].value, "10.0.0.1");
    }
}
