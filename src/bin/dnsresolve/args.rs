//! Manage command line arguments here.
use clap::{App, Arg};
use std::str::FromStr;

use dnslib::wire::QType;
use dnslib::DNSResult;

/// This structure holds the command line arguments.
#[derive(Debug)]
pub struct CliOptions {
    pub domain: String,
    pub qtype: QType,
    pub trace: bool,
    pub show_ttl: bool,
    pub bench: Option<u32>,
}

impl CliOptions {
    pub fn options() -> DNSResult<Self> {
        let matches = App::new("dnsresolve")
            .version("0.1")
            .about("A small iterative DNS resolver")
            .arg(
                Arg::new("domain")
                    .required(true)
                    .long_help("Domain name to resolve")
                    .index(1),
            )
            .arg(
                Arg::new("type")
                    .long("type")
                    .required(false)
                    .default_value("A")
                    .long_help("Record type to query: A, AAAA, MX or CNAME")
                    .takes_value(true),
            )
            .arg(
                Arg::new("trace")
                    .long("trace")
                    .required(false)
                    .long_help("Print every server queried along the referral chain")
                    .takes_value(false),
            )
            .arg(
                Arg::new("show-ttl")
                    .long("show-ttl")
                    .required(false)
                    .long_help("Query the cache only and print the domain's remaining TTL, or \"no entry\"")
                    .takes_value(false),
            )
            .arg(
                Arg::new("bench")
                    .long("bench")
                    .required(false)
                    .long_help("Repeat the resolution N times through the cache and report timing")
                    .takes_value(true),
            )
            .get_matches();

        let domain = String::from(matches.value_of("domain").unwrap());
        let qtype = QType::from_str(matches.value_of("type").unwrap())?;
        let trace = matches.is_present("trace");
        let show_ttl = matches.is_present("show-ttl");
        let bench = matches
            .value_of("bench")
            .map(|s| s.parse::<u32>())
            .transpose()
            .map_err(|e| dnslib::DNSError::new(&format!("invalid --bench value: {}", e)))?;

        Ok(CliOptions { domain, qtype, trace, show_ttl, bench })
    }
}
