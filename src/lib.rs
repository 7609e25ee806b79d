//! # Scanbridge
//!
//! `scanbridge` is a translation gateway that exposes the XML management
//! protocol (GMP) of a local vulnerability scanner daemon as a REST API.
//!
//! ## Authentication
//!
//! Clients authenticate once against `POST /authenticate` with a username and
//! password and receive a short-lived bearer token (HS256 JWT). Every other
//! route resolves the caller from that token before anything is forwarded to
//! the scanner daemon. Tokens are stateless: validity is decided entirely by
//! the signature and the embedded expiry, there is no server-side session
//! table and no revocation list.
//!
//! ## Backend connection
//!
//! The scanner manager listens on a Unix domain socket and speaks GMP, a
//! request/response XML protocol. Each forwarded request opens a fresh
//! connection, re-authenticates on the caller's behalf and sends a single
//! command. The raw XML reply is classified (see [`gmp::classify`]) so the
//! outer HTTP response mirrors the status the daemon reported instead of
//! blindly returning 200.
//!
//! At startup the process blocks until the daemon's socket answers a version
//! handshake; an unreachable or unhealthy backend terminates the process with
//! a distinct exit code (see [`gmp::handshake`]).

pub mod auth;
pub mod cli;
pub mod gmp;
pub mod scanbridge;
