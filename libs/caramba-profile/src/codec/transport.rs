//! Discriminated transport layout shared by VMess, VLESS and Trojan.
//!
//! Wire order after the version stamp and the base prefix:
//!
//! ```text
//! uuid encryption type
//!   tcp:  headerType host path
//!   kcp:  headerType mKcpSeed
//!   ws:   host path wsMaxEarlyData wsUseBrowserForwarder earlyDataHeaderName
//!   http: host path
//!   quic: headerType quicSecurity quicKey grpcServiceName
//!   grpc: grpcServiceName
//! security
//!   tls:  sni alpn certificates pinnedCertHash allowInsecure utlsFingerprint
//! [vmess] alterId experimentalAuthenticatedLength experimentalNoTerminationSignal
//! packetEncoding
//! ```

use tracing::{debug, warn};

use super::base::{read_base, write_base};
use super::migration::{StandardField, StandardPlan};
use crate::buffer::{Reader, Writer};
use crate::error::{ProfileError, Result};
use crate::models::{Network, ProfileBase, Security, StreamSettings, VmessExtra};
use crate::normalize::{required, required_copy};
use crate::options::DecodeOptions;

/// Protocol-specific fields appended after the TLS block.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Tail<'a> {
    Vmess(&'a VmessExtra),
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TailKind {
    Vmess,
    Plain,
}

/// A quic stream also carries grpc's service name. The quic branch of the
/// first encoder never terminated before the grpc one and persisted data
/// depends on that, so the layout keeps it.
pub fn carries_grpc_service_name(network: Network) -> bool {
    matches!(network, Network::Quic | Network::Grpc)
}

pub(crate) struct StandardBody {
    pub base: ProfileBase,
    pub stream: StreamSettings,
    pub vmess: Option<VmessExtra>,
    pub version: i32,
}

pub(crate) fn write_standard(
    w: &mut Writer,
    plan: StandardPlan,
    base: &ProfileBase,
    stream: &StreamSettings,
    tail: Tail<'_>,
) -> Result<()> {
    w.write_i32(plan.version());
    write_base(w, base)?;

    w.write_string(required(&stream.uuid, "uuid")?)?;
    w.write_string(required(&stream.encryption, "encryption")?)?;
    let network = required(&stream.network, "type")?;
    w.write_string(network)?;

    match Network::parse(network) {
        Some(kind) => write_network_fields(w, plan, kind, stream)?,
        None => debug!("type {:?} has no branch fields, writing none", network),
    }

    let security = required(&stream.security, "security")?;
    w.write_string(security)?;
    if security == "tls" {
        w.write_string(required(&stream.sni, "sni")?)?;
        w.write_string(required(&stream.alpn, "alpn")?)?;
        if plan.has(StandardField::TlsCertificates) {
            w.write_string(required(&stream.certificates, "certificates")?)?;
            w.write_string(required(&stream.pinned_peer_cert_sha256, "pinnedPeerCertificateChainSha256")?)?;
        }
        if plan.has(StandardField::TlsAllowInsecure) {
            w.write_bool(required_copy(&stream.allow_insecure, "allowInsecure")?);
        }
        if plan.has(StandardField::TlsUtlsFingerprint) {
            w.write_string(required(&stream.utls_fingerprint, "utlsFingerprint")?)?;
        }
    }

    match tail {
        Tail::Vmess(extra) => {
            if plan.has(StandardField::VmessAlterId) {
                w.write_i32(required_copy(&extra.alter_id, "alterId")?);
            }
            if plan.has(StandardField::VmessExperimentalFlags) {
                w.write_bool(required_copy(
                    &extra.experimental_authenticated_length,
                    "experimentalAuthenticatedLength",
                )?);
                w.write_bool(required_copy(
                    &extra.experimental_no_termination_signal,
                    "experimentalNoTerminationSignal",
                )?);
            }
        }
        Tail::Plain => {}
    }

    if plan.has(StandardField::PacketEncoding) {
        w.write_i32(required_copy(&stream.packet_encoding, "packetEncoding")?);
    }
    Ok(())
}

fn write_network_fields(
    w: &mut Writer,
    plan: StandardPlan,
    kind: Network,
    s: &StreamSettings,
) -> Result<()> {
    match kind {
        Network::Tcp => {
            w.write_string(required(&s.header_type, "headerType")?)?;
            w.write_string(required(&s.host, "host")?)?;
            w.write_string(required(&s.path, "path")?)?;
        }
        Network::Kcp => {
            w.write_string(required(&s.header_type, "headerType")?)?;
            w.write_string(required(&s.mkcp_seed, "mKcpSeed")?)?;
        }
        Network::Ws => {
            w.write_string(required(&s.host, "host")?)?;
            w.write_string(required(&s.path, "path")?)?;
            w.write_i32(required_copy(&s.ws_max_early_data, "wsMaxEarlyData")?);
            w.write_bool(required_copy(&s.ws_use_browser_forwarder, "wsUseBrowserForwarder")?);
            if plan.has(StandardField::EarlyDataHeaderName) {
                w.write_string(required(&s.early_data_header_name, "earlyDataHeaderName")?)?;
            }
        }
        Network::Http => {
            w.write_string(required(&s.host, "host")?)?;
            w.write_string(required(&s.path, "path")?)?;
        }
        Network::Quic => {
            w.write_string(required(&s.header_type, "headerType")?)?;
            w.write_string(required(&s.quic_security, "quicSecurity")?)?;
            w.write_string(required(&s.quic_key, "quicKey")?)?;
        }
        Network::Grpc => {}
    }
    if carries_grpc_service_name(kind) {
        w.write_string(required(&s.grpc_service_name, "grpcServiceName")?)?;
    }
    Ok(())
}

pub(crate) fn read_standard(
    r: &mut Reader<'_>,
    tail: TailKind,
    opts: &DecodeOptions,
) -> Result<StandardBody> {
    let version = r.read_i32()?;
    let plan = StandardPlan::for_version(version)?;
    debug!("reading standard layout v{}", version);

    let base = read_base(r)?;
    let mut s = StreamSettings {
        uuid: Some(r.read_string()?),
        encryption: Some(r.read_string()?),
        network: Some(r.read_string()?),
        ..Default::default()
    };

    let network = s.network.clone().unwrap_or_default();
    match Network::parse(&network) {
        Some(kind) => read_network_fields(r, plan, kind, &mut s)?,
        None if opts.strict_discriminators => {
            return Err(ProfileError::MalformedDiscriminator {
                field: "type",
                value: network,
            });
        }
        None => warn!("unknown transport type {:?}, no transport fields read", network),
    }

    let security = r.read_string()?;
    match Security::parse(&security) {
        Some(Security::Tls) => {
            s.sni = Some(r.read_string()?);
            s.alpn = Some(r.read_string()?);
            if plan.has(StandardField::TlsCertificates) {
                s.certificates = Some(r.read_string()?);
                s.pinned_peer_cert_sha256 = Some(r.read_string()?);
            }
            if plan.has(StandardField::TlsAllowInsecure) {
                s.allow_insecure = Some(r.read_bool()?);
            }
            if plan.has(StandardField::TlsUtlsFingerprint) {
                s.utls_fingerprint = Some(r.read_string()?);
            }
        }
        Some(Security::None) => {}
        None if opts.strict_discriminators => {
            return Err(ProfileError::MalformedDiscriminator {
                field: "security",
                value: security,
            });
        }
        None => warn!("unknown security {:?}, no tls fields read", security),
    }
    s.security = Some(security);

    let vmess = match tail {
        TailKind::Vmess => {
            let mut extra = VmessExtra::default();
            if plan.has(StandardField::VmessAlterId) {
                extra.alter_id = Some(r.read_i32()?);
            }
            if plan.has(StandardField::VmessExperimentalFlags) {
                extra.experimental_authenticated_length = Some(r.read_bool()?);
                extra.experimental_no_termination_signal = Some(r.read_bool()?);
            }
            Some(extra)
        }
        TailKind::Plain => None,
    };

    if plan.has(StandardField::PacketEncoding) {
        s.packet_encoding = Some(r.read_i32()?);
    }

    Ok(StandardBody {
        base,
        stream: s,
        vmess,
        version,
    })
}

fn read_network_fields(
    r: &mut Reader<'_>,
    plan: StandardPlan,
    kind: Network,
    s: &mut StreamSettings,
) -> Result<()> {
    match kind {
        Network::Tcp => {
            s.header_type = Some(r.read_string()?);
            s.host = Some(r.read_string()?);
            s.path = Some(r.read_string()?);
        }
        Network::Kcp => {
            s.header_type = Some(r.read_string()?);
            s.mkcp_seed = Some(r.read_string()?);
        }
        Network::Ws => {
            s.host = Some(r.read_string()?);
            s.path = Some(r.read_string()?);
            s.ws_max_early_data = Some(r.read_i32()?);
            s.ws_use_browser_forwarder = Some(r.read_bool()?);
            if plan.has(StandardField::EarlyDataHeaderName) {
                s.early_data_header_name = Some(r.read_string()?);
            }
        }
        Network::Http => {
            s.host = Some(r.read_string()?);
            s.path = Some(r.read_string()?);
        }
        Network::Quic => {
            s.header_type = Some(r.read_string()?);
            s.quic_security = Some(r.read_string()?);
            s.quic_key = Some(r.read_string()?);
        }
        Network::Grpc => {}
    }
    if carries_grpc_service_name(kind) {
        s.grpc_service_name = Some(r.read_string()?);
    }
    Ok(())
}
