//! Share-link import and export.
//!
//! Supported forms:
//! - `vmess://`, `vless://`, `trojan://` standard URI form
//!   (`scheme://id@host:port?type=ws&security=tls...#name`)
//! - `vmess://<net>[+tls]:<uuid>-<alterId>@host:port?...` (v2fly)
//! - `vmess://<base64 json>` (v2rayN)
//! - `http://` and `https://` proxy URLs
//!
//! Imported records are normalized before they are returned. The remark
//! (`#name`) is returned next to the record since it is not part of the
//! encoded profile.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::debug;
use url::Url;

use crate::error::{ProfileError, Result};
use crate::normalize::{required, required_copy};
use crate::models::{
    HttpProfile, Network, PacketEncoding, Profile, ProfileBase, StandardProfile, StandardProtocol,
    StreamSettings, TrojanProfile,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedProfile {
    pub name: String,
    pub profile: Profile,
}

pub fn parse_share_link(link: &str) -> Result<ImportedProfile> {
    let link = link.trim();
    let (scheme, rest) = link
        .split_once("://")
        .ok_or_else(|| ProfileError::share_link("missing scheme"))?;

    let mut imported = match scheme.to_ascii_lowercase().as_str() {
        "vmess" if !rest.contains('?') && !rest.contains('@') => parse_v2rayn(rest)?,
        "vmess" => parse_standard(rest, StandardKind::Vmess)?,
        "vless" => parse_standard(rest, StandardKind::Vless)?,
        "trojan" => parse_standard(rest, StandardKind::Trojan)?,
        "http" => parse_http(rest, false)?,
        "https" => parse_http(rest, true)?,
        other => {
            return Err(ProfileError::share_link(format!("unsupported scheme '{}'", other)));
        }
    };
    imported.profile.initialize_default_values();
    debug!("imported {} profile '{}'", imported.profile.kind(), imported.name);
    Ok(imported)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StandardKind {
    Vmess,
    Vless,
    Trojan,
}

struct ParsedUrl {
    base: ProfileBase,
    username: String,
    password: String,
    path: String,
    query: HashMap<String, String>,
    name: String,
}

fn parse_url(scheme: &str, rest: &str) -> Result<ParsedUrl> {
    // Re-parse under a special scheme so host, port and userinfo are split
    // the way browsers do it.
    let url = Url::parse(&format!("{}://{}", scheme, rest))
        .map_err(|e| ProfileError::share_link(e.to_string()))?;
    let host = url
        .host_str()
        .ok_or_else(|| ProfileError::share_link("missing host"))?
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_string();
    let port = url.port_or_known_default().unwrap_or(443);

    Ok(ParsedUrl {
        base: ProfileBase::new(host, i32::from(port)),
        username: percent_decode(url.username()),
        password: url.password().map(percent_decode).unwrap_or_default(),
        path: url.path().trim_start_matches('/').to_string(),
        query: url.query_pairs().into_owned().collect(),
        name: url.fragment().map(percent_decode).unwrap_or_default(),
    })
}

fn percent_decode(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

fn parse_standard(rest: &str, kind: StandardKind) -> Result<ImportedProfile> {
    let url = parse_url("https", rest)?;
    if kind == StandardKind::Vmess && !url.password.trim().is_empty() {
        return parse_v2fly(url);
    }
    let q = &url.query;
    let mut s = StreamSettings::default();

    if !url.path.is_empty() {
        s.path = Some(url.path.clone());
    }

    let network = q.get("type").cloned().unwrap_or_else(|| "tcp".to_string());
    s.encryption = q.get("encryption").cloned();

    let security = q.get("security").cloned().unwrap_or_else(|| match kind {
        StandardKind::Trojan => "tls".to_string(),
        _ => "none".to_string(),
    });
    if security == "tls" {
        s.sni = q.get("sni").or_else(|| q.get("peer")).cloned();
        s.alpn = q.get("alpn").cloned();
        s.certificates = q.get("cert").cloned();
        s.pinned_peer_cert_sha256 = q.get("chain").cloned();
        s.allow_insecure = q.get("allowInsecure").map(|v| v == "1" || v == "true");
    }
    s.security = Some(security);

    match Network::parse(&network) {
        Some(Network::Tcp) => {
            if q.get("headerType").map(String::as_str) == Some("http") {
                s.header_type = Some("http".to_string());
                s.host = q.get("host").cloned();
                if let Some(path) = q.get("path") {
                    s.path = Some(path.clone());
                }
            }
        }
        Some(Network::Kcp) => {
            s.header_type = q.get("headerType").cloned();
            s.mkcp_seed = q.get("seed").cloned();
        }
        Some(Network::Http) => {
            s.host = q.get("host").cloned();
            if let Some(path) = q.get("path") {
                s.path = Some(path.clone());
            }
        }
        Some(Network::Ws) => {
            s.host = q.get("host").cloned();
            if let Some(path) = q.get("path") {
                s.path = Some(path.clone());
            }
            if let Some(ed) = q.get("ed") {
                let ed = ed
                    .parse::<i32>()
                    .map_err(|_| ProfileError::share_link(format!("invalid ed '{}'", ed)))?;
                s.ws_max_early_data = Some(ed);
                s.early_data_header_name = q.get("eh").cloned();
            }
        }
        Some(Network::Quic) => {
            s.header_type = q.get("headerType").cloned();
            if let Some(qs) = q.get("quicSecurity") {
                s.quic_security = Some(qs.clone());
                s.quic_key = q.get("key").cloned();
            }
        }
        Some(Network::Grpc) => {
            s.grpc_service_name = q.get("serviceName").cloned();
        }
        None => debug!("share link uses unknown transport '{}'", network),
    }
    s.network = Some(network);

    if let Some(pe) = q.get("packetEncoding").and_then(|v| PacketEncoding::from_query(v)) {
        s.packet_encoding = Some(pe as i32);
    }

    let profile = match kind {
        StandardKind::Trojan => {
            // trojan-go style links may put part of the password after ':'
            let mut password = url.username.clone();
            if !url.password.is_empty() {
                password = format!("{}:{}", password, url.password);
            }
            Profile::Trojan(TrojanProfile {
                base: url.base,
                stream: s,
                password: Some(password),
            })
        }
        StandardKind::Vmess | StandardKind::Vless => {
            s.uuid = Some(url.username.clone());
            let mut p = if kind == StandardKind::Vmess {
                StandardProfile::vmess()
            } else {
                StandardProfile::vless()
            };
            p.base = url.base;
            p.stream = s;
            Profile::Standard(p)
        }
    };

    Ok(ImportedProfile {
        name: url.name,
        profile,
    })
}

/// v2fly form: the transport sits in the username, `uuid-alterId` in the password.
fn parse_v2fly(url: ParsedUrl) -> Result<ImportedProfile> {
    let q = &url.query;
    let (uuid, alter_id) = url
        .password
        .rsplit_once('-')
        .ok_or_else(|| ProfileError::share_link("expected <uuid>-<alterId> in userinfo"))?;
    let alter_id = alter_id
        .parse::<i32>()
        .map_err(|_| ProfileError::share_link(format!("invalid alterId '{}'", alter_id)))?;

    let mut s = StreamSettings {
        uuid: Some(uuid.to_string()),
        ..Default::default()
    };
    let network = match url.username.strip_suffix("+tls") {
        Some(network) => {
            s.security = Some("tls".to_string());
            s.sni = q.get("tlsServerName").filter(|v| !v.trim().is_empty()).cloned();
            network
        }
        None => url.username.as_str(),
    };

    match network {
        "tcp" => {
            if q.get("type").map(String::as_str) == Some("http") {
                s.header_type = Some("http".to_string());
                s.host = q.get("host").cloned();
            }
        }
        "http" => {
            s.path = q.get("path").cloned();
            s.host = q.get("host").map(|h| h.replace('|', ","));
        }
        "ws" => {
            s.path = q.get("path").cloned();
            s.host = q.get("host").cloned();
        }
        "kcp" => {
            s.header_type = q.get("type").cloned();
            s.mkcp_seed = q.get("seed").cloned();
        }
        "quic" => {
            s.quic_security = q.get("security").cloned();
            s.quic_key = q.get("key").cloned();
            s.header_type = q.get("type").cloned();
        }
        other => debug!("v2fly link uses transport '{}' without extra parameters", other),
    }
    s.network = Some(network.to_string());

    let mut p = StandardProfile::vmess();
    p.stream = s;
    if let StandardProtocol::Vmess(extra) = &mut p.protocol {
        extra.alter_id = Some(alter_id);
    }
    p.base = url.base;

    Ok(ImportedProfile {
        name: url.name,
        profile: Profile::Standard(p),
    })
}

/// v2rayN before `"v": "2"` packed ws and h2 settings as `path;host` in `host`.
fn split_legacy_ws_host(raw: &str) -> (String, String) {
    let mut parts = raw.split(';');
    let path = parts.next().unwrap_or_default().trim().to_string();
    let host = parts.next().unwrap_or_default().trim().to_string();
    (path, host)
}

fn decode_base64_lenient(raw: &str) -> Result<Vec<u8>> {
    let trimmed = raw.trim().trim_end_matches('=');
    STANDARD_NO_PAD
        .decode(trimmed)
        .or_else(|_| URL_SAFE_NO_PAD.decode(trimmed))
        .map_err(|e| ProfileError::share_link(format!("invalid base64: {}", e)))
}

fn json_str(v: &Value, key: &str) -> Option<String> {
    match v.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_int(v: &Value, key: &str) -> Option<i32> {
    match v.get(key)? {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_v2rayn(rest: &str) -> Result<ImportedProfile> {
    let decoded = decode_base64_lenient(rest)?;
    let v: Value = serde_json::from_slice(&decoded)
        .map_err(|e| ProfileError::share_link(format!("invalid v2rayN json: {}", e)))?;

    let network = json_str(&v, "net").unwrap_or_default();
    let mut host = json_str(&v, "host").unwrap_or_default();
    let mut path = json_str(&v, "path").unwrap_or_default();
    if json_int(&v, "v").unwrap_or(2) < 2 && matches!(network.as_str(), "ws" | "h2") {
        (path, host) = split_legacy_ws_host(&host);
    }

    let mut s = StreamSettings {
        uuid: json_str(&v, "id"),
        encryption: json_str(&v, "scy"),
        header_type: json_str(&v, "type"),
        security: json_str(&v, "tls"),
        sni: json_str(&v, "sni").or_else(|| Some(host.clone())),
        ..Default::default()
    };
    match Network::parse(&network) {
        Some(Network::Quic) => {
            s.quic_security = Some(host);
            s.quic_key = Some(path);
        }
        Some(Network::Kcp) => s.mkcp_seed = Some(path),
        Some(Network::Grpc) => s.grpc_service_name = Some(path),
        _ => {
            s.host = Some(host);
            s.path = Some(path);
        }
    }
    s.network = Some(network);

    let mut p = StandardProfile::vmess();
    p.base = ProfileBase {
        server_address: json_str(&v, "add"),
        server_port: json_int(&v, "port"),
    };
    p.stream = s;
    if let StandardProtocol::Vmess(extra) = &mut p.protocol {
        extra.alter_id = json_int(&v, "aid");
    }

    Ok(ImportedProfile {
        name: json_str(&v, "ps").unwrap_or_default(),
        profile: Profile::Standard(p),
    })
}

fn parse_http(rest: &str, tls: bool) -> Result<ImportedProfile> {
    let url = parse_url(if tls { "https" } else { "http" }, rest)?;
    let profile = HttpProfile {
        base: url.base,
        username: Some(url.username),
        password: Some(url.password),
        tls,
        sni: url.query.get("sni").cloned(),
        ..Default::default()
    };
    Ok(ImportedProfile {
        name: url.name,
        profile: Profile::Http(profile),
    })
}

fn host_for_uri(host: &str) -> String {
    if host.contains(':') {
        format!("[{}]", host)
    } else {
        host.to_string()
    }
}

fn field(v: &Option<String>) -> &str {
    v.as_deref().unwrap_or_default()
}

fn non_blank(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|x| !x.trim().is_empty())
}

/// `userinfo` must already be percent-encoded.
fn finish_link(
    scheme: &str,
    userinfo: Option<&str>,
    base: &ProfileBase,
    query: String,
    name: &str,
) -> Result<String> {
    let address = required(&base.server_address, "serverAddress")?;
    let port = required_copy(&base.server_port, "serverPort")?;

    let mut out = format!("{}://", scheme);
    if let Some(userinfo) = userinfo {
        out.push_str(userinfo);
        out.push('@');
    }
    out.push_str(&host_for_uri(address));
    out.push(':');
    out.push_str(&port.to_string());
    if !query.is_empty() {
        out.push('?');
        out.push_str(&query);
    }
    if !name.is_empty() {
        out.push('#');
        out.push_str(&urlencoding::encode(name));
    }
    Ok(out)
}

impl Profile {
    /// Render the record as a share link. `name` becomes the `#fragment`.
    ///
    /// The record must be normalized: the endpoint and the credential are
    /// required, as they are for [`Profile::encode`].
    pub fn to_share_link(&self, name: &str) -> Result<String> {
        let base = self.base();
        match self {
            Profile::Http(p) => http_link(p, base, name),
            Profile::Standard(p) => {
                if let StandardProtocol::Vmess(extra) = &p.protocol {
                    if extra.alter_id.unwrap_or_default() > 0 {
                        return v2rayn_link(p, base, name);
                    }
                }
                let scheme = match p.protocol {
                    StandardProtocol::Vmess(_) => "vmess",
                    StandardProtocol::Vless => "vless",
                };
                let uuid = required(&p.stream.uuid, "uuid")?;
                standard_link(scheme, uuid, base, &p.stream, true, name)
            }
            Profile::Trojan(p) => {
                let password = required(&p.password, "password")?;
                standard_link("trojan", password, base, &p.stream, false, name)
            }
        }
    }
}

fn standard_link(
    scheme: &str,
    userinfo: &str,
    base: &ProfileBase,
    s: &StreamSettings,
    with_encryption: bool,
    name: &str,
) -> Result<String> {
    let network = field(&s.network);
    let mut q = url::form_urlencoded::Serializer::new(String::new());
    q.append_pair("type", network);
    if with_encryption {
        q.append_pair("encryption", field(&s.encryption));
    }

    let header_type = non_blank(&s.header_type).filter(|h| *h != "none");

    match s.network_kind() {
        Some(Network::Tcp) => {
            if field(&s.header_type) == "http" {
                q.append_pair("headerType", "http");
                if let Some(host) = non_blank(&s.host) {
                    q.append_pair("host", host);
                }
                if let Some(path) = non_blank(&s.path) {
                    q.append_pair("path", path);
                }
            }
        }
        Some(Network::Kcp) => {
            if let Some(h) = header_type {
                q.append_pair("headerType", h);
            }
            if let Some(seed) = non_blank(&s.mkcp_seed) {
                q.append_pair("seed", seed);
            }
        }
        Some(kind @ (Network::Ws | Network::Http)) => {
            if let Some(host) = non_blank(&s.host) {
                q.append_pair("host", host);
            }
            if let Some(path) = non_blank(&s.path) {
                q.append_pair("path", path);
            }
            let ed = s.ws_max_early_data.unwrap_or_default();
            if kind == Network::Ws && ed > 0 {
                q.append_pair("ed", &ed.to_string());
                if let Some(eh) = non_blank(&s.early_data_header_name) {
                    q.append_pair("eh", eh);
                }
            }
        }
        Some(Network::Quic) => {
            if let Some(h) = header_type {
                q.append_pair("headerType", h);
            }
            if let Some(qs) = non_blank(&s.quic_security).filter(|x| *x != "none") {
                q.append_pair("quicSecurity", qs);
                q.append_pair("key", field(&s.quic_key));
            }
        }
        Some(Network::Grpc) => {
            if let Some(svc) = non_blank(&s.grpc_service_name) {
                q.append_pair("serviceName", svc);
            }
        }
        None => {}
    }

    if let Some(security) = non_blank(&s.security).filter(|x| *x != "none") {
        q.append_pair("security", security);
        if security == "tls" {
            if let Some(sni) = non_blank(&s.sni) {
                q.append_pair("sni", sni);
            }
            if let Some(alpn) = non_blank(&s.alpn) {
                q.append_pair("alpn", alpn);
            }
            if let Some(cert) = non_blank(&s.certificates) {
                q.append_pair("cert", cert);
            }
            if let Some(chain) = non_blank(&s.pinned_peer_cert_sha256) {
                q.append_pair("chain", chain);
            }
            if s.allow_insecure.unwrap_or_default() {
                q.append_pair("allowInsecure", "1");
            }
        }
    }

    if let Some(name) = s
        .packet_encoding
        .and_then(PacketEncoding::from_i32)
        .and_then(PacketEncoding::query_name)
    {
        q.append_pair("packetEncoding", name);
    }

    let userinfo = urlencoding::encode(userinfo);
    finish_link(scheme, Some(&userinfo), base, q.finish(), name)
}

fn v2rayn_link(p: &StandardProfile, base: &ProfileBase, name: &str) -> Result<String> {
    let s = &p.stream;
    let network = field(&s.network);
    let (host, path) = match s.network_kind() {
        Some(Network::Quic) => (field(&s.quic_security), field(&s.quic_key)),
        Some(Network::Kcp) => ("", field(&s.mkcp_seed)),
        Some(Network::Grpc) => ("", field(&s.grpc_service_name)),
        _ => (field(&s.host), field(&s.path)),
    };
    let alter_id = p
        .vmess_extra()
        .and_then(|e| e.alter_id)
        .unwrap_or_default();

    let address = required(&base.server_address, "serverAddress")?;
    let port = required_copy(&base.server_port, "serverPort")?;
    let uuid = required(&s.uuid, "uuid")?;

    let body = json!({
        "v": "2",
        "ps": name,
        "add": address,
        "port": port.to_string(),
        "id": uuid,
        "aid": alter_id.to_string(),
        "scy": field(&s.encryption),
        "net": network,
        "type": field(&s.header_type),
        "host": host,
        "path": path,
        "tls": field(&s.security),
        "sni": field(&s.sni),
    });
    Ok(format!("vmess://{}", STANDARD.encode(body.to_string())))
}

fn http_link(p: &HttpProfile, base: &ProfileBase, name: &str) -> Result<String> {
    let scheme = if p.tls { "https" } else { "http" };
    let username = field(&p.username);
    let password = field(&p.password);
    let userinfo = match (username.is_empty(), password.is_empty()) {
        (true, true) => None,
        (_, true) => Some(urlencoding::encode(username).into_owned()),
        _ => Some(format!(
            "{}:{}",
            urlencoding::encode(username),
            urlencoding::encode(password)
        )),
    };

    let mut q = url::form_urlencoded::Serializer::new(String::new());
    if p.tls {
        if let Some(sni) = non_blank(&p.sni) {
            q.append_pair("sni", sni);
        }
    }
    finish_link(scheme, userinfo.as_deref(), base, q.finish(), name)
}
