use super::migration::STANDARD_SCHEMA_VERSION;
use super::*;
use crate::buffer::Writer;
use crate::error::ProfileError;
use crate::models::{
    HttpProfile, Network, ProfileBase, StandardProfile, StandardProtocol, StreamSettings,
    TrojanProfile, VmessExtra,
};

fn stream(network: &str) -> StreamSettings {
    StreamSettings {
        uuid: Some("b831381d-6324-4d53-ad4f-8cda48b30811".into()),
        network: Some(network.into()),
        host: Some("cdn.example.com".into()),
        path: Some("/ray".into()),
        header_type: Some("none".into()),
        mkcp_seed: Some("seed".into()),
        quic_security: Some("aes-128-gcm".into()),
        quic_key: Some("QUIC-KEY-MARKER".into()),
        grpc_service_name: Some("GRPC-SERVICE-MARKER".into()),
        ws_max_early_data: Some(2048),
        ws_use_browser_forwarder: Some(true),
        early_data_header_name: Some("Sec-WebSocket-Protocol".into()),
        ..Default::default()
    }
}

fn with_tls(mut s: StreamSettings) -> StreamSettings {
    s.security = Some("tls".into());
    s.sni = Some("sni.example.com".into());
    s.alpn = Some("h2,http/1.1".into());
    s.certificates = Some("-----BEGIN CERTIFICATE-----".into());
    s.pinned_peer_cert_sha256 = Some("c2hhMjU2".into());
    s.allow_insecure = Some(true);
    s.utls_fingerprint = Some("chrome".into());
    s
}

fn vmess(s: StreamSettings) -> StandardProfile {
    let mut p = StandardProfile {
        base: ProfileBase::new("203.0.113.7", 443),
        stream: s,
        protocol: StandardProtocol::Vmess(VmessExtra {
            alter_id: Some(16),
            experimental_authenticated_length: Some(true),
            experimental_no_termination_signal: Some(true),
        }),
    };
    p.initialize_default_values();
    p
}

fn vless(s: StreamSettings) -> StandardProfile {
    let mut p = StandardProfile {
        base: ProfileBase::new("vless.example.com", 8443),
        stream: s,
        protocol: StandardProtocol::Vless,
    };
    p.initialize_default_values();
    p
}

fn contains(haystack: &[u8], needle: &str) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle.as_bytes())
}

#[test]
fn standard_round_trip_every_network_and_security() {
    for network in Network::ALL {
        for tls in [false, true] {
            let s = stream(network.as_str());
            let s = if tls { with_tls(s) } else { s };
            for original in [vmess(s.clone()), vless(s)] {
                let bytes = original.encode().unwrap();
                let kind = Profile::from(original.clone()).kind();
                let decoded = Profile::decode(kind, &bytes).unwrap();
                let Profile::Standard(decoded) = decoded else {
                    panic!("expected standard profile");
                };

                // Inactive branch fields are not carried; compare what was.
                assert_eq!(decoded.base, original.base, "{network:?} tls={tls}");
                assert_eq!(decoded.protocol, original.protocol);
                assert_eq!(decoded.stream.network, original.stream.network);
                assert_eq!(decoded.stream.security, original.stream.security);
                assert_eq!(decoded.encode().unwrap(), bytes, "{network:?} tls={tls}");
            }
        }
    }
}

#[test]
fn clone_through_codec_is_lossless_for_active_fields() {
    let original = vmess(with_tls(stream("ws")));
    let decoded = Profile::decode(ProfileKind::Vmess, &original.encode().unwrap()).unwrap();
    let Profile::Standard(decoded) = decoded else {
        panic!("expected standard profile");
    };
    assert_eq!(decoded.stream.host, original.stream.host);
    assert_eq!(decoded.stream.path, original.stream.path);
    assert_eq!(decoded.stream.ws_max_early_data, Some(2048));
    assert_eq!(decoded.stream.ws_use_browser_forwarder, Some(true));
    assert_eq!(decoded.stream.early_data_header_name, original.stream.early_data_header_name);
    assert_eq!(decoded.stream.utls_fingerprint.as_deref(), Some("chrome"));
    assert_eq!(decoded.stream.allow_insecure, Some(true));
    // quic/grpc fields were never written for ws
    assert_eq!(decoded.stream.quic_key.as_deref(), Some(""));
    assert_eq!(decoded.stream.grpc_service_name.as_deref(), Some(""));
}

#[test]
fn fully_defaulted_records_round_trip_exactly() {
    for kind in [ProfileKind::Http, ProfileKind::Vmess, ProfileKind::Vless, ProfileKind::Trojan] {
        let mut p = Profile::empty(kind);
        p.initialize_default_values();
        let decoded = Profile::decode(kind, &p.encode().unwrap()).unwrap();
        assert_eq!(decoded, p, "{kind}");
    }
}

#[test]
fn reencoding_stamps_current_version() {
    let p = vmess(with_tls(stream("tcp")));
    for v in 0..=STANDARD_SCHEMA_VERSION {
        let old = p.encode_at_version(v).unwrap();
        assert_eq!(schema_version(&old).unwrap(), v);

        let migrated = Profile::migrate(ProfileKind::Vmess, &old, &DecodeOptions::default()).unwrap();
        assert_eq!(schema_version(&migrated).unwrap(), STANDARD_SCHEMA_VERSION);
    }

    let mut trojan = Profile::Trojan(TrojanProfile {
        base: ProfileBase::new("t.example.com", 443),
        password: Some("pw".into()),
        ..Default::default()
    });
    trojan.initialize_default_values();
    let legacy = trojan.encode_at_version(0).unwrap();
    let migrated = Profile::migrate(ProfileKind::Trojan, &legacy, &DecodeOptions::default()).unwrap();
    assert_eq!(schema_version(&migrated).unwrap(), 2);
}

#[test]
fn ws_stream_never_carries_quic_or_grpc_fields() {
    let bytes = vless(with_tls(stream("ws"))).encode().unwrap();
    assert!(!contains(&bytes, "QUIC-KEY-MARKER"));
    assert!(!contains(&bytes, "GRPC-SERVICE-MARKER"));
    assert!(!contains(&bytes, "seed"));
    assert!(contains(&bytes, "cdn.example.com"));
}

#[test]
fn quic_stream_falls_through_to_grpc_service_name() {
    let p = vless(stream("quic"));
    let bytes = p.encode().unwrap();

    let mut w = Writer::new();
    w.write_i32(8);
    w.write_string("vless.example.com").unwrap();
    w.write_i32(8443);
    w.write_string("b831381d-6324-4d53-ad4f-8cda48b30811").unwrap();
    w.write_string("none").unwrap();
    w.write_string("quic").unwrap();
    w.write_string("none").unwrap();
    w.write_string("aes-128-gcm").unwrap();
    w.write_string("QUIC-KEY-MARKER").unwrap();
    w.write_string("GRPC-SERVICE-MARKER").unwrap();
    w.write_string("").unwrap();
    w.write_i32(0);
    assert_eq!(bytes, w.dump());
    assert!(carries_grpc_service_name(Network::Quic));
    assert!(!carries_grpc_service_name(Network::Ws));

    let Profile::Standard(decoded) = Profile::decode(ProfileKind::Vless, &bytes).unwrap() else {
        panic!("expected standard profile");
    };
    assert_eq!(decoded.stream.quic_key.as_deref(), Some("QUIC-KEY-MARKER"));
    assert_eq!(decoded.stream.grpc_service_name.as_deref(), Some("GRPC-SERVICE-MARKER"));
}

#[test]
fn grpc_stream_layout() {
    let bytes = vless(stream("grpc")).encode().unwrap();
    assert!(contains(&bytes, "GRPC-SERVICE-MARKER"));
    assert!(!contains(&bytes, "QUIC-KEY-MARKER"));
}

#[test]
fn vmess_tail_layout_at_current_version() {
    let p = vmess(stream("kcp"));
    let bytes = p.encode().unwrap();

    let mut w = Writer::new();
    w.write_i32(8);
    w.write_string("203.0.113.7").unwrap();
    w.write_i32(443);
    w.write_string("b831381d-6324-4d53-ad4f-8cda48b30811").unwrap();
    w.write_string("auto").unwrap();
    w.write_string("kcp").unwrap();
    w.write_string("none").unwrap();
    w.write_string("seed").unwrap();
    w.write_string("").unwrap();
    w.write_i32(16);
    w.write_bool(true);
    w.write_bool(true);
    w.write_i32(0);
    assert_eq!(bytes, w.dump());
}

#[test]
fn vmess_version_four_has_flags_and_no_alter_id() {
    let p = vmess(stream("tcp"));
    let v4 = p.encode_at_version(4).unwrap();
    let v5 = p.encode_at_version(5).unwrap();
    assert_eq!(v5.len(), v4.len() + 4);

    let Profile::Standard(decoded) = Profile::decode(ProfileKind::Vmess, &v4).unwrap() else {
        panic!("expected standard profile");
    };
    let extra = decoded.vmess_extra().unwrap();
    assert_eq!(extra.alter_id, Some(0));
    assert_eq!(extra.experimental_authenticated_length, Some(true));
    assert_eq!(extra.experimental_no_termination_signal, Some(true));

    let Profile::Standard(decoded) = Profile::decode(ProfileKind::Vmess, &v5).unwrap() else {
        panic!("expected standard profile");
    };
    assert_eq!(decoded.vmess_extra().unwrap().alter_id, Some(16));
}

#[test]
fn vmess_before_version_four_has_alter_id_only() {
    let p = vmess(stream("tcp"));
    let Profile::Standard(decoded) =
        Profile::decode(ProfileKind::Vmess, &p.encode_at_version(3).unwrap()).unwrap()
    else {
        panic!("expected standard profile");
    };
    let extra = decoded.vmess_extra().unwrap();
    assert_eq!(extra.alter_id, Some(16));
    assert_eq!(extra.experimental_authenticated_length, Some(false));
    assert_eq!(decoded.stream.packet_encoding, Some(0));
}

#[test]
fn old_tls_block_omits_later_fields() {
    let p = vless(with_tls(stream("ws")));
    let Profile::Standard(decoded) =
        Profile::decode(ProfileKind::Vless, &p.encode_at_version(0).unwrap()).unwrap()
    else {
        panic!("expected standard profile");
    };
    assert_eq!(decoded.stream.sni.as_deref(), Some("sni.example.com"));
    assert_eq!(decoded.stream.certificates.as_deref(), Some(""));
    assert_eq!(decoded.stream.allow_insecure, Some(false));
    assert_eq!(decoded.stream.utls_fingerprint.as_deref(), Some(""));
    assert_eq!(decoded.stream.early_data_header_name.as_deref(), Some(""));
    assert_eq!(decoded.stream.ws_max_early_data, Some(2048));

    let Profile::Standard(decoded) =
        Profile::decode(ProfileKind::Vless, &p.encode_at_version(7).unwrap()).unwrap()
    else {
        panic!("expected standard profile");
    };
    assert_eq!(decoded.stream.allow_insecure, Some(true));
    assert_eq!(decoded.stream.utls_fingerprint.as_deref(), Some(""));
}

#[test]
fn legacy_trojan_version_one() {
    let mut w = Writer::new();
    w.write_i32(1);
    w.write_string("trojan.example.com").unwrap();
    w.write_i32(443);
    w.write_string("hunter2").unwrap();
    w.write_string("tls").unwrap();
    w.write_string("sni.example.com").unwrap();
    w.write_string("h2").unwrap();
    w.write_bool(true);
    let bytes = w.dump();

    let Profile::Trojan(p) = Profile::decode(ProfileKind::Trojan, &bytes).unwrap() else {
        panic!("expected trojan profile");
    };
    assert_eq!(p.base, ProfileBase::new("trojan.example.com", 443));
    assert_eq!(p.password.as_deref(), Some("hunter2"));
    assert_eq!(p.stream.security.as_deref(), Some("tls"));
    assert_eq!(p.stream.sni.as_deref(), Some("sni.example.com"));
    assert_eq!(p.stream.alpn.as_deref(), Some("h2"));
    assert_eq!(p.stream.allow_insecure, Some(true));
    assert_eq!(p.stream.network.as_deref(), Some("tcp"));
    assert_eq!(p.stream.path.as_deref(), Some("/"));
}

#[test]
fn legacy_trojan_version_zero_has_no_allow_insecure() {
    let mut w = Writer::new();
    w.write_i32(0);
    w.write_string("trojan.example.com").unwrap();
    w.write_i32(443);
    w.write_string("hunter2").unwrap();
    w.write_string("").unwrap();
    w.write_string("").unwrap();
    w.write_string("").unwrap();
    let bytes = w.dump();

    let Profile::Trojan(p) = Profile::decode(ProfileKind::Trojan, &bytes).unwrap() else {
        panic!("expected trojan profile");
    };
    assert_eq!(p.stream.allow_insecure, Some(false));
    // blank security on a trojan record means tls
    assert_eq!(p.stream.security.as_deref(), Some("tls"));
}

#[test]
fn layered_trojan_wraps_standard_layout() {
    let mut p = TrojanProfile {
        base: ProfileBase::new("t.example.com", 443),
        stream: with_tls(stream("grpc")),
        password: Some("secret".into()),
    };
    p.initialize_default_values();
    let bytes = p.encode().unwrap();

    assert_eq!(schema_version(&bytes).unwrap(), 2);
    assert_eq!(schema_version(&bytes[4..]).unwrap(), STANDARD_SCHEMA_VERSION);
    assert!(bytes.ends_with(&{
        let mut w = Writer::new();
        w.write_string("secret").unwrap();
        w.dump()
    }));

    let Profile::Trojan(decoded) = Profile::decode(ProfileKind::Trojan, &bytes).unwrap() else {
        panic!("expected trojan profile");
    };
    assert_eq!(decoded.password.as_deref(), Some("secret"));
    assert_eq!(decoded.stream.grpc_service_name.as_deref(), Some("GRPC-SERVICE-MARKER"));
    assert_eq!(decoded.stream.utls_fingerprint.as_deref(), Some("chrome"));
}

#[test]
fn trojan_legacy_writer_round_trips() {
    let mut p = TrojanProfile {
        base: ProfileBase::new("t.example.com", 443),
        stream: with_tls(StreamSettings::default()),
        password: Some("secret".into()),
    };
    p.initialize_default_values();
    let Profile::Trojan(decoded) =
        Profile::decode(ProfileKind::Trojan, &p.encode_at_version(1).unwrap()).unwrap()
    else {
        panic!("expected trojan profile");
    };
    assert_eq!(decoded.stream.sni, p.stream.sni);
    assert_eq!(decoded.stream.allow_insecure, Some(true));
    assert_eq!(decoded.stream.certificates.as_deref(), Some(""));
}

#[test]
fn http_without_tls_reads_no_tls_bytes() {
    let mut p = HttpProfile {
        base: ProfileBase::new("proxy.example.com", 3128),
        username: Some("alice".into()),
        password: Some("pw".into()),
        tls: false,
        sni: Some("ignored.example.com".into()),
        ..Default::default()
    };
    p.initialize_default_values();
    let bytes = p.encode().unwrap();

    let mut w = Writer::new();
    w.write_i32(0);
    w.write_string("proxy.example.com").unwrap();
    w.write_i32(3128);
    w.write_string("alice").unwrap();
    w.write_string("pw").unwrap();
    w.write_bool(false);
    assert_eq!(bytes, w.dump());

    let Profile::Http(decoded) = Profile::decode(ProfileKind::Http, &bytes).unwrap() else {
        panic!("expected http profile");
    };
    assert_eq!(decoded.sni.as_deref(), Some(""));
    assert!(!decoded.tls);
}

#[test]
fn http_with_tls_round_trips() {
    let mut p = HttpProfile {
        base: ProfileBase::new("proxy.example.com", 443),
        tls: true,
        sni: Some("proxy.example.com".into()),
        allow_insecure: Some(true),
        ..Default::default()
    };
    p.initialize_default_values();
    let decoded = Profile::decode(ProfileKind::Http, &p.encode().unwrap()).unwrap();
    assert_eq!(decoded, Profile::Http(p));
}

#[test]
fn unknown_versions_are_rejected() {
    let mut w = Writer::new();
    w.write_i32(9);
    let bytes = w.dump();
    assert!(matches!(
        Profile::decode(ProfileKind::Vless, &bytes),
        Err(ProfileError::UnsupportedSchemaVersion { version: 9, .. })
    ));

    let mut w = Writer::new();
    w.write_i32(3);
    assert!(matches!(
        Profile::decode(ProfileKind::Trojan, &w.dump()),
        Err(ProfileError::UnsupportedSchemaVersion { version: 3, .. })
    ));

    let mut w = Writer::new();
    w.write_i32(1);
    assert!(matches!(
        Profile::decode(ProfileKind::Http, &w.dump()),
        Err(ProfileError::UnsupportedSchemaVersion { version: 1, .. })
    ));

    // a layered trojan stream with a bad inner version
    let mut w = Writer::new();
    w.write_i32(2);
    w.write_i32(42);
    assert!(matches!(
        Profile::decode(ProfileKind::Trojan, &w.dump()),
        Err(ProfileError::UnsupportedSchemaVersion { version: 42, .. })
    ));

    let p = vless(stream("tcp"));
    assert!(p.encode_at_version(9).is_err());
}

#[test]
fn every_truncation_is_reported() {
    let bytes = vmess(with_tls(stream("ws"))).encode().unwrap();
    for cut in 0..bytes.len() {
        let err = Profile::decode(ProfileKind::Vmess, &bytes[..cut]).unwrap_err();
        assert!(matches!(err, ProfileError::TruncatedInput { .. }), "cut at {cut}: {err}");
    }
}

#[test]
fn encoding_unnormalized_record_fails() {
    let p = Profile::empty(ProfileKind::Vless);
    assert_eq!(
        p.encode().unwrap_err(),
        ProfileError::UnnormalizedRecord { field: "serverAddress" }
    );

    let mut p = vless(with_tls(stream("tcp")));
    p.stream.utls_fingerprint = None;
    assert_eq!(
        p.encode().unwrap_err(),
        ProfileError::UnnormalizedRecord { field: "utlsFingerprint" }
    );
}

fn standard_stream_with(network: &str, security: &str) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_i32(8);
    w.write_string("example.com").unwrap();
    w.write_i32(443);
    w.write_string("id").unwrap();
    w.write_string("none").unwrap();
    w.write_string(network).unwrap();
    w.write_string(security).unwrap();
    w.write_i32(0);
    w.dump()
}

// Unknown discriminators fall through silently by default: nothing is read
// for the branch, exactly as nothing was written for it.
#[test]
fn unknown_type_defaults_silently() {
    let bytes = standard_stream_with("splithttp", "");
    let Profile::Standard(p) = Profile::decode(ProfileKind::Vless, &bytes).unwrap() else {
        panic!("expected standard profile");
    };
    assert_eq!(p.stream.network.as_deref(), Some("splithttp"));
    assert_eq!(p.stream.host.as_deref(), Some(""));
    assert_eq!(p.encode().unwrap(), bytes);
}

#[test]
fn unknown_type_fails_in_strict_mode() {
    let bytes = standard_stream_with("splithttp", "");
    assert_eq!(
        Profile::decode_with(ProfileKind::Vless, &bytes, &DecodeOptions::strict()).unwrap_err(),
        ProfileError::MalformedDiscriminator {
            field: "type",
            value: "splithttp".into()
        }
    );
}

#[test]
fn unknown_security_defaults_silently_unless_strict() {
    let bytes = standard_stream_with("none-such", "reality");
    let Profile::Standard(p) = Profile::decode(ProfileKind::Vless, &bytes).unwrap() else {
        panic!("expected standard profile");
    };
    assert_eq!(p.stream.security.as_deref(), Some("reality"));
    assert_eq!(p.stream.sni.as_deref(), Some(""));

    let mut w = Writer::new();
    w.write_i32(8);
    w.write_string("example.com").unwrap();
    w.write_i32(443);
    w.write_string("id").unwrap();
    w.write_string("none").unwrap();
    w.write_string("grpc").unwrap();
    w.write_string("svc").unwrap();
    w.write_string("reality").unwrap();
    w.write_i32(0);
    assert_eq!(
        Profile::decode_with(ProfileKind::Vless, &w.dump(), &DecodeOptions::strict()).unwrap_err(),
        ProfileError::MalformedDiscriminator {
            field: "security",
            value: "reality".into()
        }
    );
}

#[test]
fn legacy_h2_alias_is_normalized_after_decode() {
    let bytes = standard_stream_with("h2", "none");
    let Profile::Standard(p) = Profile::decode(ProfileKind::Vless, &bytes).unwrap() else {
        panic!("expected standard profile");
    };
    assert_eq!(p.stream.network.as_deref(), Some("http"));
}

#[test]
fn decode_tolerates_trailing_bytes() {
    let mut bytes = vless(stream("tcp")).encode().unwrap();
    bytes.extend_from_slice(&[0xde, 0xad]);
    assert!(Profile::decode(ProfileKind::Vless, &bytes).is_ok());
}
