//! Version migration table.
//!
//! Every encoded profile starts with the schema version that wrote it. The
//! tables below say which fields that version put on the wire; readers (and
//! the fixture writer) consult them instead of comparing versions inline.

use crate::error::{ProfileError, Result, SchemaFamily};

pub const STANDARD_SCHEMA_VERSION: i32 = 8;
pub const TROJAN_SCHEMA_VERSION: i32 = 2;
pub const HTTP_SCHEMA_VERSION: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionGate {
    /// Written by this version and every later one.
    Since(i32),
    /// Written by every version but this one.
    Except(i32),
}

impl VersionGate {
    pub const fn admits(self, version: i32) -> bool {
        match self {
            VersionGate::Since(min) => version >= min,
            VersionGate::Except(skip) => version != skip,
        }
    }
}

/// Standard-layout fields that did not exist from the start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardField {
    /// ws `earlyDataHeaderName`
    EarlyDataHeaderName,
    /// tls `certificates` and `pinnedPeerCertificateChainSha256`
    TlsCertificates,
    TlsAllowInsecure,
    TlsUtlsFingerprint,
    VmessAlterId,
    /// `experimentalAuthenticatedLength` and `experimentalNoTerminationSignal`
    VmessExperimentalFlags,
    PacketEncoding,
}

// Version 4 dropped alterId and introduced the experimental flags; version 5
// brought alterId back. Streams written by 4 exist in the wild.
pub const STANDARD_FIELD_GATES: [(StandardField, VersionGate); 7] = [
    (StandardField::TlsCertificates, VersionGate::Since(1)),
    (StandardField::EarlyDataHeaderName, VersionGate::Since(2)),
    (StandardField::TlsAllowInsecure, VersionGate::Since(3)),
    (StandardField::VmessAlterId, VersionGate::Except(4)),
    (StandardField::VmessExperimentalFlags, VersionGate::Since(4)),
    (StandardField::PacketEncoding, VersionGate::Since(7)),
    (StandardField::TlsUtlsFingerprint, VersionGate::Since(8)),
];

/// Resolved layout of one standard schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardPlan {
    version: i32,
}

impl StandardPlan {
    pub fn for_version(version: i32) -> Result<Self> {
        if !(0..=STANDARD_SCHEMA_VERSION).contains(&version) {
            return Err(ProfileError::UnsupportedSchemaVersion {
                family: SchemaFamily::Standard,
                version,
                supported: "0..=8",
            });
        }
        Ok(Self { version })
    }

    pub fn current() -> Self {
        Self {
            version: STANDARD_SCHEMA_VERSION,
        }
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn has(&self, field: StandardField) -> bool {
        STANDARD_FIELD_GATES
            .iter()
            .find(|(f, _)| *f == field)
            .is_none_or(|(_, gate)| gate.admits(self.version))
    }

    pub fn fields(&self) -> Vec<StandardField> {
        STANDARD_FIELD_GATES
            .iter()
            .filter(|(_, gate)| gate.admits(self.version))
            .map(|(f, _)| *f)
            .collect()
    }
}

/// Trojan layouts: the flat one predates the shared transport layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrojanPlan {
    Legacy { version: i32, allow_insecure: bool },
    Layered,
}

impl TrojanPlan {
    pub fn for_version(version: i32) -> Result<Self> {
        match version {
            0 => Ok(TrojanPlan::Legacy {
                version,
                allow_insecure: false,
            }),
            1 => Ok(TrojanPlan::Legacy {
                version,
                allow_insecure: true,
            }),
            2 => Ok(TrojanPlan::Layered),
            _ => Err(ProfileError::UnsupportedSchemaVersion {
                family: SchemaFamily::Trojan,
                version,
                supported: "0..=2",
            }),
        }
    }
}

/// HTTP profiles have a single generation. The tag is reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpPlan;

impl HttpPlan {
    pub fn for_version(version: i32) -> Result<Self> {
        if version != HTTP_SCHEMA_VERSION {
            return Err(ProfileError::UnsupportedSchemaVersion {
                family: SchemaFamily::Http,
                version,
                supported: "0",
            });
        }
        Ok(HttpPlan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use StandardField::*;

    fn plan(v: i32) -> StandardPlan {
        StandardPlan::for_version(v).unwrap()
    }

    #[test]
    fn version_zero_has_only_the_original_fields() {
        assert_eq!(plan(0).fields(), vec![VmessAlterId]);
    }

    #[test]
    fn per_version_rows() {
        assert_eq!(plan(1).fields(), vec![TlsCertificates, VmessAlterId]);
        assert_eq!(
            plan(3).fields(),
            vec![TlsCertificates, EarlyDataHeaderName, TlsAllowInsecure, VmessAlterId]
        );
        assert_eq!(
            plan(6).fields(),
            vec![
                TlsCertificates,
                EarlyDataHeaderName,
                TlsAllowInsecure,
                VmessAlterId,
                VmessExperimentalFlags
            ]
        );
        assert_eq!(plan(8).fields().len(), STANDARD_FIELD_GATES.len());
    }

    #[test]
    fn version_four_has_flags_but_no_alter_id() {
        let v4 = plan(4);
        assert!(!v4.has(VmessAlterId));
        assert!(v4.has(VmessExperimentalFlags));

        let v5 = plan(5);
        assert!(v5.has(VmessAlterId));
        assert!(v5.has(VmessExperimentalFlags));

        let v3 = plan(3);
        assert!(v3.has(VmessAlterId));
        assert!(!v3.has(VmessExperimentalFlags));
    }

    #[test]
    fn gates_match_first_version() {
        assert!(!plan(1).has(EarlyDataHeaderName));
        assert!(plan(2).has(EarlyDataHeaderName));
        assert!(!plan(6).has(PacketEncoding));
        assert!(plan(7).has(PacketEncoding));
        assert!(!plan(7).has(TlsUtlsFingerprint));
        assert!(plan(8).has(TlsUtlsFingerprint));
        assert_eq!(StandardPlan::current(), plan(STANDARD_SCHEMA_VERSION));
    }

    #[test]
    fn unknown_versions_are_rejected() {
        for v in [-1, 9, i32::MAX] {
            assert!(matches!(
                StandardPlan::for_version(v),
                Err(ProfileError::UnsupportedSchemaVersion {
                    family: SchemaFamily::Standard,
                    ..
                })
            ));
        }
        assert!(TrojanPlan::for_version(3).is_err());
        assert!(TrojanPlan::for_version(-1).is_err());
        assert!(HttpPlan::for_version(1).is_err());
        assert!(HttpPlan::for_version(0).is_ok());
    }

    #[test]
    fn trojan_rows() {
        assert_eq!(
            TrojanPlan::for_version(0).unwrap(),
            TrojanPlan::Legacy {
                version: 0,
                allow_insecure: false
            }
        );
        assert_eq!(
            TrojanPlan::for_version(1).unwrap(),
            TrojanPlan::Legacy {
                version: 1,
                allow_insecure: true
            }
        );
        assert_eq!(TrojanPlan::for_version(2).unwrap(), TrojanPlan::Layered);
    }
}
