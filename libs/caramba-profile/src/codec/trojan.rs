use tracing::debug;

use super::ProfileCodec;
use super::migration::{StandardPlan, TROJAN_SCHEMA_VERSION, TrojanPlan};
use super::transport::{Tail, TailKind, read_standard, write_standard};
use crate::buffer::{Reader, Writer};
use crate::error::{Result, SchemaFamily};
use crate::models::{ProfileBase, StreamSettings, TrojanProfile};
use crate::normalize::{required, required_copy};
use crate::options::DecodeOptions;

impl ProfileCodec for TrojanProfile {
    const FAMILY: SchemaFamily = SchemaFamily::Trojan;
    const CURRENT_VERSION: i32 = TROJAN_SCHEMA_VERSION;

    fn write_at(&self, w: &mut Writer, version: i32) -> Result<()> {
        let plan = TrojanPlan::for_version(version)?;
        w.write_i32(version);
        match plan {
            TrojanPlan::Layered => {
                write_standard(w, StandardPlan::current(), &self.base, &self.stream, Tail::Plain)?;
                w.write_string(required(&self.password, "password")?)?;
            }
            TrojanPlan::Legacy { allow_insecure, .. } => {
                w.write_string(required(&self.base.server_address, "serverAddress")?)?;
                w.write_i32(required_copy(&self.base.server_port, "serverPort")?);
                w.write_string(required(&self.password, "password")?)?;
                w.write_string(required(&self.stream.security, "security")?)?;
                w.write_string(required(&self.stream.sni, "sni")?)?;
                w.write_string(required(&self.stream.alpn, "alpn")?)?;
                if allow_insecure {
                    w.write_bool(required_copy(&self.stream.allow_insecure, "allowInsecure")?);
                }
            }
        }
        Ok(())
    }

    fn read_from(&mut self, r: &mut Reader<'_>, opts: &DecodeOptions) -> Result<i32> {
        let version = r.read_i32()?;
        match TrojanPlan::for_version(version)? {
            TrojanPlan::Layered => {
                let body = read_standard(r, TailKind::Plain, opts)?;
                debug!("trojan v{} wraps standard layout v{}", version, body.version);
                self.base = body.base;
                self.stream = body.stream;
                self.password = Some(r.read_string()?);
            }
            TrojanPlan::Legacy { allow_insecure, .. } => {
                // Flat layout from before the shared transport block existed.
                // There is no `type` on the wire; normalization sets tcp.
                debug!("trojan v{} uses the flat legacy layout", version);
                let server_address = r.read_string()?;
                let server_port = r.read_i32()?;
                self.base = ProfileBase {
                    server_address: Some(server_address),
                    server_port: Some(server_port),
                };
                self.password = Some(r.read_string()?);
                self.stream = StreamSettings {
                    security: Some(r.read_string()?),
                    sni: Some(r.read_string()?),
                    alpn: Some(r.read_string()?),
                    ..Default::default()
                };
                if allow_insecure {
                    self.stream.allow_insecure = Some(r.read_bool()?);
                }
            }
        }
        Ok(version)
    }

    fn normalize(&mut self) {
        self.initialize_default_values();
    }
}
