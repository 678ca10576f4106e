use super::ProfileCodec;
use super::base::{read_base, write_base};
use super::migration::{HTTP_SCHEMA_VERSION, HttpPlan};
use crate::buffer::{Reader, Writer};
use crate::error::{Result, SchemaFamily};
use crate::models::HttpProfile;
use crate::normalize::{required, required_copy};
use crate::options::DecodeOptions;

impl ProfileCodec for HttpProfile {
    const FAMILY: SchemaFamily = SchemaFamily::Http;
    const CURRENT_VERSION: i32 = HTTP_SCHEMA_VERSION;

    fn write_at(&self, w: &mut Writer, version: i32) -> Result<()> {
        HttpPlan::for_version(version)?;
        w.write_i32(version);
        write_base(w, &self.base)?;
        w.write_string(required(&self.username, "username")?)?;
        w.write_string(required(&self.password, "password")?)?;
        w.write_bool(self.tls);
        if self.tls {
            w.write_string(required(&self.sni, "sni")?)?;
            w.write_string(required(&self.alpn, "alpn")?)?;
            w.write_string(required(&self.certificates, "certificates")?)?;
            w.write_string(required(&self.pinned_peer_cert_sha256, "pinnedPeerCertificateChainSha256")?)?;
            w.write_bool(required_copy(&self.allow_insecure, "allowInsecure")?);
        }
        Ok(())
    }

    fn read_from(&mut self, r: &mut Reader<'_>, _opts: &DecodeOptions) -> Result<i32> {
        let version = r.read_i32()?;
        HttpPlan::for_version(version)?;

        *self = HttpProfile {
            base: read_base(r)?,
            username: Some(r.read_string()?),
            password: Some(r.read_string()?),
            tls: r.read_bool()?,
            ..Default::default()
        };
        if self.tls {
            self.sni = Some(r.read_string()?);
            self.alpn = Some(r.read_string()?);
            self.certificates = Some(r.read_string()?);
            self.pinned_peer_cert_sha256 = Some(r.read_string()?);
            self.allow_insecure = Some(r.read_bool()?);
        }
        Ok(version)
    }

    fn normalize(&mut self) {
        self.initialize_default_values();
    }
}
