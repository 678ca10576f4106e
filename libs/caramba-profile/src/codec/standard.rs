use super::ProfileCodec;
use super::migration::{STANDARD_SCHEMA_VERSION, StandardPlan};
use super::transport::{Tail, TailKind, read_standard, write_standard};
use crate::buffer::{Reader, Writer};
use crate::error::{Result, SchemaFamily};
use crate::models::{StandardProfile, StandardProtocol};
use crate::options::DecodeOptions;

impl ProfileCodec for StandardProfile {
    const FAMILY: SchemaFamily = SchemaFamily::Standard;
    const CURRENT_VERSION: i32 = STANDARD_SCHEMA_VERSION;

    fn write_at(&self, w: &mut Writer, version: i32) -> Result<()> {
        let plan = StandardPlan::for_version(version)?;
        let tail = match &self.protocol {
            StandardProtocol::Vmess(extra) => Tail::Vmess(extra),
            StandardProtocol::Vless => Tail::Plain,
        };
        write_standard(w, plan, &self.base, &self.stream, tail)
    }

    fn read_from(&mut self, r: &mut Reader<'_>, opts: &DecodeOptions) -> Result<i32> {
        let tail = match self.protocol {
            StandardProtocol::Vmess(_) => TailKind::Vmess,
            StandardProtocol::Vless => TailKind::Plain,
        };
        let body = read_standard(r, tail, opts)?;
        self.base = body.base;
        self.stream = body.stream;
        if let StandardProtocol::Vmess(extra) = &mut self.protocol {
            *extra = body.vmess.unwrap_or_default();
        }
        Ok(body.version)
    }

    fn normalize(&mut self) {
        self.initialize_default_values();
    }
}
