use crate::buffer::{Reader, Writer};
use crate::error::Result;
use crate::models::ProfileBase;
use crate::normalize::{required, required_copy};

pub(crate) fn write_base(w: &mut Writer, base: &ProfileBase) -> Result<()> {
    w.write_string(required(&base.server_address, "serverAddress")?)?;
    w.write_i32(required_copy(&base.server_port, "serverPort")?);
    Ok(())
}

pub(crate) fn read_base(r: &mut Reader<'_>) -> Result<ProfileBase> {
    let server_address = r.read_string()?;
    let server_port = r.read_i32()?;
    Ok(ProfileBase {
        server_address: Some(server_address),
        server_port: Some(server_port),
    })
}
